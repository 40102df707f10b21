//! `riskgate train`: load, fit, evaluate and persist the pipeline

use std::time::Instant;

use anyhow::Result;
use console::style;

use crate::cli::args::TrainArgs;
use crate::cli::prompts::confirm_overwrite;
use crate::pipeline::{
    load_dataset_with_size, train_pipeline, ArtifactStore, GradientBoostedTrees, TrainingConfig,
};
use crate::report::{display_training_summary, TrainingReport};
use crate::utils::{
    create_round_bar, create_spinner, finish_with_success, finish_with_warning, print_banner,
    print_completion, print_config, print_count, print_info, print_step_header, print_step_time,
    print_success, RunCard,
};

pub fn run_train(args: &TrainArgs) -> Result<()> {
    let store = ArtifactStore::new(&args.output);
    if store.has_model() && !args.no_confirm && !confirm_overwrite(store.dir())? {
        println!("Cancelled by user.");
        return Ok(());
    }

    print_banner(env!("CARGO_PKG_VERSION"));
    let boosting = args.boosting_config();
    print_config(&RunCard {
        input: &args.input,
        target: args.target.as_deref(),
        artifacts: store.dir(),
        n_estimators: boosting.n_estimators,
        learning_rate: boosting.learning_rate,
        max_depth: boosting.max_depth,
        seed: args.seed,
    });

    // Step 1: Load dataset
    print_step_header(1, "Load Dataset");
    let step_start = Instant::now();
    let spinner = create_spinner("Reading dataset...");
    let (dataset, size_mb) = load_dataset_with_size(&args.input, args.infer_schema_length)?;
    finish_with_success(&spinner, "Dataset loaded");

    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", dataset.n_rows());
    println!("      Columns: {}", dataset.n_columns());
    println!("      Estimated memory: {:.2} MB", size_mb);
    print_step_time(step_start.elapsed());

    // Step 2: Train and evaluate
    print_step_header(2, "Train & Evaluate");
    let step_start = Instant::now();
    let bar = create_round_bar("Boosting");
    let classifier = GradientBoostedTrees::new(boosting.clone()).with_progress(bar.clone());
    let config = TrainingConfig {
        target_column: args.target.clone(),
        seed: args.seed,
    };

    let outcome = match train_pipeline(&dataset, &config, classifier) {
        Ok(outcome) => outcome,
        Err(e) => {
            finish_with_warning(&bar, "Training aborted");
            return Err(anyhow::Error::new(e).context("Training failed"));
        }
    };
    finish_with_success(&bar, "Model fitted");

    let metrics = &outcome.metrics;
    if metrics.excluded_rows > 0 {
        print_count(
            "row(s) with unmappable target labels",
            metrics.excluded_rows,
            Some("(excluded)"),
        );
    }
    if metrics.dropped_columns.is_empty() {
        print_info("Every feature column has observed values");
    } else {
        print_count(
            "column(s) with no observed values",
            metrics.dropped_columns.len(),
            Some("(dropped)"),
        );
    }
    print_success(&format!(
        "{} features from {} numeric and {} categorical columns",
        metrics.feature_count,
        metrics.numeric_columns.len(),
        metrics.categorical_columns.len()
    ));
    print_step_time(step_start.elapsed());

    // Step 3: Persist artifacts
    print_step_header(3, "Save Artifacts");
    let step_start = Instant::now();
    let spinner = create_spinner("Writing model...");
    let model_path = store.save_pipeline(&outcome.pipeline)?;
    let report = TrainingReport::new(
        &args.input.display().to_string(),
        args.seed,
        boosting,
        outcome.metrics.clone(),
    );
    let metrics_path = store.save_report(&report)?;
    finish_with_success(&spinner, &format!("Saved to {}", store.dir().display()));
    print_info(&format!("Model:   {}", model_path.display()));
    print_info(&format!("Metrics: {}", metrics_path.display()));
    print_step_time(step_start.elapsed());

    display_training_summary(&outcome.metrics);
    print_completion(store.dir());

    Ok(())
}
