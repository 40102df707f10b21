//! Training orchestration: normalize labels, split, fit, evaluate

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::artifact::FittedPipeline;
use super::classifier::{Classifier, ClassifierError};
use super::dataset::Dataset;
use super::metrics::{evaluate, EvaluationMetrics};
use super::preprocess::{FittedPreprocessor, TransformError};
use super::split::{stratified_split, SplitSizes, DEFAULT_SEED};
use super::target::{normalize_target, resolve_target_column, LabelStrategy, TargetError};

#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("Dataset is empty")]
    EmptyDataset,

    #[error(
        "Target column '{column}' has {non_events} non-default and {events} default rows after \
         excluding {excluded} unmappable labels; both classes are required for a stratified split"
    )]
    DegenerateTarget {
        column: String,
        non_events: usize,
        events: usize,
        excluded: usize,
    },

    #[error("Preprocessing failed: {0}")]
    Transform(#[from] TransformError),

    #[error("Classifier failed: {0}")]
    Classifier(#[from] ClassifierError),
}

/// Settings for one training run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingConfig {
    /// Label column; falls back to `loan_status`, then the last column
    pub target_column: Option<String>,
    /// Seed for the stratified split
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            target_column: None,
            seed: DEFAULT_SEED,
        }
    }
}

/// Metrics and bookkeeping from one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub target_column: String,
    /// Strategy that normalized the labels
    pub label_strategy: Option<LabelStrategy>,
    /// Rows in the raw dataset
    pub total_rows: usize,
    /// Rows dropped for unmappable labels
    pub excluded_rows: usize,
    /// `(non_events, events)` after exclusion
    pub class_counts: (usize, usize),
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub dropped_columns: Vec<String>,
    pub feature_count: usize,
    pub splits: SplitSizes,
    pub val: EvaluationMetrics,
    pub test: EvaluationMetrics,
}

/// A fitted pipeline together with the metrics of the run
#[derive(Debug)]
pub struct TrainingOutcome<C> {
    pub pipeline: FittedPipeline<C>,
    pub metrics: TrainingMetrics,
}

/// Train `classifier` on `dataset` and evaluate it on held-out partitions.
///
/// Preprocessing and classifier are fitted on the training partition only.
pub fn train_pipeline<C: Classifier>(
    dataset: &Dataset,
    config: &TrainingConfig,
    mut classifier: C,
) -> Result<TrainingOutcome<C>, TrainError> {
    if dataset.n_rows() == 0 {
        return Err(TrainError::EmptyDataset);
    }

    let target_column = resolve_target_column(dataset, config.target_column.as_deref())?;
    let raw_labels = dataset.column(&target_column).unwrap_or_default();
    let normalized = normalize_target(raw_labels);

    let excluded = normalized.excluded_count();
    let (non_events, events) = normalized.class_counts();
    info!(
        target = %target_column,
        strategy = ?normalized.strategy,
        kept = normalized.kept_count(),
        excluded,
        "Normalized target labels"
    );
    if excluded > 0 {
        warn!(excluded, "Excluding rows with unmappable target labels");
    }
    if non_events == 0 || events == 0 {
        return Err(TrainError::DegenerateTarget {
            column: target_column,
            non_events,
            events,
            excluded,
        });
    }

    let kept = normalized.kept_indices();
    let features = dataset.without_column(&target_column).take(&kept);
    let labels = normalized.kept_labels();

    let split = stratified_split(&labels, config.seed);
    let subset_labels = |idx: &[usize]| -> Vec<u8> { idx.iter().map(|&i| labels[i]).collect() };

    let train_rows = features.take(&split.train);
    let train_labels = subset_labels(&split.train);

    let preprocessor = FittedPreprocessor::fit(&train_rows)?;
    if !preprocessor.dropped_columns().is_empty() {
        warn!(columns = ?preprocessor.dropped_columns(), "Dropping columns with no observed values");
    }

    let train_matrix = preprocessor.transform(&train_rows)?;
    classifier.fit(&train_matrix, &train_labels)?;

    let evaluate_partition = |idx: &[usize]| -> Result<EvaluationMetrics, TrainError> {
        let matrix = preprocessor.transform(&features.take(idx))?;
        let probabilities = classifier.predict_probability(&matrix)?;
        Ok(evaluate(&subset_labels(idx), &probabilities))
    };
    let val = evaluate_partition(&split.validation)?;
    let test = evaluate_partition(&split.test)?;

    let metrics = TrainingMetrics {
        target_column: target_column.clone(),
        label_strategy: normalized.strategy,
        total_rows: dataset.n_rows(),
        excluded_rows: excluded,
        class_counts: (non_events, events),
        numeric_columns: preprocessor.numeric().iter().map(|n| n.column.clone()).collect(),
        categorical_columns: preprocessor
            .categorical()
            .iter()
            .map(|c| c.column.clone())
            .collect(),
        dropped_columns: preprocessor.dropped_columns().to_vec(),
        feature_count: preprocessor.n_features(),
        splits: split.sizes(),
        val,
        test,
    };

    Ok(TrainingOutcome {
        pipeline: FittedPipeline::new(target_column, preprocessor, classifier),
        metrics,
    })
}
