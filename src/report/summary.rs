//! Training summary tables for the terminal

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::{EvaluationMetrics, TrainingMetrics};

/// Print the split, feature and metric tables for a finished run
pub fn display_training_summary(metrics: &TrainingMetrics) {
    println!();
    println!(
        "    {} {}",
        style("📋").cyan(),
        style("TRAINING SUMMARY").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    println!();

    print_indented(&data_table(metrics));
    println!();
    print_indented(&metrics_table(&metrics.val, &metrics.test));

    if !metrics.dropped_columns.is_empty() {
        println!();
        println!(
            "      {} {}:",
            style("Dropped (no observed values)").yellow(),
            style(format!("({})", metrics.dropped_columns.len())).dim()
        );
        for column in &metrics.dropped_columns {
            println!("        {} {}", style("•").dim(), column);
        }
    }
}

fn data_table(metrics: &TrainingMetrics) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Data").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);

    let strategy = metrics
        .label_strategy
        .as_ref()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "none".to_string());
    let (non_events, events) = metrics.class_counts;

    table.add_row(vec![Cell::new("🎯 Target"), Cell::new(&metrics.target_column)]);
    table.add_row(vec![Cell::new("🏷️  Label strategy"), Cell::new(strategy)]);
    table.add_row(vec![Cell::new("📁 Rows"), Cell::new(metrics.total_rows)]);
    table.add_row(vec![
        Cell::new("🗑️  Excluded labels"),
        Cell::new(metrics.excluded_rows).fg(if metrics.excluded_rows == 0 {
            Color::White
        } else {
            Color::Red
        }),
    ]);
    table.add_row(vec![
        Cell::new("⚖️  Classes (0 / 1)"),
        Cell::new(format!("{} / {}", non_events, events)),
    ]);
    table.add_row(vec![
        Cell::new("✂️  Train / Val / Test"),
        Cell::new(format!(
            "{} / {} / {}",
            metrics.splits.train_rows, metrics.splits.val_rows, metrics.splits.test_rows
        )),
    ]);
    table.add_row(vec![
        Cell::new("🔢 Numeric / Categorical"),
        Cell::new(format!(
            "{} / {}",
            metrics.numeric_columns.len(),
            metrics.categorical_columns.len()
        )),
    ]);
    table.add_row(vec![
        Cell::new("✅ Model features"),
        Cell::new(metrics.feature_count)
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
    ]);

    table
}

fn metrics_table(val: &EvaluationMetrics, test: &EvaluationMetrics) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Validation").add_attribute(Attribute::Bold),
        Cell::new("Test").add_attribute(Attribute::Bold),
    ]);

    let rows: [(&str, f64, f64); 4] = [
        ("Accuracy", val.accuracy, test.accuracy),
        ("Precision", val.precision, test.precision),
        ("Recall", val.recall, test.recall),
        ("F1", val.f1, test.f1),
    ];
    for (name, v, t) in rows {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format!("{:.4}", v)),
            Cell::new(format!("{:.4}", t)),
        ]);
    }

    table.add_row(vec![
        Cell::new("ROC AUC").add_attribute(Attribute::Bold),
        auc_cell(val.roc_auc),
        auc_cell(test.roc_auc),
    ]);
    table.add_row(vec![
        Cell::new("Confusion [[tn, fp], [fn, tp]]"),
        Cell::new(format!("{:?}", val.confusion_matrix)),
        Cell::new(format!("{:?}", test.confusion_matrix)),
    ]);

    table
}

fn auc_cell(auc: Option<f64>) -> Cell {
    match auc {
        Some(value) => {
            let color = if value >= 0.75 {
                Color::Green
            } else if value >= 0.6 {
                Color::Yellow
            } else {
                Color::Red
            };
            Cell::new(format!("{:.4}", value))
                .fg(color)
                .add_attribute(Attribute::Bold)
        }
        None => Cell::new("n/a").fg(Color::DarkGrey),
    }
}

// Indent the table to line up with the step output
fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}
