//! Shared test utilities and fixture generators

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use riskgate::pipeline::{Dataset, RawValue};
use tempfile::TempDir;

const GRADES: [&str; 5] = ["A", "B", "C", "D", "E"];
const HOME: [&str; 3] = ["RENT", "OWN", "MORTGAGE"];

/// One synthetic loan application
#[derive(Debug, Clone)]
pub struct Application {
    pub income: Option<f64>,
    pub loan_amount: f64,
    pub grade: &'static str,
    pub home_ownership: Option<&'static str>,
    pub defaulted: bool,
}

/// Generate loan applications whose default risk rises with the
/// loan-to-income ratio and the grade letter.
///
/// About 5% of incomes and 5% of home ownership values are missing.
pub fn generate_applications(rows: usize, seed: u64) -> Vec<Application> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..rows)
        .map(|_| {
            let income: f64 = rng.gen_range(20_000.0..150_000.0);
            let loan_amount: f64 = rng.gen_range(1_000.0..40_000.0);
            let grade_idx = rng.gen_range(0..GRADES.len());
            let home = HOME[rng.gen_range(0..HOME.len())];

            let ratio = loan_amount / income;
            let logit = -3.0 + 6.0 * ratio + 0.6 * grade_idx as f64;
            let p = 1.0 / (1.0 + (-logit).exp());
            let defaulted = rng.gen::<f64>() < p;

            Application {
                income: (rng.gen::<f64>() >= 0.05).then_some(income),
                loan_amount,
                grade: GRADES[grade_idx],
                home_ownership: (rng.gen::<f64>() >= 0.05).then_some(home),
                defaulted,
            }
        })
        .collect()
}

/// Synthetic credit dataset with a 0/1 numeric `loan_status` label
pub fn create_credit_dataset(rows: usize, seed: u64) -> Dataset {
    let apps = generate_applications(rows, seed);
    Dataset::from_columns(vec![
        (
            "income".to_string(),
            apps.iter().map(|a| RawValue::from(a.income)).collect(),
        ),
        (
            "loan_amount".to_string(),
            apps.iter().map(|a| RawValue::Number(a.loan_amount)).collect(),
        ),
        (
            "grade".to_string(),
            apps.iter().map(|a| RawValue::from(a.grade)).collect(),
        ),
        (
            "home_ownership".to_string(),
            apps.iter().map(|a| RawValue::from(a.home_ownership)).collect(),
        ),
        (
            "loan_status".to_string(),
            apps.iter()
                .map(|a| RawValue::Number(if a.defaulted { 1.0 } else { 0.0 }))
                .collect(),
        ),
    ])
    .unwrap()
}

/// Write the synthetic applications as CSV, with `?` for missing cells and
/// `yes`/`no` labels in a `default` column.
pub fn create_credit_csv(rows: usize, seed: u64) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("applications.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    writeln!(file, "income,loan_amount,grade,home_ownership,default").unwrap();
    for app in generate_applications(rows, seed) {
        let income = app
            .income
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "?".to_string());
        writeln!(
            file,
            "{},{:.2},{},{},{}",
            income,
            app.loan_amount,
            app.grade,
            app.home_ownership.unwrap_or("?"),
            if app.defaulted { "yes" } else { "no" }
        )
        .unwrap();
    }

    (temp_dir, csv_path)
}

/// Small frame with known values for loader tests
pub fn create_small_dataframe() -> DataFrame {
    df! {
        "age" => [Some(25i64), Some(40), None, Some(33)],
        "purpose" => [Some("car"), None, Some("home"), Some("car")],
        "loan_status" => [0i32, 1, 0, 1],
    }
    .unwrap()
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("test_data.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// A record containing every input column of the synthetic dataset
pub fn sample_request() -> serde_json::Value {
    serde_json::json!({
        "income": 52000.0,
        "loan_amount": 12000.0,
        "grade": "C",
        "home_ownership": "RENT"
    })
}
