//! Unit tests for dataset loader

use riskgate::pipeline::*;
use std::io::Write;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

#[test]
fn test_load_csv_file() {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    writeln!(file, "a,b,c").unwrap();
    writeln!(file, "1,x,3").unwrap();
    writeln!(file, "4,y,?").unwrap();
    drop(file);

    let dataset = load_dataset(&csv_path, 100).unwrap();

    assert_eq!(dataset.n_rows(), 2, "Should have 2 data rows");
    assert_eq!(dataset.column_names(), &["a", "b", "c"]);
    assert_eq!(dataset.column("b").unwrap()[1], RawValue::Text("y".into()));
    assert_eq!(dataset.column("c").unwrap()[1], RawValue::Missing);
}

#[test]
fn test_load_parquet_file() {
    let mut df = common::create_small_dataframe();
    let (_dir, parquet_path) = common::create_temp_parquet(&mut df);

    let dataset = load_dataset(&parquet_path, 100).unwrap();

    assert_eq!(dataset.n_rows(), 4);
    assert_eq!(dataset.column_names(), &["age", "purpose", "loan_status"]);
    assert_eq!(dataset.column("age").unwrap()[2], RawValue::Missing);
    assert_eq!(dataset.column("purpose").unwrap()[1], RawValue::Missing);
    assert_eq!(dataset.column("loan_status").unwrap()[1], RawValue::Number(1.0));
}

#[test]
fn test_generated_csv_infers_kinds() {
    let (_dir, path) = common::create_credit_csv(200, 9);
    let dataset = load_dataset(&path, 0).unwrap();
    let split = split_features(&dataset.without_column("default"));

    assert_eq!(split.numeric, vec!["income", "loan_amount"]);
    assert_eq!(split.categorical, vec!["grade", "home_ownership"]);
    assert!(split.dropped.is_empty());
}

#[test]
fn test_missing_dataset_is_fatal_with_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.csv");

    let err = load_dataset(&path, 100).unwrap_err();
    assert!(err.to_string().contains("absent.csv"));
}

#[test]
fn test_unsupported_format() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.json");
    std::fs::write(&path, "{}").unwrap();

    let err = load_dataset(&path, 100).unwrap_err();
    assert!(err.to_string().contains("Unsupported file format"));
}
