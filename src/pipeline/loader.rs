//! Dataset loader for CSV and Parquet files

use anyhow::{Context, Result};
use polars::prelude::*;
use std::path::Path;

use super::dataset::{Dataset, MISSING_TOKENS};

/// Default number of rows polars inspects to infer CSV column types
pub const DEFAULT_INFER_SCHEMA_LENGTH: usize = 10000;

/// Open a dataset lazily (CSV or Parquet based on extension).
///
/// CSV cells matching the missing tokens are read as nulls so that a column
/// like `1.5,?,2.0` still infers as numeric.
pub fn scan_dataset(path: &Path, infer_schema_length: usize) -> Result<LazyFrame> {
    if !path.exists() {
        anyhow::bail!(
            "Dataset not found at {}. Pass an existing CSV or Parquet file with -i/--input.",
            path.display()
        );
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    // 0 means a full table scan
    let schema_rows = (infer_schema_length > 0).then_some(infer_schema_length);

    let lf = match extension.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(schema_rows)
            .with_null_values(Some(NullValues::AllColumns(
                MISSING_TOKENS.iter().map(|t| (*t).into()).collect(),
            )))
            .finish()
            .with_context(|| format!("Failed to load CSV file: {}", path.display()))?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to load Parquet file: {}", path.display()))?,
        _ => anyhow::bail!(
            "Unsupported file format: {}. Supported formats: csv, parquet",
            extension
        ),
    };

    Ok(lf)
}

/// Load a dataset fully into memory as raw values
pub fn load_dataset(path: &Path, infer_schema_length: usize) -> Result<Dataset> {
    load_dataset_with_size(path, infer_schema_length).map(|(dataset, _)| dataset)
}

/// Load a dataset and report the estimated size of the collected frame in MB
pub fn load_dataset_with_size(path: &Path, infer_schema_length: usize) -> Result<(Dataset, f64)> {
    let df = scan_dataset(path, infer_schema_length)?
        .collect()
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;

    let dataset = Dataset::from_dataframe(&df)
        .with_context(|| format!("Failed to convert dataset: {}", path.display()))?;
    Ok((dataset, estimated_size_mb(&df)))
}

/// Estimated in-memory size of a collected frame, in megabytes
pub fn estimated_size_mb(df: &DataFrame) -> f64 {
    df.estimated_size() as f64 / (1024.0 * 1024.0)
}
