//! Preprocessing: median imputation for numeric columns, most-frequent
//! imputation plus one-hot encoding for categorical columns.
//!
//! The fitted state is plain immutable data. `transform` borrows it
//! read-only, so any number of threads can transform against one instance.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::dataset::{Dataset, RawValue, Record};
use super::features::{split_features, FeatureSplit};

#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("Missing fields: {0:?}")]
    MissingFields(Vec<String>),

    #[error("Field '{field}' expects a number, got '{value}'")]
    NotNumeric { field: String, value: String },

    #[error("Cannot fit preprocessing on an empty dataset")]
    EmptyFit,

    #[error("No usable feature columns")]
    NoFeatures,
}

/// Dense row-major feature matrix with ordered feature names
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    names: Vec<String>,
    values: Vec<f64>,
    rows: usize,
}

impl FeatureMatrix {
    /// Build a matrix from row-major values
    pub fn new(names: Vec<String>, values: Vec<f64>) -> Self {
        let width = names.len();
        let rows = if width == 0 { 0 } else { values.len() / width };
        Self {
            names,
            values,
            rows,
        }
    }

    pub fn from_rows(names: Vec<String>, rows: &[Vec<f64>]) -> Self {
        let values = rows.iter().flatten().copied().collect();
        Self::new(names, values)
    }

    pub fn n_rows(&self) -> usize {
        self.rows
    }

    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.names
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let width = self.n_cols();
        &self.values[i * width..(i + 1) * width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.rows).map(move |i| self.row(i))
    }

    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.n_cols() + col]
    }

    /// Copy of one column
    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.rows).map(|r| self.value(r, col)).collect()
    }
}

/// Median imputer for one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericImputer {
    pub column: String,
    pub median: f64,
}

/// Most-frequent imputer plus one-hot encoder for one categorical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    pub column: String,
    pub most_frequent: String,
    /// Categories in first-observed order; one indicator each
    pub categories: Vec<String>,
}

impl CategoricalEncoder {
    /// Indicator block for a value. Unknown categories give all zeros.
    fn encode_into(&self, value: &RawValue, out: &mut Vec<f64>) {
        let key = value
            .to_label_string()
            .unwrap_or_else(|| self.most_frequent.clone());
        out.extend(
            self.categories
                .iter()
                .map(|c| if *c == key { 1.0 } else { 0.0 }),
        );
    }
}

/// Fitted preprocessing state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    numeric: Vec<NumericImputer>,
    categorical: Vec<CategoricalEncoder>,
    feature_names: Vec<String>,
    /// Columns seen at fit time but dropped for having no values
    dropped: Vec<String>,
}

impl FittedPreprocessor {
    /// Fit on the training rows (label column already removed)
    pub fn fit(dataset: &Dataset) -> Result<Self, TransformError> {
        if dataset.n_rows() == 0 {
            return Err(TransformError::EmptyFit);
        }

        let FeatureSplit {
            numeric,
            categorical,
            dropped,
        } = split_features(dataset);

        if numeric.is_empty() && categorical.is_empty() {
            return Err(TransformError::NoFeatures);
        }

        let numeric: Vec<NumericImputer> = numeric
            .into_iter()
            .map(|column| {
                let values: Vec<f64> = dataset
                    .column(&column)
                    .unwrap_or_default()
                    .iter()
                    .filter_map(RawValue::as_number)
                    .filter(|v| v.is_finite())
                    .collect();
                NumericImputer {
                    median: median(values).unwrap_or(0.0),
                    column,
                }
            })
            .collect();

        let categorical: Vec<CategoricalEncoder> = categorical
            .into_iter()
            .map(|column| {
                let values = dataset.column(&column).unwrap_or_default();
                fit_categorical(column, values)
            })
            .collect();

        let feature_names = numeric
            .iter()
            .map(|n| n.column.clone())
            .chain(categorical.iter().flat_map(|c| {
                c.categories
                    .iter()
                    .map(move |cat| format!("{}_{}", c.column, cat))
            }))
            .collect();

        Ok(Self {
            numeric,
            categorical,
            feature_names,
            dropped,
        })
    }

    /// Output feature names: numeric columns, then one-hot indicators
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn numeric(&self) -> &[NumericImputer] {
        &self.numeric
    }

    pub fn categorical(&self) -> &[CategoricalEncoder] {
        &self.categorical
    }

    pub fn dropped_columns(&self) -> &[String] {
        &self.dropped
    }

    /// Input columns the transform reads, numeric first
    pub fn input_columns(&self) -> impl Iterator<Item = &str> {
        self.numeric
            .iter()
            .map(|n| n.column.as_str())
            .chain(self.categorical.iter().map(|c| c.column.as_str()))
    }

    /// Transform a whole dataset. Every fitted input column must be present;
    /// extra columns are ignored.
    pub fn transform(&self, dataset: &Dataset) -> Result<FeatureMatrix, TransformError> {
        let missing: Vec<String> = self
            .input_columns()
            .filter(|c| !dataset.has_column(c))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(TransformError::MissingFields(missing));
        }

        let numeric_cols: Vec<&[RawValue]> = self
            .numeric
            .iter()
            .map(|n| dataset.column(&n.column).unwrap_or_default())
            .collect();
        let categorical_cols: Vec<&[RawValue]> = self
            .categorical
            .iter()
            .map(|c| dataset.column(&c.column).unwrap_or_default())
            .collect();

        let mut values = Vec::with_capacity(dataset.n_rows() * self.n_features());
        for row in 0..dataset.n_rows() {
            for (imputer, col) in self.numeric.iter().zip(&numeric_cols) {
                values.push(impute_numeric(imputer, &col[row])?);
            }
            for (encoder, col) in self.categorical.iter().zip(&categorical_cols) {
                encoder.encode_into(&col[row], &mut values);
            }
        }

        Ok(FeatureMatrix::new(self.feature_names.clone(), values))
    }

    /// Transform one record into a single-row matrix.
    ///
    /// Unknown fields are ignored. Absent known fields are an error; known
    /// fields explicitly set to missing are imputed.
    pub fn transform_record(&self, record: &Record) -> Result<FeatureMatrix, TransformError> {
        let missing: Vec<String> = self
            .input_columns()
            .filter(|c| !record.contains_key(*c))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(TransformError::MissingFields(missing));
        }

        let mut values = Vec::with_capacity(self.n_features());
        for imputer in &self.numeric {
            let value = record.get(&imputer.column).unwrap_or(&RawValue::Missing);
            values.push(impute_numeric(imputer, value)?);
        }
        for encoder in &self.categorical {
            let value = record.get(&encoder.column).unwrap_or(&RawValue::Missing);
            encoder.encode_into(value, &mut values);
        }

        Ok(FeatureMatrix::new(self.feature_names.clone(), values))
    }
}

/// NaN (numeric or spelled out) counts as missing; infinities are rejected
fn impute_numeric(imputer: &NumericImputer, value: &RawValue) -> Result<f64, TransformError> {
    if value.is_missing() {
        return Ok(imputer.median);
    }
    match value.as_number() {
        Some(n) if n.is_nan() => Ok(imputer.median),
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(TransformError::NotNumeric {
            field: imputer.column.clone(),
            value: value.to_label_string().unwrap_or_default(),
        }),
    }
}

fn fit_categorical(column: String, values: &[RawValue]) -> CategoricalEncoder {
    let mut categories: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for value in values.iter().filter_map(RawValue::to_label_string) {
        push_category(value, &mut categories, &mut counts);
    }

    // Most frequent; ties go to the lexicographically smallest value
    let most_frequent = counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(value, _)| value.clone())
        .unwrap_or_default();

    CategoricalEncoder {
        column,
        most_frequent,
        categories,
    }
}

fn push_category(value: String, categories: &mut Vec<String>, counts: &mut HashMap<String, usize>) {
    let count = counts.entry(value.clone()).or_insert(0);
    if *count == 0 {
        categories.push(value);
    }
    *count += 1;
}

/// Median of a set of values; even counts average the two middle values
pub fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_set() -> Dataset {
        Dataset::from_columns(vec![
            (
                "income".to_string(),
                vec![
                    RawValue::Number(10.0),
                    RawValue::Missing,
                    RawValue::Number(30.0),
                    RawValue::Number(20.0),
                ],
            ),
            (
                "home".to_string(),
                vec![
                    RawValue::from("RENT"),
                    RawValue::from("OWN"),
                    RawValue::Missing,
                    RawValue::from("OWN"),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(vec![3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(vec![4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(vec![]), None);
    }

    #[test]
    fn test_fit_learns_median_mode_and_category_order() {
        let fitted = FittedPreprocessor::fit(&training_set()).unwrap();

        assert_eq!(fitted.numeric()[0].median, 20.0);
        assert_eq!(fitted.categorical()[0].most_frequent, "OWN");
        assert_eq!(fitted.categorical()[0].categories, vec!["RENT", "OWN"]);
        assert_eq!(fitted.feature_names(), &["income", "home_RENT", "home_OWN"]);
    }

    #[test]
    fn test_transform_imputes_missing_values() {
        let ds = training_set();
        let fitted = FittedPreprocessor::fit(&ds).unwrap();
        let matrix = fitted.transform(&ds).unwrap();

        assert_eq!(matrix.n_rows(), 4);
        assert_eq!(matrix.row(1), &[20.0, 0.0, 1.0]);
        assert_eq!(matrix.row(2), &[30.0, 0.0, 1.0]);
    }

    #[test]
    fn test_most_frequent_tie_prefers_smallest() {
        let values = vec![RawValue::from("b"), RawValue::from("a")];
        let encoder = fit_categorical("c".to_string(), &values);
        assert_eq!(encoder.most_frequent, "a");
        assert_eq!(encoder.categories, vec!["b", "a"]);
    }

    #[test]
    fn test_transform_rejects_non_numeric_text() {
        let fitted = FittedPreprocessor::fit(&training_set()).unwrap();
        let record: Record = [
            ("income".to_string(), RawValue::from("lots")),
            ("home".to_string(), RawValue::from("RENT")),
        ]
        .into_iter()
        .collect();

        let err = fitted.transform_record(&record).unwrap_err();
        assert!(matches!(err, TransformError::NotNumeric { .. }));
    }

    #[test]
    fn test_fit_rejects_empty_dataset() {
        let ds = Dataset::from_columns(vec![("a".to_string(), vec![])]).unwrap();
        assert_eq!(
            FittedPreprocessor::fit(&ds).unwrap_err(),
            TransformError::EmptyFit
        );
    }
}
