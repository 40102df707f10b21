//! Target column normalization
//!
//! Converts a raw label column with heterogeneous encodings into a binary 0/1
//! column. Strategies are tried in a fixed order and the first one that maps
//! anything wins. Rows no strategy can map are excluded, never imputed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::dataset::{Dataset, RawValue};

/// Tolerance for floating point comparison when checking binary 0/1 values
const TOLERANCE: f64 = 1e-9;

/// Column used as the label when none is given explicitly
pub const DEFAULT_TARGET_COLUMN: &str = "loan_status";

/// Fixed lexical map applied to trimmed, lowercased label strings
const LEXICAL_MAP: [(&str, u8); 8] = [
    ("1", 1),
    ("0", 0),
    ("true", 1),
    ("false", 0),
    ("yes", 1),
    ("no", 0),
    ("default", 1),
    ("no_default", 0),
];

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("Target column '{name}' not found. Available columns: {available:?}")]
    ColumnNotFound { name: String, available: Vec<String> },

    #[error("Dataset has no columns to use as a target")]
    NoColumns,
}

/// A single label-mapping strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelStrategy {
    /// Numeric column already restricted to {0, 1}
    NumericBinary,
    /// Fixed map of boolean-like words
    Lexical,
    /// Exactly two distinct values: the more frequent maps to 0
    FrequencyPair,
}

/// Strategies in priority order
pub const LABEL_STRATEGIES: [LabelStrategy; 3] = [
    LabelStrategy::NumericBinary,
    LabelStrategy::Lexical,
    LabelStrategy::FrequencyPair,
];

impl std::fmt::Display for LabelStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelStrategy::NumericBinary => write!(f, "numeric_binary"),
            LabelStrategy::Lexical => write!(f, "lexical"),
            LabelStrategy::FrequencyPair => write!(f, "frequency_pair"),
        }
    }
}

impl LabelStrategy {
    /// Apply this strategy to a label column.
    ///
    /// Returns `None` when the strategy does not apply, otherwise one entry per
    /// row where `None` marks a row this strategy could not map.
    pub fn apply(&self, values: &[RawValue]) -> Option<Vec<Option<u8>>> {
        match self {
            LabelStrategy::NumericBinary => numeric_binary(values),
            LabelStrategy::Lexical => lexical(values),
            LabelStrategy::FrequencyPair => frequency_pair(values),
        }
    }
}

fn numeric_binary(values: &[RawValue]) -> Option<Vec<Option<u8>>> {
    let mut seen_any = false;
    for value in values {
        match value {
            RawValue::Missing => {}
            RawValue::Number(n) => {
                if (n - 0.0).abs() >= TOLERANCE && (n - 1.0).abs() >= TOLERANCE {
                    return None;
                }
                seen_any = true;
            }
            RawValue::Text(_) => return None,
        }
    }
    if !seen_any {
        return None;
    }

    Some(
        values
            .iter()
            .map(|v| match v {
                RawValue::Number(n) if (n - 1.0).abs() < TOLERANCE => Some(1),
                RawValue::Number(_) => Some(0),
                _ => None,
            })
            .collect(),
    )
}

fn normalized_label(value: &RawValue) -> Option<String> {
    value
        .to_label_string()
        .map(|s| s.trim().to_lowercase())
}

fn lexical(values: &[RawValue]) -> Option<Vec<Option<u8>>> {
    let mapped: Vec<Option<u8>> = values
        .iter()
        .map(|v| {
            let key = normalized_label(v)?;
            LEXICAL_MAP
                .iter()
                .find(|(word, _)| *word == key)
                .map(|(_, label)| *label)
        })
        .collect();

    if mapped.iter().all(Option::is_none) {
        None
    } else {
        Some(mapped)
    }
}

fn frequency_pair(values: &[RawValue]) -> Option<Vec<Option<u8>>> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for key in values.iter().filter_map(normalized_label) {
        *counts.entry(key).or_insert(0) += 1;
    }
    if counts.len() != 2 {
        return None;
    }

    // Most frequent first; ties resolved lexicographically
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let zero_label = ranked[0].0.clone();

    Some(
        values
            .iter()
            .map(|v| normalized_label(v).map(|key| u8::from(key != zero_label)))
            .collect(),
    )
}

/// Result of normalizing a label column
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTarget {
    /// Binary label per row, `None` for rows to exclude
    pub labels: Vec<Option<u8>>,
    /// Strategy that produced the labels, `None` when nothing applied
    pub strategy: Option<LabelStrategy>,
}

impl NormalizedTarget {
    /// `true` for each row that carries a usable label
    pub fn keep_mask(&self) -> Vec<bool> {
        self.labels.iter().map(Option::is_some).collect()
    }

    /// Indices of kept rows, in original order
    pub fn kept_indices(&self) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.map(|_| i))
            .collect()
    }

    /// Labels of kept rows, in original order
    pub fn kept_labels(&self) -> Vec<u8> {
        self.labels.iter().filter_map(|l| *l).collect()
    }

    pub fn kept_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_some()).count()
    }

    pub fn excluded_count(&self) -> usize {
        self.labels.len() - self.kept_count()
    }

    /// `(non_events, events)` among kept rows
    pub fn class_counts(&self) -> (usize, usize) {
        let events = self.labels.iter().filter(|l| **l == Some(1)).count();
        let non_events = self.labels.iter().filter(|l| **l == Some(0)).count();
        (non_events, events)
    }
}

/// Normalize a raw label column into binary labels plus an exclusion mask
pub fn normalize_target(values: &[RawValue]) -> NormalizedTarget {
    for strategy in LABEL_STRATEGIES {
        if let Some(labels) = strategy.apply(values) {
            return NormalizedTarget {
                labels,
                strategy: Some(strategy),
            };
        }
    }

    NormalizedTarget {
        labels: vec![None; values.len()],
        strategy: None,
    }
}

/// Pick the label column: explicit name, else `loan_status`, else the last column
pub fn resolve_target_column(
    dataset: &Dataset,
    explicit: Option<&str>,
) -> Result<String, TargetError> {
    if let Some(name) = explicit {
        if dataset.has_column(name) {
            return Ok(name.to_string());
        }
        return Err(TargetError::ColumnNotFound {
            name: name.to_string(),
            available: dataset.column_names().to_vec(),
        });
    }

    if dataset.has_column(DEFAULT_TARGET_COLUMN) {
        return Ok(DEFAULT_TARGET_COLUMN.to_string());
    }

    dataset
        .column_names()
        .last()
        .cloned()
        .ok_or(TargetError::NoColumns)
}
