//! Feature splitting: routes each input column to the numeric or categorical branch

use serde::{Deserialize, Serialize};

use super::dataset::{Dataset, RawValue};

/// Kind of an input column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Name and inferred kind of one input column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ColumnKind,
}

/// Result of splitting a dataset's columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSplit {
    /// Numeric columns in original order
    pub numeric: Vec<String>,
    /// Categorical columns in original order
    pub categorical: Vec<String>,
    /// Columns with no observed values at all
    pub dropped: Vec<String>,
}

impl FeatureSplit {
    pub fn descriptors(&self) -> Vec<ColumnDescriptor> {
        self.numeric
            .iter()
            .map(|name| ColumnDescriptor {
                name: name.clone(),
                kind: ColumnKind::Numeric,
            })
            .chain(self.categorical.iter().map(|name| ColumnDescriptor {
                name: name.clone(),
                kind: ColumnKind::Categorical,
            }))
            .collect()
    }
}

/// Infer the kind of a column: numeric iff every non-missing value parses as
/// a number. NaN counts as missing. Returns `None` when the column has no
/// non-missing values.
pub fn infer_column_kind(values: &[RawValue]) -> Option<ColumnKind> {
    let mut observed = false;
    for value in values {
        match value {
            RawValue::Missing => {}
            _ => match value.as_number() {
                None => return Some(ColumnKind::Categorical),
                Some(n) if n.is_nan() => {}
                Some(_) => observed = true,
            },
        }
    }
    observed.then_some(ColumnKind::Numeric)
}

/// Split the feature columns of a dataset (label column already removed)
pub fn split_features(dataset: &Dataset) -> FeatureSplit {
    let mut split = FeatureSplit::default();

    for (name, values) in dataset.columns() {
        match infer_column_kind(values) {
            Some(ColumnKind::Numeric) => split.numeric.push(name.to_string()),
            Some(ColumnKind::Categorical) => split.categorical.push(name.to_string()),
            None => split.dropped.push(name.to_string()),
        }
    }

    split
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_numeric_from_numbers_and_numeric_text() {
        let values = vec![
            RawValue::Number(1.0),
            RawValue::Missing,
            RawValue::Text("2.5".into()),
        ];
        assert_eq!(infer_column_kind(&values), Some(ColumnKind::Numeric));
    }

    #[test]
    fn test_infer_categorical_on_any_non_numeric_text() {
        let values = vec![RawValue::Number(1.0), RawValue::Text("RENT".into())];
        assert_eq!(infer_column_kind(&values), Some(ColumnKind::Categorical));
    }

    #[test]
    fn test_all_missing_column_has_no_kind() {
        assert_eq!(infer_column_kind(&[RawValue::Missing, RawValue::Missing]), None);
    }

    #[test]
    fn test_nan_counts_as_missing() {
        let values = vec![RawValue::Text("NaN".into()), RawValue::Number(f64::NAN)];
        assert_eq!(infer_column_kind(&values), None);

        let values = vec![RawValue::Text("nan".into()), RawValue::Number(4.0)];
        assert_eq!(infer_column_kind(&values), Some(ColumnKind::Numeric));
    }

    #[test]
    fn test_split_preserves_column_order() {
        let ds = Dataset::from_columns(vec![
            ("age".to_string(), vec![RawValue::Number(30.0)]),
            ("home".to_string(), vec![RawValue::Text("OWN".into())]),
            ("income".to_string(), vec![RawValue::Number(5.0)]),
            ("empty".to_string(), vec![RawValue::Missing]),
            ("intent".to_string(), vec![RawValue::Text("EDU".into())]),
        ])
        .unwrap();

        let split = split_features(&ds);
        assert_eq!(split.numeric, vec!["age", "income"]);
        assert_eq!(split.categorical, vec!["home", "intent"]);
        assert_eq!(split.dropped, vec!["empty"]);

        let kinds: Vec<ColumnKind> = split.descriptors().iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Numeric,
                ColumnKind::Numeric,
                ColumnKind::Categorical,
                ColumnKind::Categorical
            ]
        );
    }
}
