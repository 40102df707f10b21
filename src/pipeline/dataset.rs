//! Column-oriented dataset of raw cell values
//!
//! Every column holds exactly one value per row, so all rows share the same
//! column set by construction.

use std::collections::HashMap;

use anyhow::Result;
use polars::prelude::*;

/// Cell contents treated as missing regardless of the file format
pub const MISSING_TOKENS: [&str; 3] = ["?", "", " "];

/// A single raw cell value before any imputation or encoding
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Missing,
}

impl RawValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, RawValue::Missing)
    }

    /// Numeric view of the value: numbers as-is, text only if it parses
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => Some(*n),
            RawValue::Text(s) => s.trim().parse::<f64>().ok(),
            RawValue::Missing => None,
        }
    }

    /// String form of the value. Integral numbers render without a fraction
    /// so that `1.0` and `1` both read as `"1"`.
    pub fn to_label_string(&self) -> Option<String> {
        match self {
            RawValue::Number(n) => Some(format_number(*n)),
            RawValue::Text(s) => Some(s.clone()),
            RawValue::Missing => None,
        }
    }

    /// Convert a JSON scalar into a raw value.
    ///
    /// Booleans become the text `"true"`/`"false"`; arrays and objects keep
    /// their JSON text so that the encoder can reject or ignore them.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Missing,
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => RawValue::Number(f),
                None => RawValue::Text(n.to_string()),
            },
            serde_json::Value::String(s) => text_or_missing(s),
            serde_json::Value::Bool(b) => RawValue::Text(b.to_string()),
            other => RawValue::Text(other.to_string()),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        text_or_missing(value)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawValue::Missing)
    }
}

/// Render a number the way it would appear in a CSV cell
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn text_or_missing(s: &str) -> RawValue {
    if MISSING_TOKENS.contains(&s) {
        RawValue::Missing
    } else {
        RawValue::Text(s.to_string())
    }
}

/// One application record: feature name to raw value
pub type Record = HashMap<String, RawValue>;

/// Ordered, column-major collection of raw rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Vec<RawValue>>,
    rows: usize,
}

impl Dataset {
    /// Build a dataset from named columns. All columns must have equal length.
    pub fn from_columns(columns: Vec<(String, Vec<RawValue>)>) -> Result<Self> {
        let rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        let mut names = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());

        for (name, column) in columns {
            if column.len() != rows {
                anyhow::bail!(
                    "Column '{}' has {} values, expected {}",
                    name,
                    column.len(),
                    rows
                );
            }
            if names.contains(&name) {
                anyhow::bail!("Duplicate column name '{}'", name);
            }
            names.push(name);
            values.push(column);
        }

        Ok(Self {
            names,
            columns: values,
            rows,
        })
    }

    /// Convert a polars DataFrame into raw values.
    ///
    /// Primitive numeric columns become `Number`; everything else is read
    /// through its string form. Nulls and the missing tokens become `Missing`.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let mut columns = Vec::with_capacity(df.width());

        for col in df.get_columns() {
            let values: Vec<RawValue> = if col.dtype().is_primitive_numeric() {
                let cast = col.cast(&DataType::Float64)?;
                cast.f64()?
                    .into_iter()
                    .map(|v| match v {
                        Some(n) if !n.is_nan() => RawValue::Number(n),
                        _ => RawValue::Missing,
                    })
                    .collect()
            } else {
                let cast = col.cast(&DataType::String)?;
                cast.str()?
                    .into_iter()
                    .map(|v| v.map(text_or_missing).unwrap_or(RawValue::Missing))
                    .collect()
            };
            columns.push((col.name().to_string(), values));
        }

        Self::from_columns(columns)
    }

    pub fn n_rows(&self) -> usize {
        self.rows
    }

    pub fn n_columns(&self) -> usize {
        self.names.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&[RawValue]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// Iterate over `(name, values)` pairs in column order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[RawValue])> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// Dataset without the named column
    pub fn without_column(&self, name: &str) -> Self {
        let (names, columns) = self
            .names
            .iter()
            .zip(&self.columns)
            .filter(|(n, _)| n.as_str() != name)
            .map(|(n, c)| (n.clone(), c.clone()))
            .unzip();
        Self {
            names,
            columns,
            rows: self.rows,
        }
    }

    /// Rows at the given indices, in the given order
    pub fn take(&self, indices: &[usize]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|col| indices.iter().map(|&i| col[i].clone()).collect())
            .collect();
        Self {
            names: self.names.clone(),
            columns,
            rows: indices.len(),
        }
    }

    /// A single row as a record
    pub fn record(&self, row: usize) -> Option<Record> {
        if row >= self.rows {
            return None;
        }
        Some(
            self.names
                .iter()
                .zip(&self.columns)
                .map(|(n, c)| (n.clone(), c[row].clone()))
                .collect(),
        )
    }
}
