//! Capability interface for trainable binary classifiers

use thiserror::Error;

use super::preprocess::FeatureMatrix;

#[derive(Debug, Error, PartialEq)]
pub enum ClassifierError {
    #[error("Cannot fit a classifier on zero rows")]
    EmptyTrainingSet,

    #[error("Got {labels} labels for {rows} feature rows")]
    LabelCountMismatch { rows: usize, labels: usize },

    #[error("Feature width mismatch: model expects {expected} columns, got {actual}")]
    FeatureWidthMismatch { expected: usize, actual: usize },

    #[error("Classifier has not been fitted")]
    NotFitted,

    #[error("Classifier returned no probabilities for {rows} input row(s)")]
    EmptyPrediction { rows: usize },
}

/// A binary classifier that can be fitted and then queried for the
/// probability of the positive class.
///
/// Implementations must be `Send + Sync` so one fitted instance can serve
/// concurrent requests; `predict_probability` takes `&self` and must not
/// mutate shared state.
pub trait Classifier: Send + Sync {
    /// Fit on a feature matrix and 0/1 labels
    fn fit(&mut self, features: &FeatureMatrix, labels: &[u8]) -> Result<(), ClassifierError>;

    /// Probability of the positive class for each row
    fn predict_probability(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ClassifierError>;
}

/// Check the usual `fit` preconditions
pub fn validate_fit_inputs(features: &FeatureMatrix, labels: &[u8]) -> Result<(), ClassifierError> {
    if features.n_rows() == 0 {
        return Err(ClassifierError::EmptyTrainingSet);
    }
    if features.n_rows() != labels.len() {
        return Err(ClassifierError::LabelCountMismatch {
            rows: features.n_rows(),
            labels: labels.len(),
        });
    }
    Ok(())
}
