//! Training report written next to the model as `metrics.json`

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::pipeline::{BoostingConfig, TrainingMetrics};

/// Metadata about the training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Timestamp of the run (RFC 3339)
    pub timestamp: String,
    /// riskgate version
    pub riskgate_version: String,
    /// Dataset the model was trained on
    pub input_file: String,
    /// Seed used for the stratified split
    pub seed: u64,
    /// Boosting hyperparameters
    pub classifier: BoostingConfig,
}

/// Complete training report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub metadata: RunMetadata,
    /// Split sizes, class counts and per-split metrics
    #[serde(flatten)]
    pub metrics: TrainingMetrics,
}

impl TrainingReport {
    pub fn new(input_file: &str, seed: u64, classifier: BoostingConfig, metrics: TrainingMetrics) -> Self {
        Self {
            metadata: RunMetadata {
                timestamp: Utc::now().to_rfc3339(),
                riskgate_version: env!("CARGO_PKG_VERSION").to_string(),
                input_file: input_file.to_string(),
                seed,
                classifier,
            },
            metrics,
        }
    }
}
