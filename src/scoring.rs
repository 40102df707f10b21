//! Scoring service: request normalization, lazy model slot, decision policy
//!
//! The fitted pipeline is loaded at most once per process, either eagerly at
//! startup or on the first request. After that every request reads it through
//! a shared reference with no locking.

use std::sync::{Mutex, OnceLock, PoisonError};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::pipeline::{
    ArtifactError, ArtifactStore, Classifier, FittedPipeline, GradientBoostedTrees, PredictError,
    RawValue, Record,
};

/// Approval threshold used when none is configured
pub const DEFAULT_APPROVAL_THRESHOLD: f64 = 0.30;

/// Optional wrapper key around the application fields
pub const APPLICATION_KEY: &str = "application";

#[derive(Debug, Error, PartialEq)]
#[error("Approval threshold must be between 0.0 and 1.0, got {0}")]
pub struct ThresholdError(pub f64);

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("Request body is not valid JSON")]
    InvalidJson(#[source] serde_json::Error),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Model is not available")]
    ModelUnavailable(#[from] ArtifactError),

    #[error("Prediction failed")]
    PredictionFailed(#[from] PredictError),

    #[error("Internal error")]
    Internal(String),
}

impl ScoreError {
    /// Machine-readable code for response bodies
    pub fn code(&self) -> &'static str {
        match self {
            ScoreError::InvalidJson(_) => "invalid_json",
            ScoreError::InvalidRequest(_) => "invalid_request",
            ScoreError::ModelUnavailable(_) => "model_unavailable",
            ScoreError::PredictionFailed(_) => "prediction_failed",
            ScoreError::Internal(_) => "internal_error",
        }
    }

    /// Underlying cause, if any
    pub fn details(&self) -> Option<String> {
        match self {
            ScoreError::InvalidJson(e) => Some(e.to_string()),
            ScoreError::Internal(detail) => Some(detail.clone()),
            ScoreError::InvalidRequest(_) => None,
            ScoreError::ModelUnavailable(e) => Some(e.to_string()),
            ScoreError::PredictionFailed(e) => Some(e.to_string()),
        }
    }
}

/// Converts a probability of default into an approve/deny decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPolicy {
    threshold: f64,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_APPROVAL_THRESHOLD,
        }
    }
}

impl DecisionPolicy {
    pub fn new(threshold: f64) -> Result<Self, ThresholdError> {
        if (0.0..=1.0).contains(&threshold) {
            Ok(Self { threshold })
        } else {
            Err(ThresholdError(threshold))
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Approve strictly below the threshold
    pub fn approves(&self, default_probability: f64) -> bool {
        default_probability < self.threshold
    }

    pub fn decide(&self, default_probability: f64) -> ScoreResponse {
        ScoreResponse {
            approved: u8::from(self.approves(default_probability)),
            default_probability,
            approval_threshold: self.threshold,
        }
    }
}

/// Successful scoring response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    /// 1 when approved, 0 when denied
    pub approved: u8,
    pub default_probability: f64,
    pub approval_threshold: f64,
}

/// Turn a request body into a single application record.
///
/// `{"application": {...}}` and the bare `{...}` are equivalent.
pub fn normalize_request(request: &Value) -> Result<Record, ScoreError> {
    let Value::Object(map) = request else {
        return Err(ScoreError::InvalidRequest(
            "Request body must be a JSON object of feature values".to_string(),
        ));
    };

    let fields = match map.get(APPLICATION_KEY) {
        Some(Value::Object(inner)) => inner,
        _ => map,
    };

    if fields.is_empty() {
        return Err(ScoreError::InvalidRequest(
            "Request contains no feature values".to_string(),
        ));
    }

    Ok(fields
        .iter()
        .map(|(name, value)| (name.clone(), RawValue::from_json(value)))
        .collect())
}

/// Holds the process-wide model slot and the decision policy
pub struct ScoringService<C = GradientBoostedTrees> {
    store: Option<ArtifactStore>,
    pipeline: OnceLock<FittedPipeline<C>>,
    load_lock: Mutex<()>,
    policy: DecisionPolicy,
}

impl<C> std::fmt::Debug for ScoringService<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringService")
            .field("store", &self.store)
            .field("loaded", &self.pipeline.get().is_some())
            .field("policy", &self.policy)
            .finish()
    }
}

impl<C: Classifier + DeserializeOwned> ScoringService<C> {
    /// Service that loads its pipeline from `store` on first use
    pub fn from_store(store: ArtifactStore, policy: DecisionPolicy) -> Self {
        Self {
            store: Some(store),
            pipeline: OnceLock::new(),
            load_lock: Mutex::new(()),
            policy,
        }
    }

    /// Service around an already fitted pipeline
    pub fn from_pipeline(pipeline: FittedPipeline<C>, policy: DecisionPolicy) -> Self {
        Self {
            store: None,
            pipeline: OnceLock::from(pipeline),
            load_lock: Mutex::new(()),
            policy,
        }
    }

    pub fn policy(&self) -> DecisionPolicy {
        self.policy
    }

    pub fn is_loaded(&self) -> bool {
        self.pipeline.get().is_some()
    }

    /// Load the pipeline if needed. Concurrent callers wait for a single load.
    pub fn ensure_loaded(&self) -> Result<&FittedPipeline<C>, ScoreError> {
        if let Some(pipeline) = self.pipeline.get() {
            return Ok(pipeline);
        }

        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pipeline) = self.pipeline.get() {
            return Ok(pipeline);
        }

        let store = self
            .store
            .as_ref()
            .ok_or_else(|| ScoreError::Internal("No artifact store configured".to_string()))?;
        let pipeline = store.load_pipeline::<C>()?;
        info!(
            path = %store.model_path().display(),
            target = %pipeline.target_column,
            features = pipeline.preprocessor().n_features(),
            "Loaded fitted pipeline"
        );

        Ok(self.pipeline.get_or_init(|| pipeline))
    }

    /// Score an already parsed request
    pub fn score(&self, request: &Value) -> Result<ScoreResponse, ScoreError> {
        let record = normalize_request(request)?;
        let pipeline = self.ensure_loaded()?;
        let probability = pipeline.predict_record(&record)?;
        Ok(self.policy.decide(probability))
    }

    /// Score a raw JSON request body
    pub fn score_bytes(&self, body: &[u8]) -> Result<ScoreResponse, ScoreError> {
        let request: Value =
            serde_json::from_slice(body).map_err(ScoreError::InvalidJson)?;
        self.score(&request)
    }
}
