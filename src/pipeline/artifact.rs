//! Fitted pipeline and the artifacts directory that stores it
//!
//! The store is a single named slot: `model.json` holds the current fitted
//! pipeline, `metrics.json` the report of the run that produced it.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::boosting::GradientBoostedTrees;
use super::classifier::{Classifier, ClassifierError};
use super::dataset::Record;
use super::preprocess::{FittedPreprocessor, TransformError};

/// File name of the fitted pipeline inside the artifacts directory
pub const MODEL_FILE: &str = "model.json";

/// File name of the training report inside the artifacts directory
pub const METRICS_FILE: &str = "metrics.json";

/// Default artifacts directory, relative to the working directory
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error(
        "Model artifact not found at {}. Run `riskgate train` first to generate it.",
        path.display()
    )]
    Missing { path: PathBuf },

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize {}: {source}", path.display())]
    Format {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Error from running a record or dataset through a fitted pipeline
#[derive(Debug, Error, PartialEq)]
pub enum PredictError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

/// Immutable pairing of preprocessing state and trained classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPipeline<C = GradientBoostedTrees> {
    /// Label column the pipeline was trained against
    pub target_column: String,
    preprocessor: FittedPreprocessor,
    classifier: C,
}

impl<C: Classifier> FittedPipeline<C> {
    pub fn new(target_column: String, preprocessor: FittedPreprocessor, classifier: C) -> Self {
        Self {
            target_column,
            preprocessor,
            classifier,
        }
    }

    pub fn preprocessor(&self) -> &FittedPreprocessor {
        &self.preprocessor
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Probability of default for a single application record
    pub fn predict_record(&self, record: &Record) -> Result<f64, PredictError> {
        let features = self.preprocessor.transform_record(record)?;
        let probabilities = self.classifier.predict_probability(&features)?;
        probabilities
            .first()
            .copied()
            .ok_or(PredictError::Classifier(ClassifierError::EmptyPrediction {
                rows: features.n_rows(),
            }))
    }
}

/// Artifacts directory holding the current model and its metrics
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.dir.join(METRICS_FILE)
    }

    /// Whether a model has already been written to this store
    pub fn has_model(&self) -> bool {
        self.model_path().exists()
    }

    /// Persist the fitted pipeline, replacing any previous one
    pub fn save_pipeline<C: Serialize>(&self, pipeline: &FittedPipeline<C>) -> Result<PathBuf, ArtifactError> {
        let path = self.model_path();
        self.write_json(&path, pipeline)?;
        Ok(path)
    }

    /// Load the fitted pipeline. A missing file is reported as `Missing`.
    pub fn load_pipeline<C: DeserializeOwned>(&self) -> Result<FittedPipeline<C>, ArtifactError> {
        let path = self.model_path();
        if !path.exists() {
            return Err(ArtifactError::Missing { path });
        }
        let file = File::open(&path).map_err(|source| ArtifactError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|source| ArtifactError::Format { path, source })
    }

    /// Persist a serializable report next to the model
    pub fn save_report<T: Serialize>(&self, report: &T) -> Result<PathBuf, ArtifactError> {
        let path = self.metrics_path();
        self.write_json(&path, report)?;
        Ok(path)
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), ArtifactError> {
        let io_err = |source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(|source| ArtifactError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value).map_err(|source| {
            ArtifactError::Format {
                path: path.to_path_buf(),
                source,
            }
        })?;
        writer.flush().map_err(io_err)
    }
}
