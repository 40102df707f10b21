//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::pipeline::{
    BoostingConfig, DEFAULT_ARTIFACTS_DIR, DEFAULT_INFER_SCHEMA_LENGTH, DEFAULT_SEED, MAX_BINS,
};
use crate::scoring::DEFAULT_APPROVAL_THRESHOLD;

/// riskgate - Train a credit-risk model and serve approve/deny decisions
#[derive(Parser, Debug)]
#[command(name = "riskgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the scoring pipeline on a CSV or Parquet dataset
    Train(TrainArgs),

    /// Serve approve/deny decisions over HTTP
    Serve(ServeArgs),

    /// Score a single JSON request from a file or stdin
    Score(ScoreArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Input dataset path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Target column name.
    /// Defaults to `loan_status` when present, otherwise the last column.
    #[arg(short, long)]
    pub target: Option<String>,

    /// Artifacts directory receiving model.json and metrics.json
    #[arg(short, long, env = "RISKGATE_ARTIFACTS_DIR", default_value = DEFAULT_ARTIFACTS_DIR)]
    pub output: PathBuf,

    /// Seed for the stratified split and tree sampling
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Number of boosting rounds
    #[arg(long, default_value = "500", value_parser = validate_positive)]
    pub n_estimators: usize,

    /// Shrinkage applied to every tree
    #[arg(long, default_value = "0.05", value_parser = validate_learning_rate)]
    pub learning_rate: f64,

    /// Maximum depth of each tree
    #[arg(long, default_value = "5", value_parser = validate_positive)]
    pub max_depth: usize,

    /// Fraction of rows sampled per tree (0, 1]
    #[arg(long, default_value = "0.9", value_parser = validate_fraction)]
    pub subsample: f64,

    /// Fraction of features sampled per tree (0, 1]
    #[arg(long, default_value = "0.9", value_parser = validate_fraction)]
    pub colsample_bytree: f64,

    /// L2 regularisation on leaf weights
    #[arg(long, default_value = "1.0", value_parser = validate_non_negative)]
    pub reg_lambda: f64,

    /// Skip the confirmation prompt before overwriting existing artifacts
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan (very slow for large files).
    #[arg(long, default_value_t = DEFAULT_INFER_SCHEMA_LENGTH)]
    pub infer_schema_length: usize,
}

impl TrainArgs {
    /// Boosting hyperparameters from the command line
    pub fn boosting_config(&self) -> BoostingConfig {
        BoostingConfig {
            n_estimators: self.n_estimators,
            learning_rate: self.learning_rate,
            max_depth: self.max_depth,
            subsample: self.subsample,
            colsample_bytree: self.colsample_bytree,
            reg_lambda: self.reg_lambda,
            max_bins: MAX_BINS,
            seed: self.seed,
            ..BoostingConfig::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Artifacts directory containing model.json
    #[arg(long, env = "RISKGATE_ARTIFACTS_DIR", default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts: PathBuf,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind
    #[arg(long, default_value = "5000")]
    pub port: u16,

    /// Approve when the probability of default is below this value
    #[arg(long, env = "APPROVAL_THRESHOLD", default_value_t = DEFAULT_APPROVAL_THRESHOLD, value_parser = validate_threshold)]
    pub threshold: f64,

    /// Defer loading the model until the first request
    #[arg(long, default_value = "false")]
    pub lazy: bool,
}

#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// JSON request file. Reads stdin when omitted.
    pub request: Option<PathBuf>,

    /// Artifacts directory containing model.json
    #[arg(long, env = "RISKGATE_ARTIFACTS_DIR", default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts: PathBuf,

    /// Approve when the probability of default is below this value
    #[arg(long, env = "APPROVAL_THRESHOLD", default_value_t = DEFAULT_APPROVAL_THRESHOLD, value_parser = validate_threshold)]
    pub threshold: f64,
}

fn parse_f64(s: &str) -> Result<f64, String> {
    s.parse()
        .map_err(|_| format!("'{}' is not a valid number", s))
}

/// Validator for the approval threshold
pub fn validate_threshold(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if !(0.0..=1.0).contains(&value) {
        Err(format!(
            "threshold must be between 0.0 and 1.0, got {}",
            value
        ))
    } else {
        Ok(value)
    }
}

/// Validator for sampling fractions in (0, 1]
fn validate_fraction(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(format!("fraction must be in (0.0, 1.0], got {}", value))
    }
}

fn validate_learning_rate(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(format!("learning_rate must be positive, got {}", value))
    }
}

fn validate_non_negative(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if value >= 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(format!("value must be non-negative, got {}", value))
    }
}

fn validate_positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("value must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{}' is not a valid positive integer", s)),
    }
}
