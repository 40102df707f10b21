//! riskgate: Credit-Risk Scoring Library
//!
//! Target-label normalization, a fitted preprocessing pipeline,
//! gradient-boosted trees and a threshold-based scoring service.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod server;
pub mod utils;
