//! Report module - training report export and terminal summary

pub mod metrics_export;
pub mod summary;

pub use metrics_export::*;
pub use summary::*;
