//! Pipeline module - label normalization, preprocessing, training and artifacts

pub mod artifact;
pub mod boosting;
pub mod classifier;
pub mod dataset;
pub mod features;
pub mod loader;
pub mod metrics;
pub mod preprocess;
pub mod split;
pub mod target;
pub mod train;

pub use artifact::*;
pub use boosting::*;
pub use classifier::*;
pub use dataset::*;
pub use features::*;
pub use loader::*;
pub use metrics::*;
pub use preprocess::*;
pub use split::*;
pub use target::*;
pub use train::*;
