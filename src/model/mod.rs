//! Regression model over the Gold set, its persisted artifact, and the
//! serving helpers built on it.

pub mod artifact;
pub mod crowd;
pub mod features;
pub mod regression;
pub mod split;
pub mod train;

pub use artifact::ModelArtifact;
pub use train::{TrainOptions, run_training, train};
