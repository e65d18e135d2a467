//! Local run log for training runs.
//!
//! Each `train` invocation appends one row so that evaluation metrics can be
//! compared across runs.

use crate::error::Result;
use crate::model::ModelArtifact;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_RUN_LOG: &str = "models/training_runs.csv";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingRun {
    pub trained_at: DateTime<Utc>,
    pub algorithm: String,
    pub gold_rows: usize,
    pub train_rows: usize,
    pub holdout_rows: usize,
    pub routes: usize,
    pub train_mae: Option<f64>,
    pub holdout_mae: Option<f64>,
    pub artifact: String,
}

impl TrainingRun {
    pub fn from_artifact(artifact: &ModelArtifact, artifact_path: &Path) -> Self {
        Self {
            trained_at: Utc::now(),
            algorithm: artifact.algorithm.clone(),
            gold_rows: artifact.metrics.gold_rows,
            train_rows: artifact.metrics.train_rows,
            holdout_rows: artifact.metrics.holdout_rows,
            routes: artifact.features.routes.len(),
            train_mae: artifact.metrics.train_mae,
            holdout_mae: artifact.metrics.holdout_mae,
            artifact: artifact_path.display().to_string(),
        }
    }
}

/// Appends a record as a row to a CSV file.
///
/// Creates the file (and its directory) with headers if it does not exist.
pub fn append_record(path: &Path, record: &impl Serialize) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending CSV record");

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn run() -> TrainingRun {
        TrainingRun {
            trained_at: Utc::now(),
            algorithm: "ridge_regression".into(),
            gold_rows: 10,
            train_rows: 8,
            holdout_rows: 2,
            routes: 3,
            train_mae: Some(1.5),
            holdout_mae: None,
            artifact: "models/ridership_model.json".into(),
        }
    }

    #[test]
    fn test_append_record_creates_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/runs.csv");

        append_record(&path, &run()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("trained_at,algorithm,"));
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.csv");

        append_record(&path, &run()).unwrap();
        append_record(&path, &run()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("trained_at")).count();
        assert_eq!(header_count, 1);
        assert_eq!(content.lines().count(), 3);
    }
}
