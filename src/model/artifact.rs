//! The persisted model: weights, feature schema and the run's metrics.

use crate::error::{PipelineError, Result};
use crate::model::features::{FeatureSchema, HOURS, RouteInfo};
use crate::model::regression::RidgeRegression;
use crate::model::split::SplitConfig;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;

pub const SCHEMA_VERSION: u8 = 1;

/// Default local location of the artifact.
pub const DEFAULT_MODEL_PATH: &str = "models/ridership_model.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub gold_rows: usize,
    pub train_rows: usize,
    pub holdout_rows: usize,
    pub train_mae: Option<f64>,
    /// `None` when the Gold set was too small to hold anything out.
    pub holdout_mae: Option<f64>,
}

/// Everything the serving side needs. Contains no timestamps so that a
/// re-run on unchanged Gold produces identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema_version: u8,
    pub algorithm: String,
    pub split: SplitConfig,
    pub features: FeatureSchema,
    pub feature_names: Vec<String>,
    pub model: RidgeRegression,
    pub metrics: TrainingMetrics,
}

impl ModelArtifact {
    /// Predicted riders for `route_id` in the given weekly bucket, using the
    /// route's recorded coordinates. Negative fits are floored at zero.
    pub fn predict(&self, route_id: &str, day_of_week: u32, hour: u32) -> Result<f64> {
        let route = self
            .features
            .route(route_id)
            .ok_or_else(|| PipelineError::UnknownRoute(route_id.to_string()))?;
        let row = self.features.encode(
            route_id,
            day_of_week,
            hour,
            route.latitude,
            route.longitude,
        )?;
        Ok(self.model.predict(&row).max(0.0))
    }

    /// Routes the model can predict for, sorted by id.
    pub fn routes(&self) -> &[RouteInfo] {
        &self.features.routes
    }

    /// Predictions for every hour of one day.
    pub fn forecast_day(&self, route_id: &str, day_of_week: u32) -> Result<Vec<(u32, f64)>> {
        (0..HOURS as u32)
            .map(|hour| -> Result<(u32, f64)> {
                Ok((hour, self.predict(route_id, day_of_week, hour)?))
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Writes the artifact to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let body = match std::fs::read(path) {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PipelineError::MissingObject {
                    container: "local".into(),
                    path: path.display().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let artifact: ModelArtifact = serde_json::from_slice(&body)?;
        if artifact.schema_version != SCHEMA_VERSION {
            return Err(PipelineError::Configuration(format!(
                "model artifact schema {} is not supported (expected {SCHEMA_VERSION})",
                artifact.schema_version
            )));
        }
        Ok(artifact)
    }
}
