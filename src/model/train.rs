//! Gold → model artifact.

use crate::error::{PipelineError, Result};
use crate::model::artifact::{ModelArtifact, SCHEMA_VERSION, TrainingMetrics};
use crate::model::features::FeatureSchema;
use crate::model::regression::{RidgeRegression, mean_absolute_error};
use crate::model::split::{SplitConfig, split};
use crate::pipeline::stages::load_gold;
use crate::pipeline::types::AggregatedRecord;
use crate::storage::{Container, ObjectStore};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainOptions {
    pub split: SplitConfig,
    /// Ridge penalty.
    pub lambda: f64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            split: SplitConfig::default(),
            lambda: 1.0,
        }
    }
}

/// Fits a model on `gold`. Records without a mean ridership carry no target
/// and are skipped; if none remain, the Gold set counts as empty.
pub fn train(gold: Vec<AggregatedRecord>, options: &TrainOptions) -> Result<ModelArtifact> {
    let gold_rows = gold.len();
    let usable: Vec<AggregatedRecord> = gold.into_iter().filter(|r| r.mean.is_some()).collect();
    if usable.len() < gold_rows {
        warn!(skipped = gold_rows - usable.len(), "Gold records without ridership skipped");
    }
    if usable.is_empty() {
        return Err(PipelineError::EmptyInput {
            stage: "train",
            container: Container::Gold.to_string(),
        });
    }

    let features = FeatureSchema::fit(&usable);
    let (train_set, holdout) = split(
        usable,
        |r| format!("{}|{}|{}", r.route_id, r.day_of_week, r.hour),
        options.split,
    )?;

    let (x_train, y_train) = design(&features, &train_set)?;
    let model = RidgeRegression::fit(&x_train, &y_train, options.lambda)?;

    let train_pred: Vec<f64> = x_train.iter().map(|row| model.predict(row)).collect();
    let (x_hold, y_hold) = design(&features, &holdout)?;
    let hold_pred: Vec<f64> = x_hold.iter().map(|row| model.predict(row)).collect();

    let metrics = TrainingMetrics {
        gold_rows,
        train_rows: train_set.len(),
        holdout_rows: holdout.len(),
        train_mae: mean_absolute_error(&y_train, &train_pred),
        holdout_mae: mean_absolute_error(&y_hold, &hold_pred),
    };

    info!(
        routes = features.routes.len(),
        train_rows = metrics.train_rows,
        holdout_rows = metrics.holdout_rows,
        train_mae = ?metrics.train_mae,
        holdout_mae = ?metrics.holdout_mae,
        "Model trained"
    );

    Ok(ModelArtifact {
        schema_version: SCHEMA_VERSION,
        algorithm: "ridge_regression".to_string(),
        split: options.split,
        feature_names: features.feature_names(),
        features,
        model,
        metrics,
    })
}

fn design(
    features: &FeatureSchema,
    records: &[AggregatedRecord],
) -> Result<(Vec<Vec<f64>>, Vec<f64>)> {
    let mut rows = Vec::with_capacity(records.len());
    let mut targets = Vec::with_capacity(records.len());
    for r in records {
        let Some(target) = r.mean else { continue };
        rows.push(features.encode(&r.route_id, r.day_of_week, r.hour, r.latitude, r.longitude)?);
        targets.push(target);
    }
    Ok((rows, targets))
}

/// Loads the full Gold set and trains on it.
#[tracing::instrument(skip(store))]
pub async fn run_training(
    store: &dyn ObjectStore,
    gzip: bool,
    options: &TrainOptions,
) -> Result<ModelArtifact> {
    let gold = load_gold(store, gzip).await?;
    train(gold, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::crowd::{CrowdLevel, crowd_level};

    fn gold(route: &str, day: u32, hour: u32, mean: Option<f64>) -> AggregatedRecord {
        AggregatedRecord {
            route_id: route.to_string(),
            day_of_week: day,
            hour,
            borough: Some("Manhattan".into()),
            latitude: Some(if route == "Busy" { 40.75 } else { 40.60 }),
            longitude: Some(-73.98),
            count: 4,
            sum: mean.unwrap_or(0.0) * 4.0,
            mean,
            stddev: Some(1.0),
        }
    }

    fn sample_gold() -> Vec<AggregatedRecord> {
        let mut rows = Vec::new();
        for day in 0..7 {
            for hour in 0..24 {
                let peak = if (7..10).contains(&hour) { 1500.0 } else { 0.0 };
                rows.push(gold("Busy", day, hour, Some(2000.0 + peak)));
                rows.push(gold("Quiet", day, hour, Some(50.0 + peak / 10.0)));
            }
        }
        rows
    }

    #[test]
    fn test_empty_gold_is_data_availability_error() {
        let err = train(Vec::new(), &TrainOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyInput { stage: "train", .. }));
        assert_eq!(err.category().exit_code(), 3);
    }

    #[test]
    fn test_gold_without_targets_counts_as_empty() {
        let err = train(vec![gold("A", 0, 0, None)], &TrainOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyInput { .. }));
    }

    #[test]
    fn test_train_separates_routes_and_reports_mae() {
        let artifact = train(sample_gold(), &TrainOptions::default()).unwrap();

        assert_eq!(artifact.metrics.gold_rows, 336);
        assert_eq!(artifact.metrics.train_rows + artifact.metrics.holdout_rows, 336);
        assert!(artifact.metrics.holdout_mae.is_some());
        assert_eq!(artifact.feature_names.len(), artifact.features.dimension());

        let busy = artifact.predict("Busy", 2, 8).unwrap();
        let quiet = artifact.predict("Quiet", 2, 3).unwrap();
        assert!(busy > quiet);
        assert_eq!(crowd_level(busy), CrowdLevel::High);
        assert_eq!(crowd_level(quiet), CrowdLevel::Low);

        let forecast = artifact.forecast_day("Busy", 0).unwrap();
        assert_eq!(forecast.len(), 24);
        assert!(forecast[8].1 > forecast[3].1);
    }

    #[test]
    fn test_training_is_deterministic() {
        let a = train(sample_gold(), &TrainOptions::default()).unwrap();
        let mut reversed = sample_gold();
        reversed.reverse();
        let b = train(reversed, &TrainOptions::default()).unwrap();
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }

    #[test]
    fn test_routes_lists_known_stations() {
        let artifact = train(sample_gold(), &TrainOptions::default()).unwrap();
        let ids: Vec<&str> = artifact.routes().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["Busy", "Quiet"]);
        assert_eq!(artifact.routes()[0].latitude, Some(40.75));
        assert!(ids.iter().all(|id| artifact.predict(id, 0, 12).is_ok()));
    }

    #[test]
    fn test_unknown_route_fails() {
        let artifact = train(sample_gold(), &TrainOptions::default()).unwrap();
        assert!(matches!(
            artifact.predict("Nowhere", 0, 0),
            Err(PipelineError::UnknownRoute(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models/ridership_model.json");
        let artifact = train(sample_gold(), &TrainOptions::default()).unwrap();

        artifact.save(&path).unwrap();
        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded.features, artifact.features);
        assert_eq!(loaded.metrics.gold_rows, artifact.metrics.gold_rows);

        let missing = ModelArtifact::load(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(missing.category().exit_code(), 3);
    }
}
