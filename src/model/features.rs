//! Feature schema: how a Gold record becomes a design-matrix row.
//!
//! Layout: intercept, one-hot route, one-hot hour (24), one-hot day of week
//! (7), standardized latitude, standardized longitude.

use crate::error::{PipelineError, Result};
use crate::pipeline::types::AggregatedRecord;
use crate::pipeline::utility::{mean, stddev};
use serde::{Deserialize, Serialize};

pub const HOURS: usize = 24;
pub const DAYS: usize = 7;

/// A route known to the model, with the coordinates used at prediction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub id: String,
    pub borough: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Standardizes one coordinate. Missing values map to the mean (0.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: f64,
    pub scale: f64,
}

impl Scaler {
    pub fn fit(values: &[f64]) -> Self {
        let Some(m) = mean(values) else {
            return Self {
                mean: 0.0,
                scale: 1.0,
            };
        };
        let sd = stddev(values, m).unwrap_or(0.0);
        Self {
            mean: m,
            scale: if sd > 0.0 { sd } else { 1.0 },
        }
    }

    pub fn apply(&self, value: Option<f64>) -> f64 {
        value.map(|v| (v - self.mean) / self.scale).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    /// Sorted by id; a route's position is its encoding.
    pub routes: Vec<RouteInfo>,
    pub latitude: Scaler,
    pub longitude: Scaler,
}

impl FeatureSchema {
    /// Builds the route vocabulary and coordinate scaling from the full Gold
    /// set, so that routes seen only in the holdout are still encodable.
    pub fn fit(records: &[AggregatedRecord]) -> Self {
        let mut routes: Vec<RouteInfo> = Vec::new();
        let mut sorted: Vec<&AggregatedRecord> = records.iter().collect();
        sorted.sort_by(|a, b| a.key().cmp(&b.key()));

        let lats: Vec<f64> = sorted.iter().filter_map(|r| r.latitude).collect();
        let lons: Vec<f64> = sorted.iter().filter_map(|r| r.longitude).collect();

        for record in sorted {
            match routes.last_mut() {
                Some(last) if last.id == record.route_id => {
                    if last.latitude.is_none() {
                        last.latitude = record.latitude;
                    }
                    if last.longitude.is_none() {
                        last.longitude = record.longitude;
                    }
                    if last.borough.is_none() {
                        last.borough = record.borough.clone();
                    }
                }
                _ => routes.push(RouteInfo {
                    id: record.route_id.clone(),
                    borough: record.borough.clone(),
                    latitude: record.latitude,
                    longitude: record.longitude,
                }),
            }
        }

        Self {
            routes,
            latitude: Scaler::fit(&lats),
            longitude: Scaler::fit(&lons),
        }
    }

    pub fn dimension(&self) -> usize {
        1 + self.routes.len() + HOURS + DAYS + 2
    }

    pub fn route_index(&self, id: &str) -> Option<usize> {
        self.routes
            .binary_search_by(|r| r.id.as_str().cmp(id))
            .ok()
    }

    pub fn route(&self, id: &str) -> Option<&RouteInfo> {
        self.route_index(id).map(|i| &self.routes[i])
    }

    /// Encodes one observation.
    pub fn encode(
        &self,
        route_id: &str,
        day_of_week: u32,
        hour: u32,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Vec<f64>> {
        let route = self
            .route_index(route_id)
            .ok_or_else(|| PipelineError::UnknownRoute(route_id.to_string()))?;
        if hour as usize >= HOURS {
            return Err(PipelineError::Configuration(format!("hour {hour} out of range")));
        }
        if day_of_week as usize >= DAYS {
            return Err(PipelineError::Configuration(format!(
                "day of week {day_of_week} out of range"
            )));
        }

        let n_routes = self.routes.len();
        let mut row = vec![0.0; self.dimension()];
        row[0] = 1.0;
        row[1 + route] = 1.0;
        row[1 + n_routes + hour as usize] = 1.0;
        row[1 + n_routes + HOURS + day_of_week as usize] = 1.0;
        row[1 + n_routes + HOURS + DAYS] = self.latitude.apply(latitude);
        row[2 + n_routes + HOURS + DAYS] = self.longitude.apply(longitude);
        Ok(row)
    }

    /// Column names matching [`encode`](Self::encode).
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.dimension());
        names.push("intercept".to_string());
        names.extend(self.routes.iter().map(|r| format!("route={}", r.id)));
        names.extend((0..HOURS).map(|h| format!("hour={h}")));
        names.extend((0..DAYS).map(|d| format!("day_of_week={d}")));
        names.push("latitude".to_string());
        names.push("longitude".to_string());
        names
    }
}
