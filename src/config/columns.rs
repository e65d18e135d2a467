use crate::error::{PipelineError, Result};
use serde::Deserialize;

/// Maps Raw Record fields to Bronze CSV column names.
///
/// Defaults follow the MTA hourly ridership export. An override is a plain
/// JSON object on disk; omitted keys keep their default:
/// ```json
/// {
///   "route_id": "route",
///   "timestamp": "observed_at"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnMapping {
    pub timestamp: String,
    pub route_id: String,
    pub stop_id: String,
    pub ridership: String,
    pub borough: String,
    pub latitude: String,
    pub longitude: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            timestamp: "transit_timestamp".into(),
            route_id: "station_complex".into(),
            stop_id: "station_complex_id".into(),
            ridership: "ridership".into(),
            borough: "borough".into(),
            latitude: "latitude".into(),
            longitude: "longitude".into(),
        }
    }
}

impl ColumnMapping {
    /// Loads a mapping from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let mapping: ColumnMapping = serde_json::from_str(content)
            .map_err(|e| PipelineError::Configuration(format!("invalid column mapping: {e}")))?;
        Ok(mapping.normalized())
    }

    /// Applies the same header normalization used for Bronze columns.
    pub fn normalized(self) -> Self {
        Self {
            timestamp: normalize_column(&self.timestamp),
            route_id: normalize_column(&self.route_id),
            stop_id: normalize_column(&self.stop_id),
            ridership: normalize_column(&self.ridership),
            borough: normalize_column(&self.borough),
            latitude: normalize_column(&self.latitude),
            longitude: normalize_column(&self.longitude),
        }
    }
}

/// Lower-cases a header and replaces spaces with underscores.
pub fn normalize_column(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}
