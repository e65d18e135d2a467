//! Record types for each medallion layer.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One Bronze CSV row with normalized header names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based line in the Bronze object, for drop diagnostics.
    pub line: u64,
    pub fields: BTreeMap<String, String>,
}

impl RawRecord {
    /// Trimmed value of `column`, or `None` when absent or blank.
    pub fn field(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// A Raw Record that passed cleaning. Written to Silver.
///
/// `date`, `hour` and `day_of_week` (Monday = 0) are derived from
/// `timestamp`; every other field is carried over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRecord {
    pub timestamp: NaiveDateTime,
    pub date: NaiveDate,
    pub hour: u32,
    pub day_of_week: u32,
    pub route_id: String,
    pub stop_id: Option<String>,
    pub borough: Option<String>,
    pub ridership: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Fixed grouping key for aggregation: route and weekly time bucket.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub route_id: String,
    pub day_of_week: u32,
    pub hour: u32,
}

/// Summary of all Cleaned Records sharing a [`GroupKey`]. Written to Gold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRecord {
    pub route_id: String,
    pub day_of_week: u32,
    pub hour: u32,
    pub borough: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Contributing Cleaned Records.
    pub count: usize,
    pub sum: f64,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
}

impl AggregatedRecord {
    pub fn key(&self) -> GroupKey {
        GroupKey {
            route_id: self.route_id.clone(),
            day_of_week: self.day_of_week,
            hour: self.hour,
        }
    }
}
