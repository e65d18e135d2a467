//! Trait and types for the upstream ridership source.

use crate::error::{PipelineError, Result};
use chrono::NaiveDate;
use std::fmt;

/// Inclusive range of service dates to ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(PipelineError::Configuration(format!(
                "date range start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Number of days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// A source of raw ridership CSV.
///
/// Implementations return the body exactly as the source produced it; nothing
/// is parsed or reshaped before it lands in Bronze.
#[async_trait::async_trait]
pub trait TransitApi: Send + Sync {
    /// Human-readable description for logs.
    fn describe(&self) -> String;

    /// Fetches every observation within `range`. A configured byte cap may
    /// stop the download early, always on a row boundary.
    async fn fetch_range(&self, range: &DateRange) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_single_day_range() {
        let range = DateRange::new(date("2024-03-01"), date("2024-03-01")).unwrap();
        assert_eq!(range.days(), 1);
        assert_eq!(range.to_string(), "2024-03-01..=2024-03-01");
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let err = DateRange::new(date("2024-03-02"), date("2024-03-01")).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }
}
