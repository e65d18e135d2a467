use serde::Serialize;

use crate::pipeline::clean::DropReason;

/// Counters for one cleaning run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CleaningStats {
    pub input: usize,
    pub kept: usize,

    // drop reasons
    pub missing_timestamp: usize,
    pub unparseable_timestamp: usize,
    pub missing_route: usize,

    /// Rows the CSV reader could not decode.
    pub malformed_rows: usize,
    /// Optional numeric cells replaced by null.
    pub null_filled: usize,
}

impl CleaningStats {
    pub fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::MissingTimestamp => self.missing_timestamp += 1,
            DropReason::UnparseableTimestamp => self.unparseable_timestamp += 1,
            DropReason::MissingRoute => self.missing_route += 1,
        }
    }

    pub fn dropped(&self) -> usize {
        self.missing_timestamp + self.unparseable_timestamp + self.missing_route
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    pub fn kept_pct(&self) -> f64 {
        Self::pct(self.kept, self.input)
    }
}

/// Counters for one aggregation run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationStats {
    pub input: usize,
    pub groups: usize,
    pub single_record_groups: usize,
    /// Groups where no record carried a ridership value.
    pub groups_without_ridership: usize,
}
