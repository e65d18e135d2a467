//! Silver → Gold aggregation.

use crate::pipeline::stats::AggregationStats;
use crate::pipeline::types::{AggregatedRecord, CleanedRecord, GroupKey};
use crate::pipeline::utility::{mean, stddev};
use std::collections::BTreeMap;

#[derive(Default)]
struct Group {
    count: usize,
    values: Vec<f64>,
    borough: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl Group {
    fn push(&mut self, record: &CleanedRecord) {
        self.count += 1;
        if let Some(v) = record.ridership {
            self.values.push(v);
        }
        // Descriptive attributes come from the first record that has them.
        if self.borough.is_none() {
            self.borough = record.borough.clone();
        }
        if self.latitude.is_none() {
            self.latitude = record.latitude;
        }
        if self.longitude.is_none() {
            self.longitude = record.longitude;
        }
    }
}

/// Groups records by `(route_id, day_of_week, hour)` and reduces each group
/// to count, sum, mean and standard deviation of ridership.
///
/// Output is sorted by key. Every group is emitted, including those with a
/// single contributing record. `count` includes records without a ridership
/// value; `sum`, `mean` and `stddev` only cover those with one.
pub fn aggregate(records: &[CleanedRecord]) -> (Vec<AggregatedRecord>, AggregationStats) {
    let mut groups: BTreeMap<GroupKey, Group> = BTreeMap::new();

    for record in records {
        let key = GroupKey {
            route_id: record.route_id.clone(),
            day_of_week: record.day_of_week,
            hour: record.hour,
        };
        groups.entry(key).or_default().push(record);
    }

    let mut stats = AggregationStats {
        input: records.len(),
        groups: groups.len(),
        ..Default::default()
    };

    let out = groups
        .into_iter()
        .map(|(key, group)| {
            if group.count == 1 {
                stats.single_record_groups += 1;
            }
            let avg = mean(&group.values);
            if avg.is_none() {
                stats.groups_without_ridership += 1;
            }

            AggregatedRecord {
                route_id: key.route_id,
                day_of_week: key.day_of_week,
                hour: key.hour,
                borough: group.borough,
                latitude: group.latitude,
                longitude: group.longitude,
                count: group.count,
                sum: group.values.iter().sum(),
                mean: avg,
                stddev: avg.and_then(|m| stddev(&group.values, m)),
            }
        })
        .collect();

    (out, stats)
}
