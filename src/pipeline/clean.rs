//! Bronze → Silver cleaning rules.

use crate::config::ColumnMapping;
use crate::pipeline::stats::CleaningStats;
use crate::pipeline::types::{CleanedRecord, RawRecord};
use crate::pipeline::utility::parse_number;
use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use tracing::trace;

/// Timestamp layouts accepted in Bronze. Socrata CSV exports use the first,
/// its SODA endpoints the second.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M:%S %p",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
];

/// Why a Raw Record was left out of Silver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    MissingTimestamp,
    UnparseableTimestamp,
    MissingRoute,
}

/// Parses a Bronze timestamp. RFC 3339 values keep their wall-clock time.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

/// Applies the cleaning rules to one record.
///
/// Timestamp and route id are required; a timestamp that does not parse is
/// a drop, never a repair. Optional numeric columns that do not parse are
/// null-filled and counted in `stats`.
pub fn clean_record(
    raw: &RawRecord,
    columns: &ColumnMapping,
    stats: &mut CleaningStats,
) -> Result<CleanedRecord, DropReason> {
    let ts_raw = raw
        .field(&columns.timestamp)
        .ok_or(DropReason::MissingTimestamp)?;
    let timestamp = parse_timestamp(ts_raw).ok_or(DropReason::UnparseableTimestamp)?;
    let route_id = raw
        .field(&columns.route_id)
        .ok_or(DropReason::MissingRoute)?
        .to_string();

    let mut number = |column: &str| {
        let value = raw.field(column)?;
        let parsed = parse_number(value);
        if parsed.is_none() {
            stats.null_filled += 1;
        }
        parsed
    };

    let ridership = number(&columns.ridership);
    let latitude = number(&columns.latitude);
    let longitude = number(&columns.longitude);

    Ok(CleanedRecord {
        timestamp,
        date: timestamp.date(),
        hour: timestamp.hour(),
        day_of_week: timestamp.weekday().num_days_from_monday(),
        route_id,
        stop_id: raw.field(&columns.stop_id).map(str::to_string),
        borough: raw.field(&columns.borough).map(str::to_string),
        ridership,
        latitude,
        longitude,
    })
}

/// Cleans every record, preserving input order.
pub fn clean_all(records: &[RawRecord], columns: &ColumnMapping) -> (Vec<CleanedRecord>, CleaningStats) {
    let mut stats = CleaningStats {
        input: records.len(),
        ..Default::default()
    };
    let mut cleaned = Vec::with_capacity(records.len());

    for raw in records {
        match clean_record(raw, columns, &mut stats) {
            Ok(record) => cleaned.push(record),
            Err(reason) => {
                trace!(line = raw.line, ?reason, "Record dropped");
                stats.record_drop(reason);
            }
        }
    }

    stats.kept = cleaned.len();
    (cleaned, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn raw(pairs: &[(&str, &str)]) -> RawRecord {
        RawRecord {
            line: 2,
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn mta(ts: &str, route: &str, riders: &str) -> RawRecord {
        raw(&[
            ("transit_timestamp", ts),
            ("station_complex", route),
            ("station_complex_id", "611"),
            ("borough", "Manhattan"),
            ("ridership", riders),
            ("latitude", "40.75"),
            ("longitude", "-73.98"),
            ("payment_method", "omny"),
        ])
    }

    #[test]
    fn test_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("01/05/2024 01:00:00 PM"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-05T13:00:00.000"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-05T13:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-05 13:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-05T13:00:00-05:00"), Some(expected));
        assert_eq!(parse_timestamp("not-a-date"), None);
    }

    #[test]
    fn test_valid_record_is_preserved_with_normalization_fields() {
        let mut stats = CleaningStats::default();
        let record = clean_record(
            &mta("01/05/2024 01:00:00 PM", "Times Sq-42 St", "1,204"),
            &ColumnMapping::default(),
            &mut stats,
        )
        .unwrap();

        assert_eq!(record.route_id, "Times Sq-42 St");
        assert_eq!(record.stop_id.as_deref(), Some("611"));
        assert_eq!(record.borough.as_deref(), Some("Manhattan"));
        assert_eq!(record.ridership, Some(1204.0));
        assert_eq!(record.latitude, Some(40.75));
        assert_eq!(record.longitude, Some(-73.98));
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(record.hour, 13);
        // 2024-01-05 is a Friday.
        assert_eq!(record.day_of_week, 4);
        assert_eq!(stats.null_filled, 0);
    }

    #[test]
    fn test_drop_reasons() {
        let columns = ColumnMapping::default();
        let mut stats = CleaningStats::default();

        let no_ts = raw(&[("station_complex", "A")]);
        assert_eq!(
            clean_record(&no_ts, &columns, &mut stats),
            Err(DropReason::MissingTimestamp)
        );

        let bad_ts = mta("not-a-date", "A", "10");
        assert_eq!(
            clean_record(&bad_ts, &columns, &mut stats),
            Err(DropReason::UnparseableTimestamp)
        );

        let no_route = mta("2024-01-05T13:00:00", "  ", "10");
        assert_eq!(
            clean_record(&no_route, &columns, &mut stats),
            Err(DropReason::MissingRoute)
        );
    }

    #[test]
    fn test_bad_ridership_is_null_filled() {
        let mut stats = CleaningStats::default();
        let record = clean_record(
            &mta("2024-01-05T13:00:00", "A", "lots"),
            &ColumnMapping::default(),
            &mut stats,
        )
        .unwrap();
        assert_eq!(record.ridership, None);
        assert_eq!(stats.null_filled, 1);
    }

    #[test]
    fn test_clean_all_counts() {
        let records = vec![
            mta("2024-01-05T13:00:00", "A", "10"),
            mta("not-a-date", "A", "10"),
            mta("2024-01-05T14:00:00", "", "10"),
            mta("2024-01-05T15:00:00", "B", "5"),
        ];
        let (cleaned, stats) = clean_all(&records, &ColumnMapping::default());

        assert_eq!(cleaned.len(), 2);
        assert_eq!(stats.input, 4);
        assert_eq!(stats.kept, 2);
        assert_eq!(stats.unparseable_timestamp, 1);
        assert_eq!(stats.missing_route, 1);
        assert_eq!(stats.dropped(), 2);
        assert_eq!(cleaned[1].route_id, "B");
    }
}
