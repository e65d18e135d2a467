//! Stage runners: each reads its whole source object and overwrites its
//! destination object.

use crate::config::ColumnMapping;
use crate::error::{PipelineError, Result};
use crate::pipeline::aggregate::aggregate;
use crate::pipeline::clean::clean_all;
use crate::pipeline::parser::parse_bronze;
use crate::pipeline::stats::{AggregationStats, CleaningStats};
use crate::pipeline::types::{AggregatedRecord, CleanedRecord};
use crate::services::transit_api::{DateRange, TransitApi};
use crate::storage::{
    Container, ObjectStore, decode_body, fetch_object, objects, read_csv, write_csv,
};
use tracing::{info, warn};

/// Outcome of an ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub bytes: usize,
    pub lines: usize,
}

/// Fetches `range` from `api` and stores the body unmodified in Bronze.
///
/// Failures are reported, never retried; nothing is written unless the
/// download completed. A body without a single data row below its header is
/// a data-availability failure and leaves the existing Bronze object alone.
#[tracing::instrument(skip(api, store, range), fields(source = %api.describe(), range = %range))]
pub async fn run_ingestion(
    api: &dyn TransitApi,
    store: &dyn ObjectStore,
    range: &DateRange,
) -> Result<IngestReport> {
    let body = api.fetch_range(range).await?;
    let lines = body
        .split(|b| *b == b'\n')
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .count();
    if lines <= 1 {
        warn!(bytes = body.len(), "Source returned no data rows");
        return Err(PipelineError::EmptyInput {
            stage: "ingest",
            container: Container::Bronze.to_string(),
        });
    }

    let report = IngestReport {
        bytes: body.len(),
        lines,
    };
    store.put(Container::Bronze, objects::RAW, body).await?;

    info!(
        bytes = report.bytes,
        lines = report.lines,
        object = objects::RAW,
        "Bronze written"
    );
    Ok(report)
}

/// Bronze → Silver.
///
/// Malformed rows and records failing the cleaning rules are counted and
/// skipped. An absent or row-less Bronze object is a data-availability
/// failure.
#[tracing::instrument(skip(store, columns))]
pub async fn run_cleaning(
    store: &dyn ObjectStore,
    columns: &ColumnMapping,
    gzip: bool,
) -> Result<CleaningStats> {
    let body = decode_body(fetch_object(store, Container::Bronze, objects::RAW).await?)?;
    let table = parse_bronze(&body)?;

    if table.records.is_empty() {
        return Err(PipelineError::EmptyInput {
            stage: "clean",
            container: Container::Bronze.to_string(),
        });
    }

    for required in [&columns.timestamp, &columns.route_id] {
        if !table.headers.contains(required) {
            warn!(column = %required, "Required column absent from Bronze; every record will be dropped");
        }
    }
    for err in &table.malformed {
        warn!(error = %err, "Skipping unreadable Bronze row");
    }

    let (cleaned, mut stats) = clean_all(&table.records, columns);
    stats.malformed_rows = table.malformed.len();

    let path = objects::with_compression(objects::CLEAN, gzip);
    write_csv(store, Container::Silver, &path, &cleaned, gzip).await?;

    info!(
        input = stats.input,
        kept = stats.kept,
        kept_pct = stats.kept_pct(),
        missing_timestamp = stats.missing_timestamp,
        unparseable_timestamp = stats.unparseable_timestamp,
        missing_route = stats.missing_route,
        malformed_rows = stats.malformed_rows,
        null_filled = stats.null_filled,
        object = %path,
        "Silver written"
    );
    Ok(stats)
}

/// Silver → Gold. An empty Silver set is a data-availability failure.
#[tracing::instrument(skip(store))]
pub async fn run_aggregation(store: &dyn ObjectStore, gzip: bool) -> Result<AggregationStats> {
    let source = objects::with_compression(objects::CLEAN, gzip);
    let records: Vec<CleanedRecord> = read_csv(store, Container::Silver, &source).await?;

    if records.is_empty() {
        return Err(PipelineError::EmptyInput {
            stage: "aggregate",
            container: Container::Silver.to_string(),
        });
    }

    let (gold, stats) = aggregate(&records);

    let path = objects::with_compression(objects::FEATURES, gzip);
    write_csv(store, Container::Gold, &path, &gold, gzip).await?;

    info!(
        input = stats.input,
        groups = stats.groups,
        single_record_groups = stats.single_record_groups,
        groups_without_ridership = stats.groups_without_ridership,
        object = %path,
        "Gold written"
    );
    Ok(stats)
}

/// Loads the full Gold set.
pub async fn load_gold(store: &dyn ObjectStore, gzip: bool) -> Result<Vec<AggregatedRecord>> {
    let path = objects::with_compression(objects::FEATURES, gzip);
    read_csv(store, Container::Gold, &path).await
}
