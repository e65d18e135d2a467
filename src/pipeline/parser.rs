//! CSV parser for Bronze objects.

use crate::config::normalize_column;
use crate::error::{PipelineError, Result};
use crate::pipeline::types::RawRecord;
use csv::ReaderBuilder;
use std::collections::BTreeMap;

/// Parsed Bronze content plus the rows that could not be read at all.
#[derive(Debug, Default)]
pub struct BronzeTable {
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
    pub malformed: Vec<PipelineError>,
}

/// Decodes a Bronze CSV body.
///
/// Headers are normalized (lower-case, spaces → `_`). Short rows are kept
/// with the missing columns absent; rows the CSV reader rejects are returned
/// in `malformed` rather than failing the whole object.
///
/// # Errors
///
/// Returns an error only if the header row itself cannot be read.
pub fn parse_bronze(bytes: &[u8]) -> Result<BronzeTable> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(normalize_column).collect();

    let mut table = BronzeTable {
        headers: headers.clone(),
        ..Default::default()
    };

    for result in reader.records() {
        match result {
            Ok(row) => {
                let line = row.position().map(|p| p.line()).unwrap_or_default();
                let fields = headers
                    .iter()
                    .zip(row.iter())
                    .map(|(h, v)| (h.clone(), v.to_string()))
                    .collect::<BTreeMap<_, _>>();
                table.records.push(RawRecord { line, fields });
            }
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or_default();
                table.malformed.push(PipelineError::MalformedRecord {
                    line,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(table)
}
