use super::{Container, ObjectStore};
use crate::error::{PipelineError, Result};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{Read, Write};
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Serializes `rows` as CSV (header row first) and uploads it, replacing any
/// previous object. Returns the number of bytes written.
///
/// The header comes from the first row, so an empty `rows` uploads an empty
/// (or, with gzip, empty-payload) object, which [`read_csv`] reads back as no
/// rows.
///
/// The gzip header carries no timestamp, so identical rows always produce
/// identical bytes.
pub async fn write_csv<T: Serialize>(
    store: &dyn ObjectStore,
    container: Container,
    path: &str,
    rows: &[T],
    gzip: bool,
) -> Result<usize> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let csv = writer
        .into_inner()
        .map_err(|e| PipelineError::Io(e.into_error()))?;

    let body = if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&csv)?;
        encoder.finish()?
    } else {
        csv
    };

    let len = body.len();
    store.put(container, path, body).await?;
    debug!(container = %container, path, rows = rows.len(), bytes = len, "CSV object written");
    Ok(len)
}

/// Downloads and deserializes a CSV object written by [`write_csv`].
pub async fn read_csv<T: DeserializeOwned>(
    store: &dyn ObjectStore,
    container: Container,
    path: &str,
) -> Result<Vec<T>> {
    let body = fetch_object(store, container, path).await?;
    let body = decode_body(body)?;

    let mut reader = csv::Reader::from_reader(body.as_slice());
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}

/// Uploads `value` as pretty-printed JSON.
pub async fn write_json(
    store: &dyn ObjectStore,
    container: Container,
    path: &str,
    value: &impl Serialize,
) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;
    store.put(container, path, body).await
}

/// Reads an object, treating absence as a data-availability failure.
pub(crate) async fn fetch_object(
    store: &dyn ObjectStore,
    container: Container,
    path: &str,
) -> Result<Vec<u8>> {
    store
        .get(container, path)
        .await?
        .ok_or_else(|| PipelineError::MissingObject {
            container: container.name().to_string(),
            path: path.to_string(),
        })
}

/// Inflates gzip bodies; anything else is returned as is.
pub fn decode_body(body: Vec<u8>) -> Result<Vec<u8>> {
    if !body.starts_with(&GZIP_MAGIC) {
        return Ok(body);
    }
    let mut out = Vec::new();
    GzDecoder::new(body.as_slice()).read_to_end(&mut out)?;
    Ok(out)
}
