use crate::error::Result;
use crate::services::transit_api::{DateRange, TransitApi};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

/// Serves a previously downloaded export from disk.
///
/// The range is not applied: the file is taken as the raw snapshot for it.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TransitApi for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch_range(&self, range: &DateRange) -> Result<Vec<u8>> {
        info!(path = %self.path.display(), %range, "Reading local export");
        Ok(tokio::fs::read(&self.path).await?)
    }
}
