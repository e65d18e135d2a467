use super::client::HttpClient;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Plain `reqwest` client with a bounded connect phase. Reads are left to
/// the library defaults.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("transit_lake/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PipelineError::Configuration(format!("HTTP client setup failed: {e}")))?;
        Ok(Self(client))
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
