use crate::error::{PipelineError, Result};
use crate::fetch::auth::UrlParam;
use crate::fetch::{self, BasicClient, HttpClient};
use crate::services::transit_api::{DateRange, TransitApi};
use async_trait::async_trait;
use reqwest::{Method, Request, Url};
use tracing::{debug, info, warn};

/// MTA subway hourly ridership on the New York open-data portal.
pub const DEFAULT_ENDPOINT: &str = "https://data.ny.gov/resource/wujg-7c2s.csv";

/// Rows requested per page; Socrata otherwise stops at 1000 rows.
pub const DEFAULT_ROW_LIMIT: usize = 50_000;

/// Queries a Socrata dataset with a SoQL date filter, paging with `$offset`
/// until a short page comes back.
pub struct SocrataClient {
    http: Box<dyn HttpClient>,
    endpoint: Url,
    timestamp_column: String,
    row_limit: usize,
    max_bytes: Option<usize>,
}

impl SocrataClient {
    pub fn new(
        endpoint: &str,
        timestamp_column: &str,
        app_token: Option<&str>,
    ) -> Result<Self> {
        let basic = BasicClient::new()?;
        match app_token {
            Some(token) => Self::with_client(
                endpoint,
                timestamp_column,
                UrlParam::socrata_app_token(basic, token),
            ),
            None => Self::with_client(endpoint, timestamp_column, basic),
        }
    }

    pub fn with_client(
        endpoint: &str,
        timestamp_column: &str,
        http: impl HttpClient + 'static,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            PipelineError::Configuration(format!("invalid API endpoint '{endpoint}': {e}"))
        })?;

        Ok(Self {
            http: Box::new(http),
            endpoint,
            timestamp_column: timestamp_column.to_string(),
            row_limit: DEFAULT_ROW_LIMIT,
            max_bytes: None,
        })
    }

    pub fn with_row_limit(mut self, limit: usize) -> Self {
        self.row_limit = limit.max(1);
        self
    }

    /// Caps the whole download, across pages.
    pub fn with_max_bytes(mut self, max_bytes: Option<usize>) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Builds the SoQL query URL for one page of `range`. Ordering breaks
    /// timestamp ties on the row id so pages never overlap.
    pub fn query_url(&self, range: &DateRange, offset: usize) -> Url {
        let column = &self.timestamp_column;
        let filter = format!(
            "{column} between '{}T00:00:00' and '{}T23:59:59'",
            range.start, range.end
        );
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("$where", &filter)
            .append_pair("$order", &format!("{column},:id"))
            .append_pair("$limit", &self.row_limit.to_string())
            .append_pair("$offset", &offset.to_string());
        url
    }
}

/// Byte length of a CSV page's header line and the number of records after it.
fn page_layout(page: &[u8]) -> Result<(usize, usize)> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(page);
    reader.byte_headers()?;
    let header_len = reader.position().byte() as usize;
    let rows = reader.byte_records().count();
    Ok((header_len, rows))
}

#[async_trait]
impl TransitApi for SocrataClient {
    fn describe(&self) -> String {
        self.endpoint.to_string()
    }

    async fn fetch_range(&self, range: &DateRange) -> Result<Vec<u8>> {
        info!(endpoint = %self.endpoint, %range, limit = self.row_limit, "Querying transit API");

        let mut body = Vec::new();
        let mut offset = 0;
        let mut pages = 0;
        loop {
            let remaining = self.max_bytes.map(|cap| cap.saturating_sub(body.len()));
            let req = Request::new(Method::GET, self.query_url(range, offset));
            let page = fetch::fetch_capped(self.http.as_ref(), req, remaining).await?;
            let (header_len, rows) = page_layout(&page.bytes)?;
            pages += 1;

            // Every page repeats the header; keep only the first.
            let data = if offset == 0 {
                &page.bytes[..]
            } else {
                page.bytes.get(header_len..).unwrap_or_default()
            };
            body.extend_from_slice(data);
            debug!(offset, rows, bytes = data.len(), "Page received");

            if page.truncated {
                warn!(
                    max_bytes = self.max_bytes,
                    rows = offset + rows,
                    "Byte cap reached; remaining rows were not downloaded"
                );
                break;
            }
            if rows < self.row_limit {
                break;
            }
            offset += rows;
        }

        info!(pages, bytes = body.len(), "Transit API download complete");
        Ok(body)
    }
}
