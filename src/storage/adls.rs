use super::{Container, ObjectStore};
use crate::error::{PipelineError, Result};
use crate::fetch::{self, HttpClient};
use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, HeaderValue};
use reqwest::{Method, Request, StatusCode, Url};
use tracing::debug;

const API_VERSION: &str = "2023-11-03";

/// Largest body sent in a single append call.
const APPEND_CHUNK: usize = 8 * 1024 * 1024;

/// Azure Data Lake Storage Gen2 over the DFS REST endpoint.
///
/// Uploads follow the create → append → flush sequence; creating a file
/// that already exists replaces it.
pub struct AdlsStore {
    client: Box<dyn HttpClient>,
    account: String,
    endpoint: String,
}

impl AdlsStore {
    pub fn new(account: &str, client: impl HttpClient + 'static) -> Self {
        Self {
            client: Box::new(client),
            account: account.to_string(),
            endpoint: format!("https://{account}.dfs.core.windows.net"),
        }
    }

    fn url(&self, container: Container, path: &str) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| PipelineError::Configuration(format!("bad account '{}': {e}", self.account)))?;
        url.path_segments_mut()
            .map_err(|_| PipelineError::Configuration("DFS endpoint cannot be a base".into()))?
            .push(container.name())
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    fn request(&self, method: Method, mut url: Url, query: &[(&str, &str)]) -> Request {
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        let mut req = Request::new(method, url);
        req.headers_mut()
            .insert("x-ms-version", HeaderValue::from_static(API_VERSION));
        req
    }

    fn with_body(mut req: Request, body: Vec<u8>) -> Request {
        req.headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        *req.body_mut() = Some(body.into());
        req
    }
}

#[async_trait]
impl ObjectStore for AdlsStore {
    fn backend(&self) -> &'static str {
        "adls"
    }

    async fn get(&self, container: Container, path: &str) -> Result<Option<Vec<u8>>> {
        let url = self.url(container, path)?;
        let shown = fetch::redact(&url);
        let req = self.request(Method::GET, url, &[]);

        let resp = self
            .client
            .execute(req)
            .await
            .map_err(|e| PipelineError::http(&shown, e))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let resp = fetch::ensure_success(shown.clone(), resp).await?;
        let body = resp
            .bytes()
            .await
            .map_err(|e| PipelineError::http(&shown, e))?;

        debug!(container = %container, path, bytes = body.len(), "ADLS object read");
        Ok(Some(body.to_vec()))
    }

    async fn put(&self, container: Container, path: &str, body: Vec<u8>) -> Result<()> {
        let url = self.url(container, path)?;
        let total = body.len();

        let create = Self::with_body(
            self.request(Method::PUT, url.clone(), &[("resource", "file")]),
            Vec::new(),
        );
        fetch::send(self.client.as_ref(), create).await?;

        let mut position = 0usize;
        for chunk in body.chunks(APPEND_CHUNK) {
            let offset = position.to_string();
            let append = Self::with_body(
                self.request(
                    Method::PATCH,
                    url.clone(),
                    &[("action", "append"), ("position", &offset)],
                ),
                chunk.to_vec(),
            );
            fetch::send(self.client.as_ref(), append).await?;
            position += chunk.len();
        }

        let length = total.to_string();
        let flush = Self::with_body(
            self.request(
                Method::PATCH,
                url,
                &[("action", "flush"), ("position", &length)],
            ),
            Vec::new(),
        );
        fetch::send(self.client.as_ref(), flush).await?;

        debug!(container = %container, path, bytes = total, "ADLS object written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records requests and answers each with a canned status.
    #[derive(Clone)]
    struct Recorder {
        seen: Arc<Mutex<Vec<(Method, String)>>>,
        status: u16,
    }

    impl Recorder {
        fn new(status: u16) -> Self {
            Self {
                seen: Arc::new(Mutex::new(Vec::new())),
                status,
            }
        }
    }

    #[async_trait]
    impl HttpClient for Recorder {
        async fn execute(&self, req: Request) -> reqwest::Result<reqwest::Response> {
            self.seen
                .lock()
                .unwrap()
                .push((req.method().clone(), req.url().to_string()));
            let inner = http::Response::builder()
                .status(self.status)
                .body(Vec::<u8>::new())
                .unwrap();
            Ok(reqwest::Response::from(inner))
        }
    }

    #[test]
    fn test_url_layout() {
        let store = AdlsStore::new("transitlake", Recorder::new(200));
        let url = store
            .url(Container::Gold, "models/ridership_model.json")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://transitlake.dfs.core.windows.net/gold/models/ridership_model.json"
        );
    }

    #[tokio::test]
    async fn test_put_creates_appends_and_flushes() {
        let recorder = Recorder::new(201);
        let store = AdlsStore::new("acct", recorder.clone());
        store
            .put(Container::Bronze, "ridership_raw.csv", b"a,b\n".to_vec())
            .await
            .unwrap();

        let seen = recorder.seen.lock().unwrap();
        let base = "https://acct.dfs.core.windows.net/bronze/ridership_raw.csv";
        assert_eq!(
            *seen,
            vec![
                (Method::PUT, format!("{base}?resource=file")),
                (Method::PATCH, format!("{base}?action=append&position=0")),
                (Method::PATCH, format!("{base}?action=flush&position=4")),
            ]
        );
    }

    #[tokio::test]
    async fn test_put_empty_body_skips_append() {
        let recorder = Recorder::new(201);
        let store = AdlsStore::new("acct", recorder.clone());
        store.put(Container::Gold, "f.csv", Vec::new()).await.unwrap();
        assert_eq!(recorder.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = AdlsStore::new("acct", Recorder::new(404));
        assert!(store.get(Container::Silver, "x.csv").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_forbidden_is_connectivity_error() {
        let store = AdlsStore::new("acct", Recorder::new(403));
        let err = store.get(Container::Silver, "x.csv").await.unwrap_err();
        assert!(matches!(err, PipelineError::Status { status: 403, .. }));
        assert_eq!(err.category(), crate::error::ErrorCategory::Connectivity);
    }
}
