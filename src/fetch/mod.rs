mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use crate::error::{PipelineError, Result};
use tracing::debug;

/// Sends `req` and turns transport failures and non-success statuses into
/// connectivity errors. The response body of a failed call is kept for the
/// error message.
pub async fn send<C: HttpClient + ?Sized>(
    client: &C,
    req: reqwest::Request,
) -> Result<reqwest::Response> {
    let url = redact(req.url());
    let method = req.method().clone();

    let resp = client
        .execute(req)
        .await
        .map_err(|e| PipelineError::http(&url, e))?;

    debug!(%method, url = %url, status = resp.status().as_u16(), "HTTP response");
    ensure_success(url, resp).await
}

/// Converts a non-success response into [`PipelineError::Status`].
pub async fn ensure_success(url: String, resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(PipelineError::Status {
            url,
            status: status.as_u16(),
            body: body.chars().take(512).collect(),
        });
    }

    Ok(resp)
}

/// A response body read under an optional byte cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CappedBody {
    pub bytes: Vec<u8>,
    /// The cap was hit and the body was cut back to a line boundary.
    pub truncated: bool,
}

/// Sends `req` and reads the body, stopping once `max_bytes` is exceeded.
///
/// A capped body is cut back to its last complete line so that no partial
/// row is handed on.
pub async fn fetch_capped<C: HttpClient + ?Sized>(
    client: &C,
    req: reqwest::Request,
    max_bytes: Option<usize>,
) -> Result<CappedBody> {
    let url = redact(req.url());
    let mut resp = send(client, req).await?;

    let mut bytes = Vec::new();
    while let Some(chunk) = resp
        .chunk()
        .await
        .map_err(|e| PipelineError::http(&url, e))?
    {
        bytes.extend_from_slice(&chunk);
        if let Some(cap) = max_bytes {
            if bytes.len() > cap {
                truncate_to_line(&mut bytes, cap);
                debug!(cap, kept = bytes.len(), "Body capped");
                return Ok(CappedBody {
                    bytes,
                    truncated: true,
                });
            }
        }
    }

    Ok(CappedBody {
        bytes,
        truncated: false,
    })
}

/// Truncates `body` to at most `cap` bytes, ending on a newline.
pub(crate) fn truncate_to_line(body: &mut Vec<u8>, cap: usize) {
    body.truncate(cap);
    let keep = body
        .iter()
        .rposition(|b| *b == b'\n')
        .map(|pos| pos + 1)
        .unwrap_or(0);
    body.truncate(keep);
}

/// Renders a URL without its query string so credentials never reach logs.
pub(crate) fn redact(url: &reqwest::Url) -> String {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.to_string()
}
