use crate::error::{PipelineError, Result};
use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects a credential as an HTTP header.
///
/// Header name and value are validated when the wrapper is built, so a bad
/// token is a configuration error at start-up rather than at first request.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    value: HeaderValue,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes()).map_err(|e| {
            PipelineError::Configuration(format!("invalid header name '{header_name}': {e}"))
        })?;
        let mut value = HeaderValue::from_str(key)
            .map_err(|e| PipelineError::Configuration(format!("invalid header value: {e}")))?;
        value.set_sensitive(true);
        Ok(Self {
            inner,
            header_name,
            value,
        })
    }

    /// `Authorization: Bearer <token>`.
    pub fn bearer(inner: C, token: &str) -> Result<Self> {
        Self::new(inner, "Authorization", &format!("Bearer {token}"))
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.value.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl HttpClient for Noop {
        async fn execute(&self, _req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            unreachable!("not called in these tests")
        }
    }

    #[test]
    fn test_bearer_sets_authorization() {
        let key = ApiKey::bearer(Noop, "abc").unwrap();
        assert_eq!(key.header_name, "authorization");
        assert_eq!(key.value.to_str().unwrap(), "Bearer abc");
        assert!(key.value.is_sensitive());
    }

    #[test]
    fn test_rejects_invalid_token() {
        assert!(ApiKey::bearer(Noop, "line\nbreak").is_err());
        assert!(ApiKey::new(Noop, "bad header", "v").is_err());
    }
}
