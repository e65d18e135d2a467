use crate::fetch::client::HttpClient;
use async_trait::async_trait;

/// An [`HttpClient`] wrapper that appends an Azure shared access signature.
///
/// The token is already percent-encoded (`sv=...&sig=...`), so it is joined to
/// the existing query verbatim rather than re-encoded pair by pair.
pub struct SasToken<C> {
    inner: C,
    token: String,
}

impl<C> SasToken<C> {
    pub fn new(inner: C, token: &str) -> Self {
        Self {
            inner,
            token: token.trim_start_matches('?').to_string(),
        }
    }

    fn apply(&self, url: &mut reqwest::Url) {
        let query = match url.query() {
            Some(q) if !q.is_empty() => format!("{q}&{}", self.token),
            _ => self.token.clone(),
        };
        url.set_query(Some(&query));
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for SasToken<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.apply(req.url_mut());
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
    fn test_joins_existing_query() {
        let sas = SasToken::new(Noop, "?sv=2022-11-02&sig=a%2Bb");
        let mut url: reqwest::Url = "https://acct.dfs.core.windows.net/gold/f.csv?action=flush&position=3"
            .parse()
            .unwrap();
        sas.apply(&mut url);
        assert_eq!(
            url.query(),
            Some("action=flush&position=3&sv=2022-11-02&sig=a%2Bb")
        );
    }

    #[test]
    fn test_sets_query_when_absent() {
        let sas = SasToken::new(Noop, "sv=1&sig=x");
        let mut url: reqwest::Url = "https://acct.dfs.core.windows.net/gold/f.csv".parse().unwrap();
        sas.apply(&mut url);
        assert_eq!(url.query(), Some("sv=1&sig=x"));
    }
}
