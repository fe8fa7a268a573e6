//! Single-attempt resource fetch.
//!
//! One GET per run. Redirects are followed by the underlying client; the
//! final response is what gets archived, whatever its status.

use std::time::Duration;

use archiver_core::{FetchResult, HeaderMap};
use url::Url;

use crate::error::FetchError;

/// HTTP GET boundary producing [`FetchResult`]s.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher with a per-request timeout.
    pub fn new(timeout_secs: u64) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("archiver/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| FetchError::Http {
                url: "client_init".into(),
                source,
            })?;
        Ok(Self { http })
    }

    /// Wrap an existing client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// GET `url` once. Non-2xx responses are returned, not rejected.
    pub async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let resp = self
            .http
            .get(parsed)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        let headers: HeaderMap = resp
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str(), String::from_utf8_lossy(value.as_bytes())))
            .collect();

        let body = resp.bytes().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;

        if status.is_success() {
            tracing::debug!(url, status = status.as_u16(), len = body.len(), "fetched");
        } else {
            tracing::warn!(url, status = status.as_u16(), "fetch returned non-success status; archiving anyway");
        }

        Ok(FetchResult::new(status.as_u16(), headers, body.to_vec()))
    }
}
