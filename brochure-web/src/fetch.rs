//! Raw page retrieval.

use std::time::Duration;

use async_trait::async_trait;
use brochure_common::{BrochureError, Result};
use brochure_http::HttpClient;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = concat!("brochure/", env!("CARGO_PKG_VERSION"));

/// Retrieves the raw bytes behind a URL. No parsing, no caching.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`PageFetcher`] over HTTP GET. One attempt per call.
#[derive(Clone)]
pub struct HttpPageFetcher {
    client: HttpClient,
}

impl HttpPageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = HttpClient::unanchored(Some(user_agent))
            .map_err(|e| BrochureError::Config(format!("HttpClient init failed: {e}")))?
            .with_timeout(timeout)
            .with_retries(0);
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let fetch_err = |reason: String| BrochureError::Fetch {
            url: url.to_string(),
            reason,
        };

        let parsed = Url::parse(url).map_err(|e| fetch_err(format!("invalid URL: {e}")))?;

        let raw = self
            .client
            .get_bytes(parsed.as_str())
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        tracing::debug!(
            url,
            final_url = %raw.url,
            status = %raw.status,
            content_type = ?raw.content_type,
            bytes = raw.body.len(),
            "page.fetched"
        );
        Ok(raw.body)
    }
}
