//! Small HTTP client for the brochure crates.
//!
//! Two call shapes: [`HttpClient::post_json`] for model APIs (bearer auth,
//! JSON in and out) and [`HttpClient::get_bytes`] for web pages. Both go
//! through one attempt loop that retries 429/5xx and network failures with
//! exponential backoff, honours `Retry-After`, and logs structured
//! `http.*` events with secrets masked. `BROCHURE_HTTP_RAW=1` also logs
//! request and response bodies (capped) under the `http.raw` target.
//!
//! ```no_run
//! # async fn demo() -> Result<(), brochure_http::HttpError> {
//! let client = brochure_http::HttpClient::unanchored(Some("brochure/0.1"))?;
//! let page = client.get_bytes("https://example.com/").await?;
//! assert!(page.status.is_success());
//! # Ok(()) }
//! ```

mod error;
mod redact;

pub use error::HttpError;

use std::time::{Duration, Instant};

use reqwest::header::{CONTENT_TYPE, HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use error::error_message;
use redact::{bearer_token, loggable_url, snip, snip_body};

const RAW_ENV: &str = "BROCHURE_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;

fn raw_enabled() -> bool {
    matches!(
        std::env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// A successful response body with the metadata callers care about.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Final URL after redirects.
    pub url: Url,
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Option<Url>,
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

/// One logical request, replayed on each attempt.
struct Request<'a> {
    method: Method,
    url: Url,
    body: Option<Vec<u8>>,
    bearer: Option<&'a str>,
}

impl HttpClient {
    /// Construct a client anchored to a base URL; paths are joined onto it.
    ///
    /// ```no_run
    /// use brochure_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com/v1/")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(client.max_retries, 2);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        Self::build(Some(base), None)
    }

    /// Construct a client with no base URL; every request must be absolute.
    pub fn unanchored(user_agent: Option<&str>) -> Result<Self, HttpError> {
        Self::build(None, user_agent)
    }

    fn build(base: Option<Url>, user_agent: Option<&str>) -> Result<Self, HttpError> {
        let mut builder = Client::builder().connect_timeout(Duration::from_secs(5));
        if let Some(ua) = user_agent {
            builder = builder.user_agent(ua);
        }
        let inner = builder
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
            max_retries: 2,
        })
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    /// POST `body` as JSON and decode a JSON reply.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: &B,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;
        let token = bearer.map(bearer_token).transpose()?;
        let raw = self
            .execute(Request {
                method: Method::POST,
                url: self.resolve(path)?,
                body: Some(bytes),
                bearer: token.as_deref(),
            })
            .await?;

        serde_json::from_slice(&raw.body).map_err(|e| {
            let snippet = snip_body(&raw.body);
            tracing::warn!(serde_err = %e, body_snippet = %snippet, "http.response.decode_error");
            HttpError::Decode(e.to_string(), snippet)
        })
    }

    /// GET the raw body of `path`; non-2xx statuses are errors.
    pub async fn get_bytes(&self, path: &str) -> Result<RawResponse, HttpError> {
        self.execute(Request {
            method: Method::GET,
            url: self.resolve(path)?,
            body: None,
            bearer: None,
        })
        .await
    }

    fn resolve(&self, path: &str) -> Result<Url, HttpError> {
        match &self.base {
            // `join` keeps absolute inputs as they are.
            Some(base) => base.join(path).map_err(|e| HttpError::Url(e.to_string())),
            None => Url::parse(path).map_err(|e| HttpError::Url(format!("{path}: {e}"))),
        }
    }

    async fn execute(&self, req: Request<'_>) -> Result<RawResponse, HttpError> {
        let shown_url = loggable_url(&req.url);
        let mut attempt = 0usize;

        loop {
            let req_id = format!("{shown_url}#{}", attempt + 1);
            tracing::debug!(
                %req_id,
                method = %req.method,
                url = %shown_url,
                timeout_ms = self.default_timeout.as_millis() as u64,
                bearer = req.bearer.is_some(),
                has_body = req.body.is_some(),
                "http.request.start"
            );
            if raw_enabled() {
                if let Some(body) = &req.body {
                    let text = String::from_utf8_lossy(body);
                    tracing::debug!(target: "http.raw", %req_id, body = %snip(&text, RAW_MAX_BODY), "request");
                }
            }

            let (err, retry_after) = match self.attempt(&req, &req_id).await {
                Ok(raw) => return Ok(raw),
                Err(failed) => failed,
            };
            if !err.is_transient() || attempt >= self.max_retries {
                tracing::warn!(%req_id, error = %err, "http.error");
                return Err(err);
            }

            attempt += 1;
            let throttled = err.status() == Some(StatusCode::TOO_MANY_REQUESTS);
            let delay = match retry_after {
                Some(secs) => Duration::from_secs(secs),
                None if throttled => backoff(attempt).max(Duration::from_millis(1100)),
                None => backoff(attempt),
            };
            tracing::warn!(
                %req_id,
                attempt,
                max_retries = self.max_retries,
                backoff_ms = delay.as_millis() as u64,
                error = %err,
                "http.retrying"
            );
            sleep(delay).await;
        }
    }

    /// Send once. Errors carry the server's `Retry-After`, if any.
    async fn attempt(
        &self,
        req: &Request<'_>,
        req_id: &str,
    ) -> Result<RawResponse, (HttpError, Option<u64>)> {
        let mut rb = self
            .inner
            .request(req.method.clone(), req.url.clone())
            .timeout(self.default_timeout);
        if let Some(bytes) = &req.body {
            rb = rb
                .header(CONTENT_TYPE, "application/json")
                .body(bytes.clone());
        }
        if let Some(token) = req.bearer {
            rb = rb.bearer_auth(token);
        }

        let started = Instant::now();
        let resp = rb
            .send()
            .await
            .map_err(|e| (HttpError::Network(e.to_string()), None))?;
        let status = resp.status();
        let final_url = resp.url().clone();
        let headers = resp.headers().clone();
        let body = resp
            .bytes()
            .await
            .map_err(|e| (HttpError::Network(e.to_string()), None))?
            .to_vec();

        let request_id = server_request_id(&headers);
        tracing::debug!(
            %req_id,
            %status,
            duration_ms = started.elapsed().as_millis() as u64,
            body_len = body.len(),
            x_request_id = %request_id,
            "http.response.headers"
        );
        if raw_enabled() {
            let text = String::from_utf8_lossy(&body);
            tracing::info!(
                target: "http.raw",
                %req_id,
                %status,
                body = %snip(&text, RAW_MAX_BODY),
                truncated = text.len() > RAW_MAX_BODY,
                "response"
            );
        }

        if status.is_success() {
            let content_type = headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            return Ok(RawResponse {
                url: final_url,
                status,
                content_type,
                body,
            });
        }

        let err = HttpError::Api {
            status,
            message: error_message(&body),
            request_id,
        };
        Err((err, retry_after_secs(&headers)))
    }
}

fn server_request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .or_else(|| headers.get("x-correlation-id"))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

fn backoff(attempt: usize) -> Duration {
    Duration::from_millis(200u64.saturating_mul(1 << (attempt.saturating_sub(1)).min(16)))
}

fn retry_after_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .trim()
        .parse()
        .ok()
}
