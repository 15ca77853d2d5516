//! Keeps secrets out of log events.

use reqwest::Url;
use reqwest::header::HeaderValue;

use crate::HttpError;

const SECRET_QUERY_KEYS: &[&str] = &[
    "access_token",
    "api_key",
    "apikey",
    "auth",
    "key",
    "secret",
    "token",
];

/// `host/path?query` with secret-looking query values masked.
pub(crate) fn loggable_url(url: &Url) -> String {
    let mut shown = format!("{}{}", url.host_str().unwrap_or("-"), url.path());
    let pairs: Vec<String> = url
        .query_pairs()
        .map(|(k, v)| {
            if SECRET_QUERY_KEYS.contains(&k.to_ascii_lowercase().as_str()) {
                format!("{k}=<redacted>")
            } else {
                format!("{k}={v}")
            }
        })
        .collect();
    if !pairs.is_empty() {
        shown.push('?');
        shown.push_str(&pairs.join("&"));
    }
    shown
}

/// Normalize a pasted API key and check it fits in an `Authorization` header.
pub(crate) fn bearer_token(raw: &str) -> Result<String, HttpError> {
    let mut token = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    token.retain(|ch| !ch.is_ascii_whitespace());

    if !token.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(token)
}

pub(crate) fn snip(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

pub(crate) fn snip_body(body: &[u8]) -> String {
    snip(&String::from_utf8_lossy(body), 500)
}
