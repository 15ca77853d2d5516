//! Common types and utilities shared across the brochure crates.
//!
//! This crate defines the shared error taxonomy, the provider-agnostic LLM
//! configuration, and observability helpers. It is intentionally lightweight
//! so that every crate in the workspace can depend on it.
//!
//! # Overview
//!
//! - [`BrochureError`] and [`Result`]: Shared error handling
//! - [`LlmConfig`]: Provider-agnostic LLM configuration
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`MAX_DOCUMENT_CHARS`] and [`truncate_chars`]: the document size budget
//!
//! # Examples
//!
//! ```rust
//! use brochure_common::{truncate_chars, BrochureError};
//!
//! let err = BrochureError::Input("company name".into());
//! assert_eq!(err.to_string(), "Missing input: company name");
//! assert_eq!(truncate_chars("héllo", 2), "hé");
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// Character budget for the aggregated document and the final prompt.
pub const MAX_DOCUMENT_CHARS: usize = 20_000;

/// Default model used when the configuration does not name one.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Configuration for the text-generation provider.
///
/// The `provider` tag selects the variant when deserializing from
/// `brochure.yaml`. `endpoint` accepts any OpenAI-compatible base URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LlmConfig {
    OpenAi {
        model: String,
        auth_token: String,
        #[serde(default = "default_openai_endpoint")]
        endpoint: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
    },
    None,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::None
    }
}

pub fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".into()
}

/// Error types used across the brochure pipeline.
#[derive(thiserror::Error, Debug)]
pub enum BrochureError {
    /// A page (landing or sub-page) could not be retrieved.
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Link classification failed; callers degrade to an empty classification.
    #[error("Link classification failed: {0}")]
    Classification(String),

    /// Final brochure synthesis failed; callers fall back to a fixed message.
    #[error("Brochure generation failed: {0}")]
    Composition(String),

    /// Required user input was missing or malformed.
    #[error("Missing input: {0}")]
    Input(String),

    /// The generation provider returned an error.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BrochureError {
    /// Failures the pipeline recovers from on its own.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Classification(_) | Self::Composition(_))
    }
}

/// Convenient alias for results that use [`BrochureError`].
pub type Result<T> = std::result::Result<T, BrochureError>;

/// Cut `text` to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
