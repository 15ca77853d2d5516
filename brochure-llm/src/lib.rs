//! Provider-agnostic LLM integration for the brochure pipeline.
//!
//! This crate exposes a common [`traits::LlmClient`] interface and an
//! OpenAI-compatible implementation. [`ensure_llm_ready`] turns a
//! [`brochure_common::LlmConfig`] into a shareable client.
//!
//! # Examples
//! ```no_run
//! use brochure_common::{LlmConfig, Result};
//! use brochure_llm::ensure_llm_ready;
//!
//! # fn main() -> Result<()> {
//! let cfg = LlmConfig::OpenAi {
//!     model: "gpt-4o-mini".into(),
//!     auth_token: "sk-...".into(),
//!     endpoint: "https://api.openai.com/v1".into(),
//!     temperature: None,
//!     max_tokens: None,
//! };
//! let client = ensure_llm_ready(&cfg)?;
//! assert_eq!(client.model_name(), "gpt-4o-mini");
//! # Ok(())
//! # }
//! ```
pub mod openai;
pub mod traits;

use brochure_common::{BrochureError, LlmConfig};
use openai::OpenAiClient;
use std::sync::Arc;
use traits::LlmClient;

/// Build the configured LLM client.
pub fn ensure_llm_ready(
    config: &LlmConfig,
) -> brochure_common::Result<Arc<dyn LlmClient>> {
    match config {
        LlmConfig::OpenAi {
            model,
            auth_token,
            endpoint,
            temperature,
            max_tokens,
        } => {
            if auth_token.trim().is_empty() || auth_token.contains("${") {
                return Err(BrochureError::Config(
                    "OpenAI auth token is not set (export OPENAI_API_KEY or set llm.auth_token)"
                        .to_string(),
                ));
            }
            let client = OpenAiClient::with_endpoint(auth_token.clone(), model.clone(), endpoint)?
                .with_defaults(*temperature, *max_tokens);
            tracing::info!(model = %model, endpoint = %endpoint, "llm.client.ready");
            Ok(Arc::new(client))
        }
        LlmConfig::None => Err(BrochureError::Config("No LLM configured".to_string())),
    }
}
