use async_trait::async_trait;
use brochure_common::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response to the given prompt with optional system prompt
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse>;

    /// Like [`LlmClient::generate`], but asks the provider for a JSON object.
    ///
    /// Providers without a JSON mode fall back to plain generation; callers
    /// still have to tolerate non-JSON output.
    async fn generate_json(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        self.generate(prompt, system_prompt, None, temperature)
            .await
    }

    /// Get the model name being used
    fn model_name(&self) -> &str;
}

/// Try to extract a ```json ... ``` fenced block, then a bare `{...}`.
///
/// Returns `None` when the text has no braces at all.
pub fn extract_json_block(text: &str) -> Option<&str> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    static PLAIN: OnceLock<Option<Regex>> = OnceLock::new();

    let fence = FENCE
        .get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").ok())
        .as_ref()?;
    if let Some(m) = fence.captures(text).and_then(|c| c.get(1)) {
        return Some(m.as_str());
    }
    let plain = PLAIN
        .get_or_init(|| Regex::new(r"(?s)(\{.*\})").ok())
        .as_ref()?;
    plain
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
