use crate::traits::{LlmClient, LlmResponse};
use async_trait::async_trait;
use brochure_common::{default_openai_endpoint, BrochureError, Result};
use brochure_http::{HttpClient, HttpError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Client for OpenAI's `chat/completions` API and compatible gateways.
pub struct OpenAiClient {
    client: HttpClient,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatUsage {
    pub total_tokens: u32,
}

impl OpenAiClient {
    /// Create a client against the public OpenAI endpoint.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::with_endpoint(api_key, model, &default_openai_endpoint())
    }

    /// Create a client against any OpenAI-compatible base URL
    /// (e.g. `http://localhost:11434/v1` for Ollama).
    pub fn with_endpoint(api_key: String, model: String, endpoint: &str) -> Result<Self> {
        // `Url::join` drops the last path segment unless the base ends in '/'.
        let base = format!("{}/", endpoint.trim_end_matches('/'));
        let client = HttpClient::new(&base)
            .map_err(|e| BrochureError::Config(format!("HttpClient init failed: {e}")))?
            .with_timeout(Duration::from_secs(60));

        Ok(Self {
            client,
            api_key,
            model,
            temperature: None,
            max_tokens: None,
        })
    }

    /// Sampling defaults used when a call does not specify its own.
    pub fn with_defaults(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    async fn chat(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        json: bool,
    ) -> Result<LlmResponse> {
        let req = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt.unwrap_or(DEFAULT_SYSTEM_PROMPT),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: max_tokens.or(self.max_tokens),
            temperature: temperature.or(self.temperature),
            response_format: json.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        tracing::debug!(model = %self.model, json, prompt_chars = prompt.len(), "openai.chat.request");

        let resp: ChatResponse = self
            .client
            .post_json("chat/completions", Some(&self.api_key), &req)
            .await
            .map_err(http_to_brochure)?;

        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BrochureError::Llm("response contained no choices".into()))?;

        let text = choice
            .message
            .content
            .ok_or_else(|| BrochureError::Llm("response contained no message content".into()))?;

        tracing::debug!(
            finish_reason = ?choice.finish_reason,
            response_chars = text.len(),
            "openai.chat.response"
        );

        Ok(LlmResponse {
            text,
            model: resp.model,
            tokens_used: resp.usage.map(|u| u.total_tokens),
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        self.chat(prompt, system_prompt, max_tokens, temperature, false)
            .await
    }

    async fn generate_json(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        self.chat(prompt, system_prompt, None, temperature, true)
            .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn http_to_brochure(e: HttpError) -> BrochureError {
    BrochureError::Llm(format!("{e}"))
}
