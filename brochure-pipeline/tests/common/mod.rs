#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use brochure_common::{BrochureError, Result};
use brochure_llm::traits::{LlmClient, LlmResponse};
use brochure_pipeline::classify::LINK_SYSTEM_PROMPT;
use brochure_pipeline::{
    AggregatorOptions, ContentAggregator, DocumentComposer, ErrorReporter, LinkClassifier,
    build_composer,
};
use brochure_web::PageFetcher;

pub const ACME_URL: &str = "https://acme.com";
pub const ACME_LANDING: &str = r#"<html><head><title>Acme</title></head><body><a href="https://acme.com/about">About</a><a href="/careers">Careers</a><p>Hi</p></body></html>"#;

pub fn page_html(title: &str, body: &str) -> String {
    format!("<html><head><title>{title}</title></head><body><p>{body}</p></body></html>")
}

/// In-memory site: URL -> HTML, with optional per-URL latency.
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    pub calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        self.pages
            .get(url)
            .map(|html| html.clone().into_bytes())
            .ok_or_else(|| BrochureError::Fetch {
                url: url.to_string(),
                reason: "server returned error 404 Not Found".to_string(),
            })
    }
}

/// Scripted LLM: one answer for link classification, one for the brochure.
pub struct StubLlm {
    classification: std::result::Result<String, String>,
    brochure: std::result::Result<String, String>,
    pub prompts: Mutex<Vec<(Option<String>, String)>>,
}

impl StubLlm {
    pub fn new(classification: &str, brochure: &str) -> Self {
        Self {
            classification: Ok(classification.to_string()),
            brochure: Ok(brochure.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_classification(mut self, reason: &str) -> Self {
        self.classification = Err(reason.to_string());
        self
    }

    pub fn failing_brochure(mut self, reason: &str) -> Self {
        self.brochure = Err(reason.to_string());
        self
    }

    pub fn prompts(&self) -> Vec<(Option<String>, String)> {
        self.prompts.lock().unwrap().clone()
    }

    /// The user prompt of the final brochure request, if one was made.
    pub fn brochure_prompt(&self) -> Option<String> {
        self.prompts()
            .into_iter()
            .find(|(system, _)| system.as_deref() != Some(LINK_SYSTEM_PROMPT))
            .map(|(_, prompt)| prompt)
    }
}

#[async_trait]
impl LlmClient for StubLlm {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        _max_tokens: Option<u32>,
        _temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        self.prompts
            .lock()
            .unwrap()
            .push((system_prompt.map(str::to_string), prompt.to_string()));

        let scripted = if system_prompt == Some(LINK_SYSTEM_PROMPT) {
            &self.classification
        } else {
            &self.brochure
        };
        scripted
            .clone()
            .map(|text| LlmResponse {
                text,
                model: Some("stub".into()),
                tokens_used: None,
            })
            .map_err(BrochureError::Llm)
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}

#[derive(Default)]
pub struct CollectingReporter {
    pub errors: Mutex<Vec<String>>,
    pub warnings: Mutex<Vec<String>>,
}

impl CollectingReporter {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, error: &BrochureError) {
        self.errors.lock().unwrap().push(error.to_string());
    }

    fn warn(&self, error: &BrochureError) {
        self.warnings.lock().unwrap().push(error.to_string());
    }
}

pub struct Harness {
    pub fetcher: Arc<StubFetcher>,
    pub llm: Arc<StubLlm>,
    pub reporter: Arc<CollectingReporter>,
}

impl Harness {
    pub fn new(fetcher: StubFetcher, llm: StubLlm) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            llm: Arc::new(llm),
            reporter: Arc::new(CollectingReporter::default()),
        }
    }

    pub fn classifier(&self) -> LinkClassifier {
        LinkClassifier::new(self.llm.clone(), self.reporter.clone())
    }

    pub fn aggregator(&self, options: AggregatorOptions) -> ContentAggregator {
        ContentAggregator::new(
            self.fetcher.clone(),
            self.classifier(),
            self.reporter.clone(),
            options,
        )
    }

    pub fn composer(&self) -> DocumentComposer {
        build_composer(
            self.llm.clone(),
            self.fetcher.clone(),
            self.reporter.clone(),
            AggregatorOptions::default(),
        )
    }
}
