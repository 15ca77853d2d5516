//! Link relevance classification through the generation client.

use std::sync::Arc;

use brochure_common::{BrochureError, Result};
use brochure_llm::traits::{extract_json_block, LlmClient};
use brochure_web::Page;
use serde::Deserialize;

use crate::report::ErrorReporter;

pub const LINK_SYSTEM_PROMPT: &str = r#"You are given the list of links found on a company's web page.
Decide which of these links would be most relevant to include in a brochure about the company,
such as links to an About page, a Company page, or Careers/Jobs pages.
Respond in JSON exactly like this example:
{
    "links": [
        {"type": "about page", "url": "https://full.url/goes/here/about"},
        {"type": "careers page", "url": "https://another.full.url/careers"}
    ]
}
"#;

/// One relevant link. `label` is free text chosen by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLink {
    pub label: String,
    pub url: String,
}

/// Relevant links in the order the classifier returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkClassification {
    links: Vec<ClassifiedLink>,
}

impl LinkClassification {
    pub fn new(links: Vec<ClassifiedLink>) -> Self {
        Self { links }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClassifiedLink> {
        self.links.iter()
    }
}

impl IntoIterator for LinkClassification {
    type Item = ClassifiedLink;
    type IntoIter = std::vec::IntoIter<ClassifiedLink>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.into_iter()
    }
}

#[derive(Debug, Deserialize)]
struct LinksWire {
    links: Vec<LinkWire>,
}

#[derive(Debug, Deserialize)]
struct LinkWire {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

pub struct LinkClassifier {
    llm: Arc<dyn LlmClient>,
    reporter: Arc<dyn ErrorReporter>,
}

impl LinkClassifier {
    pub fn new(llm: Arc<dyn LlmClient>, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self { llm, reporter }
    }

    /// Ask the model which of `page`'s links belong in a brochure.
    ///
    /// Never fails: any error is reported and yields an empty classification,
    /// so the pipeline continues with the landing page alone.
    pub async fn classify(&self, company_url: &str, page: &Page) -> LinkClassification {
        match self.try_classify(company_url, page).await {
            Ok(classification) => {
                tracing::info!(
                    company_url,
                    candidates = page.outbound_links.len(),
                    relevant = classification.len(),
                    "links.classified"
                );
                classification
            }
            Err(e) => {
                self.reporter.report(&e);
                LinkClassification::default()
            }
        }
    }

    async fn try_classify(&self, company_url: &str, page: &Page) -> Result<LinkClassification> {
        let prompt = links_user_prompt(company_url, page);
        tracing::debug!(%prompt, "links.prompt");

        let response = self
            .llm
            .generate_json(&prompt, Some(LINK_SYSTEM_PROMPT), None)
            .await
            .map_err(|e| BrochureError::Classification(e.to_string()))?;

        parse_classification(&response.text)
    }
}

pub fn links_user_prompt(company_url: &str, page: &Page) -> String {
    let mut prompt = format!(
        "Here is the list of links on the website of {company_url} - \
         please decide which of these are relevant web links for a brochure about the company, \
         respond with the full https URL in JSON format. \
         Do not include Terms of Service, Privacy, or email links.\n\
         Links (some might be relative links):\n"
    );
    prompt.push_str(&page.outbound_links.join("\n"));
    prompt
}

/// Parse the model output into a classification.
///
/// Entries missing a non-empty `type` or `url` are dropped; the label
/// vocabulary is not checked.
pub fn parse_classification(text: &str) -> Result<LinkClassification> {
    let json = extract_json_block(text).ok_or_else(|| {
        BrochureError::Classification("response did not contain a JSON object".to_string())
    })?;

    let wire: LinksWire = serde_json::from_str(json)
        .map_err(|e| BrochureError::Classification(format!("invalid JSON: {e}")))?;

    let total = wire.links.len();
    let links: Vec<ClassifiedLink> = wire
        .links
        .into_iter()
        .filter_map(|l| {
            let label = l.kind?.trim().to_string();
            let url = l.url?.trim().to_string();
            (!label.is_empty() && !url.is_empty()).then_some(ClassifiedLink { label, url })
        })
        .collect();

    if links.len() < total {
        tracing::debug!(dropped = total - links.len(), "links.incomplete_entries_dropped");
    }
    Ok(LinkClassification::new(links))
}
