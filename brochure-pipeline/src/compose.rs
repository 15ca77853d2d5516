//! Final brochure generation from the aggregated company document.

use std::sync::Arc;

use brochure_common::{truncate_chars, BrochureError, Result, MAX_DOCUMENT_CHARS};
use brochure_llm::traits::LlmClient;

use crate::aggregate::{AggregatedDocument, ContentAggregator};
use crate::report::ErrorReporter;

pub const BROCHURE_SYSTEM_PROMPT: &str = r#"You are an assistant that analyzes the contents of several relevant pages from a company website
and creates a short humorous, entertaining, jokey brochure about the company for prospective customers, investors and recruits.
Respond in markdown. Include details of company culture, customers and careers/jobs if you have the information.
"#;

/// Returned in place of a brochure when generation fails.
pub const FALLBACK_MESSAGE: &str = "An error occurred while generating the brochure.";

pub struct DocumentComposer {
    aggregator: ContentAggregator,
    llm: Arc<dyn LlmClient>,
    reporter: Arc<dyn ErrorReporter>,
}

impl DocumentComposer {
    pub fn new(
        aggregator: ContentAggregator,
        llm: Arc<dyn LlmClient>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            aggregator,
            llm,
            reporter,
        }
    }

    /// Produce the markdown brochure for `company_name`.
    ///
    /// Errors only when content acquisition fails (see
    /// [`ContentAggregator::aggregate`]). A failed generation call is
    /// reported and replaced by [`FALLBACK_MESSAGE`].
    pub async fn compose(&self, company_name: &str, company_url: &str) -> Result<String> {
        let document = self.aggregator.aggregate(company_url).await?;
        let prompt = brochure_user_prompt(company_name, &document);
        tracing::debug!(prompt_chars = prompt.chars().count(), "compose.prompt");

        match self
            .llm
            .generate(&prompt, Some(BROCHURE_SYSTEM_PROMPT), None, None)
            .await
        {
            Ok(response) => {
                tracing::info!(
                    company_name,
                    model = ?response.model,
                    tokens_used = ?response.tokens_used,
                    "compose.done"
                );
                Ok(response.text)
            }
            Err(e) => {
                self.reporter
                    .report(&BrochureError::Composition(e.to_string()));
                Ok(FALLBACK_MESSAGE.to_string())
            }
        }
    }
}

/// The generation request body, capped at [`MAX_DOCUMENT_CHARS`].
pub fn brochure_user_prompt(company_name: &str, document: &AggregatedDocument) -> String {
    let prompt = format!(
        "You are looking at a company called: {company_name}\n\
         Here are the contents of its landing page and other relevant pages; \
         use this information to build a short brochure of the company in markdown.\n\
         {document}"
    );
    truncate_chars(&prompt, MAX_DOCUMENT_CHARS).to_string()
}
