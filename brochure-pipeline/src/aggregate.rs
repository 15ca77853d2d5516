//! Landing page + classified sub-pages merged into one bounded document.

use std::fmt;
use std::sync::Arc;

use brochure_common::{truncate_chars, BrochureError, Result, MAX_DOCUMENT_CHARS};
use brochure_web::{load_page, PageFetcher};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::classify::LinkClassifier;
use crate::report::ErrorReporter;

/// What to do when a classified sub-page cannot be fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubpageFailurePolicy {
    /// Leave the section out and report a warning.
    #[default]
    Skip,
    /// Fail the whole aggregation with the fetch error.
    Abort,
}

#[derive(Debug, Clone, Copy)]
pub struct AggregatorOptions {
    /// Upper bound on sub-page fetches in flight.
    pub max_concurrent_fetches: usize,
    pub subpage_failures: SubpageFailurePolicy,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 4,
            subpage_failures: SubpageFailurePolicy::Skip,
        }
    }
}

/// Merged page text, at most [`MAX_DOCUMENT_CHARS`] characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedDocument(String);

impl AggregatedDocument {
    /// Cut `text` to the character budget.
    pub fn new(mut text: String) -> Self {
        let keep = truncate_chars(&text, MAX_DOCUMENT_CHARS).len();
        text.truncate(keep);
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AggregatedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct ContentAggregator {
    fetcher: Arc<dyn PageFetcher>,
    classifier: LinkClassifier,
    reporter: Arc<dyn ErrorReporter>,
    options: AggregatorOptions,
}

impl ContentAggregator {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        classifier: LinkClassifier,
        reporter: Arc<dyn ErrorReporter>,
        options: AggregatorOptions,
    ) -> Self {
        Self {
            fetcher,
            classifier,
            reporter,
            options,
        }
    }

    /// Fetch the landing page, classify its links, fetch the relevant ones,
    /// and merge everything in classification order.
    ///
    /// A landing page failure is returned as [`BrochureError::Fetch`];
    /// sub-page failures follow [`AggregatorOptions::subpage_failures`].
    #[tracing::instrument(skip(self), fields(run_id = %Uuid::new_v4()))]
    pub async fn aggregate(&self, company_url: &str) -> Result<AggregatedDocument> {
        let landing = load_page(self.fetcher.as_ref(), company_url).await?;
        tracing::info!(
            title = %landing.title,
            links = landing.outbound_links.len(),
            "aggregate.landing_loaded"
        );

        let classification = self.classifier.classify(company_url, &landing).await;
        let mut text = format!("Landing page:\n{}", landing.contents());

        let fetcher = self.fetcher.as_ref();
        // `buffered` yields in input order, whatever order the fetches finish in.
        let mut pages = stream::iter(classification)
            .map(|link| async move {
                let page = load_page(fetcher, &link.url).await;
                (link, page)
            })
            .buffered(self.options.max_concurrent_fetches.max(1));

        let (mut included, mut skipped) = (0usize, 0usize);
        while let Some((link, page)) = pages.next().await {
            match page {
                Ok(page) => {
                    text.push_str(&format!("\n\n{}\n", link.label));
                    text.push_str(&page.contents());
                    included += 1;
                }
                Err(e) => match self.options.subpage_failures {
                    SubpageFailurePolicy::Abort => return Err(e),
                    SubpageFailurePolicy::Skip => {
                        tracing::warn!(label = %link.label, url = %link.url, error = %e, "aggregate.subpage_skipped");
                        self.reporter.warn(&skipped_section(&link.label, e));
                        skipped += 1;
                    }
                },
            }
        }

        let raw_chars = text.chars().count();
        let document = AggregatedDocument::new(text);
        tracing::info!(
            included,
            skipped,
            raw_chars,
            truncated = raw_chars > MAX_DOCUMENT_CHARS,
            "aggregate.done"
        );
        Ok(document)
    }
}

fn skipped_section(label: &str, error: BrochureError) -> BrochureError {
    match error {
        BrochureError::Fetch { url, reason } => BrochureError::Fetch {
            url,
            reason: format!("{reason} (skipped section '{label}')"),
        },
        other => other,
    }
}
