//! Content acquisition and brochure composition.
//!
//! The pipeline runs [`DocumentComposer`] → [`ContentAggregator`] →
//! (fetch + extract) landing page → [`LinkClassifier`] → (fetch + extract)
//! each relevant link → bounded [`AggregatedDocument`] → generation client.
//!
//! Collaborators are passed in explicitly as trait objects; nothing here
//! holds global state.

pub mod aggregate;
pub mod classify;
pub mod compose;
pub mod report;

use std::sync::Arc;

use brochure_llm::traits::LlmClient;
use brochure_web::PageFetcher;

pub use aggregate::{AggregatedDocument, AggregatorOptions, ContentAggregator, SubpageFailurePolicy};
pub use classify::{ClassifiedLink, LinkClassification, LinkClassifier};
pub use compose::{DocumentComposer, FALLBACK_MESSAGE};
pub use report::{ErrorReporter, TracingReporter};

/// Wire a [`DocumentComposer`] from its collaborators.
pub fn build_composer(
    llm: Arc<dyn LlmClient>,
    fetcher: Arc<dyn PageFetcher>,
    reporter: Arc<dyn ErrorReporter>,
    options: AggregatorOptions,
) -> DocumentComposer {
    let classifier = LinkClassifier::new(llm.clone(), reporter.clone());
    let aggregator = ContentAggregator::new(fetcher, classifier, reporter.clone(), options);
    DocumentComposer::new(aggregator, llm, reporter)
}
