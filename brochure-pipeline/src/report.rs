//! The user-visible error channel.
//!
//! Recoverable failures (classification, composition, skipped sub-pages) do
//! not abort the pipeline; they are handed to an [`ErrorReporter`] instead.

use brochure_common::BrochureError;

pub trait ErrorReporter: Send + Sync {
    /// Surface a failure the pipeline recovered from.
    fn report(&self, error: &BrochureError);

    /// Surface a non-fatal warning, e.g. a skipped sub-page.
    fn warn(&self, error: &BrochureError) {
        self.report(error);
    }
}

/// Reports through `tracing` only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &BrochureError) {
        if error.is_recoverable() {
            tracing::warn!(error = %error, "pipeline.recovered");
        } else {
            tracing::error!(error = %error, "pipeline.error");
        }
    }

    fn warn(&self, error: &BrochureError) {
        tracing::warn!(error = %error, "pipeline.warning");
    }
}
