use brochure_common::BrochureError;
use brochure_pipeline::ErrorReporter;

/// Prints recovered pipeline errors for the person running the CLI.
pub struct StderrReporter;

impl ErrorReporter for StderrReporter {
    fn report(&self, error: &BrochureError) {
        tracing::error!(error = %error, "pipeline.error");
        eprintln!("error: {error}");
    }

    fn warn(&self, error: &BrochureError) {
        tracing::warn!(error = %error, "pipeline.warning");
        eprintln!("warning: {error}");
    }
}
