use std::path::PathBuf;

use brochure_common::BrochureError;
use clap::Parser;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "brochure")]
#[command(about = "Generate a short markdown brochure from a company's website")]
#[command(version)]
pub struct Args {
    /// Company name as it should appear in the brochure
    #[arg(short, long)]
    pub name: String,

    /// Landing page URL (http or https)
    #[arg(short, long)]
    pub url: String,

    /// Configuration file; defaults to ./brochure.yaml when present
    #[arg(short, long, env = "BROCHURE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the brochure here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Validated company name and landing URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyInput {
    pub name: String,
    pub url: String,
}

impl Args {
    pub fn company(&self) -> Result<CompanyInput, BrochureError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(BrochureError::Input("company name is blank".into()));
        }
        let url = self.url.trim();
        if url.is_empty() {
            return Err(BrochureError::Input("landing page URL is blank".into()));
        }
        let parsed = Url::parse(url)
            .map_err(|e| BrochureError::Input(format!("landing page URL '{url}' is invalid: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BrochureError::Input(format!(
                "landing page URL '{url}' must use http or https"
            )));
        }
        Ok(CompanyInput {
            name: name.to_string(),
            url: url.to_string(),
        })
    }
}
