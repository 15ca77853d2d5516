use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use brochure_common::observability::init_logging;
use brochure_config::{BrochureConfig, BrochureConfigLoader, DEFAULT_CONFIG_FILE};
use brochure_llm::ensure_llm_ready;
use brochure_pipeline::build_composer;
use brochure_web::{DEFAULT_USER_AGENT, HttpPageFetcher};
use clap::Parser;
use cli::Args;
use reporter::StderrReporter;

mod cli;
mod reporter;

const APP_NAME: &str = "brochure";

fn load_config(explicit: Option<&Path>) -> Result<BrochureConfig> {
    let loader = match explicit {
        Some(path) => BrochureConfigLoader::new().with_file(path),
        None => BrochureConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    loader.load().context("loading brochure configuration")
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // .env first so ${OPENAI_API_KEY} can come from it
    dotenv::dotenv().ok();
    let args = Args::parse();

    let input = match args.company() {
        Ok(input) => input,
        Err(e) => {
            eprintln!("{e}");
            return Ok(ExitCode::from(2));
        }
    };

    let cfg = load_config(args.config.as_deref())?;
    let log_path = init_logging(cfg.logging.to_log_config(APP_NAME))?;
    tracing::info!(log_path = %log_path.display(), name = %input.name, url = %input.url, "brochure.start");

    let llm = ensure_llm_ready(&cfg.llm)?;
    let user_agent = cfg.fetch.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
    let fetcher = HttpPageFetcher::new(user_agent, cfg.fetch.timeout())?;
    let composer = build_composer(
        llm,
        Arc::new(fetcher),
        Arc::new(StderrReporter),
        cfg.aggregator_options(),
    );

    let brochure = composer.compose(&input.name, &input.url).await?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &brochure)
                .with_context(|| format!("writing brochure to {}", path.display()))?;
            tracing::info!(path = %path.display(), "brochure.written");
        }
        None => println!("{brochure}"),
    }
    Ok(ExitCode::SUCCESS)
}
