//! Loader for brochure configuration with YAML + environment overlays.
//!
//! Sources are merged in this order, later ones winning:
//!
//! 1. built-in defaults (OpenAI provider, `gpt-4o-mini`, `${OPENAI_API_KEY}` token)
//! 2. an optional `brochure.yaml` (or any file format the `config` crate infers)
//! 3. `BROCHURE__`-prefixed environment variables, `__` separating nested keys
//!    (`BROCHURE__FETCH__TIMEOUT_SECS=30`)
//!
//! `${VAR}` placeholders are expanded after merging, so they may come from any
//! source. Unknown variables are left untouched.
use brochure_common::observability::{LogConfig, LogFormat};
use brochure_common::{DEFAULT_OPENAI_MODEL, LlmConfig};
use brochure_pipeline::{AggregatorOptions, SubpageFailurePolicy};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Default file name looked up by the CLI when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "brochure.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrochureConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    /// `None` keeps the fetcher's built-in agent string.
    pub user_agent: Option<String>,
    pub max_concurrent: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: None,
            max_concurrent: 4,
        }
    }
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub subpage_failures: SubpageFailurePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormat,
    pub emit_stderr: bool,
    pub dir: Option<PathBuf>,
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            emit_stderr: false,
            dir: None,
            filter: "info".to_string(),
        }
    }
}

impl LoggingSettings {
    pub fn to_log_config(&self, app_name: &'static str) -> LogConfig {
        LogConfig {
            app_name,
            log_dir: self.dir.clone(),
            emit_stderr: self.emit_stderr,
            format: self.format,
            default_filter: self.filter.clone(),
        }
    }
}

impl BrochureConfig {
    /// Aggregator options derived from the `fetch` and `pipeline` sections.
    pub fn aggregator_options(&self) -> AggregatorOptions {
        AggregatorOptions {
            max_concurrent_fetches: self.fetch.max_concurrent,
            subpage_failures: self.pipeline.subpage_failures,
        }
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (defaults + files + env overrides).
pub struct BrochureConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for BrochureConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl BrochureConfigLoader {
    /// Start from the built-in defaults; `BROCHURE__` env overrides are applied on `load`.
    ///
    /// ```
    /// use brochure_common::LlmConfig;
    /// use brochure_config::BrochureConfigLoader;
    ///
    /// let cfg = BrochureConfigLoader::new().load().expect("defaults load");
    ///
    /// assert_eq!(cfg.fetch.timeout_secs, 15);
    /// assert_eq!(cfg.fetch.max_concurrent, 4);
    /// assert!(matches!(cfg.llm, LlmConfig::OpenAi { ref model, .. } if model == "gpt-4o-mini"));
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use brochure_config::BrochureConfigLoader;
    /// use brochure_pipeline::SubpageFailurePolicy;
    ///
    /// let cfg = BrochureConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// fetch:
    ///   max_concurrent: 2
    /// pipeline:
    ///   subpage_failures: abort
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.fetch.max_concurrent, 2);
    /// assert_eq!(cfg.pipeline.subpage_failures, SubpageFailurePolicy::Abort);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders and deserialize.
    ///
    /// ```
    /// use brochure_common::LlmConfig;
    /// use brochure_config::BrochureConfigLoader;
    ///
    /// unsafe { std::env::set_var("BROCHURE_DOC_TOKEN", "injected-from-env"); }
    ///
    /// let config = BrochureConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// llm:
    ///   provider: openai
    ///   model: gpt-4o
    ///   auth_token: "${BROCHURE_DOC_TOKEN}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// match &config.llm {
    ///     LlmConfig::OpenAi { model, auth_token, endpoint, .. } => {
    ///         assert_eq!(model, "gpt-4o");
    ///         assert_eq!(auth_token, "injected-from-env");
    ///         assert_eq!(endpoint, "https://api.openai.com/v1");
    ///     }
    ///     _ => panic!("expected OpenAI configuration"),
    /// }
    ///
    /// unsafe { std::env::remove_var("BROCHURE_DOC_TOKEN"); }
    /// ```
    pub fn load(self) -> Result<BrochureConfig, ConfigError> {
        // Env is added last so it overrides every file source.
        let cfg = self
            .builder
            .set_default("llm.provider", "openai")?
            .set_default("llm.model", DEFAULT_OPENAI_MODEL)?
            .set_default("llm.auth_token", "${OPENAI_API_KEY}")?
            .add_source(
                Environment::with_prefix("BROCHURE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
