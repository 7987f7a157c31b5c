//! Configuration structures for TexDit
//!
//! This module defines all configuration types used by the servers and the benchmark tools.
//! Configurations are loaded from YAML files and can be overridden by `TEXDIT__*` environment variables.

use crate::error::{Result, TexditError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration for TexDit components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TexditConfig {
    /// Which component this configuration drives
    pub mode: ArchitectureMode,

    /// Server binding address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Specialized-models architecture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialized: Option<SpecializedConfig>,

    /// Single-LLM architecture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_llm: Option<SingleLlmConfig>,

    /// Benchmark harness
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bench: Option<BenchConfig>,

    /// Input limits and task defaults
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Observability configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

/// Component mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArchitectureMode {
    /// Several small task-specific models plus rule-based heuristics
    Specialized,

    /// One instruction-tuned model handling every task through prompts
    SingleLlm,

    /// Benchmark tooling
    Bench,
}

impl ArchitectureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Specialized => "specialized",
            Self::SingleLlm => "single_llm",
            Self::Bench => "bench",
        }
    }
}

impl std::str::FromStr for ArchitectureMode {
    type Err = TexditError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "specialized" => Ok(Self::Specialized),
            "single_llm" => Ok(Self::SingleLlm),
            "bench" => Ok(Self::Bench),
            other => Err(TexditError::config(format!("Invalid mode: {}", other))),
        }
    }
}

impl fmt::Display for ArchitectureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model family, which decides how generated text is post-processed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Encoder-decoder models (T5, BART); output never echoes the prompt
    #[default]
    Seq2Seq,

    /// Decoder-only models; output may start with the prompt
    Causal,
}

/// Connection details for a model served by an OpenAI-compatible backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEndpointConfig {
    /// Base URL of the backend, e.g. `http://127.0.0.1:8000/v1`
    pub endpoint: String,

    /// Model identifier as known to the backend
    pub model: String,

    /// Bearer token, if the backend wants one
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model family
    #[serde(default)]
    pub kind: ModelKind,

    /// Request timeout in seconds
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

impl ModelEndpointConfig {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, kind: ModelKind) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
            kind,
            timeout_secs: default_backend_timeout(),
        }
    }

    /// Request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self, section: &str) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(TexditError::config(format!("{}: endpoint must not be empty", section)));
        }
        if self.model.trim().is_empty() {
            return Err(TexditError::config(format!("{}: model must not be empty", section)));
        }
        Ok(())
    }
}

/// Specialized-models architecture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecializedConfig {
    /// Seq2seq summarization model
    pub summarizer: ModelEndpointConfig,

    /// Rephrasing model; the summarizer is reused when absent
    #[serde(default)]
    pub rephraser: Option<ModelEndpointConfig>,
}

/// Single-LLM architecture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleLlmConfig {
    /// Model loaded at startup
    pub model: ModelEndpointConfig,

    /// Models `/api/switch_model` may switch to
    #[serde(default = "default_supported_models")]
    pub supported_models: Vec<String>,
}

/// A single-LLM candidate measured by the architecture benchmark
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmOption {
    /// Display name
    pub name: String,

    /// Approximate on-disk size
    pub size_description: String,

    /// Where and how to reach it
    pub model: ModelEndpointConfig,
}

/// Benchmark harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Base URL of the specialized-models server
    #[serde(default = "default_specialized_url")]
    pub specialized_url: String,

    /// Base URL of the single-LLM server
    #[serde(default = "default_single_llm_url")]
    pub single_llm_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_bench_request_timeout")]
    pub request_timeout_secs: u64,

    /// Directory JSON reports are written to
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    /// Server executable spawned by the manager
    #[serde(default = "default_server_binary")]
    pub server_binary: PathBuf,

    /// Config file handed to the specialized server
    #[serde(default)]
    pub specialized_config: Option<PathBuf>,

    /// Config file handed to the single-LLM server
    #[serde(default)]
    pub single_llm_config: Option<PathBuf>,

    /// Startup deadline for the specialized server
    #[serde(default = "default_specialized_startup")]
    pub specialized_startup_secs: u64,

    /// Startup deadline for the single-LLM server (model loading is slower)
    #[serde(default = "default_single_llm_startup")]
    pub single_llm_startup_secs: u64,

    /// Health poll interval in milliseconds
    #[serde(default = "default_health_interval")]
    pub health_interval_ms: u64,

    /// Consecutive failed polls before a server is considered down
    #[serde(default = "default_max_health_attempts")]
    pub max_health_attempts: u32,

    /// Specialized summarizer measured in-process
    #[serde(default = "default_bench_summarizer")]
    pub summarizer: ModelEndpointConfig,

    /// Single-LLM candidates measured in-process
    #[serde(default = "default_llm_options")]
    pub llm_options: Vec<LlmOption>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            specialized_url: default_specialized_url(),
            single_llm_url: default_single_llm_url(),
            request_timeout_secs: default_bench_request_timeout(),
            report_dir: default_report_dir(),
            server_binary: default_server_binary(),
            specialized_config: None,
            single_llm_config: None,
            specialized_startup_secs: default_specialized_startup(),
            single_llm_startup_secs: default_single_llm_startup(),
            health_interval_ms: default_health_interval(),
            max_health_attempts: default_max_health_attempts(),
            summarizer: default_bench_summarizer(),
            llm_options: default_llm_options(),
        }
    }
}

impl BenchConfig {
    /// Per-request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Health poll interval as Duration
    pub fn health_interval(&self) -> Duration {
        Duration::from_millis(self.health_interval_ms)
    }
}

/// Input limits and task defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum accepted text length in characters
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,

    /// Minimum words needed before summarizing
    #[serde(default = "default_min_summary_words")]
    pub min_summary_words: usize,

    /// Summary ratio used when the request has none
    #[serde(default = "default_ratio")]
    pub default_ratio: f64,

    /// Fuzzy search result count used when the request has none
    #[serde(default = "default_search_limit")]
    pub default_search_limit: usize,

    /// Prompt truncation for specialized models
    #[serde(default = "default_specialized_input_tokens")]
    pub specialized_input_tokens: usize,

    /// Prompt truncation for the single LLM
    #[serde(default = "default_single_llm_input_tokens")]
    pub single_llm_input_tokens: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_text_chars: default_max_text_chars(),
            min_summary_words: default_min_summary_words(),
            default_ratio: default_ratio(),
            default_search_limit: default_search_limit(),
            specialized_input_tokens: default_specialized_input_tokens(),
            single_llm_input_tokens: default_single_llm_input_tokens(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Expose Prometheus metrics on `/metrics`
    #[serde(default = "default_metrics")]
    pub enable_metrics: bool,

    /// Emit JSON log lines
    #[serde(default)]
    pub structured_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            enable_metrics: default_metrics(),
            structured_logging: false,
        }
    }
}

/// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_backend_endpoint() -> String {
    "http://127.0.0.1:8000/v1".to_string()
}

fn default_backend_timeout() -> u64 {
    120
}

fn default_supported_models() -> Vec<String> {
    vec![
        "google/flan-t5-base".to_string(),
        "google/flan-t5-large".to_string(),
        "google/flan-t5-small".to_string(),
    ]
}

fn default_specialized_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_single_llm_url() -> String {
    "http://localhost:5001".to_string()
}

fn default_bench_request_timeout() -> u64 {
    30
}

fn default_report_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_server_binary() -> PathBuf {
    PathBuf::from("texdit-server")
}

fn default_specialized_startup() -> u64 {
    30
}

fn default_single_llm_startup() -> u64 {
    60
}

fn default_health_interval() -> u64 {
    1000
}

fn default_max_health_attempts() -> u32 {
    15
}

fn default_bench_summarizer() -> ModelEndpointConfig {
    ModelEndpointConfig::new(
        default_backend_endpoint(),
        "sshleifer/distilbart-cnn-12-6",
        ModelKind::Seq2Seq,
    )
}

fn default_llm_options() -> Vec<LlmOption> {
    let option = |name: &str, model: &str, size: &str, kind| LlmOption {
        name: name.to_string(),
        size_description: size.to_string(),
        model: ModelEndpointConfig::new(default_backend_endpoint(), model, kind),
    };

    vec![
        option("Flan-T5-Small", "google/flan-t5-small", "~310MB", ModelKind::Seq2Seq),
        option("Flan-T5-Base", "google/flan-t5-base", "~990MB", ModelKind::Seq2Seq),
        option("Flan-T5-Large", "google/flan-t5-large", "~3GB", ModelKind::Seq2Seq),
        option(
            "Phi-3-Mini-Instruct",
            "microsoft/Phi-3-mini-4k-instruct",
            "~3.8GB",
            ModelKind::Causal,
        ),
    ]
}

fn default_max_text_chars() -> usize {
    10_000
}

fn default_min_summary_words() -> usize {
    10
}

fn default_ratio() -> f64 {
    0.25
}

fn default_search_limit() -> usize {
    10
}

fn default_specialized_input_tokens() -> usize {
    512
}

fn default_single_llm_input_tokens() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics() -> bool {
    true
}

impl TexditConfig {
    /// Built-in configuration for a mode
    pub fn defaults_for(mode: ArchitectureMode) -> Self {
        let mut config = TexditConfig {
            mode,
            bind_address: default_bind_address(),
            port: default_port(),
            specialized: None,
            single_llm: None,
            bench: None,
            limits: LimitsConfig::default(),
            observability: Some(ObservabilityConfig::default()),
        };

        match mode {
            ArchitectureMode::Specialized => {
                config.specialized = Some(SpecializedConfig {
                    summarizer: ModelEndpointConfig::new(
                        default_backend_endpoint(),
                        "t5-small",
                        ModelKind::Seq2Seq,
                    ),
                    rephraser: None,
                });
            }
            ArchitectureMode::SingleLlm => {
                config.port = 5001;
                config.single_llm = Some(SingleLlmConfig {
                    model: ModelEndpointConfig::new(
                        default_backend_endpoint(),
                        "google/flan-t5-large",
                        ModelKind::Seq2Seq,
                    ),
                    supported_models: default_supported_models(),
                });
            }
            ArchitectureMode::Bench => {
                config.bench = Some(BenchConfig::default());
            }
        }

        config
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            TexditError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: TexditConfig = serde_yaml::from_str(&content).map_err(|e| {
            TexditError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load layered configuration: mode defaults, then the YAML file (if any),
    /// then `TEXDIT__*` environment overrides.
    ///
    /// The mode comes from the file or environment when set there, otherwise `fallback_mode`.
    pub fn load(path: Option<&Path>, fallback_mode: ArchitectureMode) -> Result<Self> {
        let overrides = Self::override_sources(path)?.build()?;
        let mode = match overrides.get_string("mode") {
            Ok(value) => value.parse()?,
            Err(_) => fallback_mode,
        };

        let defaults = config::Config::try_from(&Self::defaults_for(mode))?;
        let merged = config::Config::builder()
            .add_source(defaults)
            .add_source(overrides)
            .build()?;

        let config: TexditConfig = merged.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn override_sources(
        path: Option<&Path>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(TexditError::config(format!(
                    "Config file {} does not exist",
                    path.display()
                )));
            }
            builder = builder.add_source(
                config::File::from(path).format(config::FileFormat::Yaml),
            );
        }

        Ok(builder.add_source(
            config::Environment::with_prefix("TEXDIT")
                .separator("__")
                .try_parsing(true),
        ))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        match self.mode {
            ArchitectureMode::Specialized => {
                let specialized = self.specialized.as_ref().ok_or_else(|| {
                    TexditError::config("Specialized config required for specialized mode")
                })?;
                specialized.summarizer.validate("specialized.summarizer")?;
                if let Some(rephraser) = &specialized.rephraser {
                    rephraser.validate("specialized.rephraser")?;
                }
            }
            ArchitectureMode::SingleLlm => {
                let single = self.single_llm.as_ref().ok_or_else(|| {
                    TexditError::config("Single LLM config required for single_llm mode")
                })?;
                single.model.validate("single_llm.model")?;
                if single.supported_models.is_empty() {
                    return Err(TexditError::config(
                        "single_llm.supported_models must not be empty",
                    ));
                }
            }
            ArchitectureMode::Bench => {
                if self.bench.is_none() {
                    return Err(TexditError::config("Bench config required for bench mode"));
                }
            }
        }

        if self.mode != ArchitectureMode::Bench && self.port == 0 {
            return Err(TexditError::config("Invalid port number"));
        }

        if self.limits.max_text_chars == 0 {
            return Err(TexditError::config("limits.max_text_chars must be positive"));
        }

        if !(self.limits.default_ratio > 0.0 && self.limits.default_ratio <= 1.0) {
            return Err(TexditError::config(
                "limits.default_ratio must be between 0 and 1",
            ));
        }

        Ok(())
    }

    /// Bench section, or an error outside bench mode
    pub fn bench(&self) -> Result<&BenchConfig> {
        self.bench
            .as_ref()
            .ok_or_else(|| TexditError::config("Bench config not found"))
    }

    /// Observability settings, falling back to defaults
    pub fn observability(&self) -> ObservabilityConfig {
        self.observability.clone().unwrap_or_default()
    }
}
