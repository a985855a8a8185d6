use crate::error::Result;
use crate::ml::ModelType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Config {
    /// Server configuration
    #[validate(nested)]
    pub server: ServerConfig,

    /// Telemetry provider configuration
    #[validate(nested)]
    pub telemetry: TelemetryConfig,

    /// Model artifact location
    pub model: ModelConfig,

    /// Offline training configuration
    #[validate(nested)]
    pub training: TrainingConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> std::result::Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/vitals.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: VITALS_)
            .add_source(
                config::Environment::with_prefix("VITALS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Load and validate in one step
    pub fn load_validated() -> Result<Self> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    #[validate(length(min = 1))]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TelemetryConfig {
    /// Provider base URL, without trailing slash
    #[serde(default = "default_base_url")]
    #[validate(length(min = 1))]
    pub base_url: String,

    /// Channel to read the latest reading from
    #[serde(default)]
    #[validate(length(min = 1, message = "telemetry.channel_id must be set"))]
    pub channel_id: String,

    /// Read API key; public channels need none
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-attempt request timeout (seconds)
    #[serde(default = "default_timeout")]
    #[validate(range(min = 1))]
    pub timeout_secs: u64,

    /// Extra attempts after a transient failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial retry backoff (milliseconds), doubled per attempt
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Artifact written by the trainer and loaded by the predictor
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TrainingConfig {
    /// Labeled CSV dataset
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Name of the label column
    #[serde(default = "default_label_column")]
    #[validate(length(min = 1))]
    pub label_column: String,

    /// Held-out fraction
    #[serde(default = "default_test_size")]
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub test_size: f64,

    /// Seed for the split and the estimator
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Classification algorithm
    #[serde(default)]
    pub algorithm: ModelType,

    /// Number of trees (random forest)
    #[serde(default = "default_n_trees")]
    #[validate(range(min = 1))]
    pub n_trees: u16,

    /// Maximum tree depth (tree-based models)
    #[serde(default)]
    pub max_depth: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_base_url() -> String {
    "https://api.thingspeak.com".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    250
}

fn default_model_path() -> PathBuf {
    PathBuf::from("model.bin")
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("health_data.csv")
}

fn default_label_column() -> String {
    "target".to_string()
}

fn default_test_size() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_n_trees() -> u16 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}
