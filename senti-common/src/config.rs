//! Configuration loading and path resolution
//!
//! Bootstrap configuration lives in a single TOML file. Every field has a
//! built-in default so a missing or partial file never prevents startup.
//!
//! # Config file resolution
//! 1. `SENTI_CONFIG` environment variable
//! 2. `<config dir>/senti/config.toml` (e.g. `~/.config/senti/config.toml`)
//! 3. Built-in defaults

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "SENTI_CONFIG";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub secondary: SecondaryConfig,

    #[serde(default)]
    pub inference: InferenceConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub pipeline: PipelineSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Primary (local) storage layout
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Base folder for all local artifacts
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,

    /// Subfolder of `data_root` holding fetched raw CSV files
    #[serde(default = "default_raw_dir")]
    pub raw_dir: String,

    /// Subfolder of `data_root` holding processed manifests
    #[serde(default = "default_preprocessed_dir")]
    pub preprocessed_dir: String,
}

impl StorageConfig {
    pub fn raw_root(&self) -> PathBuf {
        self.data_root.join(&self.raw_dir)
    }

    pub fn preprocessed_root(&self) -> PathBuf {
        self.data_root.join(&self.preprocessed_dir)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            raw_dir: default_raw_dir(),
            preprocessed_dir: default_preprocessed_dir(),
        }
    }
}

/// Secondary (distributed) store reachable over WebHDFS
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecondaryConfig {
    /// Disable to skip the mirror leg entirely
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Namenode HTTP address, e.g. `http://localhost:9870`
    #[serde(default = "default_secondary_uri")]
    pub uri: String,

    /// Value for the WebHDFS `user.name` parameter
    #[serde(default)]
    pub user: Option<String>,

    /// Mirror root for raw fetched files
    #[serde(default = "default_secondary_raw_root")]
    pub raw_root: String,

    /// Mirror root for processed manifests
    #[serde(default = "default_secondary_preprocessed_root")]
    pub preprocessed_root: String,

    #[serde(default = "default_secondary_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            uri: default_secondary_uri(),
            user: None,
            raw_root: default_secondary_raw_root(),
            preprocessed_root: default_secondary_preprocessed_root(),
            timeout_secs: default_secondary_timeout_secs(),
        }
    }
}

/// Remote inference API settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InferenceConfig {
    #[serde(default = "default_inference_endpoint")]
    pub endpoint: String,

    /// Bearer token. The `SENTI_INFERENCE_API_KEY` environment variable takes priority.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_inference_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_inference_endpoint(),
            api_key: None,
            timeout_secs: default_inference_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

/// Disk-resident statistical model
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModelConfig {
    /// JSON model file. When unset or unreadable the model backend reports
    /// itself unavailable and the fallback chain moves on.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// External comment-fetch scripts
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    #[serde(default = "default_python")]
    pub python: String,

    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            scripts_dir: default_scripts_dir(),
        }
    }
}

/// Pipeline tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineSettings {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Concurrent backend calls within one batch (1 = strictly sequential)
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Backend preference order, by backend key
    #[serde(default = "default_backend_order")]
    pub backend_order: Vec<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_in_flight: default_max_in_flight(),
            backend_order: default_backend_order(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_data_root() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("senti"))
        .unwrap_or_else(|| PathBuf::from("./senti_data"))
}

fn default_raw_dir() -> String {
    "raw".to_string()
}

fn default_preprocessed_dir() -> String {
    "preprocessed".to_string()
}

fn default_secondary_uri() -> String {
    "http://localhost:9870".to_string()
}

fn default_secondary_raw_root() -> String {
    "/sentiment-analysis/data".to_string()
}

fn default_secondary_preprocessed_root() -> String {
    "/sentiment-analysis/preprocessed".to_string()
}

fn default_secondary_timeout_secs() -> u64 {
    30
}

fn default_inference_endpoint() -> String {
    "https://api-inference.huggingface.co/models/cardiffnlp/twitter-roberta-base-sentiment"
        .to_string()
}

fn default_inference_timeout_secs() -> u64 {
    15
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from("scripts")
}

fn default_batch_size() -> usize {
    10
}

fn default_max_in_flight() -> usize {
    1
}

fn default_backend_order() -> Vec<String> {
    vec![
        "statistical".to_string(),
        "remote".to_string(),
        "lexicon".to_string(),
    ]
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Locate the config file: `SENTI_CONFIG`, then the per-user config dir.
///
/// Returns `None` when neither exists.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
        warn!(
            "{} points to missing file {}, ignoring",
            CONFIG_PATH_ENV,
            path.display()
        );
    }

    dirs::config_dir()
        .map(|d| d.join("senti").join("config.toml"))
        .filter(|p| p.exists())
}

/// Load configuration from a TOML file
///
/// A missing file is not an error: defaults are used and a warning is logged.
/// A present but unparseable file is a configuration error.
pub fn load_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file {} not found, using built-in defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Load configuration from the resolved location, or defaults
pub fn load_resolved_config() -> Result<TomlConfig> {
    match resolve_config_path() {
        Some(path) => load_config(&path),
        None => {
            info!("No config file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Write configuration to a TOML file via temp file + rename
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
