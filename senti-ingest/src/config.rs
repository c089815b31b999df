//! Configuration resolution for senti-ingest
//!
//! Secrets resolve with ENV → TOML priority.

use senti_common::config::TomlConfig;
use tracing::{info, warn};

/// Environment variable holding the remote inference API key
pub const INFERENCE_API_KEY_ENV: &str = "SENTI_INFERENCE_API_KEY";

/// Resolve the remote inference API key
///
/// **Priority:** ENV → TOML. Returns `None` when neither source holds a
/// usable key; the remote backend then runs unauthenticated.
pub fn resolve_inference_api_key(toml_config: &TomlConfig) -> Option<String> {
    let env_key = std::env::var(INFERENCE_API_KEY_ENV)
        .ok()
        .filter(|k| is_valid_key(k));
    let toml_key = toml_config
        .inference
        .api_key
        .clone()
        .filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "Inference API key found in environment and TOML. \
             Using environment (highest priority)."
        );
    }

    if let Some(key) = env_key {
        info!("Inference API key loaded from environment variable");
        return Some(key);
    }

    if let Some(key) = toml_key {
        info!("Inference API key loaded from TOML config");
        return Some(key);
    }

    None
}

/// Non-empty, non-whitespace
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
