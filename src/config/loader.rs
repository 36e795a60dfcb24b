//! Configuration loading
//!
//! This module loads the etcd connection descriptor from a file and applies
//! environment variable overrides.

use std::path::Path;

use tracing::{debug, info};

use super::types::EtcdClientConfig;
use crate::error::ConfigError;

/// Load the etcd connection descriptor from a JSON file
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed or validated.
pub fn load_config(path: impl AsRef<Path>) -> Result<EtcdClientConfig, ConfigError> {
    let path = path.as_ref();

    debug!("Loading etcd configuration from {:?}", path);

    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let contents = std::fs::read_to_string(path)?;

    let config: EtcdClientConfig = serde_json::from_str(&contents).map_err(|e| {
        ConfigError::ParseError(format!("Failed to parse JSON: {e} at {path:?}"))
    })?;

    config.validate()?;

    info!(
        "etcd configuration loaded: {} endpoint(s), prefix={}, tls={}",
        config.endpoints.len(),
        config.prefix,
        config.uses_tls()
    );

    Ok(config)
}

/// Load the etcd connection descriptor from a JSON string
///
/// # Errors
///
/// Returns `ConfigError` if parsing or validation fails.
pub fn load_config_str(json: &str) -> Result<EtcdClientConfig, ConfigError> {
    let config: EtcdClientConfig =
        serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.validate()?;

    Ok(config)
}

/// Load the descriptor with environment variable overrides
///
/// Environment variables:
/// - `CONCENTRATOR_ETCD_ENDPOINTS`: comma separated endpoint list
/// - `CONCENTRATOR_ETCD_USERNAME`: username
/// - `CONCENTRATOR_ETCD_PASSWORD`: password
/// - `CONCENTRATOR_ETCD_PREFIX`: key prefix
///
/// # Errors
///
/// Returns `ConfigError` if loading, parsing or validation fails.
pub fn load_config_with_env(path: impl AsRef<Path>) -> Result<EtcdClientConfig, ConfigError> {
    let mut config = load_config(path)?;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    Ok(config)
}

/// Apply overrides from a variable lookup and re-validate
fn apply_env_overrides(
    config: &mut EtcdClientConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(endpoints) = lookup("CONCENTRATOR_ETCD_ENDPOINTS") {
        let parsed: Vec<String> = endpoints
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(String::from)
            .collect();
        if parsed.is_empty() {
            return Err(ConfigError::EnvError {
                name: "CONCENTRATOR_ETCD_ENDPOINTS".into(),
                reason: format!("No endpoints in '{endpoints}'"),
            });
        }
        config.endpoints = parsed;
        debug!("etcd endpoints overridden to {:?}", config.endpoints);
    }

    if let Some(username) = lookup("CONCENTRATOR_ETCD_USERNAME") {
        config.username = Some(username);
        debug!("etcd username overridden");
    }

    if let Some(password) = lookup("CONCENTRATOR_ETCD_PASSWORD") {
        config.password = Some(password);
        debug!("etcd password overridden");
    }

    if let Some(prefix) = lookup("CONCENTRATOR_ETCD_PREFIX") {
        config.prefix = prefix;
        debug!("etcd prefix overridden to {}", config.prefix);
    }

    config.validate()
}
