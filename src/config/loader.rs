//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::{ClientConfig, Cluster};
use crate::config::validation::{validate_config, ValidationError};

/// Overrides `network.rpc_url`.
pub const RPC_URL_ENV_VAR: &str = "WALLET_RPC_URL";
/// Overrides `identity.api_url`.
pub const IDENTITY_URL_ENV_VAR: &str = "WALLET_IDENTITY_API_URL";
/// Overrides `identity.publishable_key`.
pub const PUBLISHABLE_KEY_ENV_VAR: &str = "WALLET_PUBLISHABLE_KEY";
/// Overrides `network.cluster` (devnet, testnet, mainnet-beta, localnet).
pub const CLUSTER_ENV_VAR: &str = "WALLET_CLUSTER";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ClientConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Resolve the effective configuration: file (or defaults), then environment.
pub fn resolve_config(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    resolve_config_with(path, |name| std::env::var(name).ok())
}

/// Like [`resolve_config`], with overrides read through `lookup`.
///
/// Callers layer command-line flags over the environment here so that every
/// override goes through validation.
pub fn resolve_config_with<F>(path: Option<&Path>, lookup: F) -> Result<ClientConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    apply_env_overrides(&mut config, lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply environment overrides through `lookup`. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut ClientConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(RPC_URL_ENV_VAR) {
        tracing::debug!(rpc_url = %url, "RPC URL overridden from environment");
        config.network.rpc_url = url;
    }
    if let Some(url) = get(IDENTITY_URL_ENV_VAR) {
        tracing::debug!(api_url = %url, "Identity API URL overridden from environment");
        config.identity.api_url = url;
    }
    if let Some(key) = get(PUBLISHABLE_KEY_ENV_VAR) {
        config.identity.publishable_key = key;
    }
    if let Some(name) = get(CLUSTER_ENV_VAR) {
        match Cluster::from_name(&name) {
            Some(cluster) => config.network.cluster = cluster,
            None => tracing::warn!(cluster = %name, "Ignoring unknown cluster override"),
        }
    }
}
