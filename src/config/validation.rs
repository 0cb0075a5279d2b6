//! Configuration validation.
//!
//! Serde handles syntax; this checks values. Returns every problem found,
//! not just the first.

use std::fmt;

use crate::config::schema::ClientConfig;

const COMMITMENTS: [&str; 3] = ["processed", "confirmed", "finalized"];

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn check_url(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    match url::Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e))),
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let network = &config.network;
    check_url("network.rpc_url", &network.rpc_url, &mut errors);
    for url in &network.failover_urls {
        check_url("network.failover_urls", url, &mut errors);
    }
    if !COMMITMENTS.contains(&network.commitment.as_str()) {
        errors.push(ValidationError::new(
            "network.commitment",
            format!("'{}' is not one of {:?}", network.commitment, COMMITMENTS),
        ));
    }
    if network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("network.rpc_timeout_secs", "must be > 0"));
    }
    if network.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new("network.confirmation_timeout_secs", "must be > 0"));
    }
    if network.confirmation_poll_ms == 0 {
        errors.push(ValidationError::new("network.confirmation_poll_ms", "must be > 0"));
    }

    check_url("identity.api_url", &config.identity.api_url, &mut errors);
    if config.identity.request_timeout_secs == 0 {
        errors.push(ValidationError::new("identity.request_timeout_secs", "must be > 0"));
    }

    if config.airdrop.amount_lamports == 0 {
        errors.push(ValidationError::new("airdrop.amount_lamports", "must be > 0"));
    }

    check_url("explorer.base_url", &config.explorer.base_url, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ClientConfig::default();
        config.network.rpc_url = "not a url".to_string();
        config.network.commitment = "eventually".to_string();
        config.network.rpc_timeout_secs = 0;
        config.airdrop.amount_lamports = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "network.rpc_url",
                "network.commitment",
                "network.rpc_timeout_secs",
                "airdrop.amount_lamports"
            ]
        );
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let mut config = ClientConfig::default();
        config.explorer.base_url = "ftp://explorer.example".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("unsupported scheme 'ftp'"));
    }
}
