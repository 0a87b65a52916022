//! Configuration validation.
//!
//! Returns all validation errors, not just the first.

use std::fmt;

use alloy::primitives::Address;
use url::Url;

use crate::config::schema::OrchestratorConfig;

/// A single semantic problem with a configuration value.
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

/// Semantic checks on a parsed configuration.
pub fn validate_config(config: &OrchestratorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.gateway.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "gateway.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("gateway.base_url", e.to_string())),
    }
    if config.gateway.request_timeout_secs == 0 {
        errors.push(ValidationError::new("gateway.request_timeout_secs", "must be > 0"));
    }
    if config.gateway.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("gateway.connect_timeout_secs", "must be > 0"));
    }

    if config.asset.symbol.trim().is_empty() {
        errors.push(ValidationError::new("asset.symbol", "must not be empty"));
    }
    if config.asset.decimals > 36 {
        errors.push(ValidationError::new("asset.decimals", "must be <= 36"));
    }
    if config.asset.contract_address.parse::<Address>().is_err() {
        errors.push(ValidationError::new(
            "asset.contract_address",
            format!("'{}' is not an EVM address", config.asset.contract_address),
        ));
    }
    if config.asset.default_chain.trim().is_empty() {
        errors.push(ValidationError::new("asset.default_chain", "must not be empty"));
    }

    let polling = &config.polling;
    if polling.max_attempts == 0 {
        errors.push(ValidationError::new("polling.max_attempts", "must be >= 1"));
    }
    if polling.timeout_secs == 0 {
        errors.push(ValidationError::new("polling.timeout_secs", "must be > 0"));
    }
    if polling.base_delay_ms > polling.max_delay_ms {
        errors.push(ValidationError::new(
            "polling.base_delay_ms",
            "must not exceed polling.max_delay_ms",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
