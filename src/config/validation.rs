//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check that every credential resolves to key material
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("`{}` is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new("listener.max_connections", "must be greater than 0"));
    }

    if config.document.path.trim().is_empty() {
        errors.push(ValidationError::new("document.path", "must not be empty"));
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.connect_secs", timeouts.connect_secs),
        ("timeouts.request_secs", timeouts.request_secs),
        ("timeouts.upstream_secs", timeouts.upstream_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }
    if timeouts.upstream_secs > timeouts.request_secs {
        errors.push(ValidationError::new(
            "timeouts.upstream_secs",
            "must not exceed timeouts.request_secs",
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }

    let mut names = HashSet::new();
    for (i, key) in config.credentials.api_keys.iter().enumerate() {
        let field = format!("credentials.api_keys[{}]", i);
        if !names.insert(key.name.as_str()) {
            errors.push(ValidationError::new(&field, format!("duplicate key name `{}`", key.name)));
        }
        if key.value.is_some() && key.value_env.is_some() {
            errors.push(ValidationError::new(&field, "set either `value` or `value_env`, not both"));
        } else if key.resolve().is_none() {
            errors.push(ValidationError::new(&field, "key material is missing or empty"));
        }
    }

    let mut key_ids = HashSet::new();
    for (i, key) in config.credentials.signing_keys.iter().enumerate() {
        let field = format!("credentials.signing_keys[{}]", i);
        if !key_ids.insert(key.access_key_id.as_str()) {
            errors.push(ValidationError::new(
                &field,
                format!("duplicate access key id `{}`", key.access_key_id),
            ));
        }
        if key.secret.is_some() && key.secret_env.is_some() {
            errors.push(ValidationError::new(&field, "set either `secret` or `secret_env`, not both"));
        } else if key.resolve().is_none() {
            errors.push(ValidationError::new(&field, "secret is missing or empty"));
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
