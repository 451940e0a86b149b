//! Configuration schema definitions.
//!
//! This module defines the operational configuration of the gateway. The route
//! table itself lives in a separate API document referenced by
//! [`DocumentConfig::path`]. All types derive Serde traits for deserialization
//! from TOML.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, in-flight limit).
    pub listener: ListenerConfig,

    /// Location of the declarative API document.
    pub document: DocumentConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request hardening and signing settings.
    pub security: SecurityConfig,

    /// API keys and signing secrets.
    pub credentials: CredentialsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Values substituted into `${name}` placeholders of the API document.
    pub variables: BTreeMap<String, String>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrently handled requests (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Where to find the API document.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Path to the YAML/JSON document. Relative paths resolve against the
    /// directory holding the configuration file.
    pub path: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            path: "api.yaml".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total time for an inbound request/response in seconds.
    pub request_secs: u64,

    /// Deadline for a single outbound integration call in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
            upstream_secs: 29,
        }
    }
}

/// What to do when a caller supplies a header or query parameter that an
/// integration injects as a literal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderConflictPolicy {
    /// The injected value silently replaces the caller's.
    #[default]
    Override,
    /// The request is rejected with 400.
    Reject,
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum buffered request body size in bytes.
    pub max_body_size: usize,

    /// Policy for caller values colliding with injected literals.
    pub header_conflict: HeaderConflictPolicy,

    /// Accepted clock skew for signed requests in seconds.
    pub signature_max_skew_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 10 * 1024 * 1024, // 10MB
            header_conflict: HeaderConflictPolicy::Override,
            signature_max_skew_secs: 300,
        }
    }
}

/// Credentials known to the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CredentialsConfig {
    pub api_keys: Vec<ApiKeyConfig>,
    pub signing_keys: Vec<SigningKeyConfig>,
}

/// A single API key. Exactly one of `value` / `value_env` must be set.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiKeyConfig {
    /// Name recorded in audit logs.
    pub name: String,
    pub value: Option<String>,
    /// Environment variable holding the key.
    pub value_env: Option<String>,
}

impl ApiKeyConfig {
    /// Resolve the key material, reading the environment if needed.
    pub fn resolve(&self) -> Option<String> {
        resolve_secret(self.value.as_deref(), self.value_env.as_deref())
    }
}

/// A signing credential for the signed-request scheme.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SigningKeyConfig {
    pub access_key_id: String,
    pub secret: Option<String>,
    /// Environment variable holding the secret.
    pub secret_env: Option<String>,
}

impl SigningKeyConfig {
    /// Resolve the secret, reading the environment if needed.
    pub fn resolve(&self) -> Option<String> {
        resolve_secret(self.secret.as_deref(), self.secret_env.as_deref())
    }
}

fn resolve_secret(inline: Option<&str>, env: Option<&str>) -> Option<String> {
    match (inline, env) {
        (Some(value), _) => Some(value.to_string()),
        (None, Some(var)) => std::env::var(var).ok().filter(|v| !v.is_empty()),
        (None, None) => None,
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human readable or JSON lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.timeouts.upstream_secs, 29);
        assert_eq!(config.security.header_conflict, HeaderConflictPolicy::Override);
        assert!(config.variables.is_empty());
    }

    #[test]
    fn test_parses_credentials_and_variables() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [security]
            header_conflict = "reject"

            [variables]
            ledger_app_api_url = "https://ledger.example.com/"

            [[credentials.api_keys]]
            name = "tally"
            value = "k-123"

            [[credentials.signing_keys]]
            access_key_id = "choc"
            secret = "s3cret"
            "#,
        )
        .unwrap();

        assert_eq!(config.security.header_conflict, HeaderConflictPolicy::Reject);
        assert_eq!(config.variables["ledger_app_api_url"], "https://ledger.example.com/");
        assert_eq!(config.credentials.api_keys[0].resolve().as_deref(), Some("k-123"));
        assert_eq!(config.credentials.signing_keys[0].resolve().as_deref(), Some("s3cret"));
    }
}
