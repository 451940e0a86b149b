//! Credential storage.
//!
//! API keys and signing secrets are loaded from configuration (or the
//! environment variables it names) once at startup.

use dashmap::DashMap;

use crate::config::CredentialsConfig;

/// Lookup of caller credentials. Injected into the enforcer so tests and
/// embedders can supply their own source.
pub trait CredentialStore: Send + Sync {
    /// Name of the API key whose value is `value`, if any.
    fn api_key_name(&self, value: &str) -> Option<String>;

    /// Secret for a signing access key id.
    fn signing_secret(&self, access_key_id: &str) -> Option<String>;
}

/// Store backed by concurrent maps.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    api_keys: DashMap<String, String>,
    signing_keys: DashMap<String, String>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `[credentials]` section. Entries whose material cannot
    /// be resolved are skipped with a warning.
    pub fn from_config(config: &CredentialsConfig) -> Self {
        let store = Self::new();
        for key in &config.api_keys {
            match key.resolve() {
                Some(value) => store.insert_api_key(&key.name, &value),
                None => tracing::warn!(name = %key.name, "API key has no value, skipping"),
            }
        }
        for key in &config.signing_keys {
            match key.resolve() {
                Some(secret) => store.insert_signing_key(&key.access_key_id, &secret),
                None => tracing::warn!(
                    access_key_id = %key.access_key_id,
                    "Signing key has no secret, skipping"
                ),
            }
        }
        tracing::debug!(
            api_keys = store.api_keys.len(),
            signing_keys = store.signing_keys.len(),
            "Credential store loaded"
        );
        store
    }

    pub fn insert_api_key(&self, name: &str, value: &str) {
        self.api_keys.insert(value.to_string(), name.to_string());
    }

    pub fn insert_signing_key(&self, access_key_id: &str, secret: &str) {
        self.signing_keys
            .insert(access_key_id.to_string(), secret.to_string());
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn api_key_name(&self, value: &str) -> Option<String> {
        self.api_keys.get(value).map(|entry| entry.value().clone())
    }

    fn signing_secret(&self, access_key_id: &str) -> Option<String> {
        self.signing_keys
            .get(access_key_id)
            .map(|entry| entry.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKeyConfig, SigningKeyConfig};

    #[test]
    fn test_loads_inline_credentials() {
        let config = CredentialsConfig {
            api_keys: vec![
                ApiKeyConfig {
                    name: "partner".into(),
                    value: Some("k-123".into()),
                    value_env: None,
                },
                ApiKeyConfig {
                    name: "unset".into(),
                    value: None,
                    value_env: Some("GATEWAY_TEST_SURELY_UNSET_VARIABLE".into()),
                },
            ],
            signing_keys: vec![SigningKeyConfig {
                access_key_id: "AKID".into(),
                secret: Some("s3cr3t".into()),
                secret_env: None,
            }],
        };

        let store = InMemoryCredentialStore::from_config(&config);
        assert_eq!(store.api_key_name("k-123").as_deref(), Some("partner"));
        assert_eq!(store.api_key_name("partner"), None);
        assert_eq!(store.signing_secret("AKID").as_deref(), Some("s3cr3t"));
        assert_eq!(store.signing_secret("other"), None);
    }
}
