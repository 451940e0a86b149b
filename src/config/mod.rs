//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → document.path → crate::document (route table compilation)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{document_path, load_config, parse_config, ConfigError};
pub use schema::{
    ApiKeyConfig, CredentialsConfig, DocumentConfig, GatewayConfig, HeaderConflictPolicy,
    ListenerConfig, LogFormat, ObservabilityConfig, SecurityConfig, SigningKeyConfig,
    TimeoutConfig,
};
