//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Load and compile the API document with the configured variables
//! - Assemble the gateway engine from its subsystems
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{document_path, load_config, ConfigError, GatewayConfig};
use crate::document::{load_document, CompiledApi, DocumentError};
use crate::gateway::GatewayEngine;
use crate::integration::{DispatchError, Dispatcher, HttpUpstream, Upstream};
use crate::routing::{Route, RouteTable};
use crate::security::{InMemoryCredentialStore, SecurityEnforcer};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Document(#[from] DocumentError),

    #[error("failed to build upstream client: {0}")]
    Upstream(#[from] DispatchError),
}

/// Configuration plus the compiled document it points at.
#[derive(Debug)]
pub struct Loaded {
    pub config: GatewayConfig,
    pub api: CompiledApi,
}

/// Load `config_path` and the API document it references.
pub fn load(config_path: &Path) -> Result<Loaded, StartupError> {
    let config = load_config(config_path)?;
    tracing::info!(
        path = %config_path.display(),
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let document = document_path(config_path, &config);
    let api = load_document(&document, &config.variables)?;
    Ok(Loaded { config, api })
}

/// Build the engine with the production HTTP transport.
pub fn build_engine(config: &GatewayConfig, routes: Vec<Route>) -> Result<GatewayEngine, StartupError> {
    let upstream = HttpUpstream::new(
        Duration::from_secs(config.timeouts.connect_secs),
        Duration::from_secs(config.timeouts.upstream_secs),
    )?;
    Ok(build_engine_with(config, routes, Arc::new(upstream)))
}

/// Build the engine over an arbitrary transport.
pub fn build_engine_with(
    config: &GatewayConfig,
    routes: Vec<Route>,
    upstream: Arc<dyn Upstream>,
) -> GatewayEngine {
    let store = InMemoryCredentialStore::from_config(&config.credentials);
    let security = SecurityEnforcer::new(
        Arc::new(store),
        Duration::from_secs(config.security.signature_max_skew_secs),
    );
    let dispatcher = Dispatcher::new(
        upstream,
        Duration::from_secs(config.timeouts.upstream_secs),
        config.security.header_conflict,
    );
    let table = RouteTable::new(routes);
    tracing::info!(routes = table.len(), "Route table ready");

    GatewayEngine::new(Arc::new(table), security, dispatcher)
}
