//! Declarative API gateway library.
//!
//! An API document (OpenAPI-shaped YAML or JSON with `x-gateway-*`
//! extensions) is compiled once at startup into an immutable route table.
//! Each inbound request is matched, authorized, validated, mapped onto a
//! single backend call and translated back into a public response.

pub mod config;
pub mod document;
pub mod gateway;
pub mod http;
pub mod integration;
pub mod lifecycle;
pub mod observability;
pub mod response;
pub mod routing;
pub mod security;

pub use config::schema::GatewayConfig;
pub use gateway::GatewayEngine;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
