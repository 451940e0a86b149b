//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout, in-flight limit)
//!     → body buffered up to security.max_body_size
//!     → GatewayEngine::handle
//!     → response.rs (PublicResponse) or GatewayError JSON
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
