//! Request processing core.
//!
//! # Data Flow
//! ```text
//! GatewayRequest
//!     → RouteTable::resolve        (404 on miss)
//!     → SecurityEnforcer::authorize (401 on failure, backend never called)
//!     → RequestValidator::validate  (400 on missing parameters or body)
//!     → map_parameters              (400 on missing sources, 500 on broken routes)
//!     → Dispatcher::dispatch        (one upstream call, or mock)
//!     → translate                   (declared patterns, then default)
//!     → PublicResponse | GatewayError
//! ```

pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod request;
pub mod validator;

pub use engine::GatewayEngine;
pub use error::GatewayError;
pub use lifecycle::{RequestLifecycle, RequestState};
pub use request::{GatewayRequest, X_REQUEST_ID};
pub use validator::{ParameterLocation, RequestValidator, RequiredParameter, ValidationFailure};
