//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route lookup)
//!     → template.rs (segment matching, captures)
//!     → Return: ResolvedRoute or NotFound
//!
//! Route Compilation (at startup):
//!     API document
//!     → crate::document::compile
//!     → Vec<Route> in declaration order
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same input always matches same route
//! - Most specific template wins, declaration order breaks ties

pub mod route;
pub mod router;
pub mod template;

pub use route::{MethodMatch, Route};
pub use router::{NotFound, ResolvedRoute, RouteTable};
pub use template::{Captures, PathTemplate, Segment, TemplateError};
