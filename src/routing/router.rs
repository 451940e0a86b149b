//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up matching route for request
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) template scan (acceptable for typical route counts)
//! - Explicit NotFound rather than silent default
//! - Ties at equal specificity go to the first declared route

use axum::http::Method;
use std::sync::Arc;
use thiserror::Error;

use crate::routing::route::Route;
use crate::routing::template::Captures;

/// No route accepts the request.
#[derive(Debug, Clone, Error)]
#[error("no route matches {method} {path}")]
pub struct NotFound {
    pub method: Method,
    pub path: String,
}

/// A route together with the captures produced by matching it.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    pub route: Arc<Route>,
    pub captures: Captures,
}

/// Immutable table of compiled routes, in declaration order.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self {
            routes: routes.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }

    /// Find the most specific route for `method` and `path`.
    pub fn resolve(&self, method: &Method, path: &str) -> Result<ResolvedRoute, NotFound> {
        let mut best: Option<((Vec<u8>, u8), &Arc<Route>, Captures)> = None;

        for route in &self.routes {
            if !route.method.accepts(method) {
                continue;
            }
            let Some(captures) = route.template.matches(path) else {
                continue;
            };
            let key = (route.template.specificity(), route.method.rank());
            let better = match &best {
                Some((best_key, _, _)) => key > *best_key,
                None => true,
            };
            if better {
                best = Some((key, route, captures));
            }
        }

        match best {
            Some((_, route, captures)) => {
                tracing::trace!(route = %route.id, path = %path, "Route matched");
                Ok(ResolvedRoute {
                    route: Arc::clone(route),
                    captures,
                })
            }
            None => Err(NotFound {
                method: method.clone(),
                path: path.to_string(),
            }),
        }
    }
}
