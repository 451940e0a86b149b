//! Compiled route definition.

use axum::http::Method;
use std::collections::BTreeSet;

use crate::gateway::validator::RequestValidator;
use crate::integration::Integration;
use crate::response::ResponseRules;
use crate::routing::template::PathTemplate;
use crate::security::SecurityScheme;

/// Which request methods a route accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodMatch {
    Any,
    Exact(Method),
}

impl MethodMatch {
    /// Parse a document method key (`get`, `post`, ..., `any`).
    pub fn parse(key: &str) -> Option<Self> {
        if key.eq_ignore_ascii_case("any") || key == "x-gateway-any-method" {
            return Some(MethodMatch::Any);
        }
        let upper = key.to_ascii_uppercase();
        let method = match upper.as_str() {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "PATCH" => Method::PATCH,
            "HEAD" => Method::HEAD,
            "OPTIONS" => Method::OPTIONS,
            _ => return None,
        };
        Some(MethodMatch::Exact(method))
    }

    pub fn accepts(&self, method: &Method) -> bool {
        match self {
            MethodMatch::Any => true,
            MethodMatch::Exact(expected) => expected == method,
        }
    }

    /// A concrete method outranks `ANY` on the same template.
    pub fn rank(&self) -> u8 {
        match self {
            MethodMatch::Any => 0,
            MethodMatch::Exact(_) => 1,
        }
    }
}

impl std::fmt::Display for MethodMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodMatch::Any => f.write_str("ANY"),
            MethodMatch::Exact(method) => write!(f, "{}", method),
        }
    }
}

/// A single (path template, method) entry with everything needed to serve it.
#[derive(Debug, Clone)]
pub struct Route {
    /// `"<METHOD> <template>"`, used in logs, metrics and errors.
    pub id: String,
    pub template: PathTemplate,
    pub method: MethodMatch,
    pub summary: Option<String>,
    /// Informational only; never consulted for routing or dispatch.
    pub tags: BTreeSet<String>,
    pub validator: Option<RequestValidator>,
    pub security: Option<SecurityScheme>,
    pub integration: Integration,
    pub responses: ResponseRules,
}

impl Route {
    pub fn requires_validation(&self) -> bool {
        self.validator.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_method_keys() {
        assert_eq!(MethodMatch::parse("get"), Some(MethodMatch::Exact(Method::GET)));
        assert_eq!(MethodMatch::parse("x-gateway-any-method"), Some(MethodMatch::Any));
        assert_eq!(MethodMatch::parse("ANY"), Some(MethodMatch::Any));
        assert_eq!(MethodMatch::parse("summary"), None);
    }

    #[test]
    fn test_any_accepts_every_method() {
        assert!(MethodMatch::Any.accepts(&Method::DELETE));
        assert!(!MethodMatch::Exact(Method::GET).accepts(&Method::POST));
        assert!(MethodMatch::Exact(Method::GET).rank() > MethodMatch::Any.rank());
    }
}
