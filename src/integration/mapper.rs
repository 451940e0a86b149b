//! Parameter mapping between the inbound request and an integration.
//!
//! Expressions are parsed once when the API document is compiled:
//!
//! ```text
//! integration.request.path.id      ← method.request.path.id
//! integration.request.path.events  ← method.request.querystring.type
//! integration.request.header.Authorization ← 'Zoho-authtoken ...'
//! ```
//!
//! Literals are fixed at compile time and can never be influenced by the
//! caller.

use thiserror::Error;

use crate::gateway::request::GatewayRequest;
use crate::routing::template::Captures;

/// Where an integration parameter takes its value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSource {
    PathCapture(String),
    QueryParam(String),
    Header(String),
    Literal(String),
}

/// Where a mapped value is placed on the outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamTarget {
    Path(String),
    Query(String),
    Header(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("unsupported source expression `{0}`")]
    UnsupportedSource(String),

    #[error("unsupported target expression `{0}`")]
    UnsupportedTarget(String),
}

impl ParamSource {
    /// Parse `method.request.{path|querystring|header}.<name>` or `'literal'`.
    pub fn parse(expr: &str) -> Result<Self, ExpressionError> {
        let expr = expr.trim();
        if let Some(quoted) = expr.strip_prefix('\'') {
            return quoted
                .strip_suffix('\'')
                .map(|value| ParamSource::Literal(value.to_string()))
                .ok_or_else(|| ExpressionError::UnsupportedSource(expr.to_string()));
        }
        let (location, name) = split_location(expr, "method.request.")
            .ok_or_else(|| ExpressionError::UnsupportedSource(expr.to_string()))?;
        match location {
            "path" => Ok(ParamSource::PathCapture(name.to_string())),
            "querystring" => Ok(ParamSource::QueryParam(name.to_string())),
            "header" => Ok(ParamSource::Header(name.to_string())),
            _ => Err(ExpressionError::UnsupportedSource(expr.to_string())),
        }
    }
}

impl ParamTarget {
    /// Parse `integration.request.{path|querystring|header}.<name>`.
    pub fn parse(expr: &str) -> Result<Self, ExpressionError> {
        let expr = expr.trim();
        let (location, name) = split_location(expr, "integration.request.")
            .ok_or_else(|| ExpressionError::UnsupportedTarget(expr.to_string()))?;
        match location {
            "path" => Ok(ParamTarget::Path(name.to_string())),
            "querystring" => Ok(ParamTarget::Query(name.to_string())),
            "header" => Ok(ParamTarget::Header(name.to_string())),
            _ => Err(ExpressionError::UnsupportedTarget(expr.to_string())),
        }
    }
}

fn split_location<'a>(expr: &'a str, prefix: &str) -> Option<(&'a str, &'a str)> {
    let rest = expr.strip_prefix(prefix)?;
    let (location, name) = rest.split_once('.')?;
    (!name.is_empty()).then_some((location, name))
}

/// One `target ← source` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamBinding {
    pub target: ParamTarget,
    pub source: ParamSource,
}

/// The ordered bindings declared by an integration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamMap(Vec<ParamBinding>);

impl ParamMap {
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn new(bindings: Vec<ParamBinding>) -> Self {
        Self(bindings)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParamBinding> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Is there a binding placing a value into path token `name`?
    pub fn binds_path(&self, name: &str) -> bool {
        self.0
            .iter()
            .any(|b| matches!(&b.target, ParamTarget::Path(n) if n == name))
    }

    /// Header and query names that receive a compile-time literal.
    pub fn injected_literals(&self) -> impl Iterator<Item = &ParamTarget> {
        self.0
            .iter()
            .filter(|b| matches!(b.source, ParamSource::Literal(_)))
            .map(|b| &b.target)
    }
}

/// Values produced by mapping, grouped by outbound location.
///
/// Path values are URL-ready: captured path segments are forwarded as
/// received, everything else is percent-encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedParams {
    pub path: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl MappedParams {
    pub fn path_value(&self, name: &str) -> Option<&str> {
        self.path
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// The matched route cannot have produced this capture. Always a
    /// configuration defect, never the caller's fault.
    #[error("path capture `{0}` was not produced by the route match")]
    MissingCapture(String),

    #[error("query parameter `{0}` is required by the integration")]
    MissingQuery(String),

    #[error("header `{0}` is required by the integration")]
    MissingHeader(String),
}

impl MappingError {
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, MappingError::MissingCapture(_))
    }
}

/// Resolve every binding of `params` against the inbound request.
pub fn map_parameters(
    params: &ParamMap,
    captures: &Captures,
    request: &GatewayRequest,
) -> Result<MappedParams, MappingError> {
    let mut mapped = MappedParams::default();

    for binding in params.iter() {
        let (value, url_ready) = match &binding.source {
            ParamSource::PathCapture(name) => {
                let value = captures
                    .get(name)
                    .ok_or_else(|| MappingError::MissingCapture(name.clone()))?;
                (value.to_string(), true)
            }
            ParamSource::QueryParam(name) => {
                let value = request
                    .query_param(name)
                    .ok_or_else(|| MappingError::MissingQuery(name.clone()))?;
                (value.to_string(), false)
            }
            ParamSource::Header(name) => {
                let value = request
                    .header(name)
                    .ok_or_else(|| MappingError::MissingHeader(name.clone()))?;
                (value.to_string(), false)
            }
            ParamSource::Literal(value) => (value.clone(), false),
        };

        match &binding.target {
            ParamTarget::Path(name) => {
                let value = if url_ready {
                    value
                } else {
                    encode_path_segment(&value)
                };
                mapped.path.push((name.clone(), value));
            }
            ParamTarget::Query(name) => mapped.query.push((name.clone(), value)),
            ParamTarget::Header(name) => mapped.headers.push((name.clone(), value)),
        }
    }

    Ok(mapped)
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
pub fn encode_path_segment(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::template::PathTemplate;
    use axum::http::{HeaderMap, Method, Uri};

    fn request(uri: &str) -> GatewayRequest {
        let uri: Uri = uri.parse().unwrap();
        GatewayRequest::new(Method::POST, &uri, HeaderMap::new(), Default::default())
    }

    fn binding(target: &str, source: &str) -> ParamBinding {
        ParamBinding {
            target: ParamTarget::parse(target).unwrap(),
            source: ParamSource::parse(source).unwrap(),
        }
    }

    #[test]
    fn test_parses_expressions() {
        assert_eq!(
            ParamSource::parse("method.request.querystring.type"),
            Ok(ParamSource::QueryParam("type".into()))
        );
        assert_eq!(
            ParamSource::parse("'Zoho-authtoken abc'"),
            Ok(ParamSource::Literal("Zoho-authtoken abc".into()))
        );
        assert_eq!(
            ParamTarget::parse("integration.request.header.Authorization"),
            Ok(ParamTarget::Header("Authorization".into()))
        );
        assert!(ParamSource::parse("method.request.body.x").is_err());
        assert!(ParamSource::parse("'unterminated").is_err());
        assert!(ParamTarget::parse("integration.request.path.").is_err());
    }

    #[test]
    fn test_maps_query_parameters_without_path_captures() {
        let params = ParamMap::new(vec![
            binding("integration.request.path.events", "method.request.querystring.type"),
            binding("integration.request.path.id", "method.request.querystring.id"),
        ]);
        let request = request("/inventory/events?type=customers&id=00001");

        let mapped = map_parameters(&params, &Captures::default(), &request).unwrap();
        assert_eq!(mapped.path_value("events"), Some("customers"));
        assert_eq!(mapped.path_value("id"), Some("00001"));
    }

    #[test]
    fn test_path_captures_pass_through_and_other_values_are_encoded() {
        let template = PathTemplate::parse("/items/{id}").unwrap();
        let captures = template.matches("/items/a%20b").unwrap();
        let params = ParamMap::new(vec![
            binding("integration.request.path.id", "method.request.path.id"),
            binding("integration.request.path.kind", "method.request.querystring.kind"),
        ]);
        let request = request("/items/a%20b?kind=x%2Fy");

        let mapped = map_parameters(&params, &captures, &request).unwrap();
        assert_eq!(mapped.path_value("id"), Some("a%20b"));
        assert_eq!(mapped.path_value("kind"), Some("x%2Fy"));
    }

    #[test]
    fn test_literals_never_read_request_input() {
        let params = ParamMap::new(vec![binding(
            "integration.request.querystring.authtoken",
            "'SECURE'",
        )]);
        let request = request("/inventory/x?authtoken=attacker");
        let mapped = map_parameters(&params, &Captures::default(), &request).unwrap();
        assert_eq!(mapped.query, vec![("authtoken".to_string(), "SECURE".to_string())]);
    }

    #[test]
    fn test_missing_capture_is_an_invariant_violation() {
        let params = ParamMap::new(vec![binding(
            "integration.request.path.id",
            "method.request.path.id",
        )]);
        let err = map_parameters(&params, &Captures::default(), &request("/x")).unwrap_err();
        assert!(err.is_invariant_violation());

        let params = ParamMap::new(vec![binding(
            "integration.request.path.id",
            "method.request.querystring.id",
        )]);
        let err = map_parameters(&params, &Captures::default(), &request("/x")).unwrap_err();
        assert_eq!(err, MappingError::MissingQuery("id".into()));
        assert!(!err.is_invariant_violation());
    }

    #[test]
    fn test_encodes_reserved_characters() {
        assert_eq!(encode_path_segment("a b/c"), "a%20b%2Fc");
        assert_eq!(encode_path_segment("00001"), "00001");
    }
}
