//! Response translation subsystem.
//!
//! # Data Flow
//! ```text
//! BackendResponse (status, headers, body, failure)
//!     → ResponseRules::select (declared patterns in order, then default)
//!     → translator.rs (public status, header expressions, content type)
//!     → PublicResponse or Unmatched
//! ```
//!
//! # Design Decisions
//! - Patterns are compiled into a closed predicate set at load time; no regex
//!   engine runs per request
//! - First match wins, the default rule is always consulted last

pub mod translator;

use axum::http::header::{HeaderName, HeaderValue};
use axum::http::StatusCode;
use thiserror::Error;

use crate::integration::BackendResponse;

pub use translator::{translate, PublicResponse, Unmatched};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("unsupported response pattern `{0}`")]
    Unsupported(String),

    #[error("unsupported response header expression `{0}`")]
    HeaderExpression(String),
}

/// Condition a backend response must satisfy for a rule to apply.
///
/// Each variant matches exactly what the regex it was parsed from matches
/// against the three-digit status text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `".*403.*"`, `"403"`
    ExactStatus(u16),
    /// `"50.*"` → `"50"`, `"5xx"` → `"5"`
    StatusClass(String),
    /// `".*50.*"` → `"50"`
    StatusContains(String),
    /// `".*04"` → `"04"`
    StatusSuffix(String),
    /// Plain words, matched against the dispatch failure message.
    MessageContains(String),
    Default,
}

impl Predicate {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let unsupported = || PatternError::Unsupported(pattern.to_string());
        let trimmed = pattern.trim();
        if trimmed == "default" {
            return Ok(Predicate::Default);
        }

        let leading = trimmed.strip_prefix(".*");
        let open_start = leading.is_some();
        let core = leading.unwrap_or(trimmed);
        let trailing = core.strip_suffix(".*");
        let open_end = trailing.is_some();
        let core = trailing.unwrap_or(core);
        if core.is_empty() {
            return Err(unsupported());
        }

        let digits = core.bytes().take_while(u8::is_ascii_digit).count();
        let wildcards = core[digits..].bytes().filter(|b| *b == b'x' || *b == b'X').count();

        if digits == core.len() {
            return match (digits, open_start, open_end) {
                (3, _, _) => core
                    .parse::<u16>()
                    .ok()
                    .filter(|code| (100..=599).contains(code))
                    .map(Predicate::ExactStatus)
                    .ok_or_else(unsupported),
                (1 | 2, true, true) => Ok(Predicate::StatusContains(core.to_string())),
                (1 | 2, false, true) => Ok(Predicate::StatusClass(core.to_string())),
                (1 | 2, true, false) => Ok(Predicate::StatusSuffix(core.to_string())),
                // A bare one or two digit pattern can never match a full status.
                _ => Err(unsupported()),
            };
        }
        if digits > 0 {
            return if digits + wildcards == core.len() && core.len() == 3 && !open_start && !open_end {
                Ok(Predicate::StatusClass(core[..digits].to_string()))
            } else {
                Err(unsupported())
            };
        }

        let is_words = core
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | ':'));
        if is_words {
            Ok(Predicate::MessageContains(core.to_string()))
        } else {
            Err(unsupported())
        }
    }

    pub fn matches(&self, backend: &BackendResponse) -> bool {
        match self {
            Predicate::ExactStatus(code) => backend.status.as_u16() == *code,
            Predicate::StatusClass(prefix) => backend.status.as_str().starts_with(prefix.as_str()),
            Predicate::StatusContains(digits) => backend.status.as_str().contains(digits.as_str()),
            Predicate::StatusSuffix(suffix) => backend.status.as_str().ends_with(suffix.as_str()),
            Predicate::MessageContains(text) => backend
                .failure
                .as_deref()
                .is_some_and(|message| message.contains(text.as_str())),
            Predicate::Default => true,
        }
    }
}

/// Value of a public response header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderExpr {
    /// `'*'`
    Literal(HeaderValue),
    /// `integration.response.header.<Name>`
    BackendHeader(HeaderName),
}

impl HeaderExpr {
    pub fn parse(expr: &str) -> Result<Self, PatternError> {
        let invalid = || PatternError::HeaderExpression(expr.to_string());
        let expr = expr.trim();
        if let Some(quoted) = expr.strip_prefix('\'') {
            let literal = quoted.strip_suffix('\'').ok_or_else(invalid)?;
            return HeaderValue::from_str(literal)
                .map(HeaderExpr::Literal)
                .map_err(|_| invalid());
        }
        let name = expr
            .strip_prefix("integration.response.header.")
            .filter(|name| !name.is_empty())
            .ok_or_else(invalid)?;
        HeaderName::from_bytes(name.as_bytes())
            .map(HeaderExpr::BackendHeader)
            .map_err(|_| invalid())
    }
}

/// What the caller receives when a rule applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSpec {
    pub status: StatusCode,
    pub headers: Vec<(HeaderName, HeaderExpr)>,
    /// Documentation only; bodies are never validated against it.
    pub schema_ref: Option<String>,
    pub content_type: Option<String>,
    pub description: Option<String>,
}

impl ResponseSpec {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            schema_ref: None,
            content_type: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRule {
    /// Pattern as written in the document.
    pub pattern: String,
    pub predicate: Predicate,
    pub spec: ResponseSpec,
}

/// Ordered response rules of one integration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseRules {
    rules: Vec<ResponseRule>,
    default: Option<ResponseSpec>,
}

/// Rule chosen for a backend response.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub spec: &'a ResponseSpec,
    pub is_default: bool,
}

impl ResponseRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. A `Default` predicate sets (or replaces) the fallback.
    pub fn push(&mut self, pattern: &str, predicate: Predicate, spec: ResponseSpec) {
        if predicate == Predicate::Default {
            self.default = Some(spec);
        } else {
            self.rules.push(ResponseRule {
                pattern: pattern.to_string(),
                predicate,
                spec,
            });
        }
    }

    pub fn rules(&self) -> &[ResponseRule] {
        &self.rules
    }

    pub fn default_spec(&self) -> Option<&ResponseSpec> {
        self.default.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.default.is_none()
    }

    /// Public status codes these rules can produce.
    pub fn statuses(&self) -> impl Iterator<Item = StatusCode> + '_ {
        self.rules
            .iter()
            .map(|rule| rule.spec.status)
            .chain(self.default.iter().map(|spec| spec.status))
    }

    pub fn select(&self, backend: &BackendResponse) -> Option<Selection<'_>> {
        self.rules
            .iter()
            .find(|rule| rule.predicate.matches(backend))
            .map(|rule| Selection {
                spec: &rule.spec,
                is_default: false,
            })
            .or_else(|| {
                self.default.as_ref().map(|spec| Selection {
                    spec,
                    is_default: true,
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::HeaderMap;

    fn backend(status: u16) -> BackendResponse {
        BackendResponse::new(StatusCode::from_u16(status).unwrap(), HeaderMap::new(), Bytes::new())
    }

    #[test]
    fn test_parse_patterns() {
        assert_eq!(Predicate::parse("default"), Ok(Predicate::Default));
        assert_eq!(Predicate::parse(".*403.*"), Ok(Predicate::ExactStatus(403)));
        assert_eq!(Predicate::parse("204"), Ok(Predicate::ExactStatus(204)));
        assert_eq!(Predicate::parse(".*50.*"), Ok(Predicate::StatusContains("50".into())));
        assert_eq!(Predicate::parse("50.*"), Ok(Predicate::StatusClass("50".into())));
        assert_eq!(Predicate::parse(".*04"), Ok(Predicate::StatusSuffix("04".into())));
        assert_eq!(Predicate::parse("5xx"), Ok(Predicate::StatusClass("5".into())));
        assert_eq!(Predicate::parse("40X"), Ok(Predicate::StatusClass("40".into())));
        assert_eq!(
            Predicate::parse(".*Not Found.*"),
            Ok(Predicate::MessageContains("Not Found".into()))
        );
    }

    #[test]
    fn test_reject_unsupported_patterns() {
        for pattern in [".*", "(4|5)\\d\\d", "999", "1234", "5xxx", "50 errors", "50", ".*5xx.*"] {
            assert!(Predicate::parse(pattern).is_err(), "{pattern}");
        }
    }

    #[test]
    fn test_first_match_wins() {
        let mut rules = ResponseRules::new();
        rules.push(".*403.*", Predicate::parse(".*403.*").unwrap(), ResponseSpec::new(StatusCode::FORBIDDEN));
        rules.push(".*50.*", Predicate::parse(".*50.*").unwrap(), ResponseSpec::new(StatusCode::INTERNAL_SERVER_ERROR));
        rules.push(".*5.*", Predicate::parse(".*5.*").unwrap(), ResponseSpec::new(StatusCode::SERVICE_UNAVAILABLE));

        let selected = rules.select(&backend(500)).unwrap();
        assert_eq!(selected.spec.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!selected.is_default);
        assert!(rules.select(&backend(200)).is_none());
    }

    #[test]
    fn test_unanchored_digits_match_anywhere_in_status() {
        let predicate = Predicate::parse(".*4.*").unwrap();
        for status in [404, 504, 204] {
            assert!(predicate.matches(&backend(status)), "{status}");
        }
        assert!(!predicate.matches(&backend(500)));
        assert!(Predicate::parse(".*0.*").unwrap().matches(&backend(500)));
        assert!(Predicate::parse(".*04").unwrap().matches(&backend(504)));
        assert!(!Predicate::parse("50.*").unwrap().matches(&backend(450)));

        let mut rules = ResponseRules::new();
        rules.push(".*4.*", predicate, ResponseSpec::new(StatusCode::BAD_REQUEST));
        rules.push(".*50.*", Predicate::parse(".*50.*").unwrap(), ResponseSpec::new(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(rules.select(&backend(504)).unwrap().spec.status, StatusCode::BAD_REQUEST);
        assert_eq!(rules.select(&backend(502)).unwrap().spec.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_default_is_consulted_last() {
        let mut rules = ResponseRules::new();
        rules.push("default", Predicate::Default, ResponseSpec::new(StatusCode::OK));
        rules.push(".*403.*", Predicate::parse(".*403.*").unwrap(), ResponseSpec::new(StatusCode::FORBIDDEN));

        assert_eq!(rules.select(&backend(403)).unwrap().spec.status, StatusCode::FORBIDDEN);
        let fallback = rules.select(&backend(201)).unwrap();
        assert!(fallback.is_default);
        assert_eq!(fallback.spec.status, StatusCode::OK);
        assert_eq!(rules.statuses().count(), 2);
    }

    #[test]
    fn test_message_predicate_reads_failure() {
        let predicate = Predicate::parse(".*timed out.*").unwrap();
        let mut failed = backend(504);
        assert!(!predicate.matches(&failed));
        failed.failure = Some("upstream timed out".into());
        assert!(predicate.matches(&failed));
    }

    #[test]
    fn test_header_expressions() {
        assert_eq!(
            HeaderExpr::parse("'*'"),
            Ok(HeaderExpr::Literal(HeaderValue::from_static("*")))
        );
        assert_eq!(
            HeaderExpr::parse("integration.response.header.X-Trace"),
            Ok(HeaderExpr::BackendHeader(HeaderName::from_static("x-trace")))
        );
        assert!(HeaderExpr::parse("method.request.header.X").is_err());
        assert!(HeaderExpr::parse("'open").is_err());
    }
}
