//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Matched route:
//!     → no scheme: pass through
//!     → ApiKey: header value → store.rs lookup
//!     → SignedRequest: signing.rs canonical request → HMAC verify → skew check
//!     → audit event (target "audit") for every decision
//! ```
//!
//! # Design Decisions
//! - Fail closed: any missing, malformed or unknown credential is Unauthorized
//! - Runs before validation and mapping, so rejected callers never reach a backend
//! - Constant-time signature comparison
//! - Credentials that authorized a call are never forwarded upstream

pub mod headers;
pub mod signing;
pub mod store;

use axum::http::header::{self, HeaderName};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::gateway::request::GatewayRequest;
use crate::routing::Route;
use crate::security::signing::{SignatureHeader, DATE_HEADER};

pub use store::{CredentialStore, InMemoryCredentialStore};

/// Authentication requirement declared by a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityScheme {
    /// `GW-HMAC-SHA256` signed requests.
    SignedRequest { name: String },
    /// A static key carried in `header`.
    ApiKey { name: String, header: HeaderName },
}

impl SecurityScheme {
    /// Scheme name as declared in the document.
    pub fn name(&self) -> &str {
        match self {
            SecurityScheme::SignedRequest { name } | SecurityScheme::ApiKey { name, .. } => name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SecurityScheme::SignedRequest { .. } => "signed_request",
            SecurityScheme::ApiKey { .. } => "api_key",
        }
    }

    /// Headers carrying this scheme's credentials.
    pub fn credential_headers(&self) -> Vec<HeaderName> {
        match self {
            SecurityScheme::SignedRequest { .. } => {
                vec![header::AUTHORIZATION, HeaderName::from_static(DATE_HEADER)]
            }
            SecurityScheme::ApiKey { header, .. } => vec![header.clone()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing credential header `{0}`")]
    MissingCredential(String),

    #[error("unknown API key")]
    UnknownApiKey,

    #[error("unknown access key id `{0}`")]
    UnknownAccessKey(String),

    #[error("malformed authorization header")]
    MalformedAuthorization(String),

    #[error("malformed request timestamp `{0}`")]
    MalformedDate(String),

    #[error("signed header `{0}` is missing from the request")]
    MissingSignedHeader(String),

    #[error("request timestamp is not among the signed headers")]
    DateNotSigned,

    #[error("request timestamp is outside the allowed skew of {0}s")]
    StaleTimestamp(u64),

    #[error("signature mismatch")]
    InvalidSignature,
}

/// Successful authorization outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Authorized {
    /// Scheme that authorized the request; `None` for open routes.
    pub scheme: Option<String>,
    /// API key name or signing access key id.
    pub principal: Option<String>,
}

/// Checks inbound credentials against a route's scheme.
#[derive(Clone)]
pub struct SecurityEnforcer {
    store: Arc<dyn CredentialStore>,
    max_skew: Duration,
}

impl SecurityEnforcer {
    pub fn new(store: Arc<dyn CredentialStore>, max_skew: Duration) -> Self {
        Self { store, max_skew }
    }

    pub fn authorize(
        &self,
        route: &Route,
        request: &GatewayRequest,
    ) -> Result<Authorized, AuthError> {
        self.authorize_at(route, request, Utc::now())
    }

    /// Same as [`authorize`](Self::authorize) with an explicit clock.
    pub fn authorize_at(
        &self,
        route: &Route,
        request: &GatewayRequest,
        now: DateTime<Utc>,
    ) -> Result<Authorized, AuthError> {
        let Some(scheme) = &route.security else {
            return Ok(Authorized::default());
        };

        let result = match scheme {
            SecurityScheme::ApiKey { header, .. } => self.check_api_key(header, request),
            SecurityScheme::SignedRequest { .. } => self.check_signature(request, now),
        }
        .map(|principal| Authorized {
            scheme: Some(scheme.name().to_string()),
            principal: Some(principal),
        });

        match &result {
            Ok(authorized) => tracing::info!(
                target: "audit",
                route = %route.id,
                scheme = %scheme.name(),
                principal = ?authorized.principal,
                request_id = ?request.request_id(),
                "Request authorized"
            ),
            Err(err) => tracing::warn!(
                target: "audit",
                route = %route.id,
                scheme = %scheme.name(),
                reason = %err,
                request_id = ?request.request_id(),
                "Request denied"
            ),
        }

        result
    }

    fn check_api_key(&self, header: &HeaderName, request: &GatewayRequest) -> Result<String, AuthError> {
        let value = request
            .headers
            .get(header)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AuthError::MissingCredential(header.to_string()))?;

        self.store.api_key_name(value).ok_or(AuthError::UnknownApiKey)
    }

    fn check_signature(&self, request: &GatewayRequest, now: DateTime<Utc>) -> Result<String, AuthError> {
        let authorization = request
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AuthError::MissingCredential(header::AUTHORIZATION.to_string()))?;
        let parsed = SignatureHeader::parse(authorization)?;

        if !parsed.signed_headers.iter().any(|h| h == DATE_HEADER) {
            return Err(AuthError::DateNotSigned);
        }
        let timestamp = request
            .header(DATE_HEADER)
            .ok_or_else(|| AuthError::MissingCredential(DATE_HEADER.to_string()))?;
        let signed_at = signing::parse_timestamp(timestamp.trim())?;
        let skew = (now - signed_at).num_seconds().unsigned_abs();
        if skew > self.max_skew.as_secs() {
            return Err(AuthError::StaleTimestamp(self.max_skew.as_secs()));
        }

        let secret = self
            .store
            .signing_secret(&parsed.credential)
            .ok_or_else(|| AuthError::UnknownAccessKey(parsed.credential.clone()))?;

        let canonical = signing::canonical_request(
            &request.method,
            &request.path,
            request.raw_query.as_deref(),
            &request.headers,
            &parsed.signed_headers,
            &request.body,
        )?;
        let to_sign = signing::string_to_sign(timestamp.trim(), &canonical);
        if !signing::verify(&secret, &to_sign, &parsed.signature) {
            return Err(AuthError::InvalidSignature);
        }

        Ok(parsed.credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::{Integration, MockResponse};
    use crate::response::ResponseRules;
    use crate::routing::{MethodMatch, PathTemplate};
    use axum::body::Bytes;
    use axum::http::{HeaderMap, Method, StatusCode, Uri};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn enforcer() -> SecurityEnforcer {
        let store = InMemoryCredentialStore::new();
        store.insert_api_key("partner", "k-123");
        store.insert_signing_key("AKID", "s3cr3t");
        SecurityEnforcer::new(Arc::new(store), Duration::from_secs(300))
    }

    fn route(security: Option<SecurityScheme>) -> Route {
        Route {
            id: "GET /choc/case/details/{id}".into(),
            template: PathTemplate::parse("/choc/case/details/{id}").unwrap(),
            method: MethodMatch::Exact(Method::GET),
            summary: None,
            tags: Default::default(),
            validator: None,
            security,
            integration: Integration::Mock(MockResponse::new(StatusCode::OK)),
            responses: ResponseRules::default(),
        }
    }

    fn api_key_scheme() -> SecurityScheme {
        SecurityScheme::ApiKey {
            name: "apiKeyAuth".into(),
            header: HeaderName::from_static("x-api-key"),
        }
    }

    fn signed_scheme() -> SecurityScheme {
        SecurityScheme::SignedRequest { name: "sigv4".into() }
    }

    fn request(headers: HeaderMap) -> GatewayRequest {
        let uri: Uri = "/choc/case/details/7?v=1".parse().unwrap();
        GatewayRequest::new(Method::GET, &uri, headers, Bytes::new())
    }

    fn signed_headers(secret: &str, at: DateTime<Utc>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("host", "gw.example.com".parse().unwrap());
        signing::sign_request(
            "AKID",
            secret,
            &Method::GET,
            "/choc/case/details/7",
            Some("v=1"),
            &mut headers,
            b"",
            at,
        )
        .unwrap();
        headers
    }

    #[test]
    fn test_open_routes_bypass_checks() {
        let authorized = enforcer()
            .authorize(&route(None), &request(HeaderMap::new()))
            .unwrap();
        assert_eq!(authorized, Authorized::default());
    }

    #[test]
    fn test_api_key_must_be_known() {
        let enforcer = enforcer();
        let route = route(Some(api_key_scheme()));

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "k-123".parse().unwrap());
        let authorized = enforcer.authorize(&route, &request(headers)).unwrap();
        assert_eq!(authorized.principal.as_deref(), Some("partner"));
        assert_eq!(authorized.scheme.as_deref(), Some("apiKeyAuth"));

        let mut wrong = HeaderMap::new();
        wrong.insert("x-api-key", "nope".parse().unwrap());
        assert_eq!(
            enforcer.authorize(&route, &request(wrong)),
            Err(AuthError::UnknownApiKey)
        );
        assert!(matches!(
            enforcer.authorize(&route, &request(HeaderMap::new())),
            Err(AuthError::MissingCredential(_))
        ));
    }

    #[test]
    fn test_valid_signature_is_accepted() {
        let route = route(Some(signed_scheme()));
        let headers = signed_headers("s3cr3t", now());
        let authorized = enforcer()
            .authorize_at(&route, &request(headers), now() + chrono::Duration::seconds(30))
            .unwrap();
        assert_eq!(authorized.principal.as_deref(), Some("AKID"));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let route = route(Some(signed_scheme()));
        let headers = signed_headers("not-the-secret", now());
        assert_eq!(
            enforcer().authorize_at(&route, &request(headers), now()),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_stale_timestamp_is_rejected() {
        let route = route(Some(signed_scheme()));
        let headers = signed_headers("s3cr3t", now());
        assert_eq!(
            enforcer().authorize_at(&route, &request(headers), now() + chrono::Duration::seconds(301)),
            Err(AuthError::StaleTimestamp(300))
        );
    }

    #[test]
    fn test_tampered_query_is_rejected() {
        let route = route(Some(signed_scheme()));
        let headers = signed_headers("s3cr3t", now());
        let uri: Uri = "/choc/case/details/7?v=2".parse().unwrap();
        let tampered = GatewayRequest::new(Method::GET, &uri, headers, Bytes::new());
        assert_eq!(
            enforcer().authorize_at(&route, &tampered, now()),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_credential_headers_per_scheme() {
        assert_eq!(api_key_scheme().credential_headers(), vec![HeaderName::from_static("x-api-key")]);
        assert_eq!(signed_scheme().credential_headers().len(), 2);
    }
}
