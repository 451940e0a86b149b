//! Backend integrations.
//!
//! # Data Flow
//! ```text
//! ResolvedRoute + GatewayRequest
//!     → mapper.rs (integration.request.* ← method.request.* / literals)
//!     → uri.rs (expand {token} placeholders, fail closed)
//!     → dispatcher.rs (build outbound request, one call, bounded by timeout)
//!     → BackendResponse (raw status, headers, body)
//! ```
//!
//! # Design Decisions
//! - Exactly one outbound call per request; retries belong to an outer layer
//! - Network failures and timeouts become synthetic 5xx backend responses
//! - Mock integrations never touch the network

pub mod dispatcher;
pub mod mapper;
pub mod uri;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use url::Url;

pub use dispatcher::{DispatchError, Dispatcher, HttpUpstream, Upstream, UpstreamRequest};
pub use mapper::{map_parameters, MappedParams, MappingError, ParamMap, ParamSource, ParamTarget};
pub use uri::UriTemplate;

static NO_PARAMS: ParamMap = ParamMap::empty();

/// The backend invocation strategy bound to a route.
#[derive(Debug, Clone)]
pub enum Integration {
    /// One call to a fixed URI. `method: None` keeps the inbound method.
    FixedHttp {
        method: Option<Method>,
        uri: Url,
        params: ParamMap,
    },
    /// One call to a URI whose `{tokens}` come from mapped path parameters.
    TemplatedHttp {
        method: Option<Method>,
        uri: UriTemplate,
        params: ParamMap,
    },
    /// Forward the greedy capture `suffix` and the query string to `prefix`.
    ProxyHttp {
        prefix: UriTemplate,
        suffix: String,
        params: ParamMap,
    },
    /// Answer locally without any outbound call.
    Mock(MockResponse),
}

impl Integration {
    pub fn params(&self) -> &ParamMap {
        match self {
            Integration::FixedHttp { params, .. }
            | Integration::TemplatedHttp { params, .. }
            | Integration::ProxyHttp { params, .. } => params,
            Integration::Mock(_) => &NO_PARAMS,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Integration::FixedHttp { .. } => "fixed_http",
            Integration::TemplatedHttp { .. } => "templated_http",
            Integration::ProxyHttp { .. } => "proxy_http",
            Integration::Mock(_) => "mock",
        }
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self, Integration::ProxyHttp { .. })
    }

    /// Human readable upstream target, for listings.
    pub fn target(&self) -> String {
        match self {
            Integration::FixedHttp { uri, .. } => uri.to_string(),
            Integration::TemplatedHttp { uri, .. } => uri.to_string(),
            Integration::ProxyHttp { prefix, suffix, .. } => format!("{}{{{}}}", prefix, suffix),
            Integration::Mock(mock) => format!("mock {}", mock.status.as_u16()),
        }
    }
}

/// Synthetic response served by a mock integration.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: StatusCode,
    pub body: Bytes,
    pub content_type: Option<String>,
}

impl MockResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            body: Bytes::new(),
            content_type: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        self.body = body.into();
        self.content_type = Some(content_type.into());
        self
    }

    pub fn respond(&self) -> BackendResponse {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = &self.content_type {
            if let Ok(value) = content_type.parse() {
                headers.insert(axum::http::header::CONTENT_TYPE, value);
            }
        }
        BackendResponse {
            status: self.status,
            headers,
            body: self.body.clone(),
            failure: None,
        }
    }
}

/// What the backend (or the dispatch attempt) produced, before translation.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Set when no backend answered; the status is then a synthetic 5xx.
    pub failure: Option<String>,
}

impl BackendResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
            failure: None,
        }
    }

    /// Represent a failed dispatch as a 5xx backend response.
    pub fn from_failure(err: &DispatchError) -> Self {
        Self {
            status: err.backend_status().unwrap_or(StatusCode::BAD_GATEWAY),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            failure: Some(err.to_string()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}
