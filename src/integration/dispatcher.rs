//! Integration dispatch.
//!
//! # Responsibilities
//! - Turn a route's integration plus mapped parameters into one outbound request
//! - Send it through an [`Upstream`] bounded by the upstream timeout
//! - Report failures as typed errors the engine can classify
//!
//! # Design Decisions
//! - Exactly one attempt: no retries, no backoff
//! - Unresolved URI tokens fail closed before anything is sent
//! - The transport sits behind a trait so the engine can be exercised without sockets

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::{HeaderMap, Method, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::{form_urlencoded, Url};

use crate::config::HeaderConflictPolicy;
use crate::gateway::request::GatewayRequest;
use crate::integration::mapper::{MappedParams, ParamTarget};
use crate::integration::{BackendResponse, Integration};
use crate::routing::{Captures, Route};
use crate::security::headers::strip_hop_by_hop;

const X_REQUEST_ID: &str = "x-request-id";

#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("upstream did not answer within {0:?}")]
    Timeout(Duration),

    #[error("upstream request failed: {0}")]
    Network(String),

    #[error("route `{route}`: uri token `{token}` has no mapped value")]
    UnresolvedToken { route: String, token: String },

    #[error("route `{route}`: invalid upstream uri `{uri}`: {reason}")]
    InvalidUri {
        route: String,
        uri: String,
        reason: String,
    },

    #[error("caller supplied `{0}`, which the integration injects")]
    HeaderConflict(String),

    #[error("mapped value for `{0}` is not a valid header")]
    InvalidHeader(String),

    #[error("path value `{0}` contains a dot segment")]
    DotSegment(String),
}

impl DispatchError {
    /// Defects in the compiled route, never caused by the caller.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DispatchError::UnresolvedToken { .. } | DispatchError::InvalidUri { .. }
        )
    }

    /// Errors caused by the caller's request.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            DispatchError::HeaderConflict(_)
                | DispatchError::InvalidHeader(_)
                | DispatchError::DotSegment(_)
        )
    }

    /// Synthetic backend status for transport failures.
    pub fn backend_status(&self) -> Option<StatusCode> {
        match self {
            DispatchError::Timeout(_) => Some(StatusCode::GATEWAY_TIMEOUT),
            DispatchError::Network(_) => Some(StatusCode::BAD_GATEWAY),
            _ => None,
        }
    }
}

/// A fully built outbound request.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Transport used to reach backends.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn send(&self, request: UpstreamRequest) -> Result<BackendResponse, DispatchError>;
}

/// `reqwest`-backed transport. Redirects are returned to the caller, not followed.
pub struct HttpUpstream {
    client: reqwest::Client,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl HttpUpstream {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| DispatchError::Network(e.to_string()))?;
        Ok(Self {
            client,
            connect_timeout,
            request_timeout,
        })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<BackendResponse, DispatchError> {
        let response = self
            .client
            .request(request.method, request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let mut headers = response.headers().clone();
        strip_hop_by_hop(&mut headers);
        headers.remove(header::CONTENT_LENGTH);

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        Ok(BackendResponse::new(status, headers, body))
    }
}

impl HttpUpstream {
    fn classify(&self, err: reqwest::Error) -> DispatchError {
        if err.is_timeout() {
            let limit = if err.is_connect() {
                self.connect_timeout
            } else {
                self.request_timeout
            };
            DispatchError::Timeout(limit)
        } else {
            DispatchError::Network(err.to_string())
        }
    }
}

/// Builds and sends the single outbound call for a route.
#[derive(Clone)]
pub struct Dispatcher {
    upstream: Arc<dyn Upstream>,
    timeout: Duration,
    header_conflict: HeaderConflictPolicy,
}

impl Dispatcher {
    pub fn new(
        upstream: Arc<dyn Upstream>,
        timeout: Duration,
        header_conflict: HeaderConflictPolicy,
    ) -> Self {
        Self {
            upstream,
            timeout,
            header_conflict,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Invoke the route's backend. Mock integrations answer locally.
    pub async fn dispatch(
        &self,
        route: &Route,
        captures: &Captures,
        params: &MappedParams,
        request: &GatewayRequest,
    ) -> Result<BackendResponse, DispatchError> {
        if let Integration::Mock(mock) = &route.integration {
            return Ok(mock.respond());
        }

        let outbound = self.build_request(route, captures, params, request)?;
        tracing::debug!(
            route = %route.id,
            method = %outbound.method,
            url = %outbound.url,
            "Dispatching upstream"
        );

        match tokio::time::timeout(self.timeout, self.upstream.send(outbound)).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Timeout(self.timeout)),
        }
    }

    /// Assemble the outbound request without sending it.
    pub fn build_request(
        &self,
        route: &Route,
        captures: &Captures,
        params: &MappedParams,
        request: &GatewayRequest,
    ) -> Result<UpstreamRequest, DispatchError> {
        let unresolved = |token: String| DispatchError::UnresolvedToken {
            route: route.id.clone(),
            token,
        };
        for (_, value) in &params.path {
            reject_dot_segments(value)?;
        }

        let (method, mut url, proxy) = match &route.integration {
            Integration::FixedHttp { method, uri, .. } => (
                method.clone().unwrap_or_else(|| request.method.clone()),
                uri.clone(),
                false,
            ),
            Integration::TemplatedHttp { method, uri, .. } => {
                let expanded = uri
                    .expand(|name| params.path_value(name))
                    .map_err(|e| unresolved(e.0))?;
                (
                    method.clone().unwrap_or_else(|| request.method.clone()),
                    parse_url(route, &expanded)?,
                    false,
                )
            }
            Integration::ProxyHttp { prefix, suffix, .. } => {
                let base = prefix
                    .expand(|name| params.path_value(name))
                    .map_err(|e| unresolved(e.0))?;
                let remainder = params
                    .path_value(suffix)
                    .or_else(|| captures.get(suffix))
                    .ok_or_else(|| unresolved(suffix.clone()))?;
                reject_dot_segments(remainder)?;
                let prefix_path = parse_url(route, &base)?.path().to_string();
                let joined = parse_url(route, &format!("{}{}", base, remainder))?;
                if !joined.path().starts_with(&prefix_path) {
                    return Err(DispatchError::DotSegment(remainder.to_string()));
                }
                (request.method.clone(), joined, true)
            }
            Integration::Mock(_) => {
                return Err(DispatchError::InvalidUri {
                    route: route.id.clone(),
                    uri: String::new(),
                    reason: "mock integrations have no upstream".to_string(),
                })
            }
        };

        if proxy && self.header_conflict == HeaderConflictPolicy::Reject {
            check_conflicts(route, request)?;
        }

        let inbound_query = if proxy {
            request.raw_query.as_deref()
        } else {
            None
        };
        merge_query(&mut url, inbound_query, &params.query);

        let mut headers = if proxy {
            forwarded_headers(route, &request.headers)
        } else {
            selected_headers(&request.headers)
        };
        for (name, value) in &params.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| DispatchError::InvalidHeader(name.clone()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| DispatchError::InvalidHeader(name.clone()))?;
            headers.insert(header_name, header_value);
        }

        Ok(UpstreamRequest {
            method,
            url,
            headers,
            body: request.body.clone(),
        })
    }
}

/// `.` and `..` segments (literal or `%2e`-encoded) would be collapsed by the
/// URL parser and climb out of the configured upstream path.
fn reject_dot_segments(value: &str) -> Result<(), DispatchError> {
    let escapes = value.split(['/', '\\']).any(|segment| {
        let normalized = segment.to_ascii_lowercase().replace("%2e", ".");
        normalized == "." || normalized == ".."
    });
    if escapes {
        Err(DispatchError::DotSegment(value.to_string()))
    } else {
        Ok(())
    }
}

fn parse_url(route: &Route, raw: &str) -> Result<Url, DispatchError> {
    Url::parse(raw).map_err(|e| DispatchError::InvalidUri {
        route: route.id.clone(),
        uri: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Under the reject policy a caller may not supply a name the route injects.
fn check_conflicts(route: &Route, request: &GatewayRequest) -> Result<(), DispatchError> {
    for target in route.integration.params().injected_literals() {
        let supplied = match target {
            ParamTarget::Header(name) => request.header(name).map(|_| name),
            ParamTarget::Query(name) => request.query_param(name).map(|_| name),
            ParamTarget::Path(_) => None,
        };
        if let Some(name) = supplied {
            return Err(DispatchError::HeaderConflict(name.clone()));
        }
    }
    Ok(())
}

/// Proxy forwarding: everything except hop-by-hop, host, length and the
/// credentials that authorized the call at the gateway.
fn forwarded_headers(route: &Route, inbound: &HeaderMap) -> HeaderMap {
    let mut headers = inbound.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    if let Some(scheme) = &route.security {
        for name in scheme.credential_headers() {
            headers.remove(name);
        }
    }
    headers
}

/// Non-proxy integrations only see content negotiation and the request id.
fn selected_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for name in [header::CONTENT_TYPE, header::ACCEPT, HeaderName::from_static(X_REQUEST_ID)] {
        if let Some(value) = inbound.get(&name) {
            headers.insert(name, value.clone());
        }
    }
    headers
}

/// Append the inbound query (verbatim when nothing is remapped) and the
/// mapped query parameters, mapped values replacing same-named ones.
fn merge_query(url: &mut Url, inbound: Option<&str>, mapped: &[(String, String)]) {
    let inbound = inbound.filter(|q| !q.is_empty());

    if mapped.is_empty() {
        if let Some(query) = inbound {
            let combined = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{}&{}", existing, query),
                _ => query.to_string(),
            };
            url.set_query(Some(&combined));
        }
        return;
    }

    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    if let Some(query) = inbound {
        pairs.extend(form_urlencoded::parse(query.as_bytes()).into_owned());
    }
    pairs.retain(|(name, _)| !mapped.iter().any(|(m, _)| m == name));
    pairs.extend(mapped.iter().cloned());

    url.query_pairs_mut().clear().extend_pairs(pairs);
}
