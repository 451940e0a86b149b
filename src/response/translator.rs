//! Backend → public response translation.
//!
//! # Responsibilities
//! - Pick the response rule for a backend response
//! - Produce the public status, headers and body
//! - Pass proxy responses through when only the default rule applies
//!
//! # Design Decisions
//! - Content type comes from the backend first, the declared response second
//! - Header expressions referring to absent backend headers are skipped
//! - The schema reference rides along for documentation; bodies are not validated

use axum::body::Bytes;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::StatusCode;
use thiserror::Error;

use crate::integration::BackendResponse;
use crate::response::{HeaderExpr, ResponseSpec};
use crate::routing::Route;

/// The response the gateway sends to its caller.
#[derive(Debug, Clone)]
pub struct PublicResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub schema_ref: Option<String>,
}

/// No declared pattern (and no default) matched the backend response.
#[derive(Debug, Clone, Error)]
#[error("route `{route}`: backend status {status} matched no response pattern")]
pub struct Unmatched {
    pub route: String,
    pub status: StatusCode,
}

pub fn translate(route: &Route, backend: BackendResponse) -> Result<PublicResponse, Unmatched> {
    let Some(selection) = route.responses.select(&backend) else {
        return Err(Unmatched {
            route: route.id.clone(),
            status: backend.status,
        });
    };
    let spec = selection.spec;

    if selection.is_default && route.integration.is_proxy() {
        tracing::trace!(route = %route.id, status = %backend.status, "Passing proxy response through");
        let mut headers = backend.headers.clone();
        apply_header_exprs(spec, &backend.headers, &mut headers);
        return Ok(PublicResponse {
            status: backend.status,
            headers,
            body: backend.body,
            schema_ref: spec.schema_ref.clone(),
        });
    }

    let mut headers = HeaderMap::new();
    let content_type = backend.headers.get(header::CONTENT_TYPE).cloned().or_else(|| {
        spec.content_type
            .as_deref()
            .and_then(|ct| HeaderValue::from_str(ct).ok())
    });
    if let Some(content_type) = content_type {
        headers.insert(header::CONTENT_TYPE, content_type);
    }
    apply_header_exprs(spec, &backend.headers, &mut headers);

    tracing::trace!(
        route = %route.id,
        backend_status = %backend.status,
        status = %spec.status,
        "Translated backend response"
    );

    Ok(PublicResponse {
        status: spec.status,
        headers,
        body: backend.body,
        schema_ref: spec.schema_ref.clone(),
    })
}

fn apply_header_exprs(spec: &ResponseSpec, backend: &HeaderMap, out: &mut HeaderMap) {
    for (name, expr) in &spec.headers {
        let value = match expr {
            HeaderExpr::Literal(value) => Some(value.clone()),
            HeaderExpr::BackendHeader(source) => backend.get(source).cloned(),
        };
        if let Some(value) = value {
            out.insert(name.clone(), value);
        }
    }
}
