//! Gateway error taxonomy and its HTTP rendering.

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::integration::MappingError;
use crate::security::AuthError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no route matches {method} {path}")]
    NotFound { method: Method, path: String },

    #[error("unauthorized: {0}")]
    Unauthorized(AuthError),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// A route references a capture its template never produces.
    #[error("route `{route}`: {source}")]
    Mapping { route: String, source: MappingError },

    /// Unresolved URI token or unusable upstream URI.
    #[error("route `{route}`: {message}")]
    Configuration { route: String, message: String },

    /// The backend could not be reached and no pattern handled it.
    #[error("route `{route}`: {message}")]
    DispatchFailed {
        route: String,
        status: StatusCode,
        message: String,
    },

    #[error("route `{route}`: backend status {backend_status} matched no response pattern")]
    BadGateway {
        route: String,
        backend_status: StatusCode,
    },

    #[error("request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("too many requests in flight")]
    Overloaded,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Mapping { .. } | GatewayError::Configuration { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::DispatchFailed { status, .. } => *status,
            GatewayError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::NotFound { .. } => "not_found",
            GatewayError::Unauthorized(_) => "unauthorized",
            GatewayError::BadRequest(_) => "bad_request",
            GatewayError::Mapping { .. } => "mapping",
            GatewayError::Configuration { .. } => "configuration",
            GatewayError::DispatchFailed { .. } => "dispatch_failed",
            GatewayError::BadGateway { .. } => "bad_gateway",
            GatewayError::PayloadTooLarge(_) => "payload_too_large",
            GatewayError::Overloaded => "overloaded",
        }
    }

    /// Fatal errors point at a defective route, not at the caller.
    pub fn route(&self) -> Option<&str> {
        match self {
            GatewayError::Mapping { route, .. } | GatewayError::Configuration { route, .. } => {
                Some(route)
            }
            _ => None,
        }
    }

    /// Message safe to show the caller.
    fn public_message(&self) -> String {
        match self {
            GatewayError::NotFound { .. } => "Not Found".to_string(),
            GatewayError::Unauthorized(_) => "Unauthorized".to_string(),
            GatewayError::BadRequest(message) => message.clone(),
            GatewayError::Mapping { .. } | GatewayError::Configuration { .. } => {
                "Internal server error".to_string()
            }
            GatewayError::DispatchFailed { status, .. } => status
                .canonical_reason()
                .unwrap_or("Bad Gateway")
                .to_string(),
            GatewayError::BadGateway { .. } => "Bad Gateway".to_string(),
            GatewayError::PayloadTooLarge(_) => "Request Entity Too Large".to_string(),
            GatewayError::Overloaded => "Service Unavailable".to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self.route() {
            Some(route) => json!({ "message": self.public_message(), "route": route }),
            None => json!({ "message": self.public_message() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statuses_follow_the_taxonomy() {
        let not_found = GatewayError::NotFound {
            method: Method::GET,
            path: "/x".into(),
        };
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            GatewayError::Unauthorized(AuthError::UnknownApiKey).status(),
            StatusCode::UNAUTHORIZED
        );
        let mapping = GatewayError::Mapping {
            route: "GET /a/{id}".into(),
            source: MappingError::MissingCapture("id".into()),
        };
        assert_eq!(mapping.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(mapping.route(), Some("GET /a/{id}"));
        let timeout = GatewayError::DispatchFailed {
            route: "GET /a".into(),
            status: StatusCode::GATEWAY_TIMEOUT,
            message: "timeout".into(),
        };
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(timeout.public_message(), "Gateway Timeout");
    }

    #[test]
    fn test_unauthorized_hides_the_reason() {
        let err = GatewayError::Unauthorized(AuthError::UnknownAccessKey("AKID".into()));
        assert_eq!(err.public_message(), "Unauthorized");
        assert!(err.to_string().contains("AKID"));
    }
}
