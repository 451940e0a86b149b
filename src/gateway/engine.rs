//! Per-request orchestration.
//!
//! # Responsibilities
//! - Drive one request through match, authorize, validate, map, dispatch, translate
//! - Classify every failure into the gateway error taxonomy
//! - Record dispatch and auth metrics
//!
//! # Design Decisions
//! - The engine holds only immutable shared state; one instance serves all requests
//! - Each request owns its lifecycle; nothing is retained between requests

use std::sync::Arc;

use crate::gateway::error::GatewayError;
use crate::gateway::lifecycle::{RequestLifecycle, RequestState};
use crate::gateway::request::GatewayRequest;
use crate::integration::{map_parameters, BackendResponse, Dispatcher};
use crate::observability::metrics;
use crate::response::{translate, PublicResponse};
use crate::routing::RouteTable;
use crate::security::SecurityEnforcer;

pub struct GatewayEngine {
    routes: Arc<RouteTable>,
    security: SecurityEnforcer,
    dispatcher: Dispatcher,
}

impl GatewayEngine {
    pub fn new(routes: Arc<RouteTable>, security: SecurityEnforcer, dispatcher: Dispatcher) -> Self {
        Self {
            routes,
            security,
            dispatcher,
        }
    }

    pub fn routes(&self) -> &Arc<RouteTable> {
        &self.routes
    }

    pub async fn handle(&self, request: GatewayRequest) -> Result<PublicResponse, GatewayError> {
        let request_id = request.request_id().unwrap_or("-").to_string();
        let mut lifecycle = RequestLifecycle::new(request_id.as_str());

        let resolved = match self.routes.resolve(&request.method, &request.path) {
            Ok(resolved) => resolved,
            Err(not_found) => {
                lifecycle.advance(RequestState::NotFound);
                tracing::debug!(request_id = %request_id, method = %not_found.method, path = %not_found.path, "No route matched");
                return Err(GatewayError::NotFound {
                    method: not_found.method,
                    path: not_found.path,
                });
            }
        };
        lifecycle.advance(RequestState::Matched);
        let route = &resolved.route;
        let captures = &resolved.captures;

        if let Err(err) = self.security.authorize(route, &request) {
            lifecycle.advance(RequestState::Unauthorized);
            if let Some(scheme) = &route.security {
                metrics::record_auth_failure(scheme.kind());
            }
            return Err(GatewayError::Unauthorized(err));
        }
        lifecycle.advance(RequestState::Authorized);

        if let Some(validator) = &route.validator {
            if let Err(failure) = validator.validate(captures, &request) {
                lifecycle.advance(RequestState::Rejected);
                tracing::debug!(request_id = %request_id, route = %route.id, reason = %failure, "Request failed validation");
                return Err(GatewayError::BadRequest(failure.to_string()));
            }
        }

        let params = match map_parameters(route.integration.params(), captures, &request) {
            Ok(params) => params,
            Err(err) if err.is_invariant_violation() => {
                lifecycle.advance(RequestState::MappingError);
                tracing::error!(request_id = %request_id, route = %route.id, error = %err, "Parameter mapping invariant violated");
                return Err(GatewayError::Mapping {
                    route: route.id.clone(),
                    source: err,
                });
            }
            Err(err) => {
                lifecycle.advance(RequestState::Rejected);
                return Err(GatewayError::BadRequest(err.to_string()));
            }
        };
        lifecycle.advance(RequestState::Mapped);

        let backend = match self.dispatcher.dispatch(route, captures, &params, &request).await {
            Ok(backend) => {
                metrics::record_dispatch(&route.id, "ok");
                backend
            }
            Err(err) if err.is_configuration() => {
                lifecycle.advance(RequestState::MappingError);
                metrics::record_dispatch(&route.id, "configuration");
                tracing::error!(request_id = %request_id, route = %route.id, error = %err, "Route configuration error");
                return Err(GatewayError::Configuration {
                    route: route.id.clone(),
                    message: err.to_string(),
                });
            }
            Err(err) if err.is_rejection() => {
                lifecycle.advance(RequestState::Rejected);
                return Err(GatewayError::BadRequest(err.to_string()));
            }
            Err(err) => {
                metrics::record_dispatch(&route.id, "failed");
                tracing::warn!(request_id = %request_id, route = %route.id, error = %err, "Upstream dispatch failed");
                BackendResponse::from_failure(&err)
            }
        };
        lifecycle.advance(RequestState::Dispatched);

        let backend_status = backend.status;
        let failure = backend.failure.clone();
        match translate(route, backend) {
            Ok(response) => {
                lifecycle.advance(RequestState::Translated);
                lifecycle.advance(RequestState::Sent);
                tracing::debug!(
                    request_id = %request_id,
                    route = %route.id,
                    backend_status = %backend_status,
                    status = %response.status,
                    elapsed_ms = lifecycle.elapsed().as_millis() as u64,
                    "Request completed"
                );
                Ok(response)
            }
            Err(unmatched) => match failure {
                Some(message) => {
                    lifecycle.advance(RequestState::DispatchFailed);
                    Err(GatewayError::DispatchFailed {
                        route: unmatched.route,
                        status: backend_status,
                        message,
                    })
                }
                None => {
                    lifecycle.advance(RequestState::BadGateway);
                    tracing::warn!(request_id = %request_id, error = %unmatched, "No response pattern matched");
                    Err(GatewayError::BadGateway {
                        route: unmatched.route,
                        backend_status,
                    })
                }
            },
        }
    }
}
