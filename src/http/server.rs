//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (request ID, tracing, request timeout)
//! - Enforce the in-flight request limit and the body size limit
//! - Hand each buffered request to the gateway engine
//! - Serve until the shutdown coordinator fires
//!
//! # Design Decisions
//! - Routing happens in the engine, not in Axum; the router only has a fallback
//! - Overload is answered immediately with 503 instead of queueing
//! - Metrics are recorded once per request, after the response is built

use axum::{
    body::Body,
    extract::{Request, State},
    response::{IntoResponse, Response},
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Semaphore};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::gateway::{GatewayEngine, GatewayError, GatewayRequest};
use crate::http::request::MakeRequestUuid;
use crate::observability::metrics;
use crate::response::PublicResponse;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<GatewayEngine>,
    pub max_body_size: usize,
    pub inflight: Arc<Semaphore>,
}

/// HTTP front end of the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server serving `engine`.
    pub fn new(config: &GatewayConfig, engine: Arc<GatewayEngine>) -> Self {
        let state = AppState {
            engine,
            max_body_size: config.security.max_body_size,
            inflight: Arc::new(Semaphore::new(config.listener.max_connections)),
        };

        let router = Self::build_router(config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .fallback(gateway_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The router, for serving on a custom transport or in tests.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server until `shutdown` receives a signal, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: every request goes through the gateway engine.
async fn gateway_handler(State(state): State<AppState>, request: Request) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = match serve(&state, request).await {
        Ok(public) => public.into_response(),
        Err(err) => {
            if err.status().is_server_error() {
                tracing::warn!(
                    method = %method,
                    path = %path,
                    kind = err.kind(),
                    error = %err,
                    "Request failed"
                );
            } else {
                tracing::debug!(method = %method, path = %path, kind = err.kind(), error = %err, "Request rejected");
            }
            err.into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), started);
    response
}

async fn serve(state: &AppState, request: Request) -> Result<PublicResponse, GatewayError> {
    let _permit = state
        .inflight
        .clone()
        .try_acquire_owned()
        .map_err(|_| GatewayError::Overloaded)?;

    let (parts, body) = request.into_parts();
    let body = read_body(body, state.max_body_size).await?;
    let request = GatewayRequest::new(parts.method, &parts.uri, parts.headers, body);

    state.engine.handle(request).await
}

async fn read_body(body: Body, limit: usize) -> Result<axum::body::Bytes, GatewayError> {
    axum::body::to_bytes(body, limit).await.map_err(|err| {
        tracing::debug!(error = %err, limit, "Request body rejected");
        GatewayError::PayloadTooLarge(limit)
    })
}
