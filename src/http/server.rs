//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the gate in front of every route
//! - Wire up middleware (request ID, tracing, timeout)
//! - Forward admitted requests to the upstream API
//! - Serve until the shutdown signal fires

use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        Request, StatusCode, Uri,
    },
    middleware,
    response::Response,
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GateConfig;
use crate::gate::{request_gate_middleware, GateError, GateState, MatchedTemplate, RequestGate};
use crate::http::request::{MakeUuidRequestId, RequestIdExt, X_REQUEST_ID};
use crate::http::response;
use crate::lifecycle::ShutdownSignal;
use crate::net::BoundedListener;
use crate::observability::metrics;

/// Application state injected into the forwarding handler.
#[derive(Clone)]
pub struct AppState {
    pub client: Client<HttpConnector, Body>,
    pub upstream: Authority,
}

/// HTTP server fronting the upstream API.
pub struct HttpServer {
    router: Router,
    config: GateConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and gate.
    pub fn new(config: GateConfig, gate: RequestGate) -> Result<Self, GateError> {
        let upstream: Authority = config
            .upstream
            .address
            .parse()
            .map_err(|_| GateError::InvalidUpstream(config.upstream.address.clone()))?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState { client, upstream };
        let gate_state = GateState {
            gate: std::sync::Arc::new(gate),
            max_body_size: config.security.max_body_size,
        };

        let router = Self::build_router(&config, state, gate_state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GateConfig, state: AppState, gate_state: GateState) -> Router {
        Router::new()
            .route("/{*path}", any(forward_handler))
            .route("/", any(forward_handler))
            .layer(middleware::from_fn_with_state(gate_state, request_gate_middleware))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeUuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(TimeoutLayer::with_status_code(
                        StatusCode::REQUEST_TIMEOUT,
                        Duration::from_secs(config.timeouts.request_secs),
                    )),
            )
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, mut shutdown: ShutdownSignal) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let max_connections = self.config.listener.max_connections;
        tracing::info!(
            address = %addr,
            max_connections,
            upstream = %self.config.upstream.address,
            "HTTP server starting"
        );

        let listener = BoundedListener::new(listener, max_connections);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.recv().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }
}

/// Forwards an admitted request to the upstream unchanged.
async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request.request_id().to_string();
    let template = request
        .extensions()
        .get::<MatchedTemplate>()
        .map(|t| t.0.clone())
        .unwrap_or_default();

    let (mut parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(state.upstream.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream URI");
            return response::bad_gateway();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        template = %template,
        uri = %parts.uri,
        "Forwarding request"
    );

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(upstream_response) => response::from_upstream(upstream_response),
        Err(e) => {
            tracing::error!(request_id = %request_id, template = %template, error = %e, "Upstream error");
            metrics::record_upstream_error();
            response::bad_gateway()
        }
    }
}
