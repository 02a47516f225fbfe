//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::{body::Bytes, http::Request, Json, Router};
use serde_json::{json, Value};
use spec_gate::config::GateConfig;
use spec_gate::http::HttpServer;
use spec_gate::lifecycle::{startup, Shutdown};
use tokio::net::TcpListener;

/// Path of the sample specification shipped with the repo.
pub fn users_spec() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("specs/users.json")
}

/// Gate configuration pointing at `upstream`.
pub fn gate_config(upstream: SocketAddr) -> GateConfig {
    let mut config = GateConfig::default();
    config.specs.push(users_spec());
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.address = upstream.to_string();
    config
}

/// Build the gate server without binding it.
#[allow(dead_code)]
pub fn build_server(config: GateConfig) -> HttpServer {
    let gate = startup::build_gate(&config).unwrap();
    HttpServer::new(config, gate).unwrap()
}

/// Start an upstream that echoes what it received as JSON.
#[allow(dead_code)]
pub async fn start_echo_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().fallback(|request: Request<axum::body::Body>| async move {
        let (parts, body) = request.into_parts();
        let body: Bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Json(json!({
            "method": parts.method.as_str(),
            "uri": parts.uri.to_string(),
            "body": String::from_utf8_lossy(&body),
            "content_type": header("content-type"),
            "request_id": header("x-request-id"),
        }))
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start the gate on an ephemeral port. Keep the returned `Shutdown` alive.
#[allow(dead_code)]
pub async fn start_gate(config: GateConfig) -> (SocketAddr, Shutdown) {
    let server = build_server(config);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, signal).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}

/// Client that never reuses connections or honours proxy env vars.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[allow(dead_code)]
pub fn error_body(message: &str, path: &str) -> Value {
    json!({ "error": { "message": message, "path": path } })
}

/// Start an upstream that answers every request after `delay`.
#[allow(dead_code)]
pub async fn start_slow_upstream(delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().fallback(move || async move {
        tokio::time::sleep(delay).await;
        "late"
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}
