//! Request gate middleware.
//! Admits only requests that match a registered path and pass validation.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;

use crate::gate::error::error_response;
use crate::gate::request::split_path;
use crate::gate::{GateDecision, IncomingRequest, Rejection, RequestGate};
use crate::http::RequestIdExt;
use crate::observability::metrics;

/// State required by the gate middleware.
#[derive(Clone)]
pub struct GateState {
    pub gate: Arc<RequestGate>,
    /// Maximum buffered body size in bytes.
    pub max_body_size: usize,
}

/// Template an admitted request matched, attached as a request extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchedTemplate(pub String);

pub async fn request_gate_middleware(
    State(state): State<GateState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().to_string();
    let (parts, body) = request.into_parts();

    // Unknown paths are turned away before the body is read.
    let segments = split_path(parts.uri.path());
    let path = match state.gate.resolve(parts.method.as_str(), &segments) {
        Ok(path) => path,
        Err(rejection) => return rejected(&request_id, parts.method.as_str(), rejection, start_time),
    };

    // Buffer the body so it can be inspected and still forwarded byte for byte.
    let bytes = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) if exceeds_limit(&e) => {
            tracing::warn!(request_id = %request_id, limit = state.max_body_size, "Request body too large");
            metrics::record_decision("body_too_large", start_time);
            return error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body exceeds the configured limit.",
                "#",
            );
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to read request body");
            metrics::record_decision("body_unreadable", start_time);
            return error_response(StatusCode::BAD_REQUEST, "Request body could not be read.", "#");
        }
    };

    let incoming = IncomingRequest::from_parts(&parts, &bytes);
    match state.gate.check(path, &incoming) {
        GateDecision::Allowed(path) => {
            tracing::debug!(
                request_id = %request_id,
                method = %incoming.method,
                template = %path.template(),
                "Request admitted"
            );
            metrics::record_decision("allowed", start_time);

            let template = MatchedTemplate(path.template().to_string());
            let mut request = Request::from_parts(parts, Body::from(bytes));
            request.extensions_mut().insert(template);
            next.run(request).await
        }
        GateDecision::Rejected(rejection) => rejected(&request_id, &incoming.method, rejection, start_time),
    }
}

fn rejected(request_id: &str, method: &str, rejection: Rejection, start_time: Instant) -> Response {
    tracing::info!(
        request_id = %request_id,
        method = %method,
        outcome = rejection.outcome(),
        status = rejection.status().as_u16(),
        "Request rejected"
    );
    metrics::record_decision(rejection.outcome(), start_time);
    rejection.into_response()
}

/// Whether a body read failed because it hit the size limit.
fn exceeds_limit(error: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(err) = source {
        if err.is::<LengthLimitError>() {
            return true;
        }
        source = err.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{BodyValidationError, BodyValidator};
    use crate::registry::{PathSpecRegistry, RegisteredPath, SchemaDocument};
    use axum::{body::Bytes, middleware, routing::any, Extension, Router};
    use hyper::body::Frame;
    use serde_json::{json, Map, Value};
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tower::ServiceExt;

    /// A body whose client disconnects mid-stream.
    struct AbortedBody;

    impl hyper::body::Body for AbortedBody {
        type Data = Bytes;
        type Error = std::io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, Self::Error>>> {
            Poll::Ready(Some(Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            ))))
        }
    }

    struct AcceptAll;

    impl BodyValidator for AcceptAll {
        fn validate(&self, _: &str, _: &Map<String, Value>) -> Result<(), BodyValidationError> {
            Ok(())
        }
    }

    fn app(max_body_size: usize) -> Router {
        let schema: SchemaDocument = serde_json::from_value(json!({
            "parameters": [{ "name": "active", "in": "query", "type": "boolean" }]
        }))
        .unwrap();
        let registry = PathSpecRegistry::from_paths(vec![RegisteredPath::new("post/items", "", schema)]).unwrap();
        let gate = RequestGate::new(Arc::new(registry), Arc::new(AcceptAll), 400).unwrap();

        Router::new()
            .route(
                "/{*path}",
                any(|Extension(MatchedTemplate(t)): Extension<MatchedTemplate>, body: String| async move {
                    format!("{t}:{body}")
                }),
            )
            .layer(middleware::from_fn_with_state(
                GateState { gate: Arc::new(gate), max_body_size },
                request_gate_middleware,
            ))
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_admitted_request_keeps_body() {
        let response = app(1024)
            .oneshot(
                Request::post("/items?active=true")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name":"x"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, r#"post/items:{"name":"x"}"#);
    }

    #[tokio::test]
    async fn test_rejected_request_never_reaches_handler() {
        let response = app(1024)
            .oneshot(Request::post("/items?active=maybe").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_string(response).await,
            r##"{"error":{"message":"Type mismatch. Expected Boolean but got String.","path":"#/active"}}"##
        );
    }

    #[tokio::test]
    async fn test_oversized_body() {
        let response = app(4)
            .oneshot(Request::post("/items").body(Body::from("0123456789")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_oversized_body_on_unknown_path_is_not_found() {
        let response = app(4)
            .oneshot(Request::post("/nowhere").body(Body::from("0123456789")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_aborted_body_is_bad_request() {
        let response = app(1024)
            .oneshot(Request::post("/items").body(Body::new(AbortedBody)).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_string(response).await,
            r##"{"error":{"message":"Request body could not be read.","path":"#"}}"##
        );
    }

    #[tokio::test]
    async fn test_malformed_json_body() {
        let response = app(1024)
            .oneshot(
                Request::post("/items")
                    .header("content-type", "application/json")
                    .body(Body::from("{"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
