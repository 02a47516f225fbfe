//! Request gate subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, query, body)
//!     → request.rs (segments, query map, merged params)
//!     → matcher.rs (resolve registered template)    NoMatch → 404
//!     → request.rs body decoding                      Malformed → configured status
//!     → body.rs (deep-validate non-query params)     Failed  → configured status
//!     → params.rs (type-check query params)          Failed  → configured status
//!     → Allowed: original request forwarded unchanged
//! ```
//!
//! # Design Decisions
//! - Pure function of (registry snapshot, one request); no cross-request state
//! - First failure is terminal; later checks never run
//! - Matching needs only method and path, so callers can resolve before
//!   reading the body
//! - Registry and deep validator are injected at construction

pub mod body;
pub mod error;
pub mod matcher;
pub mod middleware;
pub mod params;
pub mod request;

use std::sync::Arc;

use axum::http::StatusCode;

use crate::registry::{PathSpecRegistry, RegisteredPath};

pub use body::{BodyValidationError, BodyValidator, JsonSchemaBodyValidator, Violation};
pub use error::{GateError, Rejection, ValidationFailure};
pub use matcher::{match_path, MatchResult};
pub use middleware::{request_gate_middleware, GateState, MatchedTemplate};
pub use params::{validate_query, QueryParams, ValidationOutcome};
pub use request::IncomingRequest;

/// Outcome of running one request through the gate.
#[derive(Debug)]
pub enum GateDecision<'a> {
    Allowed(&'a RegisteredPath),
    Rejected(Rejection),
}

/// Orchestrates matching, body validation and query validation.
pub struct RequestGate {
    registry: Arc<PathSpecRegistry>,
    body_validator: Arc<dyn BodyValidator>,
    validation_failed_status: StatusCode,
}

impl RequestGate {
    /// `validation_failed_status` must be a 4xx or 5xx code.
    pub fn new(
        registry: Arc<PathSpecRegistry>,
        body_validator: Arc<dyn BodyValidator>,
        validation_failed_status: u16,
    ) -> Result<Self, GateError> {
        let status = StatusCode::from_u16(validation_failed_status)
            .ok()
            .filter(|s| s.is_client_error() || s.is_server_error())
            .ok_or(GateError::InvalidStatus(validation_failed_status))?;

        Ok(Self {
            registry,
            body_validator,
            validation_failed_status: status,
        })
    }

    pub fn registry(&self) -> &PathSpecRegistry {
        &self.registry
    }

    /// Wrap a validation failure with the configured status.
    pub fn reject(&self, failure: ValidationFailure) -> Rejection {
        Rejection::ValidationFailed {
            failure,
            status: self.validation_failed_status,
        }
    }

    /// Run the request through Matching → BodyValidating → QueryValidating.
    pub fn evaluate(&self, request: &IncomingRequest) -> GateDecision<'_> {
        match self.resolve(&request.method, &request.path_segments) {
            Ok(path) => self.check(path, request),
            Err(rejection) => GateDecision::Rejected(rejection),
        }
    }

    /// Matching state: find the template or reject with not-found.
    pub fn resolve<S: AsRef<str>>(&self, method: &str, segments: &[S]) -> Result<&RegisteredPath, Rejection> {
        match match_path(&self.registry, method, segments) {
            MatchResult::Matched(path) => Ok(path),
            MatchResult::NoMatch => Err(Rejection::NotFound {
                path: request::join_path(segments),
            }),
        }
    }

    /// Validation states for a request already resolved to `path`.
    pub fn check<'a>(&self, path: &'a RegisteredPath, request: &IncomingRequest) -> GateDecision<'a> {
        if let Some(failure) = &request.body_error {
            return GateDecision::Rejected(self.reject(failure.clone()));
        }

        let checks = body::validate_body(
            path.template(),
            path.schema(),
            &request.params,
            self.body_validator.as_ref(),
        )
        .and_then(|()| validate_query(path.schema(), &request.query));

        match checks {
            Ok(()) => GateDecision::Allowed(path),
            Err(failure) => GateDecision::Rejected(self.reject(failure)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SchemaDocument;
    use serde_json::{json, Map, Value};

    struct RejectField(&'static str);

    impl BodyValidator for RejectField {
        fn validate(&self, _path_key: &str, params: &Map<String, Value>) -> Result<(), BodyValidationError> {
            if params.contains_key(self.0) {
                Err(BodyValidationError::Single(Violation {
                    message: format!("{} is not allowed", self.0),
                    pointer: format!("#/{}", self.0),
                }))
            } else {
                Ok(())
            }
        }
    }

    fn gate(status: u16) -> RequestGate {
        let schema: SchemaDocument = serde_json::from_value(json!({
            "parameters": [
                { "name": "age", "in": "query", "type": "integer", "required": true }
            ]
        }))
        .unwrap();

        let registry = PathSpecRegistry::from_paths(vec![
            RegisteredPath::new("get/users/{id}", "/api/v1", SchemaDocument::default()),
            RegisteredPath::new("get/people", "/api/v1", schema),
        ])
        .unwrap();

        RequestGate::new(Arc::new(registry), Arc::new(RejectField("admin")), status).unwrap()
    }

    #[test]
    fn test_allowed_request() {
        let gate = gate(400);
        let request = IncomingRequest::new("GET", "/api/v1/users/7");
        match gate.evaluate(&request) {
            GateDecision::Allowed(path) => assert_eq!(path.template(), "get/users/{id}"),
            other => panic!("expected Allowed, got {other:?}"),
        }
    }

    #[test]
    fn test_not_found_echoes_unstripped_path() {
        let gate = gate(400);
        let request = IncomingRequest::new("GET", "/api/v1/unknown");
        match gate.evaluate(&request) {
            GateDecision::Rejected(Rejection::NotFound { path }) => assert_eq!(path, "/api/v1/unknown"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_query_failure_uses_configured_status() {
        let gate = gate(422);
        let request = IncomingRequest::new("GET", "/api/v1/people").with_query("age", "abc");
        match gate.evaluate(&request) {
            GateDecision::Rejected(rejection) => {
                assert_eq!(rejection.status(), StatusCode::UNPROCESSABLE_ENTITY);
                assert_eq!(rejection.outcome(), "validation_failed");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_body_failure_runs_before_query_validation() {
        let gate = gate(400);
        let request = IncomingRequest::new("GET", "/api/v1/people").with_body_field("admin", json!(true));
        match gate.evaluate(&request) {
            GateDecision::Rejected(Rejection::ValidationFailed { failure, status }) => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(failure.message, "admin is not allowed");
                assert_eq!(failure.pointer, "#/admin");
            }
            other => panic!("expected body failure, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_body_on_unknown_path_is_not_found() {
        let gate = gate(400);
        let mut request = IncomingRequest::new("POST", "/api/v1/nowhere");
        request.body_error = Some(ValidationFailure::malformed_body());
        match gate.evaluate(&request) {
            GateDecision::Rejected(Rejection::NotFound { path }) => assert_eq!(path, "/api/v1/nowhere"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_body_on_matched_path_uses_configured_status() {
        let gate = gate(422);
        let mut request = IncomingRequest::new("GET", "/api/v1/users/7");
        request.body_error = Some(ValidationFailure::malformed_body());
        match gate.evaluate(&request) {
            GateDecision::Rejected(Rejection::ValidationFailed { failure, status }) => {
                assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
                assert_eq!(failure.kind, error::FailureKind::MalformedBody);
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_needs_only_method_and_path() {
        let gate = gate(400);
        let path = gate.resolve("GET", &["api", "v1", "users", "9"]).unwrap();
        assert_eq!(path.template(), "get/users/{id}");

        let rejection = gate.resolve("GET", &["api", "v1", "nope"]).unwrap_err();
        assert_eq!(rejection, Rejection::NotFound { path: "/api/v1/nope".to_string() });
    }

    #[test]
    fn test_query_parameter_hidden_from_body_validator() {
        let gate = RequestGate::new(
            gate(400).registry.clone(),
            Arc::new(RejectField("age")),
            400,
        )
        .unwrap();
        let request = IncomingRequest::new("GET", "/api/v1/people").with_query("age", "42");
        assert!(matches!(gate.evaluate(&request), GateDecision::Allowed(_)));
    }

    #[test]
    fn test_invalid_status_is_rejected() {
        let registry = Arc::new(PathSpecRegistry::default());
        for status in [200, 302, 99, 1000] {
            let result = RequestGate::new(registry.clone(), Arc::new(RejectField("x")), status);
            assert!(matches!(result, Err(GateError::InvalidStatus(s)) if s == status));
        }
    }
}
