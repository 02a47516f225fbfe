//! Gate failures and their HTTP rendering.
//!
//! Every rejection is rendered as
//! `{"error":{"message":"...","path":"..."}}` with a JSON content type.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Message for requests that match no registered path.
pub const NOT_FOUND_MESSAGE: &str = "API does not provide resource";

/// Type a query value failed to parse as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedType {
    Integer,
    Boolean,
}

impl std::fmt::Display for ExpectedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpectedType::Integer => write!(f, "Integer"),
            ExpectedType::Boolean => write!(f, "Boolean"),
        }
    }
}

/// Classification of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    MissingRequiredParameter,
    TypeMismatch(ExpectedType),
    BodySchemaViolation,
    MalformedBody,
}

/// A request that matched a path but failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({pointer})")]
pub struct ValidationFailure {
    pub kind: FailureKind,
    pub message: String,
    /// JSON pointer to the offending value, `#` for the whole document.
    pub pointer: String,
}

impl ValidationFailure {
    pub fn missing_required(name: &str) -> Self {
        Self {
            kind: FailureKind::MissingRequiredParameter,
            message: format!("Required property {name} was not present."),
            pointer: "#".to_string(),
        }
    }

    pub fn type_mismatch(expected: ExpectedType, name: &str) -> Self {
        Self {
            kind: FailureKind::TypeMismatch(expected),
            message: format!("Type mismatch. Expected {expected} but got String."),
            pointer: format!("#/{name}"),
        }
    }

    pub fn body_violation(message: impl Into<String>, pointer: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::BodySchemaViolation,
            message: message.into(),
            pointer: pointer.into(),
        }
    }

    pub fn malformed_body() -> Self {
        Self {
            kind: FailureKind::MalformedBody,
            message: "Request body is not a valid JSON object.".to_string(),
            pointer: "#".to_string(),
        }
    }
}

/// Terminal failure of the request gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// No registered template matched. `path` echoes the unstripped request path.
    NotFound { path: String },
    ValidationFailed {
        failure: ValidationFailure,
        status: StatusCode,
    },
}

impl Rejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Rejection::NotFound { .. } => StatusCode::NOT_FOUND,
            Rejection::ValidationFailed { status, .. } => *status,
        }
    }

    /// Label used for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Rejection::NotFound { .. } => "not_found",
            Rejection::ValidationFailed { .. } => "validation_failed",
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, path) = match self {
            Rejection::NotFound { path } => (NOT_FOUND_MESSAGE.to_string(), path),
            Rejection::ValidationFailed { failure, .. } => (failure.message, failure.pointer),
        };
        error_response(status, message, path)
    }
}

/// Render the gate's error envelope.
pub fn error_response(status: StatusCode, message: impl Into<String>, path: impl Into<String>) -> Response {
    let body = json!({
        "error": {
            "message": message.into(),
            "path": path.into(),
        }
    });
    (status, Json(body)).into_response()
}

/// Errors raised while constructing the gate.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("invalid validation failure status {0}; expected a 4xx or 5xx code")]
    InvalidStatus(u16),

    #[error("body schema of '{template}' does not compile: {reason}")]
    InvalidBodySchema { template: String, reason: String },

    #[error("invalid upstream address '{0}'")]
    InvalidUpstream(String),
}
