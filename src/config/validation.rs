//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, status codes and limits
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::uri::Authority;

use crate::config::schema::GateConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check the configuration for semantic errors.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut push = |field: &'static str, message: String| errors.push(ValidationError { field, message });

    if config.specs.is_empty() {
        push("specs", "at least one specification document is required".to_string());
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        push(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        );
    }

    if config.listener.max_connections == 0 {
        push("listener.max_connections", "must be greater than zero".to_string());
    }

    if config.upstream.address.parse::<Authority>().is_err() {
        push(
            "upstream.address",
            format!("'{}' is not a host:port authority", config.upstream.address),
        );
    }

    let status = config.gate.validation_failed_status;
    if !(400..=599).contains(&status) {
        push(
            "gate.validation_failed_status",
            format!("{status} is not a 4xx or 5xx status"),
        );
    }

    if config.timeouts.request_secs == 0 {
        push("timeouts.request_secs", "must be greater than zero".to_string());
    }

    if config.security.max_body_size == 0 {
        push("security.max_body_size", "must be greater than zero".to_string());
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        push(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
