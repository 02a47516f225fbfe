//! Startup orchestration.
//!
//! # Responsibilities
//! - Load specification documents into the registry
//! - Compile per-path body schemas
//! - Assemble the request gate
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The registry is frozen before the listener is bound

use std::sync::Arc;

use thiserror::Error;

use crate::config::GateConfig;
use crate::gate::{GateError, JsonSchemaBodyValidator, RequestGate};
use crate::registry::loader::{load_registry, SpecLoadError};
use crate::registry::PathSpecRegistry;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Spec(#[from] SpecLoadError),

    #[error(transparent)]
    Gate(#[from] GateError),
}

/// Load the configured specs and build the gate around them.
pub fn build_gate(config: &GateConfig) -> Result<RequestGate, StartupError> {
    let registry = Arc::new(load_registry(&config.specs)?);
    tracing::info!(
        documents = config.specs.len(),
        paths = registry.len(),
        "Specification registry loaded"
    );
    Ok(gate_for_registry(registry, config)?)
}

/// Build the gate for an already-populated registry.
pub fn gate_for_registry(registry: Arc<PathSpecRegistry>, config: &GateConfig) -> Result<RequestGate, GateError> {
    let body_validator = Arc::new(JsonSchemaBodyValidator::from_registry(&registry)?);
    RequestGate::new(registry, body_validator, config.gate.validation_failed_status)
}
