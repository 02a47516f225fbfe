//! Body validation gate.
//!
//! # Responsibilities
//! - Withhold declared query parameter names from the merged parameter map
//! - Delegate the remainder to a [`BodyValidator`]
//! - Reduce the validator's error (single or list) to one failure
//!
//! # Design Decisions
//! - Only typed `in: query` parameters are withheld; `in: body`/`in: path`
//!   names are still passed through
//! - The deep validator sits behind a trait so hosts can plug in their own
//! - Default validator compiles one JSON schema per path at startup

use std::collections::HashMap;

use jsonschema::Validator;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::gate::error::{GateError, ValidationFailure};
use crate::gate::params::ValidationOutcome;
use crate::registry::{PathSpecRegistry, SchemaDocument};

/// A single complaint from a deep validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub message: String,
    pub pointer: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.pointer)
    }
}

/// Error returned by a deep validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BodyValidationError {
    #[error("{0}")]
    Single(Violation),
    #[error("body failed schema validation")]
    Many(Vec<Violation>),
}

impl BodyValidationError {
    /// Collapse to the gate's failure type; lists report their first entry.
    pub fn into_failure(self) -> ValidationFailure {
        let violation = match self {
            BodyValidationError::Single(v) => Some(v),
            BodyValidationError::Many(list) => list.into_iter().next(),
        };
        match violation {
            Some(v) => ValidationFailure::body_violation(v.message, v.pointer),
            None => ValidationFailure::body_violation("Request body failed schema validation.", "#"),
        }
    }
}

/// Deep validation of the non-query part of a request.
pub trait BodyValidator: Send + Sync {
    fn validate(&self, path_key: &str, params: &Map<String, Value>) -> Result<(), BodyValidationError>;
}

/// Delegate `params`, minus typed query parameters, to the deep validator.
pub fn validate_body(
    path_key: &str,
    schema: &SchemaDocument,
    params: &Map<String, Value>,
    validator: &dyn BodyValidator,
) -> ValidationOutcome {
    let withheld = schema.typed_query_names();

    let result = if withheld.is_empty() {
        validator.validate(path_key, params)
    } else {
        let remainder: Map<String, Value> = params
            .iter()
            .filter(|(name, _)| !withheld.contains(name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        validator.validate(path_key, &remainder)
    };

    result.map_err(BodyValidationError::into_failure)
}

/// JSON Schema validator keyed by registered template.
///
/// Paths without an `in: body` schema accept any remainder.
pub struct JsonSchemaBodyValidator {
    validators: HashMap<String, Validator>,
}

impl JsonSchemaBodyValidator {
    /// Compile the body schema of every registered path.
    pub fn from_registry(registry: &PathSpecRegistry) -> Result<Self, GateError> {
        let mut validators = HashMap::new();
        for path in registry.iter() {
            let Some(schema) = path.schema().body_schema() else {
                continue;
            };
            let validator =
                jsonschema::validator_for(schema).map_err(|e| GateError::InvalidBodySchema {
                    template: path.template().to_string(),
                    reason: e.to_string(),
                })?;
            validators.insert(path.template().to_string(), validator);
        }

        tracing::debug!(compiled = validators.len(), "Body schemas compiled");
        Ok(Self { validators })
    }
}

impl BodyValidator for JsonSchemaBodyValidator {
    fn validate(&self, path_key: &str, params: &Map<String, Value>) -> Result<(), BodyValidationError> {
        let Some(validator) = self.validators.get(path_key) else {
            return Ok(());
        };

        let instance = Value::Object(params.clone());
        let mut violations: Vec<Violation> = validator
            .iter_errors(&instance)
            .map(|e| Violation {
                message: e.to_string(),
                pointer: format!("#{}", e.instance_path),
            })
            .collect();

        match violations.len() {
            0 => Ok(()),
            1 => Err(BodyValidationError::Single(violations.remove(0))),
            _ => Err(BodyValidationError::Many(violations)),
        }
    }
}
