//! Query parameter validation.
//!
//! Walks the declared `in: query` parameters in order and stops at the first
//! failure. Values are classified by their declared type:
//!
//! | declared    | accepted values                  |
//! |-------------|----------------------------------|
//! | `string`    | anything                         |
//! | `integer`   | strict `i64` text                |
//! | `boolean`   | exactly `true` or `false`        |
//! | other/none  | anything (not classified)        |
//!
//! Missing values fail only when the parameter is `required`.

use std::collections::BTreeMap;

use crate::gate::error::{ExpectedType, ValidationFailure};
use crate::registry::{ParamType, SchemaDocument};

/// Result of a validation pass.
pub type ValidationOutcome = Result<(), ValidationFailure>;

/// Query string values by name.
pub type QueryParams = BTreeMap<String, String>;

/// Validate query values against the schema's declared query parameters.
pub fn validate_query(schema: &SchemaDocument, query: &QueryParams) -> ValidationOutcome {
    for param in schema.query_parameters() {
        let Some(value) = query.get(&param.name) else {
            if param.required {
                return Err(ValidationFailure::missing_required(&param.name));
            }
            continue;
        };

        match &param.param_type {
            Some(ParamType::Int) => {
                parse_integer(value)
                    .map_err(|_| ValidationFailure::type_mismatch(ExpectedType::Integer, &param.name))?;
            }
            Some(ParamType::Bool) => {
                parse_boolean(value)
                    .map_err(|_| ValidationFailure::type_mismatch(ExpectedType::Boolean, &param.name))?;
            }
            Some(ParamType::Str) | Some(ParamType::Other(_)) | None => {}
        }
    }

    Ok(())
}

/// Strict integer parse: optional sign followed by ASCII digits.
pub fn parse_integer(value: &str) -> Result<i64, std::num::ParseIntError> {
    value.parse()
}

/// Accepts exactly `true` or `false`.
pub fn parse_boolean(value: &str) -> Result<bool, std::str::ParseBoolError> {
    value.parse()
}
