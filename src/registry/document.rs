//! Declared schema of a single registered operation.
//!
//! Only the pieces the gate consults are modelled: the ordered `parameters`
//! list and, through the `in: body` parameter, the JSON schema handed to the
//! deep body validator.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;

/// Declared type of a parameter, decoded once at load time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ParamType {
    Str,
    Int,
    Bool,
    /// Any other declared type. Passes through query validation untouched.
    Other(String),
}

impl From<String> for ParamType {
    fn from(declared: String) -> Self {
        match declared.as_str() {
            "string" => ParamType::Str,
            "integer" => ParamType::Int,
            "boolean" => ParamType::Bool,
            _ => ParamType::Other(declared),
        }
    }
}

/// Where a parameter is carried in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamLocation {
    Query,
    Path,
    Header,
    Body,
    FormData,
    #[serde(other)]
    Other,
}

/// A single entry of an operation's `parameters` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParamLocation,

    #[serde(rename = "type", default)]
    pub param_type: Option<ParamType>,

    #[serde(default)]
    pub required: bool,

    /// Schema of an `in: body` parameter.
    #[serde(default)]
    pub schema: Option<Value>,
}

impl Parameter {
    pub fn is_query(&self) -> bool {
        self.location == ParamLocation::Query
    }
}

/// Parsed schema document attached to a registered path.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl SchemaDocument {
    pub fn new(parameters: Vec<Parameter>) -> Self {
        Self { parameters }
    }

    /// Query parameters in declaration order.
    pub fn query_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|p| p.is_query())
    }

    /// Names of query parameters that declare a type.
    ///
    /// These are the keys withheld from the deep body validator.
    pub fn typed_query_names(&self) -> BTreeSet<&str> {
        self.query_parameters()
            .filter(|p| p.param_type.is_some())
            .map(|p| p.name.as_str())
            .collect()
    }

    /// JSON schema of the first `in: body` parameter, if any.
    pub fn body_schema(&self) -> Option<&Value> {
        self.parameters
            .iter()
            .filter(|p| p.location == ParamLocation::Body)
            .find_map(|p| p.schema.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: Value) -> SchemaDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_param_type_decoding() {
        assert_eq!(ParamType::from("string".to_string()), ParamType::Str);
        assert_eq!(ParamType::from("integer".to_string()), ParamType::Int);
        assert_eq!(ParamType::from("boolean".to_string()), ParamType::Bool);
        assert_eq!(
            ParamType::from("number".to_string()),
            ParamType::Other("number".to_string())
        );
    }

    #[test]
    fn test_parameter_deserialization() {
        let doc = document(json!({
            "parameters": [
                { "name": "age", "in": "query", "type": "integer", "required": true },
                { "name": "id", "in": "path", "type": "string" },
                { "name": "trace", "in": "cookie" }
            ]
        }));

        assert_eq!(doc.parameters.len(), 3);
        assert_eq!(doc.parameters[0].param_type, Some(ParamType::Int));
        assert!(doc.parameters[0].required);
        assert_eq!(doc.parameters[1].location, ParamLocation::Path);
        assert!(!doc.parameters[1].required);
        assert_eq!(doc.parameters[2].location, ParamLocation::Other);
        assert_eq!(doc.parameters[2].param_type, None);
    }

    #[test]
    fn test_typed_query_names_skip_untyped_and_non_query() {
        let doc = document(json!({
            "parameters": [
                { "name": "age", "in": "query", "type": "integer" },
                { "name": "filter", "in": "query" },
                { "name": "id", "in": "path", "type": "string" }
            ]
        }));

        let names: Vec<&str> = doc.typed_query_names().into_iter().collect();
        assert_eq!(names, vec!["age"]);
    }

    #[test]
    fn test_body_schema_from_body_parameter() {
        let doc = document(json!({
            "parameters": [
                { "name": "age", "in": "query", "type": "integer" },
                { "name": "payload", "in": "body", "schema": { "type": "object" } }
            ]
        }));
        assert_eq!(doc.body_schema(), Some(&json!({ "type": "object" })));

        assert!(SchemaDocument::default().body_schema().is_none());
    }
}
