//! Request view consumed by the gate.
//!
//! # Responsibilities
//! - Split the URI path into segments
//! - Decode the query string
//! - Merge query and body fields into one parameter map
//!
//! # Design Decisions
//! - Segments are compared as they appear on the wire (no percent-decoding)
//! - Repeated query keys: last value wins
//! - Body fields override query fields of the same name
//! - Only JSON and form bodies contribute fields; other content types are opaque
//! - A malformed body is recorded, not raised; the gate reports it only after
//!   the path has matched

use axum::http::{header, request::Parts, HeaderMap};
use serde_json::{Map, Value};

use crate::gate::error::ValidationFailure;
use crate::gate::params::QueryParams;

/// One request as the gate sees it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncomingRequest {
    pub method: String,
    pub path_segments: Vec<String>,
    pub query: QueryParams,
    /// Query and body fields merged.
    pub params: Map<String, Value>,
    /// Set when the body could not be decoded into fields.
    pub body_error: Option<ValidationFailure>,
}

impl IncomingRequest {
    /// A request with no query or body.
    pub fn new(method: impl Into<String>, path: &str) -> Self {
        Self {
            method: method.into(),
            path_segments: split_path(path),
            ..Default::default()
        }
    }

    /// Add a query value, also visible in the merged map.
    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.insert(name.to_string(), value.to_string());
        self.params.insert(name.to_string(), Value::String(value.to_string()));
        self
    }

    /// Add a body field to the merged map.
    pub fn with_body_field(mut self, name: &str, value: Value) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }

    /// Build the gate's view from buffered request parts.
    pub fn from_parts(parts: &Parts, body: &[u8]) -> Self {
        let query = parse_query(parts.uri.query());
        let mut params: Map<String, Value> = query
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();

        let body_error = match body_fields(&parts.headers, body) {
            Ok(fields) => {
                params.extend(fields);
                None
            }
            Err(failure) => Some(failure),
        };

        Self {
            method: parts.method.as_str().to_string(),
            path_segments: split_path(parts.uri.path()),
            query,
            params,
            body_error,
        }
    }
}

/// Inverse of [`split_path`].
pub fn join_path<S: AsRef<str>>(segments: &[S]) -> String {
    let joined: Vec<&str> = segments.iter().map(|s| s.as_ref()).collect();
    format!("/{}", joined.join("/"))
}

/// Split a URI path into segments. `/` yields none; a trailing slash yields a final empty segment.
pub fn split_path(path: &str) -> Vec<String> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').map(str::to_string).collect()
    }
}

pub fn parse_query(query: Option<&str>) -> QueryParams {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default()
}

fn body_fields(headers: &HeaderMap, body: &[u8]) -> Result<Map<String, Value>, ValidationFailure> {
    if body.is_empty() {
        return Ok(Map::new());
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.contains("json") {
        match serde_json::from_slice(body) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(ValidationFailure::malformed_body()),
        }
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        Ok(url::form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect())
    } else {
        Ok(Map::new())
    }
}
