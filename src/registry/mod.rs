//! Registry of specification paths.
//!
//! # Data Flow
//! ```text
//! spec documents (JSON, Swagger 2.0 layout)
//!     → loader.rs (parse, expand operations into templates)
//!     → RegisteredPath { template, base_path, schema }
//!     → PathSpecRegistry (frozen, shared via Arc)
//!     → read by every request through the gate
//! ```
//!
//! # Design Decisions
//! - Built once before traffic starts, never mutated afterwards
//! - Template and base-path segments are split at construction, not per request
//! - Enumeration order is load order, which the matcher uses for tie-breaks

pub mod document;
pub mod loader;

use std::collections::HashMap;

use thiserror::Error;

pub use document::{ParamLocation, ParamType, Parameter, SchemaDocument};

/// Errors raised while assembling a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("path '{0}' is registered more than once")]
    DuplicatePath(String),
}

/// A specification path the gate admits traffic for.
#[derive(Debug, Clone)]
pub struct RegisteredPath {
    template: String,
    base_path: String,
    schema: SchemaDocument,
    template_segments: Vec<String>,
    base_depth: usize,
}

impl RegisteredPath {
    /// `template` must start with the lowercase method, e.g. `get/users/{id}`.
    pub fn new(
        template: impl Into<String>,
        base_path: impl Into<String>,
        schema: SchemaDocument,
    ) -> Self {
        let template = template.into();
        let base_path = base_path.into();
        let template_segments = template.split('/').map(str::to_string).collect();
        let base_depth = base_segments(&base_path).len();

        Self {
            template,
            base_path,
            schema,
            template_segments,
            base_depth,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn schema(&self) -> &SchemaDocument {
        &self.schema
    }

    /// Template split on `/`, method first.
    pub fn template_segments(&self) -> &[String] {
        &self.template_segments
    }

    /// Number of leading request segments owned by the base path.
    pub fn base_depth(&self) -> usize {
        self.base_depth
    }

    /// Number of `{placeholder}` segments in the template.
    pub fn placeholder_count(&self) -> usize {
        self.template_segments
            .iter()
            .filter(|s| is_placeholder(s))
            .count()
    }
}

/// A segment is a placeholder iff it starts with `{`.
pub fn is_placeholder(segment: &str) -> bool {
    segment.starts_with('{')
}

/// Split a base path into segments, dropping the leading empty one.
///
/// `""` and `"/"` have no segments.
fn base_segments(base_path: &str) -> Vec<&str> {
    let trimmed = base_path.strip_prefix('/').unwrap_or(base_path);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

/// Immutable lookup table of registered paths.
#[derive(Debug, Default)]
pub struct PathSpecRegistry {
    paths: Vec<RegisteredPath>,
    index: HashMap<String, usize>,
}

impl PathSpecRegistry {
    /// Build a registry, keeping the given order.
    pub fn from_paths(
        paths: impl IntoIterator<Item = RegisteredPath>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for path in paths {
            if registry.index.contains_key(path.template()) {
                return Err(RegistryError::DuplicatePath(path.template().to_string()));
            }
            registry
                .index
                .insert(path.template().to_string(), registry.paths.len());
            registry.paths.push(path);
        }
        Ok(registry)
    }

    /// Look up a registered path by its template key.
    pub fn get(&self, template: &str) -> Option<&RegisteredPath> {
        self.index.get(template).map(|&i| &self.paths[i])
    }

    /// All registered paths in load order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredPath> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
