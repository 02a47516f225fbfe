//! Specification document loading.
//!
//! # Responsibilities
//! - Read Swagger 2.0 style JSON documents from disk
//! - Expand every `paths` entry into one template per HTTP operation
//! - Merge path-level parameters with operation-level ones
//!
//! # Design Decisions
//! - Templates are keyed `<method><path>`; the root path `/` collapses to the bare method
//! - Operation parameters override path-level ones with the same `(name, in)`
//! - Documents load in the configured order; paths within a document load sorted

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::registry::{Parameter, PathSpecRegistry, RegisteredPath, RegistryError, SchemaDocument};

/// HTTP methods recognised as operation keys of a path item.
const OPERATION_METHODS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];

/// Errors raised while loading specification documents.
#[derive(Debug, Error)]
pub enum SpecLoadError {
    #[error("failed to read spec '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse spec '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid operation '{method} {path}': {source}")]
    Operation {
        method: String,
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("spec path '{0}' must start with '/'")]
    InvalidPath(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Deserialize)]
struct SpecFile {
    #[serde(rename = "basePath", default)]
    base_path: String,

    #[serde(default)]
    paths: BTreeMap<String, PathItem>,
}

#[derive(Debug, Deserialize)]
struct PathItem {
    #[serde(default)]
    parameters: Vec<Parameter>,

    #[serde(flatten)]
    operations: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct Operation {
    #[serde(default)]
    parameters: Vec<Parameter>,
}

/// Build the template key for an operation.
pub fn template_key(method: &str, path: &str) -> String {
    let method = method.to_lowercase();
    if path == "/" {
        method
    } else {
        format!("{method}{path}")
    }
}

/// Expand a parsed document into registered paths.
pub fn parse_spec_document(document: &Value) -> Result<Vec<RegisteredPath>, SpecLoadError> {
    let spec: SpecFile = serde_json::from_value(document.clone()).map_err(|source| {
        SpecLoadError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        }
    })?;
    expand(spec)
}

fn expand(spec: SpecFile) -> Result<Vec<RegisteredPath>, SpecLoadError> {
    let mut registered = Vec::new();

    for (path, item) in spec.paths {
        if !path.starts_with('/') {
            return Err(SpecLoadError::InvalidPath(path));
        }

        for method in OPERATION_METHODS {
            let Some(raw) = item.operations.get(method) else {
                continue;
            };
            let operation: Operation =
                serde_json::from_value(raw.clone()).map_err(|source| SpecLoadError::Operation {
                    method: method.to_string(),
                    path: path.clone(),
                    source,
                })?;

            let parameters = merge_parameters(&item.parameters, operation.parameters);
            registered.push(RegisteredPath::new(
                template_key(method, &path),
                spec.base_path.clone(),
                SchemaDocument::new(parameters),
            ));
        }
    }

    Ok(registered)
}

fn merge_parameters(shared: &[Parameter], own: Vec<Parameter>) -> Vec<Parameter> {
    let mut merged: Vec<Parameter> = shared
        .iter()
        .filter(|s| !own.iter().any(|o| o.name == s.name && o.location == s.location))
        .cloned()
        .collect();
    merged.extend(own);
    merged
}

/// Load a single specification file.
pub fn load_spec_file(path: &Path) -> Result<Vec<RegisteredPath>, SpecLoadError> {
    let content = fs::read_to_string(path).map_err(|source| SpecLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let spec: SpecFile = serde_json::from_str(&content).map_err(|source| SpecLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let paths = expand(spec)?;
    tracing::debug!(spec = %path.display(), operations = paths.len(), "Spec document loaded");
    Ok(paths)
}

/// Load every configured document into a frozen registry.
pub fn load_registry(files: &[PathBuf]) -> Result<PathSpecRegistry, SpecLoadError> {
    let mut paths = Vec::new();
    for file in files {
        paths.extend(load_spec_file(file)?);
    }
    Ok(PathSpecRegistry::from_paths(paths)?)
}
