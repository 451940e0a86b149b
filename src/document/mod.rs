//! Declarative API document.
//!
//! # Data Flow
//! ```text
//! api.yaml (or JSON)
//!     → model.rs (serde, order preserving, duplicate keys rejected)
//!     → compile.rs (${variables}, expressions, patterns, cross-references)
//!     → CompiledApi { routes } → RouteTable
//! ```

pub mod compile;
pub mod model;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use compile::{compile, CompileError, CompileErrors, CompiledApi};
pub use model::ApiDocument;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read API document {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse API document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{0}")]
    Compile(#[from] CompileErrors),
}

/// Parse a YAML or JSON document without compiling it.
pub fn parse_document(content: &str) -> Result<ApiDocument, DocumentError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Read, parse and compile the document at `path`.
pub fn load_document(
    path: &Path,
    variables: &BTreeMap<String, String>,
) -> Result<CompiledApi, DocumentError> {
    let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = parse_document(&content)?;
    let api = compile(&doc, variables)?;

    tracing::info!(
        path = %path.display(),
        title = %api.title,
        routes = api.routes.len(),
        "API document loaded"
    );
    Ok(api)
}
