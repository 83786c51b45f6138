//! Document frontend.
//!
//! Turns raw JSON or YAML text into the document model, and partitions the
//! document's operations into aggregates and API tags.

pub mod aggregate;

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::diagnostic::CompilerError;
use crate::ir::Document;

pub use aggregate::{AggregateResolver, Resolution};

/// Text format of an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Guesses the format from the first significant character.
    pub fn detect(text: &str) -> Self {
        match text.trim_start().chars().next() {
            Some('{') | Some('[') => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Deserializes JSON or YAML text, retrying JSON-looking text as YAML.
pub fn parse_text<T: DeserializeOwned>(text: &str, source_name: &str) -> Result<T, CompilerError> {
    let parse_failed = |message: String| CompilerError::ParseFailed {
        source_name: source_name.to_string(),
        message,
    };

    match DocumentFormat::detect(text) {
        DocumentFormat::Json => match serde_json::from_str(text) {
            Ok(value) => Ok(value),
            Err(json_error) => {
                debug!(source = source_name, error = %json_error, "JSON parse failed, trying YAML");
                serde_yaml::from_str(text).map_err(|_| parse_failed(json_error.to_string()))
            }
        },
        DocumentFormat::Yaml => {
            serde_yaml::from_str(text).map_err(|e| parse_failed(e.to_string()))
        }
    }
}

/// Parses an OpenAPI document.
pub fn parse_document(text: &str, source_name: &str) -> Result<Document, CompilerError> {
    if text.trim().is_empty() {
        return Err(CompilerError::ParseFailed {
            source_name: source_name.to_string(),
            message: "document is empty".to_string(),
        });
    }
    let document: Document = parse_text(text, source_name)?;
    debug!(
        source = source_name,
        openapi = %document.openapi,
        paths = document.paths.len(),
        schemas = document.components.schemas.len(),
        "parsed document"
    );
    Ok(document)
}

/// Reads and parses a local OpenAPI document.
pub fn load_document(path: &Path) -> Result<Document, CompilerError> {
    let text = std::fs::read_to_string(path).map_err(|e| CompilerError::io(path, e.to_string()))?;
    parse_document(&text, &path.display().to_string())
}
