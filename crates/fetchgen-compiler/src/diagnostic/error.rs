//! Compiler error types.
#![allow(unused_assignments)]

use std::path::PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur during generation.
#[allow(unused_assignments)]
#[derive(Error, Diagnostic, Debug)]
pub enum CompilerError {
    // =========================================================================
    // Input Errors
    // =========================================================================
    #[error("Failed to access '{}': {message}", path.display())]
    #[diagnostic(code(fetchgen::io::access_failed))]
    IoError {
        path: PathBuf,
        message: String,
    },

    #[error("Invalid input '{input}': expected an http(s) URL or a file path")]
    #[diagnostic(
        code(fetchgen::input::invalid),
        help("Pass --input with a local OpenAPI file or an http(s) URL")
    )]
    InvalidInput {
        input: String,
    },

    #[error("Failed to fetch '{url}': {message}")]
    #[diagnostic(code(fetchgen::input::fetch_failed))]
    FetchFailed {
        url: String,
        message: String,
    },

    #[error("Failed to parse '{source_name}': {message}")]
    #[diagnostic(
        code(fetchgen::input::parse_failed),
        help("The document must be valid JSON or YAML")
    )]
    ParseFailed {
        source_name: String,
        message: String,
    },

    #[error("Invalid generator config '{}': {message}", path.display())]
    #[diagnostic(code(fetchgen::config::invalid))]
    InvalidConfig {
        path: PathBuf,
        message: String,
    },

    // =========================================================================
    // Schema Resolution Errors
    // =========================================================================
    #[error("Unresolved reference '{reference}' in {referrer}")]
    #[diagnostic(
        code(fetchgen::schema::unresolved_reference),
        help("Every $ref must point at an entry of the document's components")
    )]
    UnresolvedReference {
        reference: String,
        referrer: String,
    },

    #[error("Schemas '{first}' and '{second}' both resolve to '{name}' in '{path}'")]
    #[diagnostic(
        code(fetchgen::schema::naming_collision),
        help("Rename one of the schemas so their generated names differ")
    )]
    NamingCollision {
        name: String,
        path: String,
        first: String,
        second: String,
    },

    #[error("Cyclic inline schema in {referrer} (nesting deeper than {depth})")]
    #[diagnostic(
        code(fetchgen::schema::cyclic),
        help("Replace the recursive inline object with a $ref to a component schema")
    )]
    CyclicSchema {
        referrer: String,
        depth: usize,
    },
}

impl CompilerError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::IoError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an unresolved reference error.
    pub fn unresolved(reference: impl Into<String>, referrer: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            reference: reference.into(),
            referrer: referrer.into(),
        }
    }

    /// Whether this error was caused by the user's input rather than by generation.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}
