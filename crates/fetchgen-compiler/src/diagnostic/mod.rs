//! Diagnostic reporting for the compiler.

mod error;

pub use error::CompilerError;

/// Something left out of the output because it could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// Schema key or operation identifier.
    pub item: String,
    /// Rendered error explaining why.
    pub reason: String,
}

impl Skipped {
    pub fn new(item: impl Into<String>, error: &CompilerError) -> Self {
        Self {
            item: item.into(),
            reason: error.to_string(),
        }
    }
}
