//! Checks run on the resolved document before any code is generated.

mod naming;
mod structure;

pub use naming::check_model_names;
pub use structure::check_structure;

use crate::diagnostic::CompilerError;
use crate::frontend::Resolution;
use crate::ir::Document;

/// Validates a document and its resolution.
pub fn validate(document: &Document, resolution: &Resolution) -> Result<(), CompilerError> {
    check_model_names(document)?;
    check_structure(document, resolution)?;
    Ok(())
}
