//! Model naming collisions.

use std::collections::HashMap;

use crate::diagnostic::CompilerError;
use crate::ir::naming::is_reserved;
use crate::ir::{resolve_model_info, Document, ModelInfo};

/// Fails when two schemas would be declared under the same name in the same file.
pub fn check_model_names(document: &Document) -> Result<(), CompilerError> {
    let mut seen: HashMap<ModelInfo, &str> = HashMap::new();

    for key in document.components.schemas.keys() {
        if is_reserved(key) {
            continue;
        }
        let info = resolve_model_info(key);
        if let Some(first) = seen.get(&info) {
            return Err(CompilerError::NamingCollision {
                name: info.name,
                path: info.path,
                first: first.to_string(),
                second: key.clone(),
            });
        }
        seen.insert(info, key);
    }
    Ok(())
}
