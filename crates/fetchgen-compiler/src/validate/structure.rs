//! Structure checks on the resolved aggregates and API tags.
//!
//! Client files are named from tag names, so two tags that only differ in
//! punctuation would write the same file. Aggregates missing their state
//! schema still generate, with `any` as the state type.

use std::collections::HashMap;

use tracing::warn;

use crate::codegen::api_client::api_client_path;
use crate::codegen::ts_types::to_pascal_case;
use crate::diagnostic::CompilerError;
use crate::frontend::Resolution;
use crate::ir::Document;

/// Validates the shape of a resolution.
pub fn check_structure(document: &Document, resolution: &Resolution) -> Result<(), CompilerError> {
    check_api_client_names(document, resolution)?;

    for aggregate in resolution.aggregates() {
        if aggregate.state.is_none() {
            warn!(
                aggregate = %aggregate.tag.name,
                "no state schema found, state type falls back to any"
            );
        }
        if aggregate.commands.is_empty() && aggregate.queries.is_empty() {
            warn!(aggregate = %aggregate.tag.name, "aggregate has no commands or queries");
        }
    }
    Ok(())
}

/// Fails when two API tags map to the same client class.
fn check_api_client_names(document: &Document, resolution: &Resolution) -> Result<(), CompilerError> {
    let mut seen: HashMap<String, &str> = HashMap::new();

    for api_tag in &resolution.api_tags {
        let class_prefix = to_pascal_case(&api_tag.tag.name);
        let path = api_client_path(document.context_alias(), &class_prefix);
        if let Some(first) = seen.get(&path) {
            return Err(CompilerError::NamingCollision {
                name: format!("{}ApiClient", class_prefix),
                path,
                first: first.to_string(),
                second: api_tag.tag.name.clone(),
            });
        }
        seen.insert(path, &api_tag.tag.name);
    }
    Ok(())
}
