//! Schema to TypeScript type-expression resolution.
//!
//! References resolve to the target's declared name only; the target body is
//! never expanded, so reference cycles of any shape terminate. Literal inline
//! recursion is bounded by [`MAX_INLINE_DEPTH`].

use tracing::trace;

use crate::diagnostic::CompilerError;
use crate::ir::{referenced_model_info, AdditionalProperties, Document, Schema, SchemaKind};

use super::source::ImportScope;
use super::ts_types::{
    join_types, literal_type, property_key, string_literal, to_array_type, with_null, ANY_TYPE,
    EMPTY_OBJECT_TYPE,
};

/// Deepest inline nesting accepted before a schema is treated as cyclic.
pub const MAX_INLINE_DEPTH: usize = 64;

/// Resolves schema nodes of one document into type expressions.
#[derive(Debug, Clone, Copy)]
pub struct TypeResolver<'a> {
    document: &'a Document,
}

impl<'a> TypeResolver<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Resolves `schema` to a type expression.
    ///
    /// `referrer` names the declaration being generated and only appears in
    /// errors. Any cross-file type the expression uses is added to `imports`.
    pub fn resolve(
        &self,
        schema: &Schema,
        referrer: &str,
        imports: &mut ImportScope,
    ) -> Result<String, CompilerError> {
        self.resolve_at(schema, referrer, imports, 0)
    }

    /// Resolves a component `$ref` to the referenced type name.
    pub fn resolve_reference(
        &self,
        reference: &str,
        referrer: &str,
        imports: &mut ImportScope,
    ) -> Result<String, CompilerError> {
        let (key, _) = self.document.resolve_schema_ref(reference, referrer)?;
        let info = referenced_model_info(key);
        trace!(reference = key, name = %info.name, "resolved reference");
        imports.add_model(&info);
        Ok(info.name)
    }

    /// Resolves one level deeper, failing once the nesting limit is exceeded.
    pub(crate) fn resolve_nested(
        &self,
        schema: &Schema,
        referrer: &str,
        imports: &mut ImportScope,
        depth: usize,
    ) -> Result<String, CompilerError> {
        self.resolve_at(schema, referrer, imports, depth + 1)
    }

    fn resolve_at(
        &self,
        schema: &Schema,
        referrer: &str,
        imports: &mut ImportScope,
        depth: usize,
    ) -> Result<String, CompilerError> {
        if depth > MAX_INLINE_DEPTH {
            return Err(CompilerError::CyclicSchema {
                referrer: referrer.to_string(),
                depth: MAX_INLINE_DEPTH,
            });
        }

        let resolved = match SchemaKind::of(schema) {
            SchemaKind::Reference(reference) => {
                self.resolve_reference(reference, referrer, imports)?
            }
            SchemaKind::Map(values) => {
                let value = match values {
                    Some(values) => self.resolve_nested(values, referrer, imports, depth)?,
                    None => ANY_TYPE.to_string(),
                };
                format!("Record<string, {}>", value)
            }
            SchemaKind::Const(value) => literal_type(value),
            SchemaKind::Enum(members) => members
                .iter()
                .map(|m| string_literal(m))
                .collect::<Vec<_>>()
                .join(" | "),
            SchemaKind::Composition(kind, members) => {
                let types = members
                    .iter()
                    .map(|m| self.resolve_nested(m, referrer, imports, depth))
                    .collect::<Result<Vec<_>, _>>()?;
                join_types(&types, kind.separator())
            }
            SchemaKind::Array(items) => {
                let element = match items {
                    Some(items) => self.resolve_nested(items, referrer, imports, depth)?,
                    None => ANY_TYPE.to_string(),
                };
                to_array_type(&element)
            }
            SchemaKind::Object(_) => self.inline_object(schema, referrer, imports, depth)?,
            SchemaKind::Primitive(names) => primitive_union(&names),
            SchemaKind::Unknown => ANY_TYPE.to_string(),
        };

        if schema.nullable {
            Ok(with_null(&resolved))
        } else {
            Ok(resolved)
        }
    }

    /// Structural type for an object schema resolved in place.
    fn inline_object(
        &self,
        schema: &Schema,
        referrer: &str,
        imports: &mut ImportScope,
        depth: usize,
    ) -> Result<String, CompilerError> {
        let mut members = Vec::new();
        for (name, property) in schema.properties.iter().flatten() {
            let ty = self.resolve_nested(property, referrer, imports, depth)?;
            let optional = !schema.required.contains(name);
            members.push(format!(
                "{}{}: {}",
                property_key(name),
                if optional { "?" } else { "" },
                ty
            ));
        }
        match &schema.additional_properties {
            Some(AdditionalProperties::Schema(values)) => {
                let value = self.resolve_nested(values, referrer, imports, depth)?;
                members.push(format!("[key: string]: {}", value));
            }
            Some(AdditionalProperties::Bool(true)) => {
                members.push(format!("[key: string]: {}", ANY_TYPE));
            }
            _ => {}
        }

        if members.is_empty() {
            Ok(EMPTY_OBJECT_TYPE.to_string())
        } else {
            Ok(format!("{{ {} }}", members.join("; ")))
        }
    }
}

/// Maps primitive type names to their TypeScript union.
fn primitive_union(names: &[&str]) -> String {
    let mut types: Vec<&str> = Vec::new();
    for name in names {
        let ty = match *name {
            "string" => "string",
            "number" | "integer" => "number",
            "boolean" => "boolean",
            "null" => "null",
            _ => ANY_TYPE,
        };
        if !types.contains(&ty) {
            types.push(ty);
        }
    }
    if types.is_empty() {
        ANY_TYPE.to_string()
    } else {
        types.join(" | ")
    }
}
