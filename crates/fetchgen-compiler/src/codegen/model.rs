//! Model declarations for component schemas.
//!
//! Every non-reserved schema key yields exactly one declaration in
//! `<path>/types.ts`: an enum, an interface, an interface extending a
//! referenced model, or a type alias. Inline object properties of interfaces
//! are lifted into their own interfaces named after the parent.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::diagnostic::CompilerError;
use crate::ir::naming::is_reserved;
use crate::ir::schema::{enum_members, is_enum, is_object, is_union};
use crate::ir::{
    resolve_model_info, AdditionalProperties, Document, ModelInfo, Schema, SchemaKind,
};

use super::source::{
    doc_lines, model_file_path, Declaration, EnumDecl, ImportScope, InterfaceDecl, PropertyDecl,
    TypeAliasDecl,
};
use super::ts_types::{enum_member_name, string_literal, to_pascal_case, with_null, ANY_TYPE};
use super::type_resolver::MAX_INLINE_DEPTH;
use super::{GenerateContext, GenerationReport, Generator, Project};

/// Emits one declaration per component schema.
pub struct ModelGenerator;

impl Generator for ModelGenerator {
    fn name(&self) -> &'static str {
        "models"
    }

    fn generate(
        &self,
        ctx: &GenerateContext<'_>,
        project: &mut Project,
        report: &mut GenerationReport,
    ) -> Result<(), CompilerError> {
        let mut owners = declared_names(ctx);

        for (key, schema) in &ctx.document.components.schemas {
            if is_reserved(key) {
                debug!(schema = %key, "reserved schema not generated");
                continue;
            }

            let info = resolve_model_info(key);
            let path = model_file_path(&info.path);
            let mut builder = ModelBuilder {
                ctx,
                key,
                imports: ImportScope::for_file(&path),
                owners: &mut owners,
                declarations: Vec::new(),
            };

            match builder.declare(&info, schema) {
                Ok(()) => {
                    let ModelBuilder {
                        imports,
                        declarations,
                        ..
                    } = builder;
                    let file = project.file(&path);
                    file.merge_imports(imports);
                    for declaration in declarations {
                        file.add_declaration(declaration);
                    }
                    report.models += 1;
                    debug!(schema = %key, name = %info.name, file = %path, "model");
                }
                Err(err @ CompilerError::NamingCollision { .. }) => return Err(err),
                Err(err) => {
                    warn!(schema = %key, error = %err, "skipping schema");
                    report.skip(key.clone(), &err);
                }
            }
        }
        Ok(())
    }
}

/// Every `(path, name)` claimed by a generated schema, mapped to its key.
fn declared_names(ctx: &GenerateContext<'_>) -> HashMap<ModelInfo, String> {
    ctx.document
        .components
        .schemas
        .keys()
        .filter(|key| !is_reserved(key))
        .map(|key| (resolve_model_info(key), key.clone()))
        .collect()
}

/// Builds the declarations of one schema, holding its imports until it succeeds.
struct ModelBuilder<'c, 'a> {
    ctx: &'c GenerateContext<'a>,
    key: &'c str,
    imports: ImportScope,
    owners: &'c mut HashMap<ModelInfo, String>,
    declarations: Vec<Declaration>,
}

impl ModelBuilder<'_, '_> {
    fn declare(&mut self, info: &ModelInfo, schema: &Schema) -> Result<(), CompilerError> {
        let docs = schema_docs(schema);

        if is_enum(schema) {
            self.declarations
                .push(Declaration::Enum(enum_declaration(&info.name, docs, schema)));
            return Ok(());
        }

        if is_object(schema) {
            let interface = self.interface(info, schema, docs, Vec::new(), 0)?;
            self.declarations.push(Declaration::Interface(interface));
            return Ok(());
        }

        if let Some((parent, own)) = extends_pattern(schema) {
            let (parent_key, parent_schema) =
                self.ctx.document.resolve_schema_ref(parent, self.key)?;
            if is_object_like(self.ctx.document, parent_schema, 0) {
                let parent = self
                    .ctx
                    .resolver
                    .resolve_reference(parent, self.key, &mut self.imports)?;
                let interface = self.interface(info, own, docs, vec![parent], 0)?;
                self.declarations.push(Declaration::Interface(interface));
                return Ok(());
            }
            debug!(
                schema = %self.key,
                parent = parent_key,
                "parent is not an object type, using an alias"
            );
        }

        let type_expr = self.ctx.resolver.resolve(schema, self.key, &mut self.imports)?;
        self.declarations.push(Declaration::TypeAlias(TypeAliasDecl {
            name: info.name.clone(),
            docs,
            type_expr,
        }));
        Ok(())
    }

    /// Interface for an object schema; nested inline objects become sibling interfaces.
    fn interface(
        &mut self,
        info: &ModelInfo,
        schema: &Schema,
        docs: Vec<String>,
        extends: Vec<String>,
        depth: usize,
    ) -> Result<InterfaceDecl, CompilerError> {
        if depth > MAX_INLINE_DEPTH {
            return Err(CompilerError::CyclicSchema {
                referrer: self.key.to_string(),
                depth: MAX_INLINE_DEPTH,
            });
        }

        let mut properties = Vec::new();
        for (name, property) in schema.properties.iter().flatten() {
            let type_expr = if is_liftable(property) {
                let lifted = ModelInfo::new(
                    format!("{}{}", info.name, to_pascal_case(name)),
                    info.path.clone(),
                );
                self.claim(&lifted, name)?;
                let nested =
                    self.interface(&lifted, property, schema_docs(property), Vec::new(), depth + 1)?;
                self.declarations.push(Declaration::Interface(nested));
                if property.nullable {
                    with_null(&lifted.name)
                } else {
                    lifted.name
                }
            } else {
                self.ctx.resolver.resolve(property, self.key, &mut self.imports)?
            };

            let mut docs = schema_docs(property);
            if property.deprecated {
                docs.push("@deprecated".to_string());
            }
            properties.push(PropertyDecl {
                name: name.clone(),
                type_expr,
                optional: !schema.required.contains(name),
                docs,
            });
        }

        let index_signature = match &schema.additional_properties {
            Some(AdditionalProperties::Schema(values)) => {
                Some(self.ctx.resolver.resolve(values, self.key, &mut self.imports)?)
            }
            Some(AdditionalProperties::Bool(true)) => Some(ANY_TYPE.to_string()),
            _ => None,
        };

        Ok(InterfaceDecl {
            name: info.name.clone(),
            docs,
            extends,
            properties,
            index_signature,
        })
    }

    /// Reserves a lifted type name, failing if a schema or another lift already owns it.
    fn claim(&mut self, lifted: &ModelInfo, property: &str) -> Result<(), CompilerError> {
        let owner = format!("{}#{}", self.key, property);
        if let Some(existing) = self.owners.get(lifted) {
            if *existing != owner {
                return Err(CompilerError::NamingCollision {
                    name: lifted.name.clone(),
                    path: lifted.path.clone(),
                    first: existing.clone(),
                    second: owner,
                });
            }
        }
        self.owners.insert(lifted.clone(), owner);
        Ok(())
    }
}

fn enum_declaration(name: &str, docs: Vec<String>, schema: &Schema) -> EnumDecl {
    let mut members: Vec<(String, String)> = Vec::new();
    for value in enum_members(schema) {
        let ident = enum_member_name(value);
        if members.iter().any(|(existing, _)| *existing == ident) {
            warn!(name, value, "duplicate enum member name dropped");
            continue;
        }
        members.push((ident, string_literal(value)));
    }
    EnumDecl {
        name: name.to_string(),
        docs,
        members,
    }
}

/// `allOf` of exactly one `$ref` and one inline object, in either order.
fn extends_pattern(schema: &Schema) -> Option<(&str, &Schema)> {
    match schema.all_of.as_deref()? {
        [a, b] => match (a.reference.as_deref(), b.reference.as_deref()) {
            (Some(parent), None) if is_object(b) => Some((parent, b)),
            (None, Some(parent)) if is_object(a) => Some((parent, a)),
            _ => None,
        },
        _ => None,
    }
}

/// Whether an interface may extend the type declared for `schema`.
fn is_object_like(document: &Document, schema: &Schema, depth: usize) -> bool {
    if depth > MAX_INLINE_DEPTH {
        return false;
    }
    if let Some(key) = schema.referenced_key() {
        return document
            .schema(key)
            .is_some_and(|target| is_object_like(document, target, depth + 1));
    }
    if is_object(schema) {
        return true;
    }
    match schema.all_of.as_deref() {
        Some(members) if !members.is_empty() && !is_union(schema) => members
            .iter()
            .all(|member| is_object_like(document, member, depth + 1)),
        _ => false,
    }
}

/// Inline object property that gets its own interface.
fn is_liftable(schema: &Schema) -> bool {
    matches!(SchemaKind::of(schema), SchemaKind::Object(properties) if !properties.is_empty())
}

fn schema_docs(schema: &Schema) -> Vec<String> {
    doc_lines(schema.title.as_deref(), schema.description.as_deref())
}
