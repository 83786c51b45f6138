//! Schema classification.
//!
//! The predicates look only at the shape of a node. [`SchemaKind::of`]
//! assigns exactly one variant per node; the order of its checks is the
//! precedence every resolver relies on.

use indexmap::IndexMap;
use serde_json::Value;

use super::document::{AdditionalProperties, Schema};

/// JSON schema type names that map directly onto TypeScript primitives.
pub const PRIMITIVE_TYPES: &[&str] = &["string", "number", "integer", "boolean", "null"];

/// Which composition keyword a node uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionKind {
    AllOf,
    AnyOf,
    OneOf,
}

impl CompositionKind {
    /// TypeScript operator joining the members.
    pub fn separator(&self) -> &'static str {
        match self {
            CompositionKind::AllOf => " & ",
            CompositionKind::AnyOf | CompositionKind::OneOf => " | ",
        }
    }
}

/// The single classification of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind<'a> {
    /// `$ref` pointer.
    Reference(&'a str),
    /// Free-form map; `None` means values of any type.
    Map(Option<&'a Schema>),
    /// `const` literal.
    Const(&'a Value),
    /// String enum, already filtered to usable members.
    Enum(Vec<&'a str>),
    /// `allOf`/`anyOf`/`oneOf` with at least one member.
    Composition(CompositionKind, &'a [Schema]),
    /// `type: array`; `None` when `items` is missing.
    Array(Option<&'a Schema>),
    /// Object with declared properties (possibly empty).
    Object(&'a IndexMap<String, Schema>),
    /// One or more primitive type names.
    Primitive(Vec<&'a str>),
    /// Nothing usable; resolves to the dynamic type.
    Unknown,
}

impl<'a> SchemaKind<'a> {
    /// Classifies a node. First match wins.
    pub fn of(schema: &'a Schema) -> Self {
        if let Some(reference) = schema.reference.as_deref() {
            return SchemaKind::Reference(reference);
        }
        if is_map(schema) {
            let values = match &schema.additional_properties {
                Some(AdditionalProperties::Schema(inner)) => Some(inner.as_ref()),
                _ => None,
            };
            return SchemaKind::Map(values);
        }
        if let Some(value) = schema.const_value.as_ref() {
            return SchemaKind::Const(value);
        }
        if is_enum(schema) {
            return SchemaKind::Enum(enum_members(schema));
        }
        if let Some((kind, members)) = composition(schema) {
            return SchemaKind::Composition(kind, members);
        }
        if is_array(schema) {
            return SchemaKind::Array(schema.items.as_deref());
        }
        if let Some(properties) = schema.properties.as_ref() {
            return SchemaKind::Object(properties);
        }
        if is_primitive(schema) {
            let names = schema
                .schema_type
                .as_ref()
                .map(|t| t.names())
                .unwrap_or_default();
            return SchemaKind::Primitive(names);
        }
        SchemaKind::Unknown
    }
}

/// `$ref` present.
pub fn is_reference(schema: &Schema) -> bool {
    schema.reference.is_some()
}

/// `enum` with at least one usable member (see [`enum_members`]).
pub fn is_enum(schema: &Schema) -> bool {
    !enum_members(schema).is_empty()
}

/// Declares `properties` (an empty map still counts).
pub fn is_object(schema: &Schema) -> bool {
    schema.properties.is_some()
}

/// `type: array`.
pub fn is_array(schema: &Schema) -> bool {
    schema.schema_type.as_ref().is_some_and(|t| t.is("array"))
}

/// `additionalProperties` other than `false`, without `properties`.
pub fn is_map(schema: &Schema) -> bool {
    schema.properties.is_none()
        && matches!(
            schema.additional_properties,
            Some(AdditionalProperties::Bool(true)) | Some(AdditionalProperties::Schema(_))
        )
}

/// Non-empty `allOf`.
pub fn is_all_of(schema: &Schema) -> bool {
    non_empty(&schema.all_of)
}

/// Non-empty `anyOf` or `oneOf`.
pub fn is_union(schema: &Schema) -> bool {
    non_empty(&schema.any_of) || non_empty(&schema.one_of)
}

/// Any non-empty composition keyword.
pub fn is_composition(schema: &Schema) -> bool {
    is_all_of(schema) || is_union(schema)
}

/// Every declared type name is a primitive.
pub fn is_primitive(schema: &Schema) -> bool {
    schema.schema_type.as_ref().is_some_and(|t| {
        let names = t.names();
        !names.is_empty() && names.iter().all(|n| PRIMITIVE_TYPES.contains(n))
    })
}

/// String enum members in declaration order, skipping non-strings and empty strings.
pub fn enum_members(schema: &Schema) -> Vec<&str> {
    schema
        .enum_values
        .iter()
        .flatten()
        .filter_map(Value::as_str)
        .filter(|s| !s.is_empty())
        .collect()
}

/// The composition keyword in use and its members; `allOf` wins over `anyOf` over `oneOf`.
pub fn composition(schema: &Schema) -> Option<(CompositionKind, &[Schema])> {
    [
        (CompositionKind::AllOf, &schema.all_of),
        (CompositionKind::AnyOf, &schema.any_of),
        (CompositionKind::OneOf, &schema.one_of),
    ]
    .into_iter()
    .find_map(|(kind, members)| {
        members
            .as_deref()
            .filter(|m| !m.is_empty())
            .map(|m| (kind, m))
    })
}

fn non_empty(members: &Option<Vec<Schema>>) -> bool {
    members.as_ref().is_some_and(|m| !m.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: Value) -> Schema {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn enum_requires_a_string_member() {
        assert!(!is_enum(&schema(json!({ "enum": [] }))));
        assert!(is_enum(&schema(json!({ "enum": ["a"] }))));
        assert!(!is_enum(&schema(json!({ "enum": [1, 2] }))));
        assert!(!is_enum(&schema(json!({ "enum": ["", null] }))));
        assert!(matches!(
            SchemaKind::of(&schema(json!({ "type": "string", "enum": [""] }))),
            SchemaKind::Primitive(_)
        ));
    }

    #[test]
    fn enum_members_filter_and_keep_order() {
        let s = schema(json!({ "enum": ["B", 3, "", "A", null, "C"] }));
        assert_eq!(enum_members(&s), vec!["B", "A", "C"]);
    }

    #[test]
    fn empty_compositions_do_not_count() {
        assert!(!is_composition(&schema(json!({ "allOf": [] }))));
        assert!(is_all_of(&schema(json!({ "allOf": [{ "type": "string" }] }))));
        assert!(is_union(&schema(json!({ "oneOf": [{ "type": "string" }] }))));
        assert!(is_union(&schema(json!({ "anyOf": [{ "type": "string" }] }))));
    }

    #[test]
    fn map_requires_no_properties_and_truthy_additional() {
        assert!(is_map(&schema(json!({ "type": "object", "additionalProperties": true }))));
        assert!(is_map(&schema(json!({ "additionalProperties": { "type": "string" } }))));
        assert!(!is_map(&schema(json!({ "additionalProperties": false }))));
        assert!(!is_map(&schema(json!({
            "properties": { "a": {} },
            "additionalProperties": true
        }))));
    }

    #[test]
    fn primitive_detection() {
        assert!(is_primitive(&schema(json!({ "type": "integer" }))));
        assert!(is_primitive(&schema(json!({ "type": ["string", "null"] }))));
        assert!(!is_primitive(&schema(json!({ "type": "object" }))));
        assert!(!is_primitive(&schema(json!({}))));
    }

    #[test]
    fn reference_wins_over_everything() {
        let s = schema(json!({
            "$ref": "#/components/schemas/a.B",
            "type": "object",
            "properties": {}
        }));
        assert!(matches!(SchemaKind::of(&s), SchemaKind::Reference(_)));
    }

    #[test]
    fn map_precedes_const_and_enum() {
        let s = schema(json!({ "additionalProperties": true, "enum": ["A"] }));
        assert_eq!(SchemaKind::of(&s), SchemaKind::Map(None));
    }

    #[test]
    fn composition_precedes_object_and_array() {
        let s = schema(json!({
            "type": "array",
            "properties": { "a": {} },
            "oneOf": [{ "type": "string" }]
        }));
        assert!(matches!(
            SchemaKind::of(&s),
            SchemaKind::Composition(CompositionKind::OneOf, _)
        ));
    }

    #[test]
    fn array_precedes_object() {
        let s = schema(json!({ "type": "array", "properties": {} }));
        assert_eq!(SchemaKind::of(&s), SchemaKind::Array(None));
    }

    #[test]
    fn empty_enum_falls_through_to_primitive() {
        let s = schema(json!({ "type": "string", "enum": [] }));
        assert_eq!(SchemaKind::of(&s), SchemaKind::Primitive(vec!["string"]));
    }

    #[test]
    fn unknown_shapes() {
        assert_eq!(SchemaKind::of(&schema(json!({}))), SchemaKind::Unknown);
        assert_eq!(
            SchemaKind::of(&schema(json!({ "type": "object" }))),
            SchemaKind::Unknown
        );
    }
}
