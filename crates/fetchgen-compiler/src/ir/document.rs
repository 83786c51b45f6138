//! OpenAPI document model.
//!
//! Only the subset of OpenAPI 3 the generators read is modelled. Maps keep
//! document order so generated output follows the order of the source.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::diagnostic::CompilerError;

/// Prefix of every component schema pointer.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";
const PARAMETER_REF_PREFIX: &str = "#/components/parameters/";
const REQUEST_BODY_REF_PREFIX: &str = "#/components/requestBodies/";
const RESPONSE_REF_PREFIX: &str = "#/components/responses/";

/// Extension carrying the bounded-context alias.
pub const CONTEXT_ALIAS_EXTENSION: &str = "x-wow-context-alias";

/// OpenAPI document root.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub openapi: String,

    #[serde(default)]
    pub info: Info,

    #[serde(default)]
    pub tags: Vec<Tag>,

    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,

    #[serde(default)]
    pub components: Components,

    #[serde(rename = "x-wow-context-alias", default)]
    pub context_alias: Option<String>,
}

/// API metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "x-wow-context-alias", default)]
    pub context_alias: Option<String>,
}

/// A tag used to group operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Tag {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Either a `$ref` pointer or an inline item.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    Reference {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Item(T),
}

/// Operations available on a single path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub get: Option<Operation>,
    #[serde(default)]
    pub put: Option<Operation>,
    #[serde(default)]
    pub post: Option<Operation>,
    #[serde(default)]
    pub delete: Option<Operation>,
    #[serde(default)]
    pub patch: Option<Operation>,
    #[serde(default)]
    pub head: Option<Operation>,
    #[serde(default)]
    pub options: Option<Operation>,

    /// Parameters shared by every operation on this path.
    #[serde(default)]
    pub parameters: Vec<RefOr<Parameter>>,
}

impl PathItem {
    /// Operations of this path in a fixed method order.
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> {
        [
            (HttpMethod::Get, &self.get),
            (HttpMethod::Put, &self.put),
            (HttpMethod::Post, &self.post),
            (HttpMethod::Delete, &self.delete),
            (HttpMethod::Patch, &self.patch),
            (HttpMethod::Head, &self.head),
            (HttpMethod::Options, &self.options),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
    }
}

/// HTTP method of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    /// Lowercase method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
        }
    }

    /// Name of the method decorator exported by the fetch runtime.
    ///
    /// `delete` is a reserved word in TypeScript, so the runtime exports `del`.
    pub fn decorator(&self) -> &'static str {
        match self {
            HttpMethod::Delete => "del",
            other => other.as_str(),
        }
    }

    /// Whether requests with this method may carry a command.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Delete | HttpMethod::Patch
        )
    }
}

/// A single API operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
    #[serde(rename = "operationId", default)]
    pub operation_id: Option<String>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub parameters: Vec<RefOr<Parameter>>,

    #[serde(rename = "requestBody", default)]
    pub request_body: Option<RefOr<RequestBody>>,

    #[serde(default)]
    pub responses: IndexMap<String, RefOr<Response>>,

    #[serde(default)]
    pub deprecated: bool,
}

/// Where a parameter is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

/// An operation parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParameterLocation,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub schema: Option<Schema>,
}

/// A request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

/// A response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

/// Content for one media type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaType {
    #[serde(default)]
    pub schema: Option<Schema>,
}

/// Reusable components.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, Schema>,

    #[serde(default)]
    pub parameters: IndexMap<String, Parameter>,

    #[serde(rename = "requestBodies", default)]
    pub request_bodies: IndexMap<String, RequestBody>,

    #[serde(default)]
    pub responses: IndexMap<String, Response>,
}

/// A JSON schema node.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Schema {
    #[serde(rename = "$ref", default)]
    pub reference: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "type", default)]
    pub schema_type: Option<SchemaType>,

    #[serde(default)]
    pub format: Option<String>,

    #[serde(rename = "enum", default)]
    pub enum_values: Option<Vec<Value>>,

    #[serde(rename = "const", default)]
    pub const_value: Option<Value>,

    #[serde(default)]
    pub properties: Option<IndexMap<String, Schema>>,

    #[serde(default)]
    pub required: Vec<String>,

    #[serde(rename = "additionalProperties", default)]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(default)]
    pub items: Option<Box<Schema>>,

    #[serde(rename = "allOf", default)]
    pub all_of: Option<Vec<Schema>>,

    #[serde(rename = "anyOf", default)]
    pub any_of: Option<Vec<Schema>>,

    #[serde(rename = "oneOf", default)]
    pub one_of: Option<Vec<Schema>>,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default)]
    pub deprecated: bool,
}

impl Schema {
    /// Creates a `$ref` schema pointing at a component schema key.
    pub fn reference_to(key: &str) -> Self {
        Self {
            reference: Some(format!("{}{}", SCHEMA_REF_PREFIX, key)),
            ..Default::default()
        }
    }

    /// Component schema key this schema points at, if it is a component `$ref`.
    pub fn referenced_key(&self) -> Option<&str> {
        self.reference.as_deref().and_then(schema_key_of)
    }
}

/// `type` keyword: a single type name or a list of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

impl SchemaType {
    /// All type names in declaration order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            SchemaType::Single(name) => vec![name.as_str()],
            SchemaType::Multiple(names) => names.iter().map(String::as_str).collect(),
        }
    }

    /// Whether this is exactly the given single type.
    pub fn is(&self, name: &str) -> bool {
        matches!(self, SchemaType::Single(n) if n == name)
    }
}

/// `additionalProperties` keyword.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<Schema>),
}

/// Strips the component prefix from a schema pointer.
pub fn schema_key_of(reference: &str) -> Option<&str> {
    reference.strip_prefix(SCHEMA_REF_PREFIX)
}

impl Document {
    /// Bounded-context alias, from the document root or `info`.
    pub fn context_alias(&self) -> Option<&str> {
        self.context_alias
            .as_deref()
            .or(self.info.context_alias.as_deref())
            .map(str::trim)
            .filter(|alias| !alias.is_empty())
    }

    /// Looks up a component schema by key.
    pub fn schema(&self, key: &str) -> Option<&Schema> {
        self.components.schemas.get(key)
    }

    /// Resolves a component schema pointer to its key and body.
    pub fn resolve_schema_ref<'a>(
        &'a self,
        reference: &'a str,
        referrer: &str,
    ) -> Result<(&'a str, &'a Schema), CompilerError> {
        let key = schema_key_of(reference)
            .ok_or_else(|| CompilerError::unresolved(reference, referrer))?;
        let schema = self
            .schema(key)
            .ok_or_else(|| CompilerError::unresolved(reference, referrer))?;
        Ok((key, schema))
    }

    /// Resolves a parameter or its `$ref`.
    pub fn parameter<'a>(
        &'a self,
        item: &'a RefOr<Parameter>,
        referrer: &str,
    ) -> Result<&'a Parameter, CompilerError> {
        resolve_component(&self.components.parameters, PARAMETER_REF_PREFIX, item, referrer)
    }

    /// Resolves a request body or its `$ref`.
    pub fn request_body<'a>(
        &'a self,
        item: &'a RefOr<RequestBody>,
        referrer: &str,
    ) -> Result<&'a RequestBody, CompilerError> {
        resolve_component(&self.components.request_bodies, REQUEST_BODY_REF_PREFIX, item, referrer)
    }

    /// Resolves a response or its `$ref`.
    pub fn response<'a>(
        &'a self,
        item: &'a RefOr<Response>,
        referrer: &str,
    ) -> Result<&'a Response, CompilerError> {
        resolve_component(&self.components.responses, RESPONSE_REF_PREFIX, item, referrer)
    }

    /// Every operation in document order.
    pub fn operations(&self) -> impl Iterator<Item = (&str, HttpMethod, &PathItem, &Operation)> {
        self.paths.iter().flat_map(|(path, item)| {
            item.operations()
                .map(move |(method, op)| (path.as_str(), method, item, op))
        })
    }

    /// Tag descriptor for a tag name; tags only used on operations get a bare descriptor.
    pub fn tag(&self, name: &str) -> Tag {
        self.tags
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .unwrap_or_else(|| Tag {
                name: name.to_string(),
                description: None,
            })
    }
}

fn resolve_component<'a, T>(
    components: &'a IndexMap<String, T>,
    prefix: &str,
    item: &'a RefOr<T>,
    referrer: &str,
) -> Result<&'a T, CompilerError> {
    match item {
        RefOr::Item(value) => Ok(value),
        RefOr::Reference { reference } => reference
            .strip_prefix(prefix)
            .and_then(|key| components.get(key))
            .ok_or_else(|| CompilerError::unresolved(reference.as_str(), referrer)),
    }
}
