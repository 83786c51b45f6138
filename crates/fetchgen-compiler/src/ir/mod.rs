//! Language-agnostic intermediate representation.
//!
//! The parsed OpenAPI document, the naming and classification rules applied
//! to its schemas, and the aggregate definitions derived from its operations.
//! Everything here is consumed read-only by the code generators.

pub mod aggregate;
pub mod document;
pub mod naming;
pub mod schema;

pub use aggregate::{
    AggregateDefinition, ApiTagDefinition, BoundedContexts, CommandDefinition, EventDefinition,
    OperationDefinition, ParameterDefinition, ResourceAttribution,
};
pub use document::{
    AdditionalProperties, Document, HttpMethod, MediaType, Operation, Parameter,
    ParameterLocation, PathItem, RefOr, RequestBody, Response, Schema, SchemaType, Tag,
};
pub use naming::{referenced_model_info, resolve_model_info, ModelInfo};
pub use schema::{CompositionKind, SchemaKind};
