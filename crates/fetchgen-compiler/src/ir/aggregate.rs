//! Aggregate intermediate representation.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use super::document::{
    HttpMethod, ParameterLocation, RequestBody, Response, Schema, Tag,
};

/// Path prefix of tenant-scoped command routes.
pub const TENANT_PATH_PREFIX: &str = "/tenant/{tenantId}";

/// Path prefix of owner-scoped command routes.
pub const OWNER_PATH_PREFIX: &str = "/owner/{ownerId}";

/// Aggregates grouped by bounded context, both keyed by name.
pub type BoundedContexts = BTreeMap<String, BTreeMap<String, AggregateDefinition>>;

/// A parameter after `$ref` resolution.
#[derive(Debug, Clone)]
pub struct ParameterDefinition {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub description: Option<String>,
    pub schema: Option<Schema>,
}

/// An operation with all component references resolved.
#[derive(Debug, Clone)]
pub struct OperationDefinition {
    pub operation_id: Option<String>,
    pub method: HttpMethod,
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    /// Path-level parameters first, overridden by operation-level ones.
    pub parameters: Vec<ParameterDefinition>,
    pub request_body: Option<RequestBody>,
    pub responses: IndexMap<String, Response>,
    pub deprecated: bool,
}

impl OperationDefinition {
    /// Dot-delimited identifier used for method naming.
    ///
    /// Falls back to `<method>.<static path segments>` when the operation has no id.
    pub fn identifier(&self) -> String {
        if let Some(id) = self.operation_id.as_deref().filter(|id| !id.is_empty()) {
            return id.to_string();
        }
        std::iter::once(self.method.as_str())
            .chain(
                self.path
                    .split('/')
                    .filter(|s| !s.is_empty() && !s.starts_with('{')),
            )
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Parameters bound to the given location.
    pub fn parameters_in(
        &self,
        location: ParameterLocation,
    ) -> impl Iterator<Item = &ParameterDefinition> {
        self.parameters.iter().filter(move |p| p.location == location)
    }
}

/// A command accepted by an aggregate.
#[derive(Debug, Clone)]
pub struct CommandDefinition {
    /// Model name of the command body (e.g. `CreateOrder`).
    pub name: String,
    /// Component key of the command body schema.
    pub schema_key: String,
    /// Operation the client method is generated from.
    pub operation: OperationDefinition,
    /// Every route accepting this command, in document order.
    pub paths: Vec<String>,
    /// Whether the body is sent as `multipart/form-data`.
    pub multipart: bool,
}

/// A domain event emitted by an aggregate.
#[derive(Debug, Clone)]
pub struct EventDefinition {
    /// Model name of the event body.
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub schema_key: String,
    pub schema: Schema,
}

/// Everything known about one aggregate of one bounded context.
#[derive(Debug, Clone)]
pub struct AggregateDefinition {
    /// Bounded context name (first tag segment).
    pub context: String,
    /// Aggregate name (second tag segment).
    pub aggregate_name: String,
    pub tag: Tag,
    pub commands: Vec<CommandDefinition>,
    pub queries: Vec<OperationDefinition>,
    pub events: Vec<EventDefinition>,
    /// Component key of the aggregate state schema.
    pub state: Option<String>,
    /// Component key of the aggregated field enumeration.
    pub fields: Option<String>,
}

impl AggregateDefinition {
    /// Resource attribution voted over every command path.
    pub fn resource_attribution(&self) -> ResourceAttribution {
        ResourceAttribution::infer(
            self.commands
                .iter()
                .flat_map(|c| c.paths.iter().map(String::as_str)),
        )
    }
}

/// Operations of one non-aggregate tag.
#[derive(Debug, Clone)]
pub struct ApiTagDefinition {
    pub tag: Tag,
    pub operations: Vec<OperationDefinition>,
}

/// How command routes are scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceAttribution {
    None,
    Tenant,
    Owner,
}

impl ResourceAttribution {
    /// Majority vote over path prefixes. Ties go to `Owner`; no votes is `None`.
    pub fn infer<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let (tenant, owner) = paths.into_iter().fold((0usize, 0usize), |(t, o), path| {
            if path.starts_with(TENANT_PATH_PREFIX) {
                (t + 1, o)
            } else if path.starts_with(OWNER_PATH_PREFIX) {
                (t, o + 1)
            } else {
                (t, o)
            }
        });

        match (tenant, owner) {
            (0, 0) => ResourceAttribution::None,
            (t, o) if t > o => ResourceAttribution::Tenant,
            _ => ResourceAttribution::Owner,
        }
    }

    /// Route prefix for this scope.
    pub fn path_prefix(&self) -> Option<&'static str> {
        match self {
            ResourceAttribution::None => None,
            ResourceAttribution::Tenant => Some(TENANT_PATH_PREFIX),
            ResourceAttribution::Owner => Some(OWNER_PATH_PREFIX),
        }
    }

    /// `ResourceAttributionPathSpec` member in the framework runtime.
    pub fn path_spec(&self) -> &'static str {
        match self {
            ResourceAttribution::None => "ResourceAttributionPathSpec.NONE",
            ResourceAttribution::Tenant => "ResourceAttributionPathSpec.TENANT",
            ResourceAttribution::Owner => "ResourceAttributionPathSpec.OWNER",
        }
    }
}
