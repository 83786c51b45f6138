//! Schema key to model name/path resolution.
//!
//! A schema key such as `example.order.OrderStatus` is split at the first
//! segment starting with an uppercase letter: the lowercase prefix becomes the
//! directory (`/example/order`) and the rest becomes the type name.

use crate::codegen::ts_types::to_pascal_case;

/// Module every shared framework type is imported from.
pub const WOW_IMPORT_PATH: &str = "@ahoo-wang/fetcher-wow";

/// Schema keys under this prefix belong to the framework and are never generated.
pub const RESERVED_PREFIX: &str = "wow.";

/// Framework schema keys pinned to their exported names in [`WOW_IMPORT_PATH`].
const WOW_TYPE_OVERRIDES: &[(&str, &str)] = &[
    ("wow.command.CommandResult", "CommandResult"),
    ("wow.command.CommandResultArray", "CommandResultArray"),
    ("wow.command.CommandStage", "CommandStage"),
    ("wow.command.SimpleWaitSignal", "WaitSignal"),
    ("wow.MessageHeaderSqlType", "MessageHeaderSqlType"),
    ("wow.api.BindingError", "BindingError"),
    ("wow.api.DefaultErrorInfo", "ErrorInfo"),
    ("wow.api.RecoverableType", "RecoverableType"),
    ("wow.api.command.DefaultDeleteAggregate", "DeleteAggregate"),
    ("wow.api.command.DefaultRecoverAggregate", "RecoverAggregate"),
    ("wow.api.messaging.FunctionInfoData", "FunctionInfo"),
    ("wow.api.messaging.FunctionKind", "FunctionKind"),
    ("wow.api.modeling.AggregateId", "AggregateId"),
    ("wow.api.query.Condition", "Condition"),
    ("wow.api.query.ConditionOptions", "ConditionOptions"),
    ("wow.api.query.ListQuery", "ListQuery"),
    ("wow.api.query.Operator", "Operator"),
    ("wow.api.query.PagedQuery", "PagedQuery"),
    ("wow.api.query.PagedList", "PagedList"),
    ("wow.api.query.Pagination", "Pagination"),
    ("wow.api.query.Projection", "Projection"),
    ("wow.api.query.SingleQuery", "SingleQuery"),
    ("wow.api.query.Sort", "FieldSort"),
    ("wow.api.query.Sort.Direction", "SortDirection"),
    ("wow.configuration.Aggregate", "Aggregate"),
    ("wow.configuration.BoundedContext", "BoundedContext"),
    ("wow.configuration.WowMetadata", "WowMetadata"),
    ("wow.modeling.DomainEvent", "DomainEvent"),
    ("wow.openapi.BatchResult", "BatchResult"),
    ("wow.messaging.CompensationTarget", "CompensationTarget"),
];

/// Resolved name and location of a generated type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelInfo {
    /// Exported type name.
    pub name: String,
    /// Directory path (`/a/b`) or an external module specifier.
    pub path: String,
}

impl ModelInfo {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Whether this type lives in an external package rather than the output tree.
    pub fn is_external(&self) -> bool {
        !self.path.starts_with('/')
    }
}

/// Looks up the pinned override for a framework schema key.
pub fn override_for(schema_key: &str) -> Option<ModelInfo> {
    WOW_TYPE_OVERRIDES
        .iter()
        .find(|(key, _)| *key == schema_key)
        .map(|(_, name)| ModelInfo::new(*name, WOW_IMPORT_PATH))
}

/// Whether a schema key is reserved for framework types.
pub fn is_reserved(schema_key: &str) -> bool {
    schema_key.starts_with(RESERVED_PREFIX)
}

/// Resolves a schema key to its model name and path.
pub fn resolve_model_info(schema_key: &str) -> ModelInfo {
    if schema_key.is_empty() {
        return ModelInfo::new("", "/");
    }

    if let Some(pinned) = override_for(schema_key) {
        return pinned;
    }

    let segments: Vec<&str> = schema_key.split('.').collect();
    let boundary = segments
        .iter()
        .position(|s| s.chars().next().is_some_and(|c| c.is_ascii_uppercase()));

    match boundary {
        Some(index) => {
            let path = format!("/{}", segments[..index].join("/"));
            ModelInfo::new(pascal_join(&segments[index..]), path)
        }
        None => ModelInfo::new(pascal_join(&segments), "/"),
    }
}

/// Model info used when another declaration references `schema_key`.
///
/// Reserved keys are never generated locally, so references to them always
/// import from the framework package.
pub fn referenced_model_info(schema_key: &str) -> ModelInfo {
    let info = resolve_model_info(schema_key);
    if is_reserved(schema_key) && !info.is_external() {
        ModelInfo::new(info.name, WOW_IMPORT_PATH)
    } else {
        info
    }
}

fn pascal_join(segments: &[&str]) -> String {
    segments.iter().map(|s| to_pascal_case(s)).collect()
}
