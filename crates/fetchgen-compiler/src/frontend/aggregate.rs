//! Aggregate resolution.
//!
//! Operations tagged `{context}.{aggregate}` belong to that aggregate and are
//! split into queries and commands. Every other tagged operation is grouped
//! by its first tag for the API client generator. State, field and event
//! schemas are found by naming convention under the aggregate's key prefix.

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::diagnostic::{CompilerError, Skipped};
use crate::ir::schema::{composition, is_union};
use crate::ir::{
    referenced_model_info, resolve_model_info, AggregateDefinition, ApiTagDefinition,
    BoundedContexts, CommandDefinition, Document, EventDefinition, HttpMethod, Operation,
    OperationDefinition, ParameterDefinition, PathItem,
};

/// Last path segments marking an operation as a query regardless of method.
pub const QUERY_SEGMENTS: &[&str] = &["list", "paged", "single", "count", "query"];

const STATE_SUFFIX: &str = "State";
const FIELDS_SUFFIX: &str = "AggregatedFields";
const DOMAIN_EVENT_SUFFIX: &str = "DomainEvent";

const JSON_MEDIA_MARKER: &str = "json";
const MULTIPART_MEDIA_TYPE: &str = "multipart/form-data";

/// Everything the client generators consume.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub contexts: BoundedContexts,
    pub api_tags: Vec<ApiTagDefinition>,
    pub skipped: Vec<Skipped>,
}

impl Resolution {
    /// All aggregates, ordered by context then name.
    pub fn aggregates(&self) -> impl Iterator<Item = &AggregateDefinition> {
        self.contexts.values().flat_map(|aggregates| aggregates.values())
    }

    pub fn aggregate_count(&self) -> usize {
        self.contexts.values().map(|a| a.len()).sum()
    }
}

/// Partitions a document's operations into aggregates and API tags.
pub struct AggregateResolver<'a> {
    document: &'a Document,
    alias: Option<&'a str>,
}

impl<'a> AggregateResolver<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            alias: document.context_alias(),
        }
    }

    /// Splits an aggregate tag into `(context, aggregate)`.
    pub fn aggregate_tag<'t>(&self, tag: &'t str) -> Option<(&'t str, &'t str)> {
        let (context, aggregate) = tag.split_once('.')?;
        if context.is_empty() || aggregate.is_empty() || aggregate.contains('.') {
            return None;
        }
        match self.alias {
            Some(alias) if alias != context => None,
            _ => Some((context, aggregate)),
        }
    }

    /// Resolves every operation of the document.
    pub fn resolve(&self) -> Resolution {
        let mut contexts = BoundedContexts::new();
        let mut api_tags: IndexMap<String, ApiTagDefinition> = IndexMap::new();
        let mut skipped = Vec::new();

        for (path, method, item, operation) in self.document.operations() {
            let definition = match self.operation_definition(path, method, item, operation) {
                Ok(definition) => definition,
                Err(err) => {
                    let id = operation_label(path, method, operation);
                    warn!(operation = %id, error = %err, "skipping operation");
                    skipped.push(Skipped::new(id, &err));
                    continue;
                }
            };

            let aggregate_tag = definition.tags.iter().find_map(|tag| {
                self.aggregate_tag(tag)
                    .map(|(context, name)| (tag.clone(), context.to_string(), name.to_string()))
            });

            match aggregate_tag {
                Some((tag, context, name)) => {
                    let aggregate = contexts
                        .entry(context.clone())
                        .or_default()
                        .entry(name.clone())
                        .or_insert_with(|| AggregateDefinition {
                            context,
                            aggregate_name: name,
                            tag: self.document.tag(&tag),
                            commands: Vec::new(),
                            queries: Vec::new(),
                            events: Vec::new(),
                            state: None,
                            fields: None,
                        });
                    if let Err(err) = self.classify(aggregate, definition) {
                        let id = operation_label(path, method, operation);
                        warn!(operation = %id, error = %err, "skipping command");
                        skipped.push(Skipped::new(id, &err));
                    }
                }
                None => match definition.tags.first().cloned() {
                    Some(tag) => api_tags
                        .entry(tag.clone())
                        .or_insert_with(|| ApiTagDefinition {
                            tag: self.document.tag(&tag),
                            operations: Vec::new(),
                        })
                        .operations
                        .push(definition),
                    None => debug!(path, method = method.as_str(), "untagged operation ignored"),
                },
            }
        }

        for aggregate in contexts.values_mut().flat_map(|a| a.values_mut()) {
            self.attach_schemas(aggregate, &mut skipped);
        }

        let resolution = Resolution {
            contexts,
            api_tags: api_tags.into_values().collect(),
            skipped,
        };
        info!(
            aggregates = resolution.aggregate_count(),
            api_tags = resolution.api_tags.len(),
            skipped = resolution.skipped.len(),
            "resolved operations"
        );
        resolution
    }

    /// Resolves parameter, body and response references of one operation.
    fn operation_definition(
        &self,
        path: &str,
        method: HttpMethod,
        item: &PathItem,
        operation: &Operation,
    ) -> Result<OperationDefinition, CompilerError> {
        let referrer = operation_label(path, method, operation);

        let mut parameters: Vec<ParameterDefinition> = Vec::new();
        for parameter in item.parameters.iter().chain(&operation.parameters) {
            let parameter = self.document.parameter(parameter, &referrer)?;
            parameters.retain(|p| !(p.name == parameter.name && p.location == parameter.location));
            parameters.push(ParameterDefinition {
                name: parameter.name.clone(),
                location: parameter.location,
                required: parameter.required,
                description: parameter.description.clone(),
                schema: parameter.schema.clone(),
            });
        }

        let request_body = operation
            .request_body
            .as_ref()
            .map(|body| self.document.request_body(body, &referrer).cloned())
            .transpose()?;

        let mut responses = IndexMap::new();
        for (status, response) in &operation.responses {
            let response = self.document.response(response, &referrer)?;
            responses.insert(status.clone(), response.clone());
        }

        Ok(OperationDefinition {
            operation_id: operation.operation_id.clone(),
            method,
            path: path.to_string(),
            summary: operation.summary.clone(),
            description: operation.description.clone(),
            tags: operation.tags.clone(),
            parameters,
            request_body,
            responses,
            deprecated: operation.deprecated,
        })
    }

    /// Files an aggregate operation as a query or a command.
    fn classify(
        &self,
        aggregate: &mut AggregateDefinition,
        operation: OperationDefinition,
    ) -> Result<(), CompilerError> {
        if is_query(&operation) {
            debug!(aggregate = %aggregate.aggregate_name, path = %operation.path, "query");
            aggregate.queries.push(operation);
            return Ok(());
        }

        let Some((schema_key, multipart)) = self.command_body(&operation)? else {
            debug!(
                aggregate = %aggregate.aggregate_name,
                path = %operation.path,
                "operation is neither a query nor a command"
            );
            return Ok(());
        };

        match aggregate
            .commands
            .iter_mut()
            .find(|c| c.schema_key == schema_key)
        {
            Some(command) => {
                if !command.paths.contains(&operation.path) {
                    command.paths.push(operation.path.clone());
                }
            }
            None => {
                debug!(aggregate = %aggregate.aggregate_name, command = %schema_key, "command");
                aggregate.commands.push(CommandDefinition {
                    name: referenced_model_info(&schema_key).name,
                    paths: vec![operation.path.clone()],
                    schema_key,
                    operation,
                    multipart,
                });
            }
        }
        Ok(())
    }

    /// Component key of a write operation's body, and whether it is multipart.
    fn command_body(
        &self,
        operation: &OperationDefinition,
    ) -> Result<Option<(String, bool)>, CompilerError> {
        if !operation.method.is_write() {
            return Ok(None);
        }
        let Some(body) = operation.request_body.as_ref() else {
            return Ok(None);
        };

        for (media_type, content) in &body.content {
            let multipart = media_type == MULTIPART_MEDIA_TYPE;
            if !multipart && !media_type.contains(JSON_MEDIA_MARKER) {
                continue;
            }
            let Some(reference) = content.schema.as_ref().and_then(|s| s.reference.as_deref())
            else {
                continue;
            };
            let (key, _) = self
                .document
                .resolve_schema_ref(reference, &operation.identifier())?;
            return Ok(Some((key.to_string(), multipart)));
        }
        Ok(None)
    }

    /// Finds state, fields and event schemas under the aggregate's key prefix.
    fn attach_schemas(&self, aggregate: &mut AggregateDefinition, skipped: &mut Vec<Skipped>) {
        let prefix = format!("{}.{}.", aggregate.context, aggregate.aggregate_name);

        for (key, schema) in &self.document.components.schemas {
            if !key.starts_with(&prefix) {
                continue;
            }
            let name = resolve_model_info(key).name;

            if aggregate.state.is_none() && name.ends_with(STATE_SUFFIX) {
                aggregate.state = Some(key.clone());
            }
            if aggregate.fields.is_none() && name.ends_with(FIELDS_SUFFIX) {
                aggregate.fields = Some(key.clone());
            }
            if !name.ends_with(DOMAIN_EVENT_SUFFIX) || !is_union(schema) {
                continue;
            }

            let members = composition(schema).map(|(_, m)| m).unwrap_or_default();
            for reference in members.iter().filter_map(|m| m.reference.as_deref()) {
                match self.document.resolve_schema_ref(reference, key) {
                    Ok((event_key, event_schema)) => {
                        if aggregate.events.iter().any(|e| e.schema_key == event_key) {
                            continue;
                        }
                        aggregate.events.push(EventDefinition {
                            name: referenced_model_info(event_key).name,
                            title: event_schema.title.clone(),
                            description: event_schema.description.clone(),
                            schema_key: event_key.to_string(),
                            schema: event_schema.clone(),
                        });
                    }
                    Err(err) => {
                        warn!(schema = %key, error = %err, "skipping domain event");
                        skipped.push(Skipped::new(key.clone(), &err));
                    }
                }
            }
        }

        debug!(
            aggregate = %prefix.trim_end_matches('.'),
            commands = aggregate.commands.len(),
            queries = aggregate.queries.len(),
            events = aggregate.events.len(),
            "aggregate resolved"
        );
    }
}

/// Whether an aggregate operation reads rather than writes.
pub fn is_query(operation: &OperationDefinition) -> bool {
    if operation.method == HttpMethod::Get {
        return true;
    }
    operation
        .path
        .rsplit('/')
        .find(|s| !s.is_empty())
        .is_some_and(|last| QUERY_SEGMENTS.contains(&last))
}

fn operation_label(path: &str, method: HttpMethod, operation: &Operation) -> String {
    operation
        .operation_id
        .clone()
        .unwrap_or_else(|| format!("{} {}", method.as_str().to_uppercase(), path))
}
