//! Query clients, one file per aggregate.
//!
//! Besides `<Aggregate>QueryClient` and `<Aggregate>StreamQueryClient` the
//! file exports the aggregate's state, field and event types and the options
//! the query runtime needs to address the aggregate.

use tracing::{debug, warn};

use crate::diagnostic::CompilerError;
use crate::ir::document::SCHEMA_REF_PREFIX;
use crate::ir::naming::WOW_IMPORT_PATH;
use crate::ir::{AggregateDefinition, OperationDefinition};

use super::client::{
    aggregate_dir, body_binding, build_method, client_class, response_types, stream_options,
    unique_method_name, MethodSpec, EVENTSTREAM_MODULE, STREAM_TYPE,
};
use super::source::{doc_lines, ClassDecl, ConstDecl, Declaration, ImportScope, TypeAliasDecl};
use super::ts_types::{string_literal, to_pascal_case, to_upper_snake_case, ANY_TYPE};
use super::{GenerateContext, GenerationReport, Generator, Project};

/// File name of query clients.
pub const QUERY_CLIENT_FILE: &str = "queryClient.ts";

/// Emits the query client file of every aggregate.
pub struct QueryClientGenerator;

impl Generator for QueryClientGenerator {
    fn name(&self) -> &'static str {
        "query clients"
    }

    fn generate(
        &self,
        ctx: &GenerateContext<'_>,
        project: &mut Project,
        report: &mut GenerationReport,
    ) -> Result<(), CompilerError> {
        for aggregate in ctx.resolution.aggregates() {
            let path = format!("{}/{}", aggregate_dir(aggregate), QUERY_CLIENT_FILE);
            let mut imports = ImportScope::for_file(&path);

            let declarations = query_file(ctx, aggregate, &mut imports, report)?;

            let file = project.file(&path);
            file.merge_imports(imports);
            for declaration in declarations {
                file.add_declaration(declaration);
            }
            report.query_clients += 1;
            debug!(file = %path, queries = aggregate.queries.len(), "query client");
        }
        Ok(())
    }
}

fn query_file(
    ctx: &GenerateContext<'_>,
    aggregate: &AggregateDefinition,
    imports: &mut ImportScope,
    report: &mut GenerationReport,
) -> Result<Vec<Declaration>, CompilerError> {
    let pascal = to_pascal_case(&aggregate.aggregate_name);
    let mut declarations = aggregate_types(ctx, aggregate, &pascal, imports)?;

    imports.add(WOW_IMPORT_PATH, "QueryClientOptions");
    imports.add(WOW_IMPORT_PATH, "ResourceAttributionPathSpec");
    let context_alias = ctx.context_alias().unwrap_or(aggregate.context.as_str());
    declarations.push(Declaration::Const(ConstDecl {
        name: format!("{}_QUERY_CLIENT_OPTIONS", to_upper_snake_case(&aggregate.aggregate_name)),
        docs: Vec::new(),
        type_annotation: Some("QueryClientOptions".to_string()),
        initializer: format!(
            "{{\n  contextAlias: {},\n  aggregateName: {},\n  resourceAttribution: {},\n}}",
            string_literal(context_alias),
            string_literal(&aggregate.aggregate_name),
            aggregate.resource_attribution().path_spec()
        ),
    }));

    let docs = doc_lines(None, aggregate.tag.description.as_deref());
    let mut client = client_class(format!("{}QueryClient", pascal), docs.clone(), None, imports);
    let mut stream = client_class(
        format!("{}StreamQueryClient", pascal),
        docs,
        Some(stream_options()),
        imports,
    );

    for operation in &aggregate.queries {
        let mut scope = ImportScope::for_file(imports.file_path());
        match add_query(ctx, aggregate, operation, &mut client, &mut stream, &mut scope) {
            Ok(()) => imports.extend(scope),
            Err(err) => {
                let id = operation.identifier();
                warn!(operation = %id, error = %err, "skipping query method");
                report.skip(id, &err);
            }
        }
    }

    declarations.push(Declaration::Class(client));
    declarations.push(Declaration::Class(stream));
    Ok(declarations)
}

/// `<Aggregate>StateType`, `<Aggregate>AggregatedFieldsType` and `<Aggregate>DomainEventType`.
fn aggregate_types(
    ctx: &GenerateContext<'_>,
    aggregate: &AggregateDefinition,
    pascal: &str,
    imports: &mut ImportScope,
) -> Result<Vec<Declaration>, CompilerError> {
    let referrer = aggregate.tag.name.as_str();
    let reference = |key: &str, imports: &mut ImportScope| {
        ctx.resolver
            .resolve_reference(&format!("{}{}", SCHEMA_REF_PREFIX, key), referrer, imports)
    };

    let state = match aggregate.state.as_deref() {
        Some(key) => reference(key, imports)?,
        None => ANY_TYPE.to_string(),
    };
    let fields = match aggregate.fields.as_deref() {
        Some(key) => reference(key, imports)?,
        None => "string".to_string(),
    };
    let events = if aggregate.events.is_empty() {
        "never".to_string()
    } else {
        aggregate
            .events
            .iter()
            .map(|event| reference(&event.schema_key, imports))
            .collect::<Result<Vec<_>, _>>()?
            .join(" | ")
    };

    Ok([
        ("StateType", state),
        ("AggregatedFieldsType", fields),
        ("DomainEventType", events),
    ]
    .into_iter()
    .map(|(suffix, type_expr)| {
        Declaration::TypeAlias(TypeAliasDecl {
            name: format!("{}{}", pascal, suffix),
            docs: Vec::new(),
            type_expr,
        })
    })
    .collect())
}

/// Adds one query to the plain client and, when it returns a list or a stream, to the stream client.
fn add_query(
    ctx: &GenerateContext<'_>,
    aggregate: &AggregateDefinition,
    operation: &OperationDefinition,
    client: &mut ClassDecl,
    stream: &mut ClassDecl,
    imports: &mut ImportScope,
) -> Result<(), CompilerError> {
    let referrer = operation.identifier();
    let responses = response_types(ctx, operation, &referrer, imports)?;
    let body = body_binding(ctx, operation, &referrer, imports)?;
    let ignored = ctx.config.ignored_path_parameters(&aggregate.tag.name);

    let streams = responses.stream.is_some()
        || responses.json.as_deref().is_some_and(|json| json.ends_with("[]"));
    if streams {
        imports.add(EVENTSTREAM_MODULE, STREAM_TYPE);
    }

    let method = build_method(
        ctx,
        MethodSpec {
            name: unique_method_name(client, &referrer),
            operation,
            path: &operation.path,
            body: body.clone(),
            return_type: responses.return_type(),
            ignored_path_parameters: &ignored,
        },
        imports,
    )?;

    let stream_method = if streams {
        Some(build_method(
            ctx,
            MethodSpec {
                name: unique_method_name(stream, &referrer),
                operation,
                path: &operation.path,
                body,
                return_type: responses.stream_return_type(),
                ignored_path_parameters: &ignored,
            },
            imports,
        )?)
    } else {
        None
    };

    client.methods.push(method);
    if let Some(method) = stream_method {
        stream.methods.push(method);
    }
    Ok(())
}
