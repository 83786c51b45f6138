//! Command clients, one file per aggregate.

use tracing::{debug, warn};

use crate::diagnostic::CompilerError;
use crate::ir::document::SCHEMA_REF_PREFIX;
use crate::ir::naming::WOW_IMPORT_PATH;
use crate::ir::{AggregateDefinition, CommandDefinition, ResourceAttribution};

use super::client::{
    aggregate_dir, build_method, client_class, stream_options, stream_return_type,
    unique_method_name, BodyBinding, MethodSpec, EVENTSTREAM_MODULE, STREAM_TYPE,
};
use super::source::{doc_lines, ClassDecl, Declaration, ImportScope};
use super::ts_types::to_pascal_case;
use super::{GenerateContext, GenerationReport, Generator, Project};

/// File name of command clients.
pub const COMMAND_CLIENT_FILE: &str = "commandClient.ts";

/// Result type every command returns.
const COMMAND_RESULT: &str = "CommandResult";

/// Emits the command client file of every aggregate.
pub struct CommandClientGenerator;

impl Generator for CommandClientGenerator {
    fn name(&self) -> &'static str {
        "command clients"
    }

    fn generate(
        &self,
        ctx: &GenerateContext<'_>,
        project: &mut Project,
        report: &mut GenerationReport,
    ) -> Result<(), CompilerError> {
        for aggregate in ctx.resolution.aggregates() {
            let path = format!("{}/{}", aggregate_dir(aggregate), COMMAND_CLIENT_FILE);
            let mut imports = ImportScope::for_file(&path);
            imports.add(WOW_IMPORT_PATH, COMMAND_RESULT);
            imports.add(EVENTSTREAM_MODULE, STREAM_TYPE);

            let pascal = to_pascal_case(&aggregate.aggregate_name);
            let docs = doc_lines(None, aggregate.tag.description.as_deref());
            let mut client =
                client_class(format!("{}CommandClient", pascal), docs.clone(), None, &mut imports);
            let mut stream = client_class(
                format!("{}StreamCommandClient", pascal),
                docs,
                Some(stream_options()),
                &mut imports,
            );

            let attribution = aggregate.resource_attribution();
            for command in &aggregate.commands {
                let mut scope = ImportScope::for_file(&path);
                let added = add_command(
                    ctx,
                    aggregate,
                    command,
                    attribution,
                    (&mut client, &mut stream),
                    &mut scope,
                );
                match added {
                    Ok(()) => imports.extend(scope),
                    Err(err) => {
                        warn!(command = %command.schema_key, error = %err, "skipping command method");
                        report.skip(command.schema_key.clone(), &err);
                    }
                }
            }

            let file = project.file(&path);
            file.merge_imports(imports);
            file.add_declaration(Declaration::Class(client));
            file.add_declaration(Declaration::Class(stream));
            report.command_clients += 1;
            debug!(file = %path, commands = aggregate.commands.len(), "command client");
        }
        Ok(())
    }
}

/// Route a command method is bound to: the first path scoped like the aggregate.
pub fn command_path(command: &CommandDefinition, attribution: ResourceAttribution) -> &str {
    attribution
        .path_prefix()
        .and_then(|prefix| command.paths.iter().find(|p| p.starts_with(prefix)))
        .or_else(|| command.paths.first())
        .map(String::as_str)
        .unwrap_or(command.operation.path.as_str())
}

fn add_command(
    ctx: &GenerateContext<'_>,
    aggregate: &AggregateDefinition,
    command: &CommandDefinition,
    attribution: ResourceAttribution,
    (client, stream): (&mut ClassDecl, &mut ClassDecl),
    imports: &mut ImportScope,
) -> Result<(), CompilerError> {
    let referrer = command.operation.identifier();
    let body = if command.multipart {
        BodyBinding::Multipart { required: true }
    } else {
        let reference = format!("{}{}", SCHEMA_REF_PREFIX, command.schema_key);
        BodyBinding::Json {
            type_expr: ctx.resolver.resolve_reference(&reference, &referrer, imports)?,
            required: true,
        }
    };
    let path = command_path(command, attribution);
    let ignored = ctx.config.ignored_path_parameters(&aggregate.tag.name);

    let mut method = build_method(
        ctx,
        MethodSpec {
            name: unique_method_name(client, &referrer),
            operation: &command.operation,
            path,
            body: Some(body.clone()),
            return_type: format!("Promise<{}>", COMMAND_RESULT),
            ignored_path_parameters: &ignored,
        },
        imports,
    )?;
    let mut stream_method = build_method(
        ctx,
        MethodSpec {
            name: unique_method_name(stream, &referrer),
            operation: &command.operation,
            path,
            body: Some(body),
            return_type: stream_return_type(COMMAND_RESULT),
            ignored_path_parameters: &ignored,
        },
        imports,
    )?;

    if method.docs.is_empty() {
        if let Some(schema) = ctx.document.schema(&command.schema_key) {
            method.docs = doc_lines(schema.title.as_deref(), schema.description.as_deref());
            stream_method.docs = method.docs.clone();
        }
    }

    client.methods.push(method);
    stream.methods.push(stream_method);
    Ok(())
}
