//! API clients for tags that do not name an aggregate.

use tracing::{debug, warn};

use crate::diagnostic::CompilerError;
use crate::ir::{ApiTagDefinition, OperationDefinition};

use super::client::{
    body_binding, build_method, client_class, response_types, stream_options,
    unique_method_name, MethodSpec, EVENTSTREAM_MODULE, STREAM_TYPE,
};
use super::source::{doc_lines, normalize_path, ClassDecl, Declaration, ImportScope};
use super::ts_types::to_pascal_case;
use super::{GenerateContext, GenerationReport, Generator, Project};

/// Emits one `<Tag>ApiClient.ts` per API tag.
pub struct ApiClientGenerator;

impl Generator for ApiClientGenerator {
    fn name(&self) -> &'static str {
        "api clients"
    }

    fn generate(
        &self,
        ctx: &GenerateContext<'_>,
        project: &mut Project,
        report: &mut GenerationReport,
    ) -> Result<(), CompilerError> {
        for api_tag in &ctx.resolution.api_tags {
            let class_prefix = to_pascal_case(&api_tag.tag.name);
            let path = api_client_path(ctx.context_alias(), &class_prefix);
            let mut imports = ImportScope::for_file(&path);

            let docs = doc_lines(None, api_tag.tag.description.as_deref());
            let mut client = client_class(
                format!("{}ApiClient", class_prefix),
                docs.clone(),
                None,
                &mut imports,
            );
            let mut stream = ClassDecl {
                name: format!("{}StreamApiClient", class_prefix),
                ..ClassDecl::default()
            };

            for operation in &api_tag.operations {
                let mut scope = ImportScope::for_file(&path);
                match add_operation(ctx, api_tag, operation, &mut client, &mut stream, &mut scope) {
                    Ok(()) => imports.extend(scope),
                    Err(err) => {
                        let id = operation.identifier();
                        warn!(operation = %id, error = %err, "skipping api method");
                        report.skip(id, &err);
                    }
                }
            }

            let streams = !stream.methods.is_empty();
            if streams {
                let methods = std::mem::take(&mut stream.methods);
                stream = client_class(stream.name, docs, Some(stream_options()), &mut imports);
                stream.methods = methods;
            }

            let file = project.file(&path);
            file.merge_imports(imports);
            file.add_declaration(Declaration::Class(client));
            if streams {
                file.add_declaration(Declaration::Class(stream));
            }
            report.api_clients += 1;
            debug!(file = %path, operations = api_tag.operations.len(), streams, "api client");
        }
        Ok(())
    }
}

/// `<alias>/<Tag>ApiClient.ts`, or at the output root without an alias.
pub fn api_client_path(context_alias: Option<&str>, class_prefix: &str) -> String {
    let file = format!("{}ApiClient.ts", class_prefix);
    match context_alias {
        Some(alias) => normalize_path(&format!("{}/{}", alias, file)),
        None => file,
    }
}

/// Adds an operation to the plain client and, when it answers with both JSON
/// and an event stream, a streaming twin to the stream client.
fn add_operation(
    ctx: &GenerateContext<'_>,
    api_tag: &ApiTagDefinition,
    operation: &OperationDefinition,
    client: &mut ClassDecl,
    stream: &mut ClassDecl,
    imports: &mut ImportScope,
) -> Result<(), CompilerError> {
    let referrer = operation.identifier();
    let responses = response_types(ctx, operation, &referrer, imports)?;
    let body = body_binding(ctx, operation, &referrer, imports)?;
    let ignored = ctx.config.ignored_path_parameters(&api_tag.tag.name);

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

    let stream_method = if responses.has_both() {
        imports.add(EVENTSTREAM_MODULE, STREAM_TYPE);
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
        if responses.json.is_none() && responses.stream.is_some() {
            imports.add(EVENTSTREAM_MODULE, STREAM_TYPE);
        }
        None
    };

    client.methods.push(method);
    if let Some(method) = stream_method {
        stream.methods.push(method);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::frontend::AggregateResolver;
    use crate::ir::Document;
    use serde_json::json;

    fn generate(document: &Document, config: &GeneratorConfig) -> (Project, GenerationReport) {
        let resolution = AggregateResolver::new(document).resolve();
        let ctx = GenerateContext::new(document, &resolution, config);
        let mut project = Project::new();
        let mut report = GenerationReport::default();
        ApiClientGenerator
            .generate(&ctx, &mut project, &mut report)
            .unwrap();
        (project, report)
    }

    fn document() -> Document {
        serde_json::from_value(json!({
            "x-wow-context-alias": "example",
            "tags": [{ "name": "user-profile", "description": "Profiles" }],
            "paths": {
                "/tenant/{tenantId}/user/{id}/profile": {
                    "get": {
                        "operationId": "user.get.profile",
                        "tags": ["user-profile"],
                        "responses": {
                            "200": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/example.user.Profile" } } } }
                        }
                    },
                    "put": {
                        "operationId": "user.update.profile",
                        "tags": ["user-profile"],
                        "summary": "Replace the profile",
                        "requestBody": {
                            "required": true,
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/example.user.Profile" } } }
                        }
                    }
                },
                "/user/{id}/avatar": {
                    "post": {
                        "operationId": "user.upload.avatar",
                        "tags": ["user-profile"],
                        "requestBody": { "content": { "multipart/form-data": { "schema": { "type": "object" } } } }
                    }
                }
            },
            "components": {
                "schemas": {
                    "example.user.Profile": { "type": "object", "properties": { "name": { "type": "string" } } }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn api_client_per_tag() {
        let doc = document();
        let (project, report) = generate(&doc, &GeneratorConfig::default());
        assert_eq!(report.api_clients, 1);
        assert_eq!(project.len(), 1);

        let file = project.get("example/UserProfileApiClient.ts").unwrap();
        let Some(Declaration::Class(client)) = file.declaration("UserProfileApiClient") else {
            panic!("missing api client");
        };
        let names: Vec<_> = client.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["profile", "updateProfile", "avatar"]);
        assert_eq!(client.methods[0].return_type, "Promise<Profile>");
        assert_eq!(client.methods[1].return_type, "Promise<any>");
        assert_eq!(client.methods[1].docs, vec!["Replace the profile"]);
        assert_eq!(client.methods[2].parameters[1].type_expr, "FormData");
        assert_eq!(client.docs, vec!["Profiles"]);

        assert!(file.declaration("UserProfileStreamApiClient").is_none());
        assert!(file.imports_from("@ahoo-wang/fetcher-eventstream").is_none());
        assert!(file
            .render()
            .contains("import { Profile } from './user/types';"));
    }

    #[test]
    fn configured_ignore_list_keeps_tenant_parameter() {
        let doc = document();
        let config = GeneratorConfig::parse(
            r#"{ "apiClients": { "user-profile": { "ignorePathParameters": [] } } }"#,
            std::path::Path::new("fetchgen.config.json"),
        )
        .unwrap();
        let (project, _) = generate(&doc, &config);
        let file = project.get("example/UserProfileApiClient.ts").unwrap();
        let Some(Declaration::Class(client)) = file.declaration("UserProfileApiClient") else {
            panic!("missing api client");
        };
        let params: Vec<_> = client.methods[0]
            .parameters
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(params, vec!["tenantId", "id", "attributes"]);
    }

    #[test]
    fn stream_client_only_for_dual_responses() {
        let doc: Document = serde_json::from_value(json!({
            "paths": {
                "/events": {
                    "get": {
                        "operationId": "events.watch",
                        "tags": ["events"],
                        "responses": {
                            "200": {
                                "content": {
                                    "application/json": { "schema": { "type": "array", "items": { "type": "string" } } },
                                    "text/event-stream": { "schema": { "type": "string" } }
                                }
                            }
                        }
                    }
                },
                "/events/latest": {
                    "get": {
                        "operationId": "events.latest",
                        "tags": ["events"],
                        "responses": {
                            "200": { "content": { "application/json": { "schema": { "type": "string" } } } }
                        }
                    }
                }
            }
        }))
        .unwrap();
        let (project, _) = generate(&doc, &GeneratorConfig::default());

        let file = project.get("EventsApiClient.ts").unwrap();
        let Some(Declaration::Class(stream)) = file.declaration("EventsStreamApiClient") else {
            panic!("missing stream api client");
        };
        assert_eq!(stream.methods.len(), 1);
        assert_eq!(stream.methods[0].name, "watch");
        assert_eq!(
            stream.methods[0].return_type,
            "Promise<JsonServerSentEventStream<string>>"
        );
        assert_eq!(
            stream.decorators,
            vec!["@api('', { headers: { Accept: 'text/event-stream' } })"]
        );

        let Some(Declaration::Class(client)) = file.declaration("EventsApiClient") else {
            panic!("missing api client");
        };
        assert_eq!(client.methods[0].return_type, "Promise<string[]>");
        assert_eq!(client.methods.len(), 2);
    }

    #[test]
    fn paths_follow_the_alias() {
        assert_eq!(api_client_path(Some("example"), "User"), "example/UserApiClient.ts");
        assert_eq!(api_client_path(None, "User"), "UserApiClient.ts");
    }
}
