//! Building blocks shared by the client generators.
//!
//! Generated methods carry only signatures and decorators; their bodies throw
//! `autoGeneratedError` and the decorator runtime performs the request.

use std::collections::HashSet;

use tracing::debug;

use crate::diagnostic::CompilerError;
use crate::ir::{AggregateDefinition, OperationDefinition, ParameterLocation, Response, Schema};

use super::source::{normalize_path, ClassDecl, ImportScope, MethodDecl, ParameterDecl};
use super::ts_types::{
    has_top_level_operator, safe_identifier, string_literal, to_camel_case, ANY_TYPE,
};
use super::GenerateContext;

/// Decorator runtime module.
pub const DECORATOR_MODULE: &str = "@ahoo-wang/fetcher-decorator";

/// Server-sent event stream module.
pub const EVENTSTREAM_MODULE: &str = "@ahoo-wang/fetcher-eventstream";

/// Envelope type of streamed responses.
pub const STREAM_TYPE: &str = "JsonServerSentEventStream";

/// Media type of server-sent event responses.
pub const EVENT_STREAM_MEDIA_TYPE: &str = "text/event-stream";

/// Media type of form uploads.
pub const MULTIPART_MEDIA_TYPE: &str = "multipart/form-data";

const ATTRIBUTES_PARAMETER: &str = "attributes";

/// Picks a method name from a dot-delimited identifier.
///
/// Candidates are the identifier's suffixes, shortest first, in camelCase;
/// the first one `exists` rejects is skipped. When every suffix is taken the
/// full camelCase join is returned.
pub fn resolve_method_name(identifier: &str, exists: impl Fn(&str) -> bool) -> String {
    let segments: Vec<&str> = identifier.split('.').filter(|s| !s.is_empty()).collect();
    let candidate = |start: usize| method_identifier(&segments[start..]);

    for start in (0..segments.len()).rev() {
        let name = candidate(start);
        if !exists(&name) {
            return name;
        }
    }
    candidate(0)
}

fn method_identifier(segments: &[&str]) -> String {
    let name = to_camel_case(&segments.join("_"));
    if name.is_empty() {
        "invoke".to_string()
    } else if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("_{}", name)
    } else {
        name
    }
}

/// Method name that is unique on `class`, numbering the fallback if needed.
pub fn unique_method_name(class: &ClassDecl, identifier: &str) -> String {
    let name = resolve_method_name(identifier, |candidate| class.has_method(candidate));
    if !class.has_method(&name) {
        return name;
    }
    (2..)
        .map(|n| format!("{}{}", name, n))
        .find(|candidate| !class.has_method(candidate))
        .unwrap_or(name)
}

/// Names of the `{placeholders}` in a path template, in order.
pub fn path_placeholders(path: &str) -> Vec<&str> {
    path.split('{')
        .skip(1)
        .filter_map(|rest| rest.split_once('}').map(|(name, _)| name))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Every runtime name referenced by a client class.
pub fn import_decorators(imports: &mut ImportScope, names: &[&str]) {
    for name in names {
        imports.add(DECORATOR_MODULE, name);
    }
}

/// Response shapes an operation declares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseTypes {
    /// Type of the JSON (or otherwise structured) body.
    pub json: Option<String>,
    /// Element type of the event stream.
    pub stream: Option<String>,
}

impl ResponseTypes {
    /// Return type of the plain method.
    pub fn return_type(&self) -> String {
        match (&self.json, &self.stream) {
            (Some(json), _) => format!("Promise<{}>", json),
            (None, Some(stream)) => stream_return_type(stream),
            (None, None) => format!("Promise<{}>", ANY_TYPE),
        }
    }

    /// Return type of the streaming method.
    pub fn stream_return_type(&self) -> String {
        let element = self
            .stream
            .clone()
            .or_else(|| self.json.as_deref().map(element_type))
            .unwrap_or_else(|| ANY_TYPE.to_string());
        stream_return_type(&element)
    }

    /// Whether both a JSON body and an event stream are declared.
    pub fn has_both(&self) -> bool {
        self.json.is_some() && self.stream.is_some()
    }
}

/// `Promise<JsonServerSentEventStream<T>>`.
pub fn stream_return_type(element: &str) -> String {
    format!("Promise<{}<{}>>", STREAM_TYPE, element)
}

/// Element type of an array type, or the type itself.
pub fn element_type(type_expr: &str) -> String {
    if has_top_level_operator(type_expr) {
        return type_expr.to_string();
    }
    match type_expr.strip_suffix("[]") {
        Some(inner) => inner
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .unwrap_or(inner)
            .to_string(),
        None => type_expr.to_string(),
    }
}

/// Successful response of an operation: `200`, then any `2XX`, then `default`.
pub fn success_response(operation: &OperationDefinition) -> Option<&Response> {
    operation
        .responses
        .get("200")
        .or_else(|| {
            operation
                .responses
                .iter()
                .find(|(status, _)| status.starts_with('2'))
                .map(|(_, r)| r)
        })
        .or_else(|| operation.responses.get("default"))
}

/// Resolves the JSON and event-stream response types of an operation.
pub fn response_types(
    ctx: &GenerateContext<'_>,
    operation: &OperationDefinition,
    referrer: &str,
    imports: &mut ImportScope,
) -> Result<ResponseTypes, CompilerError> {
    let mut types = ResponseTypes::default();
    let Some(response) = success_response(operation) else {
        return Ok(types);
    };

    for (media_type, content) in &response.content {
        let Some(schema) = content.schema.as_ref() else {
            continue;
        };
        if media_type.starts_with(EVENT_STREAM_MEDIA_TYPE) {
            if types.stream.is_none() {
                let ty = ctx.resolver.resolve(schema, referrer, imports)?;
                types.stream = Some(element_type(&ty));
            }
        } else if types.json.is_none() {
            types.json = Some(ctx.resolver.resolve(schema, referrer, imports)?);
        }
    }
    Ok(types)
}

/// Request body binding of an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyBinding {
    /// `@request() request: ParameterRequest<T>`.
    Json { type_expr: String, required: bool },
    /// `@body() body: FormData`.
    Multipart { required: bool },
}

impl BodyBinding {
    fn parameter(&self) -> ParameterDecl {
        match self {
            BodyBinding::Json { type_expr, required } => ParameterDecl {
                decorator: Some("@request()".to_string()),
                name: self.name().to_string(),
                type_expr: format!("ParameterRequest<{}>", type_expr),
                optional: !required,
            },
            BodyBinding::Multipart { required } => ParameterDecl {
                decorator: Some("@body()".to_string()),
                name: self.name().to_string(),
                type_expr: "FormData".to_string(),
                optional: !required,
            },
        }
    }

    fn name(&self) -> &'static str {
        match self {
            BodyBinding::Json { .. } => "request",
            BodyBinding::Multipart { .. } => "body",
        }
    }

    fn decorators(&self) -> &'static [&'static str] {
        match self {
            BodyBinding::Json { .. } => &["request", "ParameterRequest"],
            BodyBinding::Multipart { .. } => &["body"],
        }
    }

    fn required(&self) -> bool {
        match self {
            BodyBinding::Json { required, .. } | BodyBinding::Multipart { required } => *required,
        }
    }
}

/// Resolves the request body binding of an operation.
pub fn body_binding(
    ctx: &GenerateContext<'_>,
    operation: &OperationDefinition,
    referrer: &str,
    imports: &mut ImportScope,
) -> Result<Option<BodyBinding>, CompilerError> {
    let Some(body) = operation.request_body.as_ref() else {
        return Ok(None);
    };

    if body.content.contains_key(MULTIPART_MEDIA_TYPE) {
        return Ok(Some(BodyBinding::Multipart {
            required: body.required,
        }));
    }

    let schema = body
        .content
        .iter()
        .find(|(media_type, _)| media_type.contains("json"))
        .or_else(|| body.content.first())
        .and_then(|(_, content)| content.schema.as_ref());
    let type_expr = match schema {
        Some(schema) => ctx.resolver.resolve(schema, referrer, imports)?,
        None => ANY_TYPE.to_string(),
    };
    Ok(Some(BodyBinding::Json {
        type_expr,
        required: body.required,
    }))
}

/// Everything needed to emit one method.
pub struct MethodSpec<'o> {
    pub name: String,
    pub operation: &'o OperationDefinition,
    /// Route placed in the method decorator.
    pub path: &'o str,
    pub body: Option<BodyBinding>,
    pub return_type: String,
    pub ignored_path_parameters: &'o [String],
}

/// Builds a decorated method whose body defers to the runtime.
pub fn build_method(
    ctx: &GenerateContext<'_>,
    spec: MethodSpec<'_>,
    imports: &mut ImportScope,
) -> Result<MethodDecl, CompilerError> {
    let operation = spec.operation;
    let referrer = operation.identifier();
    let method = operation.method;

    let mut required = Vec::new();
    let mut optional = Vec::new();
    let mut decorators: Vec<&str> = vec![method.decorator(), "attribute", "autoGeneratedError"];
    let mut names: HashSet<String> = HashSet::from([ATTRIBUTES_PARAMETER.to_string()]);
    if let Some(body) = &spec.body {
        names.insert(body.name().to_string());
    }

    for name in path_placeholders(spec.path) {
        if spec.ignored_path_parameters.iter().any(|p| p == name) {
            debug!(path = spec.path, parameter = name, "ignored path parameter");
            continue;
        }
        let schema = operation
            .parameters_in(ParameterLocation::Path)
            .find(|p| p.name == name)
            .and_then(|p| p.schema.as_ref());
        required.push(ParameterDecl {
            decorator: Some(format!("@path({})", string_literal(name))),
            name: claim_identifier(&mut names, name),
            type_expr: path_parameter_type(ctx, schema, &referrer, imports)?,
            optional: false,
        });
        decorators.push("path");
    }

    if let Some(body) = &spec.body {
        decorators.extend(body.decorators());
        if body.required() {
            required.push(body.parameter());
        } else {
            optional.push(body.parameter());
        }
    }

    for parameter in operation.parameters_in(ParameterLocation::Query) {
        let type_expr = match parameter.schema.as_ref() {
            Some(schema) => ctx.resolver.resolve(schema, &referrer, imports)?,
            None => ANY_TYPE.to_string(),
        };
        optional.push(ParameterDecl {
            decorator: Some(format!("@query({})", string_literal(&parameter.name))),
            name: claim_identifier(&mut names, &parameter.name),
            type_expr,
            optional: true,
        });
        decorators.push("query");
    }

    optional.push(ParameterDecl {
        decorator: Some("@attribute()".to_string()),
        name: ATTRIBUTES_PARAMETER.to_string(),
        type_expr: "Record<string, any>".to_string(),
        optional: true,
    });

    import_decorators(imports, &decorators);

    let parameters: Vec<ParameterDecl> = required.into_iter().chain(optional).collect();
    let call = format!(
        "throw autoGeneratedError({});",
        parameters
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    let decorator = format!("@{}({})", method.decorator(), string_literal(spec.path));

    let mut docs = super::source::doc_lines(
        operation.summary.as_deref(),
        operation.description.as_deref(),
    );
    if operation.deprecated {
        docs.push("@deprecated".to_string());
    }

    Ok(MethodDecl {
        name: spec.name,
        docs,
        decorators: vec![decorator],
        parameters,
        return_type: spec.return_type,
        body: vec![call],
    })
}

/// Identifier for a bound parameter, numbered when an earlier parameter took it.
fn claim_identifier(taken: &mut HashSet<String>, name: &str) -> String {
    let base = safe_identifier(name);
    if taken.insert(base.clone()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}{}", base, n);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Path parameters default to `string` unless their schema says otherwise.
fn path_parameter_type(
    ctx: &GenerateContext<'_>,
    schema: Option<&Schema>,
    referrer: &str,
    imports: &mut ImportScope,
) -> Result<String, CompilerError> {
    let Some(schema) = schema else {
        return Ok("string".to_string());
    };
    let resolved = ctx.resolver.resolve(schema, referrer, imports)?;
    if resolved == ANY_TYPE {
        Ok("string".to_string())
    } else {
        Ok(resolved)
    }
}

/// A client class with the standard metadata constructor.
pub fn client_class(
    name: String,
    docs: Vec<String>,
    api_options: Option<String>,
    imports: &mut ImportScope,
) -> ClassDecl {
    import_decorators(imports, &["api", "ApiMetadata", "ApiMetadataCapable"]);
    let decorator = match api_options {
        Some(options) => format!("@api('', {})", options),
        None => "@api()".to_string(),
    };
    ClassDecl {
        name,
        docs,
        decorators: vec![decorator],
        implements: vec!["ApiMetadataCapable".to_string()],
        constructor: Some("public readonly apiMetadata?: ApiMetadata".to_string()),
        methods: Vec::new(),
    }
}

/// Directory of an aggregate's client files, relative to the output root.
pub fn aggregate_dir(aggregate: &AggregateDefinition) -> String {
    normalize_path(&format!("{}/{}", aggregate.context, aggregate.aggregate_name))
}

/// Decorator options that make the runtime read the response as an event stream.
pub fn stream_options() -> String {
    format!(
        "{{ headers: {{ Accept: {} }} }}",
        string_literal(EVENT_STREAM_MEDIA_TYPE)
    )
}
