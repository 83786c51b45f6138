//! In-memory TypeScript source files.
//!
//! Generators append declarations to a [`SourceFile`]; nothing is turned into
//! text until [`SourceFile::render`], which is the formatting pass.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path};

use crate::ir::ModelInfo;

/// Header written at the top of every generated file.
pub const FILE_HEADER: &str = "// Generated by fetchgen. Do not edit.";

/// File name of the model declarations in each model directory.
pub const MODEL_FILE_NAME: &str = "types.ts";

type ImportMap = BTreeMap<String, BTreeSet<String>>;

/// Normalizes a relative file path: `/`-separated, no empty, `.` or leading segments.
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Path of the file holding the models of a model directory.
pub fn model_file_path(model_path: &str) -> String {
    normalize_path(&format!("{}/{}", model_path, MODEL_FILE_NAME))
}

/// Module specifier for importing `target` from `from`; both are normalized file paths.
pub fn relative_module(from: &str, target: &str) -> String {
    let target = target.strip_suffix(".ts").unwrap_or(target);
    let base = Path::new(from).parent().unwrap_or_else(|| Path::new(""));
    let relative = pathdiff::diff_paths(Path::new(target), base)
        .unwrap_or_else(|| Path::new(target).to_path_buf());

    let specifier = relative
        .components()
        .filter_map(|c| match c {
            Component::ParentDir => Some("..".to_string()),
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");

    if specifier.starts_with("..") {
        specifier
    } else {
        format!("./{}", specifier)
    }
}

/// Imports collected while resolving one declaration.
///
/// Kept apart from the file so a declaration that fails to resolve leaves no
/// imports behind.
#[derive(Debug, Clone, Default)]
pub struct ImportScope {
    file_path: String,
    imports: ImportMap,
}

impl ImportScope {
    /// Creates an empty scope for the file at `file_path`.
    pub fn for_file(file_path: &str) -> Self {
        Self {
            file_path: file_path.to_string(),
            imports: ImportMap::new(),
        }
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// Imports `name` from an explicit module specifier.
    pub fn add(&mut self, module: &str, name: &str) {
        self.imports
            .entry(module.to_string())
            .or_default()
            .insert(name.to_string());
    }

    /// Imports a model type unless it is declared in this file.
    pub fn add_model(&mut self, info: &ModelInfo) {
        if info.is_external() {
            self.add(&info.path, &info.name);
            return;
        }
        let target = model_file_path(&info.path);
        if target != self.file_path {
            let module = relative_module(&self.file_path, &target);
            self.add(&module, &info.name);
        }
    }

    /// Takes over every import of a nested scope.
    pub fn extend(&mut self, other: ImportScope) {
        for (module, names) in other.imports {
            self.imports.entry(module).or_default().extend(names);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }
}

/// A generated TypeScript file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: String,
    imports: ImportMap,
    declarations: Vec<Declaration>,
}

impl SourceFile {
    pub fn new(path: &str) -> Self {
        Self {
            path: normalize_path(path),
            imports: ImportMap::new(),
            declarations: Vec::new(),
        }
    }

    /// Normalized path relative to the output root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Adds one import directly.
    pub fn add_import(&mut self, module: &str, name: &str) {
        self.imports
            .entry(module.to_string())
            .or_default()
            .insert(name.to_string());
    }

    /// Adds every import collected in `scope`.
    pub fn merge_imports(&mut self, scope: ImportScope) {
        for (module, names) in scope.imports {
            self.imports.entry(module).or_default().extend(names);
        }
    }

    /// Names imported from `module`.
    pub fn imports_from(&self, module: &str) -> Option<&BTreeSet<String>> {
        self.imports.get(module)
    }

    /// Number of distinct import statements.
    pub fn import_count(&self) -> usize {
        self.imports.len()
    }

    pub fn add_declaration(&mut self, declaration: Declaration) {
        self.declarations.push(declaration);
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Finds a declaration by exported name.
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name() == name)
    }

    /// Renders the file as formatted TypeScript.
    pub fn render(&self) -> String {
        let mut output = String::new();
        output.push_str(FILE_HEADER);
        output.push_str("\n\n");

        if !self.imports.is_empty() {
            for (module, names) in &self.imports {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                output.push_str(&format!(
                    "import {{ {} }} from '{}';\n",
                    names.join(", "),
                    module
                ));
            }
            output.push('\n');
        }

        let rendered: Vec<String> = self.declarations.iter().map(Declaration::render).collect();
        output.push_str(&rendered.join("\n"));
        output
    }
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Enum(EnumDecl),
    Interface(InterfaceDecl),
    TypeAlias(TypeAliasDecl),
    Const(ConstDecl),
    Class(ClassDecl),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Enum(d) => &d.name,
            Declaration::Interface(d) => &d.name,
            Declaration::TypeAlias(d) => &d.name,
            Declaration::Const(d) => &d.name,
            Declaration::Class(d) => &d.name,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Declaration::Enum(d) => d.render(),
            Declaration::Interface(d) => d.render(),
            Declaration::TypeAlias(d) => d.render(),
            Declaration::Const(d) => d.render(),
            Declaration::Class(d) => d.render(),
        }
    }
}

/// `export enum`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnumDecl {
    pub name: String,
    pub docs: Vec<String>,
    /// `(identifier, literal value)` pairs.
    pub members: Vec<(String, String)>,
}

impl EnumDecl {
    fn render(&self) -> String {
        let mut out = render_docs(&self.docs, "");
        out.push_str(&format!("export enum {} {{\n", self.name));
        for (ident, value) in &self.members {
            out.push_str(&format!("  {} = {},\n", ident, value));
        }
        out.push_str("}\n");
        out
    }
}

/// `export interface`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InterfaceDecl {
    pub name: String,
    pub docs: Vec<String>,
    pub extends: Vec<String>,
    pub properties: Vec<PropertyDecl>,
    /// Value type of an `[key: string]` index signature.
    pub index_signature: Option<String>,
}

impl InterfaceDecl {
    fn render(&self) -> String {
        let mut out = render_docs(&self.docs, "");
        out.push_str(&format!("export interface {}", self.name));
        if !self.extends.is_empty() {
            out.push_str(&format!(" extends {}", self.extends.join(", ")));
        }
        out.push_str(" {\n");
        for property in &self.properties {
            out.push_str(&render_docs(&property.docs, "  "));
            out.push_str(&format!("  {};\n", property.signature()));
        }
        if let Some(value) = &self.index_signature {
            out.push_str(&format!("  [key: string]: {};\n", value));
        }
        out.push_str("}\n");
        out
    }
}

/// One interface property.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyDecl {
    pub name: String,
    pub type_expr: String,
    pub optional: bool,
    pub docs: Vec<String>,
}

impl PropertyDecl {
    /// `name?: Type` without the trailing semicolon.
    pub fn signature(&self) -> String {
        format!(
            "{}{}: {}",
            super::ts_types::property_key(&self.name),
            if self.optional { "?" } else { "" },
            self.type_expr
        )
    }
}

/// `export type X = ...`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeAliasDecl {
    pub name: String,
    pub docs: Vec<String>,
    pub type_expr: String,
}

impl TypeAliasDecl {
    fn render(&self) -> String {
        let mut out = render_docs(&self.docs, "");
        out.push_str(&format!("export type {} = {};\n", self.name, self.type_expr));
        out
    }
}

/// `export const`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConstDecl {
    pub name: String,
    pub docs: Vec<String>,
    pub type_annotation: Option<String>,
    pub initializer: String,
}

impl ConstDecl {
    fn render(&self) -> String {
        let mut out = render_docs(&self.docs, "");
        match &self.type_annotation {
            Some(ty) => out.push_str(&format!(
                "export const {}: {} = {};\n",
                self.name, ty, self.initializer
            )),
            None => out.push_str(&format!("export const {} = {};\n", self.name, self.initializer)),
        }
        out
    }
}

/// `export class` with decorators.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassDecl {
    pub name: String,
    pub docs: Vec<String>,
    pub decorators: Vec<String>,
    pub implements: Vec<String>,
    /// Constructor parameter list, rendered with an empty body.
    pub constructor: Option<String>,
    pub methods: Vec<MethodDecl>,
}

impl ClassDecl {
    /// Whether a method with this name already exists.
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m.name == name)
    }

    fn render(&self) -> String {
        let mut out = render_docs(&self.docs, "");
        for decorator in &self.decorators {
            out.push_str(&format!("{}\n", decorator));
        }
        out.push_str(&format!("export class {}", self.name));
        if !self.implements.is_empty() {
            out.push_str(&format!(" implements {}", self.implements.join(", ")));
        }
        out.push_str(" {\n");

        let mut members = Vec::new();
        if let Some(params) = &self.constructor {
            members.push(format!("  constructor({}) {{}}\n", params));
        }
        members.extend(self.methods.iter().map(MethodDecl::render));
        out.push_str(&members.join("\n"));

        out.push_str("}\n");
        out
    }
}

/// A class method.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MethodDecl {
    pub name: String,
    pub docs: Vec<String>,
    pub decorators: Vec<String>,
    pub parameters: Vec<ParameterDecl>,
    pub return_type: String,
    pub body: Vec<String>,
}

impl MethodDecl {
    fn render(&self) -> String {
        let mut out = render_docs(&self.docs, "  ");
        for decorator in &self.decorators {
            out.push_str(&format!("  {}\n", decorator));
        }
        let params: Vec<String> = self.parameters.iter().map(ParameterDecl::render).collect();
        out.push_str(&format!(
            "  {}({}): {} {{\n",
            self.name,
            params.join(", "),
            self.return_type
        ));
        for line in &self.body {
            out.push_str(&format!("    {}\n", line));
        }
        out.push_str("  }\n");
        out
    }
}

/// A method parameter with an optional binding decorator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterDecl {
    pub decorator: Option<String>,
    pub name: String,
    pub type_expr: String,
    pub optional: bool,
}

impl ParameterDecl {
    fn render(&self) -> String {
        let decorator = self
            .decorator
            .as_ref()
            .map(|d| format!("{} ", d))
            .unwrap_or_default();
        format!(
            "{}{}{}: {}",
            decorator,
            self.name,
            if self.optional { "?" } else { "" },
            self.type_expr
        )
    }
}

/// Builds documentation lines from an optional title and description.
pub fn doc_lines(title: Option<&str>, description: Option<&str>) -> Vec<String> {
    [title, description]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .flat_map(|s| s.lines().map(|l| l.trim_end().to_string()))
        .collect()
}

fn render_docs(docs: &[String], indent: &str) -> String {
    if docs.is_empty() {
        return String::new();
    }
    let mut out = format!("{}/**\n", indent);
    for line in docs {
        let line = line.replace("*/", "*\\/");
        if line.is_empty() {
            out.push_str(&format!("{} *\n", indent));
        } else {
            out.push_str(&format!("{} * {}\n", indent, line));
        }
    }
    out.push_str(&format!("{} */\n", indent));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_paths() {
        assert_eq!(normalize_path("/example//order/./types.ts"), "example/order/types.ts");
        assert_eq!(normalize_path("a/b/../c"), "a/c");
        assert_eq!(model_file_path("/"), "types.ts");
        assert_eq!(model_file_path("/example/order"), "example/order/types.ts");
    }

    #[test]
    fn relative_modules() {
        assert_eq!(
            relative_module("example/order/types.ts", "example/common/types.ts"),
            "../common/types"
        );
        assert_eq!(
            relative_module("example/order/queryClient.ts", "example/order/types.ts"),
            "./types"
        );
        assert_eq!(relative_module("types.ts", "ai/types.ts"), "./ai/types");
        assert_eq!(relative_module("ai/types.ts", "types.ts"), "../types");
    }

    #[test]
    fn import_scope_skips_same_file() {
        let mut scope = ImportScope::for_file("x/types.ts");
        scope.add_model(&ModelInfo::new("A", "/x"));
        assert!(scope.is_empty());

        scope.add_model(&ModelInfo::new("B", "/y"));
        scope.add_model(&ModelInfo::new("B", "/y"));
        scope.add_model(&ModelInfo::new("CommandResult", "@ahoo-wang/fetcher-wow"));

        let mut file = SourceFile::new("x/types.ts");
        file.merge_imports(scope);
        assert_eq!(file.import_count(), 2);
        assert_eq!(file.imports_from("../y/types").unwrap().len(), 1);
        assert!(file
            .imports_from("@ahoo-wang/fetcher-wow")
            .unwrap()
            .contains("CommandResult"));
    }

    #[test]
    fn renders_declarations() {
        let mut file = SourceFile::new("x/types.ts");
        file.add_import("../y/types", "B");
        file.add_declaration(Declaration::Enum(EnumDecl {
            name: "Status".to_string(),
            docs: vec!["Order status".to_string()],
            members: vec![("CREATED".to_string(), "'CREATED'".to_string())],
        }));
        file.add_declaration(Declaration::Interface(InterfaceDecl {
            name: "A".to_string(),
            extends: vec!["B".to_string()],
            properties: vec![
                PropertyDecl {
                    name: "id".to_string(),
                    type_expr: "string".to_string(),
                    ..Default::default()
                },
                PropertyDecl {
                    name: "x-tag".to_string(),
                    type_expr: "number".to_string(),
                    optional: true,
                    ..Default::default()
                },
            ],
            ..Default::default()
        }));

        let text = file.render();
        assert!(text.starts_with(FILE_HEADER));
        assert!(text.contains("import { B } from '../y/types';\n"));
        assert!(text.contains("/**\n * Order status\n */\nexport enum Status {\n  CREATED = 'CREATED',\n}\n"));
        assert!(text.contains("export interface A extends B {\n  id: string;\n  'x-tag'?: number;\n}\n"));
    }

    #[test]
    fn renders_class_with_decorated_methods() {
        let class = ClassDecl {
            name: "OrderApiClient".to_string(),
            decorators: vec!["@api('/order')".to_string()],
            implements: vec!["ApiMetadataCapable".to_string()],
            constructor: Some("public readonly apiMetadata?: ApiMetadata".to_string()),
            methods: vec![MethodDecl {
                name: "get".to_string(),
                decorators: vec!["@get('/{id}')".to_string()],
                parameters: vec![ParameterDecl {
                    decorator: Some("@path('id')".to_string()),
                    name: "id".to_string(),
                    type_expr: "string".to_string(),
                    optional: false,
                }],
                return_type: "Promise<any>".to_string(),
                body: vec!["throw autoGeneratedError(id);".to_string()],
                ..Default::default()
            }],
            ..Default::default()
        };
        let text = Declaration::Class(class).render();
        assert!(text.contains("@api('/order')\nexport class OrderApiClient implements ApiMetadataCapable {\n"));
        assert!(text.contains("  constructor(public readonly apiMetadata?: ApiMetadata) {}\n"));
        assert!(text.contains("  @get('/{id}')\n  get(@path('id') id: string): Promise<any> {\n    throw autoGeneratedError(id);\n  }\n"));
    }

    #[test]
    fn doc_lines_order_and_filtering() {
        assert_eq!(
            doc_lines(Some("Title"), Some("Line 1\nLine 2")),
            vec!["Title", "Line 1", "Line 2"]
        );
        assert!(doc_lines(Some(" "), None).is_empty());
    }
}
