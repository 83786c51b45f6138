//! TypeScript code generation from the resolved document.
//!
//! Generators run in a fixed order over one shared [`Project`]:
//! - Models (`<path>/types.ts`, one declaration per component schema)
//! - Query clients (`<context>/<aggregate>/queryClient.ts`)
//! - Command clients (`<context>/<aggregate>/commandClient.ts`)
//! - API clients (`<alias>/<Tag>ApiClient.ts`)
//!
//! Clients only need the names of model types, which the naming rules give
//! without looking at generated declarations, but models still run first.

pub mod api_client;
pub mod client;
pub mod command_client;
pub mod model;
pub mod query_client;
pub mod source;
pub mod ts_types;
pub mod type_resolver;

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::diagnostic::{CompilerError, Skipped};
use crate::frontend::Resolution;
use crate::ir::Document;

pub use source::{normalize_path, Declaration, ImportScope, SourceFile};
pub use type_resolver::TypeResolver;

/// Read-only inputs shared by every generator.
pub struct GenerateContext<'a> {
    pub document: &'a Document,
    pub resolution: &'a Resolution,
    pub config: &'a GeneratorConfig,
    pub resolver: TypeResolver<'a>,
}

impl<'a> GenerateContext<'a> {
    pub fn new(
        document: &'a Document,
        resolution: &'a Resolution,
        config: &'a GeneratorConfig,
    ) -> Self {
        Self {
            document,
            resolution,
            config,
            resolver: TypeResolver::new(document),
        }
    }

    /// Bounded-context alias declared by the document.
    pub fn context_alias(&self) -> Option<&'a str> {
        self.document.context_alias()
    }
}

/// The in-memory file tree of one generation run.
#[derive(Debug, Default)]
pub struct Project {
    files: BTreeMap<String, SourceFile>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the file at `path`, creating it on first use.
    pub fn file(&mut self, path: &str) -> &mut SourceFile {
        let key = normalize_path(path);
        self.files.entry(key).or_insert_with_key(|key| {
            debug!(path = %key, "new source file");
            SourceFile::new(key)
        })
    }

    /// Looks up an existing file.
    pub fn get(&self, path: &str) -> Option<&SourceFile> {
        self.files.get(&normalize_path(path))
    }

    /// Files in path order.
    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Counters and skips collected while generating.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub models: usize,
    pub query_clients: usize,
    pub command_clients: usize,
    pub api_clients: usize,
    pub skipped: Vec<Skipped>,
}

impl GenerationReport {
    /// Records an item left out of the output.
    pub fn skip(&mut self, item: impl Into<String>, error: &CompilerError) {
        self.skipped.push(Skipped::new(item, error));
    }
}

/// One generation pass over the project.
pub trait Generator {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Adds this generator's declarations to `project`.
    fn generate(
        &self,
        ctx: &GenerateContext<'_>,
        project: &mut Project,
        report: &mut GenerationReport,
    ) -> Result<(), CompilerError>;
}

/// Generated TypeScript code.
#[derive(Debug, Clone)]
pub struct GeneratedCode {
    /// `(relative path, content)` pairs in path order.
    pub files: Vec<(String, String)>,
    pub report: GenerationReport,
}

/// Runs every generator and renders the resulting files.
pub fn generate(ctx: &GenerateContext<'_>) -> Result<GeneratedCode, CompilerError> {
    let generators: [&dyn Generator; 4] = [
        &model::ModelGenerator,
        &query_client::QueryClientGenerator,
        &command_client::CommandClientGenerator,
        &api_client::ApiClientGenerator,
    ];

    let mut project = Project::new();
    let mut report = GenerationReport::default();
    for generator in generators {
        debug!(generator = generator.name(), "running generator");
        generator.generate(ctx, &mut project, &mut report)?;
    }

    let files: Vec<(String, String)> = project
        .files()
        .filter(|file| !file.declarations().is_empty())
        .map(|file| (file.path().to_string(), file.render()))
        .collect();

    info!(
        files = files.len(),
        models = report.models,
        query_clients = report.query_clients,
        command_clients = report.command_clients,
        api_clients = report.api_clients,
        skipped = report.skipped.len(),
        "generation finished"
    );

    Ok(GeneratedCode { files, report })
}
