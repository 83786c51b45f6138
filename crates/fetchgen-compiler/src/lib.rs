//! # fetchgen Compiler
//!
//! This crate turns an OpenAPI document describing a Wow service into
//! TypeScript models and decorator-based fetch clients.
//!
//! ## Architecture
//!
//! ```text
//! OpenAPI (JSON / YAML)
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Frontend   │  Parse document, resolve aggregates
//! │ (text → IR)  │
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │      IR      │  Document model, naming rules,
//! │              │  aggregate definitions
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Validate   │  Naming collisions, structure checks
//! │    (IR)      │
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Codegen    │  Models, query / command / API clients
//! │  (IR → TS)   │
//! └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fetchgen_compiler::{Compiler, CompilerConfig, InputSource};
//!
//! let config = CompilerConfig {
//!     input: InputSource::parse("openapi.json")?,
//!     out_dir: "src/generated".into(),
//!     ..Default::default()
//! };
//!
//! let result = Compiler::new(config).compile()?;
//! println!("{} files", result.files.len());
//! ```

pub mod codegen;
pub mod config;
pub mod diagnostic;
pub mod frontend;
pub mod ir;
pub mod validate;

use std::path::Path;

use tracing::{debug, info};

pub use config::{CompilerConfig, GeneratorConfig, InputSource};
pub use diagnostic::{CompilerError, Skipped};
pub use ir::Document;

/// The main compiler struct that orchestrates the generation pipeline.
pub struct Compiler {
    config: CompilerConfig,
}

/// Result of a compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileResult {
    /// Number of model declarations generated.
    pub models: usize,
    /// Number of aggregates found.
    pub aggregates: usize,
    /// Number of API tag clients generated.
    pub api_clients: usize,
    /// Generated files, relative to the output directory.
    pub files: Vec<String>,
    /// Schemas and operations left out of the output.
    pub skipped: Vec<Skipped>,
}

impl Compiler {
    /// Creates a new compiler with the given configuration.
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles the configured input.
    ///
    /// URL inputs have to be fetched by the caller and passed to [`Compiler::compile_text`].
    pub fn compile(&self) -> Result<CompileResult, CompilerError> {
        let document = self.load_document()?;
        self.compile_document(&document)
    }

    /// Compiles an already fetched document.
    pub fn compile_text(&self, text: &str, source_name: &str) -> Result<CompileResult, CompilerError> {
        let document = frontend::parse_document(text, source_name)?;
        self.compile_document(&document)
    }

    /// Reads and parses the configured input file.
    pub fn load_document(&self) -> Result<Document, CompilerError> {
        match &self.config.input {
            InputSource::Path(path) => frontend::load_document(path),
            InputSource::Url(url) => Err(CompilerError::FetchFailed {
                url: url.clone(),
                message: "remote documents must be fetched before compiling".to_string(),
            }),
        }
    }

    /// Loads the generator configuration.
    ///
    /// The file may be absent when it is the default one.
    pub fn load_generator_config(&self) -> Result<GeneratorConfig, CompilerError> {
        let path = &self.config.config_path;
        let explicit = path != Path::new(config::DEFAULT_CONFIG_FILE);
        GeneratorConfig::load(path, explicit)
    }

    /// Runs the pipeline on a parsed document.
    ///
    /// 1. Resolve aggregates and API tags
    /// 2. Validate naming and structure
    /// 3. Generate TypeScript code
    /// 4. Write output files, unless this is a dry run
    pub fn compile_document(&self, document: &Document) -> Result<CompileResult, CompilerError> {
        let generator_config = self.load_generator_config()?;

        // Phase 1: Resolve
        let resolution = frontend::AggregateResolver::new(document).resolve();

        // Phase 2: Validate
        validate::validate(document, &resolution)?;

        // Phase 3: Generate
        let ctx = codegen::GenerateContext::new(document, &resolution, &generator_config);
        let generated = codegen::generate(&ctx)?;

        // Phase 4: Write output
        if self.config.dry_run {
            info!(files = generated.files.len(), "dry run, nothing written");
        } else {
            self.write_output(&generated)?;
        }

        let mut skipped = resolution.skipped.clone();
        skipped.extend(generated.report.skipped.iter().cloned());

        Ok(CompileResult {
            models: generated.report.models,
            aggregates: resolution.aggregate_count(),
            api_clients: generated.report.api_clients,
            files: generated.files.iter().map(|(path, _)| path.clone()).collect(),
            skipped,
        })
    }

    /// Writes generated code to the output directory.
    pub fn write_output(&self, generated: &codegen::GeneratedCode) -> Result<(), CompilerError> {
        let out_dir = &self.config.out_dir;
        std::fs::create_dir_all(out_dir).map_err(|e| CompilerError::io(out_dir, e.to_string()))?;

        for (filename, content) in &generated.files {
            let path = out_dir.join(filename);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CompilerError::io(parent, e.to_string()))?;
            }
            std::fs::write(&path, content).map_err(|e| CompilerError::io(&path, e.to_string()))?;
            debug!(path = %path.display(), "wrote file");
        }

        info!(
            files = generated.files.len(),
            out_dir = %out_dir.display(),
            "output written"
        );
        Ok(())
    }
}
