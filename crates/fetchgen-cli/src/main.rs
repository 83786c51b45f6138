//! fetchgen CLI.
//!
//! Generates TypeScript models and fetch clients from a Wow OpenAPI document.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fetchgen_compiler::config::{DEFAULT_CONFIG_FILE, DEFAULT_OUT_DIR};
use fetchgen_compiler::{CompileResult, Compiler, CompilerConfig, CompilerError, InputSource};

mod ui;

/// Exit code for failed generation.
const EXIT_FAILURE: u8 = 1;

/// Exit code for input that is neither a URL nor a path.
const EXIT_INVALID_INPUT: u8 = 2;

/// Exit code after Ctrl-C.
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "fetchgen", version)]
#[command(about = "Generate TypeScript clients from Wow OpenAPI documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate models and clients
    Generate(GenerateArgs),
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    /// OpenAPI document: a local JSON/YAML file or an http(s) URL
    #[arg(short, long)]
    input: String,

    /// Output directory for generated files
    #[arg(short, long, default_value = DEFAULT_OUT_DIR)]
    output: PathBuf,

    /// Generator configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log generator decisions
    #[arg(short, long)]
    verbose: bool,

    /// Render everything without writing files
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => {
            init_tracing(args.verbose);

            tokio::select! {
                result = generate(args) => match result {
                    Ok(()) => ExitCode::SUCCESS,
                    Err(report) => {
                        ui::error_header();
                        eprintln!("{:?}", report);
                        ExitCode::from(exit_status(&report))
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    ui::error("Interrupted.");
                    // The blocking generation task cannot be cancelled.
                    std::process::exit(i32::from(EXIT_INTERRUPTED));
                }
            }
        }
    }
}

/// `--verbose` lowers the default level to debug; `RUST_LOG` wins over both.
fn init_tracing(verbose: bool) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) if verbose => "debug".to_string(),
        Err(_) => "warn".to_string(),
    };
    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(verbose)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn exit_status(report: &miette::Report) -> u8 {
    match report.downcast_ref::<CompilerError>() {
        Some(err) if err.is_invalid_input() => EXIT_INVALID_INPUT,
        _ => EXIT_FAILURE,
    }
}

/// Runs one generation.
async fn generate(args: GenerateArgs) -> miette::Result<()> {
    let start = Instant::now();
    let input = InputSource::parse(&args.input)?;

    ui::print_compact_header(env!("CARGO_PKG_VERSION"));
    println!();

    let config = CompilerConfig {
        input: input.clone(),
        out_dir: args.output.clone(),
        config_path: args.config,
        dry_run: args.dry_run,
    };
    let compiler = Compiler::new(config);

    let text = match &input {
        InputSource::Url(url) => {
            let spinner = ui::spinner(&format!("Fetching {}...", url));
            let text = fetch(url).await;
            spinner.finish_and_clear();
            Some(text?)
        }
        InputSource::Path(_) => None,
    };

    let spinner = ui::spinner(&format!("Generating from {}...", input.display_name()));
    let source_name = input.display_name();
    let result = tokio::task::spawn_blocking(move || match text {
        Some(text) => compiler.compile_text(&text, &source_name),
        None => compiler.compile(),
    })
    .await
    .into_diagnostic()?;
    spinner.finish_and_clear();
    let result = result?;

    print_summary(&result, &args.output, args.dry_run);
    ui::timing("Done", start.elapsed().as_millis());
    Ok(())
}

/// Downloads a remote document.
async fn fetch(url: &str) -> Result<String, CompilerError> {
    let fetch_failed = |e: reqwest::Error| CompilerError::FetchFailed {
        url: url.to_string(),
        message: e.to_string(),
    };

    let response = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(fetch_failed)?;
    let text = response.text().await.map_err(fetch_failed)?;
    debug!(url, bytes = text.len(), "fetched document");
    Ok(text)
}

fn print_summary(result: &CompileResult, output: &std::path::Path, dry_run: bool) {
    let verb = if dry_run { "Would generate" } else { "Generated" };
    ui::success(&format!(
        "{} {} files {} {} models {} {} aggregates {} {} API clients",
        verb,
        result.files.len(),
        ui::symbols::DOT,
        result.models,
        ui::symbols::DOT,
        result.aggregates,
        ui::symbols::DOT,
        result.api_clients,
    ));
    println!();
    ui::file_tree(&output.display().to_string(), &result.files);
    println!();

    if !result.skipped.is_empty() {
        ui::dim(&format!("Skipped {}:", result.skipped.len()));
        for skipped in &result.skipped {
            ui::skipped(&skipped.item, &skipped.reason);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_defaults() {
        let cli = Cli::parse_from(["fetchgen", "generate", "--input", "openapi.yaml"]);
        let Commands::Generate(args) = cli.command;
        assert_eq!(args.input, "openapi.yaml");
        assert_eq!(args.output, PathBuf::from("src/generated"));
        assert_eq!(args.config, PathBuf::from("fetchgen.config.json"));
        assert!(!args.verbose);
        assert!(!args.dry_run);
    }

    #[test]
    fn generate_flags() {
        let cli = Cli::parse_from([
            "fetchgen",
            "generate",
            "-i",
            "https://example.com/v3/api-docs",
            "-o",
            "out",
            "--verbose",
            "--dry-run",
        ]);
        let Commands::Generate(args) = cli.command;
        assert_eq!(args.output, PathBuf::from("out"));
        assert!(args.verbose);
        assert!(args.dry_run);
    }

    #[test]
    fn input_is_required() {
        assert!(Cli::try_parse_from(["fetchgen", "generate"]).is_err());
    }

    #[test]
    fn invalid_input_maps_to_exit_code_two() {
        let err = InputSource::parse("  ").unwrap_err();
        let report = miette::Report::new(err);
        assert_eq!(exit_status(&report), 2);

        let report = miette::Report::new(CompilerError::io("missing.json", "not found"));
        assert_eq!(exit_status(&report), 1);
    }
}
