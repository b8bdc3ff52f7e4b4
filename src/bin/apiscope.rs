//! apiscope CLI: walks a project root, dispatches every registered
//! framework plugin, and prints the resulting `{routes, schemas}` document.
//!
//! Argument parsing, output formatting and the exit-code convention live
//! here, outside the engine proper (spec.md §1 treats the CLI as a caller).

use apiscope::plugins::global_registry;
use apiscope::scan::{DefaultWalker, FileWalker, WalkConfig};
use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "apiscope", version, about = "Extract an HTTP API surface from a multi-language source tree")]
struct Cli {
    /// Project root to scan.
    root: String,

    /// Restrict dispatch to these plugin names (comma-separated), e.g. "express,rails".
    #[arg(long, value_delimiter = ',')]
    plugins: Vec<String>,

    /// Skip plugin dispatch entirely; only report the scanned file set.
    #[arg(long)]
    no_plugins: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,

    /// Print per-plugin detect/skip decisions to stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Serialize)]
struct OutputDocument {
    ir_version: &'static str,
    routes: Vec<apiscope_ir::Route>,
    schemas: Vec<SchemaEntry>,
}

#[derive(Serialize)]
struct SchemaEntry {
    name: String,
    schema: apiscope_ir::Schema,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let walker = DefaultWalker::new();
    let config = WalkConfig::default();

    let files = match walker.walk(&cli.root, &config) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("apiscope: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.verbose {
        eprintln!("apiscope: scanned {} source files under {}", files.len(), cli.root);
    }

    if cli.no_plugins {
        let document = OutputDocument {
            ir_version: apiscope_ir::IR_VERSION,
            routes: Vec::new(),
            schemas: Vec::new(),
        };
        print_document(&document, cli.format);
        return ExitCode::SUCCESS;
    }

    let registry = global_registry();
    let allow_list: Option<Vec<String>> = if cli.plugins.is_empty() { None } else { Some(cli.plugins) };

    let applicable_files: Vec<apiscope_ir::SourceFile> = if let Some(allow) = &allow_list {
        files
            .into_iter()
            .filter(|f| {
                registry
                    .plugins()
                    .iter()
                    .any(|p| allow.iter().any(|name| name == p.name()) && p.extensions().iter().any(|e| f.path.ends_with(e)))
            })
            .collect()
    } else {
        files
    };

    let dispatch_result = match registry.dispatch(&cli.root, &applicable_files) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("apiscope: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.verbose {
        eprintln!("apiscope: applied plugins: {:?}", dispatch_result.applied_plugins);
    }

    let document = OutputDocument {
        ir_version: apiscope_ir::IR_VERSION,
        routes: dispatch_result.routes,
        schemas: dispatch_result
            .schemas
            .into_iter()
            .map(|(name, schema)| SchemaEntry { name, schema })
            .collect(),
    };

    print_document(&document, cli.format);
    ExitCode::SUCCESS
}

fn print_document(document: &OutputDocument, format: OutputFormat) {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(document),
        OutputFormat::Pretty => serde_json::to_string_pretty(document),
    };
    match rendered {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("apiscope: failed to serialize output: {e}"),
    }
}
