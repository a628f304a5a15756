//! OpenAPI example generator CLI
//!
//! Command-line interface for synthesizing request/response examples from
//! OpenAPI documents.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use oas_examples::{
    assemble_document, load_callables, load_config, load_document_auto, ApiDocument,
    CallableRegistry, Direction, EngineConfig, ExampleEngine, LoadError, TypeInferencer,
};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oas-examples")]
#[command(about = "Generate example payloads from OpenAPI documents")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EngineArgs {
    /// Engine configuration file (field generators, vocabulary, limits)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Callable descriptor file for computed fields
    #[arg(long)]
    callables: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize one example for a named component schema
    Synthesize {
        /// API document: file path or URL (http:// or https://)
        document: String,

        /// Component schema name, e.g. User
        #[arg(long)]
        schema: String,

        /// Synthesize a request payload (hides readOnly fields)
        #[arg(
            long,
            conflicts_with = "response",
            required_unless_present = "response"
        )]
        request: bool,

        /// Synthesize a response payload (hides writeOnly fields)
        #[arg(long, conflicts_with = "request", required_unless_present = "request")]
        response: bool,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// List the example variants for a named component schema
    Examples {
        /// API document: file path or URL (http:// or https://)
        document: String,

        /// Component schema name, e.g. User
        #[arg(long)]
        schema: String,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Infer the type of a computed field
    Infer {
        /// Callable descriptor file
        #[arg(long)]
        callables: PathBuf,

        /// Type declaring the field, e.g. UserSerializer
        #[arg(long = "type")]
        owner: String,

        /// Field name
        #[arg(long)]
        field: String,

        /// Engine configuration file (vocabulary)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Assemble request and response examples for every endpoint
    Assemble {
        /// API document: file path or URL (http:// or https://)
        document: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        engine: EngineArgs,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Synthesize {
            document,
            schema,
            request,
            response: _,
            engine,
        } => {
            let direction = Direction::from_request_flag(request);
            run_synthesize(&document, &schema, direction, &engine)
        }

        Commands::Examples {
            document,
            schema,
            engine,
        } => run_examples(&document, &schema, &engine),

        Commands::Infer {
            callables,
            owner,
            field,
            config,
            pretty,
        } => run_infer(&callables, &owner, &field, config.as_deref(), pretty),

        Commands::Assemble {
            document,
            output,
            engine,
        } => run_assemble(&document, output, &engine),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_synthesize(
    source: &str,
    schema: &str,
    direction: Direction,
    args: &EngineArgs,
) -> Result<(), u8> {
    let document = load_document_auto(source).map_err(report)?;
    let engine = build_engine(&document, args)?;
    let fragment = schema_ref(&document, schema)?;

    let example = engine.synthesize(&fragment, direction);
    write_output(&example, args.pretty, None)
}

fn run_examples(source: &str, schema: &str, args: &EngineArgs) -> Result<(), u8> {
    let document = load_document_auto(source).map_err(report)?;
    let engine = build_engine(&document, args)?;
    let fragment = schema_ref(&document, schema)?;

    let examples = engine.examples(&fragment);
    write_output(&examples, args.pretty, None)
}

fn run_infer(
    callables_path: &Path,
    owner: &str,
    field: &str,
    config: Option<&Path>,
    pretty: bool,
) -> Result<(), u8> {
    let callables = load_callables(callables_path).map_err(report)?;
    let config = match config {
        Some(path) => load_config(path).map_err(report)?,
        None => EngineConfig::default(),
    };

    let Some(callable) = callables.lookup(owner, field) else {
        eprintln!("Error: no callable for field '{}' on '{}'", field, owner);
        return Err(1);
    };

    let fragment = TypeInferencer::new(config.vocabulary).infer(callable);
    write_output(&fragment, pretty, None)
}

fn run_assemble(source: &str, output: Option<PathBuf>, args: &EngineArgs) -> Result<(), u8> {
    let document = load_document_auto(source).map_err(report)?;
    let engine = build_engine(&document, args)?;

    let examples = assemble_document(&document, &engine);
    info!(
        endpoints = examples.endpoints.len(),
        schemas = document.registry().len(),
        "assembled examples"
    );
    write_output(&examples, args.pretty, output.as_deref())
}

// --- Helpers ---

fn build_engine(document: &ApiDocument, args: &EngineArgs) -> Result<ExampleEngine, u8> {
    let config = match &args.config {
        Some(path) => load_config(path).map_err(report)?,
        None => EngineConfig::default(),
    };
    let callables = match &args.callables {
        Some(path) => load_callables(path).map_err(report)?,
        None => CallableRegistry::new(),
    };

    Ok(ExampleEngine::from_config(document.registry().clone(), config).with_callables(callables))
}

/// `$ref` fragment naming a component schema; exit code 1 if it doesn't exist.
fn schema_ref(document: &ApiDocument, name: &str) -> Result<serde_json::Value, u8> {
    if document.registry().get(name).is_none() {
        eprintln!("Error: schema '{}' not found in components.schemas", name);
        return Err(1);
    }
    let escaped = name.replace('~', "~0").replace('/', "~1");
    Ok(json!({ "$ref": format!("#/components/schemas/{}", escaped) }))
}

fn report(err: LoadError) -> u8 {
    eprintln!("Error: {}", err);
    err.exit_code() as u8
}

fn write_output<T: Serialize>(value: &T, pretty: bool, output: Option<&Path>) -> Result<(), u8> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(path, &text).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", text);
        }
    }

    Ok(())
}
