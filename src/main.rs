use std::process::ExitCode;

use clap::{Parser, Subcommand};
use templex::{ExtractionStrategy, Fragments, Result, Settings, ValueSource};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "templex")]
#[command(about = "Resolve placeholders into text, or extract them back out of it")]
struct Cli {
    /// Settings file; `templex.toml` (or .json, .yaml) is used when present
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the placeholders of a template
    Format { template: String },
    /// Extract values from a text as JSON
    Parse {
        text: String,
        /// One pipe-separated template, or one fragment per argument
        #[arg(required = true)]
        fragments: Vec<String>,
    },
    /// Resolve and evaluate an arithmetic expression
    Calc {
        #[arg(allow_hyphen_values = true)]
        expression: String,
    },
    /// Run a text through a modifier chain
    Modify {
        text: String,
        /// One pipe-separated chain, or one step per argument
        #[arg(required = true, allow_hyphen_values = true)]
        chain: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&settings, cli.command) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            warn!(error = %e, "failed");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &Settings, command: Command) -> Result<String> {
    let engine = settings.engine()?;
    let values = settings.source();
    let sources: [&dyn ValueSource; 1] = [&values];
    match command {
        Command::Format { template } => {
            debug!(template = template.as_str(), "formatting");
            engine.resolve(&template, &sources)
        }
        Command::Calc { expression } => {
            debug!(expression = expression.as_str(), "calculating");
            Ok(engine.calculate(&expression, &sources)?.to_string())
        }
        Command::Parse { text, fragments } => {
            let owned = settings.strategies();
            let strategies: Vec<&dyn ExtractionStrategy> = owned.iter().map(|s| &**s).collect();
            let extraction = engine.extract(&text, fragment_list(fragments), &strategies)?;
            Ok(serde_json::to_string_pretty(&extraction)?)
        }
        Command::Modify { text, chain } => engine.transform(&text, fragment_list(chain), &sources),
    }
}

// a single argument may still hold several pipe-separated pieces
fn fragment_list(mut pieces: Vec<String>) -> Fragments {
    match pieces.len() {
        1 => Fragments::from(pieces.remove(0)),
        _ => Fragments::from(pieces),
    }
}
