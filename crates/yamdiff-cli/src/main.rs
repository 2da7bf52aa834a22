//! yamdiff CLI - structural diff for YAML documents

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;

#[derive(Parser)]
#[command(name = "yamdiff")]
#[command(version)]
#[command(about = "Structural diff for YAML documents", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (stderr)
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a legal document
    Validate {
        /// Document path
        path: PathBuf,

        /// Emit the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare two YAML documents
    Diff {
        /// Old document path
        old: PathBuf,

        /// New document path
        new: PathBuf,

        /// Diff mode
        #[arg(long, default_value = "auto")]
        mode: String,

        /// Identity rule ARRAY:FIELD[:WHEN_FIELD=WHEN_VALUE]; repeatable
        #[arg(long = "identity-rule")]
        identity_rules: Vec<String>,

        /// Output format (json, text, yaml)
        #[arg(long = "format", default_value = "text")]
        format: String,

        /// Write the formatted report to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Keep UNCHANGED records in the output
        #[arg(long)]
        include_unchanged: bool,

        /// Keep only these change kinds (e.g. KEY_RENAMED); repeatable
        #[arg(long = "kind")]
        kinds: Vec<String>,
    },
}

fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = match cli.command {
        Commands::Validate { path, json } => commands::validate::run(&path, json),
        Commands::Diff {
            old,
            new,
            mode,
            identity_rules,
            format,
            output,
            include_unchanged,
            kinds,
        } => commands::diff::run(
            &old,
            &new,
            &mode,
            &identity_rules,
            &format,
            output.as_deref(),
            include_unchanged,
            &kinds,
        ),
    };

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
