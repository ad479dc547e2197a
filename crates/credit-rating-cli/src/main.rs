mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::altman::AltmanArgs;
use commands::rate::RateArgs;

/// Deterministic corporate issuer credit ratings
#[derive(Parser)]
#[command(
    name = "cra",
    version,
    about = "Deterministic corporate issuer credit ratings",
    long_about = "A CLI for assigning corporate issuer credit ratings with decimal \
                  precision. Scores financial ratios against configurable grids, blends \
                  in qualitative factors and peer positioning, applies distress \
                  hardstops and a sovereign cap, and reports the full rating chain \
                  with an outlook."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Rate an issuer from quantitative and qualitative inputs
    Rate(RateArgs),
    /// Calculate the Altman Z-Score from statement components
    Altman(AltmanArgs),
    /// Print the built-in rating configuration
    DefaultConfig,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    // Diagnostics go to stderr so piped stdout stays parseable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Rate(args) => commands::rate::run_rate(args),
        Commands::Altman(args) => commands::altman::run_altman(args),
        Commands::DefaultConfig => {
            serde_json::to_value(credit_rating_core::EngineConfig::default()).map_err(Into::into)
        }
        Commands::Version => {
            println!("cra {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
