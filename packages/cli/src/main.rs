mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    export, format, generate, init, stream, ExportArgs, FormatArgs, GenerateArgs, InitArgs, StreamArgs,
};
use tracing_subscriber::EnvFilter;

/// Folio CLI - format, stream and export generated reports
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default folio.config.json
    Init(InitArgs),

    /// Format raw report text into the styled surface
    Format(FormatArgs),

    /// Generate a report through the configured API
    Generate(GenerateArgs),

    /// Reveal a report character by character
    Stream(StreamArgs),

    /// Write a standalone HTML page
    Export(ExportArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| {
            let cwd = cwd.display().to_string();
            match cli.command {
                Command::Init(args) => init(args, &cwd),
                Command::Format(args) => format(args, &cwd),
                Command::Generate(args) => generate(args, &cwd),
                Command::Stream(args) => stream(args, &cwd),
                Command::Export(args) => export(args, &cwd),
            }
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
