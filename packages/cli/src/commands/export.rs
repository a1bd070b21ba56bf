use super::{read_input, write_output};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_editor::{export_document, format_to_html, ExportOptions};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Raw report text (or surface markup) to export
    pub input: PathBuf,

    /// Destination HTML file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Document title
    #[arg(long, default_value = "Report")]
    pub title: String,

    /// Write the page without indentation
    #[arg(long)]
    pub compact: bool,
}

pub fn export(args: ExportArgs, cwd: &str) -> Result<()> {
    let raw = read_input(cwd, &args.input)?;
    let options = ExportOptions {
        title: args.title.clone(),
        pretty: !args.compact,
        ..ExportOptions::default()
    };

    let page = export_document(&format_to_html(&raw), &options);
    let path = write_output(cwd, &args.output, page.as_bytes())?;

    println!(
        "  {} Exported {} → {}",
        "✓".green(),
        args.input.display(),
        path.display()
    );
    Ok(())
}
