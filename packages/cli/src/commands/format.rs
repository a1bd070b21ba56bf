use super::{read_input, write_output};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_editor::{format as format_report, render_html};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct FormatArgs {
    /// Raw report text (or surface markup) to format
    pub input: PathBuf,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Emit the document tree as JSON instead of HTML
    #[arg(long)]
    pub json: bool,
}

pub fn format(args: FormatArgs, cwd: &str) -> Result<()> {
    let raw = read_input(cwd, &args.input)?;
    let rendered = render(&raw, args.json)?;

    match &args.output {
        Some(output) => {
            let path = write_output(cwd, output, rendered.as_bytes())?;
            println!(
                "  {} {} → {}",
                "✓".green(),
                args.input.display(),
                path.display()
            );
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn render(raw: &str, json: bool) -> Result<String> {
    let document = format_report(raw);
    tracing::debug!(nodes = document.len(), "formatted report");
    if json {
        Ok(serde_json::to_string_pretty(&document)?)
    } else {
        Ok(render_html(&document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_parser::Document;

    #[test]
    fn test_render_html_and_json() {
        let html = render("# Title\n[Low Confidence] guess", false).unwrap();
        assert!(html.contains("data-folio"));
        assert!(html.contains("confidence-low"));

        let json = render("# Title", true).unwrap();
        let document: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(document, folio_parser::parse("# Title"));
    }

    #[test]
    fn test_format_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().display().to_string();
        std::fs::write(dir.path().join("report.txt"), "Body text").unwrap();

        format(
            FormatArgs {
                input: PathBuf::from("report.txt"),
                output: Some(PathBuf::from("out/report.html")),
                json: false,
            },
            &cwd,
        )
        .unwrap();

        let written = std::fs::read_to_string(dir.path().join("out/report.html")).unwrap();
        assert_eq!(written, folio_editor::format_to_html("Body text"));
    }
}
