use super::read_input;
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use folio_editor::{render_html, StreamState, StreamingRenderer};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Args)]
pub struct StreamArgs {
    /// Raw report text to reveal
    pub input: PathBuf,

    /// Milliseconds per revealed character (overrides config)
    #[arg(long)]
    pub tick_ms: Option<u64>,

    /// Only print the final document
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn stream(args: StreamArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let raw = read_input(cwd, &args.input)?;
    let tick = args
        .tick_ms
        .map(Duration::from_millis)
        .unwrap_or(config.editor_config().stream_tick);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let html = runtime.block_on(drive(raw, tick, args.quiet))?;

    println!("{}", html);
    Ok(())
}

async fn drive(raw: String, tick: Duration, quiet: bool) -> Result<String> {
    let renderer = StreamingRenderer::new(tick);
    let mut frames = renderer.subscribe();
    let handle = renderer.start(raw);
    let id = handle.id();

    if !quiet {
        let mut stderr = std::io::stderr();
        while frames.changed().await.is_ok() {
            let display = frames.borrow_and_update().clone();
            if display.session_id != id {
                continue;
            }
            let frame = display.frame;
            let _ = write!(
                stderr,
                "\r{} {}/{} characters, {} blocks",
                "▸".bright_blue(),
                frame.revealed_len,
                frame.total_len,
                frame.document.len()
            );
            if frame.state == StreamState::Complete {
                let _ = writeln!(stderr);
                break;
            }
        }
    }

    let document = handle
        .finished()
        .await
        .ok_or_else(|| anyhow!("streaming was interrupted"))?;
    Ok(render_html(&document))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_drive_matches_format() {
        let raw = "# Heading\n[Source: Survey] Response rate rose".to_string();
        let html = drive(raw.clone(), Duration::from_millis(15), false).await.unwrap();
        assert_eq!(html, folio_editor::format_to_html(&raw));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_empty_input() {
        let html = drive(String::new(), Duration::from_millis(15), true).await.unwrap();
        assert!(html.contains("No content"));
    }
}
