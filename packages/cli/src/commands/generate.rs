use super::write_output;
use crate::config::Config;
use anyhow::{anyhow, bail, Result};
use clap::Args;
use colored::Colorize;
use folio_editor::{render_html, GenerationRequest, LoadMode, ReportSession, ReportType};
use folio_workspace::{HttpReportGenerator, HttpVersionStore};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// What the report should cover
    pub description: String,

    /// Report type (written, analytics, comprehensive)
    #[arg(short = 't', long, default_value = "written")]
    pub report_type: String,

    /// Model to generate with (overrides config)
    #[arg(short, long)]
    pub model: Option<String>,

    /// 0 favours speed, 100 favours quality
    #[arg(long, default_value_t = 50)]
    pub performance: u8,

    /// Annotate claims with confidence levels
    #[arg(long)]
    pub factual_confidence: bool,

    /// Mark the report as a draft
    #[arg(long)]
    pub draft: bool,

    /// Cite sources inline
    #[arg(long)]
    pub source_citations: bool,

    /// Load the result at once instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Write the rendered report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn report_type(name: &str) -> Result<ReportType> {
    match name {
        "written" => Ok(ReportType::Written),
        "analytics" => Ok(ReportType::Analytics),
        "comprehensive" => Ok(ReportType::Comprehensive),
        other => bail!(
            "Invalid report type: {}. Use: written, analytics, or comprehensive",
            other
        ),
    }
}

fn build_request(args: &GenerateArgs, config: &Config) -> Result<GenerationRequest> {
    let model = args.model.clone().unwrap_or_else(|| config.default_model.clone());
    let mut request = GenerationRequest::new(args.description.clone(), model);
    request.report_type = report_type(&args.report_type)?;
    request.performance_level = args.performance;
    request.factual_confidence = args.factual_confidence;
    request.draft_mode = args.draft;
    request.source_citations = args.source_citations;
    request.validate()?;
    Ok(request)
}

pub fn generate(args: GenerateArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let request = build_request(&args, &config)?;
    let mode = if args.no_stream {
        LoadMode::Immediate
    } else {
        LoadMode::Stream
    };

    println!(
        "{} {} report with {}",
        "📝".bright_blue(),
        args.report_type,
        request.selected_model
    );

    let runtime = tokio::runtime::Runtime::new()?;
    let (html, store_error) = runtime.block_on(async {
        let session = ReportSession::new(
            Arc::new(HttpReportGenerator::new(config.api_url.clone())),
            Arc::new(HttpVersionStore::new(config.api_url.clone())),
            config.editor_config(),
        )
        .with_mode(mode);

        if config.version_control {
            // failures land in last_error and are reported below
            let _ = session.controller().load_versions().await;
        }

        let document = session
            .generate(&request)
            .await?
            .ok_or_else(|| anyhow!("generation was interrupted"))?;
        let store_error = session.controller().last_error();
        session.shutdown();
        Ok::<_, anyhow::Error>((render_html(&document), store_error))
    })?;

    if let Some(message) = store_error {
        eprintln!("{} {}", "⚠️".yellow(), message);
    }

    match &args.output {
        Some(output) => {
            let path = write_output(cwd, output, html.as_bytes())?;
            println!("  {} Wrote {}", "✓".green(), path.display());
        }
        None => println!("{}", html),
    }
    Ok(())
}
