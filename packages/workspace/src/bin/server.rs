use anyhow::Context;
use clap::Parser;
use folio_editor::MemoryVersionStore;
use folio_workspace::{router, AppState, ProcessChartRenderer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "folio-server")]
#[command(about = "Serve report versions and chart rendering over HTTP", version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3003)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Answer version requests with 403
    #[arg(long)]
    disable_version_control: bool,

    /// Visualization script run for each chart request
    #[arg(long, default_value = "scripts/visualization.py")]
    chart_script: PathBuf,

    /// Interpreter for the chart script
    #[arg(long, default_value = folio_workspace::charts::DEFAULT_PROGRAM)]
    python: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let state = AppState::new(
        Arc::new(MemoryVersionStore::new()),
        Arc::new(ProcessChartRenderer::new(args.python.clone(), args.chart_script.clone())),
    )
    .with_version_control(!args.disable_version_control);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(
        %addr,
        version_control = !args.disable_version_control,
        chart_script = %args.chart_script.display(),
        "folio server listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .context("server error")?;

    Ok(())
}
