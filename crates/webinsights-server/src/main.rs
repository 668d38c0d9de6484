use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use webinsights_core::{config::Config, MetricsSource};
use webinsights_server::{
    report::{write_report, ReportFormat},
    state::AppState,
};
use webinsights_source::FileMetricsSource;

#[derive(Debug, Parser)]
#[command(name = "webinsights", version)]
#[command(about = "Turn web-traffic metrics into insights, charts and recommendations")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Analyze one date range and write a report file.
    Analyze(AnalyzeArgs),
    /// Exit 0 if the local server answers `GET /health` with 200.
    Health,
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    #[arg(long)]
    property_id: Option<String>,
    /// YYYY-MM-DD; defaults to the configured lookback before the end date.
    #[arg(long)]
    start_date: Option<String>,
    /// YYYY-MM-DD; defaults to today.
    #[arg(long)]
    end_date: Option<String>,
    /// Read the raw bundle from this JSON file instead of the configured source.
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = ReportFormat::Html)]
    output_format: ReportFormat,
    /// Defaults to `WEBINSIGHTS_OUTPUT_DIR`.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

/// `webinsights health`: liveness probe for container health checks.
///
/// Calls `GET http://localhost:$WEBINSIGHTS_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("WEBINSIGHTS_PORT").unwrap_or_else(|_| "5000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Some(Command::Health) = cli.command {
        run_health_check();
    }

    // Structured JSON logging. Level controlled via RUST_LOG env var.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("webinsights=info".parse()?),
        )
        .json()
        .init();

    let cfg = Config::from_env().map_err(|e| anyhow!(e))?;

    match cli.command {
        Some(Command::Analyze(args)) => analyze(cfg, args).await,
        Some(Command::Serve) | Some(Command::Health) | None => serve(cfg).await,
    }
}

async fn serve(cfg: Config) -> Result<()> {
    let source = webinsights_source::from_kind(&cfg.source);
    info!(source = source.name(), "Metrics source ready");

    let addr = format!("0.0.0.0:{}", cfg.port);
    let state = Arc::new(AppState::new(source, cfg.clone()));
    let app = webinsights_server::app::build_app(state);

    info!(port = cfg.port, "WebInsights listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;
    Ok(())
}

async fn analyze(cfg: Config, args: AnalyzeArgs) -> Result<()> {
    let source: Arc<dyn MetricsSource> = match &args.input {
        Some(path) => Arc::new(FileMetricsSource::new(path)),
        None => webinsights_source::from_kind(&cfg.source),
    };
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&cfg.output_dir));
    let state = AppState::new(source, cfg);

    let property_id = state
        .property_id(args.property_id.as_deref())
        .ok_or_else(|| anyhow!("--property-id or WEBINSIGHTS_PROPERTY_ID is required"))?;
    let request = state.metrics_request(
        property_id,
        args.start_date.as_deref(),
        args.end_date.as_deref(),
    )?;
    let result = state.run_analysis(&request).await?;
    let path = write_report(&result, args.output_format, &output_dir).await?;

    info!(path = %path.display(), run_id = %result.run_id, "Report written");
    println!("{}", path.display());
    Ok(())
}
