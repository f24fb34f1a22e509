use anyhow::Context as _;
use clap::Parser as _;
use colab_bridge::config::{Args, BridgeConfig, LogFormat};
use colab_bridge::server::ColabBridge;
use rmcp::ServiceExt as _;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level, args.log_format);

    let config = BridgeConfig::try_from(&args)?;
    let bridge = ColabBridge::new(&config)?;

    if let Some(url) = &config.initial_url {
        let outcome = bridge.connections().connect(url).await;
        if outcome.is_connected() {
            info!("{outcome}");
        } else {
            warn!("startup connect failed: {outcome}");
        }
    }

    info!(
        probe_timeout_secs = config.probe_timeout.as_secs(),
        request_timeout_secs = config.request_timeout.as_secs(),
        "serving colab bridge over stdio"
    );

    let service = bridge
        .serve(rmcp::transport::stdio())
        .await
        .context("start MCP stdio service")?;
    service.waiting().await.context("MCP stdio service")?;

    info!("stdin closed, shutting down");
    Ok(())
}

/// Logs go to stderr: stdout carries the MCP protocol.
fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
