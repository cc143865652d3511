#![forbid(unsafe_code)]

use clap::Parser;
use qrlink_gateway::{Args, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(args.log_level.as_deref().unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Structured JSON logs; request logs come from the `http_request` span.
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .init();

    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("invalid config: {err}");
            return Err(err.into());
        }
    };

    let server = qrlink_gateway::start(&config).await?;
    tracing::info!(
        ttl_seconds = config.ttl.as_secs(),
        redirect_base = %config.redirect_base.as_str(),
        "qrlink-gateway listening on http://{}",
        server.addr()
    );

    // Best-effort graceful shutdown on Ctrl+C / SIGTERM.
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!("failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = sigterm => {},
    }

    tracing::info!("shutdown signal received");
    server.shutdown().await
}
