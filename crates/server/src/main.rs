//! Sample It server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use sampleit_core::config::AppConfig;
use sampleit_server::{AppState, create_router};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Sample It - audio sample sharing API
#[derive(Parser, Debug)]
#[command(name = "sampleitd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "SAMPLEIT_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

/// Load configuration from the optional TOML file, overridden by
/// `SAMPLEIT_` environment variables (`__` separates nested keys).
fn load_config(path: &str) -> Result<AppConfig> {
    let mut figment = Figment::new();
    let has_config_file = std::path::Path::new(path).exists();

    if has_config_file {
        tracing::info!(config_path = %path, "Loading configuration from file");
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::debug!("No config file found at {}", path);
    }

    let has_env_config = std::env::vars()
        .any(|(key, _)| key.starts_with("SAMPLEIT_") && key != "SAMPLEIT_CONFIG");

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: sampleitd --config /path/to/config.toml\n  \
             2. Environment variables: SAMPLEIT_SERVER__BIND=0.0.0.0:8080 \
             SAMPLEIT_STORAGE__TYPE=filesystem SAMPLEIT_STORAGE__PATH=./data sampleitd\n\n\
             See config/server.example.toml for example configuration."
        );
    }

    if !has_config_file {
        tracing::info!("Using environment variables for configuration");
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("SAMPLEIT_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Sample It v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;

    sampleit_server::metrics::register_metrics();
    tracing::info!("Prometheus metrics registered");

    let storage = sampleit_storage::from_config(&config.storage)
        .await
        .context("failed to initialize storage")?;
    storage
        .health_check()
        .await
        .context("storage health check failed")?;
    tracing::info!(backend = storage.backend_name(), "Storage backend ready");

    let metadata = sampleit_metadata::from_config(&config.metadata)
        .await
        .context("failed to initialize metadata store")?;
    tracing::info!("Metadata store initialized");

    if config.analysis.enabled {
        tracing::info!(
            max_duration_secs = config.analysis.max_duration_secs,
            "Audio analysis enabled"
        );
    }

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    let state = AppState::new(config, storage, metadata.clone());
    let app = create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    metadata.close().await;
    tracing::info!("Server stopped");

    Ok(())
}
