//! Pulseboard API Server
//!
//! Run with: cargo run --bin pulseboard
//!
//! # Configuration
//!
//! Read from `~/.config/pulseboard/config.toml`, `/etc/pulseboard/config.toml`
//! or `./config.toml` (first found), or the file passed with `--config`.
//! Environment variables override file values:
//! - `PULSEBOARD_STORE_KIND`: `http` or `memory`
//! - `PULSEBOARD_STORE_URL`: Record store base URL
//! - `PULSEBOARD_STORE_TOKEN`: Bearer token for the record store
//! - `PULSEBOARD_API_HOST` / `PULSEBOARD_API_PORT`: Bind address
//! - `PULSEBOARD_LOG_LEVEL` / `PULSEBOARD_LOG_FORMAT`: Logging
//! - `RUST_LOG`: Overrides the log filter entirely

use anyhow::Context;
use clap::Parser;
use pulseboard::adapter::MetricsAdapter;
use pulseboard::api::{serve, ApiConfig, AppState};
use pulseboard::config::{Config, LoggingConfig};
use pulseboard::store;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pulseboard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Health dashboard API server")]
struct Args {
    /// Config file (default: search standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let config = Config::load_with_env(path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            init_tracing(&config.logging);
            tracing::info!("Loaded config from {:?}", path);
            config
        }
        None => {
            // Logging settings come from the config, so report the search after
            // the subscriber is installed
            let loaded = Config::discover();
            init_tracing(&loaded.config.logging);
            loaded.log();
            loaded.config
        }
    };

    tracing::info!("Starting Pulseboard API server v{}", env!("CARGO_PKG_VERSION"));

    let store = store::from_config(&config.store).context("building record store")?;
    tracing::info!(store = store.name(), "Record store configured");

    match store.health_check().await {
        Ok(()) => tracing::info!("Record store reachable"),
        Err(e) => tracing::warn!("Record store not reachable: {} (dashboard will be empty)", e),
    }

    let adapter = MetricsAdapter::with_config(store, config.dashboard.adapter_config());
    let api_config = ApiConfig::from_config(&config);
    let state = AppState::new(adapter, api_config.clone());

    serve(state, &api_config).await?;

    tracing::info!("Pulseboard API server stopped");
    Ok(())
}

/// Install the global subscriber; `RUST_LOG` wins over the config level
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("pulseboard={},tower_http=info", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
