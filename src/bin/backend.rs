#![forbid(unsafe_code)]

//! HTTP server for the video endpoints.

use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tubefeed::{
    aggregator::ChannelAggregator,
    api::{AppState, router},
    cache::{MemorySnapshots, NoSnapshots, SnapshotBackend, SnapshotCache},
    catalogue::ChannelCatalogue,
    config::{CacheBackendKind, DEFAULT_CONFIG_PATH, RuntimeConfig, load_runtime_config},
    provider::VideoProvider,
    snapshot_store::SqliteSnapshots,
    youtube::YouTubeClient,
};

const DEFAULT_LOG_FILTER: &str = "tubefeed=info,backend=info,tower_http=info";

#[derive(Parser, Debug)]
#[command(author, version, about = "Serve the tubefeed video API.")]
struct Cli {
    #[arg(long = "config", value_name = "PATH", default_value = DEFAULT_CONFIG_PATH, help = "Path to the config file")]
    config: PathBuf,
    #[arg(long = "host", value_name = "ADDR", help = "Override TUBEFEED_HOST")]
    host: Option<String>,
    #[arg(short = 'p', long = "port", value_name = "PORT", help = "Override TUBEFEED_PORT")]
    port: Option<u16>,
    #[arg(long = "cache", value_enum, help = "Override CACHE_BACKEND")]
    cache: Option<CacheBackendKind>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_runtime_config(&cli.config)?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(cache) = cli.cache {
        config.cache_backend = cache;
    }

    let catalogue = match &config.channel_catalogue {
        Some(path) => ChannelCatalogue::load(path)?,
        None => ChannelCatalogue::builtin(),
    };
    info!(channels = catalogue.len(), "channel catalogue loaded");

    let provider: Arc<dyn VideoProvider> = Arc::new(YouTubeClient::new(config.youtube.clone()));
    let cache = SnapshotCache::new(open_backend(&config), config.cache_freshness);
    let aggregator = Arc::new(ChannelAggregator::new(provider.clone(), cache, catalogue));
    let app = router(AppState::new(provider, aggregator));

    let addr = SocketAddr::new(
        config
            .host
            .parse::<IpAddr>()
            .with_context(|| format!("parsing listen address {}", config.host))?,
        config.port,
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {}", addr))?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running API server")?;

    info!("API server stopped");
    Ok(())
}

/// Picks the snapshot backend. A SQLite cache that cannot be opened falls
/// back to the in-memory one instead of keeping the server down.
fn open_backend(config: &RuntimeConfig) -> Arc<dyn SnapshotBackend> {
    match config.cache_backend {
        CacheBackendKind::Memory => {
            info!(freshness_secs = config.cache_freshness.as_secs(), "using in-memory snapshot cache");
            Arc::new(MemorySnapshots::new())
        }
        CacheBackendKind::Sqlite => match SqliteSnapshots::open(&config.cache_db_path) {
            Ok(store) => {
                info!(
                    path = %store.path().display(),
                    freshness_secs = config.cache_freshness.as_secs(),
                    "using SQLite snapshot cache"
                );
                Arc::new(store)
            }
            Err(err) => {
                warn!("SQLite cache unavailable, falling back to memory: {err:#}");
                Arc::new(MemorySnapshots::new())
            }
        },
        CacheBackendKind::None => {
            info!("snapshot cache disabled");
            Arc::new(NoSnapshots)
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}
