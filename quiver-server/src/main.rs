use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use quiver_server::core::CacheStorage;
use quiver_server::{AppState, ServerConfig, UpstreamClient, create_router, lifecycle};

#[derive(Parser, Debug)]
#[command(name = "quiver-server")]
#[command(about = "Offline-first caching gateway for a static quiz site", long_about = None)]
#[command(version)]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ServerConfig::default(),
    };

    init_tracing(&config);

    info!("Starting Quiver gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("Upstream origin: {}", config.upstream.origin);

    let storage = CacheStorage::new(&config.cache.directory)?;
    let upstream = Arc::new(UpstreamClient::new(
        &config.upstream.origin,
        config.upstream.request_timeout_secs,
    )?);

    // Warm the current generation, then prune every other one. The listener
    // is not bound until both complete.
    let store = Arc::new(lifecycle::install(&storage, &upstream, &config.cache).await?);
    lifecycle::activate(&storage, &config.cache)?;

    let app = create_router(AppState { store, upstream });

    let addr = config.server_addr();
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &ServerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.clone()));

    if config.logging.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
