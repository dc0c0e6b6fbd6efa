use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinetrend_core::{
    load_config, validate_config, AppwriteTrendingStore, Config, MetadataClient,
    SearchOrchestrator, SqliteTrendingStore, TmdbClient, TrendingBackend, TrendingStore,
};
use cinetrend_server::api::create_router;
use cinetrend_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("CINETREND_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        "CineTrend {} configuration loaded (hash {})",
        VERSION,
        &config_hash[..16]
    );

    let trending = create_trending_store(&config)?;
    info!("Trending store initialized ({})", trending.backend_name());

    let metadata: Arc<dyn MetadataClient> = Arc::new(
        TmdbClient::new(config.metadata.clone()).context("Failed to create TMDB client")?,
    );
    info!("TMDB client initialized ({})", config.metadata.base_url);

    let orchestrator = Arc::new(SearchOrchestrator::new(
        config.search.clone(),
        metadata,
        trending,
    ));
    orchestrator.start().await;

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), Arc::clone(&orchestrator)));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    orchestrator.stop().await;

    Ok(())
}

/// Create the trending store selected in the config.
fn create_trending_store(config: &Config) -> Result<Arc<dyn TrendingStore>> {
    let store: Arc<dyn TrendingStore> = match config.trending.backend {
        TrendingBackend::Sqlite => {
            let path = &config.trending.sqlite.path;
            info!("Opening SQLite trending store at {:?}", path);
            Arc::new(
                SqliteTrendingStore::new(path)
                    .with_context(|| format!("Failed to open trending store at {:?}", path))?,
            )
        }
        TrendingBackend::Appwrite => {
            let appwrite = config
                .trending
                .appwrite
                .clone()
                .context("Appwrite backend selected but no [trending.appwrite] config provided")?;
            info!("Using Appwrite trending store at {}", appwrite.endpoint);
            Arc::new(
                AppwriteTrendingStore::new(appwrite)
                    .context("Failed to create Appwrite trending store")?,
            )
        }
    };
    Ok(store)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
