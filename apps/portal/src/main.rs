mod config;
mod deferred;
mod errors;
mod jobs;
mod models;
mod resume;
mod routes;
mod session;
mod state;
mod storage;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::deferred::PeriodicTask;
use crate::jobs::JobBoard;
use crate::routes::build_router;
use crate::session::SessionRegistry;
use crate::state::AppState;
use crate::storage::{FileStore, KeyValueStore, MemoryStore, RedisStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Portal API v{}", env!("CARGO_PKG_VERSION"));

    let store = open_store(&config).await?;

    let board = match &config.jobs_seed_path {
        Some(path) => JobBoard::from_seed_file(path).await?,
        None => JobBoard::default(),
    };

    let sessions = Arc::new(SessionRegistry::new(store, config.field_sync_debounce));

    let autosave = PeriodicTask::new();
    let registry = Arc::clone(&sessions);
    if autosave.start(config.autosave_interval, move || {
        let registry = Arc::clone(&registry);
        async move {
            registry.autosave_all().await;
        }
    }) {
        info!("Auto-save every {:?}", config.autosave_interval);
    } else {
        info!("Auto-save disabled");
    }

    let state = AppState {
        sessions: Arc::clone(&sessions),
        board: Arc::new(board),
        config: config.clone(),
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict origins once the web client has a fixed host
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    autosave.stop();
    if let Err(e) = sessions.flush_all().await {
        warn!("Flushing sessions on shutdown failed: {e}");
    }
    info!("Shutdown complete");

    Ok(())
}

/// Picks the session store: Redis, then a data directory, then process memory.
async fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    if let Some(url) = &config.redis_url {
        let store = RedisStore::connect(url).await?;
        store.ping().await?;
        info!("Session store: redis");
        return Ok(Arc::new(store));
    }
    if let Some(dir) = &config.data_dir {
        let store = FileStore::open(dir).await?;
        info!("Session store: files under {}", dir.display());
        return Ok(Arc::new(store));
    }
    warn!("Session store: in-memory; state is lost on restart");
    Ok(Arc::new(MemoryStore::new()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
    }
    info!("Shutdown signal received");
}
