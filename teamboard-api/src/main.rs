//! # Teamboard API Server
//!
//! HTTP server for the Teamboard project tracker: projects, team roles,
//! tasks, progress and analytics.
//!
//! ## Usage
//!
//! ```bash
//! STORE_BACKEND=memory JWT_SECRET=... cargo run -p teamboard-api
//! ```

use std::sync::Arc;

use anyhow::Context;
use teamboard_api::app::{build_router, AppState};
use teamboard_api::config::{Config, LogFormat, StoreBackend};
use teamboard_shared::db::{migrations, pool};
use teamboard_shared::store::{MemoryStore, PgStore, Store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "teamboard_api=debug,teamboard_shared=info,tower_http=debug";

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Opens the configured store; the pool is returned too so it can be closed
/// on shutdown
async fn open_store(config: &Config) -> anyhow::Result<(Arc<dyn Store>, Option<pool::PgPool>)> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on shutdown");
            Ok((Arc::new(MemoryStore::new()), None))
        }
        StoreBackend::Postgres => {
            let database = config
                .store
                .database
                .as_ref()
                .context("DATABASE_URL is required for the postgres backend")?;

            let defaults = pool::DatabaseConfig::default();
            let db_pool = pool::create_pool(pool::DatabaseConfig {
                url: database.url.clone(),
                max_connections: database.max_connections,
                min_connections: defaults.min_connections.min(database.max_connections),
                ..defaults
            })
            .await
            .context("Failed to connect to PostgreSQL")?;

            migrations::run_migrations(&db_pool)
                .await
                .context("Failed to run database migrations")?;

            Ok((Arc::new(PgStore::new(db_pool.clone())), Some(db_pool)))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.store.backend,
        "Teamboard API server starting"
    );

    let (store, db_pool) = open_store(&config).await?;
    let address = config.bind_address();
    let app = build_router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(%address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db_pool) = db_pool {
        pool::close_pool(db_pool).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}
