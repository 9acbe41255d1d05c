mod attachments;
mod categories;
mod config;
mod db;
mod errors;
mod extract;
mod jobs;
mod models;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::attachments::local::LocalDiskStorage;
use crate::attachments::s3::S3Storage;
use crate::attachments::AttachmentStorage;
use crate::config::{Config, StorageBackend};
use crate::db::{create_pool, run_migrations};
use crate::jobs::store::PgJobStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Jobboard API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    if config.run_migrations {
        run_migrations(&db).await?;
    }

    // Initialize attachment storage
    let storage: Arc<dyn AttachmentStorage> = match &config.storage {
        StorageBackend::Local => {
            let local = LocalDiskStorage::new(&config.upload_dir).await?;
            info!("Local attachment storage at {}", local.root().display());
            Arc::new(local)
        }
        StorageBackend::S3(s3) => Arc::new(S3Storage::from_config(s3).await),
    };

    // Build app state
    let state = AppState {
        jobs: Arc::new(PgJobStore::new(db.clone())),
        db,
        storage,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
