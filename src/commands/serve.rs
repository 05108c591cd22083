//! Serve command - Starts the HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{Cache, Database, ImageStore, ObjectStoreGateway};
use crate::jobs::{Mailer, QueueMailer};

use super::jobs::connect_email_queue;

pub async fn execute(args: ServeArgs, config: Config) -> AppResult<()> {
    tracing::info!("Starting server...");

    let db = Database::connect(&config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;

    let cache = Cache::connect(&config)
        .await
        .map_err(|e| AppError::internal(format!("Redis connection failed: {}", e)))?;

    let image_store: Arc<dyn ImageStore> = Arc::new(ObjectStoreGateway::from_config(&config.storage)?);
    tracing::info!(backend = ?config.storage.backend, bucket = %config.storage.bucket, "Image storage ready");

    let mailer: Arc<dyn Mailer> = Arc::new(QueueMailer::new(connect_email_queue(&config).await?));

    let app_state = AppState::from_config(Arc::new(db), Arc::new(cache), image_store, mailer, config);
    let app = create_router(app_state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    // Peer addresses feed the rate limiter when no proxy header is present.
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    Ok(())
}
