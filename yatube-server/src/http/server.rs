//! Axum server setup
//!
//! Router with:
//! - Error pages rendered from templates
//! - Uploaded media under `/media/`
//! - Request timeout and tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::error::error_pages;
use super::routes;
use crate::config::ServerConfig;
use crate::db::{create_pool, migrate, SessionRepo};
use crate::state::AppState;

/// Largest accepted request body (image uploads)
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// How often expired sessions are swept
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let media = ServeDir::new(state.media().root());

    Router::new()
        .merge(routes::health::router())
        .merge(routes::about::router())
        .merge(routes::accounts::router())
        .merge(routes::groups::router())
        .merge(routes::profiles::router())
        .merge(routes::posts::router())
        .nest_service("/media", media)
        .fallback(routes::page_not_found)
        .layer(middleware::from_fn_with_state(state.clone(), error_pages))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(state.config().request_timeout()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server.
///
/// # Example
///
/// ```ignore
/// let config = ServerConfig::load(None)?;
/// run_server(config).await?;
/// ```
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let pool = create_pool(&config.database_url).await?;
    migrate(&pool).await?;
    tokio::fs::create_dir_all(&config.media_root).await?;
    tracing::info!(
        database = %config.database_url,
        media_root = %config.media_root.display(),
        "storage ready"
    );

    let bind_addr = config.bind_addr;
    let state = AppState::new(pool.clone(), config)?;
    let purge = tokio::spawn(purge_sessions(pool));

    let app = build_router(state);

    // Bind listener
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    // Run with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purge.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn purge_sessions(pool: sqlx::SqlitePool) {
    let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
    loop {
        interval.tick().await;
        match SessionRepo::new(&pool).purge_expired().await {
            Ok(0) => {}
            Ok(n) => tracing::debug!(removed = n, "purged expired sessions"),
            Err(e) => tracing::warn!("session purge failed: {}", e),
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}
