//! HTTP service layer.
//!
//! Wraps the pipelines in a small JSON API: upload a PDF (which ingests it
//! immediately), list and delete documents, and ask questions. The core
//! pipelines know nothing about HTTP; this layer owns the status-code
//! mapping.

pub mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::pipeline::{IngestPipeline, QueryPipeline, SharedStore};

/// Shared application state available to all handlers.
///
/// Every provider is constructed once at startup and passed in by
/// reference; nothing here is lazily initialized.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: SharedStore,
    pub ingest: Arc<IngestPipeline>,
    pub query: Arc<QueryPipeline>,
}

/// Start the HTTP server (blocks until shutdown).
pub async fn serve(state: AppState) -> Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);

    std::fs::create_dir_all(&state.config.upload_dir).with_context(|| {
        format!("failed to create upload directory: {}", state.config.upload_dir)
    })?;

    let app = routes::api_routes()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        return;
    }
    info!("Shutting down");
}
