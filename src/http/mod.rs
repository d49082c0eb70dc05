//! Axum HTTP server for the public REST surface.
//!
//! ## URL layout
//!
//! ```text
//! POST /api/query               ask a question
//! GET  /api/history?limit=N     last N answered queries (default 10)
//! GET  /api/health              provider + history status
//! ```
//!
//! CORS is fully permissive (any origin, method, header). The server loop
//! honours a [`CancellationToken`] for graceful shutdown.

mod api;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::error::AppError;
use crate::gateway::QueryGateway;

pub use api::{ErrorResponse, HealthResponse, HistoryParams, HistoryResponse};

// ── Shared request state ──────────────────────────────────────────────────────

/// Router state injected into every handler via [`axum::extract::State`].
///
/// Cheap to clone: all fields are reference-counted or `Copy`.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<QueryGateway>,
    /// `limit` used by `GET /api/history` when the query string omits it.
    pub default_history_limit: i64,
}

impl AppState {
    pub fn new(gateway: Arc<QueryGateway>, default_history_limit: i64) -> Self {
        Self { gateway, default_history_limit }
    }
}

// ── Server loop ───────────────────────────────────────────────────────────────

/// Bind `bind_addr` and serve until `shutdown` is cancelled.
pub async fn serve(
    bind_addr: &str,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Http(format!("bind failed on {bind_addr}: {e}")))?;

    serve_on(listener, state, shutdown).await
}

/// Serve on an already-bound listener. Tests bind `127.0.0.1:0` themselves.
pub async fn serve_on(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let local_addr = listener.local_addr()?;
    info!(%local_addr, "http server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Http(format!("server error: {e}")))?;

    info!("http server shut down");
    Ok(())
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/query",   post(api::query))
        .route("/api/history", get(api::history))
        .route("/api/health",  get(api::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
