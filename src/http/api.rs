//! Axum handlers for `/api/*` routes.
//!
//! Every gateway failure becomes `500 { "detail": "<message>" }`; the caller
//! gets no finer classification than the message text.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::gateway::{QueryError, QueryRequest};
use crate::history::HistoryEntry;

use super::AppState;

// ── Request / response types ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub provider: String,
    pub credential_configured: bool,
    pub history_len: usize,
    pub history_capacity: usize,
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let body = ErrorResponse { detail: self.to_string() };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// POST /api/query
pub(super) async fn query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Response {
    match state.gateway.submit(&req.question).await {
        Ok(answer) => (StatusCode::OK, Json(answer)).into_response(),
        Err(e) => {
            warn!("query failed: {e}");
            e.into_response()
        }
    }
}

/// GET /api/history
pub(super) async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Json<HistoryResponse> {
    let limit = params.limit.unwrap_or(state.default_history_limit);
    Json(HistoryResponse { history: state.gateway.recent(limit) })
}

/// GET /api/health
pub(super) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let gateway = &state.gateway;
    Json(HealthResponse {
        status: "ok".into(),
        provider: gateway.provider().name().into(),
        credential_configured: gateway.provider().has_credential(),
        history_len: gateway.history().len(),
        history_capacity: gateway.history().capacity(),
    })
}
