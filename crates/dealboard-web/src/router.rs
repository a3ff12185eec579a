//! Web router using Axum

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use dealboard_core::models::{AskRequest, AskResponse, BoardSummary};
use dealboard_core::{CachesStats, PipelineError};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

type SharedState = State<Arc<AppState>>;

/// Create the web router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/ask", post(ask_handler))
        .route("/boards/summary", get(boards_summary_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route("/cache/clear", delete(cache_clear_handler))
        .layer(cors)
        .with_state(state)
}

async fn index_handler() -> Json<Value> {
    Json(json!({
        "name": "dealboard",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Business intelligence answers over monday.com Deals and Work Orders boards",
        "endpoints": {
            "ask": "POST /ask",
            "boards_summary": "GET /boards/summary",
            "cache_stats": "GET /cache/stats",
            "cache_clear": "DELETE /cache/clear",
            "health": "GET /health"
        }
    }))
}

async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn ask_handler(
    State(state): SharedState,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        ApiError::new(
            PipelineError::InvalidRequest {
                reason: rejection.body_text(),
            },
            state.debug,
        )
    })?;

    state
        .orchestrator
        .ask(request)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, state.debug))
}

async fn boards_summary_handler(State(state): SharedState) -> Result<Json<BoardSummary>, ApiError> {
    state
        .orchestrator
        .board_summary()
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, state.debug))
}

async fn cache_stats_handler(State(state): SharedState) -> Json<CachesStats> {
    Json(state.orchestrator.caches().stats())
}

async fn cache_clear_handler(State(state): SharedState) -> Json<Value> {
    let (boards, responses) = state.orchestrator.caches().clear_all();
    info!(boards, responses, "Caches cleared");
    Json(json!({
        "status": "ok",
        "detail": "All caches cleared",
        "board_entries_removed": boards,
        "response_entries_removed": responses,
    }))
}
