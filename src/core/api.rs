//! Read-only HTTP status API
//!
//! Endpoints:
//! - GET /health - Health check
//! - GET /status - Session state, modes and tracked chatter count
//! - GET /chatters/:identity - Penalty state for one chatter

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::core::{ModerationModes, PenaltyStore};
use crate::types::{ChatterState, ModeFlags, SessionState};

/// Handles the API reads from
#[derive(Debug, Clone)]
pub struct StatusState {
    pub penalties: Arc<PenaltyStore>,
    pub modes: Arc<ModerationModes>,
    pub session: watch::Receiver<SessionState>,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub session_state: SessionState,
    pub modes: ModeFlags,
    pub tracked_chatters: usize,
}

/// Create the API router
pub fn create_router(state: StatusState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/chatters/:identity", get(get_chatter))
        .with_state(state)
}

/// Health check endpoint
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    })
}

async fn status(State(state): State<StatusState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        session_state: *state.session.borrow(),
        modes: state.modes.snapshot(),
        tracked_chatters: state.penalties.len(),
    })
}

async fn get_chatter(
    State(state): State<StatusState>,
    Path(identity): Path<String>,
) -> Result<Json<ChatterState>, StatusCode> {
    state
        .penalties
        .lookup(&identity)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Run the API server until `shutdown` flips
pub async fn run_server(
    addr: &str,
    state: StatusState,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), crate::BotError> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "status API listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await?;
    Ok(())
}
