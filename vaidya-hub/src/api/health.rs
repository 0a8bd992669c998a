//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" while no AI key is configured
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub ai_configured: bool,
    pub active_games: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let last_error = state.last_error.read().await.clone();
    // Speech is only wired when a real client is configured
    let ai_configured = state.collaborators().await.speech.is_some();

    Json(HealthResponse {
        status: if ai_configured { "ok" } else { "degraded" }.to_string(),
        module: "vaidya-hub".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        ai_configured,
        active_games: state.games.len().await,
        last_error,
    })
}

pub fn health_routes() -> Router<crate::AppState> {
    Router::new().route("/health", get(health_check))
}
