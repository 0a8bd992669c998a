//! Knowledge chat endpoint

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::services::chat;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

/// POST /api/chat
pub async fn ask(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let collaborators = state.collaborators().await;
    let answer = chat::ask(collaborators.chat.as_ref(), &payload.query)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(ChatResponse { answer }))
}

pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/api/chat", post(ask))
}
