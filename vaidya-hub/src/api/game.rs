//! Pronunciation game sessions
//!
//! The browser owns the microphone: it reports whether speech capture is
//! available and posts the recognizer's transcript or error.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::services::collaborators::AudioClip;
use crate::services::pronunciation::{CaptureReport, GameSnapshot, PronunciationGame};
use crate::services::progress::validate_profile_id;
use crate::{ApiError, ApiResult, AppState};

async fn session(state: &AppState, id: Uuid) -> ApiResult<Arc<PronunciationGame>> {
    state
        .games
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Game session {}", id)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub profile_id: String,
    pub plant_id: Option<u32>,
    pub language: Option<String>,
}

/// POST /api/game/sessions
pub async fn create_session(
    State(state): State<AppState>,
    Json(payload): Json<CreateSessionRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_profile_id(&payload.profile_id)?;

    let translator = state.collaborators().await.translator;
    let game = PronunciationGame::start(
        &payload.profile_id,
        payload.plant_id,
        payload.language.as_deref(),
        translator,
        state.game_context(),
    )
    .await?;
    state.games.insert(game.clone()).await;

    Ok((StatusCode::CREATED, Json(game.snapshot().await)))
}

/// GET /api/game/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<GameSnapshot>> {
    Ok(Json(session(&state, id).await?.snapshot().await))
}

/// DELETE /api/game/sessions/:id
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.games.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Game session {}", id)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRequest {
    pub plant_id: Option<u32>,
    pub language: Option<String>,
}

/// PUT /api/game/sessions/:id/selection
pub async fn change_selection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SelectionRequest>,
) -> ApiResult<Json<GameSnapshot>> {
    let game = session(&state, id).await?;
    Ok(Json(
        game.select(payload.plant_id, payload.language.as_deref())
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenRequest {
    /// Whether the client has a speech recognizer
    #[serde(default)]
    pub speech_capture: bool,
}

/// POST /api/game/sessions/:id/listen
pub async fn listen(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ListenRequest>,
) -> ApiResult<Json<GameSnapshot>> {
    let game = session(&state, id).await?;
    Ok(Json(game.listen(payload.speech_capture).await?))
}

#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    pub transcript: Option<String>,
    pub error: Option<String>,
}

/// POST /api/game/sessions/:id/capture
///
/// Exactly one of `transcript` or `error`.
pub async fn capture(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CaptureRequest>,
) -> ApiResult<Json<GameSnapshot>> {
    let report = match (payload.transcript, payload.error) {
        (Some(transcript), None) => CaptureReport::Transcript(transcript),
        (None, Some(error)) => CaptureReport::Error(error),
        _ => {
            return Err(ApiError::BadRequest(
                "Provide exactly one of 'transcript' or 'error'".to_string(),
            ))
        }
    };

    let game = session(&state, id).await?;
    Ok(Json(game.capture(report).await?))
}

/// POST /api/game/sessions/:id/stop
pub async fn stop(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<GameSnapshot>> {
    let game = session(&state, id).await?;
    Ok(Json(game.stop().await?))
}

/// POST /api/game/sessions/:id/next
pub async fn try_another(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<GameSnapshot>> {
    let game = session(&state, id).await?;
    Ok(Json(game.try_another().await?))
}

/// POST /api/game/sessions/:id/retry
pub async fn retry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<GameSnapshot>> {
    let game = session(&state, id).await?;
    Ok(Json(game.retry().await?))
}

/// POST /api/game/sessions/:id/speak
pub async fn speak(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AudioClip>> {
    let game = session(&state, id).await?;
    let speech = state.collaborators().await.speech;
    Ok(Json(game.speak(speech.as_ref()).await?))
}

pub fn game_routes() -> Router<AppState> {
    Router::new()
        .route("/api/game/sessions", post(create_session))
        .route(
            "/api/game/sessions/:id",
            get(get_session).delete(delete_session),
        )
        .route("/api/game/sessions/:id/selection", put(change_selection))
        .route("/api/game/sessions/:id/listen", post(listen))
        .route("/api/game/sessions/:id/capture", post(capture))
        .route("/api/game/sessions/:id/stop", post(stop))
        .route("/api/game/sessions/:id/next", post(try_another))
        .route("/api/game/sessions/:id/retry", post(retry))
        .route("/api/game/sessions/:id/speak", post(speak))
}
