//! Text-to-speech for arbitrary text

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use tracing::warn;
use vaidya_common::events::{NoticeSeverity, VaidyaEvent};

use crate::error::FieldError;
use crate::services::collaborators::AudioClip;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRequest {
    pub text: String,
    /// Receives the failure notice, if given
    pub profile_id: Option<String>,
}

/// POST /api/speech
pub async fn synthesize(
    State(state): State<AppState>,
    Json(payload): Json<SpeechRequest>,
) -> ApiResult<Json<AudioClip>> {
    let text = payload.text.trim();
    if text.is_empty() {
        return Err(ApiError::Validation(vec![FieldError::new(
            "text",
            "Text to speak is required",
        )]));
    }

    let Some(speech) = state.collaborators().await.speech else {
        return Err(ApiError::CapabilityUnavailable(
            "Text-to-speech is not configured".to_string(),
        ));
    };

    match speech.speak(text).await {
        Ok(clip) => Ok(Json(clip)),
        Err(e) => {
            warn!(error = %e, "Speech synthesis failed");
            state.event_bus.emit_lossy(VaidyaEvent::notice(
                payload.profile_id.as_deref(),
                NoticeSeverity::Error,
                "Audio Error",
                "Could not play audio.",
            ));
            Err(e.into())
        }
    }
}

pub fn speech_routes() -> Router<AppState> {
    Router::new().route("/api/speech", post(synthesize))
}
