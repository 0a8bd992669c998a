//! Per-profile progress and plant identification

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::services::identification::IdentificationOutcome;
use crate::services::progress::ProgressSummary;
use crate::services::remedy_workflow::Photo;
use crate::{ApiError, ApiResult, AppState};

/// GET /api/profiles/:profile/progress
///
/// Badges are derived on every read.
pub async fn get_progress(
    State(state): State<AppState>,
    Path(profile): Path<String>,
) -> ApiResult<Json<ProgressSummary>> {
    Ok(Json(state.progress.summary(&profile).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyRequest {
    pub photo_data_uri: String,
}

/// POST /api/profiles/:profile/identify
pub async fn identify_plant(
    State(state): State<AppState>,
    Path(profile): Path<String>,
    Json(payload): Json<IdentifyRequest>,
) -> ApiResult<Json<IdentificationOutcome>> {
    let collaborators = state.collaborators().await;
    let outcome = state
        .identification
        .identify(
            collaborators.identifier.as_ref(),
            &profile,
            Photo::DataUri(payload.photo_data_uri),
        )
        .await
        .map_err(ApiError::from)?;
    Ok(Json(outcome))
}

pub fn progress_routes() -> Router<AppState> {
    Router::new()
        .route("/api/profiles/:profile/progress", get(get_progress))
        .route("/api/profiles/:profile/identify", post(identify_plant))
}
