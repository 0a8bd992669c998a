//! Community remedy endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use vaidya_common::models::{Remedy, VoteDirection};

use crate::services::remedy_workflow::{Photo, RemedyForm, SubmissionOutcome};
use crate::services::voting::{SortMode, VoteOutcome};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RemedyListResponse {
    pub sort: SortMode,
    pub remedies: Vec<Remedy>,
}

/// GET /api/remedies?sort=recency|rating
///
/// Seeded examples and stored remedies together.
pub async fn list_remedies(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<RemedyListResponse>> {
    let sort = parse_sort(query.sort.as_deref())?.unwrap_or_default();
    let board = state.voting.board(sort).await?;

    Ok(Json(RemedyListResponse {
        sort: board.mode(),
        remedies: board.into_remedies(),
    }))
}

/// POST /api/remedies
///
/// **Responses:** 201 with `{"status":"accepted","remedy":...}`, 200 with
/// `{"status":"rejected","notes":...}`, 422 on validation errors, 502 when
/// verification could not be reached.
pub async fn submit_remedy(
    State(state): State<AppState>,
    Json(form): Json<RemedyForm>,
) -> ApiResult<Response> {
    let collaborators = state.collaborators().await;
    let outcome = match state
        .workflow
        .submit(collaborators.verifier.as_ref(), form, None)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            let err = ApiError::from(e);
            if matches!(err, ApiError::Collaborator(_) | ApiError::Common(_)) {
                state.record_error(err.to_string()).await;
            }
            return Err(err);
        }
    };

    let status = match &outcome {
        SubmissionOutcome::Accepted { .. } => StatusCode::CREATED,
        SubmissionOutcome::Rejected { .. } => StatusCode::OK,
    };
    Ok((status, Json(outcome)).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    #[serde(default)]
    pub plant_name: String,
    pub photo_data_uri: Option<String>,
}

/// POST /api/remedies/suggest
pub async fn suggest_remedy(
    State(state): State<AppState>,
    Json(payload): Json<SuggestRequest>,
) -> ApiResult<Response> {
    let collaborators = state.collaborators().await;
    let suggestion = state
        .workflow
        .suggest(
            collaborators.suggester.as_ref(),
            &payload.plant_name,
            payload.photo_data_uri.map(Photo::DataUri),
        )
        .await?;
    Ok(Json(suggestion).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub direction: VoteDirection,
    pub profile_id: Option<String>,
}

fn parse_sort(sort: Option<&str>) -> ApiResult<Option<SortMode>> {
    match sort {
        Some(value) => Ok(Some(value.parse()?)),
        None => Ok(None),
    }
}

/// POST /api/remedies/:id/vote[?sort=recency|rating]
///
/// Seeded remedies answer `{"status":"immutable"}` and stay unchanged. With
/// `sort`, the response also carries the board re-sorted after the vote.
pub async fn vote_remedy(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
    Json(payload): Json<VoteRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let profile_id = payload.profile_id.as_deref();
    let (outcome, board) = match parse_sort(query.sort.as_deref())? {
        Some(mode) => {
            let (outcome, board) = state
                .voting
                .vote_ranked(&id, payload.direction, profile_id, mode)
                .await?;
            (outcome, Some(board))
        }
        None => (state.voting.vote(&id, payload.direction, profile_id).await?, None),
    };

    let mut body = match outcome {
        VoteOutcome::Counted(remedy) => {
            info!(remedy_id = %remedy.id, "Vote recorded via API");
            json!({ "status": "counted", "remedy": remedy })
        }
        VoteOutcome::Immutable => json!({
            "status": "immutable",
            "message": "This is a pre-built remedy and cannot be voted on.",
        }),
    };
    if let Some(board) = board {
        body["sort"] = json!(board.mode());
        body["remedies"] = json!(board.into_remedies());
    }
    Ok(Json(body))
}

pub fn remedy_routes() -> Router<AppState> {
    Router::new()
        .route("/api/remedies", get(list_remedies).post(submit_remedy))
        .route("/api/remedies/suggest", post(suggest_remedy))
        .route("/api/remedies/:id/vote", post(vote_remedy))
}
