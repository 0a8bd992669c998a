//! Settings API endpoint
//!
//! POST /api/settings/genai_api_key stores the key and swaps in a fresh
//! client without a restart.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::services::genai::GenAiClient;
use crate::services::Collaborators;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct SetApiKeyRequest {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct SetApiKeyResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/settings/genai_api_key handler
///
/// **Request:** `{"api_key": "your-key"}`
///
/// **Behavior:**
/// 1. Validate key (non-empty, non-whitespace)
/// 2. Write to database (authoritative)
/// 3. Sync to TOML (best-effort backup)
/// 4. Replace the collaborator client
pub async fn set_genai_api_key(
    State(state): State<AppState>,
    Json(payload): Json<SetApiKeyRequest>,
) -> ApiResult<Json<SetApiKeyResponse>> {
    if !crate::config::is_valid_key(&payload.api_key) {
        return Err(ApiError::BadRequest(
            "API key cannot be empty or whitespace-only".to_string(),
        ));
    }
    let api_key = payload.api_key.trim().to_string();

    crate::db::settings::set_genai_api_key(&state.db, api_key.clone())
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to save API key to database: {}", e)))?;

    info!("GenAI API key configured via API");

    if let Some(toml_path) = &state.config_path {
        let mut settings = HashMap::new();
        settings.insert(crate::db::settings::GENAI_API_KEY.to_string(), api_key.clone());
        if let Err(e) = crate::config::sync_settings_to_toml(settings, toml_path).await {
            warn!("TOML sync failed (database write succeeded): {}", e);
        }
    }

    let config = &state.config;
    let client = GenAiClient::new(
        api_key,
        &config.genai_base_url,
        &config.genai_model,
        &config.speech_model,
    )?;
    state
        .set_collaborators(Collaborators::from_genai(Arc::new(client)))
        .await;

    Ok(Json(SetApiKeyResponse {
        success: true,
        message: "GenAI API key configured successfully".to_string(),
    }))
}

pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/api/settings/genai_api_key", post(set_genai_api_key))
}
