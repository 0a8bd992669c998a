//! Read-only plant catalog and tribal languages

use axum::{extract::Path, routing::get, Json, Router};
use vaidya_common::models::{Plant, TribalLanguage};

use crate::{catalog, ApiError, ApiResult, AppState};

/// GET /api/plants
pub async fn list_plants() -> Json<&'static [Plant]> {
    Json(catalog::plants())
}

/// GET /api/plants/:id
pub async fn get_plant(Path(id): Path<u32>) -> ApiResult<Json<&'static Plant>> {
    catalog::plant_by_id(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Plant {}", id)))
}

/// GET /api/languages
pub async fn list_languages() -> Json<&'static [TribalLanguage]> {
    Json(catalog::tribal_languages())
}

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/plants", get(list_plants))
        .route("/api/plants/:id", get(get_plant))
        .route("/api/languages", get(list_languages))
}
