//! Axum route handlers for listing creations.

use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::creation::Creation;
use crate::models::user::Caller;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreationListResponse {
    pub success: bool,
    pub creations: Vec<Creation>,
}

/// GET /api/user/creations
pub async fn handle_user_creations(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<CreationListResponse>, AppError> {
    let creations = state.creations.list_for_user(&caller.user_id).await?;
    Ok(Json(CreationListResponse {
        success: true,
        creations,
    }))
}

/// GET /api/user/published-creations
pub async fn handle_published_creations(
    State(state): State<AppState>,
) -> Result<Json<CreationListResponse>, AppError> {
    let creations = state.creations.list_published().await?;
    Ok(Json(CreationListResponse {
        success: true,
        creations,
    }))
}
