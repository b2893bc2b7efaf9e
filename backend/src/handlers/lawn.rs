//! HTTP handlers for lawn profile endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use crate::models::LawnProfile;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::lawn::{CreateLawnInput, UpdateLawnInput};
use crate::services::LawnService;
use crate::AppState;

/// List the caller's lawns
pub async fn list_lawns(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<LawnProfile>>> {
    let service = LawnService::new(state.db);
    let lawns = service.list_lawns(current_user.0.user_id).await?;
    Ok(Json(lawns))
}

/// Create a lawn profile
pub async fn create_lawn(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateLawnInput>,
) -> AppResult<(StatusCode, Json<LawnProfile>)> {
    let service = LawnService::new(state.db);
    let lawn = service.create_lawn(current_user.0.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(lawn)))
}

pub async fn get_lawn(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(lawn_id): Path<Uuid>,
) -> AppResult<Json<LawnProfile>> {
    let service = LawnService::new(state.db);
    let lawn = service.get_lawn(current_user.0.user_id, lawn_id).await?;
    Ok(Json(lawn))
}

pub async fn update_lawn(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(lawn_id): Path<Uuid>,
    Json(input): Json<UpdateLawnInput>,
) -> AppResult<Json<LawnProfile>> {
    let service = LawnService::new(state.db);
    let lawn = service
        .update_lawn(current_user.0.user_id, lawn_id, input)
        .await?;
    Ok(Json(lawn))
}

pub async fn delete_lawn(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(lawn_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = LawnService::new(state.db);
    service.delete_lawn(current_user.0.user_id, lawn_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
