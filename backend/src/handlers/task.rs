//! HTTP handlers for the maintenance task catalogue
//!
//! Everyone can read the catalogue; only admins change it.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use crate::models::{MaintenanceTask, Season};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::task::{CreateTaskInput, UpdateTaskInput};
use crate::services::TaskService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub season: Option<Season>,
}

/// List task definitions, optionally for one season
pub async fn list_tasks(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<TaskListQuery>,
) -> AppResult<Json<Vec<MaintenanceTask>>> {
    let service = TaskService::new(state.db);
    let tasks = service.list_tasks(query.season).await?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(task_id): Path<Uuid>,
) -> AppResult<Json<MaintenanceTask>> {
    let service = TaskService::new(state.db);
    let task = service.get_task(task_id).await?;
    Ok(Json(task))
}

pub async fn create_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateTaskInput>,
) -> AppResult<(StatusCode, Json<MaintenanceTask>)> {
    current_user.0.require_admin()?;
    let service = TaskService::new(state.db);
    let task = service.create_task(input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(task_id): Path<Uuid>,
    Json(input): Json<UpdateTaskInput>,
) -> AppResult<Json<MaintenanceTask>> {
    current_user.0.require_admin()?;
    let service = TaskService::new(state.db);
    let task = service.update_task(task_id, input).await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(task_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    current_user.0.require_admin()?;
    let service = TaskService::new(state.db);
    service.delete_task(task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
