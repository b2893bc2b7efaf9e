//! HTTP handlers for lawn schedules

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use crate::models::ScheduledTask;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::schedule::{
    EvaluationReport, NextDate, Recommendation, ScheduleEntry, ScheduleQuery, ScheduleTaskInput,
    StatusChange, UpdateStatusInput,
};
use crate::AppState;

/// List a lawn's schedule, filtered by date range and status
pub async fn list_schedule(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(lawn_id): Path<Uuid>,
    Query(query): Query<ScheduleQuery>,
) -> AppResult<Json<Vec<ScheduleEntry>>> {
    let service = state.schedule_service();
    let entries = service
        .list_schedule(current_user.0.user_id, lawn_id, query)
        .await?;
    Ok(Json(entries))
}

/// Put a task on a lawn's schedule
pub async fn schedule_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(lawn_id): Path<Uuid>,
    Json(input): Json<ScheduleTaskInput>,
) -> AppResult<(StatusCode, Json<ScheduledTask>)> {
    let service = state.schedule_service();
    let scheduled = service
        .schedule_task(current_user.0.user_id, lawn_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(scheduled)))
}

/// Download a lawn's schedule as CSV
pub async fn export_schedule(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(lawn_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = state.schedule_service();
    let (filename, csv) = service.export_csv(current_user.0.user_id, lawn_id).await?;
    let disposition = format!("attachment; filename=\"{}\"", filename);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

/// In-season tasks for a lawn, checked against current weather
pub async fn get_recommendations(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(lawn_id): Path<Uuid>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let service = state.schedule_service();
    let recommendations = service
        .recommendations(current_user.0.user_id, lawn_id)
        .await?;
    Ok(Json(recommendations))
}

/// Run the weather reschedule sweep for one lawn
pub async fn evaluate_schedule(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(lawn_id): Path<Uuid>,
) -> AppResult<Json<EvaluationReport>> {
    let service = state.schedule_service();
    let report = service.evaluate_lawn(current_user.0.user_id, lawn_id).await?;
    Ok(Json(report))
}

pub async fn update_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(scheduled_task_id): Path<Uuid>,
    Json(input): Json<UpdateStatusInput>,
) -> AppResult<Json<StatusChange>> {
    let service = state.schedule_service();
    let change = service
        .update_status(current_user.0.user_id, scheduled_task_id, input)
        .await?;
    Ok(Json(change))
}

/// First suitable day in the forecast for a scheduled task
pub async fn get_next_date(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(scheduled_task_id): Path<Uuid>,
) -> AppResult<Json<NextDate>> {
    let service = state.schedule_service();
    let next = service
        .next_date(current_user.0.user_id, scheduled_task_id)
        .await?;
    Ok(Json(next))
}
