//! HTTP handlers for notification management endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use crate::models::{NotificationKind, NotificationPayload};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::notification::{
    DispatchResult, NotificationLogEntry, NotificationPreferences, Recipient, TriggerSummary,
    UpdatePreferencesInput,
};
use crate::services::AuthService;
use crate::AppState;

// ============================================================================
// Notification Preferences
// ============================================================================

/// Get notification preferences
pub async fn get_preferences(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<NotificationPreferences>> {
    let service = state.notification_service();
    let prefs = service.get_preferences(current_user.0.user_id).await?;
    Ok(Json(prefs))
}

/// Update notification preferences
pub async fn update_preferences(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<UpdatePreferencesInput>,
) -> AppResult<Json<NotificationPreferences>> {
    let service = state.notification_service();
    let prefs = service
        .update_preferences(current_user.0.user_id, input)
        .await?;
    Ok(Json(prefs))
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeQuery {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UnsubscribeResponse {
    pub unsubscribed: NotificationKind,
}

/// Turn off one notification kind from an email link (no login needed)
pub async fn unsubscribe(
    State(state): State<AppState>,
    Query(query): Query<UnsubscribeQuery>,
) -> AppResult<Json<UnsubscribeResponse>> {
    let service = state.notification_service();
    let kind = service.unsubscribe(&query.token).await?;
    Ok(Json(UnsubscribeResponse { unsubscribed: kind }))
}

// ============================================================================
// Delivery
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// Recent notifications sent to the caller
pub async fn get_history(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<NotificationLogEntry>>> {
    let service = state.notification_service();
    let history = service
        .get_history(current_user.0.user_id, query.limit.unwrap_or(50))
        .await?;
    Ok(Json(history))
}

/// Send a notification to the caller
pub async fn send_notification(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(payload): Json<NotificationPayload>,
) -> AppResult<Json<DispatchResult>> {
    let user = AuthService::new(state.db.clone(), &state.config)
        .get_user(current_user.0.user_id)
        .await?;
    let recipient = Recipient {
        user_id: user.id,
        email: user.email,
        name: user.name,
    };

    let result = state.notification_service().dispatch(&recipient, payload).await?;
    Ok(Json(result))
}

// ============================================================================
// Triggers (admin)
// ============================================================================

pub async fn trigger_reminders(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<TriggerSummary>> {
    current_user.0.require_admin()?;
    let today = Local::now().date_naive();
    let summary = state
        .notification_service()
        .trigger_task_reminders(today)
        .await?;
    Ok(Json(summary))
}

pub async fn trigger_weather_alerts(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<TriggerSummary>> {
    current_user.0.require_admin()?;
    let today = Local::now().date_naive();
    let summary = state
        .notification_service()
        .trigger_weather_alerts(today)
        .await?;
    Ok(Json(summary))
}

pub async fn trigger_weekly_summaries(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<TriggerSummary>> {
    current_user.0.require_admin()?;
    let today = Local::now().date_naive();
    let summary = state
        .notification_service()
        .trigger_weekly_summaries(today)
        .await?;
    Ok(Json(summary))
}

pub async fn trigger_care_recommendations(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<TriggerSummary>> {
    current_user.0.require_admin()?;
    let today = Local::now().date_naive();
    let summary = state
        .notification_service()
        .trigger_care_recommendations(today)
        .await?;
    Ok(Json(summary))
}

/// Run all notification triggers
pub async fn trigger_all(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<TriggerSummary>>> {
    current_user.0.require_admin()?;
    let summaries = state.notification_service().run_all_triggers().await?;
    Ok(Json(summaries))
}
