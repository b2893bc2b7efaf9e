//! Notification service for email notifications
//!
//! Supports:
//! - Notification preferences per user, one switch per notification kind
//! - Dispatch: preference check, rendering, delivery and a log row per attempt
//! - Signed unsubscribe links
//! - Triggers for task reminders, weather alerts, weekly summaries and
//!   seasonal care recommendations

use std::collections::HashMap;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Days, Local, NaiveDate, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use shared::email::{self, EmailContext};
use shared::models::{
    AffectedTask, CareItem, CareRecommendations, LawnProfile, MaintenanceTask,
    NotificationKind, NotificationPayload, SummaryTask, TaskReminder, TaskStatus, WeatherAlert,
    WeatherObservation, WeeklySummary,
};
use shared::scheduling::season_on;
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::config::EmailConfig;
use crate::error::{AppError, AppResult};
use crate::external::EmailClient;
use crate::services::lawn::LawnRow;
use crate::services::schedule::{EvaluationReport, Recommendation, ScheduleEntry};
use crate::services::{ScheduleService, TaskService, WeatherService};

type HmacSha256 = Hmac<Sha256>;

/// Most care items included in one recommendations email
const MAX_CARE_ITEMS: usize = 5;

/// Notification service for managing notifications
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
    email_client: EmailClient,
    app_url: String,
    unsubscribe_secret: String,
    schedule: ScheduleService,
    weather: WeatherService,
    tasks: TaskService,
}

/// Notification preferences
#[derive(Debug, Clone, Copy, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct NotificationPreferences {
    pub task_reminders: bool,
    pub weather_alerts: bool,
    pub weekly_summary: bool,
    pub care_recommendations: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            task_reminders: true,
            weather_alerts: true,
            weekly_summary: true,
            care_recommendations: true,
        }
    }
}

impl NotificationPreferences {
    pub fn allows(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::TaskReminder => self.task_reminders,
            NotificationKind::WeatherAlert => self.weather_alerts,
            NotificationKind::WeeklySummary => self.weekly_summary,
            NotificationKind::CareRecommendations => self.care_recommendations,
        }
    }

    pub fn set(&mut self, kind: NotificationKind, enabled: bool) {
        match kind {
            NotificationKind::TaskReminder => self.task_reminders = enabled,
            NotificationKind::WeatherAlert => self.weather_alerts = enabled,
            NotificationKind::WeeklySummary => self.weekly_summary = enabled,
            NotificationKind::CareRecommendations => self.care_recommendations = enabled,
        }
    }

    fn apply(mut self, input: &UpdatePreferencesInput) -> Self {
        let changes = [
            (NotificationKind::TaskReminder, input.task_reminders),
            (NotificationKind::WeatherAlert, input.weather_alerts),
            (NotificationKind::WeeklySummary, input.weekly_summary),
            (NotificationKind::CareRecommendations, input.care_recommendations),
        ];
        for (kind, value) in changes {
            if let Some(enabled) = value {
                self.set(kind, enabled);
            }
        }
        self
    }
}

/// Input for updating notification preferences
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePreferencesInput {
    pub task_reminders: Option<bool>,
    pub weather_alerts: Option<bool>,
    pub weekly_summary: Option<bool>,
    pub care_recommendations: Option<bool>,
}

/// Delivery outcome of one notification
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    Sent,
    Failed,
    Skipped,
}

impl DispatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Sent => "sent",
            DispatchStatus::Failed => "failed",
            DispatchStatus::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DispatchResult {
    pub log_id: Uuid,
    pub kind: NotificationKind,
    pub status: DispatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Who a notification goes to
#[derive(Debug, Clone)]
pub struct Recipient {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
}

/// Notification log entry
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct NotificationLogEntry {
    pub id: Uuid,
    pub kind: String,
    pub subject: Option<String>,
    pub status: String,
    pub provider_id: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Counts from one trigger run
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TriggerSummary {
    pub kind: NotificationKind,
    pub sent: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl TriggerSummary {
    fn new(kind: NotificationKind) -> Self {
        Self {
            kind,
            sent: 0,
            skipped: 0,
            failed: 0,
        }
    }

    fn record(&mut self, result: AppResult<DispatchResult>) {
        match result {
            Ok(r) => match r.status {
                DispatchStatus::Sent => self.sent += 1,
                DispatchStatus::Skipped => self.skipped += 1,
                DispatchStatus::Failed => self.failed += 1,
            },
            Err(e) => {
                tracing::error!(kind = %self.kind, "Notification dispatch failed: {}", e);
                self.failed += 1;
            }
        }
    }
}

/// Lawn joined with its owner
#[derive(Debug, FromRow)]
struct LawnOwnerRow {
    #[sqlx(flatten)]
    lawn: LawnRow,
    owner_email: String,
    owner_name: String,
}

// ============================================================================
// Unsubscribe tokens
// ============================================================================

/// Sign a token that turns off one notification kind for one user.
///
/// Format: `base64url("{user_id}:{kind}") + "." + base64url(hmac_sha256)`.
pub fn sign_unsubscribe_token(
    secret: &str,
    user_id: Uuid,
    kind: NotificationKind,
) -> AppResult<String> {
    let body = URL_SAFE_NO_PAD.encode(format!("{}:{}", user_id, kind.as_str()));
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Configuration(format!("Invalid unsubscribe secret: {}", e)))?;
    mac.update(body.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{}.{}", body, signature))
}

/// Check an unsubscribe token and return who and what it is for
pub fn verify_unsubscribe_token(secret: &str, token: &str) -> AppResult<(Uuid, NotificationKind)> {
    let (body, signature) = token.split_once('.').ok_or(AppError::InvalidToken)?;
    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| AppError::InvalidToken)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Configuration(format!("Invalid unsubscribe secret: {}", e)))?;
    mac.update(body.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| AppError::InvalidToken)?;

    let decoded = URL_SAFE_NO_PAD.decode(body).map_err(|_| AppError::InvalidToken)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AppError::InvalidToken)?;
    let (user_id, kind) = decoded.split_once(':').ok_or(AppError::InvalidToken)?;

    Ok((
        Uuid::parse_str(user_id).map_err(|_| AppError::InvalidToken)?,
        kind.parse().map_err(|_| AppError::InvalidToken)?,
    ))
}

// ============================================================================
// Payload builders
// ============================================================================

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Weather alert for a lawn's sweep, or `None` if nothing changed
pub(crate) fn weather_alert_payload(
    recipient: &Recipient,
    lawn: &LawnProfile,
    report: &EvaluationReport,
    weather: Option<WeatherObservation>,
) -> Option<WeatherAlert> {
    let moved = report.rescheduled.len();
    let held = report.deferred.len();
    let headline = match (moved, held) {
        (0, 0) => return None,
        (m, 0) => format!("{} task{} rescheduled", m, plural(m)),
        (0, h) => format!("{} task{} waiting for better weather", h, plural(h)),
        (m, h) => format!("{} rescheduled, {} waiting for better weather", m, h),
    };

    Some(WeatherAlert {
        user_name: recipient.name.clone(),
        lawn_name: lawn.name.clone(),
        headline,
        affected_tasks: report
            .changes()
            .map(|o| AffectedTask {
                task_name: o.task_name.clone(),
                original_date: o.original_date,
                new_date: o.new_date,
                reason: o.reason.clone(),
            })
            .collect(),
        weather,
    })
}

/// Top recommendations as email care items
pub(crate) fn care_items(recommendations: &[Recommendation]) -> Vec<CareItem> {
    recommendations
        .iter()
        .take(MAX_CARE_ITEMS)
        .map(|r| CareItem {
            title: r.task.name.clone(),
            description: r.task.description.clone(),
            priority: r.task.priority,
            weather_note: r
                .weather_check
                .as_ref()
                .filter(|c| !c.is_valid)
                .and_then(|c| c.reason.clone()),
        })
        .collect()
}

fn summary_tasks(entries: &[ScheduleEntry], status: TaskStatus) -> Vec<SummaryTask> {
    entries
        .iter()
        .filter(|e| e.scheduled.status == status)
        .map(|e| SummaryTask {
            task_name: e.task_name.clone(),
            date: e.scheduled.scheduled_date,
        })
        .collect()
}

fn days_before(date: NaiveDate, n: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(n)).unwrap_or(date)
}

fn days_after(date: NaiveDate, n: u64) -> NaiveDate {
    date.checked_add_days(Days::new(n)).unwrap_or(date)
}

impl NotificationService {
    /// Create a new NotificationService instance
    pub fn new(
        db: PgPool,
        email_client: EmailClient,
        config: &EmailConfig,
        schedule: ScheduleService,
        weather: WeatherService,
    ) -> Self {
        Self {
            tasks: TaskService::new(db.clone()),
            db,
            email_client,
            app_url: config.app_url.trim_end_matches('/').to_string(),
            unsubscribe_secret: config.unsubscribe_secret.clone(),
            schedule,
            weather,
        }
    }

    // ========================================================================
    // Preferences
    // ========================================================================

    /// Preferences for a user; all kinds are on until changed
    pub async fn get_preferences(&self, user_id: Uuid) -> AppResult<NotificationPreferences> {
        let prefs = sqlx::query_as::<_, NotificationPreferences>(
            r#"
            SELECT task_reminders, weather_alerts, weekly_summary, care_recommendations
            FROM notification_preferences
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(prefs.unwrap_or_default())
    }

    pub async fn update_preferences(
        &self,
        user_id: Uuid,
        input: UpdatePreferencesInput,
    ) -> AppResult<NotificationPreferences> {
        let prefs = self.get_preferences(user_id).await?.apply(&input);
        self.save_preferences(user_id, prefs).await?;
        Ok(prefs)
    }

    async fn save_preferences(&self, user_id: Uuid, prefs: NotificationPreferences) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notification_preferences
                (user_id, task_reminders, weather_alerts, weekly_summary, care_recommendations)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                task_reminders = EXCLUDED.task_reminders,
                weather_alerts = EXCLUDED.weather_alerts,
                weekly_summary = EXCLUDED.weekly_summary,
                care_recommendations = EXCLUDED.care_recommendations,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(prefs.task_reminders)
        .bind(prefs.weather_alerts)
        .bind(prefs.weekly_summary)
        .bind(prefs.care_recommendations)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Turn off the kind named by a signed unsubscribe token
    pub async fn unsubscribe(&self, token: &str) -> AppResult<NotificationKind> {
        let (user_id, kind) = verify_unsubscribe_token(&self.unsubscribe_secret, token)?;

        let mut prefs = self.get_preferences(user_id).await?;
        prefs.set(kind, false);
        self.save_preferences(user_id, prefs).await?;

        tracing::info!(user_id = %user_id, kind = %kind, "Unsubscribed");
        Ok(kind)
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Render and send one notification, honouring preferences, and log it
    pub async fn dispatch(
        &self,
        recipient: &Recipient,
        payload: NotificationPayload,
    ) -> AppResult<DispatchResult> {
        let kind = payload.kind();
        let prefs = self.get_preferences(recipient.user_id).await?;

        if !prefs.allows(kind) {
            let log_id = self
                .log_dispatch(recipient.user_id, &payload, None, DispatchStatus::Skipped, None, None)
                .await?;
            tracing::debug!(user_id = %recipient.user_id, kind = %kind, "Notification disabled, skipped");
            return Ok(DispatchResult {
                log_id,
                kind,
                status: DispatchStatus::Skipped,
                error: None,
            });
        }

        let token = sign_unsubscribe_token(&self.unsubscribe_secret, recipient.user_id, kind)?;
        let ctx = EmailContext {
            app_url: self.app_url.clone(),
            unsubscribe_url: format!(
                "{}/api/v1/notifications/unsubscribe?token={}",
                self.app_url, token
            ),
        };
        let rendered = email::render(&payload, &ctx);

        let (status, provider_id, error) =
            match self.email_client.send(&recipient.email, &rendered).await {
                Ok(receipt) => (DispatchStatus::Sent, receipt.provider_id, None),
                Err(e) => {
                    tracing::warn!(user_id = %recipient.user_id, kind = %kind, "Email delivery failed: {}", e);
                    (DispatchStatus::Failed, None, Some(e.to_string()))
                }
            };

        let log_id = self
            .log_dispatch(
                recipient.user_id,
                &payload,
                Some(&rendered.subject),
                status,
                provider_id.as_deref(),
                error.as_deref(),
            )
            .await?;

        Ok(DispatchResult {
            log_id,
            kind,
            status,
            error,
        })
    }

    async fn log_dispatch(
        &self,
        user_id: Uuid,
        payload: &NotificationPayload,
        subject: Option<&str>,
        status: DispatchStatus,
        provider_id: Option<&str>,
        error: Option<&str>,
    ) -> AppResult<Uuid> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO notification_log (user_id, kind, subject, status, provider_id, error, payload)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(payload.kind().as_str())
        .bind(subject)
        .bind(status.as_str())
        .bind(provider_id)
        .bind(error)
        .bind(Json(payload))
        .fetch_one(&self.db)
        .await?;

        Ok(id)
    }

    /// Recent delivery log for a user, newest first
    pub async fn get_history(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<NotificationLogEntry>> {
        let entries = sqlx::query_as::<_, NotificationLogEntry>(
            r#"
            SELECT id, kind, subject, status, provider_id, error, created_at
            FROM notification_log
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit.clamp(1, 200))
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    // ========================================================================
    // Notification Triggers
    // ========================================================================

    async fn lawns_with_owners(&self) -> AppResult<Vec<(LawnProfile, Recipient)>> {
        let rows = sqlx::query_as::<_, LawnOwnerRow>(
            r#"
            SELECT lp.id, lp.user_id, lp.name, lp.size_sq_ft, lp.grass_type, lp.sun_exposure,
                   lp.location, lp.latitude, lp.longitude, lp.created_at, lp.updated_at,
                   u.email AS owner_email, u.name AS owner_name
            FROM lawn_profiles lp
            JOIN users u ON u.id = lp.user_id
            ORDER BY lp.created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                let recipient = Recipient {
                    user_id: row.lawn.user_id,
                    email: row.owner_email,
                    name: row.owner_name,
                };
                Ok((row.lawn.into_profile()?, recipient))
            })
            .collect()
    }

    /// Remind owners of pending tasks due tomorrow
    pub async fn trigger_task_reminders(&self, today: NaiveDate) -> AppResult<TriggerSummary> {
        let mut summary = TriggerSummary::new(NotificationKind::TaskReminder);
        let tomorrow = days_after(today, 1);

        let due = sqlx::query_as::<_, (Uuid, Uuid)>(
            r#"
            SELECT lawn_profile_id, task_id
            FROM scheduled_tasks
            WHERE status = 'pending' AND scheduled_date = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(tomorrow)
        .fetch_all(&self.db)
        .await?;

        if due.is_empty() {
            return Ok(summary);
        }

        let lawns: HashMap<Uuid, (LawnProfile, Recipient)> = self
            .lawns_with_owners()
            .await?
            .into_iter()
            .map(|(lawn, recipient)| (lawn.id, (lawn, recipient)))
            .collect();
        let tasks: HashMap<Uuid, MaintenanceTask> = self
            .tasks
            .list_tasks(None)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        for (lawn_id, task_id) in due {
            let (Some((lawn, recipient)), Some(task)) = (lawns.get(&lawn_id), tasks.get(&task_id))
            else {
                continue;
            };

            let weather = match lawn.coordinates {
                Some(_) => self
                    .weather
                    .forecast_for_lawn(lawn)
                    .await
                    .ok()
                    .and_then(|f| f.for_date(tomorrow).cloned()),
                None => None,
            };

            let payload = NotificationPayload::TaskReminder(TaskReminder {
                user_name: recipient.name.clone(),
                lawn_name: lawn.name.clone(),
                task_name: task.name.clone(),
                task_description: task.description.clone(),
                scheduled_date: tomorrow,
                estimated_duration: task.estimated_duration,
                products: task.products.clone(),
                weather,
            });
            summary.record(self.dispatch(recipient, payload).await);
        }

        Ok(summary)
    }

    /// Run the reschedule sweep on every lawn and tell owners what moved
    pub async fn trigger_weather_alerts(&self, today: NaiveDate) -> AppResult<TriggerSummary> {
        let mut summary = TriggerSummary::new(NotificationKind::WeatherAlert);

        for (lawn, recipient) in self.lawns_with_owners().await? {
            if lawn.coordinates.is_none() {
                continue;
            }

            let report = match self.schedule.sweep_lawn(&lawn, today).await {
                Ok(report) => report,
                Err(e) => {
                    tracing::warn!(lawn_id = %lawn.id, "Weather sweep failed: {}", e);
                    summary.failed += 1;
                    continue;
                }
            };

            let weather = self
                .weather
                .forecast_for_lawn(&lawn)
                .await
                .ok()
                .and_then(|f| report.changes().next().and_then(|o| f.for_date(o.original_date).cloned()));

            if let Some(alert) = weather_alert_payload(&recipient, &lawn, &report, weather) {
                summary.record(
                    self.dispatch(&recipient, NotificationPayload::WeatherAlert(alert))
                        .await,
                );
            }
        }

        Ok(summary)
    }

    /// Last week's results and next week's plan for every lawn
    pub async fn trigger_weekly_summaries(&self, today: NaiveDate) -> AppResult<TriggerSummary> {
        let mut summary = TriggerSummary::new(NotificationKind::WeeklySummary);
        let week_start = days_before(today, 7);
        let week_ahead = days_after(today, 6);

        for (lawn, recipient) in self.lawns_with_owners().await? {
            let entries = match self
                .schedule
                .entries_between(lawn.id, Some(week_start), Some(week_ahead), None)
                .await
            {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(lawn_id = %lawn.id, "Weekly summary query failed: {}", e);
                    summary.failed += 1;
                    continue;
                }
            };

            let (past, ahead): (Vec<ScheduleEntry>, Vec<ScheduleEntry>) = entries
                .into_iter()
                .partition(|e| e.scheduled.scheduled_date < today);

            let completed_tasks = summary_tasks(&past, TaskStatus::Completed);
            let skipped_tasks = summary_tasks(&past, TaskStatus::Skipped);
            let upcoming_tasks = summary_tasks(&ahead, TaskStatus::Pending);

            if completed_tasks.is_empty() && skipped_tasks.is_empty() && upcoming_tasks.is_empty() {
                continue;
            }

            let forecast = match lawn.coordinates {
                Some(_) => self
                    .weather
                    .forecast_for_lawn(&lawn)
                    .await
                    .map(|f| f.days)
                    .unwrap_or_default(),
                None => Vec::new(),
            };

            let payload = NotificationPayload::WeeklySummary(WeeklySummary {
                user_name: recipient.name.clone(),
                lawn_name: lawn.name.clone(),
                week_start,
                completed_tasks,
                skipped_tasks,
                upcoming_tasks,
                forecast,
            });
            summary.record(self.dispatch(&recipient, payload).await);
        }

        Ok(summary)
    }

    /// Seasonal care advice for every lawn
    pub async fn trigger_care_recommendations(&self, today: NaiveDate) -> AppResult<TriggerSummary> {
        let mut summary = TriggerSummary::new(NotificationKind::CareRecommendations);

        for (lawn, recipient) in self.lawns_with_owners().await? {
            let recommendations = match self.schedule.recommendations_for(&lawn, today).await {
                Ok(recs) => care_items(&recs),
                Err(e) => {
                    tracing::warn!(lawn_id = %lawn.id, "Recommendations failed: {}", e);
                    summary.failed += 1;
                    continue;
                }
            };

            if recommendations.is_empty() {
                continue;
            }

            let payload = NotificationPayload::CareRecommendations(CareRecommendations {
                user_name: recipient.name.clone(),
                lawn_name: lawn.name.clone(),
                grass_type: lawn.grass_type.to_string(),
                season: season_on(today),
                recommendations,
            });
            summary.record(self.dispatch(&recipient, payload).await);
        }

        Ok(summary)
    }

    /// Run every trigger for today's local date
    pub async fn run_all_triggers(&self) -> AppResult<Vec<TriggerSummary>> {
        let today = Local::now().date_naive();

        // Sweep first so reminders describe the final schedule
        let weather = self.trigger_weather_alerts(today).await?;
        let reminders = self.trigger_task_reminders(today).await?;
        let weekly = self.trigger_weekly_summaries(today).await?;
        let care = self.trigger_care_recommendations(today).await?;

        Ok(vec![reminders, weather, weekly, care])
    }
}
