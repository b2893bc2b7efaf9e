//! Scheduled task service
//!
//! Owns the schedule lifecycle for a lawn: placing tasks on dates, status
//! changes, the weather-driven reschedule sweep, next-date lookups,
//! recommendations and CSV export. All eligibility decisions are delegated to
//! `shared::scheduling`; this module only persists what it recommends.

use std::collections::HashMap;

use chrono::{DateTime, Days, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::models::{
    LawnProfile, MaintenanceTask, Priority, ScheduledTask, TaskStatus, WeatherObservation,
};
use shared::scheduling::{
    check_weather_conditions, get_next_available_date, is_task_in_season_on,
    should_reschedule_task_on, sort_tasks_by_priority, WeatherCheck, FORECAST_HORIZON_DAYS,
};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::{LawnService, TaskService, WeatherService};

/// Scheduled task service
#[derive(Clone)]
pub struct ScheduleService {
    db: PgPool,
    lawns: LawnService,
    tasks: TaskService,
    weather: WeatherService,
}

/// Scheduled task row
#[derive(Debug, sqlx::FromRow)]
struct ScheduledRow {
    id: Uuid,
    lawn_profile_id: Uuid,
    task_id: Uuid,
    scheduled_date: NaiveDate,
    status: String,
    weather_adjusted: bool,
    notes: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ScheduledRow {
    fn into_scheduled(self) -> AppResult<ScheduledTask> {
        let status = self
            .status
            .parse::<TaskStatus>()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(ScheduledTask {
            id: self.id,
            lawn_profile_id: self.lawn_profile_id,
            task_id: self.task_id,
            scheduled_date: self.scheduled_date,
            status,
            weather_adjusted: self.weather_adjusted,
            notes: self.notes,
            completed_at: self.completed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SCHEDULED_COLUMNS: &str = "id, lawn_profile_id, task_id, scheduled_date, status, \
     weather_adjusted, notes, completed_at, created_at, updated_at";

const SCHEDULED_COLUMNS_ST: &str = "st.id, st.lawn_profile_id, st.task_id, st.scheduled_date, \
     st.status, st.weather_adjusted, st.notes, st.completed_at, st.created_at, st.updated_at";

/// A scheduled task together with the definition fields a list view needs
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleEntry {
    #[serde(flatten)]
    pub scheduled: ScheduledTask,
    pub task_name: String,
    pub priority: Priority,
    pub estimated_duration: i32,
}

/// Filters for listing a lawn's schedule
#[derive(Debug, Default, Deserialize)]
pub struct ScheduleQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<TaskStatus>,
}

/// Input for placing a task on a lawn's schedule
#[derive(Debug, Deserialize, Validate)]
pub struct ScheduleTaskInput {
    pub task_id: Uuid,
    pub scheduled_date: NaiveDate,
    #[validate(length(max = 1000, message = "Notes are too long"))]
    pub notes: Option<String>,
}

/// Input for changing a scheduled task's status
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusInput {
    pub status: TaskStatus,
    /// Required when the new status is `rescheduled`
    pub new_date: Option<NaiveDate>,
    #[validate(length(max = 1000, message = "Notes are too long"))]
    pub notes: Option<String>,
}

/// Result of a status change; a reschedule also yields the replacement task
#[derive(Debug, Serialize)]
pub struct StatusChange {
    pub scheduled_task: ScheduledTask,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement: Option<ScheduledTask>,
}

#[derive(Debug, Serialize)]
pub struct NextDate {
    pub scheduled_task_id: Uuid,
    pub next_date: Option<NaiveDate>,
}

/// An in-season task, with its weather check when current weather is known
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub task: MaintenanceTask,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_check: Option<WeatherCheck>,
}

/// What the sweep did with one scheduled task
#[derive(Debug, Clone, Serialize)]
pub struct RescheduleOutcome {
    pub scheduled_task_id: Uuid,
    pub task_name: String,
    pub original_date: NaiveDate,
    /// `None` when no suitable day exists in the forecast; the task stays pending
    pub new_date: Option<NaiveDate>,
    pub new_scheduled_task_id: Option<Uuid>,
    pub reason: String,
}

/// A move the sweep decided on but could not store
#[derive(Debug, Clone, Serialize)]
pub struct SweepFailure {
    #[serde(flatten)]
    pub outcome: RescheduleOutcome,
    pub error: String,
}

/// Result of sweeping one lawn's upcoming schedule
#[derive(Debug, Serialize)]
pub struct EvaluationReport {
    pub lawn_id: Uuid,
    pub evaluated: usize,
    pub rescheduled: Vec<RescheduleOutcome>,
    pub deferred: Vec<RescheduleOutcome>,
    /// Tasks that left `pending` or hit a database error mid-sweep
    pub failed: Vec<SweepFailure>,
}

impl EvaluationReport {
    pub fn changes(&self) -> impl Iterator<Item = &RescheduleOutcome> {
        self.rescheduled.iter().chain(self.deferred.iter())
    }
}

const CSV_HEADER: [&str; 7] = [
    "date",
    "task",
    "priority",
    "status",
    "weather_adjusted",
    "estimated_minutes",
    "notes",
];

#[derive(Debug, Serialize)]
struct CsvRecord<'a> {
    date: NaiveDate,
    task: &'a str,
    priority: &'a str,
    status: &'a str,
    weather_adjusted: bool,
    estimated_minutes: i32,
    notes: &'a str,
}

/// Decision for one pending task
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReschedulePlan {
    pub reason: String,
    pub new_date: Option<NaiveDate>,
}

/// Decide whether a pending task must move, and where to.
///
/// Tasks without a forecast entry for their date are left alone.
pub(crate) fn plan_reschedule(
    task: &MaintenanceTask,
    scheduled: &ScheduledTask,
    forecast: &[WeatherObservation],
    today: NaiveDate,
) -> Option<ReschedulePlan> {
    let weather = forecast.iter().find(|d| d.date == scheduled.scheduled_date)?;
    if !should_reschedule_task_on(task, scheduled, weather, today) {
        return None;
    }

    let reason = if is_task_in_season_on(task, today) {
        check_weather_conditions(task, weather)
            .reason
            .unwrap_or_else(|| "Unsuitable weather".to_string())
    } else {
        format!("{} is out of season", task.name)
    };

    Some(ReschedulePlan {
        reason,
        new_date: get_next_available_date(task, scheduled.scheduled_date, forecast),
    })
}

/// In-season tasks for `today`, highest priority first
pub(crate) fn build_recommendations(
    tasks: &[MaintenanceTask],
    today: NaiveDate,
    weather: Option<&WeatherObservation>,
) -> Vec<Recommendation> {
    let in_season: Vec<MaintenanceTask> = tasks
        .iter()
        .filter(|task| is_task_in_season_on(task, today))
        .cloned()
        .collect();

    sort_tasks_by_priority(&in_season)
        .into_iter()
        .map(|task| Recommendation {
            weather_check: weather.map(|w| check_weather_conditions(&task, w)),
            task,
        })
        .collect()
}

/// Reject dates a task cannot be placed on
pub(crate) fn ensure_schedulable(
    task: &MaintenanceTask,
    date: NaiveDate,
    today: NaiveDate,
) -> AppResult<()> {
    if date < today {
        return Err(AppError::validation(
            "scheduled_date",
            "Scheduled date cannot be in the past",
        ));
    }
    if !is_task_in_season_on(task, date) {
        let seasons: Vec<&str> = task.seasons.iter().map(|s| s.as_str()).collect();
        return Err(AppError::validation(
            "scheduled_date",
            format!(
                "{} is only done in {}; {} is out of season",
                task.name,
                seasons.join(", "),
                date
            ),
        ));
    }
    Ok(())
}

/// Reject a manual reschedule target for `current`
pub(crate) fn ensure_reschedulable(
    task: &MaintenanceTask,
    current: &ScheduledTask,
    new_date: NaiveDate,
    today: NaiveDate,
) -> AppResult<()> {
    if new_date == current.scheduled_date {
        return Err(AppError::validation(
            "new_date",
            "New date must differ from the current scheduled date",
        ));
    }
    ensure_schedulable(task, new_date, today)
}

/// File the result of one sweep move; a failed move never aborts the sweep
pub(crate) fn record_move(
    report: &mut EvaluationReport,
    mut outcome: RescheduleOutcome,
    result: AppResult<ScheduledTask>,
) {
    match result {
        Ok(replacement) => {
            outcome.new_scheduled_task_id = Some(replacement.id);
            tracing::info!(
                lawn_id = %report.lawn_id,
                task = %outcome.task_name,
                from = %outcome.original_date,
                to = %replacement.scheduled_date,
                reason = %outcome.reason,
                "Task rescheduled"
            );
            report.rescheduled.push(outcome);
        }
        Err(e) => {
            tracing::warn!(
                lawn_id = %report.lawn_id,
                scheduled_task_id = %outcome.scheduled_task_id,
                task = %outcome.task_name,
                "Failed to reschedule task: {}",
                e
            );
            report.failed.push(SweepFailure {
                outcome,
                error: e.to_string(),
            });
        }
    }
}

fn horizon_end(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_days(Days::new(FORECAST_HORIZON_DAYS))
        .unwrap_or(today)
}

/// Render schedule entries as CSV
pub(crate) fn entries_to_csv(entries: &[ScheduleEntry]) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    // serialize() only emits the header alongside the first record
    if entries.is_empty() {
        wtr.write_record(CSV_HEADER)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    for entry in entries {
        wtr.serialize(CsvRecord {
            date: entry.scheduled.scheduled_date,
            task: &entry.task_name,
            priority: entry.priority.as_str(),
            status: entry.scheduled.status.as_str(),
            weather_adjusted: entry.scheduled.weather_adjusted,
            estimated_minutes: entry.estimated_duration,
            notes: entry.scheduled.notes.as_deref().unwrap_or(""),
        })
        .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}

impl ScheduleService {
    /// Create a new ScheduleService instance
    pub fn new(db: PgPool, weather: WeatherService) -> Self {
        Self {
            lawns: LawnService::new(db.clone()),
            tasks: TaskService::new(db.clone()),
            db,
            weather,
        }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// A lawn's schedule, oldest first
    pub async fn list_schedule(
        &self,
        user_id: Uuid,
        lawn_id: Uuid,
        query: ScheduleQuery,
    ) -> AppResult<Vec<ScheduleEntry>> {
        self.lawns.get_lawn(user_id, lawn_id).await?;
        self.entries_between(lawn_id, query.from, query.to, query.status)
            .await
    }

    /// Schedule entries for a lawn without an ownership check
    pub(crate) async fn entries_between(
        &self,
        lawn_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        status: Option<TaskStatus>,
    ) -> AppResult<Vec<ScheduleEntry>> {
        let rows = sqlx::query_as::<_, ScheduledRow>(&format!(
            r#"
            SELECT {}
            FROM scheduled_tasks
            WHERE lawn_profile_id = $1
              AND ($2::date IS NULL OR scheduled_date >= $2)
              AND ($3::date IS NULL OR scheduled_date <= $3)
              AND ($4::text IS NULL OR status = $4)
            ORDER BY scheduled_date ASC, created_at ASC
            "#,
            SCHEDULED_COLUMNS
        ))
        .bind(lawn_id)
        .bind(from)
        .bind(to)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        let tasks = self.task_map().await?;
        rows.into_iter()
            .map(|row| {
                let scheduled = row.into_scheduled()?;
                let task = tasks
                    .get(&scheduled.task_id)
                    .ok_or_else(|| AppError::NotFound("Maintenance task".to_string()))?;
                Ok(ScheduleEntry {
                    task_name: task.name.clone(),
                    priority: task.priority,
                    estimated_duration: task.estimated_duration,
                    scheduled,
                })
            })
            .collect()
    }

    async fn task_map(&self) -> AppResult<HashMap<Uuid, MaintenanceTask>> {
        Ok(self
            .tasks
            .list_tasks(None)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect())
    }

    /// A scheduled task on one of the user's lawns
    async fn get_owned(&self, user_id: Uuid, scheduled_id: Uuid) -> AppResult<ScheduledTask> {
        sqlx::query_as::<_, ScheduledRow>(&format!(
            r#"
            SELECT {}
            FROM scheduled_tasks st
            JOIN lawn_profiles lp ON lp.id = st.lawn_profile_id
            WHERE st.id = $1 AND lp.user_id = $2
            "#,
            SCHEDULED_COLUMNS_ST
        ))
        .bind(scheduled_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Scheduled task".to_string()))?
        .into_scheduled()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Place a task on a lawn's schedule
    pub async fn schedule_task(
        &self,
        user_id: Uuid,
        lawn_id: Uuid,
        input: ScheduleTaskInput,
    ) -> AppResult<ScheduledTask> {
        input.validate()?;
        self.lawns.get_lawn(user_id, lawn_id).await?;
        let task = self.tasks.get_task(input.task_id).await?;
        ensure_schedulable(&task, input.scheduled_date, Self::today())?;

        let scheduled = sqlx::query_as::<_, ScheduledRow>(&format!(
            r#"
            INSERT INTO scheduled_tasks (lawn_profile_id, task_id, scheduled_date, status, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            SCHEDULED_COLUMNS
        ))
        .bind(lawn_id)
        .bind(task.id)
        .bind(input.scheduled_date)
        .bind(TaskStatus::Pending.as_str())
        .bind(&input.notes)
        .fetch_one(&self.db)
        .await?
        .into_scheduled()?;

        tracing::info!(
            scheduled_task_id = %scheduled.id,
            lawn_id = %lawn_id,
            task = %task.name,
            date = %scheduled.scheduled_date,
            "Task scheduled"
        );
        Ok(scheduled)
    }

    /// Move a scheduled task to a new status
    pub async fn update_status(
        &self,
        user_id: Uuid,
        scheduled_id: Uuid,
        input: UpdateStatusInput,
    ) -> AppResult<StatusChange> {
        input.validate()?;
        let current = self.get_owned(user_id, scheduled_id).await?;

        if !current.status.can_transition_to(input.status) {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot change status from {} to {}",
                current.status, input.status
            )));
        }

        if input.status == TaskStatus::Rescheduled {
            let new_date = input.new_date.ok_or_else(|| {
                AppError::validation("new_date", "A new date is required to reschedule")
            })?;
            let task = self.tasks.get_task(current.task_id).await?;
            ensure_reschedulable(&task, &current, new_date, Self::today())?;

            let note = input
                .notes
                .unwrap_or_else(|| format!("Moved from {}", current.scheduled_date));
            let (original, replacement) = self.replace(&current, new_date, &note, false).await?;
            return Ok(StatusChange {
                scheduled_task: original,
                replacement: Some(replacement),
            });
        }

        let updated = sqlx::query_as::<_, ScheduledRow>(&format!(
            r#"
            UPDATE scheduled_tasks SET
                status = $3,
                completed_at = CASE WHEN $3 = 'completed' THEN NOW() ELSE NULL END,
                notes = COALESCE($4, notes),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            SCHEDULED_COLUMNS
        ))
        .bind(current.id)
        .bind(current.status.as_str())
        .bind(input.status.as_str())
        .bind(&input.notes)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| {
            AppError::InvalidStateTransition("Scheduled task was changed concurrently".to_string())
        })?
        .into_scheduled()?;

        tracing::info!(
            scheduled_task_id = %updated.id,
            from = %current.status,
            to = %updated.status,
            "Scheduled task status changed"
        );

        Ok(StatusChange {
            scheduled_task: updated,
            replacement: None,
        })
    }

    /// Mark `current` rescheduled and insert a pending copy on `new_date`
    async fn replace(
        &self,
        current: &ScheduledTask,
        new_date: NaiveDate,
        note: &str,
        weather_adjusted: bool,
    ) -> AppResult<(ScheduledTask, ScheduledTask)> {
        let mut tx: Transaction<'_, Postgres> = self.db.begin().await?;

        let original = sqlx::query_as::<_, ScheduledRow>(&format!(
            r#"
            UPDATE scheduled_tasks SET
                status = 'rescheduled',
                weather_adjusted = weather_adjusted OR $2,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            SCHEDULED_COLUMNS
        ))
        .bind(current.id)
        .bind(weather_adjusted)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::InvalidStateTransition("Only pending tasks can be rescheduled".to_string())
        })?
        .into_scheduled()?;

        let replacement = sqlx::query_as::<_, ScheduledRow>(&format!(
            r#"
            INSERT INTO scheduled_tasks (lawn_profile_id, task_id, scheduled_date, status,
                                         weather_adjusted, notes)
            VALUES ($1, $2, $3, 'pending', $4, $5)
            RETURNING {}
            "#,
            SCHEDULED_COLUMNS
        ))
        .bind(current.lawn_profile_id)
        .bind(current.task_id)
        .bind(new_date)
        .bind(weather_adjusted)
        .bind(note)
        .fetch_one(&mut *tx)
        .await?
        .into_scheduled()?;

        tx.commit().await?;

        Ok((original, replacement))
    }

    // ========================================================================
    // Weather-driven evaluation
    // ========================================================================

    /// Run the reschedule sweep over one of the user's lawns
    pub async fn evaluate_lawn(&self, user_id: Uuid, lawn_id: Uuid) -> AppResult<EvaluationReport> {
        let lawn = self.lawns.get_lawn(user_id, lawn_id).await?;
        self.sweep_lawn(&lawn, Self::today()).await
    }

    /// Check every pending task within the forecast horizon and move the
    /// ones the weather or season rules out
    pub(crate) async fn sweep_lawn(
        &self,
        lawn: &LawnProfile,
        today: NaiveDate,
    ) -> AppResult<EvaluationReport> {
        let forecast = self.weather.forecast_for_lawn(lawn).await?;
        let pending = self
            .entries_between(
                lawn.id,
                Some(today),
                Some(horizon_end(today)),
                Some(TaskStatus::Pending),
            )
            .await?;
        let tasks = self.task_map().await?;

        let mut report = EvaluationReport {
            lawn_id: lawn.id,
            evaluated: pending.len(),
            rescheduled: Vec::new(),
            deferred: Vec::new(),
            failed: Vec::new(),
        };

        for entry in pending {
            let scheduled = entry.scheduled;
            let Some(task) = tasks.get(&scheduled.task_id) else {
                continue;
            };
            let Some(plan) = plan_reschedule(task, &scheduled, &forecast.days, today) else {
                continue;
            };

            let outcome = RescheduleOutcome {
                scheduled_task_id: scheduled.id,
                task_name: task.name.clone(),
                original_date: scheduled.scheduled_date,
                new_date: plan.new_date,
                new_scheduled_task_id: None,
                reason: plan.reason,
            };

            match plan.new_date {
                Some(new_date) => {
                    let note = format!("Moved from {}: {}", scheduled.scheduled_date, outcome.reason);
                    let result = self
                        .replace(&scheduled, new_date, &note, true)
                        .await
                        .map(|(_, replacement)| replacement);
                    record_move(&mut report, outcome, result);
                }
                None => {
                    tracing::info!(
                        lawn_id = %lawn.id,
                        task = %task.name,
                        date = %scheduled.scheduled_date,
                        reason = %outcome.reason,
                        "No suitable day in forecast, task left pending"
                    );
                    report.deferred.push(outcome);
                }
            }
        }

        Ok(report)
    }

    /// Next suitable day for a scheduled task, from its date or today if later
    pub async fn next_date(&self, user_id: Uuid, scheduled_id: Uuid) -> AppResult<NextDate> {
        let scheduled = self.get_owned(user_id, scheduled_id).await?;
        let lawn = self.lawns.get_lawn(user_id, scheduled.lawn_profile_id).await?;
        let task = self.tasks.get_task(scheduled.task_id).await?;
        let forecast = self.weather.forecast_for_lawn(&lawn).await?;

        let from = scheduled.scheduled_date.max(Self::today());
        Ok(NextDate {
            scheduled_task_id: scheduled.id,
            next_date: get_next_available_date(&task, from, &forecast.days),
        })
    }

    /// In-season tasks for a lawn, checked against current weather if known
    pub async fn recommendations(&self, user_id: Uuid, lawn_id: Uuid) -> AppResult<Vec<Recommendation>> {
        let lawn = self.lawns.get_lawn(user_id, lawn_id).await?;
        self.recommendations_for(&lawn, Self::today()).await
    }

    pub(crate) async fn recommendations_for(
        &self,
        lawn: &LawnProfile,
        today: NaiveDate,
    ) -> AppResult<Vec<Recommendation>> {
        let weather = match self.weather.current_for_lawn(lawn).await {
            Ok(w) => Some(w),
            Err(e) => {
                tracing::debug!(lawn_id = %lawn.id, "Recommendations without weather: {}", e);
                None
            }
        };
        let tasks = self.tasks.list_tasks(None).await?;
        Ok(build_recommendations(&tasks, today, weather.as_ref()))
    }

    /// The full schedule of a lawn as CSV, with a file name for download
    pub async fn export_csv(&self, user_id: Uuid, lawn_id: Uuid) -> AppResult<(String, String)> {
        let lawn = self.lawns.get_lawn(user_id, lawn_id).await?;
        let entries = self.entries_between(lawn.id, None, None, None).await?;
        let filename = format!("schedule-{}.csv", lawn.id);
        Ok((filename, entries_to_csv(&entries)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{Season, TemperatureRange, WeatherFactors};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(name: &str, priority: Priority, seasons: Vec<Season>) -> MaintenanceTask {
        MaintenanceTask {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            estimated_duration: 30,
            priority,
            weather_factors: Some(WeatherFactors {
                temperature: Some(TemperatureRange { min: 50.0, max: 85.0 }),
                ..Default::default()
            }),
            seasons,
            products: vec![],
        }
    }

    fn scheduled(task: &MaintenanceTask, on: NaiveDate, status: TaskStatus) -> ScheduledTask {
        ScheduledTask {
            id: Uuid::new_v4(),
            lawn_profile_id: Uuid::new_v4(),
            task_id: task.id,
            scheduled_date: on,
            status,
            weather_adjusted: false,
            notes: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn day(on: NaiveDate, temperature: f64) -> WeatherObservation {
        WeatherObservation {
            date: on,
            temperature,
            condition: "Clear".to_string(),
            humidity: 40.0,
            wind_speed: 5.0,
            precipitation: 0.0,
            icon: "01d".to_string(),
        }
    }

    #[test]
    fn test_plan_moves_to_first_suitable_day() {
        let fertilize = task("Fertilize", Priority::High, vec![Season::Spring]);
        let st = scheduled(&fertilize, date(2024, 4, 10), TaskStatus::Pending);
        let forecast = vec![
            day(date(2024, 4, 10), 40.0),
            day(date(2024, 4, 11), 45.0),
            day(date(2024, 4, 12), 65.0),
        ];

        let plan = plan_reschedule(&fertilize, &st, &forecast, date(2024, 4, 9)).unwrap();
        assert_eq!(plan.new_date, Some(date(2024, 4, 12)));
        assert!(plan.reason.starts_with("Temperature too low"));
    }

    #[test]
    fn test_plan_without_suitable_day_defers() {
        let fertilize = task("Fertilize", Priority::High, vec![Season::Spring]);
        let st = scheduled(&fertilize, date(2024, 4, 10), TaskStatus::Pending);
        let forecast = vec![day(date(2024, 4, 10), 95.0), day(date(2024, 4, 11), 95.0)];

        let plan = plan_reschedule(&fertilize, &st, &forecast, date(2024, 4, 9)).unwrap();
        assert_eq!(plan.new_date, None);
    }

    #[test]
    fn test_plan_leaves_good_days_and_terminal_tasks() {
        let mow = task("Mow", Priority::Medium, vec![Season::Spring]);
        let forecast = vec![day(date(2024, 4, 10), 70.0)];

        let st = scheduled(&mow, date(2024, 4, 10), TaskStatus::Pending);
        assert_eq!(plan_reschedule(&mow, &st, &forecast, date(2024, 4, 9)), None);

        let cold = vec![day(date(2024, 4, 10), 30.0)];
        let done = scheduled(&mow, date(2024, 4, 10), TaskStatus::Completed);
        assert_eq!(plan_reschedule(&mow, &done, &cold, date(2024, 4, 9)), None);
    }

    #[test]
    fn test_plan_ignores_dates_without_forecast() {
        let mow = task("Mow", Priority::Medium, vec![Season::Spring]);
        let st = scheduled(&mow, date(2024, 4, 20), TaskStatus::Pending);
        let forecast = vec![day(date(2024, 4, 10), 30.0)];
        assert_eq!(plan_reschedule(&mow, &st, &forecast, date(2024, 4, 9)), None);
    }

    #[test]
    fn test_plan_out_of_season_reason() {
        let overseed = task("Overseed", Priority::Medium, vec![Season::Fall]);
        let st = scheduled(&overseed, date(2024, 4, 10), TaskStatus::Pending);
        let forecast = vec![day(date(2024, 4, 10), 70.0)];

        let plan = plan_reschedule(&overseed, &st, &forecast, date(2024, 4, 9)).unwrap();
        assert_eq!(plan.reason, "Overseed is out of season");
        assert_eq!(plan.new_date, None);
    }

    #[test]
    fn test_recommendations_filter_and_order() {
        let tasks = vec![
            task("Weed control", Priority::Low, vec![Season::Summer]),
            task("Overseed", Priority::Medium, vec![Season::Fall]),
            task("Water", Priority::High, vec![Season::Summer]),
        ];
        let today = date(2024, 7, 1);

        let recs = build_recommendations(&tasks, today, None);
        let names: Vec<&str> = recs.iter().map(|r| r.task.name.as_str()).collect();
        assert_eq!(names, vec!["Water", "Weed control"]);
        assert!(recs.iter().all(|r| r.weather_check.is_none()));

        let hot = day(today, 100.0);
        let recs = build_recommendations(&tasks, today, Some(&hot));
        assert!(recs.iter().all(|r| r.weather_check.as_ref().map(|c| !c.is_valid) == Some(true)));
    }

    #[test]
    fn test_ensure_schedulable() {
        let overseed = task("Overseed", Priority::Medium, vec![Season::Fall]);
        let today = date(2024, 9, 1);
        assert!(ensure_schedulable(&overseed, date(2024, 9, 15), today).is_ok());
        assert!(ensure_schedulable(&overseed, date(2024, 8, 15), today).is_err());
        assert!(ensure_schedulable(&overseed, date(2024, 12, 15), today).is_err());
    }

    #[test]
    fn test_reschedule_to_same_date_is_rejected() {
        let mow = task("Mow", Priority::Medium, vec![Season::Summer]);
        let today = date(2024, 7, 1);
        let st = scheduled(&mow, date(2024, 7, 3), TaskStatus::Pending);

        let err = ensure_reschedulable(&mow, &st, date(2024, 7, 3), today).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "new_date"));
        assert!(ensure_reschedulable(&mow, &st, date(2024, 7, 4), today).is_ok());
        assert!(ensure_reschedulable(&mow, &st, date(2024, 6, 30), today).is_err());
    }

    fn outcome_for(st: &ScheduledTask, name: &str, new_date: NaiveDate) -> RescheduleOutcome {
        RescheduleOutcome {
            scheduled_task_id: st.id,
            task_name: name.to_string(),
            original_date: st.scheduled_date,
            new_date: Some(new_date),
            new_scheduled_task_id: None,
            reason: "Temperature too low".to_string(),
        }
    }

    #[test]
    fn test_sweep_keeps_going_when_a_task_leaves_pending() {
        let mow = task("Mow", Priority::Medium, vec![Season::Spring]);
        let edge = task("Edge", Priority::Low, vec![Season::Spring]);
        let a = scheduled(&mow, date(2024, 4, 10), TaskStatus::Pending);
        let b = scheduled(&edge, date(2024, 4, 10), TaskStatus::Pending);
        let mut report = EvaluationReport {
            lawn_id: a.lawn_profile_id,
            evaluated: 2,
            rescheduled: vec![],
            deferred: vec![],
            failed: vec![],
        };

        let moved = scheduled(&mow, date(2024, 4, 12), TaskStatus::Pending);
        let moved_id = moved.id;
        record_move(&mut report, outcome_for(&a, "Mow", date(2024, 4, 12)), Ok(moved));
        // The owner completed B before the sweep reached it
        record_move(
            &mut report,
            outcome_for(&b, "Edge", date(2024, 4, 12)),
            Err(AppError::InvalidStateTransition(
                "Only pending tasks can be rescheduled".to_string(),
            )),
        );

        assert_eq!(report.rescheduled.len(), 1);
        assert_eq!(report.rescheduled[0].new_scheduled_task_id, Some(moved_id));
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].outcome.scheduled_task_id, b.id);
        assert!(report.failed[0].error.contains("Only pending tasks"));
        assert_eq!(report.changes().count(), 1);
    }

    #[test]
    fn test_entries_to_csv() {
        let mow = task("Mow", Priority::Medium, vec![Season::Summer]);
        let mut st = scheduled(&mow, date(2024, 7, 1), TaskStatus::Pending);
        st.notes = Some("Moved from 2024-06-30: rain, wind".to_string());
        let entries = vec![ScheduleEntry {
            scheduled: st,
            task_name: "Mow".to_string(),
            priority: Priority::Medium,
            estimated_duration: 45,
        }];

        let csv = entries_to_csv(&entries).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("date,task,priority,status,weather_adjusted,estimated_minutes,notes")
        );
        assert_eq!(
            lines.next(),
            Some("2024-07-01,Mow,medium,pending,false,45,\"Moved from 2024-06-30: rain, wind\"")
        );
    }

    #[test]
    fn test_empty_export_has_header() {
        let csv = entries_to_csv(&[]).unwrap();
        assert_eq!(csv.trim_end(), CSV_HEADER.join(","));
    }

    #[test]
    fn test_horizon_end() {
        assert_eq!(horizon_end(date(2024, 12, 30)), date(2025, 1, 4));
    }
}
