//! Maintenance task catalogue service

use serde::Deserialize;
use shared::models::{MaintenanceTask, Priority, Season, WeatherFactors};
use shared::validation::{validate_duration_minutes, validate_seasons, validate_weather_factors};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Maintenance task service
#[derive(Clone)]
pub struct TaskService {
    db: PgPool,
}

/// Maintenance task row
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    name: String,
    description: String,
    estimated_duration: i32,
    priority: String,
    weather_factors: Option<Json<WeatherFactors>>,
    seasons: Json<Vec<Season>>,
    products: Json<Vec<String>>,
}

impl From<TaskRow> for MaintenanceTask {
    fn from(row: TaskRow) -> Self {
        MaintenanceTask {
            id: row.id,
            name: row.name,
            description: row.description,
            estimated_duration: row.estimated_duration,
            priority: Priority::from_db(&row.priority),
            weather_factors: row.weather_factors.map(|Json(f)| f),
            seasons: row.seasons.0,
            products: row.products.0,
        }
    }
}

const TASK_COLUMNS: &str =
    "id, name, description, estimated_duration, priority, weather_factors, seasons, products";

/// Input for creating a maintenance task
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskInput {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 2000, message = "Description is too long"))]
    pub description: String,
    pub estimated_duration: i32,
    pub priority: Priority,
    pub weather_factors: Option<WeatherFactors>,
    pub seasons: Vec<Season>,
    #[serde(default)]
    pub products: Vec<String>,
}

/// Input for updating a maintenance task
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskInput {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "Description is too long"))]
    pub description: Option<String>,
    pub estimated_duration: Option<i32>,
    pub priority: Option<Priority>,
    pub weather_factors: Option<WeatherFactors>,
    pub seasons: Option<Vec<Season>>,
    pub products: Option<Vec<String>>,
}

fn check_definition(
    estimated_duration: Option<i32>,
    priority: Option<Priority>,
    weather_factors: Option<&WeatherFactors>,
    seasons: Option<&[Season]>,
) -> AppResult<()> {
    if let Some(minutes) = estimated_duration {
        validate_duration_minutes(minutes)
            .map_err(|m| AppError::validation("estimated_duration", m))?;
    }
    if priority == Some(Priority::Unknown) {
        return Err(AppError::validation(
            "priority",
            "Priority must be high, medium or low",
        ));
    }
    if let Some(factors) = weather_factors {
        validate_weather_factors(factors).map_err(|m| AppError::validation("weather_factors", m))?;
    }
    if let Some(seasons) = seasons {
        validate_seasons(seasons).map_err(|m| AppError::validation("seasons", m))?;
    }
    Ok(())
}

/// Collapse repeated seasons while keeping their first-seen order
fn dedup_seasons(seasons: Vec<Season>) -> Vec<Season> {
    let mut out = Vec::with_capacity(seasons.len());
    for season in seasons {
        if !out.contains(&season) {
            out.push(season);
        }
    }
    out
}

impl TaskService {
    /// Create a new TaskService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All task definitions, optionally only those applying to one season
    pub async fn list_tasks(&self, season: Option<Season>) -> AppResult<Vec<MaintenanceTask>> {
        let rows = match season {
            Some(season) => {
                sqlx::query_as::<_, TaskRow>(&format!(
                    "SELECT {} FROM maintenance_tasks WHERE seasons ? $1 ORDER BY name ASC",
                    TASK_COLUMNS
                ))
                .bind(season.as_str())
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, TaskRow>(&format!(
                    "SELECT {} FROM maintenance_tasks ORDER BY name ASC",
                    TASK_COLUMNS
                ))
                .fetch_all(&self.db)
                .await?
            }
        };

        Ok(rows.into_iter().map(MaintenanceTask::from).collect())
    }

    pub async fn get_task(&self, task_id: Uuid) -> AppResult<MaintenanceTask> {
        sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM maintenance_tasks WHERE id = $1",
            TASK_COLUMNS
        ))
        .bind(task_id)
        .fetch_optional(&self.db)
        .await?
        .map(MaintenanceTask::from)
        .ok_or_else(|| AppError::NotFound("Maintenance task".to_string()))
    }

    /// Create a new task definition
    pub async fn create_task(&self, input: CreateTaskInput) -> AppResult<MaintenanceTask> {
        input.validate()?;
        check_definition(
            Some(input.estimated_duration),
            Some(input.priority),
            input.weather_factors.as_ref(),
            Some(&input.seasons),
        )?;
        self.ensure_unique_name(&input.name, None).await?;

        let task: MaintenanceTask = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            INSERT INTO maintenance_tasks (name, description, estimated_duration, priority,
                                           weather_factors, seasons, products)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.estimated_duration)
        .bind(input.priority.as_str())
        .bind(input.weather_factors.filter(|f| !f.is_empty()).map(Json))
        .bind(Json(dedup_seasons(input.seasons)))
        .bind(Json(input.products))
        .fetch_one(&self.db)
        .await?
        .into();

        tracing::info!(task_id = %task.id, name = %task.name, "Maintenance task created");
        Ok(task)
    }

    /// Update a task definition; absent fields keep their value
    pub async fn update_task(&self, task_id: Uuid, input: UpdateTaskInput) -> AppResult<MaintenanceTask> {
        input.validate()?;
        check_definition(
            input.estimated_duration,
            input.priority,
            input.weather_factors.as_ref(),
            input.seasons.as_deref(),
        )?;
        if let Some(ref name) = input.name {
            self.ensure_unique_name(name, Some(task_id)).await?;
        }

        sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            UPDATE maintenance_tasks SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                estimated_duration = COALESCE($4, estimated_duration),
                priority = COALESCE($5, priority),
                weather_factors = COALESCE($6, weather_factors),
                seasons = COALESCE($7, seasons),
                products = COALESCE($8, products),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(task_id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.description)
        .bind(input.estimated_duration)
        .bind(input.priority.map(|p| p.as_str()))
        .bind(input.weather_factors.map(Json))
        .bind(input.seasons.map(|s| Json(dedup_seasons(s))))
        .bind(input.products.map(Json))
        .fetch_optional(&self.db)
        .await?
        .map(MaintenanceTask::from)
        .ok_or_else(|| AppError::NotFound("Maintenance task".to_string()))
    }

    /// Delete a task definition that no schedule refers to
    pub async fn delete_task(&self, task_id: Uuid) -> AppResult<()> {
        let in_use = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM scheduled_tasks WHERE task_id = $1",
        )
        .bind(task_id)
        .fetch_one(&self.db)
        .await?;

        if in_use > 0 {
            return Err(AppError::InvalidStateTransition(format!(
                "Task is used by {} scheduled task(s)",
                in_use
            )));
        }

        let result = sqlx::query("DELETE FROM maintenance_tasks WHERE id = $1")
            .bind(task_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Maintenance task".to_string()));
        }
        Ok(())
    }

    async fn ensure_unique_name(&self, name: &str, exclude: Option<Uuid>) -> AppResult<()> {
        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM maintenance_tasks WHERE LOWER(name) = LOWER($1) AND ($2::uuid IS NULL OR id != $2)",
        )
        .bind(name.trim())
        .bind(exclude)
        .fetch_one(&self.db)
        .await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("name".to_string()));
        }
        Ok(())
    }
}
