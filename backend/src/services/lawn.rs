//! Lawn profile service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::models::{GrassType, LawnProfile, SunExposure};
use shared::types::Coordinates;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Lawn profile service
#[derive(Clone)]
pub struct LawnService {
    db: PgPool,
}

/// Lawn profile row
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct LawnRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub size_sq_ft: Decimal,
    pub grass_type: String,
    pub sun_exposure: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LawnRow {
    pub(crate) fn into_profile(self) -> AppResult<LawnProfile> {
        let sun_exposure = self
            .sun_exposure
            .parse::<SunExposure>()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(LawnProfile {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            size_sq_ft: self.size_sq_ft,
            grass_type: GrassType::from_db(&self.grass_type),
            sun_exposure,
            location: self.location,
            coordinates: match (self.latitude, self.longitude) {
                (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
                _ => None,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub(crate) const LAWN_COLUMNS: &str = "id, user_id, name, size_sq_ft, grass_type, sun_exposure, \
     location, latitude, longitude, created_at, updated_at";

/// Input for creating a lawn profile
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLawnInput {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    pub size_sq_ft: Decimal,
    pub grass_type: GrassType,
    pub sun_exposure: SunExposure,
    #[validate(length(min = 1, max = 200, message = "Location must be 1-200 characters"))]
    pub location: String,
    pub coordinates: Option<Coordinates>,
}

/// Input for updating a lawn profile
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLawnInput {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    pub size_sq_ft: Option<Decimal>,
    pub grass_type: Option<GrassType>,
    pub sun_exposure: Option<SunExposure>,
    #[validate(length(min = 1, max = 200, message = "Location must be 1-200 characters"))]
    pub location: Option<String>,
    pub coordinates: Option<Coordinates>,
}

fn check_size_and_coordinates(
    size_sq_ft: Option<Decimal>,
    coordinates: Option<Coordinates>,
) -> AppResult<()> {
    if let Some(size) = size_sq_ft {
        shared::validation::validate_lawn_size(size)
            .map_err(|m| AppError::validation("size_sq_ft", m))?;
    }
    if let Some(c) = coordinates {
        shared::validation::validate_coordinates(c.latitude, c.longitude)
            .map_err(|m| AppError::validation("coordinates", m))?;
    }
    Ok(())
}

/// A cached forecast belongs to the old location once coordinates are set
fn invalidates_forecast(input: &UpdateLawnInput) -> bool {
    input.coordinates.is_some()
}

impl LawnService {
    /// Create a new LawnService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All lawns belonging to a user
    pub async fn list_lawns(&self, user_id: Uuid) -> AppResult<Vec<LawnProfile>> {
        let rows = sqlx::query_as::<_, LawnRow>(&format!(
            "SELECT {} FROM lawn_profiles WHERE user_id = $1 ORDER BY name ASC",
            LAWN_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(LawnRow::into_profile).collect()
    }

    /// A lawn owned by the user; other users' lawns are reported as missing
    pub async fn get_lawn(&self, user_id: Uuid, lawn_id: Uuid) -> AppResult<LawnProfile> {
        sqlx::query_as::<_, LawnRow>(&format!(
            "SELECT {} FROM lawn_profiles WHERE id = $1 AND user_id = $2",
            LAWN_COLUMNS
        ))
        .bind(lawn_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Lawn profile".to_string()))?
        .into_profile()
    }

    /// Create a new lawn profile
    pub async fn create_lawn(&self, user_id: Uuid, input: CreateLawnInput) -> AppResult<LawnProfile> {
        input.validate()?;
        check_size_and_coordinates(Some(input.size_sq_ft), input.coordinates)?;

        let lawn = sqlx::query_as::<_, LawnRow>(&format!(
            r#"
            INSERT INTO lawn_profiles (user_id, name, size_sq_ft, grass_type, sun_exposure,
                                       location, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            LAWN_COLUMNS
        ))
        .bind(user_id)
        .bind(input.name.trim())
        .bind(input.size_sq_ft)
        .bind(input.grass_type.to_db())
        .bind(input.sun_exposure.as_str())
        .bind(input.location.trim())
        .bind(input.coordinates.map(|c| c.latitude))
        .bind(input.coordinates.map(|c| c.longitude))
        .fetch_one(&self.db)
        .await?
        .into_profile()?;

        tracing::info!(lawn_id = %lawn.id, user_id = %user_id, "Lawn profile created");
        Ok(lawn)
    }

    /// Update a lawn profile; absent fields keep their value
    pub async fn update_lawn(
        &self,
        user_id: Uuid,
        lawn_id: Uuid,
        input: UpdateLawnInput,
    ) -> AppResult<LawnProfile> {
        input.validate()?;
        check_size_and_coordinates(input.size_sq_ft, input.coordinates)?;

        let mut tx = self.db.begin().await?;

        let lawn = sqlx::query_as::<_, LawnRow>(&format!(
            r#"
            UPDATE lawn_profiles SET
                name = COALESCE($3, name),
                size_sq_ft = COALESCE($4, size_sq_ft),
                grass_type = COALESCE($5, grass_type),
                sun_exposure = COALESCE($6, sun_exposure),
                location = COALESCE($7, location),
                latitude = COALESCE($8, latitude),
                longitude = COALESCE($9, longitude),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            LAWN_COLUMNS
        ))
        .bind(lawn_id)
        .bind(user_id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.size_sq_ft)
        .bind(input.grass_type.as_ref().map(GrassType::to_db))
        .bind(input.sun_exposure.map(|s| s.as_str()))
        .bind(input.location.as_deref().map(str::trim))
        .bind(input.coordinates.map(|c| c.latitude))
        .bind(input.coordinates.map(|c| c.longitude))
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Lawn profile".to_string()))?
        .into_profile()?;

        if invalidates_forecast(&input) {
            sqlx::query("DELETE FROM weather_forecasts WHERE lawn_profile_id = $1")
                .bind(lawn.id)
                .execute(&mut *tx)
                .await?;
            tracing::debug!(lawn_id = %lawn.id, "Cached forecast dropped after location change");
        }

        tx.commit().await?;
        Ok(lawn)
    }

    /// Delete a lawn profile together with its schedule and cached weather
    pub async fn delete_lawn(&self, user_id: Uuid, lawn_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM lawn_profiles WHERE id = $1 AND user_id = $2")
            .bind(lawn_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Lawn profile".to_string()));
        }

        tracing::info!(lawn_id = %lawn_id, "Lawn profile deleted");
        Ok(())
    }
}
