//! Weather service: current conditions and cached daily forecasts per lawn

use chrono::{DateTime, Duration, Utc};
use shared::models::{DailyForecast, LawnProfile, WeatherObservation};
use shared::types::Coordinates;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::WeatherClient;

/// Weather service for lawn locations
#[derive(Clone)]
pub struct WeatherService {
    db: PgPool,
    weather_client: WeatherClient,
    cache_ttl: Duration,
}

#[derive(Debug, sqlx::FromRow)]
struct CachedForecastRow {
    forecast: Json<DailyForecast>,
    fetched_at: DateTime<Utc>,
}

/// Whether a forecast fetched at `fetched_at` may still be served at `now`
pub(crate) fn is_fresh(fetched_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now - fetched_at < ttl
}

fn coordinates(lawn: &LawnProfile) -> AppResult<Coordinates> {
    lawn.coordinates.ok_or_else(|| {
        AppError::validation(
            "coordinates",
            "Lawn profile has no coordinates; add them to get weather",
        )
    })
}

impl WeatherService {
    /// Create a new WeatherService instance
    pub fn new(db: PgPool, weather_client: WeatherClient, cache_ttl_minutes: i64) -> Self {
        Self {
            db,
            weather_client,
            cache_ttl: Duration::minutes(cache_ttl_minutes),
        }
    }

    /// Current conditions at the lawn
    pub async fn current_for_lawn(&self, lawn: &LawnProfile) -> AppResult<WeatherObservation> {
        let coords = coordinates(lawn)?;
        self.weather_client.get_current_weather(coords).await
    }

    /// Daily forecast for the lawn, served from cache while fresh
    pub async fn forecast_for_lawn(&self, lawn: &LawnProfile) -> AppResult<DailyForecast> {
        let coords = coordinates(lawn)?;

        if let Some(cached) = self.get_cached_forecast(lawn.id).await? {
            if is_fresh(cached.fetched_at, Utc::now(), self.cache_ttl) {
                return Ok(cached.forecast.0);
            }
        }

        let forecast = self.weather_client.get_forecast(coords).await?;

        // A failed cache write only costs a refetch next time
        if let Err(e) = self.cache_forecast(lawn.id, &forecast).await {
            tracing::warn!(lawn_id = %lawn.id, "Failed to cache forecast: {}", e);
        }

        Ok(forecast)
    }

    async fn get_cached_forecast(&self, lawn_id: Uuid) -> AppResult<Option<CachedForecastRow>> {
        let cached = sqlx::query_as::<_, CachedForecastRow>(
            "SELECT forecast, fetched_at FROM weather_forecasts WHERE lawn_profile_id = $1",
        )
        .bind(lawn_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(cached)
    }

    async fn cache_forecast(&self, lawn_id: Uuid, forecast: &DailyForecast) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO weather_forecasts (lawn_profile_id, forecast, fetched_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (lawn_profile_id)
            DO UPDATE SET forecast = EXCLUDED.forecast, fetched_at = EXCLUDED.fetched_at
            "#,
        )
        .bind(lawn_id)
        .bind(Json(forecast))
        .execute(&self.db)
        .await?;

        Ok(())
    }
}
