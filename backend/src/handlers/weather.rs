//! HTTP handlers for weather at a lawn

use axum::{
    extract::{Path, State},
    Json,
};
use crate::models::{DailyForecast, WeatherObservation};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::LawnService;
use crate::AppState;

/// Current conditions at a lawn
pub async fn get_current_weather(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(lawn_id): Path<Uuid>,
) -> AppResult<Json<WeatherObservation>> {
    let lawn = LawnService::new(state.db.clone())
        .get_lawn(current_user.0.user_id, lawn_id)
        .await?;
    let weather = state.weather_service().current_for_lawn(&lawn).await?;
    Ok(Json(weather))
}

/// Daily forecast at a lawn
pub async fn get_forecast(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(lawn_id): Path<Uuid>,
) -> AppResult<Json<DailyForecast>> {
    let lawn = LawnService::new(state.db.clone())
        .get_lawn(current_user.0.user_id, lawn_id)
        .await?;
    let forecast = state.weather_service().forecast_for_lawn(&lawn).await?;
    Ok(Json(forecast))
}
