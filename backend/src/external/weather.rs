//! Weather API client for fetching weather data
//!
//! Integrates with OpenWeatherMap for current conditions and the 5 day /
//! 3 hour forecast, and reduces both to the daily [`WeatherObservation`]s the
//! task eligibility rules work with.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};
use reqwest::Client;
use serde::Deserialize;
use shared::models::{DailyForecast, WeatherObservation};
use shared::types::Coordinates;

use crate::config::WeatherConfig;
use crate::error::{AppError, AppResult};

/// Weather API client
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
    units: String,
}

/// OpenWeatherMap API response for current weather
#[derive(Debug, Deserialize)]
struct OWMCurrentResponse {
    weather: Vec<OWMWeather>,
    main: OWMMain,
    wind: OWMWind,
    rain: Option<serde_json::Value>,
    dt: i64,
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OWMWeather {
    main: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OWMMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OWMWind {
    speed: f64,
}

/// OpenWeatherMap API response for forecast
#[derive(Debug, Deserialize)]
struct OWMForecastResponse {
    city: OWMCity,
    list: Vec<OWMForecastItem>,
}

#[derive(Debug, Deserialize)]
struct OWMCity {
    name: String,
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OWMForecastItem {
    dt: i64,
    main: OWMMain,
    weather: Vec<OWMWeather>,
    wind: OWMWind,
    /// Probability of precipitation, 0-1
    #[serde(default)]
    pop: f64,
}

impl WeatherClient {
    /// Create a new WeatherClient
    pub fn new(config: &WeatherConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.api_endpoint.trim_end_matches('/').to_string(),
            units: config.units.clone(),
        }
    }

    /// Fetch current weather conditions by GPS coordinates
    pub async fn get_current_weather(&self, coords: Coordinates) -> AppResult<WeatherObservation> {
        let data: OWMCurrentResponse = self.fetch("weather", coords).await?;
        convert_current_response(data)
    }

    /// Fetch the daily forecast by GPS coordinates
    pub async fn get_forecast(&self, coords: Coordinates) -> AppResult<DailyForecast> {
        let data: OWMForecastResponse = self.fetch("forecast", coords).await?;
        convert_forecast_response(data)
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        coords: Coordinates,
    ) -> AppResult<T> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", self.units.clone()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Weather API request failed: {}", e);
                AppError::WeatherServiceUnavailable
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Weather API error: {} - {}", status, body);
            return Err(AppError::WeatherServiceUnavailable);
        }

        response.json::<T>().await.map_err(|e| {
            tracing::warn!("Failed to parse weather response: {}", e);
            AppError::WeatherServiceUnavailable
        })
    }
}

fn local_time(dt: i64, timezone: i32) -> AppResult<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(timezone).ok_or(AppError::WeatherServiceUnavailable)?;
    DateTime::<Utc>::from_timestamp(dt, 0)
        .map(|t| t.with_timezone(&offset))
        .ok_or(AppError::WeatherServiceUnavailable)
}

fn is_raining(condition: &str) -> bool {
    matches!(condition, "Rain" | "Drizzle" | "Thunderstorm")
}

/// Convert OpenWeatherMap current response to a single observation
fn convert_current_response(data: OWMCurrentResponse) -> AppResult<WeatherObservation> {
    let weather = data.weather.first();
    let condition = weather.map(|w| w.main.clone()).unwrap_or_default();
    let raining = data.rain.is_some() || is_raining(&condition);

    Ok(WeatherObservation {
        date: local_time(data.dt, data.timezone)?.date_naive(),
        temperature: data.main.temp,
        humidity: data.main.humidity,
        wind_speed: data.wind.speed,
        precipitation: if raining { 100.0 } else { 0.0 },
        icon: weather.map(|w| w.icon.clone()).unwrap_or_default(),
        condition,
    })
}

/// Group 3-hour forecast entries into one observation per local calendar day
fn convert_forecast_response(data: OWMForecastResponse) -> AppResult<DailyForecast> {
    let mut by_day: BTreeMap<NaiveDate, Vec<(u32, OWMForecastItem)>> = BTreeMap::new();
    for item in data.list {
        let at = local_time(item.dt, data.city.timezone)?;
        by_day
            .entry(at.date_naive())
            .or_default()
            .push((at.num_seconds_from_midnight(), item));
    }

    let days = by_day
        .into_iter()
        .filter_map(|(date, entries)| aggregate_day(date, &entries))
        .collect();

    Ok(DailyForecast {
        location_name: data.city.name,
        days,
    })
}

fn aggregate_day(date: NaiveDate, entries: &[(u32, OWMForecastItem)]) -> Option<WeatherObservation> {
    const MIDDAY: i64 = 12 * 3600;

    let count = entries.len() as f64;
    let (_, representative) = entries
        .iter()
        .min_by_key(|(secs, _)| (i64::from(*secs) - MIDDAY).abs())?;
    let weather = representative.weather.first();

    Some(WeatherObservation {
        date,
        temperature: entries.iter().map(|(_, i)| i.main.temp).sum::<f64>() / count,
        humidity: entries.iter().map(|(_, i)| i.main.humidity).sum::<f64>() / count,
        wind_speed: entries.iter().map(|(_, i)| i.wind.speed).fold(0.0, f64::max),
        precipitation: entries.iter().map(|(_, i)| i.pop * 100.0).fold(0.0, f64::max),
        condition: weather.map(|w| w.main.clone()).unwrap_or_default(),
        icon: weather.map(|w| w.icon.clone()).unwrap_or_default(),
    })
}
