//! Weather data models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of weather, either current conditions or a forecast entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherObservation {
    pub date: NaiveDate,
    pub temperature: f64,
    pub condition: String,
    pub humidity: f64,
    pub wind_speed: f64,
    /// Chance of precipitation, 0-100
    pub precipitation: f64,
    pub icon: String,
}

/// Daily forecast for a lawn location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyForecast {
    pub location_name: String,
    pub days: Vec<WeatherObservation>,
}

impl DailyForecast {
    /// Forecast entry for a calendar date
    pub fn for_date(&self, date: NaiveDate) -> Option<&WeatherObservation> {
        self.days.iter().find(|d| d.date == date)
    }
}
