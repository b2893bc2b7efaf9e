//! WebAssembly module for LawnSync
//!
//! Provides client-side computation for:
//! - Weather eligibility previews while editing a schedule
//! - Season checks against the browser's local clock
//! - Priority ordering of task lists
//! - Task definition validation

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::scheduling::*;
pub use shared::validation::*;

fn parse<T: DeserializeOwned>(what: &str, json: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| {
        let message = format!("Invalid {} JSON: {}", what, e);
        web_sys::console::warn_1(&JsValue::from_str(&message));
        JsValue::from_str(&message)
    })
}

fn parse_date(value: &str) -> Result<NaiveDate, JsValue> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| JsValue::from_str(&format!("Invalid date '{}': {}", value, e)))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Today's date according to the browser
fn browser_today() -> Option<NaiveDate> {
    let now = js_sys::Date::new_0();
    NaiveDate::from_ymd_opt(
        now.get_full_year() as i32,
        now.get_month() + 1,
        now.get_date(),
    )
}

/// Check a task against one day's weather; returns `{"is_valid", "reason"?}`
#[wasm_bindgen]
pub fn check_weather(task_json: &str, weather_json: &str) -> Result<String, JsValue> {
    let task: MaintenanceTask = parse("task", task_json)?;
    let weather: WeatherObservation = parse("weather", weather_json)?;
    to_json(&check_weather_conditions(&task, &weather))
}

/// Whether the task is in season on the browser's current date
#[wasm_bindgen]
pub fn is_in_season_now(task_json: &str) -> Result<bool, JsValue> {
    let task: MaintenanceTask = parse("task", task_json)?;
    let today = browser_today().ok_or_else(|| JsValue::from_str("Browser clock unavailable"))?;
    Ok(is_task_in_season_on(&task, today))
}

/// Whether the task is in season on a `YYYY-MM-DD` date
#[wasm_bindgen]
pub fn is_in_season_on(task_json: &str, date: &str) -> Result<bool, JsValue> {
    let task: MaintenanceTask = parse("task", task_json)?;
    Ok(is_task_in_season_on(&task, parse_date(date)?))
}

/// Next suitable date after `current_date` as `YYYY-MM-DD`, or `undefined`
#[wasm_bindgen]
pub fn next_available_date(
    task_json: &str,
    current_date: &str,
    forecast_json: &str,
) -> Result<Option<String>, JsValue> {
    let task: MaintenanceTask = parse("task", task_json)?;
    let forecast: Vec<WeatherObservation> = parse("forecast", forecast_json)?;
    let current = parse_date(current_date)?;
    Ok(get_next_available_date(&task, current, &forecast).map(|d| d.to_string()))
}

/// Sort a JSON array of tasks by priority, highest first
#[wasm_bindgen]
pub fn sort_by_priority(tasks_json: &str) -> Result<String, JsValue> {
    let tasks: Vec<MaintenanceTask> = parse("tasks", tasks_json)?;
    to_json(&sort_tasks_by_priority(&tasks))
}

/// Validate weather thresholds; returns an error message or `undefined`
#[wasm_bindgen]
pub fn validate_weather_factors_json(factors_json: &str) -> Result<Option<String>, JsValue> {
    let factors: WeatherFactors = parse("weather factors", factors_json)?;
    Ok(validate_weather_factors(&factors).err().map(str::to_string))
}
