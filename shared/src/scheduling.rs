//! Task eligibility rules
//!
//! Decides whether a maintenance task can go ahead given the weather and the
//! time of year, and finds the next suitable day in a short forecast. All
//! functions here are pure: the backend persists whatever they recommend.

use chrono::{Datelike, Days, Local, Month, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{MaintenanceTask, Priority, ScheduledTask, Season, WeatherObservation};

/// Number of days ahead covered by the weather forecast
pub const FORECAST_HORIZON_DAYS: u64 = 5;

/// Outcome of checking a task against one day's weather
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherCheck {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl WeatherCheck {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Check a task's weather constraints against an observation.
///
/// Constraints are checked in a fixed order (temperature, precipitation,
/// wind) and the first violation wins. Precipitation intensity is carried in
/// the task definition but is not compared.
pub fn check_weather_conditions(task: &MaintenanceTask, weather: &WeatherObservation) -> WeatherCheck {
    let Some(factors) = &task.weather_factors else {
        return WeatherCheck::valid();
    };

    if let Some(range) = factors.temperature {
        if weather.temperature < range.min {
            return WeatherCheck::invalid(format!(
                "Temperature too low: {}° (minimum {}°)",
                weather.temperature, range.min
            ));
        }
        if weather.temperature > range.max {
            return WeatherCheck::invalid(format!(
                "Temperature too high: {}° (maximum {}°)",
                weather.temperature, range.max
            ));
        }
    }

    if let Some(limit) = factors.precipitation {
        if weather.precipitation > limit.chance {
            return WeatherCheck::invalid(format!(
                "Precipitation chance too high: {}% (maximum {}%)",
                weather.precipitation, limit.chance
            ));
        }
    }

    if let Some(limit) = factors.wind {
        if weather.wind_speed > limit.speed {
            return WeatherCheck::invalid(format!(
                "Wind speed too high: {} (maximum {})",
                weather.wind_speed, limit.speed
            ));
        }
    }

    WeatherCheck::valid()
}

/// Whether the task is in season on the local machine's current date
pub fn is_task_in_season(task: &MaintenanceTask) -> bool {
    is_task_in_season_on(task, Local::now().date_naive())
}

/// Whether the task is in season on the given date
pub fn is_task_in_season_on(task: &MaintenanceTask, date: NaiveDate) -> bool {
    let Ok(month) = Month::try_from(date.month() as u8) else {
        return false;
    };
    task.seasons.iter().any(|season| season.contains(month))
}

/// Season of the given date
pub fn season_on(date: NaiveDate) -> Season {
    Month::try_from(date.month() as u8)
        .map(Season::for_month)
        .unwrap_or(Season::Winter)
}

/// Whether a scheduled task should move, judged on the local current date
pub fn should_reschedule_task(
    task: &MaintenanceTask,
    scheduled_task: &ScheduledTask,
    weather: &WeatherObservation,
) -> bool {
    should_reschedule_task_on(task, scheduled_task, weather, Local::now().date_naive())
}

/// Whether a scheduled task should move, judged on `today`.
///
/// Completed and rescheduled tasks never move. Out-of-season tasks always
/// move. Otherwise the task moves iff the weather check fails.
pub fn should_reschedule_task_on(
    task: &MaintenanceTask,
    scheduled_task: &ScheduledTask,
    weather: &WeatherObservation,
    today: NaiveDate,
) -> bool {
    if scheduled_task.status.is_terminal() {
        return false;
    }
    if !is_task_in_season_on(task, today) {
        return true;
    }
    !check_weather_conditions(task, weather).is_valid
}

/// First day after `current_date`, within the forecast horizon, whose
/// forecast suits the task and which falls in one of the task's seasons.
///
/// Days without a forecast entry are skipped.
pub fn get_next_available_date(
    task: &MaintenanceTask,
    current_date: NaiveDate,
    forecast: &[WeatherObservation],
) -> Option<NaiveDate> {
    (1..=FORECAST_HORIZON_DAYS)
        .filter_map(|offset| current_date.checked_add_days(Days::new(offset)))
        .find(|candidate| {
            forecast
                .iter()
                .find(|day| day.date == *candidate)
                .map(|day| {
                    check_weather_conditions(task, day).is_valid
                        && is_task_in_season_on(task, *candidate)
                })
                .unwrap_or(false)
        })
}

/// Numeric weight of a priority; unknown priorities sort last
pub fn priority_score(task: &MaintenanceTask) -> u8 {
    match task.priority {
        Priority::High => 3,
        Priority::Medium => 2,
        Priority::Low => 1,
        Priority::Unknown => 0,
    }
}

/// Tasks ordered from highest to lowest priority. The sort is stable and the
/// input is left untouched.
pub fn sort_tasks_by_priority(tasks: &[MaintenanceTask]) -> Vec<MaintenanceTask> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by_key(|task| std::cmp::Reverse(priority_score(task)));
    sorted
}
