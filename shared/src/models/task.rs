//! Maintenance task and scheduled task models

use chrono::{DateTime, Month, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::ParseEnumError;

/// A reusable lawn-care action with weather and season eligibility rules
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaintenanceTask {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Estimated duration in minutes
    pub estimated_duration: i32,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_factors: Option<WeatherFactors>,
    pub seasons: Vec<Season>,
    #[serde(default)]
    pub products: Vec<String>,
}

/// Task priority
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
    /// Any stored value this build does not recognise
    #[serde(other)]
    Unknown,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::Unknown => "unknown",
        }
    }

    /// Lenient parse used when reading stored rows
    pub fn from_db(s: &str) -> Self {
        s.parse().unwrap_or(Priority::Unknown)
    }
}

impl std::str::FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(ParseEnumError::new("priority", other)),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Calendar season buckets (northern hemisphere, fixed months)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    /// Months belonging to this season
    pub fn months(&self) -> [Month; 3] {
        match self {
            Season::Winter => [Month::December, Month::January, Month::February],
            Season::Spring => [Month::March, Month::April, Month::May],
            Season::Summer => [Month::June, Month::July, Month::August],
            Season::Fall => [Month::September, Month::October, Month::November],
        }
    }

    pub fn contains(&self, month: Month) -> bool {
        self.months().contains(&month)
    }

    /// The season a month falls into
    pub fn for_month(month: Month) -> Season {
        Season::ALL
            .into_iter()
            .find(|season| season.contains(month))
            .unwrap_or(Season::Winter)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
            Season::Winter => "winter",
        }
    }
}

impl std::str::FromStr for Season {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "fall" => Ok(Season::Fall),
            "winter" => Ok(Season::Winter),
            other => Err(ParseEnumError::new("season", other)),
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Optional per-task weather thresholds
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WeatherFactors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<TemperatureRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<PrecipitationLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind: Option<WindLimit>,
}

impl WeatherFactors {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.precipitation.is_none() && self.wind.is_none()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PrecipitationLimit {
    /// Highest acceptable precipitation chance (percent)
    pub chance: f64,
    /// Stored for reference; not compared against observations
    pub intensity: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WindLimit {
    pub speed: f64,
}

/// A dated instance of a maintenance task bound to a lawn profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledTask {
    pub id: Uuid,
    pub lawn_profile_id: Uuid,
    pub task_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub status: TaskStatus,
    pub weather_adjusted: bool,
    pub notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Scheduled task lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
    Skipped,
    Rescheduled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Skipped => "skipped",
            TaskStatus::Rescheduled => "rescheduled",
        }
    }

    /// Completed and rescheduled tasks are never evaluated again
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Rescheduled)
    }

    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Completed)
                | (TaskStatus::Pending, TaskStatus::Skipped)
                | (TaskStatus::Pending, TaskStatus::Rescheduled)
                | (TaskStatus::Skipped, TaskStatus::Pending)
        )
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            "skipped" => Ok(TaskStatus::Skipped),
            "rescheduled" => Ok(TaskStatus::Rescheduled),
            other => Err(ParseEnumError::new("status", other)),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_priority_deserializes() {
        let p: Priority = serde_json::from_str("\"urgent\"").unwrap();
        assert_eq!(p, Priority::Unknown);
        assert_eq!(Priority::from_db("whatever"), Priority::Unknown);
        assert_eq!(Priority::from_db("high"), Priority::High);
    }

    #[test]
    fn test_weather_factors_json_shape() {
        let json = r#"{"temperature":{"min":10,"max":30},"wind":{"speed":15}}"#;
        let factors: WeatherFactors = serde_json::from_str(json).unwrap();
        assert_eq!(factors.temperature, Some(TemperatureRange { min: 10.0, max: 30.0 }));
        assert!(factors.precipitation.is_none());
        assert_eq!(factors.wind.map(|w| w.speed), Some(15.0));

        let empty: WeatherFactors = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_season_for_month() {
        assert_eq!(Season::for_month(Month::December), Season::Winter);
        assert_eq!(Season::for_month(Month::February), Season::Winter);
        assert_eq!(Season::for_month(Month::March), Season::Spring);
        assert_eq!(Season::for_month(Month::August), Season::Summer);
        assert_eq!(Season::for_month(Month::November), Season::Fall);
    }

    #[test]
    fn test_status_transitions() {
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Completed));
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Skipped));
        assert!(TaskStatus::Skipped.can_transition_to(TaskStatus::Pending));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Pending));
        assert!(!TaskStatus::Rescheduled.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::Pending));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Rescheduled.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Skipped.is_terminal());
    }
}
