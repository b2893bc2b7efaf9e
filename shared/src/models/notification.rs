//! Notification payloads
//!
//! Each notification kind carries its own payload type; the dispatcher
//! matches on [`NotificationPayload`] instead of inspecting loose JSON.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Priority, Season, WeatherObservation};
use crate::types::ParseEnumError;

/// Notification kinds, used for preferences and delivery logs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TaskReminder,
    WeatherAlert,
    WeeklySummary,
    CareRecommendations,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 4] = [
        NotificationKind::TaskReminder,
        NotificationKind::WeatherAlert,
        NotificationKind::WeeklySummary,
        NotificationKind::CareRecommendations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::TaskReminder => "task_reminder",
            NotificationKind::WeatherAlert => "weather_alert",
            NotificationKind::WeeklySummary => "weekly_summary",
            NotificationKind::CareRecommendations => "care_recommendations",
        }
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("notification kind", s))
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A notification ready to be rendered and sent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum NotificationPayload {
    TaskReminder(TaskReminder),
    WeatherAlert(WeatherAlert),
    WeeklySummary(WeeklySummary),
    CareRecommendations(CareRecommendations),
}

impl NotificationPayload {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationPayload::TaskReminder(_) => NotificationKind::TaskReminder,
            NotificationPayload::WeatherAlert(_) => NotificationKind::WeatherAlert,
            NotificationPayload::WeeklySummary(_) => NotificationKind::WeeklySummary,
            NotificationPayload::CareRecommendations(_) => NotificationKind::CareRecommendations,
        }
    }
}

/// Reminder for a task due soon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReminder {
    pub user_name: String,
    pub lawn_name: String,
    pub task_name: String,
    pub task_description: String,
    pub scheduled_date: NaiveDate,
    pub estimated_duration: i32,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub weather: Option<WeatherObservation>,
}

/// Weather forced one or more tasks to move
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub user_name: String,
    pub lawn_name: String,
    pub headline: String,
    pub affected_tasks: Vec<AffectedTask>,
    #[serde(default)]
    pub weather: Option<WeatherObservation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AffectedTask {
    pub task_name: String,
    pub original_date: NaiveDate,
    /// `None` when nothing in the forecast window suits the task
    pub new_date: Option<NaiveDate>,
    pub reason: String,
}

/// Look back at the past week and ahead at the next one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub user_name: String,
    pub lawn_name: String,
    pub week_start: NaiveDate,
    pub completed_tasks: Vec<SummaryTask>,
    pub skipped_tasks: Vec<SummaryTask>,
    pub upcoming_tasks: Vec<SummaryTask>,
    #[serde(default)]
    pub forecast: Vec<WeatherObservation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryTask {
    pub task_name: String,
    pub date: NaiveDate,
}

/// Seasonal care advice for a lawn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareRecommendations {
    pub user_name: String,
    pub lawn_name: String,
    pub grass_type: String,
    pub season: Season,
    pub recommendations: Vec<CareItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CareItem {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    /// Why the item cannot be done right now, if anything
    #[serde(default)]
    pub weather_note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_tagging() {
        let json = r#"{
            "type": "task_reminder",
            "data": {
                "user_name": "Sam",
                "lawn_name": "Front yard",
                "task_name": "Mow",
                "task_description": "Cut to 3 inches",
                "scheduled_date": "2024-05-04",
                "estimated_duration": 45
            }
        }"#;
        let payload: NotificationPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.kind(), NotificationKind::TaskReminder);
        match payload {
            NotificationPayload::TaskReminder(r) => {
                assert!(r.products.is_empty());
                assert!(r.weather.is_none());
            }
            other => panic!("unexpected payload: {:?}", other.kind()),
        }
    }

    #[test]
    fn test_unknown_payload_type_rejected() {
        let json = r#"{"type": "marketing", "data": {}}"#;
        assert!(serde_json::from_str::<NotificationPayload>(json).is_err());
    }

    #[test]
    fn test_kind_parse() {
        for kind in NotificationKind::ALL {
            assert_eq!(kind.as_str().parse::<NotificationKind>().unwrap(), kind);
        }
        assert!("newsletter".parse::<NotificationKind>().is_err());
    }
}
