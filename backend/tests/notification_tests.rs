//! Notification email tests
//!
//! Rendering of every notification kind:
//! - subjects and bodies carry the details the reader needs
//! - user-supplied text cannot inject markup
//! - every email offers an unsubscribe link
//! - the JSON payload format accepted by the send endpoint

use chrono::NaiveDate;
use proptest::prelude::*;
use shared::email::{escape_html, render, EmailContext};
use shared::models::{
    AffectedTask, CareItem, CareRecommendations, NotificationKind, NotificationPayload, Priority,
    Season, SummaryTask, TaskReminder, WeatherAlert, WeatherObservation, WeeklySummary,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ctx() -> EmailContext {
    EmailContext {
        app_url: "https://lawnsync.test".to_string(),
        unsubscribe_url: "https://lawnsync.test/api/v1/notifications/unsubscribe?token=abc.def"
            .to_string(),
    }
}

fn sunny(on: NaiveDate) -> WeatherObservation {
    WeatherObservation {
        date: on,
        temperature: 71.6,
        condition: "Clear".to_string(),
        humidity: 40.0,
        wind_speed: 6.2,
        precipitation: 10.0,
        icon: "01d".to_string(),
    }
}

fn reminder() -> TaskReminder {
    TaskReminder {
        user_name: "Alex".to_string(),
        lawn_name: "Front yard".to_string(),
        task_name: "Fertilize".to_string(),
        task_description: "Apply slow-release nitrogen".to_string(),
        scheduled_date: date(2024, 4, 15),
        estimated_duration: 40,
        products: vec!["24-0-6 granular".to_string()],
        weather: Some(sunny(date(2024, 4, 15))),
    }
}

#[test]
fn test_task_reminder_email() {
    let email = render(&NotificationPayload::TaskReminder(reminder()), &ctx());
    assert_eq!(email.subject, "Reminder: Fertilize on Monday, April 15");
    assert!(email.text.contains("Estimated time: 40 minutes"));
    assert!(email.text.contains("24-0-6 granular"));
    assert!(email.text.contains("Clear"));
    assert!(email.html.starts_with("<!DOCTYPE html>"));
}

#[test]
fn test_weather_alert_lists_moved_and_held_tasks() {
    let alert = WeatherAlert {
        user_name: "Alex".to_string(),
        lawn_name: "Back lawn".to_string(),
        headline: "1 rescheduled, 1 waiting for better weather".to_string(),
        affected_tasks: vec![
            AffectedTask {
                task_name: "Mow".to_string(),
                original_date: date(2024, 6, 3),
                new_date: Some(date(2024, 6, 5)),
                reason: "Precipitation chance too high: 80% (maximum 30%)".to_string(),
            },
            AffectedTask {
                task_name: "Overseed".to_string(),
                original_date: date(2024, 6, 3),
                new_date: None,
                reason: "Temperature too high: 95° (maximum 80°)".to_string(),
            },
        ],
        weather: None,
    };
    let email = render(&NotificationPayload::WeatherAlert(alert), &ctx());
    assert_eq!(
        email.subject,
        "Weather alert for Back lawn: 1 rescheduled, 1 waiting for better weather"
    );
    assert!(email.text.contains("Mow"));
    assert!(email.text.contains("Overseed"));
    assert!(email.text.contains("Precipitation chance too high"));
}

#[test]
fn test_weekly_summary_subject_counts() {
    let summary = WeeklySummary {
        user_name: "Alex".to_string(),
        lawn_name: "Front yard".to_string(),
        week_start: date(2024, 6, 3),
        completed_tasks: vec![SummaryTask {
            task_name: "Mow".to_string(),
            date: date(2024, 6, 4),
        }],
        skipped_tasks: vec![],
        upcoming_tasks: vec![
            SummaryTask {
                task_name: "Mow".to_string(),
                date: date(2024, 6, 11),
            },
            SummaryTask {
                task_name: "Deep watering".to_string(),
                date: date(2024, 6, 12),
            },
        ],
        forecast: vec![sunny(date(2024, 6, 11))],
    };
    let email = render(&NotificationPayload::WeeklySummary(summary), &ctx());
    assert_eq!(email.subject, "Your week on Front yard: 1 done, 2 coming up");
    assert!(email.text.contains("Deep watering"));
    assert!(!email.text.contains("Skipped"));
}

#[test]
fn test_care_recommendations_email() {
    let care = CareRecommendations {
        user_name: "Alex".to_string(),
        lawn_name: "Front yard".to_string(),
        grass_type: "Tall Fescue".to_string(),
        season: Season::Fall,
        recommendations: vec![CareItem {
            title: "Core aeration".to_string(),
            description: "Pull plugs across the whole lawn".to_string(),
            priority: Priority::High,
            weather_note: Some("Wind speed too high: 30 (maximum 25)".to_string()),
        }],
    };
    let email = render(&NotificationPayload::CareRecommendations(care), &ctx());
    assert_eq!(email.subject, "Fall care tips for Front yard");
    assert!(email.text.contains("Core aeration"));
    assert!(email.text.contains("Wind speed too high"));
}

#[test]
fn test_task_names_are_escaped() {
    let mut r = reminder();
    r.task_name = "<script>alert('x')</script>".to_string();
    let email = render(&NotificationPayload::TaskReminder(r), &ctx());
    assert!(!email.html.contains("<script>"));
    assert!(email.html.contains("&lt;script&gt;"));
    // Plain text is not escaped
    assert!(email.text.contains("<script>"));
}

#[test]
fn test_every_email_has_unsubscribe_link() {
    let ctx = ctx();
    let email = render(&NotificationPayload::TaskReminder(reminder()), &ctx);
    assert!(email.text.ends_with(&format!("Unsubscribe: {}", ctx.unsubscribe_url)));
    assert!(email.html.contains(&escape_html(&ctx.unsubscribe_url)));
}

#[test]
fn test_payload_kind_and_wire_format() {
    let payload = NotificationPayload::TaskReminder(reminder());
    assert_eq!(payload.kind(), NotificationKind::TaskReminder);

    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["type"], "task_reminder");
    assert_eq!(json["data"]["task_name"], "Fertilize");

    for kind in NotificationKind::ALL {
        assert_eq!(kind.as_str().parse::<NotificationKind>().unwrap(), kind);
    }
    assert!("sms".parse::<NotificationKind>().is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Escaped text never contains raw markup characters
    #[test]
    fn prop_escape_removes_markup(input in ".{0,64}") {
        let escaped = escape_html(&input);
        prop_assert!(!escaped.contains('<'));
        prop_assert!(!escaped.contains('>'));
        prop_assert!(!escaped.contains('"'));
        prop_assert!(!escaped.contains('\''));
    }

    /// Task names reach the HTML only in escaped form
    #[test]
    fn prop_rendered_html_carries_escaped_name(name in "[a-z<>&\"' ]{1,30}") {
        let mut r = reminder();
        r.task_name = name.clone();
        let email = render(&NotificationPayload::TaskReminder(r), &ctx());
        prop_assert!(email.html.contains(&escape_html(&name)));
        prop_assert!(email.subject.contains(&name));
    }
}
