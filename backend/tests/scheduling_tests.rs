//! Task eligibility tests
//!
//! Scenario and property tests for the rules that decide when lawn work
//! can happen:
//! - weather thresholds and the order they are reported in
//! - season windows, including candidate dates that cross a season boundary
//! - the reschedule decision for each lifecycle status
//! - priority ordering

use chrono::{Days, NaiveDate, Utc};
use proptest::prelude::*;
use shared::models::{
    MaintenanceTask, PrecipitationLimit, Priority, ScheduledTask, Season, TaskStatus,
    TemperatureRange, WeatherFactors, WeatherObservation, WindLimit,
};
use shared::scheduling::{
    check_weather_conditions, get_next_available_date, is_task_in_season_on, season_on,
    should_reschedule_task_on, sort_tasks_by_priority, FORECAST_HORIZON_DAYS,
};
use uuid::Uuid;

// ============================================================================
// Fixtures
// ============================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn mowing() -> MaintenanceTask {
    MaintenanceTask {
        id: Uuid::new_v4(),
        name: "Mow".to_string(),
        description: "Cut to 3 inches".to_string(),
        estimated_duration: 45,
        priority: Priority::High,
        weather_factors: Some(WeatherFactors {
            temperature: Some(TemperatureRange { min: 50.0, max: 90.0 }),
            precipitation: Some(PrecipitationLimit {
                chance: 30.0,
                intensity: 0.1,
            }),
            wind: Some(WindLimit { speed: 20.0 }),
        }),
        seasons: vec![Season::Spring, Season::Summer, Season::Fall],
        products: vec![],
    }
}

fn spring_only(name: &str, priority: Priority) -> MaintenanceTask {
    MaintenanceTask {
        name: name.to_string(),
        priority,
        weather_factors: None,
        seasons: vec![Season::Spring],
        ..mowing()
    }
}

fn day(date: NaiveDate, temperature: f64, precipitation: f64, wind_speed: f64) -> WeatherObservation {
    WeatherObservation {
        date,
        temperature,
        condition: "Clouds".to_string(),
        humidity: 55.0,
        wind_speed,
        precipitation,
        icon: "03d".to_string(),
    }
}

fn scheduled(task: &MaintenanceTask, on: NaiveDate, status: TaskStatus) -> ScheduledTask {
    ScheduledTask {
        id: Uuid::new_v4(),
        lawn_profile_id: Uuid::new_v4(),
        task_id: task.id,
        scheduled_date: on,
        status,
        weather_adjusted: false,
        notes: None,
        completed_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_rainy_week_moves_mowing_to_first_dry_day() {
    let task = mowing();
    let today = date(2024, 6, 2);
    let forecast = vec![
        day(date(2024, 6, 3), 72.0, 80.0, 5.0),
        day(date(2024, 6, 4), 70.0, 60.0, 5.0),
        day(date(2024, 6, 5), 75.0, 10.0, 8.0),
        day(date(2024, 6, 6), 78.0, 0.0, 4.0),
    ];

    let pending = scheduled(&task, date(2024, 6, 3), TaskStatus::Pending);
    assert!(should_reschedule_task_on(&task, &pending, &forecast[0], today));
    assert_eq!(
        get_next_available_date(&task, today, &forecast),
        Some(date(2024, 6, 5))
    );
}

#[test]
fn test_first_violation_reported() {
    let task = mowing();
    // Too cold, too wet and too windy: temperature is reported
    let check = check_weather_conditions(&task, &day(date(2024, 4, 1), 40.0, 90.0, 35.0));
    assert!(!check.is_valid);
    assert!(check.reason.unwrap().starts_with("Temperature too low"));

    // Only wind is out of range
    let check = check_weather_conditions(&task, &day(date(2024, 4, 1), 60.0, 0.0, 35.0));
    assert!(check.reason.unwrap().starts_with("Wind speed too high"));
}

#[test]
fn test_thresholds_are_inclusive() {
    let task = mowing();
    let edge = day(date(2024, 7, 1), 90.0, 30.0, 20.0);
    assert!(check_weather_conditions(&task, &edge).is_valid);
}

#[test]
fn test_candidate_dates_checked_against_their_own_season() {
    // Spring-only work evaluated on the last day of May: June is summer
    let task = spring_only("Dethatch", Priority::Medium);
    let forecast = vec![
        day(date(2024, 5, 31), 60.0, 0.0, 0.0),
        day(date(2024, 6, 1), 60.0, 0.0, 0.0),
    ];
    assert_eq!(get_next_available_date(&task, date(2024, 5, 30), &forecast), Some(date(2024, 5, 31)));
    assert_eq!(get_next_available_date(&task, date(2024, 5, 31), &forecast), None);
}

#[test]
fn test_days_missing_from_forecast_are_skipped() {
    let task = mowing();
    let forecast = vec![day(date(2024, 6, 4), 70.0, 0.0, 0.0)];
    assert_eq!(
        get_next_available_date(&task, date(2024, 6, 1), &forecast),
        Some(date(2024, 6, 4))
    );
    assert_eq!(get_next_available_date(&task, date(2024, 6, 1), &[]), None);
}

#[test]
fn test_out_of_season_task_is_always_moved() {
    let task = spring_only("Pre-emergent", Priority::High);
    let july = date(2024, 7, 10);
    let pending = scheduled(&task, july, TaskStatus::Pending);
    let perfect = day(july, 70.0, 0.0, 0.0);
    assert!(should_reschedule_task_on(&task, &pending, &perfect, july));
}

#[test]
fn test_finished_tasks_never_move() {
    let task = mowing();
    let storm = day(date(2024, 6, 3), 70.0, 100.0, 50.0);
    for status in [TaskStatus::Completed, TaskStatus::Rescheduled] {
        let st = scheduled(&task, date(2024, 6, 3), status);
        assert!(!should_reschedule_task_on(&task, &st, &storm, date(2024, 6, 2)));
    }
    let skipped = scheduled(&task, date(2024, 6, 3), TaskStatus::Skipped);
    assert!(should_reschedule_task_on(&task, &skipped, &storm, date(2024, 6, 2)));
}

#[test]
fn test_season_boundaries() {
    assert_eq!(season_on(date(2024, 2, 29)), Season::Winter);
    assert_eq!(season_on(date(2024, 3, 1)), Season::Spring);
    assert_eq!(season_on(date(2024, 11, 30)), Season::Fall);
    assert_eq!(season_on(date(2024, 12, 1)), Season::Winter);
}

#[test]
fn test_priority_sort_keeps_catalogue_order_within_a_priority() {
    let tasks = vec![
        spring_only("Edge beds", Priority::Low),
        spring_only("Aerate", Priority::High),
        spring_only("Fertilize", Priority::Medium),
        spring_only("Mow", Priority::High),
    ];
    let names: Vec<_> = sort_tasks_by_priority(&tasks)
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, ["Aerate", "Mow", "Fertilize", "Edge beds"]);
    assert_eq!(tasks[0].name, "Edge beds");
}

// ============================================================================
// Property Tests
// ============================================================================

fn observation_strategy() -> impl Strategy<Value = (f64, f64, f64)> {
    (20.0f64..110.0, 0.0f64..100.0, 0.0f64..40.0)
}

fn start_date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0u64..365).prop_map(|offset| date(2024, 1, 1) + Days::new(offset))
}

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::High),
        Just(Priority::Medium),
        Just(Priority::Low),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A suggested date lies inside the horizon, is in season and has good weather
    #[test]
    fn prop_next_date_is_eligible(
        start in start_date_strategy(),
        weather in prop::collection::vec(observation_strategy(), 7),
    ) {
        let task = mowing();
        let forecast: Vec<_> = weather
            .iter()
            .enumerate()
            .map(|(i, (t, p, w))| day(start + Days::new(i as u64), *t, *p, *w))
            .collect();

        if let Some(next) = get_next_available_date(&task, start, &forecast) {
            prop_assert!(next > start);
            prop_assert!(next <= start + Days::new(FORECAST_HORIZON_DAYS));
            prop_assert!(is_task_in_season_on(&task, next));
            let obs = forecast.iter().find(|d| d.date == next).unwrap();
            prop_assert!(check_weather_conditions(&task, obs).is_valid);

            // Nothing earlier would have worked
            for earlier in forecast.iter().filter(|d| d.date > start && d.date < next) {
                prop_assert!(
                    !check_weather_conditions(&task, earlier).is_valid
                        || !is_task_in_season_on(&task, earlier.date)
                );
            }
        }
    }

    /// Tasks without weather factors pass any weather
    #[test]
    fn prop_unconstrained_task_always_valid((t, p, w) in observation_strategy()) {
        let task = spring_only("Inspect", Priority::Low);
        prop_assert!(check_weather_conditions(&task, &day(date(2024, 4, 1), t, p, w)).is_valid);
    }

    /// Sorting by priority is a permutation ordered from high to low
    #[test]
    fn prop_sort_is_ordered_permutation(priorities in prop::collection::vec(priority_strategy(), 0..20)) {
        let tasks: Vec<_> = priorities
            .iter()
            .enumerate()
            .map(|(i, p)| spring_only(&format!("task {}", i), *p))
            .collect();
        let sorted = sort_tasks_by_priority(&tasks);

        prop_assert_eq!(sorted.len(), tasks.len());
        for task in &tasks {
            prop_assert!(sorted.iter().any(|s| s.id == task.id && s.name == task.name));
        }
        let rank = |p: Priority| match p {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
            Priority::Unknown => 0,
        };
        for pair in sorted.windows(2) {
            prop_assert!(rank(pair[0].priority) >= rank(pair[1].priority));
        }
    }
}
