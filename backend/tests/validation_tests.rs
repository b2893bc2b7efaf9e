//! Input validation tests
//!
//! Rules shared by the API and the browser bindings for accounts, lawn
//! profiles and maintenance task definitions.

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::models::{
    GrassType, PrecipitationLimit, Season, TaskStatus, TemperatureRange, WeatherFactors,
    WindLimit,
};
use shared::validation::{
    validate_coordinates, validate_duration_minutes, validate_email, validate_lawn_size,
    validate_password, validate_seasons, validate_weather_factors, MAX_LAWN_SIZE_SQ_FT,
};

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_account_rules() {
        assert!(validate_email("pat@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_lawn_size_bounds() {
        assert!(validate_lawn_size(Decimal::new(2505, 1)).is_ok());
        assert!(validate_lawn_size(Decimal::from(MAX_LAWN_SIZE_SQ_FT)).is_ok());
        assert!(validate_lawn_size(Decimal::from(MAX_LAWN_SIZE_SQ_FT + 1)).is_err());
        assert!(validate_lawn_size(Decimal::ZERO).is_err());
        assert!(validate_lawn_size(Decimal::from(-10)).is_err());
    }

    #[test]
    fn test_weather_factor_rules() {
        let ok = WeatherFactors {
            temperature: Some(TemperatureRange { min: 45.0, max: 85.0 }),
            precipitation: Some(PrecipitationLimit {
                chance: 20.0,
                intensity: 0.0,
            }),
            wind: Some(WindLimit { speed: 15.0 }),
        };
        assert!(validate_weather_factors(&ok).is_ok());
        assert!(validate_weather_factors(&WeatherFactors::default()).is_ok());

        let bad_chance = WeatherFactors {
            precipitation: Some(PrecipitationLimit {
                chance: 120.0,
                intensity: 0.0,
            }),
            ..Default::default()
        };
        assert!(validate_weather_factors(&bad_chance).is_err());

        let negative_wind = WeatherFactors {
            wind: Some(WindLimit { speed: -1.0 }),
            ..Default::default()
        };
        assert!(validate_weather_factors(&negative_wind).is_err());
    }

    #[test]
    fn test_task_definition_rules() {
        assert!(validate_seasons(&[Season::Spring]).is_ok());
        assert!(validate_seasons(&[]).is_err());
        assert!(validate_duration_minutes(1).is_ok());
        assert!(validate_duration_minutes(24 * 60).is_ok());
        assert!(validate_duration_minutes(24 * 60 + 1).is_err());
    }

    #[test]
    fn test_grass_type_storage_format() {
        assert_eq!(GrassType::from_db(&GrassType::TallFescue.to_db()), GrassType::TallFescue);
        let custom = GrassType::Other("Buffalo".to_string());
        assert_eq!(GrassType::from_db(&custom.to_db()), custom);
    }

    #[test]
    fn test_status_transitions() {
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Completed));
        assert!(TaskStatus::Skipped.can_transition_to(TaskStatus::Pending));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Pending));
        assert!(!TaskStatus::Rescheduled.can_transition_to(TaskStatus::Pending));
        assert!(!TaskStatus::Skipped.can_transition_to(TaskStatus::Completed));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_coordinates_in_range_accepted(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
        prop_assert!(validate_coordinates(lat, lon).is_ok());
    }

    #[test]
    fn prop_latitude_out_of_range_rejected(lat in 90.0001f64..1000.0, lon in -180.0f64..=180.0) {
        prop_assert!(validate_coordinates(lat, lon).is_err());
        prop_assert!(validate_coordinates(-lat, lon).is_err());
    }

    /// A temperature range is valid exactly when min <= max
    #[test]
    fn prop_temperature_range_order(a in -40.0f64..130.0, b in -40.0f64..130.0) {
        let factors = WeatherFactors {
            temperature: Some(TemperatureRange { min: a, max: b }),
            ..Default::default()
        };
        prop_assert_eq!(validate_weather_factors(&factors).is_ok(), a <= b);
    }

    /// No terminal status can move anywhere
    #[test]
    fn prop_terminal_statuses_are_final(idx in 0usize..4) {
        let all = [
            TaskStatus::Pending,
            TaskStatus::Completed,
            TaskStatus::Skipped,
            TaskStatus::Rescheduled,
        ];
        for from in all.iter().filter(|s| s.is_terminal()) {
            prop_assert!(!from.can_transition_to(all[idx]));
        }
    }
}
