//! Validation utilities for LawnSync
//!
//! Used by the backend before persisting input, and by the browser through
//! the WASM bindings for instant feedback.

use rust_decimal::Decimal;

use crate::models::{Season, WeatherFactors};

// ============================================================================
// Account Validations
// ============================================================================

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if validator::validate_email(email) {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    if password.len() > 128 {
        return Err("Password must be at most 128 characters");
    }
    Ok(())
}

// ============================================================================
// Lawn Profile Validations
// ============================================================================

/// Largest lawn we accept, in square feet (roughly 230 acres)
pub const MAX_LAWN_SIZE_SQ_FT: i64 = 10_000_000;

/// Validate lawn area in square feet
pub fn validate_lawn_size(size_sq_ft: Decimal) -> Result<(), &'static str> {
    if size_sq_ft <= Decimal::ZERO {
        return Err("Lawn size must be greater than zero");
    }
    if size_sq_ft > Decimal::from(MAX_LAWN_SIZE_SQ_FT) {
        return Err("Lawn size exceeds maximum");
    }
    Ok(())
}

/// Validate GPS coordinates
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), &'static str> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err("Latitude must be between -90 and 90");
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}

// ============================================================================
// Maintenance Task Validations
// ============================================================================

/// Validate a task's weather thresholds
pub fn validate_weather_factors(factors: &WeatherFactors) -> Result<(), &'static str> {
    if let Some(range) = factors.temperature {
        if !range.min.is_finite() || !range.max.is_finite() {
            return Err("Temperature bounds must be numbers");
        }
        if range.min > range.max {
            return Err("Minimum temperature cannot exceed maximum temperature");
        }
    }
    if let Some(limit) = factors.precipitation {
        if !(0.0..=100.0).contains(&limit.chance) {
            return Err("Precipitation chance must be between 0 and 100");
        }
        if limit.intensity < 0.0 {
            return Err("Precipitation intensity cannot be negative");
        }
    }
    if let Some(limit) = factors.wind {
        if limit.speed < 0.0 || !limit.speed.is_finite() {
            return Err("Wind speed limit cannot be negative");
        }
    }
    Ok(())
}

/// Validate a task's season list
pub fn validate_seasons(seasons: &[Season]) -> Result<(), &'static str> {
    if seasons.is_empty() {
        return Err("A task must apply to at least one season");
    }
    Ok(())
}

/// Validate estimated duration in minutes (at most one day)
pub fn validate_duration_minutes(minutes: i32) -> Result<(), &'static str> {
    if minutes < 1 {
        return Err("Duration must be at least one minute");
    }
    if minutes > 24 * 60 {
        return Err("Duration cannot exceed one day");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PrecipitationLimit, TemperatureRange, WindLimit};

    #[test]
    fn test_validate_email() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name@domain.co.uk").is_ok());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_lawn_size() {
        assert!(validate_lawn_size(Decimal::from(5000)).is_ok());
        assert!(validate_lawn_size(Decimal::new(5, 1)).is_ok());
        assert!(validate_lawn_size(Decimal::ZERO).is_err());
        assert!(validate_lawn_size(Decimal::from(-10)).is_err());
        assert!(validate_lawn_size(Decimal::from(MAX_LAWN_SIZE_SQ_FT + 1)).is_err());
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(40.7128, -74.0060).is_ok());
        assert!(validate_coordinates(91.0, 0.0).is_err());
        assert!(validate_coordinates(0.0, -181.0).is_err());
    }

    #[test]
    fn test_validate_weather_factors() {
        assert!(validate_weather_factors(&WeatherFactors::default()).is_ok());

        let inverted = WeatherFactors {
            temperature: Some(TemperatureRange { min: 30.0, max: 10.0 }),
            ..Default::default()
        };
        assert!(validate_weather_factors(&inverted).is_err());

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

        let good = WeatherFactors {
            temperature: Some(TemperatureRange { min: 50.0, max: 85.0 }),
            precipitation: Some(PrecipitationLimit {
                chance: 30.0,
                intensity: 2.0,
            }),
            wind: Some(WindLimit { speed: 15.0 }),
        };
        assert!(validate_weather_factors(&good).is_ok());
    }

    #[test]
    fn test_validate_seasons() {
        assert!(validate_seasons(&[Season::Spring]).is_ok());
        assert!(validate_seasons(&[]).is_err());
    }

    #[test]
    fn test_validate_duration() {
        assert!(validate_duration_minutes(45).is_ok());
        assert!(validate_duration_minutes(0).is_err());
        assert!(validate_duration_minutes(1441).is_err());
    }
}
