//! User and lawn profile models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Coordinates, ParseEnumError};

/// A registered homeowner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(ParseEnumError::new("role", other)),
        }
    }
}

/// A user's declared lawn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LawnProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    /// Lawn area in square feet
    pub size_sq_ft: Decimal,
    pub grass_type: GrassType,
    pub sun_exposure: SunExposure,
    /// Postal code or city, as entered
    pub location: String,
    pub coordinates: Option<Coordinates>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Common turf grasses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GrassType {
    Bermuda,
    KentuckyBluegrass,
    TallFescue,
    FineFescue,
    PerennialRyegrass,
    Zoysia,
    StAugustine,
    Centipede,
    Bahia,
    /// Anything not in the list, by name
    Other(String),
}

impl GrassType {
    /// Warm-season grasses go dormant in winter and are fed in summer
    pub fn is_warm_season(&self) -> bool {
        matches!(
            self,
            GrassType::Bermuda
                | GrassType::Zoysia
                | GrassType::StAugustine
                | GrassType::Centipede
                | GrassType::Bahia
        )
    }

    pub fn to_db(&self) -> String {
        match self {
            GrassType::Other(name) => format!("other:{}", name),
            known => serde_json::to_value(known)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
        }
    }

    pub fn from_db(s: &str) -> Self {
        if let Some(name) = s.strip_prefix("other:") {
            return GrassType::Other(name.to_string());
        }
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .unwrap_or_else(|_| GrassType::Other(s.to_string()))
    }
}

impl std::fmt::Display for GrassType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrassType::Bermuda => write!(f, "Bermuda"),
            GrassType::KentuckyBluegrass => write!(f, "Kentucky Bluegrass"),
            GrassType::TallFescue => write!(f, "Tall Fescue"),
            GrassType::FineFescue => write!(f, "Fine Fescue"),
            GrassType::PerennialRyegrass => write!(f, "Perennial Ryegrass"),
            GrassType::Zoysia => write!(f, "Zoysia"),
            GrassType::StAugustine => write!(f, "St. Augustine"),
            GrassType::Centipede => write!(f, "Centipede"),
            GrassType::Bahia => write!(f, "Bahia"),
            GrassType::Other(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SunExposure {
    FullSun,
    PartialShade,
    FullShade,
}

impl SunExposure {
    pub fn as_str(&self) -> &'static str {
        match self {
            SunExposure::FullSun => "full_sun",
            SunExposure::PartialShade => "partial_shade",
            SunExposure::FullShade => "full_shade",
        }
    }
}

impl std::str::FromStr for SunExposure {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full_sun" => Ok(SunExposure::FullSun),
            "partial_shade" => Ok(SunExposure::PartialShade),
            "full_shade" => Ok(SunExposure::FullShade),
            other => Err(ParseEnumError::new("sun_exposure", other)),
        }
    }
}
