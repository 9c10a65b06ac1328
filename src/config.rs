use std::net::IpAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::billing::rate::MasterRates;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub db_max_connections: u32,
    /// Seeded into a new user's rate master on registration.
    pub default_rates: MasterRates,
}

impl AppConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty()).ok_or(ConfigError::Missing(key));

        let cow_rate: f64 = parsed(&lookup, "DEFAULT_COW_RATE", 55.0)?;
        let buffalo_rate: f64 = parsed(&lookup, "DEFAULT_BUFFALO_RATE", 65.0)?;
        for (key, rate) in [("DEFAULT_COW_RATE", cow_rate), ("DEFAULT_BUFFALO_RATE", buffalo_rate)] {
            if rate.is_nan() || rate <= 0.0 {
                return Err(ConfigError::Invalid { key, value: rate.to_string() });
            }
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: parsed(&lookup, "HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parsed(&lookup, "PORT", 3000)?,
            jwt_secret: required("JWT_SECRET")?,
            token_ttl_hours: parsed(&lookup, "TOKEN_TTL_HOURS", 8)?,
            db_max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            default_rates: MasterRates::new(cow_rate, buffalo_rate),
        })
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
