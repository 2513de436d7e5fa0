use std::{env, fmt::Display, str::FromStr};

use thiserror::Error;
use tracing::info;

const DEFAULT_DATABASE_URL: &str = "sqlite://todo.db";
const DEFAULT_BCRYPT_COST: &str = "10";
const DEFAULT_PORT: &str = "8000";
const DEFAULT_SESSION_TTL_SECS: &str = "604800";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),

    #[error("invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// Settings read from the environment once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub session_secret: String,
    pub bcrypt_cost: u32,
    pub port: u16,
    pub session_ttl_secs: u64,
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let session_secret =
            env::var("SESSION_SECRET").map_err(|_| ConfigError::Missing("SESSION_SECRET"))?;
        if session_secret.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "SESSION_SECRET",
                reason: "must not be empty".to_string(),
            });
        }

        let bcrypt_cost: u32 = try_load("BCRYPT_COST", DEFAULT_BCRYPT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                reason: format!("{bcrypt_cost} is outside 4..=31"),
            });
        }

        Ok(Self {
            database_url: try_load("DATABASE_URL", DEFAULT_DATABASE_URL)?,
            session_secret,
            bcrypt_cost,
            port: try_load("PORT", DEFAULT_PORT)?,
            session_ttl_secs: try_load("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?,
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|s| !s.is_empty()),
        })
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        })
}
