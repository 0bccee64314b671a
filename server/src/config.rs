use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::{info, warn};

/// Runtime settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub media_root: PathBuf,
    pub media_url: String,
    pub session_ttl_days: i64,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            bind_addr: try_load("BIND_ADDR", "0.0.0.0:3000")?,
            media_root: try_load::<String>("MEDIA_ROOT", "media")?.into(),
            media_url: normalize_url_prefix(&try_load::<String>("MEDIA_URL", "/media")?)?,
            session_ttl_days: try_load("SESSION_TTL_DAYS", "30")?,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            message: e.to_string(),
        }
    })
}

/// `media/` and `/media/` both become `/media`.
/// Leading slash, no trailing slash. Media cannot be served from the root.
fn normalize_url_prefix(prefix: &str) -> Result<String, ConfigError> {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid {
            key: "MEDIA_URL",
            message: "must not be the site root".to_string(),
        });
    }
    Ok(format!("/{trimmed}"))
}
