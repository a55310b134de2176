use std::{env, fmt::Display, fs::read_to_string, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("Missing secret {0}")]
    MissingSecret(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(format!("expected development or production, got {other}")),
        }
    }
}

impl Environment {
    /// Quiet read of `APP_ENV` for picking the log format before anything is logged.
    pub fn from_env() -> Self {
        var("APP_ENV")
            .and_then(|value| value.parse().ok())
            .unwrap_or(Self::Development)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(format!("expected redis or memory, got {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub environment: Environment,
    pub store_backend: StoreBackend,
    pub redis_url: String,
    pub database_name: String,
    pub session_key: String,
    pub webhook_secret: Option<String>,
    pub deploy_dir: PathBuf,
    pub deploy_chmod_target: String,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            port: try_load("RUST_PORT", "1111")?,
            environment: try_load("APP_ENV", "development")?,
            store_backend: try_load("STORE_BACKEND", "redis")?,
            redis_url: try_load("REDIS_URL", "redis://127.0.0.1:6379")?,
            database_name: try_load("DATABASE_NAME", "recipes")?,
            session_key: read_secret("SESSION_KEY").ok_or(ConfigError::MissingSecret("SESSION_KEY"))?,
            webhook_secret: read_secret("WEBHOOK_SECRET"),
            deploy_dir: try_load("DEPLOY_DIR", ".")?,
            deploy_chmod_target: try_load("DEPLOY_CHMOD_TARGET", "app.cgi")?,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    parse_or_default(key, var(key), default)
}

fn parse_or_default<T: FromStr>(
    key: &'static str,
    value: Option<String>,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    value
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                message: e.to_string(),
            }
        })
}

/// Docker-style secret file first, then the environment variable of the same name.
fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    match read_to_string(&path) {
        Ok(s) => Some(s.trim().to_string()),
        Err(e) => {
            info!("Secret file for {secret_name} unavailable ({e}), checking environment");
            var(secret_name).filter(|s| !s.is_empty())
        }
    }
}
