use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum_extra::extract::cookie::Key;
use base64::prelude::*;
use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

use crate::lessons::Lesson;

const SECRET_KEY_ENV: &str = "WEBTOUR_SECRET_KEY";
const SECURE_COOKIES_ENV: &str = "WEBTOUR_SECURE_COOKIES";
const MIN_SECRET_KEY_BYTES: usize = 64;

#[derive(Debug, Parser)]
#[command(
    name = "webtour",
    version,
    about = "Serve one of the incremental web application lessons"
)]
pub struct Cli {
    #[arg(long, short = 'L', value_enum, value_name = "LESSON")]
    pub lesson: Option<Lesson>,

    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,

    /// Lifetime of permanent sessions, e.g. `7d` or `36h`.
    #[arg(long, value_name = "DURATION")]
    pub session_lifetime: Option<String>,

    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub lesson: Lesson,
    pub database_url: String,
    pub static_folder: PathBuf,
    pub secret_key: Option<String>,
    pub session: SessionConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub permanent_lifetime: Duration,
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// One request of quota comes back every `replenish_ms` milliseconds.
    pub replenish_ms: u64,
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            replenish_ms: 50,
            burst: 50,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config in {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid boolean value for env var {key}: {value}")]
    InvalidEnvBool { key: String, value: String },
    #[error("invalid session lifetime {value:?}: {source}")]
    InvalidLifetime {
        value: String,
        source: humantime::DurationError,
    },
    #[error("secret key is not valid base64")]
    SecretKeyEncoding,
    #[error("secret key must decode to at least {MIN_SECRET_KEY_BYTES} bytes, got {0}")]
    SecretKeyTooShort(usize),
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bind: Option<SocketAddr>,
    lesson: Option<Lesson>,
    database_url: Option<String>,
    static_folder: Option<PathBuf>,
    secret_key: Option<String>,
    cookie_name: Option<String>,
    session_lifetime: Option<String>,
    secure_cookies: Option<bool>,
    rate_limit_replenish_ms: Option<u64>,
    rate_limit_burst: Option<u32>,
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let from_file = read_file_config(cli.config.as_deref())?;
        let env_secret = read_env_string(SECRET_KEY_ENV);
        let env_secure = read_env_bool(SECURE_COOKIES_ENV)?;

        let lesson = cli.lesson.or(from_file.lesson).unwrap_or_default();
        let bind = cli
            .bind
            .or(from_file.bind)
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 5000)));
        let database_url = cli
            .database_url
            .or(from_file.database_url)
            .unwrap_or_else(|| String::from("sqlite://users.sqlite3?mode=rwc"));
        let static_folder = from_file
            .static_folder
            .unwrap_or_else(|| PathBuf::from("./static"));
        let permanent_lifetime = match cli.session_lifetime.or(from_file.session_lifetime) {
            Some(raw) => parse_lifetime(&raw)?,
            None => lesson.default_session_lifetime(),
        };
        let defaults = RateLimitConfig::default();

        Ok(Self {
            bind,
            lesson,
            database_url,
            static_folder,
            secret_key: env_secret.or(from_file.secret_key),
            session: SessionConfig {
                cookie_name: from_file
                    .cookie_name
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| String::from("session")),
                permanent_lifetime,
                secure_cookies: env_secure.or(from_file.secure_cookies).unwrap_or(false),
            },
            rate_limit: RateLimitConfig {
                replenish_ms: from_file
                    .rate_limit_replenish_ms
                    .unwrap_or(defaults.replenish_ms)
                    .max(1),
                burst: from_file.rate_limit_burst.unwrap_or(defaults.burst).max(1),
            },
        })
    }

    /// Signing key for the session cookie. `None` when no secret is configured.
    pub fn cookie_key(&self) -> Result<Option<Key>, ConfigError> {
        self.secret_key.as_deref().map(parse_secret_key).transpose()
    }
}

fn parse_secret_key(raw: &str) -> Result<Key, ConfigError> {
    let bytes = BASE64_STANDARD
        .decode(raw.trim())
        .map_err(|_| ConfigError::SecretKeyEncoding)?;
    if bytes.len() < MIN_SECRET_KEY_BYTES {
        return Err(ConfigError::SecretKeyTooShort(bytes.len()));
    }
    Key::try_from(bytes.as_slice()).map_err(|_| ConfigError::SecretKeyTooShort(bytes.len()))
}

fn parse_lifetime(raw: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(raw.trim()).map_err(|source| ConfigError::InvalidLifetime {
        value: String::from(raw),
        source,
    })
}

fn read_file_config(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn read_env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn read_env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => parse_bool_value(key, &value).map(Some),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidEnvBool {
            key: String::from(key),
            value: String::from("<non-unicode>"),
        }),
    }
}

fn parse_bool_value(key: &str, raw: &str) -> Result<bool, ConfigError> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvBool {
            key: String::from(key),
            value: String::from(raw),
        }),
    }
}
