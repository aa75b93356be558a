use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// When set, user state is persisted in Redis.
    pub redis_url: Option<String>,
    /// When set (and Redis is not), user state is persisted as JSON files here.
    pub data_dir: Option<PathBuf>,
    pub autosave_interval: Duration,
    pub field_sync_debounce: Duration,
    pub jobs_page_size: usize,
    pub jobs_seed_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            redis_url: None,
            data_dir: None,
            autosave_interval: Duration::from_secs(30),
            field_sync_debounce: Duration::from_millis(500),
            jobs_page_size: 10,
            jobs_seed_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        let jobs_page_size: usize = parse_env("JOBS_PAGE_SIZE", defaults.jobs_page_size)?;
        if jobs_page_size == 0 {
            anyhow::bail!("JOBS_PAGE_SIZE must be greater than zero");
        }

        Ok(Config {
            port: parse_env("PORT", defaults.port)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            redis_url: optional_env("REDIS_URL"),
            data_dir: optional_env("DATA_DIR").map(PathBuf::from),
            autosave_interval: Duration::from_secs(parse_env("AUTOSAVE_INTERVAL_SECS", 30u64)?),
            field_sync_debounce: Duration::from_millis(parse_env(
                "FIELD_SYNC_DEBOUNCE_MS",
                500u64,
            )?),
            jobs_page_size,
            jobs_seed_path: optional_env("JOBS_SEED_PATH").map(PathBuf::from),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
