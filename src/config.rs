// src/config.rs

use std::{env, fmt};

use dotenvy::dotenv;

use crate::scoring::CategoryBand;

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
pub const MAX_LEADERBOARD_LIMIT: usize = 100;
pub const DEFAULT_CATEGORY_BANDS: &str = "0:low,60:moderate,80:high";

/// Which `Store` implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, reason } => write!(f, "{} is invalid: {}", key, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub database_connect_retries: u32,
    pub bind_addr: String,
    pub rust_log: String,
    pub log_dir: String,
    pub cors_origins: Vec<String>,
    pub category_bands: Vec<CategoryBand>,
    pub leaderboard_default_limit: usize,
    pub leaderboard_max_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::Memory,
            database_url: None,
            database_max_connections: 5,
            database_connect_retries: 5,
            bind_addr: "0.0.0.0:3000".to_string(),
            rust_log: "info".to_string(),
            log_dir: "logs".to_string(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            category_bands: CategoryBand::defaults(),
            leaderboard_default_limit: DEFAULT_LEADERBOARD_LIMIT,
            leaderboard_max_limit: MAX_LEADERBOARD_LIMIT,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let defaults = Config::default();

        let storage_backend = match env::var("STORAGE_BACKEND").as_deref() {
            Ok("memory") => StorageBackend::Memory,
            Ok("postgres") | Err(_) => StorageBackend::Postgres,
            Ok(other) => {
                return Err(ConfigError::Invalid {
                    key: "STORAGE_BACKEND",
                    reason: format!("unknown backend '{}'", other),
                });
            }
        };

        let database_url = env::var("DATABASE_URL").ok();
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let category_bands = match env::var("CATEGORY_BANDS") {
            Ok(raw) => parse_category_bands(&raw).map_err(|reason| ConfigError::Invalid {
                key: "CATEGORY_BANDS",
                reason,
            })?,
            Err(_) => defaults.category_bands,
        };

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or(defaults.cors_origins);

        Ok(Self {
            storage_backend,
            database_url,
            database_max_connections: parse_var(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,
            database_connect_retries: parse_var(
                "DATABASE_CONNECT_RETRIES",
                defaults.database_connect_retries,
            )?,
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            rust_log: env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            log_dir: env::var("LOG_DIR").unwrap_or(defaults.log_dir),
            cors_origins,
            category_bands,
            leaderboard_default_limit: parse_var(
                "LEADERBOARD_DEFAULT_LIMIT",
                defaults.leaderboard_default_limit,
            )?,
            leaderboard_max_limit: parse_var(
                "LEADERBOARD_MAX_LIMIT",
                defaults.leaderboard_max_limit,
            )?,
        })
    }
}

fn parse_var<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Parses `min:label` pairs, e.g. `0:low,60:moderate,80:high`.
///
/// Bands must start at 0 and be strictly ascending.
pub fn parse_category_bands(raw: &str) -> Result<Vec<CategoryBand>, String> {
    let mut bands = Vec::new();

    for pair in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (min, label) = pair
            .split_once(':')
            .ok_or_else(|| format!("expected 'min:label', got '{}'", pair))?;
        let min_percent: f64 = min
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a number", min.trim()))?;
        let label = label.trim();
        if label.is_empty() {
            return Err(format!("band at {} has an empty label", min_percent));
        }
        if let Some(prev) = bands.last().map(|b: &CategoryBand| b.min_percent) {
            if min_percent <= prev {
                return Err("bands must be strictly ascending".to_string());
            }
        }
        bands.push(CategoryBand {
            min_percent,
            label: label.to_string(),
        });
    }

    match bands.first() {
        None => Err("at least one band is required".to_string()),
        Some(first) if first.min_percent != 0.0 => Err("the first band must start at 0".to_string()),
        Some(_) => Ok(bands),
    }
}
