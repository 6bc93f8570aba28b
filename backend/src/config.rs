// src/config.rs

use std::{env, net::SocketAddr, path::PathBuf};

use dotenvy::dotenv;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 5;
pub const MAX_LEADERBOARD_LIMIT: usize = 100;
const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/";

/// Connection settings for the Google Sheets results store.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    /// Worksheet (or A1 range) holding the header row and results.
    pub range: String,
    pub api_base: Url,
    /// Path to the service-account key JSON file.
    pub credentials_path: PathBuf,
}

/// Which results store backs the leaderboard.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    Memory,
    Postgres { database_url: String },
    Sheets(SheetsConfig),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub rust_log: String,
    pub log_dir: String,
    pub store: StoreConfig,
    pub question_bank_path: Option<PathBuf>,
    pub leaderboard_limit: usize,
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            rust_log: "info".to_string(),
            log_dir: "logs".to_string(),
            store: StoreConfig::Memory,
            question_bank_path: None,
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = match var("BIND_ADDR") {
            Some(raw) => raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                reason: e.to_string(),
            })?,
            None => defaults.bind_addr,
        };

        let leaderboard_limit = match var("LEADERBOARD_LIMIT") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=MAX_LEADERBOARD_LIMIT).contains(n))
                .ok_or(ConfigError::Invalid {
                    key: "LEADERBOARD_LIMIT",
                    reason: format!("expected 1..={}, got '{}'", MAX_LEADERBOARD_LIMIT, raw),
                })?,
            None => defaults.leaderboard_limit,
        };

        let cors_origins = match var("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => defaults.cors_origins,
        };

        Ok(Self {
            bind_addr,
            rust_log: var("RUST_LOG").unwrap_or(defaults.rust_log),
            log_dir: var("LOG_DIR").unwrap_or(defaults.log_dir),
            store: store_from_lookup(&var)?,
            question_bank_path: var("QUESTION_BANK_PATH").map(PathBuf::from),
            leaderboard_limit,
            cors_origins,
        })
    }
}

fn store_from_lookup<F>(var: &F) -> Result<StoreConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let database_url = var("DATABASE_URL");
    let backend = var("RESULTS_STORE").unwrap_or_else(|| {
        if database_url.is_some() {
            "postgres".to_string()
        } else {
            "memory".to_string()
        }
    });

    match backend.to_ascii_lowercase().as_str() {
        "memory" => Ok(StoreConfig::Memory),
        "postgres" => Ok(StoreConfig::Postgres {
            database_url: database_url.ok_or(ConfigError::Missing("DATABASE_URL"))?,
        }),
        "sheets" => {
            let api_base_raw =
                var("SHEETS_API_BASE").unwrap_or_else(|| DEFAULT_SHEETS_API_BASE.to_string());
            // Url::join drops the last segment unless the base ends with '/'.
            let api_base_raw = if api_base_raw.ends_with('/') {
                api_base_raw
            } else {
                format!("{}/", api_base_raw)
            };
            let api_base = Url::parse(&api_base_raw).map_err(|e| ConfigError::Invalid {
                key: "SHEETS_API_BASE",
                reason: e.to_string(),
            })?;

            Ok(StoreConfig::Sheets(SheetsConfig {
                spreadsheet_id: var("SHEETS_SPREADSHEET_ID")
                    .ok_or(ConfigError::Missing("SHEETS_SPREADSHEET_ID"))?,
                range: var("SHEETS_RANGE").unwrap_or_else(|| "Sheet1".to_string()),
                api_base,
                credentials_path: var("GOOGLE_SERVICE_ACCOUNT_FILE")
                    .map(PathBuf::from)
                    .ok_or(ConfigError::Missing("GOOGLE_SERVICE_ACCOUNT_FILE"))?,
            }))
        }
        other => Err(ConfigError::Invalid {
            key: "RESULTS_STORE",
            reason: format!("unknown store '{}'", other),
        }),
    }
}
