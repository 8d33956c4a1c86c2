// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Read once at startup and treated as constant for the life of the process.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_DIALOG_HOLD_SECS: u64 = 3;
const DEFAULT_CREDENTIAL_PATH: &str = ".checkin/session.json";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the registration/user API (no trailing slash)
    pub api_base_url: String,
    /// Static API key sent as `X-API-Key`
    pub api_key: String,
    /// Upper bound for every HTTP request
    pub request_timeout: Duration,
    /// Where the logged-in session is persisted
    pub credential_path: PathBuf,
    /// How long the kiosk shows a result before resuming the scanner
    pub dialog_hold: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            api_key: "test_api_key".to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            credential_path: PathBuf::from(DEFAULT_CREDENTIAL_PATH),
            dialog_hold: Duration::from_secs(DEFAULT_DIALOG_HOLD_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            api_base_url: env::var("CHECKIN_API_BASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("CHECKIN_API_BASE_URL"))?,
            api_key: env::var("CHECKIN_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("CHECKIN_API_KEY"))?,
            request_timeout: Duration::from_secs(secs_var(
                "CHECKIN_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            credential_path: env::var("CHECKIN_CREDENTIAL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CREDENTIAL_PATH)),
            dialog_hold: Duration::from_secs(secs_var(
                "CHECKIN_DIALOG_HOLD_SECS",
                DEFAULT_DIALOG_HOLD_SECS,
            )?),
        })
    }
}

fn secs_var(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, v)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
