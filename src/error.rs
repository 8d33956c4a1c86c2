// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types shared by the API client and the credential store.

use serde::Deserialize;

/// Error returned by calls to the registration/user API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 401: the bearer token was rejected.
    #[error("Access token rejected")]
    Unauthorized,

    /// 401 from login: the identifier or password is wrong.
    #[error("Login rejected: {0}")]
    LoginRejected(String),

    /// Any other non-2xx response.
    #[error("HTTP {status}: {message}")]
    Rejected {
        status: u16,
        title: Option<String>,
        message: String,
    },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Build a `Rejected` error from a status code and raw response body.
    ///
    /// The API answers errors with `{message, status}`; `status` is usually a
    /// short title such as "Conflict" but older endpoints send a number.
    pub fn from_error_body(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            message: Option<String>,
            status: Option<serde_json::Value>,
        }

        let parsed = serde_json::from_str::<ErrorBody>(body).ok();
        let title = parsed
            .as_ref()
            .and_then(|b| b.status.as_ref())
            .and_then(|s| match s {
                serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            });
        let message = parsed
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                let body = body.trim();
                if body.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.to_string()
                }
            });

        ApiError::Rejected {
            status,
            title,
            message,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Credential store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Credential store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt credential store: {0}")]
    Corrupt(#[from] serde_json::Error),
}
