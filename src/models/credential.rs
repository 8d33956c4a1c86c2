// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential model: the access/refresh token pair and its persisted form.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const ACCESS_TOKEN_TYPE: &str = "accessToken";
const REFRESH_TOKEN_TYPE: &str = "refreshToken";

/// Bearer token handed to API calls. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Access/refresh token pair with the access token's expiry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("access_token_expires_at", &self.access_token_expires_at)
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

impl Credential {
    /// True if the access token can still be used at `now`, keeping `margin`
    /// in reserve before the recorded expiry.
    pub fn is_fresh(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now + margin < self.access_token_expires_at
    }

    pub fn access_token(&self) -> AccessToken {
        AccessToken::new(self.access_token.clone())
    }

    /// Build a credential from the `tokens` array returned by login/refresh.
    ///
    /// A refresh response may omit the refresh token when the server does not
    /// rotate it; `previous_refresh` is kept in that case.
    pub fn from_token_set(
        tokens: &[TokenEntry],
        previous_refresh: Option<&str>,
    ) -> Result<Self, TokenSetError> {
        let access = tokens
            .iter()
            .find(|t| t.kind == ACCESS_TOKEN_TYPE && !t.token.is_empty())
            .ok_or(TokenSetError::MissingAccessToken)?;

        let refresh_token = tokens
            .iter()
            .find(|t| t.kind == REFRESH_TOKEN_TYPE && !t.token.is_empty())
            .map(|t| t.token.clone())
            .or_else(|| previous_refresh.map(str::to_string))
            .ok_or(TokenSetError::MissingRefreshToken)?;

        let access_token_expires_at = access
            .expires_at
            .or_else(|| jwt_expiry(&access.token))
            .ok_or(TokenSetError::MissingExpiry)?;

        Ok(Self {
            access_token: access.token.clone(),
            access_token_expires_at,
            refresh_token,
        })
    }
}

/// One entry of the API's `tokens` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub token: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Epoch values above this are taken as milliseconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Accept an RFC 3339 string or epoch seconds/milliseconds. Anything else
/// reads as absent so one odd field cannot fail a whole token set.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match &value {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|epoch| {
                if epoch.abs() >= EPOCH_MILLIS_THRESHOLD {
                    DateTime::from_timestamp_millis(epoch)
                } else {
                    DateTime::from_timestamp(epoch, 0)
                }
            }),
        _ => None,
    };

    if parsed.is_none() && !value.is_null() {
        tracing::debug!(value = %value, "Ignoring unrecognized token expiry");
    }
    Ok(parsed)
}

/// Problems with a token set returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenSetError {
    #[error("token set has no access token")]
    MissingAccessToken,
    #[error("token set has no refresh token")]
    MissingRefreshToken,
    #[error("access token has no expiry")]
    MissingExpiry,
}

/// Logged-in session as persisted in the credential store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub credential: Credential,
    /// User profile returned by login (everything except the tokens)
    #[serde(default)]
    pub profile: serde_json::Value,
}

/// Read the `exp` claim from a JWT without verifying it.
pub fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    #[derive(Deserialize)]
    struct Claims {
        exp: i64,
    }

    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp, 0)
}
