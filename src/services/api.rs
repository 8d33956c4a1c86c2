// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the external registration/user API.
//!
//! Handles:
//! - Login and token refresh
//! - Check-in (registration) requests
//! - Status classification (401 is reported separately so callers can re-auth)

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{AccessToken, CheckInRequest, TokenEntry};
use serde::Deserialize;

const LOGIN_PATH: &str = "/api/v2/users/login";
const REFRESH_PATH: &str = "/api/v2/users/refresh";
const REGISTRATION_PATH: &str = "/api/v2/events/registration";

const API_KEY_HEADER: &str = "X-API-Key";

/// Registration/user API client.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    /// Create a client; every request is bounded by `config.request_timeout`.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("failed building HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Log in with an identifier (email or phone) and password.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = serde_json::json!({
            "identifier": identifier,
            "password": password,
        });

        let response = self
            .http
            .post(self.url(LOGIN_PATH))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        // A 401 here means bad credentials, not a stale bearer token.
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            let body = read_error_body(response).await;
            let message = match ApiError::from_error_body(401, &body) {
                ApiError::Rejected { message, .. } if message != "HTTP 401" => message,
                _ => "invalid identifier or password".to_string(),
            };
            return Err(ApiError::LoginRejected(message));
        }

        self.check_response_json(response).await
    }

    /// Exchange a refresh token for a new token set.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenSetResponse, ApiError> {
        let body = serde_json::json!({ "refreshToken": refresh_token });

        let response = self
            .http
            .post(self.url(REFRESH_PATH))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        self.check_response_json(response).await
    }

    /// Send one check-in request.
    ///
    /// Any 2xx means the registration was committed, so an unreadable or
    /// partial body still yields a (possibly empty) response.
    pub async fn register(
        &self,
        access_token: &AccessToken,
        request: &CheckInRequest,
    ) -> Result<RegistrationResponse, ApiError> {
        let response = self
            .http
            .post(self.url(REGISTRATION_PATH))
            .bearer_auth(access_token.as_str())
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await?;

        let response = self.check_status(response).await?;
        let status = response.status().as_u16();

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(status, error = %e, "Failed reading check-in response body");
                return Ok(RegistrationResponse::default());
            }
        };

        Ok(serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            tracing::warn!(status, error = %e, "Unexpected check-in response body");
            RegistrationResponse::default()
        }))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map 401 and other non-2xx responses to errors.
    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let body = read_error_body(response).await;
            tracing::debug!(status = status.as_u16(), "API request rejected");
            return Err(ApiError::from_error_body(status.as_u16(), &body));
        }

        Ok(response)
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = self.check_status(response).await?;

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::InvalidResponse(format!("JSON parse error: {}", e)))
    }
}

/// Body of an error response; empty if it could not be read.
async fn read_error_body(response: reqwest::Response) -> String {
    let status = response.status().as_u16();
    match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(status, error = %e, "Failed reading error response body");
            String::new()
        }
    }
}

/// Token set returned by `/users/refresh`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenSetResponse {
    pub tokens: Vec<TokenEntry>,
}

/// Login response: the token set plus the user's profile fields.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub tokens: Vec<TokenEntry>,
    #[serde(flatten)]
    pub profile: serde_json::Map<String, serde_json::Value>,
}

/// Successful check-in response. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationResponse {
    pub name: Option<String>,
    pub status: Option<String>,
    pub registered_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let config = Config {
            api_base_url: "http://localhost:3000/".to_string(),
            ..Config::default()
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.url(REFRESH_PATH), "http://localhost:3000/api/v2/users/refresh");
    }

    #[test]
    fn test_login_response_splits_profile() {
        let json = r#"{"name":"Usher","email":"u@example.org","tokens":[{"type":"accessToken","token":"a"}]}"#;
        let parsed: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.tokens.len(), 1);
        assert_eq!(parsed.profile["name"], "Usher");
        assert!(!parsed.profile.contains_key("tokens"));
    }

    #[tokio::test]
    async fn test_truncated_error_body_falls_back_to_status() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            // Promise more body than is sent, then hang up.
            socket
                .write_all(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 200\r\n\r\n{\"mess")
                .await
                .unwrap();
        });

        let config = Config {
            api_base_url: format!("http://{}", addr),
            ..Config::default()
        };
        let client = ApiClient::new(&config).unwrap();

        let err = client.refresh_token("ref").await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Rejected { status: 503, ref message, .. } if message == "HTTP 503"
        ));
    }

    #[test]
    fn test_registration_response_tolerates_missing_fields() {
        let parsed: RegistrationResponse =
            serde_json::from_str(r#"{"name":"Jane Doe","status":null}"#).unwrap();
        assert_eq!(parsed.name.as_deref(), Some("Jane Doe"));
        assert_eq!(parsed.status, None);

        let parsed: RegistrationResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.name.is_none() && parsed.registered_by.is_none());
    }
}
