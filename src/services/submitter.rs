// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Check-in submission: one API call per accepted scan, plus at most one
//! resend after re-authenticating on 401.

use crate::error::ApiError;
use crate::models::{AccessToken, CheckInRequest, CheckInResult, FailureKind};
use crate::services::api::ApiClient;
use crate::services::token_cache::TokenCache;

/// Result of a single attempt with a given token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    Completed(CheckInResult),
    /// The API rejected the token (401).
    CredentialRejected,
}

/// Result of a full submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Completed(CheckInResult),
    /// No usable credential; the operator must log in again.
    Unauthenticated,
}

/// Sends check-in requests using tokens from the shared cache.
#[derive(Clone)]
pub struct CheckInSubmitter {
    api: ApiClient,
    tokens: TokenCache,
}

impl CheckInSubmitter {
    pub fn new(api: ApiClient, tokens: TokenCache) -> Self {
        Self { api, tokens }
    }

    /// Submit a check-in, re-authenticating once if the token is rejected.
    pub async fn submit(&self, request: &CheckInRequest) -> Submission {
        if let Err(message) = request.validate() {
            return Submission::Completed(CheckInResult::Failure {
                kind: FailureKind::InvalidRequest,
                title: None,
                message,
            });
        }

        let token = match self.tokens.get_valid_access_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "No access token for check-in");
                return Submission::Unauthenticated;
            }
        };

        match self.submit_with_token(request, &token).await {
            Attempt::Completed(result) => return Submission::Completed(result),
            Attempt::CredentialRejected => {
                tracing::info!(
                    community_id = %request.community_id,
                    "Access token rejected, re-authenticating once"
                );
            }
        }

        let token = match self.tokens.refresh_after_rejection(&token).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Re-authentication failed");
                return Submission::Unauthenticated;
            }
        };

        match self.submit_with_token(request, &token).await {
            Attempt::Completed(result) => Submission::Completed(result),
            Attempt::CredentialRejected => {
                tracing::warn!("Fresh access token rejected again, ending session");
                self.tokens.invalidate().await;
                Submission::Unauthenticated
            }
        }
    }

    /// Send one request with `token` and classify the response.
    pub async fn submit_with_token(&self, request: &CheckInRequest, token: &AccessToken) -> Attempt {
        tracing::debug!(
            community_id = %request.community_id,
            event_code = %request.event_code,
            session_code = %request.session_code,
            "Sending check-in"
        );

        let result = match self.api.register(token, request).await {
            Ok(response) => CheckInResult::Success {
                registrant_name: response.name.unwrap_or_default(),
                status: response.status.unwrap_or_default(),
                registered_by: response.registered_by,
            },
            Err(ApiError::Unauthorized) => return Attempt::CredentialRejected,
            Err(e) => failure_from(e),
        };

        match &result {
            CheckInResult::Success {
                registrant_name, ..
            } => tracing::info!(
                community_id = %request.community_id,
                registrant = %registrant_name,
                "Check-in succeeded"
            ),
            CheckInResult::Failure { kind, message, .. } => tracing::warn!(
                community_id = %request.community_id,
                kind = ?kind,
                message = %message,
                "Check-in failed"
            ),
        }

        Attempt::Completed(result)
    }
}

fn failure_from(err: ApiError) -> CheckInResult {
    let (kind, title, message) = match err {
        ApiError::Rejected {
            status,
            title,
            message,
        } => (FailureKind::Rejected(status), title, message),
        ApiError::Timeout(_) => (
            FailureKind::Timeout,
            None,
            "The server took too long to answer. Scan again to retry.".to_string(),
        ),
        ApiError::Network(e) => (
            FailureKind::Network,
            None,
            format!("Error while connecting to the API: {}", e),
        ),
        ApiError::InvalidResponse(e) => (FailureKind::InvalidResponse, None, e),
        ApiError::Unauthorized => (
            FailureKind::Rejected(401),
            None,
            "Access token rejected".to_string(),
        ),
        ApiError::LoginRejected(message) => (FailureKind::Rejected(401), None, message),
    };

    CheckInResult::Failure {
        kind,
        title,
        message,
    }
}
