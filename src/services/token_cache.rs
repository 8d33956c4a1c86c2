// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access token cache with transparent refresh.
//!
//! The cache is the single owner of the credential. Every component that
//! talks to the API gets its bearer token from here.

use crate::error::ApiError;
use crate::models::{AccessToken, Credential, StoredSession};
use crate::services::api::ApiClient;
use crate::store::CredentialStore;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Margin before token expiration when we proactively refresh.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 30;

/// No usable access token. The session is over and the operator must log in
/// again; this is a signal, not a fault.
#[derive(Debug, thiserror::Error)]
pub enum Unavailable {
    #[error("not logged in")]
    NoCredential,

    #[error("token refresh failed: {0}")]
    RefreshFailed(#[source] ApiError),
}

/// Shared access token cache.
///
/// Cloning is cheap; clones share the same credential and refresh lock.
#[derive(Clone)]
pub struct TokenCache {
    api: ApiClient,
    store: Arc<dyn CredentialStore>,
    session: Arc<RwLock<Option<StoredSession>>>,
    /// Serializes refreshes so concurrent callers share one refresh call.
    refresh_lock: Arc<Mutex<()>>,
    margin: Duration,
}

impl TokenCache {
    /// Create a cache backed by `store`, loading any session already stored.
    pub fn new(api: ApiClient, store: Arc<dyn CredentialStore>) -> Self {
        let session = match store.load() {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable stored session");
                None
            }
        };

        if session.is_some() {
            tracing::info!("Restored stored session");
        }

        Self {
            api,
            store,
            session: Arc::new(RwLock::new(session)),
            refresh_lock: Arc::new(Mutex::new(())),
            margin: Duration::seconds(TOKEN_REFRESH_MARGIN_SECS),
        }
    }

    pub async fn is_logged_in(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// User profile returned at login.
    pub async fn profile(&self) -> Option<serde_json::Value> {
        self.session.read().await.as_ref().map(|s| s.profile.clone())
    }

    /// Snapshot of the current credential.
    pub async fn credential(&self) -> Option<Credential> {
        self.session.read().await.as_ref().map(|s| s.credential.clone())
    }

    /// Log in and replace any stored session.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<(), ApiError> {
        let response = self.api.login(identifier, password).await?;
        let credential = Credential::from_token_set(&response.tokens, None)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        let session = StoredSession {
            credential,
            profile: serde_json::Value::Object(response.profile),
        };

        let _guard = self.refresh_lock.lock().await;
        if let Err(e) = self.store.save(&session) {
            tracing::warn!(error = %e, "Failed to persist session, continuing anyway");
        }
        *self.session.write().await = Some(session);

        tracing::info!("Logged in");
        Ok(())
    }

    /// Forget the credential (logout).
    pub async fn invalidate(&self) {
        let _guard = self.refresh_lock.lock().await;
        self.clear().await;
        tracing::info!("Session invalidated");
    }

    /// Get a valid (non-expired) access token, refreshing if needed.
    ///
    /// 1. Fresh cached token: return it without I/O.
    /// 2. Otherwise take the refresh lock and re-check; another task may
    ///    have refreshed (or given up) while we waited.
    /// 3. Still stale: exactly one refresh call.
    pub async fn get_valid_access_token(&self) -> Result<AccessToken, Unavailable> {
        if let Some(token) = self.fresh_token().await {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;

        if let Some(token) = self.fresh_token().await {
            return Ok(token);
        }

        self.refresh_locked().await
    }

    /// Get a replacement for a token the API just rejected with 401.
    ///
    /// If another task already swapped the rejected token out, its
    /// replacement is returned without another refresh.
    pub async fn refresh_after_rejection(
        &self,
        rejected: &AccessToken,
    ) -> Result<AccessToken, Unavailable> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(token) = self.fresh_token().await {
            if &token != rejected {
                return Ok(token);
            }
        }

        self.refresh_locked().await
    }

    async fn fresh_token(&self) -> Option<AccessToken> {
        let now = Utc::now();
        self.session
            .read()
            .await
            .as_ref()
            .filter(|s| s.credential.is_fresh(now, self.margin))
            .map(|s| s.credential.access_token())
    }

    /// Refresh the credential. Caller must hold `refresh_lock`.
    async fn refresh_locked(&self) -> Result<AccessToken, Unavailable> {
        let Some(current) = self.session.read().await.clone() else {
            return Err(Unavailable::NoCredential);
        };

        tracing::info!("Access token expired, refreshing");

        let result = self
            .api
            .refresh_token(&current.credential.refresh_token)
            .await
            .and_then(|response| {
                Credential::from_token_set(
                    &response.tokens,
                    Some(&current.credential.refresh_token),
                )
                .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            });

        let credential = match result {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, ending session");
                self.clear().await;
                return Err(Unavailable::RefreshFailed(e));
            }
        };

        let token = credential.access_token();
        let session = StoredSession {
            credential,
            profile: current.profile,
        };

        if let Err(e) = self.store.save(&session) {
            tracing::warn!(error = %e, "Failed to persist refreshed session, continuing anyway");
        }
        *self.session.write().await = Some(session);

        tracing::info!("Token refreshed and cached");
        Ok(token)
    }

    async fn clear(&self) {
        *self.session.write().await = None;
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to clear stored session");
        }
    }
}
