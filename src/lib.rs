// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scan-Checkin: QR/barcode check-in for community events
//!
//! This crate turns decoded badge scans into check-in requests against the
//! event registration API, keeping the operator's access token fresh and
//! serializing submissions per scan session.

pub mod config;
pub mod error;
pub mod models;
pub mod scan;
pub mod services;
pub mod store;

use config::Config;
use error::ApiError;
use services::{ApiClient, CheckInSubmitter, TokenCache};
use std::sync::Arc;
use store::CredentialStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub api: ApiClient,
    pub tokens: TokenCache,
    pub submitter: CheckInSubmitter,
}

impl AppState {
    /// Wire the API client, token cache and submitter around one store.
    pub fn new(config: Config, store: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config)?;
        let tokens = TokenCache::new(api.clone(), store);
        let submitter = CheckInSubmitter::new(api.clone(), tokens.clone());

        Ok(Self {
            config,
            api,
            tokens,
            submitter,
        })
    }
}
