// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable storage for the logged-in session.

pub mod file;

pub use file::FileCredentialStore;

use crate::error::StoreError;
use crate::models::StoredSession;
use std::sync::Mutex;

/// Key-value style store holding at most one session.
pub trait CredentialStore: Send + Sync {
    /// Load the stored session, if any.
    fn load(&self) -> Result<Option<StoredSession>, StoreError>;

    /// Replace the stored session.
    fn save(&self, session: &StoredSession) -> Result<(), StoreError>;

    /// Remove the stored session. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), StoreError>;
}

/// In-memory store, used by tests and kiosks that must not persist tokens.
#[derive(Default)]
pub struct MemoryCredentialStore {
    session: Mutex<Option<StoredSession>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `session`.
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<StoredSession>, StoreError> {
        Ok(self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn save(&self, session: &StoredSession) -> Result<(), StoreError> {
        *self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}
