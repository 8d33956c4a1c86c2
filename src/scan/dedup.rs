// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Duplicate scan suppression.
//!
//! Camera decoders report the same code on every frame while it stays in
//! view. Only the last accepted payload is remembered, with no time window;
//! a new scan session starts with an empty marker.

#[derive(Debug, Default)]
pub struct ScanDeduplicator {
    last_accepted: Option<String>,
}

impl ScanDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `payload` should be processed.
    pub fn accept(&mut self, payload: &str) -> bool {
        if self.last_accepted.as_deref() == Some(payload) {
            return false;
        }
        self.last_accepted = Some(payload.to_string());
        true
    }

    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}
