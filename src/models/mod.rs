// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the check-in pipeline.

pub mod checkin;
pub mod credential;

pub use checkin::{
    CheckInMode, CheckInRequest, CheckInResult, FailureKind, ScanEvent, SessionContext,
};
pub use credential::{AccessToken, Credential, StoredSession, TokenEntry, TokenSetError};
