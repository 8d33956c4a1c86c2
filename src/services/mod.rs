// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - API access and credential management.

pub mod api;
pub mod submitter;
pub mod token_cache;

pub use api::ApiClient;
pub use submitter::{Attempt, CheckInSubmitter, Submission};
pub use token_cache::{TokenCache, Unavailable};
