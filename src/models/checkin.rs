// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scan and check-in models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A payload decoded by the camera or a hardware scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    pub raw_payload: String,
    pub decoded_at: DateTime<Utc>,
}

impl ScanEvent {
    /// Create a scan event stamped with the current time. The payload is trimmed.
    pub fn new(raw_payload: impl AsRef<str>) -> Self {
        Self {
            raw_payload: raw_payload.as_ref().trim().to_string(),
            decoded_at: Utc::now(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.raw_payload.is_empty()
    }
}

/// Whether the registrant attends in person or remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckInMode {
    #[default]
    Online,
    Offline,
}

/// Event session a scanner is checking people into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub event_code: String,
    pub session_code: String,
    pub mode: CheckInMode,
}

/// Body of `POST /api/v2/events/registration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub community_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub event_code: String,
    #[serde(rename = "instanceCode")]
    pub session_code: String,
    #[serde(rename = "registerAt")]
    pub requested_at: DateTime<Utc>,
    pub mode: CheckInMode,
}

impl CheckInRequest {
    /// Build the request for an accepted scan.
    ///
    /// Personal QR codes carry the community id. Older printed badges carry
    /// `accountNumber+identifier+name`; the account number is the community id.
    pub fn from_scan(scan: &ScanEvent, context: &SessionContext) -> Self {
        let (community_id, name) = match scan.raw_payload.split_once('+') {
            None => (scan.raw_payload.clone(), None),
            Some((account, rest)) => {
                let name = rest
                    .split_once('+')
                    .map(|(_identifier, name)| name.trim())
                    .filter(|name| !name.is_empty())
                    .map(str::to_string);
                (account.trim().to_string(), name)
            }
        };

        Self {
            community_id,
            name,
            event_code: context.event_code.clone(),
            session_code: context.session_code.clone(),
            requested_at: Utc::now(),
            mode: context.mode,
        }
    }

    /// Reject requests the API could never accept.
    pub fn validate(&self) -> Result<(), String> {
        if self.community_id.trim().is_empty() {
            return Err("Scanned code has no community id".to_string());
        }
        if self.event_code.trim().is_empty() {
            return Err("No event selected".to_string());
        }
        if self.session_code.trim().is_empty() {
            return Err("No session selected".to_string());
        }
        Ok(())
    }
}

/// Why a check-in did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The API answered with this non-2xx status
    Rejected(u16),
    Network,
    Timeout,
    InvalidResponse,
    /// The request was never sent
    InvalidRequest,
}

/// Outcome of one check-in, shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInResult {
    Success {
        registrant_name: String,
        status: String,
        registered_by: Option<String>,
    },
    Failure {
        kind: FailureKind,
        title: Option<String>,
        message: String,
    },
}

impl CheckInResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CheckInResult::Success { .. })
    }

    /// Dialog title.
    pub fn title(&self) -> &str {
        match self {
            CheckInResult::Success { .. } => "Success!",
            CheckInResult::Failure {
                title: Some(title), ..
            } => title,
            CheckInResult::Failure {
                kind: FailureKind::Network | FailureKind::Timeout,
                ..
            } => "Connection problem",
            CheckInResult::Failure { .. } => "Error",
        }
    }

    /// Dialog body.
    pub fn description(&self) -> String {
        match self {
            CheckInResult::Success {
                registrant_name,
                status,
                ..
            } => match (registrant_name.is_empty(), status.is_empty()) {
                (true, _) => "User verified.".to_string(),
                (false, true) => format!("{} verified", registrant_name),
                (false, false) => format!("{} verified ({})", registrant_name, status),
            },
            CheckInResult::Failure { message, .. } => message.clone(),
        }
    }
}
