// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scan screen state machine.
//!
//! ```text
//! Idle -> Scanning -> Submitting -> ResultShown -> Scanning ...
//!            |            |
//!            +------------+--> Unauthenticated (terminal)
//! ```
//!
//! `abort` returns any non-terminal state to `Idle`.
//!
//! Pure state only; [`super::session::ScanSession`] performs the I/O.

use super::dedup::ScanDeduplicator;
use crate::models::{CheckInRequest, CheckInResult, ScanEvent, SessionContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    /// Scanner not active yet.
    Idle,
    /// Accepting scans.
    Scanning,
    /// One request in flight; input paused.
    Submitting(CheckInRequest),
    /// Result on screen until the operator dismisses it; input paused.
    ResultShown(CheckInResult),
    /// Credential gone; the operator must log in again.
    Unauthenticated,
}

impl ScanState {
    /// Whether the input source should be decoding.
    pub fn accepts_input(&self) -> bool {
        matches!(self, ScanState::Scanning)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScanState::Idle => "idle",
            ScanState::Scanning => "scanning",
            ScanState::Submitting(_) => "submitting",
            ScanState::ResultShown(_) => "result_shown",
            ScanState::Unauthenticated => "unauthenticated",
        }
    }
}

/// Rejected transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} while {state}")]
pub struct TransitionError {
    pub action: &'static str,
    pub state: &'static str,
}

/// Why a scan did not start a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    Blank,
    Duplicate,
    /// Input arrived while not `Scanning`.
    Paused,
}

/// State of one scan session (one mounted scan screen).
#[derive(Debug)]
pub struct ScanMachine {
    context: SessionContext,
    state: ScanState,
    dedup: ScanDeduplicator,
}

impl ScanMachine {
    pub fn new(context: SessionContext) -> Self {
        Self {
            context,
            state: ScanState::Idle,
            dedup: ScanDeduplicator::new(),
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Activate the scanner. A fresh session forgets the previous last scan.
    pub fn start(&mut self) -> Result<(), TransitionError> {
        match self.state {
            ScanState::Idle => {
                self.dedup.reset();
                self.state = ScanState::Scanning;
                Ok(())
            }
            _ => Err(self.invalid("start")),
        }
    }

    /// Feed a decoded scan. Returns the request to send if it was accepted.
    pub fn on_scan(&mut self, scan: &ScanEvent) -> Result<CheckInRequest, Ignored> {
        if !self.state.accepts_input() {
            return Err(Ignored::Paused);
        }
        if scan.is_blank() {
            return Err(Ignored::Blank);
        }
        if !self.dedup.accept(&scan.raw_payload) {
            return Err(Ignored::Duplicate);
        }

        let request = CheckInRequest::from_scan(scan, &self.context);
        self.state = ScanState::Submitting(request.clone());
        Ok(request)
    }

    /// The in-flight submission produced a result.
    pub fn on_result(&mut self, result: CheckInResult) -> Result<(), TransitionError> {
        match self.state {
            ScanState::Submitting(_) => {
                self.state = ScanState::ResultShown(result);
                Ok(())
            }
            _ => Err(self.invalid("show a result")),
        }
    }

    /// The operator closed the result dialog.
    pub fn dismiss(&mut self) -> Result<(), TransitionError> {
        match self.state {
            ScanState::ResultShown(_) => {
                self.state = ScanState::Scanning;
                Ok(())
            }
            _ => Err(self.invalid("dismiss")),
        }
    }

    /// The token cache reported the credential unavailable.
    pub fn on_unauthenticated(&mut self) -> Result<(), TransitionError> {
        match self.state {
            ScanState::Scanning | ScanState::Submitting(_) => {
                self.state = ScanState::Unauthenticated;
                Ok(())
            }
            ScanState::Unauthenticated => Ok(()),
            _ => Err(self.invalid("end the session")),
        }
    }

    /// The scan screen went away. Any in-flight request or shown result is
    /// dropped and the next `start` begins a fresh session.
    pub fn abort(&mut self) {
        if self.state != ScanState::Unauthenticated {
            self.state = ScanState::Idle;
        }
    }

    fn invalid(&self, action: &'static str) -> TransitionError {
        TransitionError {
            action,
            state: self.state.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CheckInMode, FailureKind};

    fn machine() -> ScanMachine {
        ScanMachine::new(SessionContext {
            event_code: "EV".into(),
            session_code: "EV-01".into(),
            mode: CheckInMode::Online,
        })
    }

    fn ok_result() -> CheckInResult {
        CheckInResult::Success {
            registrant_name: "Jane Doe".into(),
            status: "active".into(),
            registered_by: None,
        }
    }

    #[test]
    fn test_full_cycle() {
        let mut m = machine();
        assert_eq!(m.state(), &ScanState::Idle);
        assert_eq!(m.on_scan(&ScanEvent::new("A")), Err(Ignored::Paused));

        m.start().unwrap();
        let req = m.on_scan(&ScanEvent::new("A")).unwrap();
        assert_eq!(req.community_id, "A");
        assert!(matches!(m.state(), ScanState::Submitting(_)));

        m.on_result(ok_result()).unwrap();
        assert!(matches!(m.state(), ScanState::ResultShown(_)));

        m.dismiss().unwrap();
        assert_eq!(m.state(), &ScanState::Scanning);
    }

    #[test]
    fn test_input_ignored_while_busy() {
        let mut m = machine();
        m.start().unwrap();
        m.on_scan(&ScanEvent::new("A")).unwrap();

        assert_eq!(m.on_scan(&ScanEvent::new("B")), Err(Ignored::Paused));

        m.on_result(ok_result()).unwrap();
        assert_eq!(m.on_scan(&ScanEvent::new("B")), Err(Ignored::Paused));
    }

    #[test]
    fn test_duplicate_and_blank() {
        let mut m = machine();
        m.start().unwrap();
        assert_eq!(m.on_scan(&ScanEvent::new("  ")), Err(Ignored::Blank));

        m.on_scan(&ScanEvent::new("A")).unwrap();
        m.on_result(ok_result()).unwrap();
        m.dismiss().unwrap();

        assert_eq!(m.on_scan(&ScanEvent::new("A")), Err(Ignored::Duplicate));
        assert!(m.on_scan(&ScanEvent::new("B")).is_ok());
    }

    #[test]
    fn test_failure_leaves_dedup_marker() {
        let mut m = machine();
        m.start().unwrap();
        m.on_scan(&ScanEvent::new("A")).unwrap();
        m.on_result(CheckInResult::Failure {
            kind: FailureKind::Rejected(409),
            title: None,
            message: "Already registered".into(),
        })
        .unwrap();
        m.dismiss().unwrap();

        assert!(m.on_scan(&ScanEvent::new("C")).is_ok());
    }

    #[test]
    fn test_unauthenticated_is_terminal() {
        let mut m = machine();
        m.start().unwrap();
        m.on_scan(&ScanEvent::new("A")).unwrap();
        m.on_unauthenticated().unwrap();

        assert_eq!(m.state(), &ScanState::Unauthenticated);
        assert_eq!(m.on_scan(&ScanEvent::new("B")), Err(Ignored::Paused));
        assert!(m.start().is_err());
        assert!(m.dismiss().is_err());
        assert!(m.on_result(ok_result()).is_err());
    }

    #[test]
    fn test_abort_allows_restart() {
        let mut m = machine();
        m.start().unwrap();
        m.on_scan(&ScanEvent::new("A")).unwrap();

        m.abort();
        assert_eq!(m.state(), &ScanState::Idle);
        m.start().unwrap();
        assert!(m.on_scan(&ScanEvent::new("A")).is_ok());

        m.on_unauthenticated().unwrap();
        m.abort();
        assert_eq!(m.state(), &ScanState::Unauthenticated);
    }

    #[test]
    fn test_invalid_transition_message() {
        let mut m = machine();
        let err = m.dismiss().unwrap_err();
        assert_eq!(err.to_string(), "cannot dismiss while idle");
    }
}
