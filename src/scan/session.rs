// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scan session driver: source -> dedup -> token -> submit -> present.
//!
//! Input is paused from the moment a scan is accepted until the operator
//! dismisses its result, so at most one check-in is in flight per session.

use super::machine::{Ignored, ScanMachine, ScanState, TransitionError};
use super::source::ScanSource;
use crate::models::{CheckInRequest, CheckInResult, SessionContext};
use crate::services::{CheckInSubmitter, Submission};
use std::future::Future;

/// Shows results to the operator.
pub trait ResultPresenter: Send {
    /// Display `result`; resolves when the operator dismisses it.
    fn show_result(&mut self, result: &CheckInResult) -> impl Future<Output = ()> + Send;

    /// A request is about to be sent.
    fn show_submitting(&mut self, _request: &CheckInRequest) {}

    /// The credential is gone; prompt the operator to log in again.
    fn session_expired(&mut self);
}

/// Why [`ScanSession::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The input source closed.
    SourceClosed,
    /// The screen was torn down; any in-flight response was discarded.
    Shutdown,
    /// The operator must log in again.
    Unauthenticated,
}

/// One scan session (one mounted scan screen).
pub struct ScanSession<P> {
    machine: ScanMachine,
    submitter: CheckInSubmitter,
    presenter: P,
}

impl<P: ResultPresenter> ScanSession<P> {
    pub fn new(context: SessionContext, submitter: CheckInSubmitter, presenter: P) -> Self {
        Self {
            machine: ScanMachine::new(context),
            submitter,
            presenter,
        }
    }

    pub fn state(&self) -> &ScanState {
        self.machine.state()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn into_presenter(self) -> P {
        self.presenter
    }

    /// Run until the source closes, `shutdown` resolves, or the credential
    /// becomes unavailable.
    pub async fn run<S, F>(&mut self, source: &mut S, shutdown: F) -> SessionEnd
    where
        S: ScanSource,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        match self.machine.state() {
            ScanState::Unauthenticated => return SessionEnd::Unauthenticated,
            ScanState::Idle => log_transition(self.machine.start()),
            _ => {}
        }

        let context = self.machine.context().clone();
        tracing::info!(
            event_code = %context.event_code,
            session_code = %context.session_code,
            "Scan session started"
        );

        loop {
            let scan = tokio::select! {
                _ = &mut shutdown => return self.shut_down(source),
                scan = source.next_scan() => scan,
            };

            let Some(scan) = scan else {
                tracing::info!("Scanner input closed");
                return SessionEnd::SourceClosed;
            };

            let request = match self.machine.on_scan(&scan) {
                Ok(request) => request,
                Err(Ignored::Duplicate) => {
                    tracing::debug!(payload = %scan.raw_payload, "Dropped duplicate scan");
                    continue;
                }
                Err(reason) => {
                    tracing::debug!(reason = ?reason, "Ignored scan");
                    continue;
                }
            };

            source.pause();
            self.presenter.show_submitting(&request);

            let submission = tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(
                        community_id = %request.community_id,
                        "Session closed with a check-in in flight, discarding response"
                    );
                    return self.shut_down(source);
                }
                submission = self.submitter.submit(&request) => submission,
            };

            let result = match submission {
                Submission::Completed(result) => result,
                Submission::Unauthenticated => {
                    log_transition(self.machine.on_unauthenticated());
                    self.presenter.session_expired();
                    tracing::warn!("Scan session ended: login required");
                    return SessionEnd::Unauthenticated;
                }
            };

            log_transition(self.machine.on_result(result.clone()));

            tokio::select! {
                _ = &mut shutdown => return self.shut_down(source),
                _ = self.presenter.show_result(&result) => {}
            }

            log_transition(self.machine.dismiss());
            source.resume();
        }
    }

    /// Leave the session re-enterable: machine back to `Idle`, input resumed.
    fn shut_down<S: ScanSource>(&mut self, source: &mut S) -> SessionEnd {
        self.machine.abort();
        source.resume();
        tracing::info!("Scan session stopped");
        SessionEnd::Shutdown
    }
}

fn log_transition(result: Result<(), TransitionError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Unexpected scan state transition");
    }
}
