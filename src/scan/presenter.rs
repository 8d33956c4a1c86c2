// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Terminal result display for the kiosk.

use super::session::ResultPresenter;
use crate::models::{CheckInRequest, CheckInResult};
use std::io::Write;
use std::time::Duration;

/// Prints each result and holds it on screen for a fixed time, which stands
/// in for the operator pressing OK.
pub struct TerminalPresenter<W> {
    out: W,
    hold: Duration,
}

impl<W: Write + Send> TerminalPresenter<W> {
    pub fn new(out: W, hold: Duration) -> Self {
        Self { out, hold }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn print(&mut self, text: std::fmt::Arguments<'_>) {
        if let Err(e) = self.out.write_fmt(text).and_then(|_| self.out.flush()) {
            tracing::warn!(error = %e, "Failed to write to terminal");
        }
    }
}

impl<W: Write + Send> ResultPresenter for TerminalPresenter<W> {
    async fn show_result(&mut self, result: &CheckInResult) {
        let marker = if result.is_success() { "OK " } else { "ERR" };
        self.print(format_args!(
            "[{}] {}: {}\n",
            marker,
            result.title(),
            result.description()
        ));
        tokio::time::sleep(self.hold).await;
    }

    fn show_submitting(&mut self, request: &CheckInRequest) {
        self.print(format_args!("... checking in {}\n", request.community_id));
    }

    fn session_expired(&mut self) {
        self.print(format_args!(
            "Session expired! Your session has expired. Please log in again.\n"
        ));
    }
}
