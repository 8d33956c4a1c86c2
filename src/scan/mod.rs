// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scan-to-check-in pipeline.

pub mod dedup;
pub mod machine;
pub mod presenter;
pub mod session;
pub mod source;

pub use dedup::ScanDeduplicator;
pub use machine::{Ignored, ScanMachine, ScanState, TransitionError};
pub use presenter::TerminalPresenter;
pub use session::{ResultPresenter, ScanSession, SessionEnd};
pub use source::{channel, ChannelScanSource, LineScanSource, ScanSender, ScanSource, WedgeDecoder};
