// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scan input sources.
//!
//! The pipeline only sees decoded payloads. A camera integration pushes them
//! through a [`ScanSender`]; keyboard-wedge hardware scanners are read from a
//! byte stream with [`LineScanSource`].

use crate::models::ScanEvent;
use std::future::Future;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

/// Source of decoded scan payloads.
pub trait ScanSource: Send {
    /// Next decoded payload, or `None` once the source is closed.
    fn next_scan(&mut self) -> impl Future<Output = Option<ScanEvent>> + Send;

    /// Stop decoding while a submission or result is on screen.
    fn pause(&mut self) {}

    /// Resume decoding.
    fn resume(&mut self) {}
}

// ─── Channel source ──────────────────────────────────────────────────────────

/// Create a channel-backed source and its sending half.
pub fn channel(capacity: usize) -> (ScanSender, ChannelScanSource) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        ScanSender { tx },
        ChannelScanSource {
            rx,
            paused: false,
        },
    )
}

/// Sending half used by a camera decoder callback.
#[derive(Clone)]
pub struct ScanSender {
    tx: mpsc::Sender<ScanEvent>,
}

impl ScanSender {
    /// Queue a decoded payload. Returns false once the session is gone.
    pub async fn send(&self, payload: impl AsRef<str>) -> bool {
        self.tx.send(ScanEvent::new(payload)).await.is_ok()
    }

    /// Queue without waiting; drops the scan when the buffer is full.
    pub fn try_send(&self, payload: impl AsRef<str>) -> bool {
        self.tx.try_send(ScanEvent::new(payload)).is_ok()
    }
}

/// Receiving half. Scans that arrive while paused are discarded on resume,
/// the way a paused camera decoder never sees those frames.
pub struct ChannelScanSource {
    rx: mpsc::Receiver<ScanEvent>,
    paused: bool,
}

impl ScanSource for ChannelScanSource {
    async fn next_scan(&mut self) -> Option<ScanEvent> {
        self.rx.recv().await
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;

        let mut dropped = 0usize;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            tracing::debug!(dropped, "Discarded scans received while paused");
        }
    }
}

// ─── Keyboard-wedge source ───────────────────────────────────────────────────

/// Reassembles payloads typed by a keyboard-wedge scanner.
///
/// The scanner "types" the payload followed by Enter. CR, LF and CRLF all end
/// a payload; blank lines are skipped.
#[derive(Debug, Default)]
pub struct WedgeDecoder {
    buf: Vec<u8>,
}

impl WedgeDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte; returns a payload when a line is complete.
    pub fn push(&mut self, byte: u8) -> Option<String> {
        if byte != b'\n' && byte != b'\r' {
            self.buf.push(byte);
            return None;
        }

        let line = String::from_utf8_lossy(&self.buf).trim().to_string();
        self.buf.clear();
        (!line.is_empty()).then_some(line)
    }

    /// Whatever was typed after the last Enter.
    pub fn flush(&mut self) -> Option<String> {
        let line = String::from_utf8_lossy(&self.buf).trim().to_string();
        self.buf.clear();
        (!line.is_empty()).then_some(line)
    }
}

/// Reads scanner payloads from a byte stream such as stdin.
///
/// Bytes typed while paused stay in the stream and are processed after
/// resume; repeats of the same code are still caught by the deduplicator.
pub struct LineScanSource<R> {
    reader: R,
    decoder: WedgeDecoder,
    pending: std::collections::VecDeque<String>,
    eof: bool,
}

impl<R: AsyncRead + Unpin + Send> LineScanSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            decoder: WedgeDecoder::new(),
            pending: std::collections::VecDeque::new(),
            eof: false,
        }
    }
}

impl<R: AsyncRead + Unpin + Send> ScanSource for LineScanSource<R> {
    async fn next_scan(&mut self) -> Option<ScanEvent> {
        let mut chunk = [0u8; 256];

        loop {
            if let Some(line) = self.pending.pop_front() {
                return Some(ScanEvent::new(line));
            }
            if self.eof {
                return None;
            }

            match self.reader.read(&mut chunk).await {
                Ok(0) => {
                    self.eof = true;
                    if let Some(line) = self.decoder.flush() {
                        self.pending.push_back(line);
                    }
                }
                Ok(n) => {
                    for &byte in &chunk[..n] {
                        if let Some(line) = self.decoder.push(byte) {
                            self.pending.push_back(line);
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Scanner input failed");
                    self.eof = true;
                }
            }
        }
    }
}
