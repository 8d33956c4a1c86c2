// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Check-in kiosk
//!
//! Reads a keyboard-wedge barcode/QR scanner on stdin and checks each
//! scanned badge into one event session.

use anyhow::Context;
use clap::Parser;
use scan_checkin::{
    config::Config,
    models::{CheckInMode, SessionContext},
    scan::{LineScanSource, ScanSession, SessionEnd, TerminalPresenter},
    store::FileCredentialStore,
    AppState,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Check badges into an event session from a hardware scanner.
#[derive(Debug, Parser)]
#[command(name = "checkin-kiosk", version)]
struct Args {
    /// Event code, e.g. HB-001
    event_code: String,

    /// Session (instance) code, e.g. HB-001-01
    session_code: String,

    /// Register attendees as attending remotely
    #[arg(long)]
    offline: bool,

    /// Log in with this identifier before scanning
    #[arg(long, value_name = "IDENTIFIER")]
    login: Option<String>,

    /// Password for --login
    #[arg(long, env = "CHECKIN_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize structured JSON logging
    init_logging();

    let args = Args::parse();

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(api = %config.api_base_url, "Starting check-in kiosk");

    let store = Arc::new(FileCredentialStore::new(&config.credential_path));
    let state = AppState::new(config.clone(), store).context("Failed to build API client")?;

    if let Some(identifier) = &args.login {
        let password = args
            .password
            .as_deref()
            .context("--login requires CHECKIN_PASSWORD or --password")?;
        state
            .tokens
            .login(identifier, password)
            .await
            .context("Login failed")?;
    }

    if !state.tokens.is_logged_in().await {
        anyhow::bail!("Not logged in; run with --login <identifier>");
    }

    let context = SessionContext {
        event_code: args.event_code,
        session_code: args.session_code,
        mode: if args.offline {
            CheckInMode::Offline
        } else {
            CheckInMode::Online
        },
    };

    println!(
        "QR Scanner for event {} session {}. Scan a badge (Ctrl-C to quit).",
        context.event_code, context.session_code
    );

    let presenter = TerminalPresenter::new(std::io::stdout(), config.dialog_hold);
    let mut session = ScanSession::new(context, state.submitter.clone(), presenter);
    let mut source = LineScanSource::new(tokio::io::stdin());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    let end = session.run(&mut source, shutdown).await;
    tracing::info!(end = ?end, "Scan session finished");

    // Distinct status so a wrapper script can prompt for a new login.
    if end == SessionEnd::Unauthenticated {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("scan_checkin=debug,info")),
        )
        .with(format)
        .init();
}
