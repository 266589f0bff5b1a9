#![warn(missing_docs)]
//! # trapshield-app
//!
//! ## Purpose
//! Orchestrates TrapShield scans: start-up detection, automatic and manual
//! scans, and the state the presentation layer observes.
//!
//! ## Responsibilities
//! - Run the scan state machine ([`ScanController`]).
//! - Abstract the host's tab inspection ([`HostEnvironment`]).
//! - Load configuration and install logging.
//! - Project controller state into a [`Screen`].
//!
//! ## Data flow
//! Host environment -> [`ScanController::start_automatic_scan`] ->
//! analysis client -> [`ScanState`] watch channel -> [`project_screen`].
//!
//! ## Ownership and lifetimes
//! The controller owns its state; consumers receive clones through the watch
//! channel and never hold references into it.
//!
//! ## Error model
//! Scan failures never escape the controller: they become a `Failed` phase and
//! a message. Start-up failures (configuration, credential, logging) are
//! wrapped in [`AppError`] for the binary.
//!
//! ## Security and privacy notes
//! - Credentials come from configuration and are passed explicitly.
//! - Log detail strings pass through [`redact_sensitive`].
//! - Analysed content is never logged.

mod config;
mod controller;
mod host;
mod logging;

use thiserror::Error;
use trapshield_client::ClientError;
use trapshield_ui::{
    AUTOMATIC_SCAN_TITLE, MANUAL_SCAN_TITLE, ProgressPanel, ProgressTicker, ReportView, Screen,
};

pub use config::{
    API_KEY_ENV, AppConfig, ConfigError, ENDPOINT_ENV, LEGACY_API_KEY_ENV, LOG_FILTER_ENV,
    LOG_FORMAT_ENV, MODEL_ENV, REQUEST_TIMEOUT_ENV,
};
pub use controller::{
    Outcome, SCAN_INTERRUPTED_MESSAGE, ScanController, ScanPhase, ScanState, ScanTrigger,
};
pub use host::{
    ACTIVE_URL_ENV, EnvHostEnvironment, FixedHostEnvironment, HostEnvironment, NoHostEnvironment,
    is_analyzable_url,
};
pub use logging::{LogConfig, LogError, LogFormat, init_logging};

/// Build-time application version loaded from root `VERSION`.
pub const APP_VERSION: &str = env!("TRAPSHIELD_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Projects controller state into the panels a front end draws.
///
/// The input form appears once start-up has settled; the progress panel
/// only while a scan or detection runs.
pub fn project_screen(state: &ScanState, ticker: &ProgressTicker) -> Screen {
    let progress_title = match state.phase {
        ScanPhase::DetectingEnvironment | ScanPhase::Scanning(ScanTrigger::Automatic) => {
            Some(AUTOMATIC_SCAN_TITLE)
        }
        ScanPhase::Scanning(ScanTrigger::Manual) => Some(MANUAL_SCAN_TITLE),
        ScanPhase::Idle | ScanPhase::Settled(_) => None,
    };

    Screen {
        show_input: matches!(
            state.phase,
            ScanPhase::Settled(_) | ScanPhase::Scanning(ScanTrigger::Manual)
        ),
        input_locked: state.phase.is_busy(),
        progress: progress_title.map(|title| ProgressPanel {
            title,
            step: ticker.current(),
        }),
        failure: state.error.clone(),
        report: state.report.as_ref().map(ReportView::from_report),
    }
}

/// Redacts common secret markers in log-safe output.
///
/// Everything from the first marker onwards is replaced.
pub fn redact_sensitive(input: &str) -> String {
    const MARKERS: [&str; 7] = [
        "api_key",
        "api-key",
        "key=",
        "password",
        "token",
        "authorization",
        "bearer",
    ];

    let lower = input.to_ascii_lowercase();
    let first = MARKERS
        .iter()
        .filter_map(|marker| lower.find(marker).map(|position| (position, *marker)))
        .min_by_key(|(position, _)| *position);

    match first {
        Some((position, marker)) => {
            let label = marker.trim_end_matches('=');
            format!("{}{label}=<redacted>", &input[..position])
        }
        None => input.to_string(),
    }
}

/// Start-up errors surfaced by the binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be read.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Analysis client could not be built.
    #[error("client error: {0}")]
    Client(#[from] ClientError),
    /// Logging could not be installed.
    #[error("logging error: {0}")]
    Log(#[from] LogError),
}
