//! Scan controller state machine.
//!
//! Phases run `Idle -> DetectingEnvironment -> Scanning -> Settled`, then
//! `Settled -> Scanning` for every accepted manual trigger. Entering a busy
//! phase is a single check-and-set on the watch sender, so at most one scan is
//! in flight even when triggers race on a shared controller.
//!
//! A busy phase is left even when the caller drops the scan future (a timeout,
//! a losing `select!` branch): `SettleGuard` settles the state on drop.

use tokio::sync::watch;
use tracing::{debug, info, warn};
use trapshield_client::{AnalysisClient, AnalysisKind};
use trapshield_report::AnalysisReport;

use crate::host::{HostEnvironment, is_analyzable_url};
use crate::redact_sensitive;

/// What started a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanTrigger {
    /// Start-up scan of the host's active tab.
    Automatic,
    /// Consumer-requested scan.
    Manual,
}

/// How the last scan (or start-up) ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No automatic scan was possible; waiting for manual input.
    AwaitingInput,
    /// Report available.
    Success,
    /// Error message available.
    Failed,
}

/// Controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanPhase {
    /// Nothing decided yet.
    #[default]
    Idle,
    /// Asking the host for an active tab URL.
    DetectingEnvironment,
    /// Analysis call in flight.
    Scanning(ScanTrigger),
    /// Waiting for the next manual trigger.
    Settled(Outcome),
}

impl ScanPhase {
    /// Returns `true` while triggers and edits must be rejected.
    pub fn is_busy(self) -> bool {
        matches!(self, ScanPhase::DetectingEnvironment | ScanPhase::Scanning(_))
    }
}

/// Observable controller state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanState {
    /// Current phase.
    pub phase: ScanPhase,
    /// Selected analysis kind.
    pub kind: AnalysisKind,
    /// Pending or last-scanned content.
    pub input: String,
    /// Report of the last successful scan.
    pub report: Option<AnalysisReport>,
    /// Message of the last failed scan.
    pub error: Option<String>,
}

/// Message stored when a scan future is dropped before the provider answers.
pub const SCAN_INTERRUPTED_MESSAGE: &str = "Analysis was interrupted before it completed.";

/// Settles a busy phase if dropped while still armed.
struct SettleGuard<'a> {
    state: &'a watch::Sender<ScanState>,
    outcome: Outcome,
    armed: bool,
}

impl<'a> SettleGuard<'a> {
    fn new(state: &'a watch::Sender<ScanState>, outcome: Outcome) -> Self {
        Self {
            state,
            outcome,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!(outcome = ?self.outcome, "busy phase abandoned; settling");
        let outcome = self.outcome;
        self.state.send_modify(|state| {
            state.phase = ScanPhase::Settled(outcome);
            state.report = None;
            state.error = match outcome {
                Outcome::Failed => Some(SCAN_INTERRUPTED_MESSAGE.to_string()),
                Outcome::AwaitingInput | Outcome::Success => None,
            };
        });
    }
}

fn begin_scan(state: &mut ScanState, trigger: ScanTrigger) {
    state.phase = ScanPhase::Scanning(trigger);
    state.report = None;
    state.error = None;
}

/// Drives scans and publishes [`ScanState`] to subscribers.
pub struct ScanController {
    client: AnalysisClient,
    state: watch::Sender<ScanState>,
}

impl ScanController {
    /// Creates an idle controller.
    pub fn new(client: AnalysisClient) -> Self {
        let (state, _) = watch::channel(ScanState::default());
        Self { client, state }
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.state.subscribe()
    }

    /// Clones the current state.
    pub fn snapshot(&self) -> ScanState {
        self.state.borrow().clone()
    }

    /// Current phase.
    pub fn phase(&self) -> ScanPhase {
        self.state.borrow().phase
    }

    /// Runs the start-up sequence once.
    ///
    /// Scans the host's active tab when it exposes an http(s) URL; otherwise
    /// settles in [`Outcome::AwaitingInput`] without calling the client. Only
    /// acts from [`ScanPhase::Idle`].
    pub async fn start_automatic_scan(&self, host: &dyn HostEnvironment) -> ScanPhase {
        let claimed = self.state.send_if_modified(|state| {
            if state.phase != ScanPhase::Idle {
                return false;
            }
            state.phase = ScanPhase::DetectingEnvironment;
            true
        });
        if !claimed {
            debug!(phase = ?self.phase(), "automatic scan already decided");
            return self.phase();
        }

        let detecting = SettleGuard::new(&self.state, Outcome::AwaitingInput);
        let candidate = host.active_tab_url().await;
        detecting.disarm();
        match candidate.filter(|url| is_analyzable_url(url)) {
            Some(url) => {
                info!("active tab is analyzable; starting automatic scan");
                self.state.send_modify(|state| {
                    state.kind = AnalysisKind::Url;
                    state.input = url.clone();
                    begin_scan(state, ScanTrigger::Automatic);
                });
                self.run_scan(AnalysisKind::Url, url).await;
            }
            None => {
                info!("no analyzable active tab; awaiting manual input");
                self.state.send_modify(|state| {
                    state.phase = ScanPhase::Settled(Outcome::AwaitingInput);
                    state.report = None;
                    state.error = None;
                });
            }
        }

        self.phase()
    }

    /// Scans `content` as `kind`.
    ///
    /// Returns `false` without doing anything while a scan or detection is in
    /// progress, or when `content` is blank.
    pub async fn request_manual_scan(&self, kind: AnalysisKind, content: impl Into<String>) -> bool {
        let content = content.into();
        let accepted = self.state.send_if_modified(|state| {
            if state.phase.is_busy() || content.trim().is_empty() {
                return false;
            }
            state.kind = kind;
            state.input = content.clone();
            begin_scan(state, ScanTrigger::Manual);
            true
        });
        if !accepted {
            debug!("manual scan request ignored");
            return false;
        }

        self.run_scan(kind, content).await;
        true
    }

    /// Scans the current input as the current kind. Same preconditions as
    /// [`ScanController::request_manual_scan`].
    pub async fn trigger_scan(&self) -> bool {
        let mut request = None;
        self.state.send_if_modified(|state| {
            if state.phase.is_busy() || state.input.trim().is_empty() {
                return false;
            }
            request = Some((state.kind, state.input.clone()));
            begin_scan(state, ScanTrigger::Manual);
            true
        });

        let Some((kind, content)) = request else {
            debug!("manual trigger ignored");
            return false;
        };
        self.run_scan(kind, content).await;
        true
    }

    /// Switches the analysis kind, clearing input and error. Ignored while
    /// busy; the phase is left unchanged.
    pub fn select_kind(&self, kind: AnalysisKind) -> bool {
        self.state.send_if_modified(|state| {
            if state.phase.is_busy() {
                return false;
            }
            state.kind = kind;
            state.input.clear();
            state.error = None;
            true
        })
    }

    /// Replaces the pending input. Ignored while busy.
    pub fn set_input(&self, content: impl Into<String>) -> bool {
        let content = content.into();
        self.state.send_if_modified(|state| {
            if state.phase.is_busy() {
                return false;
            }
            state.input = content;
            true
        })
    }

    async fn run_scan(&self, kind: AnalysisKind, content: String) {
        let scanning = SettleGuard::new(&self.state, Outcome::Failed);
        let result = self.client.analyze(kind, &content).await;
        scanning.disarm();

        match result {
            Ok(report) => {
                info!(verdict = %report.verdict, "scan settled with report");
                self.state.send_modify(|state| {
                    state.phase = ScanPhase::Settled(Outcome::Success);
                    state.report = Some(report);
                    state.error = None;
                });
            }
            Err(error) => {
                warn!(error = %redact_sensitive(&error.to_string()), "scan failed");
                self.state.send_modify(|state| {
                    state.phase = ScanPhase::Settled(Outcome::Failed);
                    state.report = None;
                    state.error = Some(error.user_message());
                });
            }
        }
    }
}
