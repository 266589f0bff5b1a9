#![warn(missing_docs)]
//! # trapshield-ui
//!
//! ## Purpose
//! Defines the display model TrapShield front ends render: verdict banner,
//! risk gauge, findings lists, progress and failure panels.
//!
//! ## Responsibilities
//! - Project a validated report into display-safe strings and bands.
//! - Clamp the risk score for the gauge (validation does not).
//! - Provide the cosmetic progress step ticker shown while a scan runs.
//! - Render a screen as plain text for terminal front ends.
//!
//! ## Data flow
//! Scan controller state -> [`Screen`] (built by the app) -> [`Screen::render_text`].
//!
//! ## Ownership and lifetimes
//! View types own their strings so a front end can keep a screen after the
//! controller state moves on.
//!
//! ## Error model
//! Projection is total; there is nothing to fail.
//!
//! ## Security and privacy notes
//! Screens show provider output only; no credentials reach this crate.

use std::time::Duration;

use trapshield_report::{AnalysisReport, Verdict};

/// Progress title while the automatic current-tab scan runs.
pub const AUTOMATIC_SCAN_TITLE: &str = "Analyzing Current Tab...";

/// Progress title while a manual scan runs.
pub const MANUAL_SCAN_TITLE: &str = "Analysis in Progress";

/// Failure panel heading.
pub const FAILURE_TITLE: &str = "Analysis Failed";

/// Cosmetic steps cycled while waiting for the provider.
pub const ANALYSIS_STEPS: [&str; 7] = [
    "Initializing scan...",
    "Parsing content...",
    "Analyzing semantics with NLP models...",
    "Checking domain reputation...",
    "Querying threat intelligence databases...",
    "Scanning for structural anomalies...",
    "Compiling report...",
];

/// Interval between progress steps.
pub const STEP_INTERVAL: Duration = Duration::from_millis(1500);

/// Visual tone of a verdict or band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Green.
    Positive,
    /// Yellow.
    Caution,
    /// Red.
    Danger,
}

/// Gauge band derived from the display score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskBand {
    /// Score 0..=40.
    Low,
    /// Score 41..=75.
    Medium,
    /// Score 76..=100.
    High,
}

impl RiskBand {
    /// Tone used to draw the gauge.
    pub fn tone(self) -> Tone {
        match self {
            RiskBand::Low => Tone::Positive,
            RiskBand::Medium => Tone::Caution,
            RiskBand::High => Tone::Danger,
        }
    }
}

/// Clamps a provider score into the gauge range.
pub fn display_score(risk_score: i64) -> u8 {
    // Clamped into 0..=100, so the narrowing cast is lossless.
    risk_score.clamp(0, 100) as u8
}

/// Maps a display score to its gauge band.
pub fn risk_band(score: u8) -> RiskBand {
    match score {
        0..=40 => RiskBand::Low,
        41..=75 => RiskBand::Medium,
        _ => RiskBand::High,
    }
}

/// Verdict heading shown above the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerdictBanner {
    /// Heading text.
    pub title: &'static str,
    /// Heading tone.
    pub tone: Tone,
}

/// Returns the banner for a verdict.
pub fn verdict_banner(verdict: Verdict) -> VerdictBanner {
    match verdict {
        Verdict::Safe => VerdictBanner {
            title: "Content is Safe",
            tone: Tone::Positive,
        },
        Verdict::Suspicious => VerdictBanner {
            title: "Content is Suspicious",
            tone: Tone::Caution,
        },
        Verdict::Malicious => VerdictBanner {
            title: "Content is Malicious",
            tone: Tone::Danger,
        },
    }
}

/// Cycles through [`ANALYSIS_STEPS`]. Carries no scan state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressTicker {
    step: usize,
}

impl ProgressTicker {
    /// Starts at the first step.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current step text.
    pub fn current(&self) -> &'static str {
        ANALYSIS_STEPS[self.step]
    }

    /// Moves to the next step, wrapping around.
    pub fn advance(&mut self) -> &'static str {
        self.step = (self.step + 1) % ANALYSIS_STEPS.len();
        self.current()
    }
}

/// Display projection of one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportView {
    /// Verdict heading.
    pub banner: VerdictBanner,
    /// One-sentence summary.
    pub summary: String,
    /// Gauge score in [0, 100].
    pub score: u8,
    /// Gauge band.
    pub band: RiskBand,
    /// Sentiment label.
    pub sentiment: String,
    /// Whether urgency was detected.
    pub urgency_detected: bool,
    /// Suspicious phrases.
    pub suspicious_phrases: Vec<String>,
    /// Grammar or style issues.
    pub grammar_issues: Vec<String>,
    /// Simulated domain age.
    pub domain_age: String,
    /// Simulated certificate status.
    pub ssl_certificate: String,
    /// URL red flags.
    pub red_flags: Vec<String>,
}

impl ReportView {
    /// Projects a validated report.
    pub fn from_report(report: &AnalysisReport) -> Self {
        let score = display_score(report.risk_score);
        Self {
            banner: verdict_banner(report.verdict),
            summary: report.summary.clone(),
            score,
            band: risk_band(score),
            sentiment: report.textual_analysis.sentiment.clone(),
            urgency_detected: report.textual_analysis.urgency_detected,
            suspicious_phrases: report.textual_analysis.suspicious_phrases.clone(),
            grammar_issues: report.textual_analysis.grammar_issues.clone(),
            domain_age: report.url_analysis.domain_age.clone(),
            ssl_certificate: report.url_analysis.ssl_certificate.clone(),
            red_flags: report.url_analysis.red_flags.clone(),
        }
    }

    /// Renders the report as plain text. Empty lists are omitted.
    pub fn render_text(&self) -> String {
        let urgency = if self.urgency_detected { "Yes" } else { "No" };
        let mut lines = vec![
            self.banner.title.to_string(),
            self.summary.clone(),
            String::new(),
            format!("Overall Risk Score: {} / 100", self.score),
            String::new(),
            "Textual Analysis".to_string(),
            format!("  Sentiment: {}", self.sentiment),
            format!("  Urgency Detected: {urgency}"),
        ];
        push_list(&mut lines, "Suspicious Phrases", &self.suspicious_phrases);
        push_list(&mut lines, "Grammar/Style Issues", &self.grammar_issues);
        lines.extend([
            String::new(),
            "URL & Domain Analysis".to_string(),
            format!("  Simulated Domain Age: {}", self.domain_age),
            format!("  Simulated SSL Certificate: {}", self.ssl_certificate),
        ]);
        push_list(&mut lines, "Red Flags", &self.red_flags);
        join_lines(&lines)
    }
}

fn push_list(lines: &mut Vec<String>, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    lines.push(format!("  {heading}:"));
    lines.extend(items.iter().map(|item| format!("    - {item}")));
}

/// Joins lines with a trailing newline after each one.
fn join_lines(lines: &[String]) -> String {
    lines.iter().map(|line| format!("{line}\n")).collect()
}

/// Progress panel content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressPanel {
    /// Panel heading.
    pub title: &'static str,
    /// Cosmetic step text.
    pub step: &'static str,
}

/// Everything a front end draws for one controller state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Screen {
    /// Whether the manual input form is shown.
    pub show_input: bool,
    /// Whether the input form is disabled (a scan is running).
    pub input_locked: bool,
    /// Progress panel, shown only while scanning.
    pub progress: Option<ProgressPanel>,
    /// Failure message, shown only after a failed scan.
    pub failure: Option<String>,
    /// Report, shown only after a successful scan.
    pub report: Option<ReportView>,
}

impl Screen {
    /// Renders the visible panels as plain text.
    pub fn render_text(&self) -> String {
        let mut lines = Vec::new();
        if let Some(progress) = &self.progress {
            lines.push(progress.title.to_string());
            lines.push(progress.step.to_string());
        }
        if let Some(message) = &self.failure {
            lines.push(FAILURE_TITLE.to_string());
            lines.push(message.clone());
        }
        let mut out = join_lines(&lines);
        if let Some(report) = &self.report {
            out.push_str(&report.render_text());
        }
        out
    }
}
