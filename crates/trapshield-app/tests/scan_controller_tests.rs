//! Integration tests for scan controller transitions.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{Reply, SAFE_REPORT, ScriptedProvider, client_for, safe_report_value};
use tokio::sync::Notify;
use trapshield_app::{
    FixedHostEnvironment, HostEnvironment, NoHostEnvironment, Outcome, SCAN_INTERRUPTED_MESSAGE,
    ScanController, ScanPhase, ScanTrigger,
};
use trapshield_client::{AnalysisKind, PROVIDER_FAILURE_MESSAGE};
use trapshield_report::validate;

#[tokio::test]
async fn scan_controller_tests_absent_host_awaits_manual_input() {
    let provider = ScriptedProvider::new(vec![Reply::Text(SAFE_REPORT)]);
    let controller = ScanController::new(client_for(&provider));

    let phase = controller.start_automatic_scan(&NoHostEnvironment).await;

    assert_eq!(phase, ScanPhase::Settled(Outcome::AwaitingInput));
    let state = controller.snapshot();
    assert!(state.report.is_none());
    assert!(state.error.is_none());
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn scan_controller_tests_internal_page_is_not_scanned() {
    let provider = ScriptedProvider::new(vec![Reply::Text(SAFE_REPORT)]);
    let controller = ScanController::new(client_for(&provider));

    let phase = controller
        .start_automatic_scan(&FixedHostEnvironment::new("chrome://newtab/"))
        .await;

    assert_eq!(phase, ScanPhase::Settled(Outcome::AwaitingInput));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn scan_controller_tests_automatic_scan_of_active_tab() {
    let gate = Arc::new(Notify::new());
    let provider = ScriptedProvider::gated(vec![Reply::Text(SAFE_REPORT)], gate.clone());
    let controller = ScanController::new(client_for(&provider));
    let mut updates = controller.subscribe();
    let host = FixedHostEnvironment::new("https://example.com");

    let observe = async {
        let scanning = updates
            .wait_for(|state| matches!(state.phase, ScanPhase::Scanning(_)))
            .await
            .expect("controller alive")
            .clone();
        gate.notify_one();
        scanning
    };
    let (phase, scanning) = tokio::join!(controller.start_automatic_scan(&host), observe);

    assert_eq!(scanning.phase, ScanPhase::Scanning(ScanTrigger::Automatic));
    assert_eq!(scanning.kind, AnalysisKind::Url);
    assert_eq!(scanning.input, "https://example.com");

    assert_eq!(phase, ScanPhase::Settled(Outcome::Success));
    let state = controller.snapshot();
    let expected = validate(&safe_report_value()).expect("fixture is valid");
    assert_eq!(state.report, Some(expected));
    assert!(state.error.is_none());
}

#[tokio::test]
async fn scan_controller_tests_non_json_reply_fails_scan() {
    let provider = ScriptedProvider::new(vec![Reply::Text("not json")]);
    let controller = ScanController::new(client_for(&provider));

    controller
        .start_automatic_scan(&FixedHostEnvironment::new("https://example.com"))
        .await;

    let state = controller.snapshot();
    assert_eq!(state.phase, ScanPhase::Settled(Outcome::Failed));
    assert_eq!(state.error.as_deref(), Some(PROVIDER_FAILURE_MESSAGE));
    assert!(state.report.is_none());
}

#[tokio::test]
async fn scan_controller_tests_automatic_scan_runs_once() {
    let provider = ScriptedProvider::new(vec![Reply::Text(SAFE_REPORT)]);
    let controller = ScanController::new(client_for(&provider));
    let host = FixedHostEnvironment::new("https://example.com");

    controller.start_automatic_scan(&host).await;
    let phase = controller.start_automatic_scan(&host).await;

    assert_eq!(phase, ScanPhase::Settled(Outcome::Success));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn scan_controller_tests_manual_trigger_ignored_while_scanning() {
    let gate = Arc::new(Notify::new());
    let provider = ScriptedProvider::gated(vec![Reply::Text(SAFE_REPORT)], gate.clone());
    let controller = ScanController::new(client_for(&provider));
    controller.start_automatic_scan(&NoHostEnvironment).await;
    let mut updates = controller.subscribe();

    let competing = async {
        updates
            .wait_for(|state| matches!(state.phase, ScanPhase::Scanning(_)))
            .await
            .expect("controller alive");
        let second = controller
            .request_manual_scan(AnalysisKind::Text, "second message")
            .await;
        let retrigger = controller.trigger_scan().await;
        let kind_switched = controller.select_kind(AnalysisKind::Url);
        let edited = controller.set_input("edited while scanning");
        gate.notify_one();
        (second, retrigger, kind_switched, edited)
    };
    let (first, (second, retrigger, kind_switched, edited)) = tokio::join!(
        controller.request_manual_scan(AnalysisKind::Text, "first message"),
        competing
    );

    assert!(first);
    assert!(!second);
    assert!(!retrigger);
    assert!(!kind_switched);
    assert!(!edited);
    assert_eq!(provider.calls(), 1);

    let state = controller.snapshot();
    assert_eq!(state.phase, ScanPhase::Settled(Outcome::Success));
    assert_eq!(state.kind, AnalysisKind::Text);
    assert_eq!(state.input, "first message");
}

#[tokio::test]
async fn scan_controller_tests_blank_manual_request_is_noop() {
    let provider = ScriptedProvider::new(vec![Reply::Text(SAFE_REPORT)]);
    let controller = ScanController::new(client_for(&provider));
    controller.start_automatic_scan(&NoHostEnvironment).await;

    assert!(!controller.request_manual_scan(AnalysisKind::Url, "   ").await);
    assert!(!controller.trigger_scan().await);
    assert_eq!(
        controller.phase(),
        ScanPhase::Settled(Outcome::AwaitingInput)
    );
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn scan_controller_tests_select_kind_resets_input_and_error() {
    let provider = ScriptedProvider::new(vec![Reply::Status(503)]);
    let controller = ScanController::new(client_for(&provider));
    controller.start_automatic_scan(&NoHostEnvironment).await;

    assert!(
        controller
            .request_manual_scan(AnalysisKind::Url, "https://bad.example")
            .await
    );
    assert_eq!(controller.phase(), ScanPhase::Settled(Outcome::Failed));
    assert!(controller.snapshot().error.is_some());

    assert!(controller.select_kind(AnalysisKind::Text));

    let state = controller.snapshot();
    assert_eq!(state.kind, AnalysisKind::Text);
    assert_eq!(state.input, "");
    assert!(state.error.is_none());
    assert_eq!(state.phase, ScanPhase::Settled(Outcome::Failed));
}

#[tokio::test]
async fn scan_controller_tests_failure_clears_previous_report() {
    let provider = ScriptedProvider::new(vec![Reply::Text(SAFE_REPORT), Reply::Status(429)]);
    let controller = ScanController::new(client_for(&provider));
    controller.start_automatic_scan(&NoHostEnvironment).await;

    controller
        .request_manual_scan(AnalysisKind::Url, "https://example.com")
        .await;
    assert!(controller.snapshot().report.is_some());

    controller.set_input("https://example.org");
    assert!(controller.trigger_scan().await);

    let state = controller.snapshot();
    assert_eq!(state.phase, ScanPhase::Settled(Outcome::Failed));
    assert!(state.report.is_none());
    assert_eq!(state.error.as_deref(), Some(PROVIDER_FAILURE_MESSAGE));
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn scan_controller_tests_success_clears_previous_error() {
    let provider = ScriptedProvider::new(vec![Reply::Text("{}"), Reply::Text(SAFE_REPORT)]);
    let controller = ScanController::new(client_for(&provider));
    controller.start_automatic_scan(&NoHostEnvironment).await;

    controller
        .request_manual_scan(AnalysisKind::Text, "Click here to claim your prize")
        .await;
    assert!(controller.snapshot().error.is_some());

    controller
        .request_manual_scan(AnalysisKind::Text, "Click here to claim your prize")
        .await;

    let state = controller.snapshot();
    assert_eq!(state.phase, ScanPhase::Settled(Outcome::Success));
    assert!(state.error.is_none());
    assert!(state.report.is_some());
}

/// Host whose tab lookup never finishes.
struct StalledHost;

#[async_trait]
impl HostEnvironment for StalledHost {
    async fn active_tab_url(&self) -> Option<String> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn scan_controller_tests_dropped_scan_accepts_next_trigger() {
    let gate = Arc::new(Notify::new());
    let provider = ScriptedProvider::gated(vec![Reply::Text(SAFE_REPORT)], gate.clone());
    let controller = ScanController::new(client_for(&provider));
    controller.start_automatic_scan(&NoHostEnvironment).await;

    let first = tokio::time::timeout(
        Duration::from_millis(50),
        controller.request_manual_scan(AnalysisKind::Url, "https://a.example"),
    )
    .await;
    assert!(first.is_err(), "gated scan should time out");

    let state = controller.snapshot();
    assert_eq!(state.phase, ScanPhase::Settled(Outcome::Failed));
    assert_eq!(state.error.as_deref(), Some(SCAN_INTERRUPTED_MESSAGE));
    assert!(state.report.is_none());

    gate.notify_one();
    assert!(
        controller
            .request_manual_scan(AnalysisKind::Url, "https://b.example")
            .await
    );
    assert_eq!(controller.phase(), ScanPhase::Settled(Outcome::Success));
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn scan_controller_tests_dropped_detection_awaits_input() {
    let provider = ScriptedProvider::new(vec![Reply::Text(SAFE_REPORT)]);
    let controller = ScanController::new(client_for(&provider));

    let detection = tokio::time::timeout(
        Duration::from_millis(50),
        controller.start_automatic_scan(&StalledHost),
    )
    .await;
    assert!(detection.is_err(), "stalled host should time out");

    let state = controller.snapshot();
    assert_eq!(state.phase, ScanPhase::Settled(Outcome::AwaitingInput));
    assert!(state.error.is_none());

    assert!(
        controller
            .request_manual_scan(AnalysisKind::Text, "Claim your prize now")
            .await
    );
    assert_eq!(provider.calls(), 1);
}
