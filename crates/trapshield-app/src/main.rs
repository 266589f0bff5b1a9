#![warn(missing_docs)]
//! # trapshield binary
//!
//! Terminal front end: scans the host's active tab, or one URL/text given on
//! the command line, and prints the rendered report.

use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use trapshield_app::{
    AppConfig, AppError, EnvHostEnvironment, Outcome, ScanController, ScanPhase, app_version,
    init_logging, project_screen,
};
use trapshield_client::{AnalysisClient, AnalysisKind};
use trapshield_ui::{AUTOMATIC_SCAN_TITLE, MANUAL_SCAN_TITLE, ProgressTicker, STEP_INTERVAL};

/// Exit code when nothing could be scanned.
const EXIT_NOTHING_TO_SCAN: u8 = 2;

#[derive(Parser)]
#[command(
    name = "trapshield",
    version = trapshield_app::APP_VERSION,
    about = "Phishing-risk scanner backed by a generative-AI provider",
    long_about = "Scans a URL or a block of text for phishing risk.\n\nWithout CONTENT, the active tab URL from TRAPSHIELD_ACTIVE_URL is scanned automatically.\nThe provider credential is read from TRAPSHIELD_API_KEY (or API_KEY)."
)]
/// Command-line options.
struct Cli {
    /// Treat CONTENT as free text (for example an email body) instead of a URL.
    #[arg(long)]
    text: bool,
    /// URL or text to scan.
    content: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("trapshield: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, AppError> {
    let config = AppConfig::from_env()?;
    init_logging(&config.log)?;
    let client = AnalysisClient::gemini(config.provider)?;
    info!(version = app_version(), model = client.model_name(), "trapshield starting");

    let controller = ScanController::new(client);
    match cli.content {
        Some(content) => {
            let kind = if cli.text {
                AnalysisKind::Text
            } else {
                AnalysisKind::Url
            };
            let accepted =
                with_progress(MANUAL_SCAN_TITLE, controller.request_manual_scan(kind, content))
                    .await;
            if !accepted {
                eprintln!("Nothing to analyze: content is empty.");
                return Ok(ExitCode::from(EXIT_NOTHING_TO_SCAN));
            }
        }
        None => {
            with_progress(
                AUTOMATIC_SCAN_TITLE,
                controller.start_automatic_scan(&EnvHostEnvironment),
            )
            .await;
        }
    }

    let state = controller.snapshot();
    print!("{}", project_screen(&state, &ProgressTicker::new()).render_text());

    Ok(match state.phase {
        ScanPhase::Settled(Outcome::Success) => ExitCode::SUCCESS,
        ScanPhase::Settled(Outcome::AwaitingInput) => {
            eprintln!(
                "No analyzable active tab. Pass a URL, or --text with content, to scan manually."
            );
            ExitCode::from(EXIT_NOTHING_TO_SCAN)
        }
        _ => ExitCode::FAILURE,
    })
}

/// Prints cosmetic progress steps to stderr until `scan` completes.
async fn with_progress<F: Future>(title: &str, scan: F) -> F::Output {
    let mut ticker = ProgressTicker::new();
    let mut interval = tokio::time::interval(STEP_INTERVAL);
    tokio::pin!(scan);

    eprintln!("{title}");
    loop {
        tokio::select! {
            output = &mut scan => return output,
            _ = interval.tick() => {
                eprintln!("  {}", ticker.current());
                ticker.advance();
            }
        }
    }
}
