//! docintel application binary: composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Resolve the backend URL (CLI > DOCINTEL_API_URL > config > default)
//! 3. Build the HTTP backend and the document session controller
//! 4. Upload the document given on the command line, if any
//! 5. Run the interactive question loop on stdin

mod cli;
mod command;
mod render;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use docintel_chat::{DispatchOutcome, SkipReason};
use docintel_client::{HttpBackend, InferenceBackend};
use docintel_core::config::DocIntelConfig;
use docintel_core::types::ActiveView;
use docintel_extract::ExtractionOutcome;
use docintel_session::DocumentSessionController;

use cli::CliArgs;
use command::Command;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = DocIntelConfig::load_or_default(&config_file).apply_env_overrides();
    if let Some(url) = &args.api_url {
        config.backend.base_url = url.clone();
    }

    // Tracing.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting docintel v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Backend.
    let backend = HttpBackend::new(config.backend.clone())?;
    tracing::info!(
        base_url = %backend.base_url(),
        timeout_secs = config.backend.timeout_secs,
        "Backend client ready"
    );
    let controller = DocumentSessionController::new(Arc::new(backend) as Arc<dyn InferenceBackend>);

    if let Some(path) = &args.document {
        upload(&controller, path).await;
    } else {
        println!("No document loaded. Use /upload <path> to start.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Empty => {}
            Command::Quit => break,
            Command::Help => println!("{}", command::HELP),
            Command::Unknown(input) => println!("Unknown command: {} (try /help)", input),
            Command::Upload(path) => upload(&controller, &path).await,
            Command::Ask(question) => {
                controller.set_draft(question);
                let outcome = controller.submit_draft().await;
                print_outcome(&controller, outcome);
            }
            Command::Suggest(n) => match controller.ask_suggestion(n - 1).await {
                Some(outcome) => print_outcome(&controller, outcome),
                None => println!("No suggestion #{}", n),
            },
            Command::Suggestions => {
                println!("{}", render::suggestions(&controller.suggested_questions()));
            }
            Command::Extract => {
                controller.set_view(ActiveView::Extraction);
                if let ExtractionOutcome::Skipped(reason) = controller.run_extraction().await {
                    tracing::debug!(?reason, "Extraction skipped");
                    println!("Upload a document first.");
                }
                println!("{}", render::extraction(&controller.extraction_state()));
            }
            Command::View(None) => show_view(&controller),
            Command::View(Some(view)) => {
                controller.set_view(view);
                show_view(&controller);
            }
        }
    }

    tracing::info!("docintel shutting down");
    Ok(())
}

async fn upload(controller: &DocumentSessionController, path: &std::path::Path) {
    match controller.upload_path(path).await {
        Ok(session) => {
            println!("{}", render::session_header(&session));
            println!("{}", render::suggestions(&session.suggested_questions));
        }
        Err(err) => {
            tracing::debug!(error = %err, "Upload did not complete");
            if let Some(message) = controller.upload_error() {
                println!("Upload error: {}", message);
            }
        }
    }
}

fn print_outcome(controller: &DocumentSessionController, outcome: DispatchOutcome) {
    match outcome {
        DispatchOutcome::Skipped(SkipReason::NoDocument) => println!("Upload a document first."),
        DispatchOutcome::Skipped(SkipReason::Busy) => println!("Still waiting for an answer."),
        DispatchOutcome::Skipped(SkipReason::EmptyQuestion) => {}
        DispatchOutcome::Discarded { .. } => {}
        DispatchOutcome::Answered { .. } | DispatchOutcome::Failed { .. } => {
            if let Some(last) = controller.pairs().last() {
                println!("{}", render::pair(last));
            }
        }
    }
}

fn show_view(controller: &DocumentSessionController) {
    match controller.active_view() {
        ActiveView::Conversation => {
            let pairs = controller.pairs();
            if pairs.is_empty() {
                println!("Ready to analyze. Ask a question or pick a suggestion.");
            }
            for pair in &pairs {
                println!("{}\n", render::pair(pair));
            }
        }
        ActiveView::Extraction => {
            println!("{}", render::extraction(&controller.extraction_state()));
        }
    }
}
