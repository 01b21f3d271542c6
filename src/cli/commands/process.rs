//! Request processing command.

use std::path::Path;
use std::sync::Arc;

use console::style;
use tokio::sync::mpsc;

use crate::cli::helpers::{read_json, success, warning};
use crate::config::Settings;
use crate::models::{DocumentDescriptor, DocumentUrls, RequestFields};
use crate::services::{extract_document_urls, ProcessEvent};

/// Process one request and print the record (or summary) as JSON on stdout.
pub async fn cmd_process(
    settings: &Settings,
    request_path: &Path,
    descriptors_path: &Path,
    urls_path: Option<&Path>,
    summary: bool,
    progress: bool,
) -> anyhow::Result<()> {
    let request: RequestFields = read_json(request_path).await?;
    let descriptors: Vec<DocumentDescriptor> = read_json(descriptors_path).await?;
    let urls: DocumentUrls = match urls_path {
        Some(path) => read_json(path).await?,
        None => extract_document_urls(&request, &settings.accepted_hosts),
    };

    tracing::info!(
        descriptors = descriptors.len(),
        attached = urls.len(),
        "Processing request"
    );

    let extractor = Arc::new(settings.text_extractor());
    let mut orchestrator = settings.orchestrator(extractor);

    let printer = if progress {
        let (tx, rx) = mpsc::channel(64);
        orchestrator = orchestrator.with_events(tx);
        Some(tokio::spawn(print_events(rx)))
    } else {
        None
    };

    let result = orchestrator
        .process_with_summary(&request, &descriptors, &urls)
        .await;

    // Dropping the orchestrator closes the event channel
    drop(orchestrator);
    if let Some(printer) = printer {
        let _ = printer.await;
    }

    let json = if summary {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string_pretty(&result.record)?
    };
    println!("{}", json);

    if result.emergency {
        eprintln!(
            "{} Processing failed unexpectedly; every document needs manual review",
            warning()
        );
    } else if progress {
        eprintln!(
            "{} Processed in {} ms",
            success(),
            style(result.duration_ms).cyan()
        );
    }

    Ok(())
}

async fn print_events(mut rx: mpsc::Receiver<ProcessEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            ProcessEvent::TierStarted { tier, documents } => {
                eprintln!(
                    "{} Tier {} ({} documents)",
                    style("→").dim(),
                    tier,
                    documents
                );
            }
            ProcessEvent::DocumentCompleted {
                doc_type, status, ..
            } => {
                let status = if status == crate::models::status::VALID_DOCUMENT {
                    style(status).green()
                } else {
                    style(status).yellow()
                };
                eprintln!("  {:<20} {}", doc_type.as_str(), status);
            }
            ProcessEvent::TierTimedOut { tier, pending } => {
                let names: Vec<&str> = pending.iter().map(|t| t.as_str()).collect();
                eprintln!(
                    "{} Tier {} timed out: {}",
                    warning(),
                    tier,
                    names.join(", ")
                );
            }
            ProcessEvent::TierCompleted { .. } => {}
            ProcessEvent::RecordRepaired { fields } => {
                eprintln!(
                    "{} Repaired {} field(s) of the output record",
                    warning(),
                    fields.len()
                );
            }
        }
    }
}
