//! Ingest command handler.
//!
//! Recreates a knowledge base from documents and prints a report.

use super::TargetArgs;
use clap::Args;
use docent_core::{config::AppConfig, AppResult};
use docent_knowledge::{create_pipeline, DocumentOutcome, IngestionReport, ProgressEvent, ProgressReporter};
use std::path::PathBuf;
use std::sync::Arc;

/// Ingest documents into a knowledge base
#[derive(Args, Debug)]
pub struct IngestCommand {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Files or directories (.pdf, .txt, .md) to ingest
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Suppress progress lines
    #[arg(short, long)]
    pub quiet: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let target = self.target.resolve(config)?;
        tracing::info!(
            "Executing ingest command for index '{}' ({} paths)",
            target.index_name,
            self.paths.len()
        );

        let progress = if self.quiet {
            ProgressReporter::noop()
        } else {
            ProgressReporter::new(Arc::new(|event: ProgressEvent| eprintln!("{}", event.format_simple())))
        };

        let report = create_pipeline(config, progress)?
            .ingest(&self.paths, &target.index_name)
            .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&report);
        }

        Ok(())
    }
}

fn print_report(report: &IngestionReport) {
    for document in &report.documents {
        match &document.outcome {
            DocumentOutcome::Ingested {
                chunks,
                indexed,
                failed,
            } => {
                let failures = if *failed > 0 {
                    format!(", {} failed", failed)
                } else {
                    String::new()
                };
                println!(
                    "  ok    {} ({}/{} chunks indexed{})",
                    document.path.display(),
                    indexed,
                    chunks,
                    failures
                );
            }
            DocumentOutcome::Skipped { reason } => {
                println!("  skip  {} ({})", document.path.display(), reason);
            }
        }
    }

    println!(
        "Ingested {} documents into '{}' ({} skipped): {} of {} chunks indexed, {} failed, in {:.2}s",
        report.documents_ingested,
        report.index_name,
        report.documents_skipped,
        report.chunks_indexed,
        report.chunks_produced,
        report.chunks_failed,
        report.elapsed_secs
    );
}
