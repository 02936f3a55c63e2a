mod config;
mod factory;
mod server;

use chrono::Utc;
use clap::Parser;
use config::{Cli, Command};
use factory::ServiceFactory;
use pdf_rag_core::{IngestionReport, PipelineFactory, RagService};
use server::{run_server, AppState};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let settings = cli.settings;

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        pdf_dir = %settings.pdf_dir.display(),
        vector_store = %settings.vector_store_path.display(),
        "pdf-rag-server boot"
    );
    if settings.groq_key.is_none() {
        warn!("GROQ_KEY is not set; questions will fail until it is provided");
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let addr = settings.bind_addr()?;
            let state = Arc::new(AppState {
                rag: RagService::new(ServiceFactory::new(settings.clone()), &settings.pdf_dir),
                static_dir: settings.static_dir.clone(),
            });
            run_server(state, addr).await?;
        }
        Command::Ingest { force } => {
            let pipeline = ServiceFactory::new(settings.clone()).create().await?;
            let report = if force {
                Some(pipeline.build(&settings.pdf_dir).await?)
            } else {
                pipeline.ensure_ingested(&settings.pdf_dir).await?
            };

            match report {
                Some(report) => print_report(&report),
                None => println!(
                    "store already holds {} records; pass --force to ingest again",
                    pipeline.record_count().await?
                ),
            }
        }
        Command::Ask { query } => {
            let service = RagService::new(ServiceFactory::new(settings.clone()), &settings.pdf_dir);
            let answer = service.answer(&query).await?;
            println!("{answer}");
        }
    }

    Ok(())
}

fn print_report(report: &IngestionReport) {
    for skipped in &report.skipped_files {
        warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped pdf");
    }

    if report.chunks_written == 0 {
        println!(
            "0 chunks ingested ({} pdf files found, {} skipped)",
            report.files_found,
            report.skipped_files.len()
        );
        return;
    }

    println!(
        "ingested {} chunks from {} pages across {} files ({} skipped)",
        report.chunks_written,
        report.pages_loaded,
        report.files_found,
        report.skipped_files.len()
    );
}
