//! Evaluate command - runs one batch file and prints the report

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::{BatchReport, BatchRequest};
use crate::infrastructure::logging::init_cli_logging;
use crate::infrastructure::services::EvaluationService;

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Path to a JSON batch request
    #[arg(short, long)]
    pub file: PathBuf,

    /// Pretty-print the report
    #[arg(long)]
    pub pretty: bool,
}

/// Evaluate the batch; Ctrl+C cancels it and nothing is printed
pub async fn run(args: EvaluateArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_cli_logging(&config.logging);

    let request = read_batch(&args.file).await?;
    let (service, _) = crate::create_evaluation_service(&config).await?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C, cancelling batch");
            on_interrupt.cancel();
        }
    });

    let report = evaluate(&service, request, &cancel).await?;
    println!("{}", render(&report, args.pretty)?);

    Ok(())
}

async fn read_batch(path: &Path) -> anyhow::Result<BatchRequest> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read batch file {}", path.display()))?;

    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid batch request in {}", path.display()))
}

async fn evaluate(
    service: &EvaluationService,
    request: BatchRequest,
    cancel: &CancellationToken,
) -> anyhow::Result<BatchReport> {
    let report = service.evaluate(request, cancel).await?;

    info!(
        batch_id = %report.batch_id,
        results = report.results.len(),
        "Batch evaluated"
    );

    Ok(report)
}

fn render(report: &BatchReport, pretty: bool) -> anyhow::Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };

    Ok(rendered)
}
