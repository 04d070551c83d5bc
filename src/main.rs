//! Stagehand CLI: completion handler for data-lake pipeline stages.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use stagehand::{
    CliArgs, Config, StageCompletionEvent, StageCompletionOrchestrator, StorageCatalog,
    StorageClient, StorageTracker, init_tracing,
};

/// Resolve a bucket identifier to a storage URL.
///
/// Plain bucket names map to `s3://{bucket}`; explicit URLs and absolute
/// paths (local testing) pass through unchanged.
fn bucket_url(bucket: &str) -> String {
    if bucket.contains("://") || bucket.starts_with('/') {
        bucket.to_string()
    } else {
        format!("s3://{bucket}")
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = CliArgs::parse();

    let config = match Config::from_path(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let event: StageCompletionEvent = match std::fs::read_to_string(&args.event)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()))
    {
        Ok(event) => event,
        Err(e) => {
            eprintln!("Failed to read event: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        bucket = %event.bucket,
        peh_id = %event.job.peh_id,
        "Handling stage completion"
    );

    let result = async {
        let probe = Arc::new(StorageClient::for_url(&bucket_url(&event.bucket)).await?);
        let catalog_storage = Arc::new(StorageClient::for_url(&config.catalog_uri).await?);
        let tracker_storage = Arc::new(StorageClient::for_url(&config.tracker_uri).await?);

        let orchestrator = StageCompletionOrchestrator::new(
            probe,
            Arc::new(StorageCatalog::new(catalog_storage)),
            Arc::new(StorageTracker::new(tracker_storage)),
            config.component.clone(),
        );

        orchestrator.complete_stage(&event).await
    }
    .await;

    match result {
        Ok(status) => {
            info!(status = status, "Stage completion succeeded");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Stage completion failed: {e}");
            ExitCode::FAILURE
        }
    }
}
