//! Stage-completion orchestration.
//!
//! Sequences the completion protocol for one invocation: resolve produced
//! keys, attach to the execution record, catalog every object, mark the
//! execution as processing, then complete it. Any failure along the way is
//! caught exactly once, converted into a best-effort terminal Failed
//! transition carrying a diagnostic, and re-raised unchanged so the invoking
//! platform observes the original error.

mod event;

pub use event::{JobDetails, StageCompletionEvent};

use std::sync::Arc;

use tracing::{error, info};

use crate::catalog::{CatalogStore, MetadataCatalogWriter};
use crate::emit;
use crate::error::HandlerError;
use crate::execution::{ExecutionHistoryRecorder, ExecutionTracker};
use crate::metrics::events::{ExecutionOutcome, StageCompletionHandled};
use crate::storage::StorageProbe;

/// Status code returned on success.
pub const SUCCESS_STATUS: u16 = 200;

/// Orchestrates the completion of one pipeline stage.
///
/// Collaborators and the component label are supplied at construction and
/// threaded explicitly; nothing is read from ambient state.
pub struct StageCompletionOrchestrator {
    probe: Arc<dyn StorageProbe>,
    catalog: Arc<dyn CatalogStore>,
    tracker: Arc<dyn ExecutionTracker>,
    /// Fixed per-deployment label identifying this handler in execution history.
    component: String,
}

impl StageCompletionOrchestrator {
    /// Create an orchestrator with explicit collaborators.
    pub fn new(
        probe: Arc<dyn StorageProbe>,
        catalog: Arc<dyn CatalogStore>,
        tracker: Arc<dyn ExecutionTracker>,
        component: impl Into<String>,
    ) -> Self {
        Self {
            probe,
            catalog,
            tracker,
            component: component.into(),
        }
    }

    /// Complete the stage described by `event`, returning status 200.
    ///
    /// On failure, records a terminal Failed transition with
    /// `"<stage> <component> Error: <description>"` (best effort; a failure
    /// before attach leaves the tracker untouched) and re-raises the original
    /// error.
    pub async fn complete_stage(&self, event: &StageCompletionEvent) -> Result<u16, HandlerError> {
        let mut recorder =
            ExecutionHistoryRecorder::new(self.tracker.clone(), event.job.peh_id.clone());

        match self.run(event, &mut recorder).await {
            Ok(cataloged) => {
                info!(
                    peh_id = %event.job.peh_id,
                    cataloged = cataloged,
                    "Stage completion recorded"
                );
                emit!(StageCompletionHandled {
                    outcome: ExecutionOutcome::Success,
                });
                Ok(SUCCESS_STATUS)
            }
            Err(e) => {
                error!(peh_id = %event.job.peh_id, error = %e, "Fatal error");
                let issue_comment = format!(
                    "{} {} Error: {e}",
                    event.pipeline_stage, self.component
                );
                if let Err(report_err) = recorder
                    .complete_failure(&self.component, &issue_comment)
                    .await
                {
                    // The original error still propagates; the run may be left
                    // non-terminal in the tracker.
                    error!(
                        peh_id = %event.job.peh_id,
                        error = %report_err,
                        "Failed to record terminal failure"
                    );
                }
                emit!(StageCompletionHandled {
                    outcome: ExecutionOutcome::Failed,
                });
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        event: &StageCompletionEvent,
        recorder: &mut ExecutionHistoryRecorder,
    ) -> Result<usize, HandlerError> {
        info!(
            bucket = %event.bucket,
            prefix = %event.job.processed_keys_path,
            "Resolving produced keys"
        );
        let keys = self.probe.list_keys(&event.job.processed_keys_path).await?;

        recorder.attach().await?;

        info!(count = keys.len(), "Storing metadata to catalog");
        let writer = MetadataCatalogWriter::new(self.probe.clone(), self.catalog.clone());
        let cataloged = writer
            .catalog(&event.bucket, &keys, &event.stage_context())
            .await?;

        let status = format!("{} {} Processing", event.pipeline_stage, self.component);
        recorder.mark_processing(&self.component, &status).await?;
        recorder.complete_success().await?;

        Ok(cataloged)
    }
}
