//! Execution tracker collaborator.

use async_trait::async_trait;
use chrono::Utc;
use object_store::path::Path;
use snafu::prelude::*;
use tracing::debug;

use crate::error::{StoreSnafu, TrackerError, TrackerSerializeSnafu};
use crate::execution::{ExecutionRecord, ExecutionState, TerminalOutcome};
use crate::storage::StorageClientRef;

/// Stateful service holding one [`ExecutionRecord`] per `peh_id`.
///
/// All operations take the execution identifier explicitly; the handler never
/// relies on ambient client state.
#[async_trait]
pub trait ExecutionTracker: Send + Sync {
    /// Retrieve the execution record; fails with `ExecutionNotFound` if the
    /// identifier is unknown.
    async fn retrieve(&self, peh_id: &str) -> Result<ExecutionRecord, TrackerError>;

    /// Write a human-readable status string for an in-flight execution.
    async fn update_status(
        &self,
        peh_id: &str,
        status: &str,
        component: &str,
    ) -> Result<(), TrackerError>;

    /// Transition the execution to terminal success.
    async fn complete_success(&self, peh_id: &str) -> Result<(), TrackerError>;

    /// Transition the execution to terminal failure with a diagnostic comment.
    async fn complete_failure(
        &self,
        peh_id: &str,
        component: &str,
        issue_comment: &str,
    ) -> Result<(), TrackerError>;
}

/// Execution tracker that persists one JSON document per `peh_id`.
///
/// Documents live at `{peh_id}.json` under the configured tracker URI and are
/// replaced atomically on every transition. Terminal transitions are guarded:
/// once an execution is Success or Failed, further transitions are rejected.
pub struct StorageTracker {
    storage: StorageClientRef,
}

impl StorageTracker {
    /// Create a tracker over the given storage location.
    pub fn new(storage: StorageClientRef) -> Self {
        Self { storage }
    }

    fn record_path(peh_id: &str) -> Path {
        Path::from(format!("{peh_id}.json"))
    }

    /// Register a fresh execution record.
    ///
    /// Upstream stages normally do this when a run starts; it exists here so
    /// local deployments and tests can seed executions.
    pub async fn register(&self, peh_id: &str) -> Result<ExecutionRecord, TrackerError> {
        let record = ExecutionRecord::new(peh_id);
        self.persist(&record).await?;
        Ok(record)
    }

    async fn load(&self, peh_id: &str) -> Result<ExecutionRecord, TrackerError> {
        let path = Self::record_path(peh_id);
        match self.storage.get(&path).await {
            Ok(content) => {
                serde_json::from_slice(&content).context(TrackerSerializeSnafu)
            }
            Err(e) if e.is_not_found() => Err(TrackerError::ExecutionNotFound {
                peh_id: peh_id.to_string(),
            }),
            Err(e) => Err(TrackerError::Store { source: e }),
        }
    }

    async fn persist(&self, record: &ExecutionRecord) -> Result<(), TrackerError> {
        let path = Self::record_path(&record.peh_id);
        let content = serde_json::to_vec_pretty(record).context(TrackerSerializeSnafu)?;
        self.storage
            .atomic_write(&path, content)
            .await
            .context(StoreSnafu)
    }

    /// Reject the transition when the stored record is already terminal.
    fn guard_non_terminal(
        record: &ExecutionRecord,
        to: ExecutionState,
    ) -> Result<(), TrackerError> {
        let from = match record.terminal_outcome {
            TerminalOutcome::None => return Ok(()),
            TerminalOutcome::Success => ExecutionState::Success,
            TerminalOutcome::Failed => ExecutionState::Failed,
        };
        Err(TrackerError::InvalidTransition { from, to })
    }
}

#[async_trait]
impl ExecutionTracker for StorageTracker {
    async fn retrieve(&self, peh_id: &str) -> Result<ExecutionRecord, TrackerError> {
        self.load(peh_id).await
    }

    async fn update_status(
        &self,
        peh_id: &str,
        status: &str,
        component: &str,
    ) -> Result<(), TrackerError> {
        let mut record = self.load(peh_id).await?;
        Self::guard_non_terminal(&record, ExecutionState::Processing)?;

        record.status = status.to_string();
        record.component = component.to_string();
        record.last_updated = Utc::now();
        self.persist(&record).await?;

        debug!(peh_id = %peh_id, status = %status, "Execution status updated");
        Ok(())
    }

    async fn complete_success(&self, peh_id: &str) -> Result<(), TrackerError> {
        let mut record = self.load(peh_id).await?;
        Self::guard_non_terminal(&record, ExecutionState::Success)?;

        record.terminal_outcome = TerminalOutcome::Success;
        record.last_updated = Utc::now();
        self.persist(&record).await?;

        debug!(peh_id = %peh_id, "Execution completed successfully");
        Ok(())
    }

    async fn complete_failure(
        &self,
        peh_id: &str,
        component: &str,
        issue_comment: &str,
    ) -> Result<(), TrackerError> {
        let mut record = self.load(peh_id).await?;
        Self::guard_non_terminal(&record, ExecutionState::Failed)?;

        record.terminal_outcome = TerminalOutcome::Failed;
        record.status = issue_comment.to_string();
        record.component = component.to_string();
        record.last_updated = Utc::now();
        self.persist(&record).await?;

        debug!(peh_id = %peh_id, issue = %issue_comment, "Execution marked failed");
        Ok(())
    }
}
