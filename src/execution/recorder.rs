//! Execution-history recorder.
//!
//! Wraps [`ExecutionTracker`] calls in the per-run state machine
//! `Unattached -> Attached -> Processing -> {Success, Failed}`. The recorder
//! enforces transition legality in-process so the handler issues at most one
//! terminal transition per execution, and never issues a transition before
//! the record has been retrieved.

use std::sync::Arc;

use tracing::{info, warn};

use crate::emit;
use crate::error::{InvalidTransitionSnafu, TrackerError};
use crate::metrics::events::{ExecutionCompleted, ExecutionOutcome};

use super::{ExecutionRecord, ExecutionState, ExecutionTracker};

/// Records one pipeline run's state transitions against the tracker.
pub struct ExecutionHistoryRecorder {
    tracker: Arc<dyn ExecutionTracker>,
    peh_id: String,
    state: ExecutionState,
}

impl ExecutionHistoryRecorder {
    /// Create an unattached recorder for the given execution.
    pub fn new(tracker: Arc<dyn ExecutionTracker>, peh_id: impl Into<String>) -> Self {
        Self {
            tracker,
            peh_id: peh_id.into(),
            state: ExecutionState::Unattached,
        }
    }

    /// Current state of the recorder.
    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// Retrieve the execution record. Required before any other transition.
    pub async fn attach(&mut self) -> Result<ExecutionRecord, TrackerError> {
        let record = self.tracker.retrieve(&self.peh_id).await?;
        self.state = ExecutionState::Attached;
        info!(peh_id = %self.peh_id, "Attached to execution record");
        Ok(record)
    }

    /// Report the stage as processing with a human-readable status string.
    ///
    /// Idempotent while non-terminal: a repeat call while already Processing
    /// skips the remote update.
    pub async fn mark_processing(
        &mut self,
        component: &str,
        status: &str,
    ) -> Result<(), TrackerError> {
        match self.state {
            ExecutionState::Processing => return Ok(()),
            ExecutionState::Attached => {}
            from => {
                return InvalidTransitionSnafu {
                    from,
                    to: ExecutionState::Processing,
                }
                .fail();
            }
        }

        self.tracker
            .update_status(&self.peh_id, status, component)
            .await?;
        self.state = ExecutionState::Processing;
        Ok(())
    }

    /// Transition the execution to terminal success.
    pub async fn complete_success(&mut self) -> Result<(), TrackerError> {
        if self.state != ExecutionState::Processing {
            return InvalidTransitionSnafu {
                from: self.state,
                to: ExecutionState::Success,
            }
            .fail();
        }

        self.tracker.complete_success(&self.peh_id).await?;
        self.state = ExecutionState::Success;
        emit!(ExecutionCompleted {
            outcome: ExecutionOutcome::Success,
        });
        info!(peh_id = %self.peh_id, "Execution completed");
        Ok(())
    }

    /// Transition any non-terminal state to terminal failure.
    ///
    /// Callable even if `attach` was never reached, to preserve error
    /// legibility: with no record attached there is no valid terminal
    /// transition to issue, so the diagnostic is logged and the tracker is
    /// left untouched rather than risking a secondary fault.
    pub async fn complete_failure(
        &mut self,
        component: &str,
        issue_comment: &str,
    ) -> Result<(), TrackerError> {
        match self.state {
            ExecutionState::Unattached => {
                warn!(
                    peh_id = %self.peh_id,
                    issue = %issue_comment,
                    "Failure before execution record was attached; skipping terminal transition"
                );
                return Ok(());
            }
            from if from.is_terminal() => {
                return InvalidTransitionSnafu {
                    from,
                    to: ExecutionState::Failed,
                }
                .fail();
            }
            _ => {}
        }

        self.tracker
            .complete_failure(&self.peh_id, component, issue_comment)
            .await?;
        self.state = ExecutionState::Failed;
        emit!(ExecutionCompleted {
            outcome: ExecutionOutcome::Failed,
        });
        Ok(())
    }
}
