//! Internal events for stagehand metrics emission.
//!
//! Each event struct represents a measurable occurrence in the completion
//! handler. Events implement the `InternalEvent` trait which emits the
//! corresponding counter.

use metrics::counter;
use tracing::trace;

/// Trait for internal events that can be emitted as metrics.
pub trait InternalEvent {
    /// Emit this event as a metric.
    fn emit(self);
}

/// Event emitted when one object metadata record is upserted.
pub struct ObjectCataloged {
    /// Pipeline label for multi-pipeline deployments.
    pub pipeline: String,
}

impl InternalEvent for ObjectCataloged {
    fn emit(self) {
        trace!(pipeline = %self.pipeline, "Object cataloged");
        counter!("stagehand_objects_cataloged_total", "pipeline" => self.pipeline).increment(1);
    }
}

/// Outcome label for completed executions.
#[derive(Debug, Clone, Copy)]
pub enum ExecutionOutcome {
    Success,
    Failed,
}

impl ExecutionOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            ExecutionOutcome::Success => "success",
            ExecutionOutcome::Failed => "failed",
        }
    }
}

/// Event emitted when an execution reaches a terminal state.
pub struct ExecutionCompleted {
    pub outcome: ExecutionOutcome,
}

impl InternalEvent for ExecutionCompleted {
    fn emit(self) {
        trace!(outcome = self.outcome.as_str(), "Execution completed");
        counter!("stagehand_executions_completed_total", "outcome" => self.outcome.as_str())
            .increment(1);
    }
}

/// Event emitted when a stage-completion invocation finishes.
pub struct StageCompletionHandled {
    pub outcome: ExecutionOutcome,
}

impl InternalEvent for StageCompletionHandled {
    fn emit(self) {
        trace!(outcome = self.outcome.as_str(), "Stage completion handled");
        counter!("stagehand_completions_handled_total", "outcome" => self.outcome.as_str())
            .increment(1);
    }
}
