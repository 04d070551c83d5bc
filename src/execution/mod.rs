//! Execution-history tracking for pipeline runs.
//!
//! A pipeline run is identified by its `peh_id`. The [`ExecutionTracker`]
//! collaborator owns persistence of [`ExecutionRecord`]s; this module's
//! [`ExecutionHistoryRecorder`] wraps tracker calls in a disciplined
//! state-transition protocol so at most one terminal transition is issued
//! per run.

mod recorder;
mod tracker;

pub use recorder::ExecutionHistoryRecorder;
pub use tracker::{ExecutionTracker, StorageTracker};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal outcome of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TerminalOutcome {
    /// Run is still in flight.
    #[default]
    None,
    /// Run completed successfully.
    Success,
    /// Run failed; `status` carries the diagnostic.
    Failed,
}

impl TerminalOutcome {
    /// True for Success and Failed.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TerminalOutcome::None)
    }
}

/// In-process view of where one execution sits in its lifecycle.
///
/// `Unattached -> Attached -> Processing -> {Success, Failed}`; the last two
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    /// No execution record retrieved yet.
    Unattached,
    /// Record retrieved from the tracker.
    Attached,
    /// Stage reported as processing.
    Processing,
    /// Terminal success.
    Success,
    /// Terminal failure.
    Failed,
}

impl ExecutionState {
    /// True for Success and Failed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionState::Success | ExecutionState::Failed)
    }
}

/// Persisted state of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Execution identifier, externally generated.
    pub peh_id: String,
    /// Free-text status string (e.g., "StageB Postupdate Processing").
    #[serde(default)]
    pub status: String,
    /// Component that issued the last transition.
    #[serde(default)]
    pub component: String,
    /// Terminal outcome, if any.
    #[serde(default)]
    pub terminal_outcome: TerminalOutcome,
    /// Timestamp of the last transition.
    pub last_updated: DateTime<Utc>,
}

impl ExecutionRecord {
    /// Create a fresh, non-terminal record for the given execution.
    pub fn new(peh_id: impl Into<String>) -> Self {
        Self {
            peh_id: peh_id.into(),
            status: String::new(),
            component: String::new(),
            terminal_outcome: TerminalOutcome::None,
            last_updated: Utc::now(),
        }
    }
}
