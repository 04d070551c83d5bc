//! Stage-completion event wire format.

use serde::{Deserialize, Serialize};

use crate::catalog::StageContext;

/// Job details supplied by the previous step of the stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobDetails {
    /// Storage prefix under which the stage wrote its output objects.
    #[serde(rename = "processedKeysPath")]
    pub processed_keys_path: String,
    /// Execution identifier of this pipeline run.
    pub peh_id: String,
}

/// Event delivered to the handler when a stage finishes producing output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageCompletionEvent {
    /// Bucket holding the produced objects.
    pub bucket: String,
    pub job: JobDetails,
    pub team: String,
    pub pipeline: String,
    /// Stage identifier within the pipeline (e.g., "StageB").
    pub pipeline_stage: String,
    pub dataset: String,
    pub org: String,
    pub app: String,
    pub env: String,
}

impl StageCompletionEvent {
    /// Batch-constant context for catalog records produced by this event.
    pub fn stage_context(&self) -> StageContext {
        StageContext {
            org: self.org.clone(),
            app: self.app.clone(),
            env: self.env.clone(),
            team: self.team.clone(),
            pipeline: self.pipeline.clone(),
            dataset: self.dataset.clone(),
            pipeline_stage: self.pipeline_stage.clone(),
            peh_id: self.job.peh_id.clone(),
        }
    }
}
