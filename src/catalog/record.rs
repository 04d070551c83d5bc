//! Object metadata records written to the catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::ObjectStat;

/// Value of the `stage` field on every record written by this handler.
pub const RECORD_STAGE: &str = "stage";

/// Pipeline context that is constant across one cataloging batch.
///
/// Supplied by the stage-completion event; copied verbatim onto every
/// record produced for that invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageContext {
    pub org: String,
    pub app: String,
    pub env: String,
    pub team: String,
    pub pipeline: String,
    pub dataset: String,
    /// Stage identifier within the pipeline (e.g., "StageB").
    pub pipeline_stage: String,
    /// Execution identifier of the pipeline run that produced the batch.
    pub peh_id: String,
}

/// One cataloged object. Natural key is (bucket, key); writing the same
/// key twice overwrites rather than duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadataRecord {
    pub bucket: String,
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    pub last_modified_date: DateTime<Utc>,
    pub org: String,
    pub app: String,
    pub env: String,
    pub team: String,
    pub pipeline: String,
    pub dataset: String,
    pub stage: String,
    pub pipeline_stage: String,
    /// Execution that produced this object.
    pub peh_id: String,
}

impl ObjectMetadataRecord {
    /// Assemble a record from a key, its storage stat, and the batch context.
    ///
    /// This is the pure key-to-record transformation; all I/O happens in the
    /// probe lookup and the catalog upsert around it.
    pub fn from_stat(bucket: &str, key: &str, stat: &ObjectStat, ctx: &StageContext) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size: stat.size,
            last_modified_date: stat.last_modified,
            org: ctx.org.clone(),
            app: ctx.app.clone(),
            env: ctx.env.clone(),
            team: ctx.team.clone(),
            pipeline: ctx.pipeline.clone(),
            dataset: ctx.dataset.clone(),
            stage: RECORD_STAGE.to_string(),
            pipeline_stage: ctx.pipeline_stage.clone(),
            peh_id: ctx.peh_id.clone(),
        }
    }
}
