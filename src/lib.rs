//! Stagehand: completion handler for data-lake pipeline stages.
//!
//! This crate handles the end of one pipeline stage:
//! - Listing the object keys the stage produced in storage
//! - Cataloging per-object metadata (size, timestamp, pipeline context) into
//!   a shared metadata store, with upsert semantics safe under retry
//! - Recording the stage outcome (success or failure) into a pipeline
//!   execution-history store so downstream stages and operators can observe
//!   pipeline state

pub mod catalog;
pub mod config;
pub mod error;
pub mod execution;
pub mod handler;
pub mod metrics;
pub mod storage;

pub mod tracing;

pub use self::tracing::init_tracing;

// Re-export commonly used items
pub use catalog::{MetadataCatalogWriter, ObjectMetadataRecord, StageContext, StorageCatalog};
pub use config::{CliArgs, Config};
pub use error::HandlerError;
pub use execution::{ExecutionHistoryRecorder, ExecutionRecord, StorageTracker, TerminalOutcome};
pub use handler::{SUCCESS_STATUS, StageCompletionEvent, StageCompletionOrchestrator};
pub use storage::{ObjectStat, StorageClient, StorageProbe};
