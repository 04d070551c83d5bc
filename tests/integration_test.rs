//! Integration tests for the stage-completion handler.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use stagehand::catalog::{CatalogStore, ObjectMetadataRecord};
use stagehand::error::{CatalogError, HandlerError, StorageError, TrackerError};
use stagehand::execution::{ExecutionRecord, ExecutionTracker, TerminalOutcome};
use stagehand::storage::{ObjectStat, StorageProbe};
use stagehand::{SUCCESS_STATUS, StageCompletionEvent, StageCompletionOrchestrator};

const COMPONENT: &str = "Postupdate";

fn not_found(key: &str) -> StorageError {
    StorageError::ObjectStore {
        source: object_store::Error::NotFound {
            path: key.to_string(),
            source: "object deleted".into(),
        },
    }
}

/// In-memory storage probe with per-key stats.
struct FakeProbe {
    keys: Vec<String>,
    stats: HashMap<String, ObjectStat>,
}

impl FakeProbe {
    fn with_keys(keys: &[&str]) -> Self {
        let last_modified = Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap();
        let stats = keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                (
                    key.to_string(),
                    ObjectStat {
                        size: (i as u64 + 1) * 100,
                        last_modified,
                    },
                )
            })
            .collect();
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            stats,
        }
    }

    /// Drop a key's stat while keeping it in listings, simulating an object
    /// deleted between listing and stat.
    fn forget_stat(&mut self, key: &str) {
        self.stats.remove(key);
    }
}

#[async_trait]
impl StorageProbe for FakeProbe {
    async fn list_keys(&self, _prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self.keys.clone())
    }

    async fn stat(&self, key: &str) -> Result<ObjectStat, StorageError> {
        self.stats
            .get(key)
            .copied()
            .ok_or_else(|| not_found(key))
    }
}

/// In-memory catalog with optional per-key failure injection.
#[derive(Default)]
struct FakeCatalog {
    records: Mutex<HashMap<(String, String), ObjectMetadataRecord>>,
    fail_on_key: Option<String>,
}

impl FakeCatalog {
    fn failing_on(key: &str) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            fail_on_key: Some(key.to_string()),
        }
    }

    fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn get(&self, bucket: &str, key: &str) -> Option<ObjectMetadataRecord> {
        self.records
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl CatalogStore for FakeCatalog {
    async fn upsert(&self, record: &ObjectMetadataRecord) -> Result<(), CatalogError> {
        if self.fail_on_key.as_deref() == Some(record.key.as_str()) {
            return Err(CatalogError::WriteRejected {
                key: record.key.clone(),
                message: "schema validation failed".to_string(),
            });
        }
        self.records.lock().unwrap().insert(
            (record.bucket.clone(), record.key.clone()),
            record.clone(),
        );
        Ok(())
    }
}

/// In-memory execution tracker.
#[derive(Default)]
struct FakeTracker {
    records: Mutex<HashMap<String, ExecutionRecord>>,
}

impl FakeTracker {
    fn with_execution(peh_id: &str) -> Self {
        let tracker = Self::default();
        tracker
            .records
            .lock()
            .unwrap()
            .insert(peh_id.to_string(), ExecutionRecord::new(peh_id));
        tracker
    }

    fn record(&self, peh_id: &str) -> Option<ExecutionRecord> {
        self.records.lock().unwrap().get(peh_id).cloned()
    }
}

#[async_trait]
impl ExecutionTracker for FakeTracker {
    async fn retrieve(&self, peh_id: &str) -> Result<ExecutionRecord, TrackerError> {
        self.records
            .lock()
            .unwrap()
            .get(peh_id)
            .cloned()
            .ok_or_else(|| TrackerError::ExecutionNotFound {
                peh_id: peh_id.to_string(),
            })
    }

    async fn update_status(
        &self,
        peh_id: &str,
        status: &str,
        component: &str,
    ) -> Result<(), TrackerError> {
        let mut records = self.records.lock().unwrap();
        let record = records.get_mut(peh_id).unwrap();
        record.status = status.to_string();
        record.component = component.to_string();
        Ok(())
    }

    async fn complete_success(&self, peh_id: &str) -> Result<(), TrackerError> {
        let mut records = self.records.lock().unwrap();
        records.get_mut(peh_id).unwrap().terminal_outcome = TerminalOutcome::Success;
        Ok(())
    }

    async fn complete_failure(
        &self,
        peh_id: &str,
        component: &str,
        issue_comment: &str,
    ) -> Result<(), TrackerError> {
        let mut records = self.records.lock().unwrap();
        let record = records.get_mut(peh_id).unwrap();
        record.terminal_outcome = TerminalOutcome::Failed;
        record.status = issue_comment.to_string();
        record.component = component.to_string();
        Ok(())
    }
}

fn test_event(bucket: &str, peh_id: &str) -> StageCompletionEvent {
    serde_json::from_value(serde_json::json!({
        "bucket": bucket,
        "job": {
            "processedKeysPath": "post/legislators",
            "peh_id": peh_id
        },
        "team": "engineering",
        "pipeline": "main",
        "pipeline_stage": "StageB",
        "dataset": "legislators",
        "org": "acme",
        "app": "datalake",
        "env": "dev"
    }))
    .unwrap()
}

mod orchestrator_tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_completion() {
        let probe = Arc::new(FakeProbe::with_keys(&["post/k1.parquet", "post/k2.parquet"]));
        let catalog = Arc::new(FakeCatalog::default());
        let tracker = Arc::new(FakeTracker::with_execution("p1"));
        let orchestrator = StageCompletionOrchestrator::new(
            probe,
            catalog.clone(),
            tracker.clone(),
            COMPONENT,
        );

        let status = orchestrator
            .complete_stage(&test_event("b", "p1"))
            .await
            .unwrap();
        assert_eq!(status, SUCCESS_STATUS);

        // Two catalog upserts with context copied verbatim
        assert_eq!(catalog.len(), 2);
        let k1 = catalog.get("b", "post/k1.parquet").unwrap();
        assert_eq!(k1.size, 100);
        assert_eq!(k1.peh_id, "p1");
        assert_eq!(k1.pipeline_stage, "StageB");
        assert_eq!(k1.stage, "stage");

        // Execution went Processing -> Success
        let record = tracker.record("p1").unwrap();
        assert_eq!(record.terminal_outcome, TerminalOutcome::Success);
        assert_eq!(record.status, "StageB Postupdate Processing");
        assert_eq!(record.component, COMPONENT);
    }

    #[tokio::test]
    async fn test_upsert_failure_mid_batch() {
        let probe = Arc::new(FakeProbe::with_keys(&["post/k1.parquet", "post/k2.parquet"]));
        let catalog = Arc::new(FakeCatalog::failing_on("post/k2.parquet"));
        let tracker = Arc::new(FakeTracker::with_execution("p1"));
        let orchestrator = StageCompletionOrchestrator::new(
            probe,
            catalog.clone(),
            tracker.clone(),
            COMPONENT,
        );

        let err = orchestrator
            .complete_stage(&test_event("b", "p1"))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Catalog { .. }));

        // Exactly one upsert committed before the failure
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("b", "post/k1.parquet").is_some());

        // Execution ended Failed with a diagnostic naming the failed key
        let record = tracker.record("p1").unwrap();
        assert_eq!(record.terminal_outcome, TerminalOutcome::Failed);
        assert!(record.status.starts_with("StageB Postupdate Error:"));
        assert!(record.status.contains("post/k2.parquet"));
    }

    #[tokio::test]
    async fn test_stat_not_found_mid_batch() {
        let mut probe = FakeProbe::with_keys(&["post/k1.parquet", "post/k2.parquet"]);
        probe.forget_stat("post/k2.parquet");
        let catalog = Arc::new(FakeCatalog::default());
        let tracker = Arc::new(FakeTracker::with_execution("p1"));
        let orchestrator = StageCompletionOrchestrator::new(
            Arc::new(probe),
            catalog.clone(),
            tracker.clone(),
            COMPONENT,
        );

        let err = orchestrator
            .complete_stage(&test_event("b", "p1"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let record = tracker.record("p1").unwrap();
        assert_eq!(record.terminal_outcome, TerminalOutcome::Failed);
        // Diagnostic carries stage, component, and the error description
        assert!(record.status.contains("StageB"));
        assert!(record.status.contains(COMPONENT));
        assert!(record.status.contains("post/k2.parquet"));
    }

    #[tokio::test]
    async fn test_attach_failure_skips_catalog_and_terminal_transition() {
        let probe = Arc::new(FakeProbe::with_keys(&["post/k1.parquet"]));
        let catalog = Arc::new(FakeCatalog::default());
        let tracker = Arc::new(FakeTracker::default());
        let orchestrator = StageCompletionOrchestrator::new(
            probe,
            catalog.clone(),
            tracker.clone(),
            COMPONENT,
        );

        let err = orchestrator
            .complete_stage(&test_event("b", "p-unknown"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Tracker {
                source: TrackerError::ExecutionNotFound { .. }
            }
        ));

        // Keys are listed before attach, but nothing is cataloged and no
        // terminal transition is issued for the unknown execution
        assert_eq!(catalog.len(), 0);
        assert!(tracker.record("p-unknown").is_none());
    }

    #[tokio::test]
    async fn test_empty_key_set_still_completes() {
        let probe = Arc::new(FakeProbe::with_keys(&[]));
        let catalog = Arc::new(FakeCatalog::default());
        let tracker = Arc::new(FakeTracker::with_execution("p1"));
        let orchestrator = StageCompletionOrchestrator::new(
            probe,
            catalog.clone(),
            tracker.clone(),
            COMPONENT,
        );

        let status = orchestrator
            .complete_stage(&test_event("b", "p1"))
            .await
            .unwrap();
        assert_eq!(status, SUCCESS_STATUS);

        assert_eq!(catalog.len(), 0);
        assert_eq!(
            tracker.record("p1").unwrap().terminal_outcome,
            TerminalOutcome::Success
        );
    }

    #[tokio::test]
    async fn test_retry_is_idempotent_at_object_level() {
        let probe = Arc::new(FakeProbe::with_keys(&["post/k1.parquet"]));
        let catalog = Arc::new(FakeCatalog::default());

        let tracker = Arc::new(FakeTracker::with_execution("p1"));
        let orchestrator = StageCompletionOrchestrator::new(
            probe.clone(),
            catalog.clone(),
            tracker.clone(),
            COMPONENT,
        );
        orchestrator
            .complete_stage(&test_event("b", "p1"))
            .await
            .unwrap();

        // Re-running against a fresh execution overwrites rather than duplicates
        let tracker2 = Arc::new(FakeTracker::with_execution("p1"));
        let orchestrator2 =
            StageCompletionOrchestrator::new(probe, catalog.clone(), tracker2, COMPONENT);
        orchestrator2
            .complete_stage(&test_event("b", "p1"))
            .await
            .unwrap();

        assert_eq!(catalog.len(), 1);
    }
}

mod end_to_end_tests {
    use super::*;
    use tempfile::TempDir;

    use stagehand::{StorageCatalog, StorageClient, StorageTracker};

    struct LocalDeployment {
        _root: TempDir,
        probe: Arc<StorageClient>,
        catalog_storage: Arc<StorageClient>,
        tracker: Arc<StorageTracker>,
        orchestrator: StageCompletionOrchestrator,
    }

    async fn local_deployment() -> LocalDeployment {
        let root = TempDir::new().unwrap();
        let bucket_dir = root.path().join("bucket");
        let catalog_dir = root.path().join("catalog");
        let tracker_dir = root.path().join("executions");

        let produced = bucket_dir.join("post/legislators");
        std::fs::create_dir_all(&produced).unwrap();
        std::fs::write(produced.join("part-0.parquet"), b"aaaa").unwrap();
        std::fs::write(produced.join("part-1.parquet"), b"bbbbbbbb").unwrap();

        let probe = Arc::new(
            StorageClient::for_url(bucket_dir.to_str().unwrap())
                .await
                .unwrap(),
        );
        let catalog_storage = Arc::new(
            StorageClient::for_url(catalog_dir.to_str().unwrap())
                .await
                .unwrap(),
        );
        let tracker_storage = Arc::new(
            StorageClient::for_url(tracker_dir.to_str().unwrap())
                .await
                .unwrap(),
        );
        let tracker = Arc::new(StorageTracker::new(tracker_storage));

        let orchestrator = StageCompletionOrchestrator::new(
            probe.clone(),
            Arc::new(StorageCatalog::new(catalog_storage.clone())),
            tracker.clone(),
            COMPONENT,
        );

        LocalDeployment {
            _root: root,
            probe,
            catalog_storage,
            tracker,
            orchestrator,
        }
    }

    #[tokio::test]
    async fn test_local_filesystem_round_trip() {
        let deployment = local_deployment().await;
        deployment.tracker.register("peh-local").await.unwrap();

        let status = deployment
            .orchestrator
            .complete_stage(&test_event("bucket", "peh-local"))
            .await
            .unwrap();
        assert_eq!(status, SUCCESS_STATUS);

        // Catalog documents are readable JSON records with looked-up sizes
        let doc = deployment
            .catalog_storage
            .get(&object_store::path::Path::from(
                "bucket/post/legislators/part-1.parquet.json",
            ))
            .await
            .unwrap();
        let record: ObjectMetadataRecord = serde_json::from_slice(&doc).unwrap();
        assert_eq!(record.size, 8);
        assert_eq!(record.peh_id, "peh-local");

        // Execution document reflects terminal success
        let record = deployment.tracker.retrieve("peh-local").await.unwrap();
        assert_eq!(record.terminal_outcome, TerminalOutcome::Success);

        // Probe listing agrees with what was cataloged
        let keys = deployment.probe.list_keys("post/legislators").await.unwrap();
        assert_eq!(keys.len(), 2);
    }

    #[tokio::test]
    async fn test_local_rerun_overwrites_catalog_documents() {
        let deployment = local_deployment().await;
        deployment.tracker.register("peh-a").await.unwrap();
        deployment
            .orchestrator
            .complete_stage(&test_event("bucket", "peh-a"))
            .await
            .unwrap();

        // A second run (new execution) re-catalogs the same keys
        deployment.tracker.register("peh-b").await.unwrap();
        deployment
            .orchestrator
            .complete_stage(&test_event("bucket", "peh-b"))
            .await
            .unwrap();

        let doc = deployment
            .catalog_storage
            .get(&object_store::path::Path::from(
                "bucket/post/legislators/part-0.parquet.json",
            ))
            .await
            .unwrap();
        let record: ObjectMetadataRecord = serde_json::from_slice(&doc).unwrap();
        // Overwritten, now attributed to the latest run
        assert_eq!(record.peh_id, "peh-b");
    }
}
