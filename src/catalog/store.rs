//! Catalog store collaborator.

use async_trait::async_trait;
use object_store::path::Path;
use snafu::prelude::*;
use tracing::debug;

use crate::error::{CatalogError, SerializeSnafu};
use crate::storage::StorageClientRef;

use super::ObjectMetadataRecord;

/// Upsert-capable metadata store keyed by (bucket, key).
///
/// Re-writing the same key overwrites the previous record, so a whole batch
/// is safe to retry.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Persist or overwrite the record under its natural key.
    async fn upsert(&self, record: &ObjectMetadataRecord) -> Result<(), CatalogError>;
}

/// Catalog store that persists one JSON document per object.
///
/// Documents live at `{bucket}/{key}.json` under the configured catalog URI.
/// Atomic temp-file + rename writes give upsert semantics: a re-run replaces
/// the document rather than appending.
pub struct StorageCatalog {
    storage: StorageClientRef,
}

impl StorageCatalog {
    /// Create a catalog store over the given storage location.
    pub fn new(storage: StorageClientRef) -> Self {
        Self { storage }
    }

    fn document_path(record: &ObjectMetadataRecord) -> Path {
        let bucket = &record.bucket;
        let key = &record.key;
        Path::from(format!("{bucket}/{key}.json"))
    }
}

#[async_trait]
impl CatalogStore for StorageCatalog {
    async fn upsert(&self, record: &ObjectMetadataRecord) -> Result<(), CatalogError> {
        let path = Self::document_path(record);
        let content = serde_json::to_vec_pretty(record).context(SerializeSnafu)?;

        self.storage
            .atomic_write(&path, content)
            .await
            .map_err(|e| CatalogError::WriteRejected {
                key: record.key.clone(),
                message: e.to_string(),
            })?;

        debug!(bucket = %record.bucket, key = %record.key, "Upserted catalog record");
        Ok(())
    }
}
