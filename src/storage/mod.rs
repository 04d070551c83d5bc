//! Object storage access for the completion handler.
//!
//! Provides the [`StorageProbe`] collaborator seam (key listing and per-object
//! stat) plus [`StorageClient`], a thin wrapper over `object_store` supporting
//! S3 and local filesystem backends. The client also carries the small
//! get/atomic-write surface used by the document-backed catalog and tracker.

mod local;
mod s3;
mod url_parser;

pub use url_parser::BackendConfig;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use snafu::prelude::*;
use std::borrow::Cow;
use std::sync::Arc;

use crate::error::{ObjectStoreSnafu, StorageError};

// Re-export config types
pub use local::LocalConfig;
pub use s3::S3Config;

/// A reference-counted storage client.
pub type StorageClientRef = Arc<StorageClient>;

/// Size and last-modified timestamp of a single object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectStat {
    /// Object size in bytes.
    pub size: u64,
    /// Last-modified timestamp reported by the store.
    pub last_modified: DateTime<Utc>,
}

/// Collaborator seam for produced-object discovery and per-object stat.
///
/// The production implementation is [`StorageClient`]; tests substitute
/// in-memory fakes to inject listing and lookup failures.
#[async_trait]
pub trait StorageProbe: Send + Sync {
    /// List object keys under a prefix, sorted lexicographically.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Look up size and last-modified timestamp for a single key.
    ///
    /// Fails with a "not found" storage error if the object no longer exists
    /// (e.g., deleted between listing and stat).
    async fn stat(&self, key: &str) -> Result<ObjectStat, StorageError>;
}

/// Storage client that abstracts over S3 and local filesystem backends.
#[derive(Clone)]
pub struct StorageClient {
    config: BackendConfig,
    object_store: Arc<dyn ObjectStore>,
    canonical_url: String,
}

impl std::fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StorageClient<{}>", self.canonical_url)
    }
}

impl StorageClient {
    /// Create a storage client for the given URL.
    ///
    /// Accepts `s3://bucket[/prefix]`, path-style and virtual-hosted S3 HTTPS
    /// URLs, `file://` URIs, and absolute local paths.
    pub async fn for_url(url: &str) -> Result<Self, StorageError> {
        let config = BackendConfig::parse_url(url)?;

        match config {
            BackendConfig::S3(config) => Self::construct_s3(config),
            BackendConfig::Local(config) => Self::construct_local(config).await,
        }
    }

    pub(crate) fn from_parts(
        config: BackendConfig,
        object_store: Arc<dyn ObjectStore>,
        canonical_url: String,
    ) -> Self {
        Self {
            config,
            object_store,
            canonical_url,
        }
    }

    /// Get the backend configuration.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Qualify a path with the configured key prefix.
    fn qualify_path<'a>(&self, path: &'a Path) -> Cow<'a, Path> {
        match self.config.key() {
            Some(prefix) => Cow::Owned(prefix.parts().chain(path.parts()).collect()),
            None => Cow::Borrowed(path),
        }
    }

    /// Get the contents of a document.
    pub async fn get(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        let bytes = self
            .object_store
            .get(&self.qualify_path(path))
            .await
            .context(ObjectStoreSnafu)?
            .bytes()
            .await
            .context(ObjectStoreSnafu)?;
        Ok(bytes.to_vec())
    }

    /// Atomically write content to a path using temp file + rename.
    ///
    /// The target is never partially written: content lands at `{path}.tmp`
    /// first and is renamed over the target, so concurrent readers see either
    /// the old document or the new one.
    pub async fn atomic_write(&self, path: &Path, content: Vec<u8>) -> Result<(), StorageError> {
        let temp_path = Path::from(format!("{path}.tmp"));
        let qualified_temp = self.qualify_path(&temp_path).into_owned();
        let qualified_target = self.qualify_path(path).into_owned();

        self.object_store
            .put(&qualified_temp, PutPayload::from(content))
            .await
            .context(ObjectStoreSnafu)?;
        self.object_store
            .rename(&qualified_temp, &qualified_target)
            .await
            .context(ObjectStoreSnafu)?;
        Ok(())
    }
}

#[async_trait]
impl StorageProbe for StorageClient {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let full_prefix: Path = match self.config.key() {
            Some(key) => key.parts().chain(Path::from(prefix).parts()).collect(),
            None => Path::from(prefix),
        };

        let metas: Vec<object_store::ObjectMeta> = self
            .object_store
            .list(Some(&full_prefix))
            .try_collect()
            .await
            .context(ObjectStoreSnafu)?;

        let key_part_count = self
            .config
            .key()
            .map(|key| key.parts().count())
            .unwrap_or_default();

        // Strip the configured base prefix so callers get bucket-relative keys
        let mut keys: Vec<String> = metas
            .into_iter()
            .map(|meta| {
                let relative: Path = meta.location.parts().skip(key_part_count).collect();
                relative.to_string()
            })
            .collect();
        keys.sort();

        Ok(keys)
    }

    async fn stat(&self, key: &str) -> Result<ObjectStat, StorageError> {
        let path = Path::from(key);
        let meta = self
            .object_store
            .head(&self.qualify_path(&path))
            .await
            .context(ObjectStoreSnafu)?;

        Ok(ObjectStat {
            size: meta.size,
            last_modified: meta.last_modified,
        })
    }
}
