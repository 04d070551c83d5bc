//! S3 storage backend implementation.

use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::{ObjectStore, RetryConfig};
use snafu::prelude::*;
use std::sync::Arc;

use crate::error::{S3ConfigSnafu, StorageError};

use super::{BackendConfig, StorageClient};

/// S3 storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub region: Option<String>,
    pub bucket: String,
    pub key: Option<Path>,
}

impl StorageClient {
    pub(super) fn construct_s3(config: S3Config) -> Result<Self, StorageError> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(&config.bucket)
            .with_retry(RetryConfig::default());

        if let Some(region) = &config.region {
            builder = builder.with_region(region);
        }

        let canonical_url = match &config.region {
            Some(region) => format!("https://s3.{}.amazonaws.com/{}", region, config.bucket),
            None => format!("https://s3.amazonaws.com/{}", config.bucket),
        };

        let object_store: Arc<dyn ObjectStore> =
            Arc::new(builder.build().context(S3ConfigSnafu)?);

        Ok(Self::from_parts(
            BackendConfig::S3(config),
            object_store,
            canonical_url,
        ))
    }
}
