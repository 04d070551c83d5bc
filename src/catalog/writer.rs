//! Metadata catalog writer.
//!
//! Turns a set of produced object keys into catalog upserts: stat each key,
//! assemble a record, upsert it. Each upsert is independent and idempotent,
//! so the whole batch is safe to retry. A failed lookup or upsert aborts the
//! remaining batch and propagates, so the orchestrator can record an accurate
//! failure state.

use std::sync::Arc;

use snafu::prelude::*;
use tracing::debug;

use crate::emit;
use crate::error::{CatalogError, LookupSnafu};
use crate::metrics::events::ObjectCataloged;
use crate::storage::StorageProbe;

use super::{CatalogStore, ObjectMetadataRecord, StageContext};

/// Writes one catalog record per produced object key.
pub struct MetadataCatalogWriter {
    probe: Arc<dyn StorageProbe>,
    store: Arc<dyn CatalogStore>,
}

impl MetadataCatalogWriter {
    /// Create a writer over the given probe and catalog store.
    pub fn new(probe: Arc<dyn StorageProbe>, store: Arc<dyn CatalogStore>) -> Self {
        Self { probe, store }
    }

    /// Catalog every key in the batch, returning the number of records written.
    ///
    /// Order is irrelevant and duplicates are tolerated via upsert. Fails fast
    /// on the first lookup or upsert error.
    pub async fn catalog(
        &self,
        bucket: &str,
        keys: &[String],
        ctx: &StageContext,
    ) -> Result<usize, CatalogError> {
        let mut written = 0;

        for key in keys {
            let stat = self
                .probe
                .stat(key)
                .await
                .context(LookupSnafu { key: key.clone() })?;

            let record = ObjectMetadataRecord::from_stat(bucket, key, &stat, ctx);
            self.store.upsert(&record).await?;

            written += 1;
            emit!(ObjectCataloged {
                pipeline: ctx.pipeline.clone(),
            });
        }

        debug!(
            bucket = %bucket,
            count = written,
            peh_id = %ctx.peh_id,
            "Catalog batch complete"
        );
        Ok(written)
    }
}
