//! Metadata cataloging for produced objects.
//!
//! One [`ObjectMetadataRecord`] is written per produced object key, carrying
//! the pipeline context of the run that produced it. Records are keyed by
//! (bucket, key) with upsert semantics, so retrying a batch never duplicates.

mod record;
mod store;
mod writer;

pub use record::{ObjectMetadataRecord, RECORD_STAGE, StageContext};
pub use store::{CatalogStore, StorageCatalog};
pub use writer::MetadataCatalogWriter;
