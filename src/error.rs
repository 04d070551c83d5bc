//! Error types for the stagehand completion handler.

use snafu::prelude::*;

use crate::execution::ExecutionState;

// ============ Storage Errors ============

/// Errors that can occur during storage operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StorageError {
    /// Invalid storage URL format.
    #[snafu(display("Invalid storage URL: {url}"))]
    InvalidUrl { url: String },

    /// Object store operation failed.
    #[snafu(display("Storage operation failed: {source}"))]
    ObjectStore { source: object_store::Error },

    /// IO error during storage operations.
    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },

    /// S3 configuration error.
    #[snafu(display("S3 configuration error: {source}"))]
    S3Config { source: object_store::Error },
}

impl StorageError {
    /// Check if this error represents a "not found" condition (404, NoSuchKey, etc.)
    pub fn is_not_found(&self) -> bool {
        match self {
            StorageError::ObjectStore { source } => {
                matches!(source, object_store::Error::NotFound { .. })
            }
            _ => false,
        }
    }
}

// ============ Catalog Errors ============

/// Errors that can occur while cataloging object metadata.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CatalogError {
    /// Object stat lookup failed (e.g., object deleted between listing and stat).
    #[snafu(display("Failed to look up object '{key}': {source}"))]
    Lookup { key: String, source: StorageError },

    /// Catalog store rejected the upsert.
    #[snafu(display("Catalog rejected upsert for '{key}': {message}"))]
    WriteRejected { key: String, message: String },

    /// Failed to serialize a metadata record.
    #[snafu(display("Failed to serialize metadata record: {source}"))]
    Serialize { source: serde_json::Error },
}

// ============ Tracker Errors ============

/// Errors that can occur during execution-history transitions.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TrackerError {
    /// Unknown execution identifier.
    #[snafu(display("Execution '{peh_id}' not found"))]
    ExecutionNotFound { peh_id: String },

    /// A transition was attempted out of order (e.g., after a terminal state).
    #[snafu(display("Invalid execution transition: {from:?} -> {to:?}"))]
    InvalidTransition {
        from: ExecutionState,
        to: ExecutionState,
    },

    /// Failed to persist the execution record.
    #[snafu(display("Failed to persist execution record: {source}"))]
    Store { source: StorageError },

    /// Failed to serialize the execution record.
    #[snafu(display("Failed to serialize execution record: {source}"))]
    TrackerSerialize { source: serde_json::Error },
}

// ============ Config Errors ============

/// Errors that can occur during configuration parsing and validation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// Catalog URI is empty.
    #[snafu(display("Catalog URI cannot be empty"))]
    EmptyCatalogUri,

    /// Tracker URI is empty.
    #[snafu(display("Tracker URI cannot be empty"))]
    EmptyTrackerUri,

    /// Component label is empty.
    #[snafu(display("Component label cannot be empty"))]
    EmptyComponent,

    /// Failed to parse YAML configuration.
    #[snafu(display("Failed to parse YAML: {source}"))]
    YamlParse { source: serde_yaml::Error },

    /// Failed to read configuration file.
    #[snafu(display("Failed to read configuration file: {source}"))]
    ReadFile { source: std::io::Error },
}

// ============ Handler Errors ============

/// Top-level handler errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum HandlerError {
    /// Storage error.
    #[snafu(display("Storage error: {source}"))]
    Storage { source: StorageError },

    /// Catalog error.
    #[snafu(display("Catalog error: {source}"))]
    Catalog { source: CatalogError },

    /// Execution tracker error.
    #[snafu(display("Execution tracker error: {source}"))]
    Tracker { source: TrackerError },

    /// Configuration error.
    #[snafu(display("Configuration error: {source}"))]
    Config { source: ConfigError },

    /// Malformed stage-completion event.
    #[snafu(display("Malformed event: {source}"))]
    Event { source: serde_json::Error },

    /// Anything that does not fit the taxonomy above.
    #[snafu(display("Unexpected error: {message}"))]
    Unexpected { message: String },
}

impl HandlerError {
    /// Check if this error represents a "not found" condition.
    pub fn is_not_found(&self) -> bool {
        match self {
            HandlerError::Storage { source } => source.is_not_found(),
            HandlerError::Catalog {
                source: CatalogError::Lookup { source, .. },
            } => source.is_not_found(),
            _ => false,
        }
    }
}

impl From<StorageError> for HandlerError {
    fn from(source: StorageError) -> Self {
        HandlerError::Storage { source }
    }
}

impl From<CatalogError> for HandlerError {
    fn from(source: CatalogError) -> Self {
        HandlerError::Catalog { source }
    }
}

impl From<TrackerError> for HandlerError {
    fn from(source: TrackerError) -> Self {
        HandlerError::Tracker { source }
    }
}

impl From<ConfigError> for HandlerError {
    fn from(source: ConfigError) -> Self {
        HandlerError::Config { source }
    }
}
