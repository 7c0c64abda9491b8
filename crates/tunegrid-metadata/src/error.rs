//! Error types for the TuneGrid metadata store.

use thiserror::Error;

use crate::namespace::Namespace;

/// Result type alias for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors that can occur while reading typed metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("key '{key}' not found in namespace '{namespace}'")]
    KeyNotFound { namespace: Namespace, key: String },

    #[error("cannot convert metadata '{key}' to {target}: {reason}")]
    Conversion {
        key: String,
        target: &'static str,
        reason: String,
    },

    #[error("payload error: {0}")]
    Payload(String),
}
