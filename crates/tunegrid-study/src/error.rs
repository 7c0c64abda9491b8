//! Error types for study configuration and trial resolution.

use thiserror::Error;

use crate::parameter::{ExternalType, ParameterValue};

/// Result type alias for study operations.
pub type StudyResult<T> = Result<T, StudyError>;

#[derive(Debug, Error)]
pub enum StudyError {
    /// The trial carries parameters the search space cannot account for.
    #[error("invalid trial {trial} for this search space: parameters not present in search space: {unresolved:?}")]
    ParametersNotInSearchSpace {
        trial: String,
        unresolved: Vec<String>,
    },

    #[error("cannot cast parameter '{name}' value {value} to {target}")]
    Cast {
        name: String,
        value: ParameterValue,
        target: ExternalType,
    },

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("{0} does not support conditional search spaces")]
    NonFlatSearchSpace(&'static str),
}
