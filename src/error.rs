//! Error types for the version-control core.

use crate::types::{BranchId, RevisionId};
use thiserror::Error;

/// Main error type for core operations.
///
/// Every variant is recoverable: a failed operation leaves the prior state
/// untouched.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid parent revision: {0}")]
    InvalidParent(RevisionId),

    #[error("Invalid revision: {0}")]
    InvalidRevision(RevisionId),

    #[error("Unknown branch: {0}")]
    UnknownBranch(BranchId),

    #[error("Unknown revision: {0}")]
    UnknownRevision(RevisionId),

    #[error("A branch named \"{0}\" already exists")]
    DuplicateBranchName(String),

    #[error("Branch name cannot be empty")]
    EmptyBranchName,

    #[error("Merge preview is stale: {0}. Re-run preview.")]
    StalePreview(String),

    #[error("Snapshot not recognized: {0}")]
    UnrecognizedSnapshot(String),

    #[error("Snapshot is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot file is locked by another process")]
    Locked,
}

impl CoreError {
    /// Whether the error is a validation message meant to be shown inline
    /// next to the control that triggered it.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            CoreError::DuplicateBranchName(_)
                | CoreError::EmptyBranchName
                | CoreError::StalePreview(_)
        )
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
