//! Error types for Repoflat.

use std::path::PathBuf;

use crate::output::OutputError;
use crate::remote::RemoteError;
use crate::walker::WalkError;

/// Top-level error type for Repoflat operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoflatError {
    #[error("{0}")]
    Usage(String),

    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("walk error: {0}")]
    Walk(WalkError),

    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

impl From<WalkError> for RepoflatError {
    fn from(error: WalkError) -> Self {
        match error {
            WalkError::NotFound { path } => RepoflatError::PathNotFound(path),
            WalkError::PermissionDenied { path } => RepoflatError::PermissionDenied(path),
            other => RepoflatError::Walk(other),
        }
    }
}

/// Map an error to its exit code.
pub fn exit_code(error: &RepoflatError) -> i32 {
    match error {
        RepoflatError::Usage(_) => 2,
        RepoflatError::PathNotFound(_) => 3,
        RepoflatError::PermissionDenied(_) => 4,
        RepoflatError::Io(_) => 1,
        RepoflatError::Walk(_) => 1,
        RepoflatError::Remote(_) => 6,
        RepoflatError::Output(_) => 1,
    }
}
