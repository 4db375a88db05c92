//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::SessionError;
use quiz_core::parser::FormatError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `UploadService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UploadError {
    #[error("the file is not valid UTF-8 text")]
    Decode(#[source] std::str::Utf8Error),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UploadError {
    /// True for problems with the uploaded file itself, as opposed to backend failures.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Format(_))
    }
}

/// Errors emitted by `SessionStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("session store lock poisoned")]
    Poisoned,
    #[error("unreadable session snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Errors emitted by `QuizLoopService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizLoopError {
    #[error("quiz session expired, please start the quiz again")]
    SessionExpired,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors emitted by `QuizServices`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Loop(#[from] QuizLoopError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl QuizServicesError {
    /// True when the uploaded file was rejected rather than a backend failing.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Upload(err) if err.is_user_error())
    }
}
