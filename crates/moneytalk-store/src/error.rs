//! Error types for the journal store.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur in the journal store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A field failed validation. Nothing was written.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Database connection or operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Schema migration failed.
    #[error("Migration error: {0}")]
    Migration(String),

    /// Filesystem error while opening the store.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested entity not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A photo payload could not be decoded or re-encoded.
    #[error("Image error: {0}")]
    ImageProcessing(String),

    /// Persisted data could not be read back into an entity.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Coarse classification of store failures, for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Storage,
    ImageProcessing,
}

impl StoreError {
    /// Classify this error into validation, storage, or image-processing.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::ImageProcessing(_) => ErrorKind::ImageProcessing,
            Self::Database(_)
            | Self::Migration(_)
            | Self::Io(_)
            | Self::NotFound(_)
            | Self::InvalidData(_) => ErrorKind::Storage,
        }
    }

    /// Whether this is a validation failure.
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
