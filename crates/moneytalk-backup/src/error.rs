//! Error types for backup and report generation.

use thiserror::Error;

use moneytalk_store::StoreError;

#[derive(Debug, Error)]
pub enum BackupError {
    /// Nothing suitable to export, or the output could not be produced.
    #[error("Export error: {0}")]
    Export(String),

    /// The backup document as a whole could not be read.
    #[error("Import error: {0}")]
    Import(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// A storage failure that aborted an import.
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, BackupError>;
