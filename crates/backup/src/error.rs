//! Backup error types
//!
//! The taxonomy mirrors how failures must be handled:
//!
//! - I/O and encoding errors surface immediately, no retry
//! - Structural and checksum failures happen before anything destructive
//! - Validation failures abort the import transaction with the full list of
//!   offending tables and references
//! - Unsupported strategies fail explicitly, never fall back to replace-all

use crate::importer::{RestoreStrategy, ValidationReport};
use std::io;
use thiserror::Error;

/// Result type for backup operations
pub type BackupResult<T> = Result<T, BackupError>;

/// Errors that can occur during backup and restore operations
#[derive(Debug, Error)]
pub enum BackupError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error raised by the live store
    #[error("Store error: {0}")]
    Store(#[from] fieldcheck_core::StoreError),

    /// Artifact is structurally broken (missing/invalid required fields)
    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),

    /// Required file missing from a backup directory
    #[error("Missing required file: {0}")]
    MissingFile(String),

    /// Artifact was produced by an incompatible schema version
    #[error("Unsupported database version: {version}. This build reads versions up to {supported}.")]
    UnsupportedVersion {
        /// Version stored in the artifact
        version: u32,
        /// Newest version this build understands
        supported: u32,
    },

    /// Stored checksum does not match the recomputed one
    ///
    /// Treated as corruption: restore stops before touching the store.
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Checksum stored in the artifact metadata
        expected: String,
        /// Checksum recomputed over the artifact content
        actual: String,
    },

    /// Post-import validation failed; the transaction was rolled back
    #[error("Post-import validation failed: {0}")]
    Validation(ValidationReport),

    /// Restore strategy is declared but not implemented
    #[error("Unsupported restore strategy: {0}. Only replace_all is implemented.")]
    UnsupportedStrategy(RestoreStrategy),

    /// Archive (tar) operation failed
    #[error("Archive error: {0}")]
    Archive(String),

    /// Compression/decompression failed
    #[error("Compression error: {0}")]
    Compression(String),

    /// Settings export/import failed
    #[error("Settings error: {0}")]
    Settings(String),

    /// Another backup or restore is already running against this engine
    #[error("A backup or restore operation is already in progress")]
    OperationInProgress,

    /// Pipeline was cancelled at a stage boundary
    #[error("Operation cancelled during {stage}")]
    Cancelled {
        /// Stage at whose boundary the cancellation was observed
        stage: String,
    },
}

impl BackupError {
    /// Create an archive error
    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    /// Create a compression error
    pub fn compression(msg: impl Into<String>) -> Self {
        Self::Compression(msg.into())
    }

    /// Create an invalid-artifact error
    pub fn invalid_artifact(msg: impl Into<String>) -> Self {
        Self::InvalidArtifact(msg.into())
    }

    /// Create a missing-file error
    pub fn missing_file(path: impl Into<String>) -> Self {
        Self::MissingFile(path.into())
    }

    /// Create a settings error
    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }
}
