//! Progress streaming and cooperative cancellation
//!
//! Both pipelines push events to an observer through an unbounded tokio mpsc
//! channel wrapped in [`ProgressSink`]. Delivery is strictly in emission
//! order and every pipeline run ends with exactly one terminal event
//! (completed or failed). Observers are optional: if the receiver is gone,
//! sends are silently dropped and the pipeline keeps running.
//!
//! Cancellation is cooperative and checked only at stage boundaries. The
//! import transaction is the deliberate exception: once entered it runs to
//! commit or rollback, never stopping halfway.

use crate::error::{BackupError, BackupResult};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Stages of the backup creation pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupStage {
    /// Referential check of the live store before anything is written
    IntegrityCheck,
    /// Full table export
    ExportTables,
    /// Settings capture
    ExportSettings,
    /// Photo archive creation (optional)
    ArchivePhotos,
    /// Metadata assembly
    AssembleMetadata,
    /// Content checksum computation
    ComputeChecksum,
    /// Artifact persistence
    Persist,
}

impl BackupStage {
    /// Human-readable label shown to observers
    pub fn label(&self) -> &'static str {
        match self {
            BackupStage::IntegrityCheck => "Checking store integrity",
            BackupStage::ExportTables => "Exporting tables",
            BackupStage::ExportSettings => "Exporting settings",
            BackupStage::ArchivePhotos => "Archiving photos",
            BackupStage::AssembleMetadata => "Assembling metadata",
            BackupStage::ComputeChecksum => "Computing checksum",
            BackupStage::Persist => "Saving backup",
        }
    }
}

impl fmt::Display for BackupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stages of the restore pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreStage {
    /// Read artifact bytes from disk
    Load,
    /// Structural shape validation
    ValidateStructure,
    /// Checksum verification; runs strictly before any destructive work
    VerifyChecksum,
    /// Transactional table import
    ImportTables,
    /// Photo archive extraction
    RestorePhotos,
    /// Settings restore (non-fatal on failure)
    RestoreSettings,
}

impl RestoreStage {
    /// Human-readable label shown to observers
    pub fn label(&self) -> &'static str {
        match self {
            RestoreStage::Load => "Loading backup",
            RestoreStage::ValidateStructure => "Validating backup structure",
            RestoreStage::VerifyChecksum => "Verifying checksum",
            RestoreStage::ImportTables => "Restoring database",
            RestoreStage::RestorePhotos => "Restoring photos",
            RestoreStage::RestoreSettings => "Restoring settings",
        }
    }
}

impl fmt::Display for RestoreStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Cooperative cancellation flag shared between a pipeline and its caller
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Create a flag in the not-cancelled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; the pipeline stops at its next stage boundary
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with [`BackupError::Cancelled`] if cancellation was requested
    ///
    /// Called at stage boundaries; `stage` names the boundary for the error.
    pub fn ensure(&self, stage: impl fmt::Display) -> BackupResult<()> {
        if self.is_cancelled() {
            return Err(BackupError::Cancelled {
                stage: stage.to_string(),
            });
        }
        Ok(())
    }
}

/// Push-style event sink for one pipeline run
///
/// Thin wrapper over an unbounded sender: sending never blocks the pipeline
/// and a dropped receiver never fails it.
#[derive(Debug, Clone)]
pub struct ProgressSink<E> {
    tx: mpsc::UnboundedSender<E>,
}

impl<E> ProgressSink<E> {
    /// Create a sink plus the receiving end for the observer
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<E>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Create a sink nobody listens to
    pub fn discard() -> Self {
        let (sink, _rx) = Self::channel();
        sink
    }

    /// Emit an event; silently dropped if the observer went away
    pub fn emit(&self, event: E) {
        let _ = self.tx.send(event);
    }
}
