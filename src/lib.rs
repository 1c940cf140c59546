//! fieldcheck — backup/restore engine for inspection data
//!
//! fieldcheck records equipment check-ups for fuel dispensing sites: clients,
//! facilities, pump islands, periodic check-ups with per-item results and
//! photos, spare parts, contacts, contracts and technical interventions.
//! This crate is the backup subsystem: it snapshots the whole relational
//! store into a portable, checksummed artifact and restores such artifacts
//! transactionally.
//!
//! # Quick Start
//!
//! ```ignore
//! use fieldcheck::{
//!     BackupEngine, BackupFileManager, BackupOptions, CancelFlag, FieldStore,
//!     JsonSettingsStore, PhotoArchiver, ProgressSink, RestoreOptions,
//! };
//!
//! let store = FieldStore::new();
//! let engine = BackupEngine::new(
//!     store.clone(),
//!     BackupFileManager::new("/data/backups"),
//!     PhotoArchiver::new("/data/photos"),
//!     JsonSettingsStore::new("/data/settings.json"),
//! );
//!
//! // Create a backup, watching progress.
//! let (events, mut rx) = ProgressSink::channel();
//! let report = engine
//!     .create_backup(&BackupOptions::default(), &events, &CancelFlag::new())
//!     .await?;
//!
//! // Restore it later.
//! let restored = engine
//!     .restore_backup(&report.path, &RestoreOptions::default(),
//!                     &ProgressSink::discard(), &CancelFlag::new())
//!     .await?;
//! ```
//!
//! # Architecture
//!
//! The engine sequences exporter → codec → file manager on the way out and
//! file manager → codec → importer on the way back. The importer applies a
//! snapshot inside one store transaction: clear all tables in reverse
//! dependency order, insert in forward order, validate counts and references,
//! then commit — or roll back leaving the store untouched. Checksums are
//! verified before anything destructive happens.

pub use fieldcheck_backup::{
    codec, ArchiveProgress, ArtifactSummary, BackupEngine, BackupError, BackupEvent,
    BackupFileManager, BackupMetadata, BackupOptions, BackupReport, BackupResult, BackupStage,
    CancelFlag, CountMismatch, DeviceInfo, ImportStats, JsonSettingsStore, PhotoArchiver,
    PhotoEntry, PhotoManifest, ProgressSink, RestoreEvent, RestoreOptions, RestoreReport,
    RestoreStage, RestoreStrategy, SaveMode, SettingsBlob, SettingsStore, Snapshot, TableExporter,
    TableImporter, TableSections, ValidationReport, CHECKSUM_ALGORITHM, DATABASE_SCHEMA_VERSION,
};
pub use fieldcheck_core::{
    BackupId, CheckItemOutcome, CheckItemRecord, CheckUpIslandRecord, CheckUpRecord, CheckUpStatus,
    ClientRecord, ContactRecord, ContractRecord, FacilityRecord, InterventionRecord, IslandRecord,
    PhotoRecord, RowId, SparePartRecord, StoreError, StoreResult, Table, DEPENDENCY_ORDER,
};
pub use fieldcheck_store::{FieldStore, OrphanRef, TableData, Transaction, TransactionStatus};
