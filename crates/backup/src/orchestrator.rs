//! Backup engine — pipeline orchestration
//!
//! [`BackupEngine`] sequences the two pipelines:
//!
//! ```text
//! create:  integrity check → export tables → export settings
//!          → archive photos → assemble metadata → checksum → persist
//!
//! restore: load → validate structure → verify checksum
//!          → import tables (transactional) → restore photos → restore settings
//! ```
//!
//! Stages run strictly in order; each stage's output feeds the next. Every
//! stage emits an in-progress event with a fraction in [0,1] and a label;
//! the first failure terminates the pipeline with a single `Failed` event
//! naming the stage and the cause. Checksum verification happens before the
//! importer ever opens its transaction, so a corrupted artifact can never
//! destroy a good live dataset. Settings-restore failure is the one
//! non-fatal step: it is logged and reported, but the restore still
//! completes, because settings do not affect table integrity.
//!
//! Backup and restore take the engine's operation lock; a second operation
//! started while one is running fails fast with `OperationInProgress`
//! instead of interleaving with it.

use crate::error::{BackupError, BackupResult};
use crate::exporter::TableExporter;
use crate::files::{ArtifactSummary, BackupFileManager, SaveMode, SavedArtifact, PHOTO_ARCHIVE_FILE};
use crate::importer::{ImportStats, RestoreStrategy, TableImporter};
use crate::photo_archive::PhotoArchiver;
use crate::progress::{BackupStage, CancelFlag, ProgressSink, RestoreStage};
use crate::settings::SettingsStore;
use crate::snapshot::{
    BackupMetadata, DeviceInfo, PhotoManifest, Snapshot, DATABASE_SCHEMA_VERSION,
};
use crate::codec;
use fieldcheck_core::table::DEPENDENCY_ORDER;
use fieldcheck_core::types::BackupId;
use fieldcheck_core::StoreError;
use fieldcheck_store::FieldStore;
use chrono::Utc;
use parking_lot::Mutex;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Options for the create pipeline
#[derive(Debug, Clone)]
pub struct BackupOptions {
    /// Free-text description stored in the metadata
    pub description: String,
    /// Whether to build the photo archive
    pub include_photos: bool,
    /// Whether the photo archive also carries thumbnails
    pub include_thumbnails: bool,
    /// Whether to write split metadata/database/settings files
    pub split_files: bool,
    /// Descriptor of the producing device
    pub device_info: DeviceInfo,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            description: String::new(),
            include_photos: true,
            include_thumbnails: false,
            split_files: false,
            device_info: DeviceInfo::default(),
        }
    }
}

/// Options for the restore pipeline
#[derive(Debug, Clone)]
pub struct RestoreOptions {
    /// How the snapshot is applied to the store
    pub strategy: RestoreStrategy,
    /// Whether to extract the photo archive
    pub restore_photos: bool,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            strategy: RestoreStrategy::ReplaceAll,
            restore_photos: true,
        }
    }
}

/// Terminal result of a completed backup
#[derive(Debug, Clone)]
pub struct BackupReport {
    pub id: BackupId,
    /// Final backup directory
    pub path: PathBuf,
    pub total_size_bytes: u64,
    pub duration: Duration,
    /// Number of tables included in the snapshot
    pub tables_backed_up: u64,
    pub total_records: u64,
    pub photos_archived: u64,
}

/// Terminal result of a completed restore
#[derive(Debug, Clone)]
pub struct RestoreReport {
    pub id: BackupId,
    /// Row statistics after the committed import
    pub stats: ImportStats,
    pub photos_restored: u64,
    /// False when the settings step failed (non-fatal)
    pub settings_restored: bool,
    pub duration: Duration,
    /// True when the snapshot carried zero records; flagged, not rejected
    pub was_empty: bool,
}

/// Events emitted by the create pipeline
#[derive(Debug, Clone)]
pub enum BackupEvent {
    /// A stage is running
    InProgress {
        stage: BackupStage,
        /// Fraction of total work completed, in [0,1]
        fraction: f64,
        message: String,
    },
    /// The pipeline finished; always the last event on success
    Completed(BackupReport),
    /// The pipeline failed; always the last event on failure
    Failed { stage: String, message: String },
}

/// Events emitted by the restore pipeline
#[derive(Debug, Clone)]
pub enum RestoreEvent {
    /// A stage is running
    InProgress {
        stage: RestoreStage,
        /// Fraction of total work completed, in [0,1]
        fraction: f64,
        message: String,
    },
    /// The pipeline finished; always the last event on success
    Completed(RestoreReport),
    /// The pipeline failed; always the last event on failure
    Failed { stage: String, message: String },
}

/// Coordinates exporters, importer, codec, files, photos and settings
pub struct BackupEngine<S: SettingsStore> {
    store: FieldStore,
    files: BackupFileManager,
    archiver: PhotoArchiver,
    settings: S,
    op_lock: Mutex<()>,
}

type StageResult<T> = Result<T, (String, BackupError)>;

fn fail<T>(stage: impl fmt::Display, err: impl Into<BackupError>) -> StageResult<T> {
    Err((stage.to_string(), err.into()))
}

impl<S: SettingsStore> BackupEngine<S> {
    /// Create an engine over explicit collaborator handles
    pub fn new(
        store: FieldStore,
        files: BackupFileManager,
        archiver: PhotoArchiver,
        settings: S,
    ) -> Self {
        Self {
            store,
            files,
            archiver,
            settings,
            op_lock: Mutex::new(()),
        }
    }

    /// List saved backups, newest first
    pub fn list_backups(&self) -> BackupResult<Vec<ArtifactSummary>> {
        self.files.list_artifacts()
    }

    /// Delete a saved backup by id
    pub fn delete_backup(&self, id: &BackupId) -> BackupResult<()> {
        self.files.delete_artifact(id)
    }

    /// Run the create pipeline
    ///
    /// Emits in-progress events throughout and exactly one terminal event.
    /// Cancellation is honored at stage boundaries.
    pub async fn create_backup(
        &self,
        options: &BackupOptions,
        events: &ProgressSink<BackupEvent>,
        cancel: &CancelFlag,
    ) -> BackupResult<BackupReport> {
        let Some(_guard) = self.op_lock.try_lock() else {
            let err = BackupError::OperationInProgress;
            events.emit(BackupEvent::Failed {
                stage: "starting".to_string(),
                message: err.to_string(),
            });
            return Err(err);
        };

        let started = Instant::now();
        match self.run_create(options, events, cancel, started).await {
            Ok(report) => {
                info!(
                    backup = %report.id,
                    records = report.total_records,
                    size = report.total_size_bytes,
                    "backup completed"
                );
                events.emit(BackupEvent::Completed(report.clone()));
                Ok(report)
            }
            Err((stage, err)) => {
                warn!(stage = %stage, error = %err, "backup failed");
                events.emit(BackupEvent::Failed {
                    stage,
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn run_create(
        &self,
        options: &BackupOptions,
        events: &ProgressSink<BackupEvent>,
        cancel: &CancelFlag,
        started: Instant,
    ) -> StageResult<BackupReport> {
        // Integrity check: refuse to snapshot a store that already has
        // dangling references; such a backup would never restore.
        let stage = BackupStage::IntegrityCheck;
        self.backup_checkpoint(stage, cancel).await?;
        events.emit(progress(stage, 0.05));
        let orphans = self.store.orphans();
        if !orphans.is_empty() {
            let detail: Vec<String> = orphans.iter().map(|o| o.to_string()).collect();
            return fail(
                stage,
                StoreError::integrity(format!(
                    "live store has {} dangling references: {}",
                    orphans.len(),
                    detail.join("; ")
                )),
            );
        }

        let stage = BackupStage::ExportTables;
        self.backup_checkpoint(stage, cancel).await?;
        events.emit(progress(stage, 0.20));
        let exporter = TableExporter::new(self.store.clone());
        let database = match exporter.export_all_tables() {
            Ok(sections) => sections,
            Err(e) => return fail(stage, e),
        };

        let stage = BackupStage::ExportSettings;
        self.backup_checkpoint(stage, cancel).await?;
        events.emit(progress(stage, 0.30));
        let settings = match self.settings.export_settings() {
            Ok(blob) => blob,
            Err(e) => return fail(stage, e),
        };

        // The backup directory is fixed from here on: id and timestamp are
        // assigned once and the photo archive is written straight into it.
        let id = BackupId::new();
        let created_at = Utc::now();
        let dir = self.files.generate_backup_path(&id, &created_at);

        let stage = BackupStage::ArchivePhotos;
        self.backup_checkpoint(stage, cancel).await?;
        let photo_manifest = if options.include_photos {
            events.emit(progress(stage, 0.35));
            let archive_path = dir.join(PHOTO_ARCHIVE_FILE);
            let result = self.archiver.create_archive(
                &archive_path,
                options.include_thumbnails,
                |p| {
                    let span = if p.total == 0 {
                        0.0
                    } else {
                        p.processed as f64 / p.total as f64
                    };
                    events.emit(BackupEvent::InProgress {
                        stage,
                        fraction: 0.35 + 0.25 * span,
                        message: format!("Archiving photos ({}/{})", p.processed, p.total),
                    });
                },
            );
            match result {
                Ok(manifest) => manifest,
                Err(e) => {
                    let _ = fs::remove_dir_all(&dir);
                    return fail(stage, e);
                }
            }
        } else {
            events.emit(BackupEvent::InProgress {
                stage,
                fraction: 0.60,
                message: "Photo archive skipped".to_string(),
            });
            PhotoManifest::default()
        };

        // From here on a failed or cancelled run must also remove the backup
        // directory the archive stage may have created; a directory holding
        // only a photo archive is not a backup.
        let stage = BackupStage::AssembleMetadata;
        if let Err(e) = self.backup_checkpoint(stage, cancel).await {
            let _ = fs::remove_dir_all(&dir);
            return Err(e);
        }
        events.emit(progress(stage, 0.70));
        let mut snapshot = Snapshot {
            metadata: BackupMetadata {
                id,
                created_at,
                app_version: env!("CARGO_PKG_VERSION").to_string(),
                database_version: DATABASE_SCHEMA_VERSION,
                checksum: String::new(),
                total_size_bytes: 0,
                description: options.description.clone(),
                device_info: options.device_info.clone(),
            },
            database,
            settings,
            photo_manifest,
        };
        if snapshot.total_records() == 0 {
            warn!(backup = %id, "snapshot contains zero records");
        }
        match codec::serialize(&snapshot) {
            Ok(bytes) => snapshot.metadata.total_size_bytes = bytes.len() as u64,
            Err(e) => {
                let _ = fs::remove_dir_all(&dir);
                return fail(stage, e);
            }
        }

        let stage = BackupStage::ComputeChecksum;
        if let Err(e) = self.backup_checkpoint(stage, cancel).await {
            let _ = fs::remove_dir_all(&dir);
            return Err(e);
        }
        events.emit(progress(stage, 0.80));
        match codec::checksum(&snapshot) {
            Ok(digest) => snapshot.metadata.checksum = digest,
            Err(e) => {
                let _ = fs::remove_dir_all(&dir);
                return fail(stage, e);
            }
        }

        let stage = BackupStage::Persist;
        if let Err(e) = self.backup_checkpoint(stage, cancel).await {
            let _ = fs::remove_dir_all(&dir);
            return Err(e);
        }
        events.emit(progress(stage, 0.90));
        let mode = if options.split_files {
            SaveMode::Split
        } else {
            SaveMode::Combined
        };
        let saved: SavedArtifact = match self.files.save_artifact(&snapshot, mode, &dir) {
            Ok(saved) => saved,
            Err(e) => {
                let _ = fs::remove_dir_all(&dir);
                return fail(stage, e);
            }
        };

        Ok(BackupReport {
            id,
            path: saved.dir,
            total_size_bytes: snapshot.metadata.total_size_bytes,
            duration: started.elapsed(),
            tables_backed_up: DEPENDENCY_ORDER.len() as u64,
            total_records: snapshot.total_records(),
            photos_archived: snapshot.photo_manifest.total_photos,
        })
    }

    /// Run the restore pipeline against a backup directory or artifact file
    pub async fn restore_backup(
        &self,
        artifact_path: &Path,
        options: &RestoreOptions,
        events: &ProgressSink<RestoreEvent>,
        cancel: &CancelFlag,
    ) -> BackupResult<RestoreReport> {
        let Some(_guard) = self.op_lock.try_lock() else {
            let err = BackupError::OperationInProgress;
            events.emit(RestoreEvent::Failed {
                stage: "starting".to_string(),
                message: err.to_string(),
            });
            return Err(err);
        };

        let started = Instant::now();
        match self
            .run_restore(artifact_path, options, events, cancel, started)
            .await
        {
            Ok(report) => {
                info!(
                    backup = %report.id,
                    rows = report.stats.total_rows,
                    "restore completed"
                );
                events.emit(RestoreEvent::Completed(report.clone()));
                Ok(report)
            }
            Err((stage, err)) => {
                warn!(stage = %stage, error = %err, "restore failed");
                events.emit(RestoreEvent::Failed {
                    stage,
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn run_restore(
        &self,
        artifact_path: &Path,
        options: &RestoreOptions,
        events: &ProgressSink<RestoreEvent>,
        cancel: &CancelFlag,
        started: Instant,
    ) -> StageResult<RestoreReport> {
        let stage = RestoreStage::Load;
        self.restore_checkpoint(stage, cancel).await?;
        events.emit(rprogress(stage, 0.10));
        let snapshot = match self.files.load_artifact(artifact_path) {
            Ok(snapshot) => snapshot,
            Err(e) => return fail(stage, e),
        };

        let stage = RestoreStage::ValidateStructure;
        self.restore_checkpoint(stage, cancel).await?;
        events.emit(rprogress(stage, 0.20));
        if let Err(e) = validate_structure(&snapshot) {
            return fail(stage, e);
        }

        // Corruption gate: this must pass before Clearing can ever begin.
        let stage = RestoreStage::VerifyChecksum;
        self.restore_checkpoint(stage, cancel).await?;
        events.emit(rprogress(stage, 0.30));
        if let Err(e) = codec::verify_stored(&snapshot) {
            return fail(stage, e);
        }

        let stage = RestoreStage::ImportTables;
        self.restore_checkpoint(stage, cancel).await?;
        let was_empty = snapshot.total_records() == 0;
        events.emit(RestoreEvent::InProgress {
            stage,
            fraction: 0.40,
            message: if was_empty {
                "Restoring database (empty snapshot)".to_string()
            } else {
                stage.label().to_string()
            },
        });
        // No cancellation from here to commit: the transaction runs to
        // completion or rolls back as a whole.
        let importer = TableImporter::new(self.store.clone());
        let stats = match importer.import_all_tables(&snapshot, options.strategy) {
            Ok(stats) => stats,
            Err(e) => return fail(stage, e),
        };
        events.emit(rprogress(stage, 0.70));

        let stage = RestoreStage::RestorePhotos;
        self.restore_checkpoint(stage, cancel).await?;
        events.emit(rprogress(stage, 0.80));
        let photos_restored = if options.restore_photos {
            let dir = if artifact_path.is_dir() {
                artifact_path.to_path_buf()
            } else {
                artifact_path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default()
            };
            let archive = dir.join(PHOTO_ARCHIVE_FILE);
            if archive.exists() {
                let photos_root = self.archiver.photos_root().to_path_buf();
                let result = self.archiver.extract_archive(&archive, &photos_root, |p| {
                        events.emit(RestoreEvent::InProgress {
                            stage,
                            fraction: 0.85,
                            message: format!("Restoring photos ({})", p.processed),
                        });
                    },
                );
                match result {
                    Ok(count) => count,
                    Err(e) => return fail(stage, e),
                }
            } else if snapshot.photo_manifest.total_photos > 0 {
                return fail(
                    stage,
                    BackupError::missing_file(archive.display().to_string()),
                );
            } else {
                0
            }
        } else {
            0
        };

        // Settings are the one non-fatal step: the database is already
        // committed and consistent, so a bad settings blob only costs
        // preferences, not data.
        let stage = RestoreStage::RestoreSettings;
        self.restore_checkpoint(stage, cancel).await?;
        events.emit(rprogress(stage, 0.95));
        let settings_restored = match self.settings.import_settings(&snapshot.settings) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "settings restore failed; continuing");
                false
            }
        };

        Ok(RestoreReport {
            id: snapshot.metadata.id,
            stats,
            photos_restored,
            settings_restored,
            duration: started.elapsed(),
            was_empty,
        })
    }

    async fn backup_checkpoint(
        &self,
        stage: BackupStage,
        cancel: &CancelFlag,
    ) -> StageResult<()> {
        tokio::task::yield_now().await;
        cancel.ensure(stage).or_else(|e| fail(stage, e))
    }

    async fn restore_checkpoint(
        &self,
        stage: RestoreStage,
        cancel: &CancelFlag,
    ) -> StageResult<()> {
        tokio::task::yield_now().await;
        cancel.ensure(stage).or_else(|e| fail(stage, e))
    }
}

fn progress(stage: BackupStage, fraction: f64) -> BackupEvent {
    BackupEvent::InProgress {
        stage,
        fraction,
        message: stage.label().to_string(),
    }
}

fn rprogress(stage: RestoreStage, fraction: f64) -> RestoreEvent {
    RestoreEvent::InProgress {
        stage,
        fraction,
        message: stage.label().to_string(),
    }
}

/// Structural shape validation, run before the checksum gate
fn validate_structure(snapshot: &Snapshot) -> BackupResult<()> {
    let meta = &snapshot.metadata;
    if meta.id.is_nil() {
        return Err(BackupError::invalid_artifact("metadata.id is nil"));
    }
    if meta.checksum.is_empty() {
        return Err(BackupError::invalid_artifact("metadata.checksum is empty"));
    }
    if meta.database_version > DATABASE_SCHEMA_VERSION {
        return Err(BackupError::UnsupportedVersion {
            version: meta.database_version,
            supported: DATABASE_SCHEMA_VERSION,
        });
    }
    let manifest = &snapshot.photo_manifest;
    if manifest.total_photos != manifest.photos.len() as u64 {
        return Err(BackupError::invalid_artifact(format!(
            "photo manifest count {} does not match {} photo entries",
            manifest.total_photos,
            manifest.photos.len()
        )));
    }
    // Importer's validation catches record-level problems; here we only
    // reject shapes that make the artifact unusable outright.
    Ok(())
}
