//! Backup file manager
//!
//! Owns the on-disk layout of backups. Each backup gets one directory under
//! the backup root, named deterministically from its creation timestamp and
//! the first 8 hex characters of its id:
//!
//! ```text
//! <root>/backup_20240615_080000_550e8400/
//!   backup.json       the complete artifact (always written)
//!   metadata.json     split copies (SaveMode::Split only)
//!   database.json
//!   settings.json
//!   photos.tar.zst    photo archive (when photos were included)
//!   INFO.txt          human-readable summary
//! ```
//!
//! Every file is written to a temp path and renamed into place, so a crash
//! mid-save never leaves a half-written artifact under its final name.

use crate::codec;
use crate::error::{BackupError, BackupResult};
use crate::snapshot::Snapshot;
use fieldcheck_core::table::Table;
use fieldcheck_core::types::BackupId;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Complete artifact file name
pub const ARTIFACT_FILE: &str = "backup.json";
/// Split metadata file name
pub const METADATA_FILE: &str = "metadata.json";
/// Split database file name
pub const DATABASE_FILE: &str = "database.json";
/// Split settings file name
pub const SETTINGS_FILE: &str = "settings.json";
/// Photo archive file name
pub const PHOTO_ARCHIVE_FILE: &str = "photos.tar.zst";
/// Human-readable summary file name
pub const INFO_FILE: &str = "INFO.txt";

/// How an artifact is laid out on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Only the combined `backup.json`
    Combined,
    /// Combined file plus split metadata/database/settings files
    Split,
}

/// Result of persisting an artifact
#[derive(Debug, Clone)]
pub struct SavedArtifact {
    /// Backup directory
    pub dir: PathBuf,
    /// Path of the combined artifact file
    pub artifact_path: PathBuf,
    /// Total bytes written across all files
    pub bytes_written: u64,
}

/// One row of the backup listing
#[derive(Debug, Clone)]
pub struct ArtifactSummary {
    pub id: BackupId,
    pub created_at: DateTime<Utc>,
    pub description: String,
    pub total_size_bytes: u64,
    pub total_records: u64,
    /// Backup directory
    pub path: PathBuf,
    pub has_photo_archive: bool,
}

/// Allocates paths and persists/loads backup artifacts
pub struct BackupFileManager {
    root: PathBuf,
}

impl BackupFileManager {
    /// Create a manager over the given backup root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The backup root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic directory for a backup with this id and timestamp
    pub fn generate_backup_path(&self, id: &BackupId, created_at: &DateTime<Utc>) -> PathBuf {
        let dir_name = format!(
            "backup_{}_{}",
            created_at.format("%Y%m%d_%H%M%S"),
            id.short()
        );
        self.root.join(dir_name)
    }

    /// Persist a snapshot into its backup directory
    pub fn save_artifact(
        &self,
        snapshot: &Snapshot,
        mode: SaveMode,
        dir: &Path,
    ) -> BackupResult<SavedArtifact> {
        fs::create_dir_all(dir)?;
        let mut bytes_written: u64 = 0;

        let artifact_path = dir.join(ARTIFACT_FILE);
        let artifact_json = serde_json::to_vec_pretty(snapshot)?;
        bytes_written += write_atomic(&artifact_path, &artifact_json)?;

        if mode == SaveMode::Split {
            bytes_written += write_atomic(
                &dir.join(METADATA_FILE),
                &serde_json::to_vec_pretty(&snapshot.metadata)?,
            )?;
            bytes_written += write_atomic(
                &dir.join(DATABASE_FILE),
                &serde_json::to_vec_pretty(&snapshot.database)?,
            )?;
            bytes_written += write_atomic(
                &dir.join(SETTINGS_FILE),
                &serde_json::to_vec_pretty(&snapshot.settings)?,
            )?;
        }

        bytes_written += write_atomic(&dir.join(INFO_FILE), render_info(snapshot).as_bytes())?;

        debug!(dir = %dir.display(), bytes_written, "artifact saved");
        Ok(SavedArtifact {
            dir: dir.to_path_buf(),
            artifact_path,
            bytes_written,
        })
    }

    /// Load an artifact from a backup directory or a direct file path
    pub fn load_artifact(&self, path: &Path) -> BackupResult<Snapshot> {
        let file = if path.is_dir() {
            path.join(ARTIFACT_FILE)
        } else {
            path.to_path_buf()
        };
        if !file.exists() {
            return Err(BackupError::missing_file(file.display().to_string()));
        }
        let bytes = fs::read(&file)?;
        codec::deserialize(&bytes)
    }

    /// List every readable backup under the root, newest first
    ///
    /// Unreadable directories are skipped with a warning rather than failing
    /// the whole listing; one corrupt backup must not hide the others.
    pub fn list_artifacts(&self) -> BackupResult<Vec<ArtifactSummary>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let dir = entry.path();
            match self.load_artifact(&dir) {
                Ok(snapshot) => summaries.push(ArtifactSummary {
                    id: snapshot.metadata.id,
                    created_at: snapshot.metadata.created_at,
                    description: snapshot.metadata.description.clone(),
                    total_size_bytes: snapshot.metadata.total_size_bytes,
                    total_records: snapshot.total_records(),
                    has_photo_archive: dir.join(PHOTO_ARCHIVE_FILE).exists(),
                    path: dir,
                }),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "skipping unreadable backup");
                }
            }
        }

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    /// Delete the backup directory belonging to this id
    pub fn delete_artifact(&self, id: &BackupId) -> BackupResult<()> {
        let suffix = format!("_{}", id.short());
        if self.root.exists() {
            for entry in fs::read_dir(&self.root)? {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().to_string();
                if entry.file_type()?.is_dir() && name.ends_with(&suffix) {
                    fs::remove_dir_all(entry.path())?;
                    debug!(backup = %id, dir = %name, "backup deleted");
                    return Ok(());
                }
            }
        }
        Err(BackupError::missing_file(format!("backup {}", id)))
    }
}

/// Write bytes to a temp file, then rename into place; returns bytes written
fn write_atomic(path: &Path, bytes: &[u8]) -> BackupResult<u64> {
    let temp_path = path.with_extension("tmp");
    match fs::write(&temp_path, bytes) {
        Ok(()) => {
            fs::rename(&temp_path, path)?;
            Ok(bytes.len() as u64)
        }
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            Err(e.into())
        }
    }
}

fn render_info(snapshot: &Snapshot) -> String {
    let meta = &snapshot.metadata;
    let mut out = String::new();
    out.push_str("fieldcheck backup\n");
    out.push_str("=================\n\n");
    out.push_str(&format!("Id:          {}\n", meta.id));
    out.push_str(&format!(
        "Created:     {}\n",
        meta.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("App version: {}\n", meta.app_version));
    out.push_str(&format!("DB version:  {}\n", meta.database_version));
    out.push_str(&format!("Checksum:    {}\n", meta.checksum));
    if !meta.description.is_empty() {
        out.push_str(&format!("Description: {}\n", meta.description));
    }
    if !meta.device_info.device_model.is_empty() {
        out.push_str(&format!(
            "Device:      {} (OS {})\n",
            meta.device_info.device_model, meta.device_info.os_version
        ));
    }
    out.push_str("\nTables\n------\n");
    for table in Table::in_dependency_order() {
        out.push_str(&format!(
            "{:<18} {}\n",
            table.name(),
            snapshot.database.count(table)
        ));
    }
    out.push_str(&format!(
        "\nPhotos:      {} ({:.1} MB{})\n",
        snapshot.photo_manifest.total_photos,
        snapshot.photo_manifest.total_size_mb,
        if snapshot.photo_manifest.includes_thumbnails {
            ", thumbnails included"
        } else {
            ""
        }
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use tempfile::tempdir;

    #[test]
    fn test_backup_path_is_deterministic() {
        let manager = BackupFileManager::new("/data/backups");
        let snapshot = fixtures::populated_snapshot();
        let a = manager.generate_backup_path(&snapshot.metadata.id, &snapshot.metadata.created_at);
        let b = manager.generate_backup_path(&snapshot.metadata.id, &snapshot.metadata.created_at);
        assert_eq!(a, b);

        let name = a.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("backup_20240615_080000_"));
        assert!(name.ends_with(&snapshot.metadata.id.short()));
    }

    #[test]
    fn test_save_and_load_combined() {
        let dir = tempdir().unwrap();
        let manager = BackupFileManager::new(dir.path());
        let snapshot = fixtures::populated_snapshot();
        let backup_dir =
            manager.generate_backup_path(&snapshot.metadata.id, &snapshot.metadata.created_at);

        let saved = manager
            .save_artifact(&snapshot, SaveMode::Combined, &backup_dir)
            .unwrap();
        assert!(saved.artifact_path.exists());
        assert!(backup_dir.join(INFO_FILE).exists());
        assert!(!backup_dir.join(METADATA_FILE).exists());
        assert!(saved.bytes_written > 0);

        let loaded = manager.load_artifact(&backup_dir).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_save_split_writes_all_parts() {
        let dir = tempdir().unwrap();
        let manager = BackupFileManager::new(dir.path());
        let snapshot = fixtures::populated_snapshot();
        let backup_dir =
            manager.generate_backup_path(&snapshot.metadata.id, &snapshot.metadata.created_at);

        manager
            .save_artifact(&snapshot, SaveMode::Split, &backup_dir)
            .unwrap();
        for file in [ARTIFACT_FILE, METADATA_FILE, DATABASE_FILE, SETTINGS_FILE, INFO_FILE] {
            assert!(backup_dir.join(file).exists(), "missing {}", file);
        }
        // No temp leftovers.
        assert!(fs::read_dir(&backup_dir)
            .unwrap()
            .all(|e| !e.unwrap().file_name().to_string_lossy().ends_with(".tmp")));
    }

    #[test]
    fn test_load_missing_artifact() {
        let dir = tempdir().unwrap();
        let manager = BackupFileManager::new(dir.path());
        let err = manager.load_artifact(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, BackupError::MissingFile(_)));
    }

    #[test]
    fn test_list_skips_unreadable_directories() {
        let dir = tempdir().unwrap();
        let manager = BackupFileManager::new(dir.path());

        let snapshot = fixtures::populated_snapshot();
        let backup_dir =
            manager.generate_backup_path(&snapshot.metadata.id, &snapshot.metadata.created_at);
        manager
            .save_artifact(&snapshot, SaveMode::Combined, &backup_dir)
            .unwrap();

        // A directory with garbage instead of an artifact.
        let junk = dir.path().join("backup_20200101_000000_deadbeef");
        fs::create_dir_all(&junk).unwrap();
        fs::write(junk.join(ARTIFACT_FILE), b"not json").unwrap();

        let listed = manager.list_artifacts().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, snapshot.metadata.id);
        assert_eq!(listed[0].total_records, snapshot.total_records());
    }

    #[test]
    fn test_list_empty_root() {
        let dir = tempdir().unwrap();
        let manager = BackupFileManager::new(dir.path().join("missing"));
        assert!(manager.list_artifacts().unwrap().is_empty());
    }

    #[test]
    fn test_delete_artifact() {
        let dir = tempdir().unwrap();
        let manager = BackupFileManager::new(dir.path());
        let snapshot = fixtures::populated_snapshot();
        let backup_dir =
            manager.generate_backup_path(&snapshot.metadata.id, &snapshot.metadata.created_at);
        manager
            .save_artifact(&snapshot, SaveMode::Combined, &backup_dir)
            .unwrap();

        manager.delete_artifact(&snapshot.metadata.id).unwrap();
        assert!(!backup_dir.exists());

        let err = manager.delete_artifact(&snapshot.metadata.id).unwrap_err();
        assert!(matches!(err, BackupError::MissingFile(_)));
    }
}
