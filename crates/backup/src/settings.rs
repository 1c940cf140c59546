//! Settings store collaborator
//!
//! Settings ride along in the snapshot as an opaque blob. The backup engine
//! only needs two operations from whoever owns them; [`JsonSettingsStore`] is
//! the file-backed implementation used on device.

use crate::error::{BackupError, BackupResult};
use crate::snapshot::SettingsBlob;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Exports and imports the application settings blob
pub trait SettingsStore: Send + Sync {
    /// Capture the current settings as an opaque blob
    fn export_settings(&self) -> BackupResult<SettingsBlob>;

    /// Replace the current settings with the blob from a snapshot
    fn import_settings(&self, blob: &SettingsBlob) -> BackupResult<()>;
}

/// Settings store backed by a single JSON file
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    /// Create a store over the given settings file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SettingsStore for JsonSettingsStore {
    fn export_settings(&self) -> BackupResult<SettingsBlob> {
        if !self.path.exists() {
            // First run: nothing saved yet, back up an empty blob.
            return Ok(SettingsBlob::default());
        }
        let bytes = fs::read(&self.path)?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| BackupError::settings(format!("unreadable settings file: {}", e)))?;
        Ok(SettingsBlob(value))
    }

    fn import_settings(&self, blob: &SettingsBlob) -> BackupResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let bytes = serde_json::to_vec_pretty(&blob.0)?;
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &bytes)?;
        fs::rename(&temp_path, &self.path)?;
        debug!(path = %self.path.display(), "settings restored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_exports_empty_blob() {
        let dir = tempdir().unwrap();
        let store = JsonSettingsStore::new(dir.path().join("settings.json"));
        let blob = store.export_settings().unwrap();
        assert_eq!(blob, SettingsBlob::default());
    }

    #[test]
    fn test_import_then_export_roundtrip() {
        let dir = tempdir().unwrap();
        let store = JsonSettingsStore::new(dir.path().join("settings.json"));

        let blob = SettingsBlob(serde_json::json!({"language": "it", "font_scale": 1.25}));
        store.import_settings(&blob).unwrap();

        let exported = store.export_settings().unwrap();
        assert_eq!(exported, blob);
    }

    #[test]
    fn test_corrupt_file_is_a_settings_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, b"{ not json").unwrap();

        let store = JsonSettingsStore::new(path);
        let err = store.export_settings().unwrap_err();
        assert!(matches!(err, BackupError::Settings(_)));
    }

    #[test]
    fn test_import_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let store = JsonSettingsStore::new(&path);
        store.import_settings(&SettingsBlob::default()).unwrap();
        assert!(path.exists());
        // No temp file left behind.
        assert!(!path.with_extension("tmp").exists());
    }
}
