//! Snapshot artifact model
//!
//! A [`Snapshot`] is the complete backup document:
//!
//! ```text
//! {
//!   "metadata":       { id, created_at, app_version, database_version,
//!                       checksum, total_size_bytes, description, device_info }
//!   "database":       { one array per domain table }
//!   "settings":       { ...opaque application settings... }
//!   "photo_manifest": { total_photos, total_size_mb, photos[], includes_thumbnails }
//! }
//! ```
//!
//! Snapshots are immutable once assembled: created once per backup, persisted,
//! read many times for listing/validation, consumed once per restore. The
//! checksum in `metadata` covers the canonical encoding of everything except
//! the checksum field itself (see [`crate::codec`]).
//!
//! Forward compatibility: readers ignore unknown fields, so artifacts from
//! newer minor versions stay loadable. Missing sections or missing ids are
//! hard parse errors, never silent defaults.

use fieldcheck_core::records::{
    CheckItemRecord, CheckUpIslandRecord, CheckUpRecord, ClientRecord, ContactRecord,
    ContractRecord, FacilityRecord, InterventionRecord, IslandRecord, PhotoRecord, SparePartRecord,
};
use fieldcheck_core::table::Table;
use fieldcheck_core::types::BackupId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version of the database section this build produces
pub const DATABASE_SCHEMA_VERSION: u32 = 7;

/// Checksum algorithm recorded in artifact metadata
pub const CHECKSUM_ALGORITHM: &str = "sha256";

/// Descriptor of the device that produced a backup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Hardware model ("Pixel 7", "SM-A526B", ...)
    #[serde(default)]
    pub device_model: String,
    /// Operating system version string
    #[serde(default)]
    pub os_version: String,
    /// Application build identifier
    #[serde(default)]
    pub app_build: String,
}

/// Metadata block of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupMetadata {
    /// Unique id of this backup
    pub id: BackupId,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Version of the application that produced the backup
    pub app_version: String,
    /// Schema version of the database section
    pub database_version: u32,
    /// sha256 hex digest of the canonical encoding, empty string while unset
    #[serde(default)]
    pub checksum: String,
    /// Size of the canonical encoding at assembly time, informative only
    #[serde(default)]
    pub total_size_bytes: u64,
    /// Free-text description entered by the user
    #[serde(default)]
    pub description: String,
    /// Producing device
    #[serde(default)]
    pub device_info: DeviceInfo,
}

/// The database section: one array per domain table
///
/// Every section is required; a document with a section missing entirely is
/// malformed (a truncated artifact must not quietly read as empty tables).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSections {
    pub clients: Vec<ClientRecord>,
    pub facilities: Vec<FacilityRecord>,
    pub contacts: Vec<ContactRecord>,
    pub contracts: Vec<ContractRecord>,
    pub islands: Vec<IslandRecord>,
    pub check_ups: Vec<CheckUpRecord>,
    pub check_items: Vec<CheckItemRecord>,
    pub photos: Vec<PhotoRecord>,
    pub spare_parts: Vec<SparePartRecord>,
    pub check_up_islands: Vec<CheckUpIslandRecord>,
    pub interventions: Vec<InterventionRecord>,
}

impl TableSections {
    /// Record count of one section
    pub fn count(&self, table: Table) -> u64 {
        let n = match table {
            Table::Clients => self.clients.len(),
            Table::Facilities => self.facilities.len(),
            Table::Contacts => self.contacts.len(),
            Table::Contracts => self.contracts.len(),
            Table::Islands => self.islands.len(),
            Table::CheckUps => self.check_ups.len(),
            Table::CheckItems => self.check_items.len(),
            Table::Photos => self.photos.len(),
            Table::SpareParts => self.spare_parts.len(),
            Table::CheckUpIslands => self.check_up_islands.len(),
            Table::Interventions => self.interventions.len(),
        };
        n as u64
    }

    /// Per-table record counts in dependency order
    pub fn counts(&self) -> Vec<(Table, u64)> {
        Table::in_dependency_order()
            .map(|t| (t, self.count(t)))
            .collect()
    }

    /// Total records across all sections
    pub fn total_records(&self) -> u64 {
        Table::in_dependency_order().map(|t| self.count(t)).sum()
    }
}

/// One photo inside the photo manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoEntry {
    /// File name relative to the photo directory
    pub file_name: String,
    pub size_bytes: u64,
    /// xxh3 hex checksum of the file content
    pub checksum: String,
}

/// Summary of the photo archive accompanying a snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoManifest {
    pub total_photos: u64,
    pub total_size_mb: f64,
    pub photos: Vec<PhotoEntry>,
    pub includes_thumbnails: bool,
}

/// Opaque application settings carried through backup and restore untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsBlob(pub serde_json::Value);

impl Default for SettingsBlob {
    fn default() -> Self {
        Self(serde_json::Value::Object(serde_json::Map::new()))
    }
}

/// The root backup artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Metadata block
    pub metadata: BackupMetadata,
    /// Domain table sections
    pub database: TableSections,
    /// Opaque settings blob
    pub settings: SettingsBlob,
    /// Photo archive summary
    pub photo_manifest: PhotoManifest,
}

impl Snapshot {
    /// Total records across all database sections
    pub fn total_records(&self) -> u64 {
        self.database.total_records()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_snapshot() -> Snapshot {
        Snapshot {
            metadata: BackupMetadata {
                id: BackupId::new(),
                created_at: Utc::now(),
                app_version: "0.4.0".to_string(),
                database_version: DATABASE_SCHEMA_VERSION,
                checksum: String::new(),
                total_size_bytes: 0,
                description: String::new(),
                device_info: DeviceInfo::default(),
            },
            database: TableSections::default(),
            settings: SettingsBlob::default(),
            photo_manifest: PhotoManifest::default(),
        }
    }

    #[test]
    fn test_snapshot_json_roundtrip() {
        let snapshot = empty_snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, parsed);
    }

    #[test]
    fn test_unknown_top_level_field_ignored() {
        let snapshot = empty_snapshot();
        let mut value = serde_json::to_value(&snapshot).unwrap();
        value
            .as_object_mut()
            .unwrap()
            .insert("added_in_v9".to_string(), serde_json::json!({"x": 1}));
        let parsed: Snapshot = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.metadata.id, snapshot.metadata.id);
    }

    #[test]
    fn test_missing_database_section_is_an_error() {
        let snapshot = empty_snapshot();
        let mut value = serde_json::to_value(&snapshot).unwrap();
        value.as_object_mut().unwrap().remove("database");
        assert!(serde_json::from_value::<Snapshot>(value).is_err());
    }

    #[test]
    fn test_missing_table_array_is_an_error() {
        let snapshot = empty_snapshot();
        let mut value = serde_json::to_value(&snapshot).unwrap();
        value["database"].as_object_mut().unwrap().remove("clients");
        assert!(serde_json::from_value::<Snapshot>(value).is_err());
    }

    #[test]
    fn test_counts_follow_dependency_order() {
        let snapshot = empty_snapshot();
        let tables: Vec<Table> = snapshot.database.counts().into_iter().map(|(t, _)| t).collect();
        let expected: Vec<Table> = Table::in_dependency_order().collect();
        assert_eq!(tables, expected);
    }

    #[test]
    fn test_settings_blob_roundtrips_untouched() {
        let blob = SettingsBlob(serde_json::json!({
            "theme": "dark",
            "report_footer": "Certified per UNI 10617",
            "nested": {"a": [1, 2, 3]}
        }));
        let json = serde_json::to_string(&blob).unwrap();
        let parsed: SettingsBlob = serde_json::from_str(&json).unwrap();
        assert_eq!(blob, parsed);
    }
}
