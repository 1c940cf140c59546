//! Id types
//!
//! - `BackupId`: unique identifier for a backup artifact
//! - `RowId`: primary-key type shared by every domain table

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Primary-key type for domain table rows.
///
/// The live store hands out positive, per-table-unique ids. Backup records
/// carry the ids verbatim so foreign keys survive a round trip.
pub type RowId = i64;

/// Unique identifier for a backup artifact
///
/// A BackupId is a wrapper around a UUID v4. The id is assigned once when the
/// snapshot metadata is assembled and never changes afterwards; the on-disk
/// backup directory name embeds its first 8 hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackupId(Uuid);

impl BackupId {
    /// Create a new random BackupId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a BackupId from a string representation
    ///
    /// Accepts standard UUID format (with or without hyphens).
    /// Returns None if the string is not a valid UUID.
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// First 8 hex characters of the id, used in backup directory names
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }

    /// Whether this is the all-zero (nil) id
    ///
    /// A nil id in artifact metadata means the artifact was never properly
    /// assembled and fails structural validation.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for BackupId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BackupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_id_unique() {
        assert_ne!(BackupId::new(), BackupId::new());
    }

    #[test]
    fn test_backup_id_from_string() {
        let id = BackupId::new();
        let parsed = BackupId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);

        assert!(BackupId::from_string("not-a-uuid").is_none());
    }

    #[test]
    fn test_backup_id_short() {
        let id = BackupId::from_string("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(id.short(), "550e8400");
    }

    #[test]
    fn test_backup_id_nil() {
        let nil = BackupId::from_string("00000000-0000-0000-0000-000000000000").unwrap();
        assert!(nil.is_nil());
        assert!(!BackupId::new().is_nil());
    }

    #[test]
    fn test_backup_id_serde_transparent() {
        let id = BackupId::from_string("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"550e8400-e29b-41d4-a716-446655440000\"");
        let back: BackupId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
