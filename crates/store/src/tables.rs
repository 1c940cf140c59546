//! Typed table collections
//!
//! `TableData` is the materialized state of the whole store: one ordered map
//! per domain table, keyed by primary key. It knows how to count itself and
//! how to find dangling foreign keys; both the pre-backup integrity check and
//! the post-import validation run on top of these two operations.

use fieldcheck_core::records::{
    CheckItemRecord, CheckUpIslandRecord, CheckUpRecord, ClientRecord, ContactRecord,
    ContractRecord, FacilityRecord, InterventionRecord, IslandRecord, PhotoRecord, SparePartRecord,
};
use fieldcheck_core::table::Table;
use fieldcheck_core::types::RowId;
use std::collections::BTreeMap;

/// A dangling foreign key found during a referential scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanRef {
    /// Table containing the offending row
    pub table: Table,
    /// Primary key of the offending row
    pub row_id: RowId,
    /// Table the broken reference points into
    pub references: Table,
    /// Foreign key value that resolves to nothing
    pub missing_id: RowId,
}

impl std::fmt::Display for OrphanRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} row {} references missing {} id {}",
            self.table, self.row_id, self.references, self.missing_id
        )
    }
}

/// The full table state of the store
#[derive(Debug, Clone, Default)]
pub struct TableData {
    pub clients: BTreeMap<RowId, ClientRecord>,
    pub facilities: BTreeMap<RowId, FacilityRecord>,
    pub contacts: BTreeMap<RowId, ContactRecord>,
    pub contracts: BTreeMap<RowId, ContractRecord>,
    pub islands: BTreeMap<RowId, IslandRecord>,
    pub check_ups: BTreeMap<RowId, CheckUpRecord>,
    pub check_items: BTreeMap<RowId, CheckItemRecord>,
    pub photos: BTreeMap<RowId, PhotoRecord>,
    pub spare_parts: BTreeMap<RowId, SparePartRecord>,
    pub check_up_islands: BTreeMap<RowId, CheckUpIslandRecord>,
    pub interventions: BTreeMap<RowId, InterventionRecord>,
}

impl TableData {
    /// Create an empty table state
    pub fn new() -> Self {
        Self::default()
    }

    /// Row count of a single table
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

    /// Per-table row counts in dependency order
    pub fn counts(&self) -> Vec<(Table, u64)> {
        Table::in_dependency_order()
            .map(|t| (t, self.count(t)))
            .collect()
    }

    /// Total rows across all tables
    pub fn total_rows(&self) -> u64 {
        Table::in_dependency_order().map(|t| self.count(t)).sum()
    }

    /// Delete every row of a table, returning the number of rows removed
    pub fn clear(&mut self, table: Table) -> u64 {
        let removed = self.count(table);
        match table {
            Table::Clients => self.clients.clear(),
            Table::Facilities => self.facilities.clear(),
            Table::Contacts => self.contacts.clear(),
            Table::Contracts => self.contracts.clear(),
            Table::Islands => self.islands.clear(),
            Table::CheckUps => self.check_ups.clear(),
            Table::CheckItems => self.check_items.clear(),
            Table::Photos => self.photos.clear(),
            Table::SpareParts => self.spare_parts.clear(),
            Table::CheckUpIslands => self.check_up_islands.clear(),
            Table::Interventions => self.interventions.clear(),
        }
        removed
    }

    /// Scan every foreign-key edge and report dangling references
    ///
    /// Returns the complete list, not just the first finding.
    pub fn orphans(&self) -> Vec<OrphanRef> {
        let mut found = Vec::new();

        let mut check = |table: Table, row_id: RowId, references: Table, fk: RowId, ok: bool| {
            if !ok {
                found.push(OrphanRef {
                    table,
                    row_id,
                    references,
                    missing_id: fk,
                });
            }
        };

        for (id, row) in &self.facilities {
            check(
                Table::Facilities,
                *id,
                Table::Clients,
                row.client_id,
                self.clients.contains_key(&row.client_id),
            );
        }
        for (id, row) in &self.contacts {
            check(
                Table::Contacts,
                *id,
                Table::Clients,
                row.client_id,
                self.clients.contains_key(&row.client_id),
            );
        }
        for (id, row) in &self.contracts {
            check(
                Table::Contracts,
                *id,
                Table::Clients,
                row.client_id,
                self.clients.contains_key(&row.client_id),
            );
        }
        for (id, row) in &self.islands {
            check(
                Table::Islands,
                *id,
                Table::Facilities,
                row.facility_id,
                self.facilities.contains_key(&row.facility_id),
            );
        }
        for (id, row) in &self.check_ups {
            check(
                Table::CheckUps,
                *id,
                Table::Facilities,
                row.facility_id,
                self.facilities.contains_key(&row.facility_id),
            );
        }
        for (id, row) in &self.check_items {
            check(
                Table::CheckItems,
                *id,
                Table::CheckUps,
                row.check_up_id,
                self.check_ups.contains_key(&row.check_up_id),
            );
        }
        for (id, row) in &self.photos {
            check(
                Table::Photos,
                *id,
                Table::CheckItems,
                row.check_item_id,
                self.check_items.contains_key(&row.check_item_id),
            );
        }
        for (id, row) in &self.spare_parts {
            check(
                Table::SpareParts,
                *id,
                Table::CheckUps,
                row.check_up_id,
                self.check_ups.contains_key(&row.check_up_id),
            );
        }
        for (id, row) in &self.check_up_islands {
            check(
                Table::CheckUpIslands,
                *id,
                Table::CheckUps,
                row.check_up_id,
                self.check_ups.contains_key(&row.check_up_id),
            );
            check(
                Table::CheckUpIslands,
                *id,
                Table::Islands,
                row.island_id,
                self.islands.contains_key(&row.island_id),
            );
        }
        // Interventions carry no foreign keys.

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldcheck_core::records::{CheckUpStatus, ClientRecord, FacilityRecord};

    fn client(id: RowId) -> ClientRecord {
        ClientRecord {
            id,
            name: format!("Client {}", id),
            vat_number: format!("IT{:011}", id),
            address: "Via Test 1".to_string(),
            city: "Torino".to_string(),
            phone: String::new(),
            email: String::new(),
            notes: String::new(),
        }
    }

    fn facility(id: RowId, client_id: RowId) -> FacilityRecord {
        FacilityRecord {
            id,
            client_id,
            name: format!("Site {}", id),
            address: "SS 231 km 4".to_string(),
            city: "Asti".to_string(),
            code: String::new(),
        }
    }

    #[test]
    fn test_empty_counts() {
        let data = TableData::new();
        assert_eq!(data.total_rows(), 0);
        for (_, n) in data.counts() {
            assert_eq!(n, 0);
        }
    }

    #[test]
    fn test_count_and_clear() {
        let mut data = TableData::new();
        data.clients.insert(1, client(1));
        data.clients.insert(2, client(2));
        assert_eq!(data.count(Table::Clients), 2);

        let removed = data.clear(Table::Clients);
        assert_eq!(removed, 2);
        assert_eq!(data.count(Table::Clients), 0);
    }

    #[test]
    fn test_orphan_scan_clean() {
        let mut data = TableData::new();
        data.clients.insert(1, client(1));
        data.facilities.insert(10, facility(10, 1));
        assert!(data.orphans().is_empty());
    }

    #[test]
    fn test_orphan_scan_reports_every_edge() {
        let mut data = TableData::new();
        // facility -> missing client, check_up -> missing facility
        data.facilities.insert(10, facility(10, 99));
        data.check_ups.insert(
            20,
            fieldcheck_core::records::CheckUpRecord {
                id: 20,
                facility_id: 55,
                performed_on: chrono::NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
                operator: "A. Verdi".to_string(),
                status: CheckUpStatus::Completed,
                notes: String::new(),
            },
        );

        let orphans = data.orphans();
        assert_eq!(orphans.len(), 2);
        assert!(orphans
            .iter()
            .any(|o| o.table == Table::Facilities && o.missing_id == 99));
        assert!(orphans
            .iter()
            .any(|o| o.table == Table::CheckUps && o.missing_id == 55));
    }

    #[test]
    fn test_association_checks_both_edges() {
        let mut data = TableData::new();
        data.check_up_islands.insert(
            1,
            fieldcheck_core::records::CheckUpIslandRecord {
                id: 1,
                check_up_id: 7,
                island_id: 8,
            },
        );
        let orphans = data.orphans();
        // Both the check-up side and the island side are dangling.
        assert_eq!(orphans.len(), 2);
    }

    #[test]
    fn test_orphan_display() {
        let orphan = OrphanRef {
            table: Table::CheckItems,
            row_id: 3,
            references: Table::CheckUps,
            missing_id: 12,
        };
        let msg = orphan.to_string();
        assert!(msg.contains("check_items"));
        assert!(msg.contains("12"));
    }
}
