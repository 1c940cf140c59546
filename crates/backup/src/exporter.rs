//! Table exporter
//!
//! Reads every domain table fully — no filtering, no pagination — and maps
//! the store rows into backup-shaped sections. The whole read happens under
//! one read snapshot of the store, so the sections are mutually consistent.
//! Export has no side effects and never returns a partial result: any
//! failure aborts the whole export.

use crate::error::BackupResult;
use crate::snapshot::TableSections;
use fieldcheck_store::FieldStore;
use tracing::debug;

/// Exports the live store into backup table sections
pub struct TableExporter {
    store: FieldStore,
}

impl TableExporter {
    /// Create an exporter over the given store handle
    pub fn new(store: FieldStore) -> Self {
        Self { store }
    }

    /// Read every table into its backup section
    ///
    /// Empty tables produce empty sections; zero records is valid, not an
    /// error. Row order within a section follows primary-key order, which
    /// keeps consecutive exports of an unchanged store byte-identical.
    pub fn export_all_tables(&self) -> BackupResult<TableSections> {
        let sections = self.store.read(|data| TableSections {
            clients: data.clients.values().cloned().collect(),
            facilities: data.facilities.values().cloned().collect(),
            contacts: data.contacts.values().cloned().collect(),
            contracts: data.contracts.values().cloned().collect(),
            islands: data.islands.values().cloned().collect(),
            check_ups: data.check_ups.values().cloned().collect(),
            check_items: data.check_items.values().cloned().collect(),
            photos: data.photos.values().cloned().collect(),
            spare_parts: data.spare_parts.values().cloned().collect(),
            check_up_islands: data.check_up_islands.values().cloned().collect(),
            interventions: data.interventions.values().cloned().collect(),
        });
        debug!(total_records = sections.total_records(), "tables exported");
        Ok(sections)
    }
}
