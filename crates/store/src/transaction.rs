//! All-or-nothing write transactions
//!
//! A [`Transaction`] mutates a private working copy of the table state. The
//! copy replaces the live state only if the transaction block returns `Ok`;
//! on any `Err` the copy is dropped and the live store is exactly what it was
//! before the block ran. The write lock held for the duration of the block
//! makes the commit a single atomic swap and keeps writers serial.
//!
//! Status lifecycle:
//!
//! - `Active` → `Committed` (block returned `Ok`)
//! - `Active` → `Aborted` (block returned `Err`)
//!
//! Both end states are terminal; operations on a closed transaction fail
//! with [`StoreError::TransactionClosed`].

use crate::tables::{OrphanRef, TableData};
use fieldcheck_core::records::{
    CheckItemRecord, CheckUpIslandRecord, CheckUpRecord, ClientRecord, ContactRecord,
    ContractRecord, FacilityRecord, InterventionRecord, IslandRecord, PhotoRecord, SparePartRecord,
};
use fieldcheck_core::table::Table;
use fieldcheck_core::types::RowId;
use fieldcheck_core::{StoreError, StoreResult};
use std::collections::BTreeMap;

/// Lifecycle state of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Transaction is executing; reads and writes allowed
    Active,
    /// Working copy was swapped into the live store
    Committed,
    /// Working copy was discarded
    Aborted,
}

/// A write transaction over the full table state
///
/// Created by [`crate::FieldStore::with_transaction`]; not constructible
/// directly.
pub struct Transaction {
    working: TableData,
    status: TransactionStatus,
}

fn insert_row<R>(
    map: &mut BTreeMap<RowId, R>,
    table: Table,
    id: RowId,
) -> StoreResult<&mut BTreeMap<RowId, R>> {
    if map.contains_key(&id) {
        return Err(StoreError::DuplicateRow { table, id });
    }
    Ok(map)
}

impl Transaction {
    pub(crate) fn new(base: &TableData) -> Self {
        Self {
            working: base.clone(),
            status: TransactionStatus::Active,
        }
    }

    /// Current lifecycle state
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    fn ensure_active(&self) -> StoreResult<()> {
        match self.status {
            TransactionStatus::Active => Ok(()),
            TransactionStatus::Committed => Err(StoreError::TransactionClosed(
                "already committed".to_string(),
            )),
            TransactionStatus::Aborted => {
                Err(StoreError::TransactionClosed("already aborted".to_string()))
            }
        }
    }

    /// Delete every row of a table; returns the number of rows removed
    pub fn clear_table(&mut self, table: Table) -> StoreResult<u64> {
        self.ensure_active()?;
        Ok(self.working.clear(table))
    }

    /// Row count as seen by this transaction (reads its own writes)
    pub fn count(&self, table: Table) -> u64 {
        self.working.count(table)
    }

    /// Per-table counts as seen by this transaction
    pub fn counts(&self) -> Vec<(Table, u64)> {
        self.working.counts()
    }

    /// Total rows as seen by this transaction
    pub fn total_rows(&self) -> u64 {
        self.working.total_rows()
    }

    /// Referential scan over the transaction's view of the data
    pub fn orphans(&self) -> Vec<OrphanRef> {
        self.working.orphans()
    }

    /// Insert a client row
    pub fn insert_client(&mut self, row: ClientRecord) -> StoreResult<()> {
        self.ensure_active()?;
        insert_row(&mut self.working.clients, Table::Clients, row.id)?.insert(row.id, row);
        Ok(())
    }

    /// Insert a facility row
    pub fn insert_facility(&mut self, row: FacilityRecord) -> StoreResult<()> {
        self.ensure_active()?;
        insert_row(&mut self.working.facilities, Table::Facilities, row.id)?.insert(row.id, row);
        Ok(())
    }

    /// Insert a contact row
    pub fn insert_contact(&mut self, row: ContactRecord) -> StoreResult<()> {
        self.ensure_active()?;
        insert_row(&mut self.working.contacts, Table::Contacts, row.id)?.insert(row.id, row);
        Ok(())
    }

    /// Insert a contract row
    pub fn insert_contract(&mut self, row: ContractRecord) -> StoreResult<()> {
        self.ensure_active()?;
        insert_row(&mut self.working.contracts, Table::Contracts, row.id)?.insert(row.id, row);
        Ok(())
    }

    /// Insert an island row
    pub fn insert_island(&mut self, row: IslandRecord) -> StoreResult<()> {
        self.ensure_active()?;
        insert_row(&mut self.working.islands, Table::Islands, row.id)?.insert(row.id, row);
        Ok(())
    }

    /// Insert a check-up row
    pub fn insert_check_up(&mut self, row: CheckUpRecord) -> StoreResult<()> {
        self.ensure_active()?;
        insert_row(&mut self.working.check_ups, Table::CheckUps, row.id)?.insert(row.id, row);
        Ok(())
    }

    /// Insert a check-item row
    pub fn insert_check_item(&mut self, row: CheckItemRecord) -> StoreResult<()> {
        self.ensure_active()?;
        insert_row(&mut self.working.check_items, Table::CheckItems, row.id)?.insert(row.id, row);
        Ok(())
    }

    /// Insert a photo row
    pub fn insert_photo(&mut self, row: PhotoRecord) -> StoreResult<()> {
        self.ensure_active()?;
        insert_row(&mut self.working.photos, Table::Photos, row.id)?.insert(row.id, row);
        Ok(())
    }

    /// Insert a spare-part row
    pub fn insert_spare_part(&mut self, row: SparePartRecord) -> StoreResult<()> {
        self.ensure_active()?;
        insert_row(&mut self.working.spare_parts, Table::SpareParts, row.id)?.insert(row.id, row);
        Ok(())
    }

    /// Insert a check-up/island association row
    pub fn insert_check_up_island(&mut self, row: CheckUpIslandRecord) -> StoreResult<()> {
        self.ensure_active()?;
        insert_row(
            &mut self.working.check_up_islands,
            Table::CheckUpIslands,
            row.id,
        )?
        .insert(row.id, row);
        Ok(())
    }

    /// Insert an intervention row
    pub fn insert_intervention(&mut self, row: InterventionRecord) -> StoreResult<()> {
        self.ensure_active()?;
        insert_row(&mut self.working.interventions, Table::Interventions, row.id)?
            .insert(row.id, row);
        Ok(())
    }

    pub(crate) fn commit_into(mut self, live: &mut TableData) {
        self.status = TransactionStatus::Committed;
        *live = std::mem::take(&mut self.working);
    }

    pub(crate) fn abort(&mut self) {
        self.status = TransactionStatus::Aborted;
    }
}
