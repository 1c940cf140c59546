//! Transactional table importer
//!
//! The importer applies a snapshot's database sections to the live store as
//! one atomic operation:
//!
//! ```text
//! Idle ──▶ Clearing ──▶ Loading ──▶ Validating ──▶ Committed
//!              │            │            │
//!              └────────────┴────────────┴──▶ Aborted (rollback, store unchanged)
//! ```
//!
//! All active phases run inside a single store transaction. Clearing deletes
//! every table in strict reverse dependency order; Loading inserts snapshot
//! rows in strict forward dependency order; Validating compares per-table row
//! counts against the snapshot and scans every foreign-key edge for orphans,
//! still inside the transaction. Any error anywhere discards the working copy,
//! leaving the live store exactly as it was before the attempt.
//!
//! Only `replace_all` is implemented. `merge` and `selective` are declared
//! strategies that fail before the transaction opens; failing loudly beats
//! guessing at semantics that were never specified.

use crate::error::{BackupError, BackupResult};
use crate::snapshot::{Snapshot, TableSections};
use fieldcheck_core::table::Table;
use fieldcheck_store::{FieldStore, OrphanRef, Transaction};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// How a snapshot is applied to the live store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreStrategy {
    /// Delete everything, then load the snapshot. Fully implemented.
    ReplaceAll,
    /// Declared but unimplemented; fails fast.
    Merge,
    /// Declared but unimplemented; fails fast.
    Selective,
}

impl fmt::Display for RestoreStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RestoreStrategy::ReplaceAll => "replace_all",
            RestoreStrategy::Merge => "merge",
            RestoreStrategy::Selective => "selective",
        };
        f.write_str(name)
    }
}

/// A table whose post-import row count differs from the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountMismatch {
    /// Offending table
    pub table: Table,
    /// Rows the snapshot carries for this table
    pub expected: u64,
    /// Rows actually present after loading
    pub actual: u64,
}

impl fmt::Display for CountMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {} rows, found {}",
            self.table, self.expected, self.actual
        )
    }
}

/// Complete result of the post-import validation pass
///
/// Carries every offending table and every dangling reference, never just
/// the first finding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// Tables whose row counts diverge from the snapshot
    pub count_mismatches: Vec<CountMismatch>,
    /// Dangling foreign keys found after loading
    pub orphans: Vec<OrphanRef>,
}

impl ValidationReport {
    /// True when no problem was found
    pub fn is_clean(&self) -> bool {
        self.count_mismatches.is_empty() && self.orphans.is_empty()
    }
}

// Display spells out every finding; error messages and logs rely on the full
// list being present, not just the first.
impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        for m in &self.count_mismatches {
            parts.push(m.to_string());
        }
        for o in &self.orphans {
            parts.push(o.to_string());
        }
        if parts.is_empty() {
            f.write_str("no findings")
        } else {
            f.write_str(&parts.join("; "))
        }
    }
}

/// Row statistics produced after a successful import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStats {
    /// Per-table row counts in dependency order
    pub per_table: Vec<(Table, u64)>,
    /// Total rows across all tables
    pub total_rows: u64,
}

/// Applies snapshot sections to the live store transactionally
pub struct TableImporter {
    store: FieldStore,
}

impl TableImporter {
    /// Create an importer over the given store handle
    pub fn new(store: FieldStore) -> Self {
        Self { store }
    }

    /// Import every table section using the given strategy
    ///
    /// With `ReplaceAll` the whole clear/load/validate sequence runs inside
    /// one transaction; on success the commit is atomic, on any error the
    /// live store is unchanged. `Merge` and `Selective` fail immediately
    /// without touching the store.
    pub fn import_all_tables(
        &self,
        snapshot: &Snapshot,
        strategy: RestoreStrategy,
    ) -> BackupResult<ImportStats> {
        match strategy {
            RestoreStrategy::ReplaceAll => {}
            other => return Err(BackupError::UnsupportedStrategy(other)),
        }

        if snapshot.total_records() == 0 {
            // Legal, but a zero-record restore wipes the store; the caller
            // is expected to have confirmed this with the user.
            warn!("importing an empty snapshot: all tables will be cleared");
        }

        let stats = self.store.with_transaction(|tx| {
            // Clearing: reverse dependency order, unconditional delete-all.
            for table in Table::in_deletion_order() {
                let removed = tx.clear_table(table)?;
                debug!(table = %table, removed, "cleared");
            }

            // Loading: forward dependency order, empty sections skipped.
            for table in Table::in_dependency_order() {
                let inserted = load_section(tx, &snapshot.database, table)?;
                if inserted > 0 {
                    debug!(table = %table, inserted, "loaded");
                }
            }

            // Validating: still inside the transaction, so a failure here
            // rolls the whole restore back.
            let report = validate(tx, &snapshot.database);
            if !report.is_clean() {
                return Err(BackupError::Validation(report));
            }

            Ok(ImportStats {
                per_table: tx.counts(),
                total_rows: tx.total_rows(),
            })
        })?;

        info!(total_rows = stats.total_rows, "import committed");
        Ok(stats)
    }
}

fn load_section(
    tx: &mut Transaction,
    sections: &TableSections,
    table: Table,
) -> BackupResult<u64> {
    let inserted = match table {
        Table::Clients => {
            for row in &sections.clients {
                tx.insert_client(row.clone())?;
            }
            sections.clients.len()
        }
        Table::Facilities => {
            for row in &sections.facilities {
                tx.insert_facility(row.clone())?;
            }
            sections.facilities.len()
        }
        Table::Contacts => {
            for row in &sections.contacts {
                tx.insert_contact(row.clone())?;
            }
            sections.contacts.len()
        }
        Table::Contracts => {
            for row in &sections.contracts {
                tx.insert_contract(row.clone())?;
            }
            sections.contracts.len()
        }
        Table::Islands => {
            for row in &sections.islands {
                tx.insert_island(row.clone())?;
            }
            sections.islands.len()
        }
        Table::CheckUps => {
            for row in &sections.check_ups {
                tx.insert_check_up(row.clone())?;
            }
            sections.check_ups.len()
        }
        Table::CheckItems => {
            for row in &sections.check_items {
                tx.insert_check_item(row.clone())?;
            }
            sections.check_items.len()
        }
        Table::Photos => {
            for row in &sections.photos {
                tx.insert_photo(row.clone())?;
            }
            sections.photos.len()
        }
        Table::SpareParts => {
            for row in &sections.spare_parts {
                tx.insert_spare_part(row.clone())?;
            }
            sections.spare_parts.len()
        }
        Table::CheckUpIslands => {
            for row in &sections.check_up_islands {
                tx.insert_check_up_island(row.clone())?;
            }
            sections.check_up_islands.len()
        }
        Table::Interventions => {
            for row in &sections.interventions {
                tx.insert_intervention(row.clone())?;
            }
            sections.interventions.len()
        }
    };
    Ok(inserted as u64)
}

fn validate(tx: &Transaction, sections: &TableSections) -> ValidationReport {
    let mut report = ValidationReport::default();

    for table in Table::in_dependency_order() {
        let expected = sections.count(table);
        let actual = tx.count(table);
        if expected != actual {
            report.count_mismatches.push(CountMismatch {
                table,
                expected,
                actual,
            });
        }
    }

    report.orphans = tx.orphans();
    report
}
