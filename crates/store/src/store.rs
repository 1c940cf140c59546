//! The shared store handle
//!
//! `FieldStore` wraps the table state in a `parking_lot::RwLock` and is the
//! handle injected into the exporter and importer. Reads take the read lock
//! for the duration of one closure, which gives callers a consistent view of
//! all tables at once; writes go through [`FieldStore::with_transaction`].

use crate::tables::{OrphanRef, TableData};
use crate::transaction::Transaction;
use fieldcheck_core::table::Table;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Handle to the live relational store
///
/// Cloning the handle is cheap and shares the underlying state.
#[derive(Clone, Default)]
pub struct FieldStore {
    inner: Arc<RwLock<TableData>>,
}

impl FieldStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given table state
    pub fn with_data(data: TableData) -> Self {
        Self {
            inner: Arc::new(RwLock::new(data)),
        }
    }

    /// Run a closure against a consistent read snapshot of all tables
    pub fn read<R>(&self, f: impl FnOnce(&TableData) -> R) -> R {
        let guard = self.inner.read();
        f(&guard)
    }

    /// Row count of a single table
    pub fn count(&self, table: Table) -> u64 {
        self.read(|data| data.count(table))
    }

    /// Per-table row counts in dependency order
    pub fn counts(&self) -> Vec<(Table, u64)> {
        self.read(|data| data.counts())
    }

    /// Total rows across all tables
    pub fn total_rows(&self) -> u64 {
        self.read(|data| data.total_rows())
    }

    /// Referential scan of the live state
    pub fn orphans(&self) -> Vec<OrphanRef> {
        self.read(|data| data.orphans())
    }

    /// Run a write transaction
    ///
    /// The closure receives a [`Transaction`] over a working copy of the
    /// table state. If it returns `Ok`, the working copy atomically replaces
    /// the live state before the write lock is released; if it returns
    /// `Err`, the copy is discarded and the live state is unchanged. The
    /// write lock is held for the whole block, so transactions never
    /// interleave.
    pub fn with_transaction<T, E>(
        &self,
        f: impl FnOnce(&mut Transaction) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut guard = self.inner.write();
        let mut tx = Transaction::new(&guard);
        match f(&mut tx) {
            Ok(value) => {
                tx.commit_into(&mut guard);
                debug!(rows = guard.total_rows(), "transaction committed");
                Ok(value)
            }
            Err(e) => {
                tx.abort();
                debug!("transaction aborted, live state unchanged");
                Err(e)
            }
        }
    }
}
