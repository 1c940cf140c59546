//! Live relational store for fieldcheck
//!
//! This crate holds the in-process data store the backup engine reads from
//! and restores into:
//!
//! - [`TableData`]: the typed table collections and referential checks
//! - [`FieldStore`]: the shared store handle (explicit, injectable — no
//!   ambient singletons)
//! - [`Transaction`] / [`FieldStore::with_transaction`]: the all-or-nothing
//!   write boundary every restore runs inside
//!
//! The store is deliberately narrow: the backup subsystem needs full-table
//! reads, delete-all, ordered inserts, counts and orphan scans, and that is
//! the surface exposed here. Application-level CRUD lives elsewhere.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod store;
pub mod tables;
pub mod transaction;

pub use store::FieldStore;
pub use tables::{OrphanRef, TableData};
pub use transaction::{Transaction, TransactionStatus};
