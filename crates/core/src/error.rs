//! Store-level error types
//!
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations. Expected failure paths are `Err` values; nothing in the
//! store panics on bad input.

use crate::table::Table;
use crate::types::RowId;
use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by the live store and its transactions
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row with this primary key already exists in the table
    #[error("Duplicate row in {table}: id {id} already exists")]
    DuplicateRow {
        /// Table the insert targeted
        table: Table,
        /// Offending primary key
        id: RowId,
    },

    /// Operation attempted on a transaction that already committed or aborted
    #[error("Transaction is no longer active: {0}")]
    TransactionClosed(String),

    /// Referential integrity violation detected by a store-side check
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// Invalid operation or argument
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl StoreError {
    /// Create an integrity error
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }

    /// Create an invalid-operation error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }
}
