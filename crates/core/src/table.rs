//! Table identifiers and the restore dependency order
//!
//! The store has a fixed set of tables with a fixed foreign-key graph:
//!
//! ```text
//! Client ◀── Facility ◀── Island
//!   ▲  ▲                    ▲
//!   │  └── Contact          │
//!   └───── Contract         │
//!          CheckUp ◀────────┼── CheckUpIsland
//!            ▲  ▲           │
//!            │  └───────────┘
//!   CheckItem┘◀── Photo
//!   SparePart ──▶ CheckUp
//!   Intervention (no foreign keys)
//! ```
//!
//! [`DEPENDENCY_ORDER`] is the one total order compatible with that graph
//! that the whole subsystem uses: restore inserts walk it forward, the
//! replace-all clearing phase walks it in exact reverse. The order is a
//! structural invariant, not configuration; it only changes together with
//! the table semantics themselves.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for one domain table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Clients,
    Facilities,
    Contacts,
    Contracts,
    Islands,
    CheckUps,
    CheckItems,
    Photos,
    SpareParts,
    CheckUpIslands,
    Interventions,
}

/// Total order over tables such that every table appears after all tables it
/// references. Insert forward, delete in reverse.
pub const DEPENDENCY_ORDER: [Table; 11] = [
    Table::Clients,
    Table::Facilities,
    Table::Contacts,
    Table::Contracts,
    Table::Islands,
    Table::CheckUps,
    Table::CheckItems,
    Table::Photos,
    Table::SpareParts,
    Table::CheckUpIslands,
    Table::Interventions,
];

impl Table {
    /// Stable lowercase name used in artifacts, logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Table::Clients => "clients",
            Table::Facilities => "facilities",
            Table::Contacts => "contacts",
            Table::Contracts => "contracts",
            Table::Islands => "islands",
            Table::CheckUps => "check_ups",
            Table::CheckItems => "check_items",
            Table::Photos => "photos",
            Table::SpareParts => "spare_parts",
            Table::CheckUpIslands => "check_up_islands",
            Table::Interventions => "interventions",
        }
    }

    /// All tables in dependency order
    pub fn in_dependency_order() -> impl Iterator<Item = Table> {
        DEPENDENCY_ORDER.into_iter()
    }

    /// All tables in reverse dependency order (deletion order)
    pub fn in_deletion_order() -> impl Iterator<Item = Table> {
        DEPENDENCY_ORDER.into_iter().rev()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    // Each table's direct FK targets; the order test below is what actually
    // protects the invariant when someone edits DEPENDENCY_ORDER.
    fn references(table: Table) -> Vec<Table> {
        match table {
            Table::Clients => vec![],
            Table::Facilities => vec![Table::Clients],
            Table::Contacts => vec![Table::Clients],
            Table::Contracts => vec![Table::Clients],
            Table::Islands => vec![Table::Facilities],
            Table::CheckUps => vec![Table::Facilities],
            Table::CheckItems => vec![Table::CheckUps],
            Table::Photos => vec![Table::CheckItems],
            Table::SpareParts => vec![Table::CheckUps],
            Table::CheckUpIslands => vec![Table::CheckUps, Table::Islands],
            Table::Interventions => vec![],
        }
    }

    #[test]
    fn test_order_covers_every_table_once() {
        let unique: HashSet<Table> = DEPENDENCY_ORDER.into_iter().collect();
        assert_eq!(unique.len(), DEPENDENCY_ORDER.len());
    }

    #[test]
    fn test_order_respects_foreign_keys() {
        for (pos, table) in DEPENDENCY_ORDER.into_iter().enumerate() {
            for target in references(table) {
                let target_pos = DEPENDENCY_ORDER
                    .into_iter()
                    .position(|t| t == target)
                    .unwrap();
                assert!(
                    target_pos < pos,
                    "{} must come after {} in DEPENDENCY_ORDER",
                    table,
                    target
                );
            }
        }
    }

    #[test]
    fn test_deletion_order_is_exact_reverse() {
        let forward: Vec<Table> = Table::in_dependency_order().collect();
        let mut deletion: Vec<Table> = Table::in_deletion_order().collect();
        deletion.reverse();
        assert_eq!(forward, deletion);
    }

    #[test]
    fn test_names_are_stable() {
        assert_eq!(Table::CheckUps.name(), "check_ups");
        assert_eq!(Table::CheckUpIslands.name(), "check_up_islands");
        assert_eq!(Table::CheckUps.to_string(), "check_ups");
    }

    #[test]
    fn test_serde_name_matches_display() {
        for table in DEPENDENCY_ORDER {
            let json = serde_json::to_string(&table).unwrap();
            assert_eq!(json, format!("\"{}\"", table.name()));
        }
    }
}
