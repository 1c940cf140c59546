//! Domain table records
//!
//! One flat, self-contained value object per exportable table. Every record
//! carries its own primary key and the foreign keys it depends on, so a
//! record set can be serialized, moved between devices and re-inserted
//! without any surrounding context.
//!
//! Serde rules: unknown fields are ignored on deserialization (forward
//! compatibility with newer producers), but ids and foreign keys are plain
//! required fields — a document missing them fails to parse instead of
//! silently defaulting.

use crate::types::RowId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A client company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    /// Primary key
    pub id: RowId,
    /// Company name
    pub name: String,
    /// VAT registration number
    pub vat_number: String,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub notes: String,
}

/// A serviced facility (fuel dispensing site) belonging to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityRecord {
    /// Primary key
    pub id: RowId,
    /// Owning client
    pub client_id: RowId,
    pub name: String,
    pub address: String,
    pub city: String,
    /// Internal site code printed on reports
    #[serde(default)]
    pub code: String,
}

/// A pump island inside a facility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IslandRecord {
    /// Primary key
    pub id: RowId,
    /// Owning facility
    pub facility_id: RowId,
    /// Label as painted on site ("Isola 1", "Diesel B", ...)
    pub label: String,
    pub dispenser_count: u32,
    #[serde(default)]
    pub fuel_type: String,
}

/// A contact person at a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    /// Primary key
    pub id: RowId,
    /// Owning client
    pub client_id: RowId,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

/// A maintenance contract with a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    /// Primary key
    pub id: RowId,
    /// Owning client
    pub client_id: RowId,
    /// Contract number
    pub number: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    /// Contract kind ("full-service", "on-call", ...)
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub notes: String,
}

/// Lifecycle state of a check-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckUpStatus {
    /// Created but not yet carried out
    Planned,
    /// Technician is on site
    InProgress,
    /// All items recorded and signed off
    Completed,
}

/// A periodic inspection visit at a facility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckUpRecord {
    /// Primary key
    pub id: RowId,
    /// Inspected facility
    pub facility_id: RowId,
    pub performed_on: NaiveDate,
    /// Technician who carried out the visit
    pub operator: String,
    pub status: CheckUpStatus,
    #[serde(default)]
    pub notes: String,
}

/// Result of a single inspection item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckItemOutcome {
    Ok,
    Warning,
    Fail,
    /// Item could not be checked (equipment off, access blocked, ...)
    Skipped,
}

/// A single checklist entry recorded during a check-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckItemRecord {
    /// Primary key
    pub id: RowId,
    /// Parent check-up
    pub check_up_id: RowId,
    /// What was checked ("Nozzle seal", "Vapor recovery", ...)
    pub name: String,
    pub outcome: CheckItemOutcome,
    /// Measured value where the item is quantitative
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub notes: String,
}

/// A photo attached to a check item
///
/// The record stores only file-level metadata; the image bytes live in the
/// photo directory and travel inside the photo archive, not the database
/// section of the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    /// Primary key
    pub id: RowId,
    /// Check item the photo documents
    pub check_item_id: RowId,
    /// File name relative to the photo directory
    pub file_name: String,
    #[serde(default)]
    pub caption: String,
    pub taken_at: DateTime<Utc>,
    pub size_bytes: u64,
    #[serde(default)]
    pub has_thumbnail: bool,
}

/// A spare part consumed during a check-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparePartRecord {
    /// Primary key
    pub id: RowId,
    /// Check-up the part was used in
    pub check_up_id: RowId,
    pub name: String,
    /// Supplier part code
    #[serde(default)]
    pub code: String,
    pub quantity: u32,
    #[serde(default)]
    pub unit_price_cents: i64,
}

/// Association between a check-up and an inspected island
///
/// A check-up can cover several islands and an island appears in many
/// check-ups, so the link is its own table with its own primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckUpIslandRecord {
    /// Primary key
    pub id: RowId,
    pub check_up_id: RowId,
    pub island_id: RowId,
}

/// An unscheduled technical intervention
///
/// Interventions are recorded free-standing: the site is captured as text at
/// the time of the call-out, so the record has no foreign keys and survives
/// even if the client is later removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionRecord {
    /// Primary key
    pub id: RowId,
    pub performed_on: NaiveDate,
    pub technician: String,
    /// Site name as free text
    pub site_name: String,
    pub description: String,
    #[serde(default)]
    pub hours: f64,
}
