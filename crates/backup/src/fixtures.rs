//! Shared test fixtures
//!
//! Record builders and pre-populated snapshots/stores used across the unit
//! tests of this crate. Compiled only for tests.

use crate::snapshot::{
    BackupMetadata, DeviceInfo, PhotoManifest, SettingsBlob, Snapshot, TableSections,
    DATABASE_SCHEMA_VERSION,
};
use chrono::{NaiveDate, TimeZone, Utc};
use fieldcheck_core::records::*;
use fieldcheck_core::types::{BackupId, RowId};
use fieldcheck_store::FieldStore;

pub(crate) fn client(id: RowId) -> ClientRecord {
    ClientRecord {
        id,
        name: format!("Client {}", id),
        vat_number: format!("IT{:011}", id),
        address: "Via Volta 12".to_string(),
        city: "Brescia".to_string(),
        phone: "+39 030 555000".to_string(),
        email: format!("client{}@example.test", id),
        notes: String::new(),
    }
}

pub(crate) fn facility(id: RowId, client_id: RowId) -> FacilityRecord {
    FacilityRecord {
        id,
        client_id,
        name: format!("Station {}", id),
        address: "SP 19 km 2".to_string(),
        city: "Cremona".to_string(),
        code: format!("ST-{:03}", id),
    }
}

pub(crate) fn island(id: RowId, facility_id: RowId) -> IslandRecord {
    IslandRecord {
        id,
        facility_id,
        label: format!("Isola {}", id),
        dispenser_count: 2,
        fuel_type: "diesel".to_string(),
    }
}

pub(crate) fn contact(id: RowId, client_id: RowId) -> ContactRecord {
    ContactRecord {
        id,
        client_id,
        name: format!("Contact {}", id),
        role: "site manager".to_string(),
        phone: String::new(),
        email: String::new(),
    }
}

pub(crate) fn contract(id: RowId, client_id: RowId) -> ContractRecord {
    ContractRecord {
        id,
        client_id,
        number: format!("C-2024-{:04}", id),
        starts_on: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        ends_on: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        kind: "full-service".to_string(),
        notes: String::new(),
    }
}

pub(crate) fn check_up(id: RowId, facility_id: RowId) -> CheckUpRecord {
    CheckUpRecord {
        id,
        facility_id,
        performed_on: NaiveDate::from_ymd_opt(2024, 6, 14).unwrap(),
        operator: "G. Ferrero".to_string(),
        status: CheckUpStatus::Completed,
        notes: String::new(),
    }
}

pub(crate) fn check_item(id: RowId, check_up_id: RowId) -> CheckItemRecord {
    CheckItemRecord {
        id,
        check_up_id,
        name: "Nozzle seal".to_string(),
        outcome: CheckItemOutcome::Ok,
        value: String::new(),
        notes: String::new(),
    }
}

pub(crate) fn photo(id: RowId, check_item_id: RowId) -> PhotoRecord {
    PhotoRecord {
        id,
        check_item_id,
        file_name: format!("IMG_{:05}.jpg", id),
        caption: String::new(),
        taken_at: Utc.with_ymd_and_hms(2024, 6, 14, 10, 30, 0).unwrap(),
        size_bytes: 204_800,
        has_thumbnail: true,
    }
}

pub(crate) fn spare_part(id: RowId, check_up_id: RowId) -> SparePartRecord {
    SparePartRecord {
        id,
        check_up_id,
        name: "Breakaway coupling".to_string(),
        code: "BC-110".to_string(),
        quantity: 1,
        unit_price_cents: 4_500,
    }
}

pub(crate) fn check_up_island(id: RowId, check_up_id: RowId, island_id: RowId) -> CheckUpIslandRecord {
    CheckUpIslandRecord {
        id,
        check_up_id,
        island_id,
    }
}

pub(crate) fn intervention(id: RowId) -> InterventionRecord {
    InterventionRecord {
        id,
        performed_on: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
        technician: "L. Bianchi".to_string(),
        site_name: "Deposito Sud".to_string(),
        description: "Replaced fuse on dispenser 2".to_string(),
        hours: 1.5,
    }
}

/// Table sections with a coherent row in every table
pub(crate) fn populated_sections() -> TableSections {
    TableSections {
        clients: vec![client(1), client(2)],
        facilities: vec![facility(10, 1), facility(11, 2)],
        contacts: vec![contact(20, 1)],
        contracts: vec![contract(30, 1)],
        islands: vec![island(40, 10)],
        check_ups: vec![check_up(50, 10)],
        check_items: vec![check_item(60, 50)],
        photos: vec![photo(70, 60)],
        spare_parts: vec![spare_part(80, 50)],
        check_up_islands: vec![check_up_island(90, 50, 40)],
        interventions: vec![intervention(100)],
    }
}

/// Snapshot wrapping [`populated_sections`], checksum unset
pub(crate) fn populated_snapshot() -> Snapshot {
    Snapshot {
        metadata: BackupMetadata {
            id: BackupId::new(),
            created_at: Utc.with_ymd_and_hms(2024, 6, 15, 8, 0, 0).unwrap(),
            app_version: "0.4.0".to_string(),
            database_version: DATABASE_SCHEMA_VERSION,
            checksum: String::new(),
            total_size_bytes: 0,
            description: "pre-release backup".to_string(),
            device_info: DeviceInfo {
                device_model: "Pixel 7".to_string(),
                os_version: "14".to_string(),
                app_build: "412".to_string(),
            },
        },
        database: populated_sections(),
        settings: SettingsBlob(serde_json::json!({"theme": "dark"})),
        photo_manifest: PhotoManifest::default(),
    }
}

/// A live store seeded with different content than [`populated_sections`]
pub(crate) fn seeded_store() -> FieldStore {
    let store = FieldStore::new();
    store
        .with_transaction(|tx| {
            tx.insert_client(client(500))?;
            tx.insert_facility(facility(510, 500))?;
            tx.insert_island(island(520, 510))?;
            tx.insert_check_up(check_up(530, 510))?;
            tx.insert_check_item(check_item(540, 530))?;
            Ok::<_, fieldcheck_core::StoreError>(())
        })
        .expect("seeding cannot fail");
    store
}
