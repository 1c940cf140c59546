//! Shared helpers for the workspace integration tests

// Each test target compiles its own copy; not every helper is used by every
// target.
#![allow(dead_code)]

use chrono::{NaiveDate, TimeZone, Utc};
use fieldcheck::{
    BackupEngine, BackupFileManager, CheckItemOutcome, CheckItemRecord, CheckUpIslandRecord,
    CheckUpRecord, CheckUpStatus, ClientRecord, ContactRecord, ContractRecord, FacilityRecord,
    FieldStore, InterventionRecord, IslandRecord, JsonSettingsStore, PhotoArchiver, PhotoRecord,
    RowId, SettingsBlob, SettingsStore, SparePartRecord, StoreError,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Once;
use tempfile::TempDir;

static TRACING: Once = Once::new();

/// Route engine logs through the test harness, once per process
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

pub struct TestEnv {
    // Held for the lifetime of the environment so the tempdir survives.
    pub dir: TempDir,
    pub engine: BackupEngine<JsonSettingsStore>,
    pub store: FieldStore,
    pub photos_root: PathBuf,
}

/// Engine over a fresh tempdir with the given store
pub fn engine_with_store(store: FieldStore) -> TestEnv {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let photos_root = dir.path().join("photos");
    fs::create_dir_all(&photos_root).unwrap();

    let settings = JsonSettingsStore::new(dir.path().join("settings.json"));
    settings
        .import_settings(&SettingsBlob(serde_json::json!({
            "language": "it",
            "report_footer": "Verifiche periodiche impianti"
        })))
        .unwrap();

    let engine = BackupEngine::new(
        store.clone(),
        BackupFileManager::new(dir.path().join("backups")),
        PhotoArchiver::new(&photos_root),
        settings,
    );
    TestEnv {
        dir,
        engine,
        store,
        photos_root,
    }
}

/// A store populated across every table with coherent references
pub fn full_store() -> FieldStore {
    let store = FieldStore::new();
    store
        .with_transaction(|tx| {
            for id in 1..=3 {
                tx.insert_client(client(id))?;
            }
            tx.insert_facility(facility(10, 1))?;
            tx.insert_facility(facility(11, 2))?;
            tx.insert_contact(contact(20, 1))?;
            tx.insert_contract(contract(30, 1))?;
            tx.insert_island(island(40, 10))?;
            tx.insert_island(island(41, 11))?;
            tx.insert_check_up(check_up(50, 10))?;
            tx.insert_check_up(check_up(51, 11))?;
            tx.insert_check_item(check_item(60, 50))?;
            tx.insert_check_item(check_item(61, 50))?;
            tx.insert_photo(photo(70, 60))?;
            tx.insert_spare_part(spare_part(80, 51))?;
            tx.insert_check_up_island(link(90, 50, 40))?;
            tx.insert_check_up_island(link(91, 51, 41))?;
            tx.insert_intervention(intervention(100))?;
            Ok::<_, StoreError>(())
        })
        .unwrap();
    store
}

pub fn client(id: RowId) -> ClientRecord {
    ClientRecord {
        id,
        name: format!("Client {}", id),
        vat_number: format!("IT{:011}", id),
        address: "Via Mazzini 4".to_string(),
        city: "Parma".to_string(),
        phone: String::new(),
        email: String::new(),
        notes: String::new(),
    }
}

pub fn facility(id: RowId, client_id: RowId) -> FacilityRecord {
    FacilityRecord {
        id,
        client_id,
        name: format!("Station {}", id),
        address: "Tangenziale Est 7".to_string(),
        city: "Modena".to_string(),
        code: format!("ST-{:03}", id),
    }
}

pub fn island(id: RowId, facility_id: RowId) -> IslandRecord {
    IslandRecord {
        id,
        facility_id,
        label: format!("Isola {}", id),
        dispenser_count: 4,
        fuel_type: "petrol".to_string(),
    }
}

pub fn contact(id: RowId, client_id: RowId) -> ContactRecord {
    ContactRecord {
        id,
        client_id,
        name: format!("Contact {}", id),
        role: "administration".to_string(),
        phone: String::new(),
        email: String::new(),
    }
}

pub fn contract(id: RowId, client_id: RowId) -> ContractRecord {
    ContractRecord {
        id,
        client_id,
        number: format!("C-2024-{:04}", id),
        starts_on: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        ends_on: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        kind: "on-call".to_string(),
        notes: String::new(),
    }
}

pub fn check_up(id: RowId, facility_id: RowId) -> CheckUpRecord {
    CheckUpRecord {
        id,
        facility_id,
        performed_on: NaiveDate::from_ymd_opt(2024, 7, 3).unwrap(),
        operator: "G. Ferrero".to_string(),
        status: CheckUpStatus::Completed,
        notes: String::new(),
    }
}

pub fn check_item(id: RowId, check_up_id: RowId) -> CheckItemRecord {
    CheckItemRecord {
        id,
        check_up_id,
        name: "Vapor recovery".to_string(),
        outcome: CheckItemOutcome::Ok,
        value: "97%".to_string(),
        notes: String::new(),
    }
}

pub fn photo(id: RowId, check_item_id: RowId) -> PhotoRecord {
    PhotoRecord {
        id,
        check_item_id,
        file_name: format!("IMG_{:05}.jpg", id),
        caption: String::new(),
        taken_at: Utc.with_ymd_and_hms(2024, 7, 3, 9, 15, 0).unwrap(),
        size_bytes: 102_400,
        has_thumbnail: false,
    }
}

pub fn spare_part(id: RowId, check_up_id: RowId) -> SparePartRecord {
    SparePartRecord {
        id,
        check_up_id,
        name: "Nozzle swivel".to_string(),
        code: "NS-220".to_string(),
        quantity: 2,
        unit_price_cents: 1_890,
    }
}

pub fn link(id: RowId, check_up_id: RowId, island_id: RowId) -> CheckUpIslandRecord {
    CheckUpIslandRecord {
        id,
        check_up_id,
        island_id,
    }
}

pub fn intervention(id: RowId) -> InterventionRecord {
    InterventionRecord {
        id,
        performed_on: NaiveDate::from_ymd_opt(2024, 2, 19).unwrap(),
        technician: "L. Bianchi".to_string(),
        site_name: "Area di servizio Ovest".to_string(),
        description: "Emergency stop button replaced".to_string(),
        hours: 2.0,
    }
}
