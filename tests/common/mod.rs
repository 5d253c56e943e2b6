#![allow(dead_code)]

use std::sync::Arc;

use agritrace::{
    models::{CultivationLot, Logistics, Transformation},
    InMemoryStore, TraceabilityService, TraceabilityStore,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Fixed "today" for every test, well after the scenario dates.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

pub fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0).unwrap()
}

/// Lot `LOTE-2024-001`, harvested 2024-01-15 on 5.50 ha.
pub fn scenario_lot() -> CultivationLot {
    CultivationLot::new(
        "LOTE-2024-001",
        "Mango Ataulfo",
        "Finca San José, Valle Central",
        dec!(5.50),
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        "Juan Pérez",
    )
}

/// Washing 16th 08:00 at 25 °C, packaging 14:00 with 1000 units, QC 16:00 approved.
pub fn scenario_transformation(lot_id: Uuid) -> Transformation {
    let now = Utc::now();
    Transformation {
        id: Uuid::new_v4(),
        lot_id,
        washed_at: at(16, 8, 0),
        washing_temperature: dec!(25),
        washing_responsible: "Carlos Ramírez".into(),
        packaged_at: at(16, 14, 0),
        package_type: "Caja de cartón".into(),
        unit_count: 1000,
        packaging_responsible: "María González".into(),
        quality_checked_at: at(16, 16, 0),
        quality_result: "APPROVED".into(),
        quality_observations: Some("Inspection completed per protocol".into()),
        quality_responsible: "Ana Martínez".into(),
        created_at: now,
        updated_at: now,
    }
}

/// Guide `GUI-2024-001`, 3/6/4.5 °C, departing 17th 06:00 and delivered six hours later.
pub fn scenario_logistics(transformation_id: Uuid) -> Logistics {
    let now = Utc::now();
    Logistics {
        id: Uuid::new_v4(),
        transformation_id,
        guide_number: "GUI-2024-001".into(),
        vehicle: "ABC-123".into(),
        driver: "Roberto Sánchez".into(),
        min_temperature: dec!(3),
        max_temperature: dec!(6),
        avg_temperature: dec!(4.5),
        departed_at: at(17, 6, 0),
        delivered_at: at(17, 12, 0),
        destination: "Supermercado Central".into(),
        destination_address: "Avenida Central, San José".into(),
        status: "DELIVERED".into(),
        distance_km: Some(dec!(120)),
        transport_notes: None,
        created_at: now,
        updated_at: now,
    }
}

/// The three scenario records, linked to each other.
pub fn scenario_chain() -> (CultivationLot, Transformation, Logistics) {
    let lot = scenario_lot();
    let transformation = scenario_transformation(lot.id);
    let logistics = scenario_logistics(transformation.id);
    (lot, transformation, logistics)
}

/// Store holding the given records, inserted parent first.
pub fn store_with(
    lot: CultivationLot,
    transformation: Option<Transformation>,
    logistics: Option<Logistics>,
) -> InMemoryStore {
    let store = InMemoryStore::new();
    store.insert_lot(lot).unwrap();
    if let Some(transformation) = transformation {
        store.insert_transformation(transformation).unwrap();
    }
    if let Some(logistics) = logistics {
        store.insert_logistics(logistics).unwrap();
    }
    store
}

pub fn service() -> TraceabilityService<InMemoryStore> {
    TraceabilityService::new(Arc::new(InMemoryStore::new()))
}
