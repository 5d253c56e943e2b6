use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::{StoreCounts, TraceabilityReader, TraceabilityStore};
use crate::errors::ServiceError;
use crate::models::{AuditEntry, CultivationLot, EntityKind, Logistics, Transformation};

/// Process-local store backed by concurrent maps.
///
/// Cloning is cheap and every clone sees the same data.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    lots: Arc<DashMap<Uuid, CultivationLot>>,
    lot_codes: Arc<DashMap<String, Uuid>>,
    transformations: Arc<DashMap<Uuid, Transformation>>,
    transformation_by_lot: Arc<DashMap<Uuid, Uuid>>,
    logistics: Arc<DashMap<Uuid, Logistics>>,
    logistics_by_transformation: Arc<DashMap<Uuid, Uuid>>,
    guide_numbers: Arc<DashMap<String, Uuid>>,
    audit: Arc<DashMap<(EntityKind, Uuid), Vec<AuditEntry>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every audit entry, grouped by record. Each group keeps its recording
    /// order; groups are ordered by their first entry.
    pub fn all_audit(&self) -> Vec<AuditEntry> {
        let mut trails: Vec<Vec<AuditEntry>> =
            self.audit.iter().map(|e| e.value().clone()).collect();
        trails.sort_by_key(|trail| trail.first().map(|e| (e.recorded_at, e.id)));
        trails.into_iter().flatten().collect()
    }

    // Appending to the log cannot fail.
    fn append_audit(&self, entry: AuditEntry) {
        self.audit
            .entry((entry.entity_kind, entry.entity_id))
            .or_default()
            .push(entry);
    }

    pub fn all_transformations(&self) -> Vec<Transformation> {
        let mut items: Vec<Transformation> =
            self.transformations.iter().map(|e| e.value().clone()).collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        items
    }

    pub fn all_logistics(&self) -> Vec<Logistics> {
        let mut items: Vec<Logistics> = self.logistics.iter().map(|e| e.value().clone()).collect();
        items.sort_by(|a, b| {
            b.delivered_at
                .cmp(&a.delivered_at)
                .then_with(|| a.guide_number.cmp(&b.guide_number))
        });
        items
    }
}

impl TraceabilityReader for InMemoryStore {
    fn find_lot(&self, id: Uuid) -> Result<Option<CultivationLot>, ServiceError> {
        Ok(self.lots.get(&id).map(|lot| lot.clone()))
    }

    fn find_lot_by_code(&self, code: &str) -> Result<Option<CultivationLot>, ServiceError> {
        let id = match self.lot_codes.get(code) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.find_lot(id)
    }

    fn find_transformation(&self, id: Uuid) -> Result<Option<Transformation>, ServiceError> {
        Ok(self.transformations.get(&id).map(|t| t.clone()))
    }

    fn find_logistics(&self, id: Uuid) -> Result<Option<Logistics>, ServiceError> {
        Ok(self.logistics.get(&id).map(|g| g.clone()))
    }

    fn transformation_for_lot(&self, lot_id: Uuid) -> Result<Option<Transformation>, ServiceError> {
        let id = match self.transformation_by_lot.get(&lot_id) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.find_transformation(id)
    }

    fn logistics_for_transformation(
        &self,
        transformation_id: Uuid,
    ) -> Result<Option<Logistics>, ServiceError> {
        let id = match self.logistics_by_transformation.get(&transformation_id) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.find_logistics(id)
    }

    fn list_lots(&self) -> Result<Vec<CultivationLot>, ServiceError> {
        let mut lots: Vec<CultivationLot> = self.lots.iter().map(|e| e.value().clone()).collect();
        lots.sort_by(|a, b| {
            b.harvest_date
                .cmp(&a.harvest_date)
                .then_with(|| a.code.cmp(&b.code))
        });
        Ok(lots)
    }

    fn counts(&self) -> Result<StoreCounts, ServiceError> {
        Ok(StoreCounts {
            lots: self.lots.len(),
            transformations: self.transformations.len(),
            logistics: self.logistics.len(),
        })
    }
}

impl TraceabilityStore for InMemoryStore {
    fn insert_lot(&self, lot: CultivationLot) -> Result<CultivationLot, ServiceError> {
        match self.lot_codes.entry(lot.code.clone()) {
            Entry::Occupied(_) => Err(ServiceError::Conflict(format!(
                "Lot code {} is already registered",
                lot.code
            ))),
            Entry::Vacant(slot) => {
                slot.insert(lot.id);
                self.lots.insert(lot.id, lot.clone());
                Ok(lot)
            }
        }
    }

    fn insert_transformation(
        &self,
        transformation: Transformation,
    ) -> Result<Transformation, ServiceError> {
        if !self.lots.contains_key(&transformation.lot_id) {
            return Err(ServiceError::NotFound(format!(
                "Lot {} not found",
                transformation.lot_id
            )));
        }
        match self.transformation_by_lot.entry(transformation.lot_id) {
            Entry::Occupied(_) => Err(ServiceError::Conflict(format!(
                "Lot {} already has a transformation",
                transformation.lot_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(transformation.id);
                self.transformations
                    .insert(transformation.id, transformation.clone());
                Ok(transformation)
            }
        }
    }

    fn insert_logistics(&self, logistics: Logistics) -> Result<Logistics, ServiceError> {
        if !self
            .transformations
            .contains_key(&logistics.transformation_id)
        {
            return Err(ServiceError::NotFound(format!(
                "Transformation {} not found",
                logistics.transformation_id
            )));
        }
        match self
            .logistics_by_transformation
            .entry(logistics.transformation_id)
        {
            Entry::Occupied(_) => Err(ServiceError::Conflict(format!(
                "Transformation {} already has a logistics record",
                logistics.transformation_id
            ))),
            Entry::Vacant(slot) => match self.guide_numbers.entry(logistics.guide_number.clone()) {
                Entry::Occupied(_) => Err(ServiceError::Conflict(format!(
                    "Guide number {} is already registered",
                    logistics.guide_number
                ))),
                Entry::Vacant(guide) => {
                    guide.insert(logistics.id);
                    slot.insert(logistics.id);
                    self.logistics.insert(logistics.id, logistics.clone());
                    Ok(logistics)
                }
            },
        }
    }

    fn update_logistics(&self, logistics: Logistics) -> Result<Logistics, ServiceError> {
        let previous_guide = match self.logistics.get(&logistics.id) {
            Some(existing) => existing.guide_number.clone(),
            None => {
                return Err(ServiceError::NotFound(format!(
                    "Logistics {} not found",
                    logistics.id
                )))
            }
        };

        if previous_guide != logistics.guide_number {
            match self.guide_numbers.entry(logistics.guide_number.clone()) {
                Entry::Occupied(_) => {
                    return Err(ServiceError::Conflict(format!(
                        "Guide number {} is already registered",
                        logistics.guide_number
                    )))
                }
                Entry::Vacant(slot) => {
                    slot.insert(logistics.id);
                }
            }
            self.guide_numbers.remove(&previous_guide);
        }

        self.logistics.insert(logistics.id, logistics.clone());
        Ok(logistics)
    }

    fn record_audit(&self, entry: AuditEntry) -> Result<(), ServiceError> {
        self.append_audit(entry);
        Ok(())
    }

    fn audited<T, F>(&self, entry: AuditEntry, write: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&Self) -> Result<T, ServiceError>,
    {
        let written = write(self)?;
        self.append_audit(entry);
        Ok(written)
    }

    fn audit_trail(&self, kind: EntityKind, id: Uuid) -> Result<Vec<AuditEntry>, ServiceError> {
        Ok(self
            .audit
            .get(&(kind, id))
            .map(|entries| entries.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn lot(code: &str, day: u32) -> CultivationLot {
        CultivationLot::new(
            code,
            "Aguacate Hass",
            "Finca El Roble, Cartago",
            dec!(3.25),
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            "Laura Fernández",
        )
    }

    fn transformation(lot_id: Uuid) -> Transformation {
        let washed = Utc::now() - Duration::days(2);
        Transformation {
            id: Uuid::new_v4(),
            lot_id,
            washed_at: washed,
            washing_temperature: dec!(20),
            washing_responsible: "Juan Pérez".into(),
            packaged_at: washed + Duration::hours(2),
            package_type: "Bolsa plástica".into(),
            unit_count: 500,
            packaging_responsible: "Juan Pérez".into(),
            quality_checked_at: washed + Duration::hours(3),
            quality_result: "CONDITIONAL".into(),
            quality_observations: Some("Minor bruising".into()),
            quality_responsible: "Ana Martínez".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn logistics(transformation_id: Uuid, guide: &str) -> Logistics {
        let departed = Utc::now() - Duration::hours(10);
        Logistics {
            id: Uuid::new_v4(),
            transformation_id,
            guide_number: guide.into(),
            vehicle: "Placa XYZ-789".into(),
            driver: "Carlos Ramírez".into(),
            min_temperature: dec!(2.5),
            max_temperature: dec!(7),
            avg_temperature: dec!(4),
            departed_at: departed,
            delivered_at: departed + Duration::hours(5),
            destination: "Mercado Norte".into(),
            destination_address: "Calle 5".into(),
            status: "IN_TRANSIT".into(),
            distance_km: None,
            transport_notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn lot_codes_are_unique() {
        let store = InMemoryStore::new();
        store.insert_lot(lot("LOT-A", 10)).unwrap();
        let err = store.insert_lot(lot("LOT-A", 11)).unwrap_err();
        assert_matches!(err, ServiceError::Conflict(_));
        assert_eq!(store.counts().unwrap().lots, 1);
    }

    #[test]
    fn links_are_one_to_one() {
        let store = InMemoryStore::new();
        let lot = store.insert_lot(lot("LOT-B", 10)).unwrap();
        let t = store.insert_transformation(transformation(lot.id)).unwrap();
        assert_matches!(
            store.insert_transformation(transformation(lot.id)),
            Err(ServiceError::Conflict(_))
        );

        store.insert_logistics(logistics(t.id, "GUI-0001")).unwrap();
        assert_matches!(
            store.insert_logistics(logistics(t.id, "GUI-0002")),
            Err(ServiceError::Conflict(_))
        );

        assert_eq!(store.transformation_for_lot(lot.id).unwrap().map(|x| x.id), Some(t.id));
        assert!(store.logistics_for_transformation(t.id).unwrap().is_some());
    }

    #[test]
    fn guide_numbers_are_unique_across_transformations() {
        let store = InMemoryStore::new();
        let a = store.insert_lot(lot("LOT-C", 10)).unwrap();
        let b = store.insert_lot(lot("LOT-D", 11)).unwrap();
        let ta = store.insert_transformation(transformation(a.id)).unwrap();
        let tb = store.insert_transformation(transformation(b.id)).unwrap();
        store.insert_logistics(logistics(ta.id, "GUI-0100")).unwrap();
        assert_matches!(
            store.insert_logistics(logistics(tb.id, "GUI-0100")),
            Err(ServiceError::Conflict(_))
        );
        // the failed insert must not leave the transformation linked
        assert!(store.logistics_for_transformation(tb.id).unwrap().is_none());
    }

    #[test]
    fn references_must_exist() {
        let store = InMemoryStore::new();
        assert_matches!(
            store.insert_transformation(transformation(Uuid::new_v4())),
            Err(ServiceError::NotFound(_))
        );
        assert_matches!(
            store.insert_logistics(logistics(Uuid::new_v4(), "GUI-0003")),
            Err(ServiceError::NotFound(_))
        );
    }

    #[test]
    fn lots_listed_newest_harvest_first() {
        let store = InMemoryStore::new();
        store.insert_lot(lot("LOT-OLD", 2)).unwrap();
        store.insert_lot(lot("LOT-NEW", 20)).unwrap();
        store.insert_lot(lot("LOT-AAA", 20)).unwrap();
        let codes: Vec<String> = store.list_lots().unwrap().into_iter().map(|l| l.code).collect();
        assert_eq!(codes, vec!["LOT-AAA", "LOT-NEW", "LOT-OLD"]);
    }

    #[test]
    fn audit_trail_keeps_recording_order() {
        let store = InMemoryStore::new();
        let id = Uuid::new_v4();
        store
            .record_audit(AuditEntry::new(
                EntityKind::Lot,
                id,
                crate::models::AuditAction::Create,
                "first",
            ))
            .unwrap();
        store
            .record_audit(AuditEntry::new(
                EntityKind::Lot,
                id,
                crate::models::AuditAction::Update,
                "second",
            ))
            .unwrap();
        let trail = store.audit_trail(EntityKind::Lot, id).unwrap();
        let descriptions: Vec<&str> = trail.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(descriptions, vec!["first", "second"]);
        assert!(store
            .audit_trail(EntityKind::Logistics, id)
            .unwrap()
            .is_empty());
        assert_eq!(store.all_audit().len(), 2);
    }

    #[test]
    fn audited_write_keeps_record_and_entry_together() {
        let store = InMemoryStore::new();
        let first = lot("LOT-E", 10);
        let entry = |lot: &CultivationLot| {
            AuditEntry::new(
                EntityKind::Lot,
                lot.id,
                crate::models::AuditAction::Create,
                "registered",
            )
        };

        let saved = store
            .audited(entry(&first), |s| s.insert_lot(first.clone()))
            .unwrap();
        assert_eq!(store.audit_trail(EntityKind::Lot, saved.id).unwrap().len(), 1);

        let duplicate = lot("LOT-E", 11);
        assert_matches!(
            store.audited(entry(&duplicate), |s| s.insert_lot(duplicate.clone())),
            Err(ServiceError::Conflict(_))
        );
        assert!(store
            .audit_trail(EntityKind::Lot, duplicate.id)
            .unwrap()
            .is_empty());
        assert_eq!(store.all_audit().len(), 1);
    }
}
