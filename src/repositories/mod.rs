use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{AuditEntry, CultivationLot, EntityKind, Logistics, Transformation};

pub mod dataset;
pub mod memory;

pub use dataset::Dataset;
pub use memory::InMemoryStore;

/// Read-only lookups the chain validator needs.
///
/// Implementations return either a whole record or `None`; they never hand
/// out partial records.
pub trait TraceabilityReader: Send + Sync {
    fn find_lot(&self, id: Uuid) -> Result<Option<CultivationLot>, ServiceError>;

    fn find_lot_by_code(&self, code: &str) -> Result<Option<CultivationLot>, ServiceError>;

    fn find_transformation(&self, id: Uuid) -> Result<Option<Transformation>, ServiceError>;

    fn find_logistics(&self, id: Uuid) -> Result<Option<Logistics>, ServiceError>;

    /// The transformation recorded for a lot, if any.
    fn transformation_for_lot(&self, lot_id: Uuid) -> Result<Option<Transformation>, ServiceError>;

    /// The logistics record of a transformation, if any.
    fn logistics_for_transformation(
        &self,
        transformation_id: Uuid,
    ) -> Result<Option<Logistics>, ServiceError>;

    /// All lots, most recent harvest first, then by code.
    fn list_lots(&self) -> Result<Vec<CultivationLot>, ServiceError>;

    fn counts(&self) -> Result<StoreCounts, ServiceError>;
}

/// Write side of the persistence collaborator.
///
/// Storage owns uniqueness: lot codes and guide numbers are unique, a lot has
/// at most one transformation and a transformation at most one logistics
/// record. Violations of these surface as [`ServiceError::Conflict`].
pub trait TraceabilityStore: TraceabilityReader {
    fn insert_lot(&self, lot: CultivationLot) -> Result<CultivationLot, ServiceError>;

    fn insert_transformation(
        &self,
        transformation: Transformation,
    ) -> Result<Transformation, ServiceError>;

    fn insert_logistics(&self, logistics: Logistics) -> Result<Logistics, ServiceError>;

    fn update_logistics(&self, logistics: Logistics) -> Result<Logistics, ServiceError>;

    fn record_audit(&self, entry: AuditEntry) -> Result<(), ServiceError>;

    /// Runs `write` and records `entry` as one unit. When `write` fails the
    /// entry is dropped, and when the entry cannot be recorded the effect of
    /// `write` must not remain visible.
    fn audited<T, F>(&self, entry: AuditEntry, write: F) -> Result<T, ServiceError>
    where
        Self: Sized,
        F: FnOnce(&Self) -> Result<T, ServiceError>;

    /// Entries for one record, in recording order.
    fn audit_trail(&self, kind: EntityKind, id: Uuid) -> Result<Vec<AuditEntry>, ServiceError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub lots: usize,
    pub transformations: usize,
    pub logistics: usize,
}
