// Traceability chain records
pub mod logistics;
pub mod lot;
pub mod transformation;

// Change history
pub mod audit;

pub use audit::{Actor, AuditAction, AuditEntry, EntityKind};
pub use logistics::{DeliveryStatus, Logistics};
pub use lot::CultivationLot;
pub use transformation::{QualityResult, Transformation};
