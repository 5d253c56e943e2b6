pub mod traceability;

pub use traceability::{LotTraceSummary, TraceabilityService, TraceabilityStats};
