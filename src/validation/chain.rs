//! End-to-end validation of a lot, its transformation and its logistics.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::{
    validate_logistics, validate_lot, validate_transformation, ValidationResult, Violation,
    ViolationKind,
};
use crate::errors::ServiceError;
use crate::models::{CultivationLot, EntityKind, Logistics, Transformation};
use crate::repositories::TraceabilityReader;

/// Validation outcome for one stage of the chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: EntityKind,
    /// `None` when the stage has not been recorded yet
    pub record_id: Option<Uuid>,
    pub result: ValidationResult,
}

impl StageReport {
    pub fn is_present(&self) -> bool {
        self.record_id.is_some()
    }
}

/// Aggregated report for a whole traceability chain.
///
/// Stages always appear in the order lot, transformation, logistics.
/// `consistent` is true when every recorded stage passes and every link
/// resolves; `complete` is true when all three stages are recorded. A chain
/// can be consistent and incomplete at the same time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainReport {
    pub lot_id: Uuid,
    pub lot_code: String,
    pub consistent: bool,
    pub complete: bool,
    pub stages: Vec<StageReport>,
}

impl ChainReport {
    pub fn stage(&self, stage: EntityKind) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Every entry in stage order, informational ones included.
    pub fn entries(&self) -> impl Iterator<Item = (EntityKind, &Violation)> {
        self.stages
            .iter()
            .flat_map(|s| s.result.violations().iter().map(move |v| (s.stage, v)))
    }

    pub fn hard_violations(&self) -> impl Iterator<Item = (EntityKind, &Violation)> {
        self.entries().filter(|(_, v)| v.is_error())
    }

    pub fn hard_violation_count(&self) -> usize {
        self.hard_violations().count()
    }

    pub fn incomplete_entries(&self) -> usize {
        self.entries()
            .filter(|(_, v)| v.kind == ViolationKind::IncompleteChain)
            .count()
    }
}

/// Resolves the chain rooted at `lot_id` through `reader` and validates it.
///
/// Fails only when the lot itself cannot be found or the store errors; rule
/// problems are reported inside the returned [`ChainReport`].
pub fn trace_chain<R>(reader: &R, lot_id: Uuid, today: NaiveDate) -> Result<ChainReport, ServiceError>
where
    R: TraceabilityReader + ?Sized,
{
    let lot = reader
        .find_lot(lot_id)?
        .ok_or_else(|| ServiceError::NotFound(format!("Lot {} not found", lot_id)))?;
    resolve_and_assemble(reader, lot, today)
}

/// Same as [`trace_chain`], addressing the lot by its business code.
pub fn trace_chain_by_code<R>(
    reader: &R,
    lot_code: &str,
    today: NaiveDate,
) -> Result<ChainReport, ServiceError>
where
    R: TraceabilityReader + ?Sized,
{
    let lot = reader
        .find_lot_by_code(lot_code)?
        .ok_or_else(|| ServiceError::NotFound(format!("Lot {} not found", lot_code)))?;
    resolve_and_assemble(reader, lot, today)
}

fn resolve_and_assemble<R>(
    reader: &R,
    lot: CultivationLot,
    today: NaiveDate,
) -> Result<ChainReport, ServiceError>
where
    R: TraceabilityReader + ?Sized,
{
    let transformation = reader.transformation_for_lot(lot.id)?;
    let logistics = match &transformation {
        Some(t) => reader.logistics_for_transformation(t.id)?,
        None => None,
    };

    let report = assemble_chain(&lot, transformation.as_ref(), logistics.as_ref(), today);
    debug!(
        lot_code = %report.lot_code,
        consistent = report.consistent,
        complete = report.complete,
        hard_violations = report.hard_violation_count(),
        "Traceability chain assembled"
    );
    Ok(report)
}

/// Validates already-resolved chain records. Pure: no lookups, no clock.
pub fn assemble_chain(
    lot: &CultivationLot,
    transformation: Option<&Transformation>,
    logistics: Option<&Logistics>,
    today: NaiveDate,
) -> ChainReport {
    let lot_stage = StageReport {
        stage: EntityKind::Lot,
        record_id: Some(lot.id),
        result: validate_lot(lot, today),
    };

    let transformation_stage = match transformation {
        Some(t) => {
            let mut result = validate_transformation(t, Some(lot));
            result.check(check_washing_after_harvest(lot, t.washed_at));
            StageReport {
                stage: EntityKind::Transformation,
                record_id: Some(t.id),
                result,
            }
        }
        None => StageReport {
            stage: EntityKind::Transformation,
            record_id: None,
            result: vec![Violation::new(
                "transformation",
                ViolationKind::IncompleteChain,
                format!("No transformation has been recorded for lot {}.", lot.code),
            )]
            .into(),
        },
    };

    let logistics_stage = match logistics {
        Some(g) => {
            let mut result = validate_logistics(g, transformation);
            if let Some(t) = transformation {
                result.check(check_departure_after_quality_control(
                    t.quality_checked_at,
                    g.departed_at,
                ));
            }
            StageReport {
                stage: EntityKind::Logistics,
                record_id: Some(g.id),
                result,
            }
        }
        None => StageReport {
            stage: EntityKind::Logistics,
            record_id: None,
            result: vec![Violation::new(
                "logistics",
                ViolationKind::IncompleteChain,
                format!("No logistics record has been registered for lot {}.", lot.code),
            )]
            .into(),
        },
    };

    let stages = vec![lot_stage, transformation_stage, logistics_stage];
    let consistent = stages.iter().all(|s| s.result.is_valid());
    let complete = stages.iter().all(StageReport::is_present);

    ChainReport {
        lot_id: lot.id,
        lot_code: lot.code.clone(),
        consistent,
        complete,
        stages,
    }
}

/// Washing cannot take place on a day before the harvest.
pub fn check_washing_after_harvest(
    lot: &CultivationLot,
    washed_at: DateTime<Utc>,
) -> Option<Violation> {
    if washed_at.date_naive() < lot.harvest_date {
        Some(Violation::new(
            "washed_at",
            ViolationKind::OutOfOrder,
            format!(
                "Washing ({}) cannot happen before the harvest ({}).",
                washed_at.date_naive(),
                lot.harvest_date
            ),
        ))
    } else {
        None
    }
}

/// Transport cannot start before quality control has finished.
pub fn check_departure_after_quality_control(
    quality_checked_at: DateTime<Utc>,
    departed_at: DateTime<Utc>,
) -> Option<Violation> {
    if departed_at < quality_checked_at {
        Some(Violation::new(
            "departed_at",
            ViolationKind::OutOfOrder,
            "Transport cannot depart before quality control.",
        ))
    } else {
        None
    }
}
