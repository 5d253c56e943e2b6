use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::dto::{CreateLogisticsRequest, CreateLotRequest, CreateTransformationRequest};
use crate::errors::ServiceError;
use crate::models::{
    Actor, AuditAction, AuditEntry, CultivationLot, EntityKind, Logistics, Transformation,
};
use crate::repositories::TraceabilityStore;
use crate::validation::chain::{check_departure_after_quality_control, check_washing_after_harvest};
use crate::validation::logistics::check_status;
use crate::validation::{
    self, validate_logistics, validate_lot, validate_transformation, ChainReport,
    ValidationResult,
};

/// One row of the traceability overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotTraceSummary {
    pub lot_id: Uuid,
    pub code: String,
    pub product_type: String,
    pub harvest_date: NaiveDate,
    pub responsible: String,
    pub has_transformation: bool,
    pub has_logistics: bool,
    pub complete: bool,
    pub quality_result: Option<String>,
    pub delivery_status: Option<String>,
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TraceabilityStats {
    pub total_lots: usize,
    pub total_transformations: usize,
    pub total_logistics: usize,
    pub complete_chains: usize,
}

/// Validate-then-persist front door over a [`TraceabilityStore`].
///
/// Every operation that needs "today" takes it from the caller so results
/// stay reproducible.
pub struct TraceabilityService<S> {
    store: Arc<S>,
}

impl<S> Clone for TraceabilityService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: TraceabilityStore> TraceabilityService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Parses and validates a lot request without persisting anything.
    pub fn prepare_lot(
        &self,
        request: CreateLotRequest,
        today: NaiveDate,
    ) -> Result<CultivationLot, ServiceError> {
        let lot = request.into_lot(today)?;
        let result = validate_lot(&lot, today);
        if !result.is_valid() {
            return Err(result.into());
        }
        Ok(lot)
    }

    /// Parses a transformation request and validates it against the lot it
    /// names, including the washing-after-harvest chronology.
    pub fn prepare_transformation(
        &self,
        request: CreateTransformationRequest,
    ) -> Result<Transformation, ServiceError> {
        let lot = match request.lot_reference() {
            Some(lot_id) => self.store.find_lot(lot_id)?,
            None => None,
        };
        let transformation = request.into_transformation(lot.as_ref())?;

        let mut result = validate_transformation(&transformation, lot.as_ref());
        if let Some(lot) = &lot {
            result.check(check_washing_after_harvest(lot, transformation.washed_at));
        }
        if !result.is_valid() {
            return Err(result.into());
        }
        Ok(transformation)
    }

    /// Parses a logistics request and validates it against the
    /// transformation it names, including the departure chronology.
    pub fn prepare_logistics(
        &self,
        request: CreateLogisticsRequest,
    ) -> Result<Logistics, ServiceError> {
        let transformation = match request.transformation_reference() {
            Some(transformation_id) => self.store.find_transformation(transformation_id)?,
            None => None,
        };
        let logistics = request.into_logistics(transformation.as_ref())?;

        let mut result = validate_logistics(&logistics, transformation.as_ref());
        if let Some(transformation) = &transformation {
            result.check(check_departure_after_quality_control(
                transformation.quality_checked_at,
                logistics.departed_at,
            ));
        }
        if !result.is_valid() {
            return Err(result.into());
        }
        Ok(logistics)
    }

    #[instrument(skip(self, request, actor), fields(code = %request.code))]
    pub fn register_lot(
        &self,
        request: CreateLotRequest,
        today: NaiveDate,
        actor: &Actor,
    ) -> Result<CultivationLot, ServiceError> {
        let lot = self.prepare_lot(request, today).map_err(log_rejection)?;
        let entry = AuditEntry::new(
            EntityKind::Lot,
            lot.id,
            AuditAction::Create,
            format!("Lot {} registered", lot.code),
        )
        .by(actor);
        let lot = self.store.audited(entry, |store| store.insert_lot(lot))?;

        info!(lot_id = %lot.id, code = %lot.code, "Lot registered");
        Ok(lot)
    }

    #[instrument(skip(self, request, actor), fields(lot_id = %request.lot_id))]
    pub fn register_transformation(
        &self,
        request: CreateTransformationRequest,
        actor: &Actor,
    ) -> Result<Transformation, ServiceError> {
        let transformation = self
            .prepare_transformation(request)
            .map_err(log_rejection)?;
        let entry = AuditEntry::new(
            EntityKind::Transformation,
            transformation.id,
            AuditAction::Create,
            format!("Transformation registered for lot {}", transformation.lot_id),
        )
        .by(actor);
        let transformation = self
            .store
            .audited(entry, |store| store.insert_transformation(transformation))?;

        info!(
            transformation_id = %transformation.id,
            lot_id = %transformation.lot_id,
            "Transformation registered"
        );
        Ok(transformation)
    }

    #[instrument(skip(self, request, actor), fields(guide_number = %request.guide_number))]
    pub fn register_logistics(
        &self,
        request: CreateLogisticsRequest,
        actor: &Actor,
    ) -> Result<Logistics, ServiceError> {
        let logistics = self.prepare_logistics(request).map_err(log_rejection)?;
        let entry = AuditEntry::new(
            EntityKind::Logistics,
            logistics.id,
            AuditAction::Create,
            format!("Logistics registered with guide {}", logistics.guide_number),
        )
        .by(actor);
        let logistics = self
            .store
            .audited(entry, |store| store.insert_logistics(logistics))?;

        info!(
            logistics_id = %logistics.id,
            guide_number = %logistics.guide_number,
            "Logistics registered"
        );
        Ok(logistics)
    }

    /// Changes the delivery status of a logistics record.
    ///
    /// Setting the status it already has is a no-op and leaves no audit entry.
    #[instrument(skip(self, actor), fields(logistics_id = %id, new_status = %status))]
    pub fn update_logistics_status(
        &self,
        id: Uuid,
        status: &str,
        actor: &Actor,
    ) -> Result<Logistics, ServiceError> {
        if let Some(violation) = check_status(status) {
            warn!("Rejected delivery status '{}'", status);
            return Err(ValidationResult::from(vec![violation]).into());
        }

        let mut logistics = self.store.find_logistics(id)?.ok_or_else(|| {
            warn!("Logistics record {} not found", id);
            ServiceError::NotFound(format!("Logistics record {} not found", id))
        })?;

        let new_status = status.trim().to_string();
        if logistics.status == new_status {
            return Ok(logistics);
        }

        let old_status = std::mem::replace(&mut logistics.status, new_status.clone());
        logistics.updated_at = Utc::now();
        let entry = AuditEntry::new(
            EntityKind::Logistics,
            logistics.id,
            AuditAction::Update,
            format!("Delivery status changed to {}", new_status),
        )
        .with_change("status", Some(old_status.clone()), Some(new_status.clone()))
        .by(actor);
        let updated = self
            .store
            .audited(entry, |store| store.update_logistics(logistics))?;

        info!(
            "Logistics {} status updated from '{}' to '{}'",
            updated.id, old_status, new_status
        );
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub fn trace_chain(&self, lot_id: Uuid, today: NaiveDate) -> Result<ChainReport, ServiceError> {
        validation::trace_chain(self.store.as_ref(), lot_id, today)
    }

    #[instrument(skip(self))]
    pub fn trace_chain_by_code(
        &self,
        lot_code: &str,
        today: NaiveDate,
    ) -> Result<ChainReport, ServiceError> {
        validation::trace_chain_by_code(self.store.as_ref(), lot_code, today)
    }

    /// Per-lot chain coverage, newest harvest first.
    pub fn overview(&self) -> Result<Vec<LotTraceSummary>, ServiceError> {
        let lots = self.store.list_lots()?;
        let mut summaries = Vec::with_capacity(lots.len());

        for lot in lots {
            let transformation = self.store.transformation_for_lot(lot.id)?;
            let logistics = match &transformation {
                Some(t) => self.store.logistics_for_transformation(t.id)?,
                None => None,
            };

            summaries.push(LotTraceSummary {
                lot_id: lot.id,
                code: lot.code,
                product_type: lot.product_type,
                harvest_date: lot.harvest_date,
                responsible: lot.responsible,
                has_transformation: transformation.is_some(),
                has_logistics: logistics.is_some(),
                complete: transformation.is_some() && logistics.is_some(),
                quality_result: transformation.map(|t| t.quality_result),
                delivery_status: logistics.map(|l| l.status),
            });
        }

        Ok(summaries)
    }

    pub fn stats(&self) -> Result<TraceabilityStats, ServiceError> {
        let counts = self.store.counts()?;
        let complete_chains = self.overview()?.iter().filter(|s| s.complete).count();

        Ok(TraceabilityStats {
            total_lots: counts.lots,
            total_transformations: counts.transformations,
            total_logistics: counts.logistics,
            complete_chains,
        })
    }

    pub fn audit_trail(&self, kind: EntityKind, id: Uuid) -> Result<Vec<AuditEntry>, ServiceError> {
        self.store.audit_trail(kind, id)
    }
}

fn log_rejection(err: ServiceError) -> ServiceError {
    match err.validation_result() {
        Some(result) => warn!(violations = result.len(), "Candidate rejected: {}", result),
        None => warn!("Candidate could not be checked: {}", err),
    }
    err
}
