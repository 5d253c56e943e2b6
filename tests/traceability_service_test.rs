mod common;

use std::sync::Arc;

use agritrace::{
    dto::{CreateLogisticsRequest, CreateLotRequest, CreateTransformationRequest},
    models::{Actor, AuditAction, EntityKind},
    Dataset, ServiceError, TraceabilityService, ViolationKind,
};
use assert_matches::assert_matches;
use common::*;
use serde_json::json;

fn lot_request(code: &str) -> CreateLotRequest {
    serde_json::from_value(json!({
        "code": code,
        "product_type": "Mango Ataulfo",
        "location": "Finca San José, Valle Central",
        "latitude": "9.93",
        "longitude": "-84.08",
        "area_hectares": "5.50",
        "harvest_date": "2024-01-15",
        "responsible": "Juan Pérez",
        "is_organic": true,
        "certifications": "Rainforest Alliance"
    }))
    .unwrap()
}

fn transformation_request(lot_id: &str) -> CreateTransformationRequest {
    serde_json::from_value(json!({
        "lot_id": lot_id,
        "washed_at": "2024-01-16T08:00",
        "washing_temperature": 25,
        "washing_responsible": "Carlos Ramírez",
        "packaged_at": "2024-01-16T14:00",
        "package_type": "Caja de cartón",
        "unit_count": 1000,
        "packaging_responsible": "María González",
        "quality_checked_at": "2024-01-16T16:00",
        "quality_result": "APPROVED",
        "quality_responsible": "Ana Martínez"
    }))
    .unwrap()
}

fn logistics_request(transformation_id: &str, guide: &str) -> CreateLogisticsRequest {
    serde_json::from_value(json!({
        "transformation_id": transformation_id,
        "guide_number": guide,
        "vehicle": "ABC-123",
        "driver": "Roberto Sánchez",
        "min_temperature": 3,
        "max_temperature": 6,
        "avg_temperature": 4.5,
        "departed_at": "2024-01-17T06:00",
        "delivered_at": "2024-01-17T12:00",
        "destination": "Supermercado Central",
        "destination_address": "Avenida Central, San José"
    }))
    .unwrap()
}

#[test]
fn scenario_a_through_the_service() {
    let service = service();
    let actor = Actor::user("inspector").with_client_address(Some("203.0.113.7, 10.0.0.1"), None);

    let lot = service
        .register_lot(lot_request("LOTE-2024-001"), today(), &actor)
        .unwrap();
    assert!(lot.is_organic);

    let transformation = service
        .register_transformation(transformation_request(&lot.id.to_string()), &actor)
        .unwrap();
    let logistics = service
        .register_logistics(
            logistics_request(&transformation.id.to_string(), "GUI-2024-001"),
            &actor,
        )
        .unwrap();
    assert_eq!(logistics.status, "IN_TRANSIT");

    let report = service.trace_chain(lot.id, today()).unwrap();
    assert!(report.consistent);
    assert!(report.complete);
    assert_eq!(report.entries().count(), 0);

    let trail = service
        .audit_trail(EntityKind::Transformation, transformation.id)
        .unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].action, AuditAction::Create);
    assert_eq!(trail[0].ip_address.as_deref(), Some("203.0.113.7"));
}

#[test]
fn unparseable_input_is_reported_not_raised() {
    let service = service();
    let mut request = transformation_request("not-a-uuid");
    request.washing_temperature = "warm".into();
    request.unit_count = String::new();

    let err = service
        .register_transformation(request, &Actor::system())
        .unwrap_err();
    let result = err.validation_result().unwrap();
    assert_eq!(result.len(), 3);
    assert_eq!(result.count_kind(ViolationKind::InvalidFormat), 2);
    assert_eq!(result.count_kind(ViolationKind::MissingField), 1);
}

#[test]
fn parse_failures_and_rule_failures_are_reported_together() {
    let service = service();
    let actor = Actor::system();
    let lot = service
        .register_lot(lot_request("LOTE-2024-001"), today(), &actor)
        .unwrap();
    let transformation = service
        .register_transformation(transformation_request(&lot.id.to_string()), &actor)
        .unwrap();

    let mut request = logistics_request(&transformation.id.to_string(), "     ");
    request.delivered_at = "soon".into();
    request.departed_at = "2024-01-16T15:00".into();
    request.max_temperature = "9".into();
    request.avg_temperature = "2.5".into();
    request.status = Some("LOST".into());

    let err = service.register_logistics(request, &actor).unwrap_err();
    let result = err.validation_result().unwrap();
    let found: Vec<(&str, ViolationKind)> = result
        .violations()
        .iter()
        .map(|v| (v.scope.as_str(), v.kind))
        .collect();
    assert_eq!(
        found,
        vec![
            ("delivered_at", ViolationKind::InvalidFormat),
            ("guide_number", ViolationKind::InvalidFormat),
            ("max_temperature", ViolationKind::OutOfRange),
            ("avg_temperature", ViolationKind::InconsistentRange),
            ("status", ViolationKind::InvalidEnum),
            ("departed_at", ViolationKind::OutOfOrder),
        ]
    );
    assert_eq!(service.stats().unwrap().total_logistics, 0);
}

#[test]
fn logistics_departing_before_quality_control_is_rejected() {
    let service = service();
    let actor = Actor::system();
    let lot = service
        .register_lot(lot_request("LOTE-2024-001"), today(), &actor)
        .unwrap();
    let transformation = service
        .register_transformation(transformation_request(&lot.id.to_string()), &actor)
        .unwrap();

    let mut request = logistics_request(&transformation.id.to_string(), "GUI-2024-001");
    request.departed_at = "2024-01-16T15:00".into();

    let err = service.register_logistics(request, &actor).unwrap_err();
    let result = err.validation_result().unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.violations()[0].scope, "departed_at");
    assert_eq!(result.violations()[0].kind, ViolationKind::OutOfOrder);
    assert_eq!(service.stats().unwrap().total_logistics, 0);
}

#[test]
fn storage_uniqueness_surfaces_as_conflict() {
    let service = service();
    let actor = Actor::system();

    let first = service
        .register_lot(lot_request("LOTE-2024-001"), today(), &actor)
        .unwrap();
    let second = service
        .register_lot(lot_request("LOTE-2024-002"), today(), &actor)
        .unwrap();

    let t1 = service
        .register_transformation(transformation_request(&first.id.to_string()), &actor)
        .unwrap();
    assert_matches!(
        service.register_transformation(transformation_request(&first.id.to_string()), &actor),
        Err(ServiceError::Conflict(_))
    );
    let t2 = service
        .register_transformation(transformation_request(&second.id.to_string()), &actor)
        .unwrap();

    service
        .register_logistics(logistics_request(&t1.id.to_string(), "GUI-2024-001"), &actor)
        .unwrap();
    assert_matches!(
        service.register_logistics(logistics_request(&t2.id.to_string(), "GUI-2024-001"), &actor),
        Err(ServiceError::Conflict(_))
    );
}

#[test]
fn dataset_round_trip_keeps_chains_traceable() {
    let service = service();
    let actor = Actor::system();
    let lot = service
        .register_lot(lot_request("LOTE-2024-001"), today(), &actor)
        .unwrap();
    service
        .register_transformation(transformation_request(&lot.id.to_string()), &actor)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("traceability.json");
    Dataset::from_store(service.store()).unwrap().save(&path).unwrap();

    let reloaded = TraceabilityService::new(Arc::new(
        Dataset::load(&path).unwrap().into_store().unwrap(),
    ));
    let report = reloaded
        .trace_chain_by_code("LOTE-2024-001", today())
        .unwrap();
    assert_eq!(report.lot_id, lot.id);
    assert!(report.consistent);
    assert!(!report.complete);
    assert_eq!(report.incomplete_entries(), 1);

    let trail = reloaded.audit_trail(EntityKind::Lot, lot.id).unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].action, AuditAction::Create);

    let stats = reloaded.stats().unwrap();
    assert_eq!(stats.total_lots, 1);
    assert_eq!(stats.total_transformations, 1);
    assert_eq!(stats.complete_chains, 0);
}
