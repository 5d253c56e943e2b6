use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use strum::IntoEnumIterator;
use uuid::Uuid;

use super::rules::{
    self, max_transit, GUIDE_NUMBER_MIN_LEN, MAX_TRANSIT_HOURS, TRANSPORT_TEMP_MAX,
    TRANSPORT_TEMP_MIN,
};
use super::{require_text, ValidationResult, Violation, ViolationKind};
use crate::models::{DeliveryStatus, Logistics, Transformation};

/// Logistics values as far as they could be read; see
/// [`super::lot::LotFields`].
#[derive(Debug, Clone, Copy)]
pub struct LogisticsFields<'a> {
    pub transformation_id: Option<Uuid>,
    pub guide_number: &'a str,
    pub vehicle: &'a str,
    pub driver: &'a str,
    pub min_temperature: Option<Decimal>,
    pub max_temperature: Option<Decimal>,
    pub avg_temperature: Option<Decimal>,
    pub departed_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub destination: &'a str,
    pub destination_address: &'a str,
    pub status: &'a str,
}

impl<'a> From<&'a Logistics> for LogisticsFields<'a> {
    fn from(g: &'a Logistics) -> Self {
        Self {
            transformation_id: Some(g.transformation_id),
            guide_number: &g.guide_number,
            vehicle: &g.vehicle,
            driver: &g.driver,
            min_temperature: Some(g.min_temperature),
            max_temperature: Some(g.max_temperature),
            avg_temperature: Some(g.avg_temperature),
            departed_at: Some(g.departed_at),
            delivered_at: Some(g.delivered_at),
            destination: &g.destination,
            destination_address: &g.destination_address,
            status: &g.status,
        }
    }
}

/// Validates a candidate logistics record against the transformation it
/// points to.
pub fn validate_logistics(
    logistics: &Logistics,
    transformation: Option<&Transformation>,
) -> ValidationResult {
    check_logistics_fields(&LogisticsFields::from(logistics), transformation)
}

pub fn check_logistics_fields(
    fields: &LogisticsFields<'_>,
    transformation: Option<&Transformation>,
) -> ValidationResult {
    let mut result = ValidationResult::new();

    if let Some(transformation_id) = fields.transformation_id {
        result.check(check_transformation_reference(transformation_id, transformation));
    }

    result.check(check_guide_number(fields.guide_number));
    result.check(require_text("vehicle", "Vehicle", fields.vehicle));
    result.check(require_text("driver", "Driver", fields.driver));

    let readings = [
        ("min_temperature", "Minimum", fields.min_temperature),
        ("max_temperature", "Maximum", fields.max_temperature),
        ("avg_temperature", "Average", fields.avg_temperature),
    ];
    for (scope, label, reading) in readings {
        result.check(reading.and_then(|t| check_transport_temperature(scope, label, t)));
    }
    if let (Some(min), Some(max)) = (fields.min_temperature, fields.max_temperature) {
        result.check(check_min_not_above_max(min, max));
        if let Some(avg) = fields.avg_temperature {
            result.check(check_average_within(min, max, avg));
        }
    }

    if let (Some(departed_at), Some(delivered_at)) = (fields.departed_at, fields.delivered_at) {
        result.check(check_transit_window(departed_at, delivered_at));
    }

    result.check(require_text("destination", "Destination", fields.destination));
    result.check(require_text(
        "destination_address",
        "Destination address",
        fields.destination_address,
    ));
    result.check(check_status(fields.status));

    result
}

pub fn check_transformation_reference(
    transformation_id: Uuid,
    transformation: Option<&Transformation>,
) -> Option<Violation> {
    match transformation {
        Some(t) if t.id == transformation_id => None,
        Some(t) => Some(Violation::new(
            "transformation_id",
            ViolationKind::DanglingReference,
            format!(
                "Logistics references transformation {} but was checked against transformation {}.",
                transformation_id, t.id
            ),
        )),
        None => Some(Violation::new(
            "transformation_id",
            ViolationKind::DanglingReference,
            format!("Transformation {} does not exist.", transformation_id),
        )),
    }
}

/// At least five characters once surrounding whitespace is dropped, so a
/// blank guide number fails the same way a short one does.
pub fn check_guide_number(guide_number: &str) -> Option<Violation> {
    if guide_number.trim().chars().count() < GUIDE_NUMBER_MIN_LEN {
        return Some(Violation::new(
            "guide_number",
            ViolationKind::InvalidFormat,
            format!(
                "Guide number '{}' must be at least {} characters long.",
                guide_number, GUIDE_NUMBER_MIN_LEN
            ),
        ));
    }
    None
}

pub fn check_transport_temperature(
    scope: &str,
    label: &str,
    temperature: Decimal,
) -> Option<Violation> {
    if rules::in_band(temperature, TRANSPORT_TEMP_MIN, TRANSPORT_TEMP_MAX) {
        None
    } else {
        Some(Violation::new(
            scope,
            ViolationKind::OutOfRange,
            format!(
                "{} transport temperature ({}°C) must stay between {}°C and {}°C; the product may have deteriorated.",
                label, temperature, TRANSPORT_TEMP_MIN, TRANSPORT_TEMP_MAX
            ),
        ))
    }
}

/// Readings must describe a real range: min ≤ max and min ≤ avg ≤ max.
pub fn check_temperature_consistency(
    min: Decimal,
    max: Decimal,
    avg: Decimal,
) -> Vec<Violation> {
    [
        check_min_not_above_max(min, max),
        check_average_within(min, max, avg),
    ]
    .into_iter()
    .flatten()
    .collect()
}

pub fn check_min_not_above_max(min: Decimal, max: Decimal) -> Option<Violation> {
    (min > max).then(|| {
        Violation::new(
            "temperature_range",
            ViolationKind::InconsistentRange,
            format!(
                "Minimum temperature ({}°C) cannot exceed the maximum ({}°C).",
                min, max
            ),
        )
    })
}

pub fn check_average_within(min: Decimal, max: Decimal, avg: Decimal) -> Option<Violation> {
    (avg < min || avg > max).then(|| {
        Violation::new(
            "avg_temperature",
            ViolationKind::InconsistentRange,
            format!(
                "Average temperature ({}°C) must lie between the minimum ({}°C) and the maximum ({}°C).",
                avg, min, max
            ),
        )
    })
}

/// Delivery comes strictly after departure, at most 72 hours later
/// (exactly 72:00:00 is accepted).
pub fn check_transit_window(
    departed_at: DateTime<Utc>,
    delivered_at: DateTime<Utc>,
) -> Option<Violation> {
    if delivered_at <= departed_at {
        return Some(Violation::new(
            "delivered_at",
            ViolationKind::OutOfOrder,
            "Delivery must happen after departure.",
        ));
    }
    let transit = delivered_at - departed_at;
    if transit > max_transit() {
        return Some(Violation::new(
            "delivered_at",
            ViolationKind::DurationExceeded,
            format!(
                "Transit time of {}h {}m exceeds the {} hour limit.",
                transit.num_hours(),
                transit.num_minutes() % 60,
                MAX_TRANSIT_HOURS
            ),
        ));
    }
    None
}

pub fn check_status(code: &str) -> Option<Violation> {
    if code.trim().is_empty() {
        return Some(Violation::new(
            "status",
            ViolationKind::MissingField,
            "Delivery status is required.",
        ));
    }
    if DeliveryStatus::from_str(code.trim()).is_ok() {
        return None;
    }
    let allowed: Vec<String> = DeliveryStatus::iter().map(|s| s.to_string()).collect();
    Some(Violation::new(
        "status",
        ViolationKind::InvalidEnum,
        format!("Status '{}' must be one of: {}.", code, allowed.join(", ")),
    ))
}

/// Applied during request parsing, alongside the other optional attributes.
pub fn check_distance(distance_km: Option<Decimal>) -> Option<Violation> {
    match distance_km {
        Some(distance) if distance < Decimal::ZERO => Some(Violation::new(
            "distance_km",
            ViolationKind::OutOfRange,
            format!("Distance ({} km) cannot be negative.", distance),
        )),
        _ => None,
    }
}
