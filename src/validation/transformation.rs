use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use strum::IntoEnumIterator;
use uuid::Uuid;

use super::rules::{self, UNITS_MAX, UNITS_MIN, WASHING_TEMP_MAX, WASHING_TEMP_MIN};
use super::{require_text, ValidationResult, Violation, ViolationKind};
use crate::models::{CultivationLot, QualityResult, Transformation};

/// Transformation values as far as they could be read; see
/// [`super::lot::LotFields`].
#[derive(Debug, Clone, Copy)]
pub struct TransformationFields<'a> {
    pub lot_id: Option<Uuid>,
    pub washed_at: Option<DateTime<Utc>>,
    pub washing_temperature: Option<Decimal>,
    pub washing_responsible: &'a str,
    pub packaged_at: Option<DateTime<Utc>>,
    pub package_type: &'a str,
    pub unit_count: Option<i64>,
    pub packaging_responsible: &'a str,
    pub quality_checked_at: Option<DateTime<Utc>>,
    pub quality_result: &'a str,
    pub quality_responsible: &'a str,
}

impl<'a> From<&'a Transformation> for TransformationFields<'a> {
    fn from(t: &'a Transformation) -> Self {
        Self {
            lot_id: Some(t.lot_id),
            washed_at: Some(t.washed_at),
            washing_temperature: Some(t.washing_temperature),
            washing_responsible: &t.washing_responsible,
            packaged_at: Some(t.packaged_at),
            package_type: &t.package_type,
            unit_count: Some(t.unit_count),
            packaging_responsible: &t.packaging_responsible,
            quality_checked_at: Some(t.quality_checked_at),
            quality_result: &t.quality_result,
            quality_responsible: &t.quality_responsible,
        }
    }
}

/// Validates a candidate transformation against the lot it points to.
///
/// `lot` is whatever the storage lookup for `transformation.lot_id` returned.
pub fn validate_transformation(
    transformation: &Transformation,
    lot: Option<&CultivationLot>,
) -> ValidationResult {
    check_transformation_fields(&TransformationFields::from(transformation), lot)
}

pub fn check_transformation_fields(
    fields: &TransformationFields<'_>,
    lot: Option<&CultivationLot>,
) -> ValidationResult {
    let mut result = ValidationResult::new();

    if let Some(lot_id) = fields.lot_id {
        result.check(check_lot_reference(lot_id, lot));
    }

    // Field checks
    result.check(fields.washing_temperature.and_then(check_washing_temperature));
    result.check(require_text(
        "washing_responsible",
        "Washing responsible party",
        fields.washing_responsible,
    ));
    result.check(require_text("package_type", "Package type", fields.package_type));
    result.check(fields.unit_count.and_then(check_unit_count));
    result.check(require_text(
        "packaging_responsible",
        "Packaging responsible party",
        fields.packaging_responsible,
    ));
    result.check(check_quality_result(fields.quality_result));
    result.check(require_text(
        "quality_responsible",
        "Quality-control responsible party",
        fields.quality_responsible,
    ));

    // Cross-field checks
    if let (Some(washed_at), Some(packaged_at)) = (fields.washed_at, fields.packaged_at) {
        result.check(check_packaging_after_washing(washed_at, packaged_at));
    }
    if let (Some(packaged_at), Some(checked_at)) = (fields.packaged_at, fields.quality_checked_at)
    {
        result.check(check_quality_after_packaging(packaged_at, checked_at));
    }

    result
}

pub fn check_lot_reference(lot_id: Uuid, lot: Option<&CultivationLot>) -> Option<Violation> {
    match lot {
        Some(lot) if lot.id == lot_id => None,
        Some(lot) => Some(Violation::new(
            "lot_id",
            ViolationKind::DanglingReference,
            format!(
                "Transformation references lot {} but was checked against lot {}.",
                lot_id, lot.code
            ),
        )),
        None => Some(Violation::new(
            "lot_id",
            ViolationKind::DanglingReference,
            format!("Lot {} does not exist.", lot_id),
        )),
    }
}

pub fn check_washing_temperature(temperature: Decimal) -> Option<Violation> {
    if rules::in_band(temperature, WASHING_TEMP_MIN, WASHING_TEMP_MAX) {
        return None;
    }
    let bound = if temperature < WASHING_TEMP_MIN {
        format!("below the minimum of {}°C", WASHING_TEMP_MIN)
    } else {
        format!("above the maximum of {}°C", WASHING_TEMP_MAX)
    };
    Some(Violation::new(
        "washing_temperature",
        ViolationKind::OutOfRange,
        format!("Washing temperature ({}°C) is {}.", temperature, bound),
    ))
}

pub fn check_unit_count(units: i64) -> Option<Violation> {
    if (UNITS_MIN..=UNITS_MAX).contains(&units) {
        None
    } else {
        Some(Violation::new(
            "unit_count",
            ViolationKind::OutOfRange,
            format!(
                "Unit count ({}) must be between {} and {}.",
                units, UNITS_MIN, UNITS_MAX
            ),
        ))
    }
}

pub fn check_quality_result(code: &str) -> Option<Violation> {
    if code.trim().is_empty() {
        return Some(Violation::new(
            "quality_result",
            ViolationKind::MissingField,
            "Quality-control result is required.",
        ));
    }
    if QualityResult::from_str(code.trim()).is_ok() {
        return None;
    }
    let allowed: Vec<String> = QualityResult::iter().map(|r| r.to_string()).collect();
    Some(Violation::new(
        "quality_result",
        ViolationKind::InvalidEnum,
        format!(
            "Quality-control result '{}' must be one of: {}.",
            code,
            allowed.join(", ")
        ),
    ))
}

/// Washing, packaging and quality control happen strictly in that order.
/// Each broken step is reported on the later of its two timestamps.
pub fn check_process_sequence(
    washed_at: DateTime<Utc>,
    packaged_at: DateTime<Utc>,
    quality_checked_at: DateTime<Utc>,
) -> Vec<Violation> {
    [
        check_packaging_after_washing(washed_at, packaged_at),
        check_quality_after_packaging(packaged_at, quality_checked_at),
    ]
    .into_iter()
    .flatten()
    .collect()
}

pub fn check_packaging_after_washing(
    washed_at: DateTime<Utc>,
    packaged_at: DateTime<Utc>,
) -> Option<Violation> {
    (packaged_at <= washed_at).then(|| {
        Violation::new(
            "packaged_at",
            ViolationKind::OutOfOrder,
            "Packaging must happen after washing.",
        )
    })
}

pub fn check_quality_after_packaging(
    packaged_at: DateTime<Utc>,
    quality_checked_at: DateTime<Utc>,
) -> Option<Violation> {
    (quality_checked_at <= packaged_at).then(|| {
        Violation::new(
            "quality_checked_at",
            ViolationKind::OutOfOrder,
            "Quality control must happen after packaging.",
        )
    })
}
