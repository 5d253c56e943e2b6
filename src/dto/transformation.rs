use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{lenient, lenient_opt, non_blank, FieldParser};
use crate::models::{CultivationLot, Transformation};
use crate::validation::chain::check_washing_after_harvest;
use crate::validation::transformation::{check_transformation_fields, TransformationFields};
use crate::validation::ValidationResult;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateTransformationRequest {
    #[serde(default, deserialize_with = "lenient")]
    pub lot_id: String,

    #[serde(default, deserialize_with = "lenient")]
    pub washed_at: String,

    #[serde(default, deserialize_with = "lenient")]
    pub washing_temperature: String,

    #[serde(default, deserialize_with = "lenient")]
    #[validate(length(max = 100, message = "Washing responsible party cannot exceed 100 characters."))]
    pub washing_responsible: String,

    #[serde(default, deserialize_with = "lenient")]
    pub packaged_at: String,

    #[serde(default, deserialize_with = "lenient")]
    #[validate(length(max = 100, message = "Package type cannot exceed 100 characters."))]
    pub package_type: String,

    #[serde(default, deserialize_with = "lenient")]
    pub unit_count: String,

    #[serde(default, deserialize_with = "lenient")]
    #[validate(length(max = 100, message = "Packaging responsible party cannot exceed 100 characters."))]
    pub packaging_responsible: String,

    #[serde(default, deserialize_with = "lenient")]
    pub quality_checked_at: String,

    /// Kept as text; an unknown code is an `InvalidEnum` rule violation
    #[serde(default, deserialize_with = "lenient")]
    pub quality_result: String,

    #[serde(default, deserialize_with = "lenient_opt")]
    pub quality_observations: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    #[validate(length(max = 100, message = "Quality-control responsible party cannot exceed 100 characters."))]
    pub quality_responsible: String,
}

impl CreateTransformationRequest {
    /// The lot this request names, if the reference can be read.
    pub fn lot_reference(&self) -> Option<Uuid> {
        Uuid::parse_str(self.lot_id.trim()).ok()
    }

    /// Reads the request into a candidate transformation with a fresh id.
    ///
    /// `lot` is the record [`Self::lot_reference`] resolves to. It is only
    /// consulted when some value cannot be read, to judge the rules that
    /// still can be.
    pub fn into_transformation(
        self,
        lot: Option<&CultivationLot>,
    ) -> Result<Transformation, ValidationResult> {
        let mut parser = FieldParser::new();

        let lot_id = parser.reference("lot_id", "Lot", &self.lot_id);
        let washed_at = parser.timestamp("washed_at", "Washing date", &self.washed_at);
        let washing_temperature = parser.decimal(
            "washing_temperature",
            "Washing temperature",
            &self.washing_temperature,
        );
        let packaged_at = parser.timestamp("packaged_at", "Packaging date", &self.packaged_at);
        let unit_count = parser.integer("unit_count", "Unit count", &self.unit_count);
        let quality_checked_at = parser.timestamp(
            "quality_checked_at",
            "Quality-control date",
            &self.quality_checked_at,
        );
        parser.length_limits(&self);

        let fields = TransformationFields {
            lot_id,
            washed_at,
            washing_temperature,
            washing_responsible: &self.washing_responsible,
            packaged_at,
            package_type: &self.package_type,
            unit_count,
            packaging_responsible: &self.packaging_responsible,
            quality_checked_at,
            quality_result: self.quality_result.trim(),
            quality_responsible: &self.quality_responsible,
        };
        let parsed = (
            lot_id,
            washed_at,
            washing_temperature,
            packaged_at,
            unit_count,
            quality_checked_at,
        );
        let (lot_id, washed_at, washing_temperature, packaged_at, unit_count, quality_checked_at) =
            match parsed {
                (Some(a), Some(b), Some(c), Some(d), Some(e), Some(f)) if parser.is_clean() => {
                    (a, b, c, d, e, f)
                }
                _ => {
                    let mut rules = check_transformation_fields(&fields, lot);
                    if let (Some(lot), Some(washed_at)) = (lot, washed_at) {
                        rules.check(check_washing_after_harvest(lot, washed_at));
                    }
                    return Err(parser.reject(rules));
                }
            };

        let now = Utc::now();
        Ok(Transformation {
            id: Uuid::new_v4(),
            lot_id,
            washed_at,
            washing_temperature,
            washing_responsible: self.washing_responsible.trim().to_string(),
            packaged_at,
            package_type: self.package_type.trim().to_string(),
            unit_count,
            packaging_responsible: self.packaging_responsible.trim().to_string(),
            quality_checked_at,
            quality_result: self.quality_result.trim().to_string(),
            quality_observations: non_blank(self.quality_observations),
            quality_responsible: self.quality_responsible.trim().to_string(),
            created_at: now,
            updated_at: now,
        })
    }
}
