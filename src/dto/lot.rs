use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{lenient, lenient_opt, non_blank, FieldParser};
use crate::models::CultivationLot;
use crate::validation::lot::{check_latitude, check_longitude, check_lot_fields, LotFields};
use crate::validation::ValidationResult;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateLotRequest {
    #[serde(default, deserialize_with = "lenient")]
    #[validate(length(max = 50, message = "Lot code cannot exceed 50 characters."))]
    pub code: String,

    #[serde(default, deserialize_with = "lenient")]
    #[validate(length(max = 100, message = "Product type cannot exceed 100 characters."))]
    pub product_type: String,

    #[serde(default, deserialize_with = "lenient")]
    #[validate(length(max = 200, message = "Location cannot exceed 200 characters."))]
    pub location: String,

    #[serde(default, deserialize_with = "lenient_opt")]
    pub latitude: Option<String>,

    #[serde(default, deserialize_with = "lenient_opt")]
    pub longitude: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub area_hectares: String,

    #[serde(default, deserialize_with = "lenient")]
    pub harvest_date: String,

    #[serde(default, deserialize_with = "lenient")]
    #[validate(length(max = 100, message = "Responsible party cannot exceed 100 characters."))]
    pub responsible: String,

    #[serde(default)]
    pub is_organic: bool,

    #[serde(default, deserialize_with = "lenient_opt")]
    pub certifications: Option<String>,
}

impl CreateLotRequest {
    /// Reads the request into a candidate lot with a fresh id.
    ///
    /// Text fields are trimmed but otherwise kept as submitted; whether they
    /// satisfy the lot rules is for [`crate::validation::validate_lot`].
    /// `today` is only used to judge the rules that can still run when some
    /// value cannot be read.
    pub fn into_lot(self, today: NaiveDate) -> Result<CultivationLot, ValidationResult> {
        let mut parser = FieldParser::new();

        let area = parser.decimal("area_hectares", "Area", &self.area_hectares);
        let harvest_date = parser.date("harvest_date", "Harvest date", &self.harvest_date);
        let latitude = parser.optional_decimal("latitude", "Latitude", self.latitude.as_deref());
        let longitude =
            parser.optional_decimal("longitude", "Longitude", self.longitude.as_deref());
        parser.check(check_latitude(latitude));
        parser.check(check_longitude(longitude));
        parser.length_limits(&self);

        let (area_hectares, harvest_date) = match (area, harvest_date) {
            (Some(area), Some(date)) if parser.is_clean() => (area, date),
            _ => {
                let fields = LotFields {
                    code: self.code.trim(),
                    product_type: &self.product_type,
                    location: &self.location,
                    area_hectares: area,
                    harvest_date,
                    responsible: &self.responsible,
                };
                return Err(parser.reject(check_lot_fields(&fields, today)));
            }
        };

        let now = Utc::now();
        Ok(CultivationLot {
            id: Uuid::new_v4(),
            code: self.code.trim().to_string(),
            product_type: self.product_type.trim().to_string(),
            location: self.location.trim().to_string(),
            latitude,
            longitude,
            area_hectares,
            harvest_date,
            responsible: self.responsible.trim().to_string(),
            is_organic: self.is_organic,
            certifications: non_blank(self.certifications).map(|c| c.trim().to_string()),
            created_at: now,
            updated_at: now,
        })
    }
}
