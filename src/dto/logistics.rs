use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{lenient, lenient_opt, non_blank, FieldParser};
use crate::models::{DeliveryStatus, Logistics, Transformation};
use crate::validation::chain::check_departure_after_quality_control;
use crate::validation::logistics::{check_distance, check_logistics_fields, LogisticsFields};
use crate::validation::ValidationResult;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateLogisticsRequest {
    #[serde(default, deserialize_with = "lenient")]
    pub transformation_id: String,

    #[serde(default, deserialize_with = "lenient")]
    #[validate(length(max = 50, message = "Guide number cannot exceed 50 characters."))]
    pub guide_number: String,

    #[serde(default, deserialize_with = "lenient")]
    #[validate(length(max = 100, message = "Vehicle cannot exceed 100 characters."))]
    pub vehicle: String,

    #[serde(default, deserialize_with = "lenient")]
    #[validate(length(max = 100, message = "Driver cannot exceed 100 characters."))]
    pub driver: String,

    #[serde(default, deserialize_with = "lenient")]
    pub min_temperature: String,

    #[serde(default, deserialize_with = "lenient")]
    pub max_temperature: String,

    #[serde(default, deserialize_with = "lenient")]
    pub avg_temperature: String,

    #[serde(default, deserialize_with = "lenient")]
    pub departed_at: String,

    #[serde(default, deserialize_with = "lenient")]
    pub delivered_at: String,

    #[serde(default, deserialize_with = "lenient")]
    #[validate(length(max = 200, message = "Destination cannot exceed 200 characters."))]
    pub destination: String,

    #[serde(default, deserialize_with = "lenient")]
    pub destination_address: String,

    /// Defaults to `IN_TRANSIT` when omitted
    #[serde(default, deserialize_with = "lenient_opt")]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "lenient_opt")]
    pub distance_km: Option<String>,

    #[serde(default, deserialize_with = "lenient_opt")]
    pub transport_notes: Option<String>,
}

impl CreateLogisticsRequest {
    /// The transformation this request names, if the reference can be read.
    pub fn transformation_reference(&self) -> Option<Uuid> {
        Uuid::parse_str(self.transformation_id.trim()).ok()
    }

    /// Reads the request into a candidate logistics record with a fresh id.
    ///
    /// `transformation` is the record [`Self::transformation_reference`]
    /// resolves to; like the lot in
    /// [`super::CreateTransformationRequest::into_transformation`] it only
    /// matters when some value cannot be read.
    pub fn into_logistics(
        self,
        transformation: Option<&Transformation>,
    ) -> Result<Logistics, ValidationResult> {
        let mut parser = FieldParser::new();

        let transformation_id =
            parser.reference("transformation_id", "Transformation", &self.transformation_id);
        let min_temperature =
            parser.decimal("min_temperature", "Minimum temperature", &self.min_temperature);
        let max_temperature =
            parser.decimal("max_temperature", "Maximum temperature", &self.max_temperature);
        let avg_temperature =
            parser.decimal("avg_temperature", "Average temperature", &self.avg_temperature);
        let departed_at = parser.timestamp("departed_at", "Departure", &self.departed_at);
        let delivered_at = parser.timestamp("delivered_at", "Delivery", &self.delivered_at);
        let distance_km =
            parser.optional_decimal("distance_km", "Distance", self.distance_km.as_deref());
        parser.check(check_distance(distance_km));
        parser.length_limits(&self);

        let status = self
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| DeliveryStatus::default().to_string());

        let fields = LogisticsFields {
            transformation_id,
            guide_number: self.guide_number.trim(),
            vehicle: &self.vehicle,
            driver: &self.driver,
            min_temperature,
            max_temperature,
            avg_temperature,
            departed_at,
            delivered_at,
            destination: &self.destination,
            destination_address: &self.destination_address,
            status: &status,
        };
        let parsed = (
            transformation_id,
            min_temperature,
            max_temperature,
            avg_temperature,
            departed_at,
            delivered_at,
        );
        let (transformation_id, min_temperature, max_temperature, avg_temperature, departed_at, delivered_at) =
            match parsed {
                (Some(a), Some(b), Some(c), Some(d), Some(e), Some(f)) if parser.is_clean() => {
                    (a, b, c, d, e, f)
                }
                _ => {
                    let mut rules = check_logistics_fields(&fields, transformation);
                    if let (Some(t), Some(departed_at)) = (transformation, departed_at) {
                        rules.check(check_departure_after_quality_control(
                            t.quality_checked_at,
                            departed_at,
                        ));
                    }
                    return Err(parser.reject(rules));
                }
            };

        let now = Utc::now();
        Ok(Logistics {
            id: Uuid::new_v4(),
            transformation_id,
            guide_number: self.guide_number.trim().to_string(),
            vehicle: self.vehicle.trim().to_string(),
            driver: self.driver.trim().to_string(),
            min_temperature,
            max_temperature,
            avg_temperature,
            departed_at,
            delivered_at,
            destination: self.destination.trim().to_string(),
            destination_address: self.destination_address.trim().to_string(),
            status,
            distance_km,
            transport_notes: non_blank(self.transport_notes),
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ViolationKind;
    use rust_decimal_macros::dec;

    fn request() -> CreateLogisticsRequest {
        serde_json::from_value(serde_json::json!({
            "transformation_id": Uuid::new_v4().to_string(),
            "guide_number": "GUI-2024-001",
            "vehicle": "Placa ABC-123",
            "driver": "Roberto",
            "min_temperature": 3,
            "max_temperature": "6",
            "avg_temperature": 4.5,
            "departed_at": "2024-01-17T06:00:00Z",
            "delivered_at": "2024-01-17T14:00:00Z",
            "destination": "Supermercado Central",
            "destination_address": "Av. 2, San José",
            "distance_km": "120.5"
        }))
        .unwrap()
    }

    #[test]
    fn status_defaults_to_in_transit() {
        let logistics = request().into_logistics(None).unwrap();
        assert_eq!(logistics.status, "IN_TRANSIT");
        assert_eq!(logistics.status(), Some(DeliveryStatus::InTransit));
        assert_eq!(logistics.avg_temperature, dec!(4.5));
        assert_eq!(logistics.distance_km, Some(dec!(120.5)));
    }

    #[test]
    fn explicit_status_is_kept_verbatim() {
        let mut req = request();
        req.status = Some("LOST".into());
        assert_eq!(req.into_logistics(None).unwrap().status, "LOST");
    }

    #[test]
    fn negative_distance_and_missing_readings_fail_parsing() {
        let mut req = request();
        req.distance_km = Some("-3".into());
        req.max_temperature = " ".into();

        let result = req.into_logistics(None).unwrap_err();
        assert_eq!(result.for_scope("max_temperature").next().unwrap().kind, ViolationKind::MissingField);
        assert_eq!(result.for_scope("distance_km").next().unwrap().kind, ViolationKind::OutOfRange);
    }

    #[test]
    fn guide_and_status_rules_survive_an_unreadable_reading() {
        let mut req = request();
        req.transformation_id = "shipment-9".into();
        req.guide_number = "G1".into();
        req.status = Some("LOST".into());
        req.avg_temperature = "cold".into();
        req.min_temperature = "9".into();

        let result = req.into_logistics(None).unwrap_err();
        let found: Vec<(&str, ViolationKind)> = result
            .violations()
            .iter()
            .map(|v| (v.scope.as_str(), v.kind))
            .collect();
        assert_eq!(
            found,
            vec![
                ("transformation_id", ViolationKind::InvalidFormat),
                ("avg_temperature", ViolationKind::InvalidFormat),
                ("guide_number", ViolationKind::InvalidFormat),
                ("min_temperature", ViolationKind::OutOfRange),
                ("temperature_range", ViolationKind::InconsistentRange),
                ("status", ViolationKind::InvalidEnum),
            ]
        );
    }

    #[test]
    fn missing_keys_are_missing_fields_not_decode_errors() {
        let req: CreateLogisticsRequest = serde_json::from_str("{}").unwrap();
        let result = req.into_logistics(None).unwrap_err();
        // six unreadable values, then the four blank text fields
        assert_eq!(result.count_kind(ViolationKind::MissingField), 10);
        assert_eq!(result.for_scope("guide_number").next().unwrap().kind, ViolationKind::InvalidFormat);
        assert!(!result.has_kind(ViolationKind::InvalidEnum));
    }
}
