use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::rules::{self, LATITUDE_LIMIT, LONGITUDE_LIMIT, LOT_CODE_MIN_LEN};
use super::{require_text, ValidationResult, Violation, ViolationKind};
use crate::models::CultivationLot;

/// Lot values as far as they could be read. Rules whose input is `None` are
/// skipped; the reason it is missing has already been reported.
#[derive(Debug, Clone, Copy)]
pub struct LotFields<'a> {
    pub code: &'a str,
    pub product_type: &'a str,
    pub location: &'a str,
    pub area_hectares: Option<Decimal>,
    pub harvest_date: Option<NaiveDate>,
    pub responsible: &'a str,
}

impl<'a> From<&'a CultivationLot> for LotFields<'a> {
    fn from(lot: &'a CultivationLot) -> Self {
        Self {
            code: &lot.code,
            product_type: &lot.product_type,
            location: &lot.location,
            area_hectares: Some(lot.area_hectares),
            harvest_date: Some(lot.harvest_date),
            responsible: &lot.responsible,
        }
    }
}

/// Validates a candidate lot. `today` is the caller's resolved current date.
pub fn validate_lot(lot: &CultivationLot, today: NaiveDate) -> ValidationResult {
    check_lot_fields(&LotFields::from(lot), today)
}

pub fn check_lot_fields(fields: &LotFields<'_>, today: NaiveDate) -> ValidationResult {
    let mut result = ValidationResult::new();

    result.check(check_code(fields.code));
    result.check(require_text("product_type", "Product type", fields.product_type));
    result.check(require_text("location", "Location", fields.location));
    result.check(fields.area_hectares.and_then(check_area));
    result.check(
        fields
            .harvest_date
            .and_then(|date| check_harvest_date(date, today)),
    );
    result.check(require_text("responsible", "Responsible party", fields.responsible));

    result
}

/// A lot code starts with a letter and has at least three characters. A
/// blank code does not match either.
pub fn check_code(code: &str) -> Option<Violation> {
    let starts_with_letter = code.chars().next().map_or(false, char::is_alphabetic);
    if !starts_with_letter || code.chars().count() < LOT_CODE_MIN_LEN {
        return Some(Violation::new(
            "code",
            ViolationKind::InvalidFormat,
            format!(
                "Lot code '{}' must start with a letter and be at least {} characters long.",
                code, LOT_CODE_MIN_LEN
            ),
        ));
    }

    None
}

pub fn check_area(area_hectares: Decimal) -> Option<Violation> {
    if area_hectares <= Decimal::ZERO {
        Some(Violation::new(
            "area_hectares",
            ViolationKind::OutOfRange,
            format!("Area ({} ha) must be greater than zero.", area_hectares),
        ))
    } else {
        None
    }
}

/// The harvest cannot be dated after `today`; harvesting today is fine.
pub fn check_harvest_date(harvest_date: NaiveDate, today: NaiveDate) -> Option<Violation> {
    if harvest_date > today {
        Some(Violation::new(
            "harvest_date",
            ViolationKind::FutureDate,
            format!("Harvest date {} cannot be in the future.", harvest_date),
        ))
    } else {
        None
    }
}

/// Coordinates are optional; request parsing applies these checks because
/// they are not part of the lot's core rules.
pub fn check_latitude(latitude: Option<Decimal>) -> Option<Violation> {
    let value = latitude?;
    if rules::in_band(value, -LATITUDE_LIMIT, LATITUDE_LIMIT) {
        None
    } else {
        Some(Violation::new(
            "latitude",
            ViolationKind::OutOfRange,
            format!("Latitude {} must be between -90 and 90.", value),
        ))
    }
}

pub fn check_longitude(longitude: Option<Decimal>) -> Option<Violation> {
    let value = longitude?;
    if rules::in_band(value, -LONGITUDE_LIMIT, LONGITUDE_LIMIT) {
        None
    } else {
        Some(Violation::new(
            "longitude",
            ViolationKind::OutOfRange,
            format!("Longitude {} must be between -180 and 180.", value),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn sample_lot() -> CultivationLot {
        CultivationLot::new(
            "LOTE-2024-001",
            "Mango Orgánico",
            "Finca San José, Valle Central",
            dec!(5.50),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            "Juan Pérez",
        )
    }

    #[test]
    fn valid_lot_has_no_violations() {
        let result = validate_lot(&sample_lot(), today());
        assert!(result.is_valid());
        assert!(result.is_empty());
    }

    #[test_case("LOTE-2024-001", true ; "regular code")]
    #[test_case("Abc", true ; "exactly three characters")]
    #[test_case("Ñu1", true ; "non ascii letter")]
    #[test_case("AB", false ; "too short")]
    #[test_case("1LOT", false ; "starts with digit")]
    #[test_case("-LOT", false ; "starts with symbol")]
    fn code_format(code: &str, ok: bool) {
        assert_eq!(check_code(code).is_none(), ok);
    }

    #[test_case("" ; "empty")]
    #[test_case("   " ; "whitespace only")]
    fn blank_code_is_malformed(code: &str) {
        let violation = check_code(code).unwrap();
        assert_eq!(violation.kind, ViolationKind::InvalidFormat);
    }

    #[test]
    fn harvest_today_is_allowed_tomorrow_is_not() {
        assert!(check_harvest_date(today(), today()).is_none());
        let tomorrow = today().succ_opt().unwrap();
        let violation = check_harvest_date(tomorrow, today()).unwrap();
        assert_eq!(violation.kind, ViolationKind::FutureDate);
    }

    #[test]
    fn collects_every_violation() {
        let mut lot = sample_lot();
        lot.code = "9x".into();
        lot.product_type = " ".into();
        lot.location = String::new();
        lot.responsible = String::new();
        lot.area_hectares = dec!(0);
        lot.harvest_date = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();

        let result = validate_lot(&lot, today());
        assert!(!result.is_valid());
        assert_eq!(result.count_kind(ViolationKind::MissingField), 3);
        assert!(result.has_kind(ViolationKind::InvalidFormat));
        assert!(result.has_kind(ViolationKind::OutOfRange));
        assert!(result.has_kind(ViolationKind::FutureDate));
        assert_eq!(result.len(), 6);
    }

    #[test]
    fn unread_values_skip_their_rules_only() {
        let fields = LotFields {
            code: "1X",
            product_type: "",
            location: "Finca El Roble",
            area_hectares: None,
            harvest_date: NaiveDate::from_ymd_opt(2030, 1, 1),
            responsible: "Ana",
        };
        let result = check_lot_fields(&fields, today());
        let scopes: Vec<&str> = result.violations().iter().map(|v| v.scope.as_str()).collect();
        assert_eq!(scopes, vec!["code", "product_type", "harvest_date"]);
    }

    #[test]
    fn coordinates_are_range_checked() {
        assert!(check_latitude(Some(dec!(91))).is_some());
        assert!(check_latitude(Some(dec!(-90))).is_none());
        assert!(check_longitude(Some(dec!(-180.5))).is_some());
        assert!(check_longitude(None).is_none());
    }
}
