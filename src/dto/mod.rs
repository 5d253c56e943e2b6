//! Raw request payloads, as a form or a JSON client submits them.
//!
//! Numbers, dates, timestamps and references arrive as text. Converting a
//! request into a typed candidate reports every value that is absent
//! (`MissingField`) or cannot be read (`InvalidFormat`) in one pass; the
//! business rules then run on the typed candidate. When the candidate cannot
//! be built, the rules whose inputs were read still run and their violations
//! follow the parse violations.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{ValidationResult, Violation, ViolationKind};

pub mod logistics;
pub mod lot;
pub mod transformation;

pub use logistics::CreateLogisticsRequest;
pub use lot::CreateLotRequest;
pub use transformation::CreateTransformationRequest;

const NAIVE_TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Collects parse failures while a request is converted field by field.
#[derive(Debug, Default)]
pub(crate) struct FieldParser {
    result: ValidationResult,
}

impl FieldParser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn check(&mut self, outcome: Option<Violation>) {
        self.result.check(outcome);
    }

    pub(crate) fn is_clean(&self) -> bool {
        self.result.is_empty()
    }

    /// Parse violations followed by the rule violations judged on what did parse.
    pub(crate) fn reject(self, rules: ValidationResult) -> ValidationResult {
        let mut result = self.result;
        result.merge(rules);
        result
    }

    fn missing(&mut self, field: &str, label: &str) {
        self.result.push(Violation::new(
            field,
            ViolationKind::MissingField,
            format!("{} is required.", label),
        ));
    }

    fn malformed(&mut self, field: &str, message: String) {
        self.result
            .push(Violation::new(field, ViolationKind::InvalidFormat, message));
    }

    /// Required value: blank is `MissingField`, unreadable is `InvalidFormat`.
    fn required<T>(
        &mut self,
        field: &str,
        label: &str,
        raw: &str,
        expected: &str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        let raw = raw.trim();
        if raw.is_empty() {
            self.missing(field, label);
            return None;
        }
        let parsed = parse(raw);
        if parsed.is_none() {
            self.malformed(
                field,
                format!("{} '{}' is not a valid {}.", label, raw, expected),
            );
        }
        parsed
    }

    pub(crate) fn decimal(&mut self, field: &str, label: &str, raw: &str) -> Option<Decimal> {
        self.required(field, label, raw, "number", parse_decimal)
    }

    /// Optional number: absent or blank is `None` without a violation.
    pub(crate) fn optional_decimal(
        &mut self,
        field: &str,
        label: &str,
        raw: Option<&str>,
    ) -> Option<Decimal> {
        match raw.map(str::trim).filter(|r| !r.is_empty()) {
            Some(raw) => {
                let parsed = parse_decimal(raw);
                if parsed.is_none() {
                    self.malformed(field, format!("{} '{}' is not a valid number.", label, raw));
                }
                parsed
            }
            None => None,
        }
    }

    pub(crate) fn integer(&mut self, field: &str, label: &str, raw: &str) -> Option<i64> {
        self.required(field, label, raw, "whole number", |r| r.parse::<i64>().ok())
    }

    pub(crate) fn date(&mut self, field: &str, label: &str, raw: &str) -> Option<NaiveDate> {
        self.required(field, label, raw, "date (YYYY-MM-DD)", |r| {
            NaiveDate::parse_from_str(r, "%Y-%m-%d").ok()
        })
    }

    pub(crate) fn timestamp(
        &mut self,
        field: &str,
        label: &str,
        raw: &str,
    ) -> Option<DateTime<Utc>> {
        self.required(field, label, raw, "date and time", parse_timestamp)
    }

    pub(crate) fn reference(&mut self, field: &str, label: &str, raw: &str) -> Option<Uuid> {
        self.required(field, label, raw, "identifier", |r| Uuid::parse_str(r).ok())
    }

    /// Storage length limits declared on the request with `validator`.
    pub(crate) fn length_limits<T: Validate>(&mut self, request: &T) {
        let errors = match request.validate() {
            Ok(()) => return,
            Err(errors) => errors,
        };

        let mut fields: Vec<(String, Vec<String>)> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let field = field.to_string();
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("{} is too long.", field))
                    })
                    .collect();
                (field, messages)
            })
            .collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        for (field, messages) in fields {
            for message in messages {
                self.malformed(&field, message);
            }
        }
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// RFC 3339, or a zone-less `YYYY-MM-DDTHH:MM[:SS]` read as UTC (what an
/// HTML `datetime-local` input produces).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl RawValue {
    fn into_text(self) -> String {
        match self {
            RawValue::Text(text) => text,
            RawValue::Number(number) => number.to_string(),
            RawValue::Flag(flag) => flag.to_string(),
        }
    }
}

/// Accepts text, numbers or booleans and keeps them as text; `null` and a
/// missing key become the empty string.
pub(crate) fn lenient<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawValue>::deserialize(deserializer)?
        .map(RawValue::into_text)
        .unwrap_or_default())
}

pub(crate) fn lenient_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawValue>::deserialize(deserializer)?.map(RawValue::into_text))
}

/// Empty optional text is the same as no text.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
