//! Business-rule validation for traceability records.
//!
//! Every check reports a [`Violation`] instead of failing: a malformed or
//! out-of-range field is an expected outcome. Validators never stop at the
//! first problem, so a [`ValidationResult`] always lists everything wrong
//! with a record, in the order the checks ran.

use serde::Serialize;
use std::fmt;
use strum::{AsRefStr, Display, EnumIter};

pub mod chain;
pub mod logistics;
pub mod lot;
pub mod rules;
pub mod transformation;

pub use chain::{assemble_chain, trace_chain, trace_chain_by_code, ChainReport, StageReport};
pub use logistics::validate_logistics;
pub use lot::validate_lot;
pub use transformation::validate_transformation;

/// The kind of rule a record broke.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    MissingField,
    InvalidFormat,
    InvalidEnum,
    OutOfRange,
    InconsistentRange,
    OutOfOrder,
    DurationExceeded,
    DanglingReference,
    FutureDate,
    IncompleteChain,
}

/// How much a violation weighs on the validity of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
}

impl ViolationKind {
    pub fn severity(self) -> Severity {
        match self {
            ViolationKind::IncompleteChain => Severity::Info,
            _ => Severity::Error,
        }
    }
}

/// A single rule failure, attached to a field or to a cross-field scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub scope: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    pub fn new(scope: impl Into<String>, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind.severity() == Severity::Error
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.scope, self.message)
    }
}

/// Ordered list of violations plus the resulting validity flag.
///
/// `valid` is false as soon as one error-severity violation is recorded;
/// informational entries such as [`ViolationKind::IncompleteChain`] leave it
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    valid: bool,
    violations: Vec<Violation>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            violations: Vec::new(),
        }
    }

    pub fn push(&mut self, violation: Violation) {
        if violation.is_error() {
            self.valid = false;
        }
        self.violations.push(violation);
    }

    /// Records the violation if the check produced one.
    pub fn check(&mut self, outcome: Option<Violation>) {
        if let Some(violation) = outcome {
            self.push(violation);
        }
    }

    pub fn merge(&mut self, other: ValidationResult) {
        for violation in other.violations {
            self.push(violation);
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.is_error())
    }

    pub fn has_kind(&self, kind: ViolationKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }

    pub fn count_kind(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }

    pub fn for_scope<'a>(&'a self, scope: &'a str) -> impl Iterator<Item = &'a Violation> + 'a {
        self.violations.iter().filter(move |v| v.scope == scope)
    }

    /// Human readable messages, one per violation.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.message.clone()).collect()
    }
}

impl From<Vec<Violation>> for ValidationResult {
    fn from(violations: Vec<Violation>) -> Self {
        let mut result = ValidationResult::new();
        for violation in violations {
            result.push(violation);
        }
        result
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.violations.is_empty() {
            return write!(f, "no violations");
        }
        let rendered: Vec<String> = self.violations.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", rendered.join("; "))
    }
}

/// Presence check shared by every stage: a required text field must hold
/// something other than whitespace.
pub(crate) fn require_text(scope: &str, label: &str, value: &str) -> Option<Violation> {
    if value.trim().is_empty() {
        Some(Violation::new(
            scope,
            ViolationKind::MissingField,
            format!("{} is required.", label),
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_chain_entries_do_not_invalidate() {
        let mut result = ValidationResult::new();
        result.push(Violation::new(
            "transformation",
            ViolationKind::IncompleteChain,
            "No transformation recorded yet.",
        ));
        assert!(result.is_valid());
        assert_eq!(result.len(), 1);
        assert_eq!(result.errors().count(), 0);
    }

    #[test]
    fn error_violation_flips_validity_and_keeps_order() {
        let mut result = ValidationResult::new();
        result.push(Violation::new("code", ViolationKind::InvalidFormat, "bad code"));
        result.push(Violation::new("area_hectares", ViolationKind::OutOfRange, "bad area"));
        assert!(!result.is_valid());
        assert_eq!(result.messages(), vec!["bad code", "bad area"]);
    }

    #[test]
    fn kind_codes_render_in_screaming_snake_case() {
        assert_eq!(ViolationKind::DanglingReference.to_string(), "DANGLING_REFERENCE");
        assert_eq!(ViolationKind::OutOfOrder.as_ref(), "OUT_OF_ORDER");
        assert_eq!(
            serde_json::to_value(ViolationKind::DurationExceeded).unwrap(),
            serde_json::json!("DURATION_EXCEEDED")
        );
    }

    #[test]
    fn blank_text_is_missing() {
        assert!(require_text("driver", "Driver", "   ").is_some());
        assert!(require_text("driver", "Driver", "Ana").is_none());
    }
}
