use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

/// Outcome of the quality-control inspection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumString, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityResult {
    Approved,
    Rejected,
    Conditional,
}

/// Washing, packaging and quality-control record for one lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    pub id: Uuid,

    pub lot_id: Uuid,

    // Washing
    pub washed_at: DateTime<Utc>,
    pub washing_temperature: Decimal,
    pub washing_responsible: String,

    // Packaging
    pub packaged_at: DateTime<Utc>,
    pub package_type: String,
    pub unit_count: i64,
    pub packaging_responsible: String,

    // Quality control
    pub quality_checked_at: DateTime<Utc>,
    /// Result code as submitted; see [`Transformation::quality_result`]
    pub quality_result: String,
    #[serde(default)]
    pub quality_observations: Option<String>,
    pub quality_responsible: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transformation {
    /// Parsed quality result, `None` when the stored code is not a known one.
    pub fn quality_result(&self) -> Option<QualityResult> {
        QualityResult::from_str(self.quality_result.trim()).ok()
    }
}
