use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

/// Delivery status, the only state carried by a logistics record.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    #[default]
    InTransit,
    Delivered,
    Delayed,
}

/// Transport of a transformation's output to its destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Logistics {
    pub id: Uuid,

    pub transformation_id: Uuid,

    /// Transport guide number, unique across the store
    pub guide_number: String,
    pub vehicle: String,
    pub driver: String,

    // Cold-chain readings, °C
    pub min_temperature: Decimal,
    pub max_temperature: Decimal,
    pub avg_temperature: Decimal,

    pub departed_at: DateTime<Utc>,
    pub delivered_at: DateTime<Utc>,

    pub destination: String,
    pub destination_address: String,

    /// Status code as submitted; see [`Logistics::status`]
    pub status: String,

    #[serde(default)]
    pub distance_km: Option<Decimal>,
    #[serde(default)]
    pub transport_notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Logistics {
    pub fn status(&self) -> Option<DeliveryStatus> {
        DeliveryStatus::from_str(self.status.trim()).ok()
    }
}
