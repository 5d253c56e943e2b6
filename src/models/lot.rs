use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A harvested batch of product: the origin of every traceability chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CultivationLot {
    pub id: Uuid,

    /// Business identifier, unique across the store
    pub code: String,

    pub product_type: String,

    pub location: String,

    /// GPS coordinates as recorded by the farm, if any
    #[serde(default)]
    pub latitude: Option<Decimal>,
    #[serde(default)]
    pub longitude: Option<Decimal>,

    pub area_hectares: Decimal,

    pub harvest_date: NaiveDate,

    pub responsible: String,

    #[serde(default)]
    pub is_organic: bool,

    #[serde(default)]
    pub certifications: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl CultivationLot {
    pub fn new(
        code: impl Into<String>,
        product_type: impl Into<String>,
        location: impl Into<String>,
        area_hectares: Decimal,
        harvest_date: NaiveDate,
        responsible: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            code: code.into(),
            product_type: product_type.into(),
            location: location.into(),
            latitude: None,
            longitude: None,
            area_hectares,
            harvest_date,
            responsible: responsible.into(),
            is_organic: false,
            certifications: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn organic(mut self, certifications: Option<String>) -> Self {
        self.is_organic = true;
        self.certifications = certifications;
        self
    }
}
