//! Fixed business constants for the traceability rules.

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Minimum number of characters in a lot code.
pub const LOT_CODE_MIN_LEN: usize = 3;

/// Washing water temperature band, in °C (inclusive).
pub const WASHING_TEMP_MIN: Decimal = dec!(10);
pub const WASHING_TEMP_MAX: Decimal = dec!(40);

/// Units per packaging run (inclusive).
pub const UNITS_MIN: i64 = 1;
pub const UNITS_MAX: i64 = 100_000;

/// Cold-chain band during transport, in °C (inclusive).
pub const TRANSPORT_TEMP_MIN: Decimal = dec!(2);
pub const TRANSPORT_TEMP_MAX: Decimal = dec!(8);

/// Minimum number of characters in a transport guide number.
pub const GUIDE_NUMBER_MIN_LEN: usize = 5;

/// Longest allowed transit, departure to delivery.
pub const MAX_TRANSIT_HOURS: i64 = 72;

pub const LATITUDE_LIMIT: Decimal = dec!(90);
pub const LONGITUDE_LIMIT: Decimal = dec!(180);

pub fn max_transit() -> Duration {
    Duration::hours(MAX_TRANSIT_HOURS)
}

pub fn in_band(value: Decimal, min: Decimal, max: Decimal) -> bool {
    value >= min && value <= max
}
