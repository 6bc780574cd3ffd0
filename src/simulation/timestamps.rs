//! Per-channel timestamp encodings
//! Location: src/simulation/timestamps.rs
//!
//! Each channel reports time in its own format on purpose. Every encoder
//! takes the channel start instant and an elapsed offset in seconds.

use super::noise_models::SimRng;
use crate::utils::time::{iso_with_offset, offset_by_seconds, unix_millis, unix_seconds};
use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Heart rate: ISO-8601 in UTC with `+00:00`
pub fn heart_rate_timestamp(start: &DateTime<Utc>, elapsed_s: f64) -> String {
    iso_with_offset(&offset_by_seconds(start, elapsed_s))
}

/// Movement: Unix milliseconds
pub fn movement_timestamp(start: &DateTime<Utc>, elapsed_s: f64) -> i64 {
    unix_millis(&offset_by_seconds(start, elapsed_s))
}

/// Blood oxygen: Unix seconds
pub fn blood_oxygen_timestamp(start: &DateTime<Utc>, elapsed_s: f64) -> i64 {
    unix_seconds(&offset_by_seconds(start, elapsed_s))
}

/// Fixed zone `hours` east of UTC; out-of-range offsets fall back to UTC
pub fn fixed_zone(hours: i32) -> FixedOffset {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

/// Temperature: ISO-8601 rendered in the logger's fixed zone
pub fn temperature_timestamp(start: &DateTime<Utc>, elapsed_s: f64, zone: &FixedOffset) -> String {
    let local = offset_by_seconds(start, elapsed_s).with_timezone(zone);
    iso_with_offset(&local)
}

/// The three string layouts used by the load tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTimestampFormat {
    /// `2024-03-15T08:00:00Z`
    NoMillis,
    /// `2024-03-15T08:00:00.123Z`; the millisecond field is random
    WithMillis,
    /// `2024/03/15 08:00:00`
    Slash,
}

impl LoadTimestampFormat {
    /// Picks a layout with one draw, using cumulative thresholds
    pub fn choose(weights: (f64, f64), rng: &mut SimRng) -> Self {
        let u = rng.unit();
        if u < weights.0 {
            LoadTimestampFormat::NoMillis
        } else if u < weights.0 + weights.1 {
            LoadTimestampFormat::WithMillis
        } else {
            LoadTimestampFormat::Slash
        }
    }

    /// Renders `instant`; `WithMillis` draws its millisecond field from `rng`
    pub fn render(self, instant: &DateTime<Utc>, rng: &mut SimRng) -> String {
        match self {
            LoadTimestampFormat::NoMillis => instant.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            LoadTimestampFormat::WithMillis => {
                let millis = rng.int_inclusive(0, 999);
                format!("{}.{:03}Z", instant.format("%Y-%m-%dT%H:%M:%S"), millis)
            }
            LoadTimestampFormat::Slash => instant.format("%Y/%m/%d %H:%M:%S").to_string(),
        }
    }
}

/// Load: one of three layouts chosen per record
pub fn load_timestamp(start: &DateTime<Utc>, elapsed_s: f64, weights: (f64, f64), rng: &mut SimRng) -> String {
    let instant = offset_by_seconds(start, elapsed_s);
    LoadTimestampFormat::choose(weights, rng).render(&instant, rng)
}
