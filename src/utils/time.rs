//! Timestamp helpers for vitalsim-core
//!
//! Offsets are fractional seconds applied at microsecond resolution. The
//! encodings here are the building blocks of the per-channel formats in
//! `simulation::timestamps`.

use chrono::{DateTime, Duration, FixedOffset, SecondsFormat, TimeZone, Timelike, Utc};

/// Shift `instant` by fractional seconds at microsecond resolution.
///
/// Panics if the result leaves chrono's calendar range. Configuration
/// validation rejects such offsets with [`checked_offset_by_seconds`].
pub fn offset_by_seconds<Tz: TimeZone>(instant: &DateTime<Tz>, seconds: f64) -> DateTime<Tz> {
    let micros = (seconds * 1_000_000.0).round() as i64;
    instant.clone() + Duration::microseconds(micros)
}

/// Like [`offset_by_seconds`], `None` when the shift or its result is not
/// representable.
pub fn checked_offset_by_seconds<Tz: TimeZone>(instant: &DateTime<Tz>, seconds: f64) -> Option<DateTime<Tz>> {
    let micros = (seconds * 1_000_000.0).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return None;
    }
    instant.clone().checked_add_signed(Duration::microseconds(micros as i64))
}

/// Parse an RFC 3339 reference instant into UTC.
pub fn parse_reference_time(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

/// ISO-8601 with an explicit `+HH:MM` offset; the fractional part is
/// printed as six digits and only when non-zero.
pub fn iso_with_offset<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    let fixed: DateTime<FixedOffset> = instant.fixed_offset();
    if fixed.nanosecond() / 1_000 == 0 {
        fixed.to_rfc3339_opts(SecondsFormat::Secs, false)
    } else {
        fixed.to_rfc3339_opts(SecondsFormat::Micros, false)
    }
}

/// Unix milliseconds, truncated.
pub fn unix_millis<Tz: TimeZone>(instant: &DateTime<Tz>) -> i64 {
    instant.timestamp_millis()
}

/// Unix seconds, truncated toward the past.
pub fn unix_seconds<Tz: TimeZone>(instant: &DateTime<Tz>) -> i64 {
    instant.timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> DateTime<Utc> {
        parse_reference_time("2024-03-15T08:00:00Z").unwrap()
    }

    #[test]
    fn test_offset_by_fractional_seconds() {
        let shifted = offset_by_seconds(&reference(), 1.5);
        assert_eq!(unix_millis(&shifted) - unix_millis(&reference()), 1500);

        let earlier = offset_by_seconds(&reference(), -900.0);
        assert_eq!(unix_seconds(&reference()) - unix_seconds(&earlier), 900);
    }

    #[test]
    fn test_checked_offset_limits() {
        assert_eq!(
            checked_offset_by_seconds(&reference(), -900.0),
            Some(offset_by_seconds(&reference(), -900.0))
        );
        assert!(checked_offset_by_seconds(&reference(), 1e13).is_none());
        assert!(checked_offset_by_seconds(&reference(), -1e13).is_none());
        assert!(checked_offset_by_seconds(&reference(), 1e300).is_none());
        assert!(checked_offset_by_seconds(&reference(), f64::NAN).is_none());
    }

    #[test]
    fn test_iso_with_offset() {
        assert_eq!(iso_with_offset(&reference()), "2024-03-15T08:00:00+00:00");

        let shifted = offset_by_seconds(&reference(), 0.25);
        assert_eq!(iso_with_offset(&shifted), "2024-03-15T08:00:00.250000+00:00");

        let est = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(
            iso_with_offset(&reference().with_timezone(&est)),
            "2024-03-15T03:00:00-05:00"
        );
    }

    #[test]
    fn test_unix_encodings() {
        assert_eq!(unix_seconds(&reference()), 1_710_489_600);
        assert_eq!(unix_millis(&reference()), 1_710_489_600_000);
    }
}
