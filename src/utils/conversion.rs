//! Numeric rounding and text formatting helpers shared by the models and
//! the persistence layer.

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Truncate toward zero and clamp into `[min, max]`.
pub fn truncate_clamp(value: f64, min: i32, max: i32) -> i32 {
    // `as` saturates on overflow and maps NaN to 0
    (value.trunc() as i32).clamp(min, max)
}

/// Shortest round-trip text for a float, always with a fractional part.
///
/// `98.0` stays `98.0` instead of Rust's default `98`, so CSV columns read
/// as floats throughout.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(9.81234, 3), 9.812);
        assert_eq!(round_to(97.25, 1), 97.3);
        assert_eq!(round_to(-0.0004, 3), -0.0);
    }

    #[test]
    fn test_truncate_clamp() {
        assert_eq!(truncate_clamp(72.9, 45, 185), 72);
        assert_eq!(truncate_clamp(-3.7, 0, 100), 0);
        assert_eq!(truncate_clamp(250.0, 45, 185), 185);
        assert_eq!(truncate_clamp(f64::NAN, 45, 185), 45);
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(98.0), "98.0");
        assert_eq!(format_float(97.3), "97.3");
        assert_eq!(format_float(36.52), "36.52");
        assert_eq!(format_float(-1.0), "-1.0");
        assert_eq!(format_float(0.9), "0.9");
    }
}
