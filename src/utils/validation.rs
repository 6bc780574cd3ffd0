//! Validation utilities for vitalsim-core
//!
//! Range and consistency checks used by configuration validation. Every
//! check runs before generation starts; nothing in the sample path calls
//! into this module.

use std::collections::HashSet;
use std::fmt;

/// Validation result type
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation failures
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Value out of valid range
    OutOfRange {
        field: String,
        value: String,
        min: String,
        max: String,
    },
    /// Required field missing or empty
    RequiredFieldMissing(String),
    /// Invalid field format
    InvalidFormat {
        field: String,
        value: String,
        expected: String,
    },
    /// Cross-field validation failure
    ConstraintViolation {
        fields: Vec<String>,
        message: String,
    },
    /// Identifier used more than once
    Duplicate {
        field: String,
        value: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::OutOfRange { field, value, min, max } => {
                write!(f, "Field '{}' value '{}' is out of range [{}, {}]", field, value, min, max)
            }
            ValidationError::RequiredFieldMissing(field) => {
                write!(f, "Required field '{}' is missing", field)
            }
            ValidationError::InvalidFormat { field, value, expected } => {
                write!(f, "Field '{}' has invalid format '{}', expected {}", field, value, expected)
            }
            ValidationError::ConstraintViolation { fields, message } => {
                write!(f, "Constraint violation for fields [{}]: {}", fields.join(", "), message)
            }
            ValidationError::Duplicate { field, value } => {
                write!(f, "Field '{}' value '{}' is used more than once", field, value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Probability must lie in [0, 1]
pub fn validate_probability(field: &str, value: f64) -> ValidationResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value: value.to_string(),
            min: "0.0".to_string(),
            max: "1.0".to_string(),
        });
    }
    Ok(())
}

/// Strictly positive, finite value
pub fn validate_positive(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value: value.to_string(),
            min: "> 0".to_string(),
            max: "finite".to_string(),
        });
    }
    Ok(())
}

/// Zero or positive, finite value
pub fn validate_non_negative(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value: value.to_string(),
            min: "0".to_string(),
            max: "finite".to_string(),
        });
    }
    Ok(())
}

/// A tick step range has to make progress on every draw.
pub fn validate_step_range(field: &str, min: f64, max: f64) -> ValidationResult<()> {
    validate_positive(&format!("{}.min", field), min)?;
    validate_positive(&format!("{}.max", field), max)?;

    if max < min {
        return Err(ValidationError::ConstraintViolation {
            fields: vec![format!("{}.min", field), format!("{}.max", field)],
            message: format!("max ({}) must not be smaller than min ({})", max, min),
        });
    }
    Ok(())
}

/// Identifiers must be non-empty and unique
pub fn validate_unique_ids<'a, I>(field: &str, ids: I) -> ValidationResult<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing(field.to_string()));
        }
        if !seen.insert(id) {
            return Err(ValidationError::Duplicate {
                field: field.to_string(),
                value: id.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_bounds() {
        assert!(validate_probability("p", 0.0).is_ok());
        assert!(validate_probability("p", 1.0).is_ok());
        assert!(validate_probability("p", -0.01).is_err());
        assert!(validate_probability("p", 1.5).is_err());
        assert!(validate_probability("p", f64::NAN).is_err());
    }

    #[test]
    fn test_step_range_rejects_stalls() {
        assert!(validate_step_range("step", 0.85, 1.15).is_ok());
        assert!(validate_step_range("step", 1.0, 1.0).is_ok());
        assert!(validate_step_range("step", 0.0, 0.0).is_err());
        assert!(validate_step_range("step", -1.0, 1.0).is_err());

        match validate_step_range("step", 2.0, 1.0) {
            Err(ValidationError::ConstraintViolation { fields, .. }) => {
                assert_eq!(fields, vec!["step.min".to_string(), "step.max".to_string()]);
            }
            other => panic!("Expected constraint violation, got {:?}", other),
        }
    }

    #[test]
    fn test_unique_ids() {
        assert!(validate_unique_ids("id", ["a", "b"]).is_ok());
        assert_eq!(
            validate_unique_ids("id", ["a", "a"]),
            Err(ValidationError::Duplicate { field: "id".to_string(), value: "a".to_string() })
        );
        assert_eq!(
            validate_unique_ids("id", [" "]),
            Err(ValidationError::RequiredFieldMissing("id".to_string()))
        );
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::OutOfRange {
            field: "dropout".to_string(),
            value: "2".to_string(),
            min: "0.0".to_string(),
            max: "1.0".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("dropout"));
        assert!(display.contains("[0.0, 1.0]"));
    }
}
