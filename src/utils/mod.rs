//! Common utility functions for vitalsim-core
//!
//! - Timestamp arithmetic and encodings on top of `chrono`
//! - Configuration validation helpers
//! - Rounding and float formatting shared by models and writers

pub mod time;
pub mod validation;
pub mod conversion;

// Re-export commonly used functions for convenience
pub use time::{
    offset_by_seconds,
    checked_offset_by_seconds,
    parse_reference_time,
    iso_with_offset,
    unix_millis,
    unix_seconds,
};

pub use validation::{
    ValidationError,
    ValidationResult,
    validate_probability,
    validate_positive,
    validate_non_negative,
    validate_step_range,
    validate_unique_ids,
};

pub use conversion::{
    round_to,
    truncate_clamp,
    format_float,
};
