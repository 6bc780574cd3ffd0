// src/error.rs
//! Unified error handling for vitalsim-core
//!
//! Simulated sensor faults (sentinel values, nulls, impossible readings) are
//! data and never pass through this module. The errors here are real
//! failures: bad configuration, unreadable config files and persistence I/O.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::utils::validation::ValidationError;

/// Unified error type for the fixture generator
#[derive(Debug, Error)]
pub enum FixtureError {
    /// Configuration rejected before generation
    #[error("[CONFIG] Configuration error in {component}: {reason} ({})", .context.operation)]
    Configuration {
        component: String,
        reason: String,
        context: ErrorContext,
    },

    /// Field-level validation failure
    #[error("[CONFIG] {0}")]
    Validation(#[from] ValidationError),

    /// Configuration file loading failure
    #[error("[CONFIG] {0}")]
    Loading(#[from] ConfigError),

    /// Filesystem failure while persisting fixtures
    #[error("[IO] {operation} failed for {}: {source}", .path.display())]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Record encoding failure
    #[error("[SERIALIZE] {format} encoding failed: {reason}")]
    Serialization {
        format: String,
        reason: String,
    },
}

/// Where an error was raised
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorContext {
    pub component: String,
    pub operation: String,
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
            file: None,
            line: None,
        }
    }

    /// Create error context with file and line information
    pub fn with_location(component: &str, operation: &str, file: &'static str, line: u32) -> Self {
        let mut context = Self::new(component, operation);
        context.file = Some(file);
        context.line = Some(line);
        context
    }
}

/// Macro for creating error context with file and line info
#[macro_export]
macro_rules! error_context {
    ($component:expr, $operation:expr) => {
        $crate::error::ErrorContext::with_location($component, $operation, file!(), line!())
    };
}

/// Result type alias for fixture operations
pub type FixtureResult<T> = Result<T, FixtureError>;

impl FixtureError {
    /// Configuration error carrying the caller's location
    pub fn configuration(context: ErrorContext, reason: impl Into<String>) -> Self {
        FixtureError::Configuration {
            component: context.component.clone(),
            reason: reason.into(),
            context,
        }
    }

    /// Wrap an I/O error with the path and operation that failed
    pub fn io(operation: &str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FixtureError::Io {
            operation: operation.to_string(),
            path: path.into(),
            source,
        }
    }

    /// True for every failure that is detected before generation begins
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FixtureError::Configuration { .. } | FixtureError::Validation(_) | FixtureError::Loading(_)
        )
    }
}

impl From<serde_json::Error> for FixtureError {
    fn from(err: serde_json::Error) -> Self {
        FixtureError::Serialization {
            format: "json".to_string(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_creation() {
        let context = error_context!("orchestrator", "generate_all");
        assert_eq!(context.component, "orchestrator");
        assert_eq!(context.operation, "generate_all");
        assert!(context.file.is_some());
        assert!(context.line.is_some());
    }

    #[test]
    fn test_configuration_display() {
        let err = FixtureError::configuration(
            ErrorContext::new("orchestrator", "select_patients"),
            "unknown patient 'patient_999'",
        );
        let display = err.to_string();
        assert!(display.contains("orchestrator"));
        assert!(display.contains("patient_999"));
        assert!(display.contains("select_patients"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_validation_conversion() {
        let err: FixtureError = ValidationError::RequiredFieldMissing("patients.id".to_string()).into();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("patients.id"));
    }

    #[test]
    fn test_io_error_is_not_configuration() {
        let err = FixtureError::io(
            "create_dir",
            "/nonexistent",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("create_dir"));
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FixtureError>();
    }
}
