//! vitalsim-core: deterministic multi-sensor physiological fixture generator
//!
//! Produces per-patient sensor streams (heart rate, accelerometer, pulse
//! oximetry, skin temperature, physical load) that are realistic per sensor
//! and deliberately misaligned across sensors: start offsets, sampling
//! cadences, timestamp encodings, timezones, gaps and corruption patterns all
//! differ. Intended as input for ingestion and alignment pipeline tests.
//!
//! - Activity pattern models for every channel
//! - Imperfection layer (gaps, micro-dropouts, clock drift, faults)
//! - Per (patient, channel) deterministic random streams
//! - Layered TOML configuration with environment overrides
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use vitalsim_core::{FixtureConfig, FixtureWriter, PatientOrchestrator};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FixtureConfig::default();
//!     let writer = FixtureWriter::new(&config.generation.output_dir);
//!     let orchestrator = PatientOrchestrator::new(config)?;
//!
//!     for dataset in orchestrator.generate_all() {
//!         writer.write_dataset(&dataset)?;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod persistence;
pub mod simulation;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{ConfigError, ConfigLoader, FixtureConfig, GenerationSettings};
pub use error::{FixtureError, FixtureResult};
pub use orchestrator::{ChannelDescriptor, PatientDataset, PatientOrchestrator};
pub use persistence::{FixtureWriter, PatientReport, WrittenFile};

pub use simulation::{
    ActivityPattern, ChannelProfiles, ChannelRecord, ChannelSchedule, ChannelStream, Gap,
    PatientProfile, SensorChannel, SimRng, StreamSeeder,
};

pub use utils::validation::{ValidationError, ValidationResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Deterministic multi-sensor physiological fixture generator".to_string(),
        channels: SensorChannel::ALL.iter().map(|c| c.name().to_string()).collect(),
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    /// Channels produced per patient, in generation order
    pub channels: Vec<String>,
}
