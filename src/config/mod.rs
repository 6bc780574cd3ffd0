// src/config/mod.rs
//! Fixture generation configuration

pub mod constants;
pub mod loader;

pub use constants::*;
pub use loader::{ConfigError, ConfigLoader};

use crate::simulation::{ChannelProfiles, PatientProfile, SensorChannel, StreamSeeder};
use crate::utils::time::parse_reference_time;
use crate::utils::validation::{validate_unique_ids, ValidationError, ValidationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Complete fixture configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FixtureConfig {
    #[serde(default)]
    pub generation: GenerationSettings,

    #[serde(default)]
    pub channels: ChannelProfiles,

    #[serde(default = "defaults::patients")]
    pub patients: Vec<PatientProfile>,
}

/// Run-level settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GenerationSettings {
    #[serde(default = "defaults::seed")]
    pub seed: u64,

    /// RFC 3339 instant every channel offset is measured from
    #[serde(default = "defaults::reference_time")]
    pub reference_time: String,

    #[serde(default = "defaults::output_dir")]
    pub output_dir: PathBuf,

    /// Generate patients on the rayon pool
    #[serde(default = "defaults::parallel")]
    pub parallel: bool,
}

/// Default value providers using constants
mod defaults {
    use crate::config::constants::generation;
    use crate::simulation::PatientProfile;
    use std::path::PathBuf;

    pub fn seed() -> u64 { generation::DEFAULT_SEED }
    pub fn reference_time() -> String { generation::DEFAULT_REFERENCE_TIME.to_string() }
    pub fn output_dir() -> PathBuf { PathBuf::from(generation::DEFAULT_OUTPUT_DIR) }
    pub fn parallel() -> bool { false }

    pub fn patients() -> Vec<PatientProfile> { PatientProfile::builtin() }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            seed: defaults::seed(),
            reference_time: defaults::reference_time(),
            output_dir: defaults::output_dir(),
            parallel: defaults::parallel(),
        }
    }
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            generation: GenerationSettings::default(),
            channels: ChannelProfiles::default(),
            patients: defaults::patients(),
        }
    }
}

impl GenerationSettings {
    /// Parsed reference instant
    pub fn reference_instant(&self) -> ValidationResult<DateTime<Utc>> {
        parse_reference_time(&self.reference_time).map_err(|e| ValidationError::InvalidFormat {
            field: "generation.reference_time".to_string(),
            value: self.reference_time.clone(),
            expected: format!("an RFC 3339 timestamp ({})", e),
        })
    }
}

impl FixtureConfig {
    /// Validate everything generation depends on
    pub fn validate(&self) -> ValidationResult<()> {
        let reference = self.generation.reference_instant()?;
        self.channels.validate()?;

        validate_unique_ids("patients.id", self.patients.iter().map(|p| p.id.as_str()))?;
        self.validate_stream_keys()?;
        for patient in &self.patients {
            patient.validate()?;
            for channel in SensorChannel::ALL {
                patient.validate_timeline(channel, &reference, self.channel_span_s(patient, channel))?;
            }
        }

        Ok(())
    }

    /// Longest reported elapsed time of one channel, drift included
    fn channel_span_s(&self, patient: &PatientProfile, channel: SensorChannel) -> f64 {
        let duration = match channel {
            SensorChannel::Temperature => {
                patient.temperature_duration_s(self.channels.temperature.extension_margin_s)
            }
            _ => patient.nominal_duration_s(),
        };
        duration * (1.0 + self.channels.clock_drift_max(channel))
    }

    /// Distinct patient ids must seed distinct random streams
    fn validate_stream_keys(&self) -> ValidationResult<()> {
        let mut keys: HashMap<u32, &str> = HashMap::new();
        for patient in &self.patients {
            let key = StreamSeeder::patient_key(&patient.id);
            if let Some(previous) = keys.insert(key, &patient.id) {
                return Err(ValidationError::ConstraintViolation {
                    fields: vec![
                        format!("patients.{}.id", previous),
                        format!("patients.{}.id", patient.id),
                    ],
                    message: format!("ids share the stream key {:#010x}; rename one patient", key),
                });
            }
        }
        Ok(())
    }

    pub fn patient(&self, id: &str) -> Option<&PatientProfile> {
        self.patients.iter().find(|patient| patient.id == id)
    }

    /// Configuration summary for display/logging
    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            seed: self.generation.seed,
            reference_time: self.generation.reference_time.clone(),
            output_dir: self.generation.output_dir.clone(),
            parallel: self.generation.parallel,
            patient_ids: self.patients.iter().map(|p| p.id.clone()).collect(),
        }
    }
}

/// Configuration summary for display/logging
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub seed: u64,
    pub reference_time: String,
    pub output_dir: PathBuf,
    pub parallel: bool,
    pub patient_ids: Vec<String>,
}
