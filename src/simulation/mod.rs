//! Multi-sensor physiological stream simulation
//! Location: src/simulation/mod.rs

pub mod records;
pub mod noise_models;
pub mod physiology;
pub mod artifact_injection;
pub mod timestamps;
pub mod signal_generator;
pub mod profiles;
pub mod config;

pub use records::{
    ActivityType, BloodOxygenRecord, ChannelRecord, Emission, HeartRateRecord, LoadRecord,
    MovementRecord, OutputFormat, PulseQuality, SensorChannel, TemperatureRecord,
};
pub use noise_models::{SimRng, StreamSeeder};
pub use physiology::{ActivityPattern, PatternModel};
pub use artifact_injection::{ClockDrift, CorruptionRule, CorruptionRules, Gap, ImperfectionLayer, StepRange};
pub use signal_generator::{
    BloodOxygenStream, ChannelStream, HeartRateStream, LoadStream, MovementStream, SensorStream,
    TemperatureStream,
};
pub use profiles::{ChannelSchedule, PatientProfile};
pub use config::ChannelProfiles;
