//! Patient orchestrator: runs the five channel generators per patient
//! Location: src/orchestrator.rs
//!
//! Every (patient, channel) pair draws from its own stream of the
//! [`StreamSeeder`], so the datasets do not depend on whether patients are
//! generated one after another or on the rayon pool.

use crate::config::FixtureConfig;
use crate::error::{FixtureError, FixtureResult};
use crate::error_context;
use crate::simulation::{
    ActivityPattern, BloodOxygenRecord, BloodOxygenStream, ChannelRecord, ChannelStream,
    HeartRateRecord, HeartRateStream, LoadRecord, LoadStream, MovementRecord, MovementStream,
    OutputFormat, PatientProfile, SensorChannel, SensorStream, StreamSeeder, TemperatureRecord,
    TemperatureStream,
};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// File name, encoding and field order handed to the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelDescriptor {
    pub channel: SensorChannel,
    pub file_name: &'static str,
    pub format: OutputFormat,
    pub fields: &'static [&'static str],
}

impl ChannelDescriptor {
    pub fn of<R: ChannelRecord>() -> Self {
        let channel = R::CHANNEL;
        Self {
            channel,
            file_name: channel.file_name(),
            format: channel.format(),
            fields: R::FIELDS,
        }
    }
}

/// Everything generated for one patient
#[derive(Debug, Clone, PartialEq)]
pub struct PatientDataset {
    pub patient_id: String,
    pub activity_pattern: ActivityPattern,
    pub heart_rate: ChannelStream<HeartRateRecord>,
    pub movement: ChannelStream<MovementRecord>,
    pub blood_oxygen: ChannelStream<BloodOxygenRecord>,
    pub temperature: ChannelStream<TemperatureRecord>,
    pub load: ChannelStream<LoadRecord>,
}

impl PatientDataset {
    /// Descriptors in generation order
    pub fn descriptors() -> [ChannelDescriptor; 5] {
        [
            ChannelDescriptor::of::<HeartRateRecord>(),
            ChannelDescriptor::of::<MovementRecord>(),
            ChannelDescriptor::of::<BloodOxygenRecord>(),
            ChannelDescriptor::of::<TemperatureRecord>(),
            ChannelDescriptor::of::<LoadRecord>(),
        ]
    }

    pub fn record_count(&self, channel: SensorChannel) -> usize {
        match channel {
            SensorChannel::HeartRate => self.heart_rate.len(),
            SensorChannel::Movement => self.movement.len(),
            SensorChannel::BloodOxygen => self.blood_oxygen.len(),
            SensorChannel::Temperature => self.temperature.len(),
            SensorChannel::Load => self.load.len(),
        }
    }

    pub fn fault_count(&self, channel: SensorChannel) -> usize {
        match channel {
            SensorChannel::HeartRate => self.heart_rate.fault_count,
            SensorChannel::Movement => self.movement.fault_count,
            SensorChannel::BloodOxygen => self.blood_oxygen.fault_count,
            SensorChannel::Temperature => self.temperature.fault_count,
            SensorChannel::Load => self.load.fault_count,
        }
    }

    pub fn total_records(&self) -> usize {
        SensorChannel::ALL.iter().map(|&channel| self.record_count(channel)).sum()
    }
}

/// Validated configuration plus the five channel generators
pub struct PatientOrchestrator {
    config: FixtureConfig,
    reference: DateTime<Utc>,
    seeder: StreamSeeder,
    heart_rate: HeartRateStream,
    movement: MovementStream,
    blood_oxygen: BloodOxygenStream,
    temperature: TemperatureStream,
    load: LoadStream,
}

impl PatientOrchestrator {
    /// Validates the whole configuration; nothing is generated on error
    pub fn new(config: FixtureConfig) -> FixtureResult<Self> {
        config.validate()?;
        let reference = config.generation.reference_instant()?;
        let channels = config.channels.clone();

        Ok(Self {
            seeder: StreamSeeder::new(config.generation.seed),
            reference,
            heart_rate: HeartRateStream::new(channels.heart_rate),
            movement: MovementStream::new(channels.movement),
            blood_oxygen: BloodOxygenStream::new(channels.blood_oxygen),
            temperature: TemperatureStream::new(channels.temperature),
            load: LoadStream::new(channels.load),
            config,
        })
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    pub fn reference(&self) -> DateTime<Utc> {
        self.reference
    }

    /// Generates all five channels of one patient
    pub fn generate_patient(&self, patient: &PatientProfile) -> PatientDataset {
        let started = Instant::now();
        info!(
            patient = %patient.id,
            pattern = %patient.activity_pattern,
            duration_hours = patient.duration_hours,
            "generating patient"
        );

        let dataset = PatientDataset {
            patient_id: patient.id.clone(),
            activity_pattern: patient.activity_pattern,
            heart_rate: self.run_channel(&self.heart_rate, patient),
            movement: self.run_channel(&self.movement, patient),
            blood_oxygen: self.run_channel(&self.blood_oxygen, patient),
            temperature: self.run_channel(&self.temperature, patient),
            load: self.run_channel(&self.load, patient),
        };

        info!(
            patient = %patient.id,
            records = dataset.total_records(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "patient generated"
        );
        dataset
    }

    fn run_channel<S: SensorStream>(&self, generator: &S, patient: &PatientProfile) -> ChannelStream<S::Record> {
        let channel = generator.channel();
        let mut rng = self.seeder.stream(&patient.id, channel);
        let stream = generator.generate(patient, &self.reference, &mut rng);

        debug!(
            patient = %patient.id,
            channel = %channel,
            records = stream.len(),
            faults = stream.fault_count,
            drift = stream.drift.rate(),
            "channel generated"
        );
        stream
    }

    /// Every configured patient, in configuration order
    pub fn generate_all(&self) -> Vec<PatientDataset> {
        let patients: Vec<&PatientProfile> = self.config.patients.iter().collect();
        self.generate_patients(&patients)
    }

    /// Only the listed patients, in configuration order; an empty filter
    /// selects everyone
    pub fn generate_selected(&self, ids: &[String]) -> FixtureResult<Vec<PatientDataset>> {
        let patients = self.select_patients(ids)?;
        Ok(self.generate_patients(&patients))
    }

    /// Resolves a patient filter against the configuration
    pub fn select_patients(&self, ids: &[String]) -> FixtureResult<Vec<&PatientProfile>> {
        if let Some(unknown) = ids.iter().find(|id| self.config.patient(id).is_none()) {
            return Err(FixtureError::configuration(
                error_context!("orchestrator", "select_patients"),
                format!("unknown patient '{}'", unknown),
            ));
        }

        Ok(self
            .config
            .patients
            .iter()
            .filter(|patient| ids.is_empty() || ids.contains(&patient.id))
            .collect())
    }

    fn generate_patients(&self, patients: &[&PatientProfile]) -> Vec<PatientDataset> {
        if self.config.generation.parallel {
            debug!(patients = patients.len(), "generating on the rayon pool");
            patients.par_iter().map(|patient| self.generate_patient(patient)).collect()
        } else {
            patients.iter().map(|patient| self.generate_patient(patient)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::ChannelSchedule;

    fn quick_patient(id: &str) -> PatientProfile {
        PatientProfile {
            id: id.to_string(),
            activity_pattern: ActivityPattern::Resting,
            duration_hours: 0.05,
            heart_rate: ChannelSchedule::new(0.0, &[(30.0, 20.0)]),
            movement: ChannelSchedule::new(10.0, &[]),
            blood_oxygen: ChannelSchedule::new(5.0, &[]),
            temperature: ChannelSchedule::new(-60.0, &[]),
            load: ChannelSchedule::new(12.0, &[]),
        }
    }

    fn quick_config() -> FixtureConfig {
        FixtureConfig {
            patients: vec![quick_patient("patient_a"), quick_patient("patient_b")],
            ..FixtureConfig::default()
        }
    }

    #[test]
    fn test_descriptors_follow_record_fields() {
        let descriptors = PatientDataset::descriptors();
        assert_eq!(descriptors[0].file_name, "heart_rate.csv");
        assert_eq!(descriptors[0].fields, &["timestamp", "bpm", "confidence"]);
        assert_eq!(descriptors[1].format, OutputFormat::Json);
        assert_eq!(descriptors[3].fields, &["recorded_at", "temp_celsius", "ambient_temp"]);
        assert_eq!(descriptors[4].channel, SensorChannel::Load);
    }

    #[test]
    fn test_invalid_config_rejected_before_generation() {
        let mut config = quick_config();
        config.patients[0].duration_hours = -1.0;
        let err = PatientOrchestrator::new(config).err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_generate_all_in_order() {
        let orchestrator = PatientOrchestrator::new(quick_config()).unwrap();
        let datasets = orchestrator.generate_all();

        assert_eq!(datasets.len(), 2);
        assert_eq!(datasets[0].patient_id, "patient_a");
        assert_eq!(datasets[1].patient_id, "patient_b");
        assert!(datasets[0].heart_rate.len() > 100);
        assert!(datasets[0].total_records() > datasets[0].heart_rate.len());
        // Same profile, different id: different streams
        assert_ne!(datasets[0].heart_rate, datasets[1].heart_rate);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = PatientOrchestrator::new(quick_config()).unwrap().generate_all();

        let mut config = quick_config();
        config.generation.parallel = true;
        let parallel = PatientOrchestrator::new(config).unwrap().generate_all();

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_select_patients() {
        let orchestrator = PatientOrchestrator::new(quick_config()).unwrap();

        let selected = orchestrator.select_patients(&["patient_b".to_string()]).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "patient_b");

        assert_eq!(orchestrator.select_patients(&[]).unwrap().len(), 2);

        let err = orchestrator.select_patients(&["patient_z".to_string()]).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("patient_z"));
    }
}
