//! Per-sensor stream generators
//! Location: src/simulation/signal_generator.rs
//!
//! Each generator walks its own jittered tick schedule through the
//! [`ImperfectionLayer`], asks the [`PatternModel`] for the clean value,
//! runs the channel's ordered fault rules and encodes the timestamp in the
//! channel's format.

use super::artifact_injection::{ClockDrift, CorruptionRules, ImperfectionLayer, StepRange};
use super::config::{
    BloodOxygenProfile, HeartRateProfile, LoadProfile, MovementProfile, TemperatureProfile,
};
use super::noise_models::SimRng;
use super::physiology::PatternModel;
use super::profiles::{ChannelSchedule, PatientProfile};
use super::records::{
    ActivityType, BloodOxygenRecord, ChannelRecord, Emission, HeartRateRecord, LoadRecord,
    MovementRecord, PulseQuality, SensorChannel, TemperatureRecord,
};
use super::timestamps::{
    blood_oxygen_timestamp, fixed_zone, heart_rate_timestamp, load_timestamp, movement_timestamp,
    temperature_timestamp,
};
use crate::config::constants::{blood_oxygen, physiology, sentinels, temperature};
use crate::utils::conversion::round_to;
use crate::utils::time::offset_by_seconds;
use chrono::{DateTime, Utc};

/// Ordered emissions of one channel for one patient
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStream<R> {
    pub emissions: Vec<Emission<R>>,
    pub drift: ClockDrift,
    /// Records rewritten by a fault rule
    pub fault_count: usize,
}

impl<R> ChannelStream<R> {
    pub fn len(&self) -> usize {
        self.emissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emissions.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &R> + '_ {
        self.emissions.iter().map(|emission| &emission.record)
    }

    pub fn elapsed_times(&self) -> impl Iterator<Item = f64> + '_ {
        self.emissions.iter().map(|emission| emission.elapsed_s)
    }
}

/// Generates one channel of one patient session
pub trait SensorStream {
    type Record: ChannelRecord;

    fn channel(&self) -> SensorChannel {
        <Self::Record as ChannelRecord>::CHANNEL
    }

    /// Runs the whole channel session. `reference` is the shared instant the
    /// channel offset is measured from.
    fn generate(
        &self,
        patient: &PatientProfile,
        reference: &DateTime<Utc>,
        rng: &mut SimRng,
    ) -> ChannelStream<Self::Record>;
}

/// Sampling and suppression settings common to every channel
#[derive(Debug, Clone, Copy)]
struct ChannelTiming {
    step: StepRange,
    dropout_probability: f64,
    clock_drift_max: f64,
}

/// Shared tick loop: builds the imperfection layer (drawing the clock drift)
/// and collects the records `emit` produces
fn run_ticks<R, F>(
    schedule: &ChannelSchedule,
    duration_s: f64,
    timing: ChannelTiming,
    rng: &mut SimRng,
    emit: F,
) -> (Vec<Emission<R>>, ClockDrift)
where
    F: FnMut(f64, f64, &mut SimRng) -> R,
{
    let layer = ImperfectionLayer::new(
        &schedule.gaps,
        timing.dropout_probability,
        timing.step,
        timing.clock_drift_max,
        rng,
    );
    let emissions = layer.drive(duration_s, rng, emit);
    (emissions, layer.drift())
}

fn channel_start(reference: &DateTime<Utc>, schedule: &ChannelSchedule) -> DateTime<Utc> {
    offset_by_seconds(reference, schedule.offset_seconds)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartRateFault {
    /// Strap reports `-1` bpm with zero confidence
    SensorError,
    /// Plausible bpm with low confidence
    WeakContact,
}

pub struct HeartRateStream {
    profile: HeartRateProfile,
    faults: CorruptionRules<HeartRateRecord, HeartRateFault>,
}

impl HeartRateStream {
    pub fn new(profile: HeartRateProfile) -> Self {
        let faults = CorruptionRules::<HeartRateRecord, HeartRateFault>::new()
            .with_rule(HeartRateFault::SensorError, profile.sensor_error_probability, |record, _| {
                record.bpm = sentinels::HEART_RATE_ERROR_BPM;
                record.confidence = 0.0;
            })
            // Confidence is drawn after the rules run
            .with_rule(HeartRateFault::WeakContact, profile.weak_contact_probability, |_, _| {});
        Self { profile, faults }
    }
}

impl SensorStream for HeartRateStream {
    type Record = HeartRateRecord;

    fn generate(
        &self,
        patient: &PatientProfile,
        reference: &DateTime<Utc>,
        rng: &mut SimRng,
    ) -> ChannelStream<HeartRateRecord> {
        let model = PatternModel::new(patient.activity_pattern);
        let start = channel_start(reference, &patient.heart_rate);
        let timing = ChannelTiming {
            step: self.profile.step,
            dropout_probability: self.profile.dropout_probability,
            clock_drift_max: self.profile.clock_drift_max,
        };
        let (weak_lo, weak_hi) = self.profile.weak_confidence;
        let (normal_lo, normal_hi) = self.profile.normal_confidence;
        let mut fault_count = 0;

        let (emissions, drift) = run_ticks(
            &patient.heart_rate,
            patient.nominal_duration_s(),
            timing,
            rng,
            |elapsed_s, reported_s, rng| {
                let mut record = HeartRateRecord {
                    timestamp: heart_rate_timestamp(&start, reported_s),
                    bpm: model.heart_rate(elapsed_s, rng),
                    confidence: 0.0,
                };
                match self.faults.apply(&mut record, rng) {
                    Some(HeartRateFault::SensorError) => fault_count += 1,
                    Some(HeartRateFault::WeakContact) => {
                        fault_count += 1;
                        record.confidence = round_to(rng.uniform(weak_lo, weak_hi), 2);
                    }
                    None => record.confidence = round_to(rng.uniform(normal_lo, normal_hi), 2),
                }
                record
            },
        );

        ChannelStream {
            emissions,
            drift,
            fault_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementFault {
    /// x axis and magnitude lost
    DroppedAxis,
    /// Every value replaced by the corrupt sentinel
    CorruptFrame,
}

pub struct MovementStream {
    profile: MovementProfile,
    faults: CorruptionRules<MovementRecord, MovementFault>,
}

impl MovementStream {
    pub fn new(profile: MovementProfile) -> Self {
        let faults = CorruptionRules::<MovementRecord, MovementFault>::new()
            .with_rule(MovementFault::DroppedAxis, profile.dropped_axis_probability, |record, _| {
                record.x = None;
                record.magnitude = None;
            })
            .with_rule(MovementFault::CorruptFrame, profile.corrupt_frame_probability, |record, _| {
                let corrupt = Some(sentinels::MOVEMENT_CORRUPT_VALUE);
                record.x = corrupt;
                record.y = corrupt;
                record.z = corrupt;
                record.magnitude = corrupt;
            });
        Self { profile, faults }
    }
}

impl SensorStream for MovementStream {
    type Record = MovementRecord;

    fn generate(
        &self,
        patient: &PatientProfile,
        reference: &DateTime<Utc>,
        rng: &mut SimRng,
    ) -> ChannelStream<MovementRecord> {
        let model = PatternModel::new(patient.activity_pattern);
        let start = channel_start(reference, &patient.movement);
        let timing = ChannelTiming {
            step: self.profile.step,
            dropout_probability: self.profile.dropout_probability,
            clock_drift_max: self.profile.clock_drift_max,
        };
        let mut fault_count = 0;

        let (emissions, drift) = run_ticks(
            &patient.movement,
            patient.nominal_duration_s(),
            timing,
            rng,
            |elapsed_s, reported_s, rng| {
                let accel = model.movement(elapsed_s, rng);
                let mut record = MovementRecord {
                    ts: movement_timestamp(&start, reported_s),
                    x: Some(accel.x),
                    y: Some(accel.y),
                    z: Some(accel.z),
                    magnitude: Some(accel.magnitude),
                };
                if self.faults.apply(&mut record, rng).is_some() {
                    fault_count += 1;
                }
                record
            },
        );

        ChannelStream {
            emissions,
            drift,
            fault_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BloodOxygenFault {
    ImplausiblyLow,
    ImpossiblyHigh,
}

pub struct BloodOxygenStream {
    profile: BloodOxygenProfile,
    faults: CorruptionRules<BloodOxygenRecord, BloodOxygenFault>,
}

impl BloodOxygenStream {
    pub fn new(profile: BloodOxygenProfile) -> Self {
        let faults = CorruptionRules::<BloodOxygenRecord, BloodOxygenFault>::new()
            .with_rule(BloodOxygenFault::ImplausiblyLow, profile.low_reading_probability, |record, rng| {
                let (lo, hi) = blood_oxygen::LOW_READING_RANGE;
                record.spo2 = round_to(rng.uniform(lo, hi), 1);
                record.pulse_quality = PulseQuality::Poor;
            })
            .with_rule(BloodOxygenFault::ImpossiblyHigh, profile.high_reading_probability, |record, rng| {
                let (lo, hi) = blood_oxygen::HIGH_READING_RANGE;
                record.spo2 = round_to(rng.uniform(lo, hi), 1);
                record.pulse_quality = PulseQuality::Poor;
            });
        Self { profile, faults }
    }
}

impl SensorStream for BloodOxygenStream {
    type Record = BloodOxygenRecord;

    fn generate(
        &self,
        patient: &PatientProfile,
        reference: &DateTime<Utc>,
        rng: &mut SimRng,
    ) -> ChannelStream<BloodOxygenRecord> {
        let model = PatternModel::new(patient.activity_pattern);
        let start = channel_start(reference, &patient.blood_oxygen);
        let timing = ChannelTiming {
            step: self.profile.step,
            dropout_probability: self.profile.dropout_probability,
            clock_drift_max: self.profile.clock_drift_max,
        };
        let mut fault_count = 0;

        let (emissions, drift) = run_ticks(
            &patient.blood_oxygen,
            patient.nominal_duration_s(),
            timing,
            rng,
            |elapsed_s, reported_s, rng| {
                let spo2 = model.blood_oxygen(elapsed_s, rng);
                let mut record = BloodOxygenRecord {
                    time: blood_oxygen_timestamp(&start, reported_s),
                    spo2,
                    pulse_quality: PulseQuality::from_spo2(spo2),
                };
                if self.faults.apply(&mut record, rng).is_some() {
                    fault_count += 1;
                }
                record
            },
        );

        ChannelStream {
            emissions,
            drift,
            fault_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureFault {
    /// Pressure on the patch reads hot
    ContactSpike,
    /// Patch lifting off the skin reads cold
    LiftOff,
}

pub struct TemperatureStream {
    profile: TemperatureProfile,
    faults: CorruptionRules<TemperatureRecord, TemperatureFault>,
}

impl TemperatureStream {
    pub fn new(profile: TemperatureProfile) -> Self {
        let faults = CorruptionRules::<TemperatureRecord, TemperatureFault>::new()
            .with_rule(TemperatureFault::ContactSpike, profile.spike_probability, |record, rng| {
                let (lo, hi) = temperature::SPIKE_RANGE_C;
                record.temp_celsius = round_to(record.temp_celsius + rng.uniform(lo, hi), 2);
            })
            .with_rule(TemperatureFault::LiftOff, profile.lift_off_probability, |record, rng| {
                let (lo, hi) = temperature::LIFT_OFF_RANGE_C;
                record.temp_celsius = round_to(record.temp_celsius - rng.uniform(lo, hi), 2);
            });
        Self { profile, faults }
    }
}

impl SensorStream for TemperatureStream {
    type Record = TemperatureRecord;

    fn generate(
        &self,
        patient: &PatientProfile,
        reference: &DateTime<Utc>,
        rng: &mut SimRng,
    ) -> ChannelStream<TemperatureRecord> {
        let model = PatternModel::new(patient.activity_pattern);
        let start = channel_start(reference, &patient.temperature);
        let zone = fixed_zone(self.profile.utc_offset_hours);
        let timing = ChannelTiming {
            step: self.profile.step,
            dropout_probability: self.profile.dropout_probability,
            clock_drift_max: self.profile.clock_drift_max,
        };
        let mut fault_count = 0;

        let (ambient_lo, ambient_hi) = physiology::AMBIENT_TEMP_INITIAL_RANGE;
        let mut ambient = round_to(rng.uniform(ambient_lo, ambient_hi), 1);

        let (emissions, drift) = run_ticks(
            &patient.temperature,
            patient.temperature_duration_s(self.profile.extension_margin_s),
            timing,
            rng,
            |elapsed_s, reported_s, rng| {
                let mut record = TemperatureRecord {
                    recorded_at: temperature_timestamp(&start, reported_s, &zone),
                    temp_celsius: model.skin_temperature(elapsed_s, rng),
                    ambient_temp: 0.0,
                };
                if self.faults.apply(&mut record, rng).is_some() {
                    fault_count += 1;
                }

                ambient += rng.uniform(-physiology::AMBIENT_TEMP_STEP, physiology::AMBIENT_TEMP_STEP);
                ambient = ambient.clamp(physiology::AMBIENT_TEMP_MIN_C, physiology::AMBIENT_TEMP_MAX_C);
                record.ambient_temp = round_to(ambient, 1);
                record
            },
        );

        ChannelStream {
            emissions,
            drift,
            fault_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFault {
    /// Score `-1` with activity `unknown`
    SensorError,
}

pub struct LoadStream {
    profile: LoadProfile,
    faults: CorruptionRules<LoadRecord, LoadFault>,
}

impl LoadStream {
    pub fn new(profile: LoadProfile) -> Self {
        let faults = CorruptionRules::<LoadRecord, LoadFault>::new().with_rule(
            LoadFault::SensorError,
            profile.sensor_error_probability,
            |record, _| {
                record.load_score = sentinels::LOAD_ERROR_SCORE;
                record.activity_type = ActivityType::Unknown;
            },
        );
        Self { profile, faults }
    }
}

impl SensorStream for LoadStream {
    type Record = LoadRecord;

    fn generate(
        &self,
        patient: &PatientProfile,
        reference: &DateTime<Utc>,
        rng: &mut SimRng,
    ) -> ChannelStream<LoadRecord> {
        let model = PatternModel::new(patient.activity_pattern);
        let start = channel_start(reference, &patient.load);
        let timing = ChannelTiming {
            step: self.profile.step,
            dropout_probability: self.profile.dropout_probability,
            clock_drift_max: self.profile.clock_drift_max,
        };
        let weights = self.profile.format_weights;
        let hr_derived_probability = self.profile.hr_derived_probability;
        let mut fault_count = 0;

        let (emissions, drift) = run_ticks(
            &patient.load,
            patient.nominal_duration_s(),
            timing,
            rng,
            |elapsed_s, reported_s, rng| {
                // Same-tick heart rate from the load tracker's own stream
                let heart_rate = model.heart_rate(elapsed_s, rng);
                let load_score = model.load_score(elapsed_s, heart_rate, rng);
                let mut record = LoadRecord {
                    timestamp: load_timestamp(&start, reported_s, weights, rng),
                    load_score,
                    activity_type: ActivityType::from_score(load_score),
                    hr_derived: false,
                };
                if self.faults.apply(&mut record, rng).is_some() {
                    fault_count += 1;
                }
                record.hr_derived = rng.chance(hr_derived_probability);
                record
            },
        );

        ChannelStream {
            emissions,
            drift,
            fault_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::artifact_injection::Gap;
    use crate::simulation::physiology::ActivityPattern;
    use crate::utils::time::parse_reference_time;

    fn reference() -> DateTime<Utc> {
        parse_reference_time("2024-03-15T08:00:00Z").unwrap()
    }

    fn short_patient(pattern: ActivityPattern, hours: f64) -> PatientProfile {
        PatientProfile {
            id: "patient_test".to_string(),
            activity_pattern: pattern,
            duration_hours: hours,
            heart_rate: ChannelSchedule::new(0.0, &[(1200.0, 420.0)]),
            movement: ChannelSchedule::new(443.0, &[]),
            blood_oxygen: ChannelSchedule::new(225.0, &[(60.0, 120.0)]),
            temperature: ChannelSchedule::new(-900.0, &[]),
            load: ChannelSchedule::new(728.0, &[]),
        }
    }

    #[test]
    fn test_heart_rate_excludes_gap_and_stays_in_duration() {
        let patient = short_patient(ActivityPattern::Resting, 2.5);
        let mut rng = SimRng::seed_from_u64(42);
        let stream = HeartRateStream::new(HeartRateProfile::default()).generate(&patient, &reference(), &mut rng);

        assert!(stream.len() > 8_000, "only {} heart rate records", stream.len());
        let gap = Gap::new(1200.0, 420.0);
        let mut previous = -1.0;
        for elapsed in stream.elapsed_times() {
            assert!(!gap.contains(elapsed), "record inside gap at {}", elapsed);
            assert!(elapsed < 9000.0);
            assert!(elapsed > previous);
            previous = elapsed;
        }
        assert!(stream.elapsed_times().any(|t| (1100.0..1200.0).contains(&t)));
        assert!(stream.elapsed_times().any(|t| (1620.0..1720.0).contains(&t)));
    }

    #[test]
    fn test_heart_rate_sentinels_are_consistent() {
        let patient = short_patient(ActivityPattern::MorningRoutine, 1.0);
        let mut profile = HeartRateProfile::default();
        profile.sensor_error_probability = 0.2;
        let mut rng = SimRng::seed_from_u64(1);
        let stream = HeartRateStream::new(profile).generate(&patient, &reference(), &mut rng);

        assert!(stream.fault_count > 0);
        for record in stream.records() {
            if record.bpm == -1 {
                assert_eq!(record.confidence, 0.0);
            } else {
                assert!((45..=185).contains(&record.bpm));
                assert!((0.2..=0.99).contains(&record.confidence));
            }
        }
    }

    #[test]
    fn test_clock_drift_only_moves_timestamps() {
        let patient = short_patient(ActivityPattern::Resting, 1.0);
        let mut profile = HeartRateProfile::default();
        profile.clock_drift_max = 0.01;
        let mut rng = SimRng::seed_from_u64(3);
        let stream = HeartRateStream::new(profile).generate(&patient, &reference(), &mut rng);

        let rate = stream.drift.rate();
        assert!(rate != 0.0 && rate.abs() <= 0.01);
        for emission in &stream.emissions {
            let reported = DateTime::parse_from_rfc3339(&emission.record.timestamp).unwrap();
            let offset_s = (reported.timestamp_micros() - reference().timestamp_micros()) as f64 / 1e6;
            let expected = emission.elapsed_s * (1.0 + rate);
            assert!((offset_s - expected).abs() < 1e-5, "{} vs {}", offset_s, expected);
        }
        assert!(stream.elapsed_times().all(|t| t < 3600.0));
    }

    #[test]
    fn test_zero_drift_bound_disables_drift() {
        let patient = short_patient(ActivityPattern::Resting, 0.2);
        let mut rng = SimRng::seed_from_u64(4);
        let stream = MovementStream::new(MovementProfile::default()).generate(&patient, &reference(), &mut rng);
        assert_eq!(stream.drift, ClockDrift::NONE);
    }

    #[test]
    fn test_movement_fault_shapes() {
        let patient = short_patient(ActivityPattern::ExerciseSession, 0.5);
        let mut profile = MovementProfile::default();
        profile.dropped_axis_probability = 0.05;
        profile.corrupt_frame_probability = 0.05;
        let mut rng = SimRng::seed_from_u64(5);
        let stream = MovementStream::new(profile).generate(&patient, &reference(), &mut rng);

        let start_ms = reference().timestamp_millis() + 443_000;
        let (mut dropped, mut corrupt) = (0, 0);
        for record in stream.records() {
            assert!(record.ts >= start_ms);
            match (record.x, record.magnitude) {
                (None, None) => {
                    dropped += 1;
                    assert!(record.y.is_some() && record.z.is_some());
                }
                (Some(x), Some(m)) if x == 999.99 => {
                    corrupt += 1;
                    assert_eq!(m, 999.99);
                    assert_eq!(record.y, Some(999.99));
                }
                (Some(_), Some(_)) => {}
                other => panic!("unexpected movement shape {:?}", other),
            }
        }
        assert!(dropped > 0 && corrupt > 0);
        assert_eq!(dropped + corrupt, stream.fault_count);
    }

    #[test]
    fn test_blood_oxygen_quality_consistent() {
        let patient = short_patient(ActivityPattern::ExerciseSession, 3.0);
        let mut profile = BloodOxygenProfile::default();
        profile.low_reading_probability = 0.05;
        profile.high_reading_probability = 0.05;
        let mut rng = SimRng::seed_from_u64(6);
        let stream = BloodOxygenStream::new(profile).generate(&patient, &reference(), &mut rng);

        let start_s = reference().timestamp() + 225;
        for emission in &stream.emissions {
            let record = &emission.record;
            assert!(!(60.0..180.0).contains(&emission.elapsed_s));
            assert!(record.time >= start_s);
            if (90.0..=100.0).contains(&record.spo2) {
                assert_eq!(record.pulse_quality, PulseQuality::from_spo2(record.spo2));
            } else {
                assert_eq!(record.pulse_quality, PulseQuality::Poor);
                assert!((65.0..=84.0).contains(&record.spo2) || (101.0..=110.0).contains(&record.spo2));
            }
        }
    }

    #[test]
    fn test_temperature_runs_long_and_reports_est() {
        let patient = short_patient(ActivityPattern::Resting, 0.5);
        let mut profile = TemperatureProfile::default();
        profile.dropout_probability = 0.0;
        let mut rng = SimRng::seed_from_u64(7);
        let stream = TemperatureStream::new(profile).generate(&patient, &reference(), &mut rng);

        let last = stream.elapsed_times().last().unwrap();
        assert!(last > 1800.0, "temperature stopped at {}", last);
        assert!(last < 1800.0 + 900.0 + 600.0);

        let first = &stream.emissions[0];
        assert_eq!(first.elapsed_s, 0.0);
        assert_eq!(first.record.recorded_at, "2024-03-15T02:45:00-05:00");

        let ambients: Vec<f64> = stream.records().map(|r| r.ambient_temp).collect();
        for pair in ambients.windows(2) {
            assert!((pair[1] - pair[0]).abs() <= 0.11, "ambient jumped {:?}", pair);
        }
        assert!(ambients.iter().all(|a| (18.0..=28.0).contains(a)));
    }

    #[test]
    fn test_load_records() {
        let patient = short_patient(ActivityPattern::MorningRoutine, 2.5);
        let mut rng = SimRng::seed_from_u64(8);
        let stream = LoadStream::new(LoadProfile::default()).generate(&patient, &reference(), &mut rng);

        assert!(stream.len() > 1_000);
        let mut derived = 0;
        for record in stream.records() {
            if record.load_score == -1 {
                assert_eq!(record.activity_type, ActivityType::Unknown);
            } else {
                assert!((0..=100).contains(&record.load_score));
                assert_eq!(record.activity_type, ActivityType::from_score(record.load_score));
            }
            if record.hr_derived {
                derived += 1;
            }
        }
        let share = derived as f64 / stream.len() as f64;
        assert!((0.6..0.8).contains(&share), "hr_derived share {}", share);
    }

    #[test]
    fn test_channel_identity() {
        assert_eq!(HeartRateStream::new(HeartRateProfile::default()).channel(), SensorChannel::HeartRate);
        assert_eq!(LoadStream::new(LoadProfile::default()).channel(), SensorChannel::Load);
    }
}
