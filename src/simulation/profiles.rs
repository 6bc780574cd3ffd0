//! Patient session configurations and the built-in reference patients
//! Location: src/simulation/profiles.rs

use super::artifact_injection::Gap;
use super::physiology::ActivityPattern;
use super::records::SensorChannel;
use crate::config::constants::generation::SECONDS_PER_HOUR;
use crate::utils::time::checked_offset_by_seconds;
use crate::utils::validation::{
    validate_non_negative, validate_positive, ValidationError, ValidationResult,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Slack around a channel's timeline for fixed-zone conversion
const TIMELINE_MARGIN_S: f64 = 86_400.0;

/// Start offset and blackout windows of one channel
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChannelSchedule {
    /// Signed seconds relative to the shared reference instant
    pub offset_seconds: f64,
    pub gaps: Vec<Gap>,
}

impl ChannelSchedule {
    pub fn new(offset_seconds: f64, gaps: &[(f64, f64)]) -> Self {
        Self {
            offset_seconds,
            gaps: gaps.iter().copied().map(Gap::from).collect(),
        }
    }

    /// Sum of all gap durations in seconds
    pub fn total_gap_seconds(&self) -> f64 {
        self.gaps.iter().map(|gap| gap.duration_s).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PatientProfile {
    pub id: String,
    pub activity_pattern: ActivityPattern,
    pub duration_hours: f64,
    #[serde(default)]
    pub heart_rate: ChannelSchedule,
    #[serde(default)]
    pub movement: ChannelSchedule,
    #[serde(default)]
    pub blood_oxygen: ChannelSchedule,
    #[serde(default)]
    pub temperature: ChannelSchedule,
    #[serde(default)]
    pub load: ChannelSchedule,
}

impl PatientProfile {
    /// Morning routine with a temperature patch started fifteen minutes early
    pub fn patient_001() -> Self {
        Self {
            id: "patient_001".to_string(),
            activity_pattern: ActivityPattern::MorningRoutine,
            duration_hours: 2.5,
            heart_rate: ChannelSchedule::new(0.0, &[(1200.0, 420.0), (4200.0, 180.0), (6300.0, 540.0)]),
            movement: ChannelSchedule::new(443.0, &[(800.0, 300.0), (2400.0, 600.0), (5100.0, 240.0)]),
            blood_oxygen: ChannelSchedule::new(225.0, &[(1800.0, 1200.0), (5400.0, 300.0)]),
            temperature: ChannelSchedule::new(-900.0, &[(3000.0, 180.0)]),
            load: ChannelSchedule::new(728.0, &[(900.0, 480.0), (3600.0, 360.0)]),
        }
    }

    /// Three hour exercise session with a fifteen minute heart rate blackout
    pub fn patient_002() -> Self {
        Self {
            id: "patient_002".to_string(),
            activity_pattern: ActivityPattern::ExerciseSession,
            duration_hours: 3.0,
            heart_rate: ChannelSchedule::new(0.0, &[(2100.0, 600.0), (5400.0, 900.0), (8400.0, 300.0)]),
            movement: ChannelSchedule::new(942.0, &[(1500.0, 180.0), (4800.0, 720.0), (7200.0, 240.0)]),
            blood_oxygen: ChannelSchedule::new(310.0, &[(3000.0, 480.0), (6600.0, 600.0)]),
            temperature: ChannelSchedule::new(-480.0, &[(4200.0, 300.0), (7800.0, 180.0)]),
            load: ChannelSchedule::new(150.0, &[(1800.0, 240.0), (5400.0, 420.0)]),
        }
    }

    /// Resting patient whose oximeter starts more than twenty minutes late
    pub fn patient_003() -> Self {
        Self {
            id: "patient_003".to_string(),
            activity_pattern: ActivityPattern::Resting,
            duration_hours: 2.0,
            heart_rate: ChannelSchedule::new(0.0, &[(1500.0, 300.0), (3600.0, 480.0)]),
            movement: ChannelSchedule::new(255.0, &[(900.0, 420.0), (2700.0, 180.0), (4500.0, 360.0)]),
            blood_oxygen: ChannelSchedule::new(1350.0, &[(600.0, 540.0)]),
            temperature: ChannelSchedule::new(-1500.0, &[(1800.0, 240.0), (4200.0, 180.0)]),
            load: ChannelSchedule::new(525.0, &[(2100.0, 300.0), (4800.0, 240.0)]),
        }
    }

    pub fn builtin() -> Vec<Self> {
        vec![Self::patient_001(), Self::patient_002(), Self::patient_003()]
    }

    pub fn schedule(&self, channel: SensorChannel) -> &ChannelSchedule {
        match channel {
            SensorChannel::HeartRate => &self.heart_rate,
            SensorChannel::Movement => &self.movement,
            SensorChannel::BloodOxygen => &self.blood_oxygen,
            SensorChannel::Temperature => &self.temperature,
            SensorChannel::Load => &self.load,
        }
    }

    pub fn schedule_mut(&mut self, channel: SensorChannel) -> &mut ChannelSchedule {
        match channel {
            SensorChannel::HeartRate => &mut self.heart_rate,
            SensorChannel::Movement => &mut self.movement,
            SensorChannel::BloodOxygen => &mut self.blood_oxygen,
            SensorChannel::Temperature => &mut self.temperature,
            SensorChannel::Load => &mut self.load,
        }
    }

    /// Session length in whole seconds, truncated
    pub fn nominal_duration_s(&self) -> f64 {
        (self.duration_hours * SECONDS_PER_HOUR).trunc()
    }

    /// The temperature patch runs from its early start until the margin
    /// after the session ends
    pub fn temperature_duration_s(&self, extension_margin_s: f64) -> f64 {
        (self.duration_hours * SECONDS_PER_HOUR + self.temperature.offset_seconds.abs() + extension_margin_s).trunc()
    }

    pub fn validate(&self) -> ValidationResult<()> {
        let duration_field = format!("patients.{}.duration_hours", self.id);
        validate_positive(&duration_field, self.duration_hours)?;
        if self.nominal_duration_s() < 1.0 {
            return Err(ValidationError::OutOfRange {
                field: duration_field,
                value: self.duration_hours.to_string(),
                min: format!("{} (one second)", 1.0 / SECONDS_PER_HOUR),
                max: "finite".to_string(),
            });
        }

        for channel in SensorChannel::ALL {
            let schedule = self.schedule(channel);
            let prefix = format!("patients.{}.{}", self.id, channel.name());
            if !schedule.offset_seconds.is_finite() {
                return Err(ValidationError::InvalidFormat {
                    field: format!("{}.offset_seconds", prefix),
                    value: schedule.offset_seconds.to_string(),
                    expected: "a finite number of seconds".to_string(),
                });
            }
            for (index, gap) in schedule.gaps.iter().enumerate() {
                validate_non_negative(&format!("{}.gaps[{}].start", prefix, index), gap.start_s)?;
                validate_non_negative(&format!("{}.gaps[{}].duration", prefix, index), gap.duration_s)?;
            }
        }

        Ok(())
    }

    /// Every instant `channel` can report, from its start through `span_s`
    /// seconds later, must be representable as a timestamp.
    pub fn validate_timeline(
        &self,
        channel: SensorChannel,
        reference: &DateTime<Utc>,
        span_s: f64,
    ) -> ValidationResult<()> {
        let offset = self.schedule(channel).offset_seconds;
        let earliest = offset - TIMELINE_MARGIN_S;
        let latest = offset + span_s + TIMELINE_MARGIN_S;

        for bound in [earliest, latest] {
            if checked_offset_by_seconds(reference, bound).is_none() {
                return Err(ValidationError::InvalidFormat {
                    field: format!("patients.{}.{}.offset_seconds", self.id, channel.name()),
                    value: offset.to_string(),
                    expected: format!(
                        "an offset whose {} s timeline stays within the calendar range",
                        span_s
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_patients_are_valid() {
        let patients = PatientProfile::builtin();
        assert_eq!(patients.len(), 3);
        for patient in &patients {
            assert!(patient.validate().is_ok(), "{} invalid", patient.id);
            assert_eq!(patient.heart_rate.offset_seconds, 0.0);
        }
    }

    #[test]
    fn test_durations() {
        let p1 = PatientProfile::patient_001();
        assert_eq!(p1.nominal_duration_s(), 9000.0);
        assert_eq!(p1.temperature_duration_s(600.0), 9000.0 + 900.0 + 600.0);

        let p3 = PatientProfile::patient_003();
        assert_eq!(p3.temperature_duration_s(600.0), 7200.0 + 1500.0 + 600.0);
    }

    #[test]
    fn test_schedule_lookup() {
        let p2 = PatientProfile::patient_002();
        assert_eq!(p2.schedule(SensorChannel::Movement).offset_seconds, 942.0);
        assert_eq!(p2.schedule(SensorChannel::HeartRate).total_gap_seconds(), 1800.0);
        assert_eq!(p2.schedule(SensorChannel::Temperature).gaps[1], Gap::new(7800.0, 180.0));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut patient = PatientProfile::patient_003();
        patient.duration_hours = 0.0;
        assert!(matches!(patient.validate(), Err(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn test_sub_second_duration_rejected() {
        let mut patient = PatientProfile::patient_003();
        patient.duration_hours = 0.0002;
        assert_eq!(patient.nominal_duration_s(), 0.0);

        let err = patient.validate().unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
        assert!(err.to_string().contains("patients.patient_003.duration_hours"));

        patient.duration_hours = 0.001;
        assert_eq!(patient.nominal_duration_s(), 3.0);
        assert!(patient.validate().is_ok());
    }

    #[test]
    fn test_timeline_beyond_calendar_rejected() {
        let reference = crate::utils::time::parse_reference_time("2024-03-15T08:00:00Z").unwrap();
        let mut patient = PatientProfile::patient_001();
        assert!(patient
            .validate_timeline(SensorChannel::Movement, &reference, patient.nominal_duration_s())
            .is_ok());

        patient.movement.offset_seconds = 1e13;
        let err = patient
            .validate_timeline(SensorChannel::Movement, &reference, patient.nominal_duration_s())
            .unwrap_err();
        assert!(err.to_string().contains("patients.patient_001.movement.offset_seconds"));

        // A representable start with an end past the calendar range
        let near_limit = PatientProfile::patient_001();
        assert!(near_limit
            .validate_timeline(SensorChannel::HeartRate, &reference, 1e13)
            .is_err());
    }

    #[test]
    fn test_negative_gap_duration_rejected() {
        let mut patient = PatientProfile::patient_001();
        patient.schedule_mut(SensorChannel::Load).gaps.push(Gap::new(100.0, -5.0));
        let err = patient.validate().unwrap_err();
        assert!(err.to_string().contains("patients.patient_001.load.gaps[2].duration"));
    }

    #[test]
    fn test_profile_from_toml() {
        let patient: PatientProfile = toml::from_str(
            r#"
            id = "patient_900"
            activity_pattern = "resting"
            duration_hours = 0.5

            [heart_rate]
            gaps = [[60.0, 30.0]]

            [temperature]
            offset_seconds = -120.0
            "#,
        )
        .unwrap();

        assert_eq!(patient.heart_rate.gaps, vec![Gap::new(60.0, 30.0)]);
        assert_eq!(patient.temperature.offset_seconds, -120.0);
        assert!(patient.load.gaps.is_empty());
        assert!(patient.validate().is_ok());
    }
}
