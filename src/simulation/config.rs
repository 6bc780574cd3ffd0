//! Per-channel tuning: sampling, suppression and fault probabilities
//! Location: src/simulation/config.rs

use super::artifact_injection::StepRange;
use super::records::SensorChannel;
use crate::config::constants::{blood_oxygen, heart_rate, load, movement, temperature};
use crate::utils::validation::{
    validate_non_negative, validate_probability, validate_step_range, ValidationError,
    ValidationResult,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChannelProfiles {
    pub heart_rate: HeartRateProfile,
    pub movement: MovementProfile,
    pub blood_oxygen: BloodOxygenProfile,
    pub temperature: TemperatureProfile,
    pub load: LoadProfile,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HeartRateProfile {
    pub dropout_probability: f64,
    pub clock_drift_max: f64,
    pub sensor_error_probability: f64,
    pub weak_contact_probability: f64,
    /// Confidence bounds reported under weak skin contact
    pub weak_confidence: (f64, f64),
    pub normal_confidence: (f64, f64),
    pub step: StepRange,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MovementProfile {
    pub dropout_probability: f64,
    pub clock_drift_max: f64,
    pub dropped_axis_probability: f64,
    pub corrupt_frame_probability: f64,
    pub step: StepRange,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BloodOxygenProfile {
    pub dropout_probability: f64,
    pub clock_drift_max: f64,
    pub low_reading_probability: f64,
    pub high_reading_probability: f64,
    pub step: StepRange,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TemperatureProfile {
    pub dropout_probability: f64,
    pub clock_drift_max: f64,
    pub spike_probability: f64,
    pub lift_off_probability: f64,
    /// Run time added after the nominal session on top of the early start
    pub extension_margin_s: f64,
    /// Logger clock zone, whole hours east of UTC
    pub utc_offset_hours: i32,
    pub step: StepRange,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoadProfile {
    pub dropout_probability: f64,
    pub clock_drift_max: f64,
    pub sensor_error_probability: f64,
    pub hr_derived_probability: f64,
    /// Probabilities of the no-ms and with-ms layouts; the slash layout
    /// takes the remainder
    pub format_weights: (f64, f64),
    pub step: StepRange,
}

impl Default for ChannelProfiles {
    fn default() -> Self {
        Self {
            heart_rate: HeartRateProfile::default(),
            movement: MovementProfile::default(),
            blood_oxygen: BloodOxygenProfile::default(),
            temperature: TemperatureProfile::default(),
            load: LoadProfile::default(),
        }
    }
}

impl Default for HeartRateProfile {
    fn default() -> Self {
        Self {
            step: heart_rate::STEP_RANGE_S.into(),
            dropout_probability: heart_rate::DROPOUT_PROBABILITY,
            clock_drift_max: heart_rate::CLOCK_DRIFT_MAX,
            sensor_error_probability: heart_rate::SENSOR_ERROR_PROBABILITY,
            weak_contact_probability: heart_rate::WEAK_CONTACT_PROBABILITY,
            weak_confidence: heart_rate::WEAK_CONFIDENCE_RANGE,
            normal_confidence: heart_rate::NORMAL_CONFIDENCE_RANGE,
        }
    }
}

impl Default for MovementProfile {
    fn default() -> Self {
        Self {
            step: movement::STEP_RANGE_S.into(),
            dropout_probability: movement::DROPOUT_PROBABILITY,
            clock_drift_max: 0.0,
            dropped_axis_probability: movement::DROPPED_AXIS_PROBABILITY,
            corrupt_frame_probability: movement::CORRUPT_FRAME_PROBABILITY,
        }
    }
}

impl Default for BloodOxygenProfile {
    fn default() -> Self {
        Self {
            step: blood_oxygen::STEP_RANGE_S.into(),
            dropout_probability: blood_oxygen::DROPOUT_PROBABILITY,
            clock_drift_max: 0.0,
            low_reading_probability: blood_oxygen::LOW_READING_PROBABILITY,
            high_reading_probability: blood_oxygen::HIGH_READING_PROBABILITY,
        }
    }
}

impl Default for TemperatureProfile {
    fn default() -> Self {
        Self {
            step: temperature::STEP_RANGE_S.into(),
            dropout_probability: temperature::DROPOUT_PROBABILITY,
            clock_drift_max: 0.0,
            spike_probability: temperature::SPIKE_PROBABILITY,
            lift_off_probability: temperature::LIFT_OFF_PROBABILITY,
            extension_margin_s: temperature::EXTENSION_MARGIN_S,
            utc_offset_hours: temperature::UTC_OFFSET_HOURS,
        }
    }
}

impl Default for LoadProfile {
    fn default() -> Self {
        Self {
            step: load::STEP_RANGE_S.into(),
            dropout_probability: load::DROPOUT_PROBABILITY,
            clock_drift_max: 0.0,
            sensor_error_probability: load::SENSOR_ERROR_PROBABILITY,
            hr_derived_probability: load::HR_DERIVED_PROBABILITY,
            format_weights: load::FORMAT_WEIGHTS,
        }
    }
}

/// Checks shared by every channel
fn validate_timing(channel: &str, step: &StepRange, dropout: f64, drift_max: f64) -> ValidationResult<()> {
    validate_step_range(&format!("channels.{}.step", channel), step.min_s, step.max_s)?;
    validate_probability(&format!("channels.{}.dropout_probability", channel), dropout)?;
    validate_non_negative(&format!("channels.{}.clock_drift_max", channel), drift_max)?;
    Ok(())
}

fn validate_unit_range(field: &str, (low, high): (f64, f64)) -> ValidationResult<()> {
    validate_probability(&format!("{}.0", field), low)?;
    validate_probability(&format!("{}.1", field), high)?;
    if high < low {
        return Err(ValidationError::ConstraintViolation {
            fields: vec![format!("{}.0", field), format!("{}.1", field)],
            message: "upper bound below lower bound".to_string(),
        });
    }
    Ok(())
}

impl ChannelProfiles {
    pub fn clock_drift_max(&self, channel: SensorChannel) -> f64 {
        match channel {
            SensorChannel::HeartRate => self.heart_rate.clock_drift_max,
            SensorChannel::Movement => self.movement.clock_drift_max,
            SensorChannel::BloodOxygen => self.blood_oxygen.clock_drift_max,
            SensorChannel::Temperature => self.temperature.clock_drift_max,
            SensorChannel::Load => self.load.clock_drift_max,
        }
    }

    pub fn validate(&self) -> ValidationResult<()> {
        let hr = &self.heart_rate;
        validate_timing("heart_rate", &hr.step, hr.dropout_probability, hr.clock_drift_max)?;
        validate_probability("channels.heart_rate.sensor_error_probability", hr.sensor_error_probability)?;
        validate_probability("channels.heart_rate.weak_contact_probability", hr.weak_contact_probability)?;
        validate_unit_range("channels.heart_rate.weak_confidence", hr.weak_confidence)?;
        validate_unit_range("channels.heart_rate.normal_confidence", hr.normal_confidence)?;

        let mv = &self.movement;
        validate_timing("movement", &mv.step, mv.dropout_probability, mv.clock_drift_max)?;
        validate_probability("channels.movement.dropped_axis_probability", mv.dropped_axis_probability)?;
        validate_probability("channels.movement.corrupt_frame_probability", mv.corrupt_frame_probability)?;

        let spo2 = &self.blood_oxygen;
        validate_timing("blood_oxygen", &spo2.step, spo2.dropout_probability, spo2.clock_drift_max)?;
        validate_probability("channels.blood_oxygen.low_reading_probability", spo2.low_reading_probability)?;
        validate_probability("channels.blood_oxygen.high_reading_probability", spo2.high_reading_probability)?;

        let temp = &self.temperature;
        validate_timing("temperature", &temp.step, temp.dropout_probability, temp.clock_drift_max)?;
        validate_probability("channels.temperature.spike_probability", temp.spike_probability)?;
        validate_probability("channels.temperature.lift_off_probability", temp.lift_off_probability)?;
        validate_non_negative("channels.temperature.extension_margin_s", temp.extension_margin_s)?;
        if temp.utc_offset_hours.abs() > 23 {
            return Err(ValidationError::OutOfRange {
                field: "channels.temperature.utc_offset_hours".to_string(),
                value: temp.utc_offset_hours.to_string(),
                min: "-23".to_string(),
                max: "23".to_string(),
            });
        }

        let ld = &self.load;
        validate_timing("load", &ld.step, ld.dropout_probability, ld.clock_drift_max)?;
        validate_probability("channels.load.sensor_error_probability", ld.sensor_error_probability)?;
        validate_probability("channels.load.hr_derived_probability", ld.hr_derived_probability)?;
        let (no_ms, with_ms) = ld.format_weights;
        validate_probability("channels.load.format_weights.0", no_ms)?;
        validate_probability("channels.load.format_weights.1", with_ms)?;
        if no_ms + with_ms > 1.0 {
            return Err(ValidationError::ConstraintViolation {
                fields: vec![
                    "channels.load.format_weights.0".to_string(),
                    "channels.load.format_weights.1".to_string(),
                ],
                message: format!("weights sum to {} which exceeds 1.0", no_ms + with_ms),
            });
        }

        Ok(())
    }
}
