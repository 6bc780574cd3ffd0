//! Channel identities and the persisted record shape of each channel
//! Location: src/simulation/records.rs

use crate::config::constants::{paths, physiology};
use crate::utils::conversion::format_float;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One physiological or mechanical sensor stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorChannel {
    HeartRate,
    Movement,
    BloodOxygen,
    Temperature,
    Load,
}

/// On-disk encoding of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Csv,
    Json,
}

impl SensorChannel {
    /// Generation order within a patient
    pub const ALL: [SensorChannel; 5] = [
        SensorChannel::HeartRate,
        SensorChannel::Movement,
        SensorChannel::BloodOxygen,
        SensorChannel::Temperature,
        SensorChannel::Load,
    ];

    pub fn index(self) -> u8 {
        match self {
            SensorChannel::HeartRate => 0,
            SensorChannel::Movement => 1,
            SensorChannel::BloodOxygen => 2,
            SensorChannel::Temperature => 3,
            SensorChannel::Load => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SensorChannel::HeartRate => "heart_rate",
            SensorChannel::Movement => "movement",
            SensorChannel::BloodOxygen => "blood_oxygen",
            SensorChannel::Temperature => "temperature",
            SensorChannel::Load => "load",
        }
    }

    /// Human readable label used in summaries
    pub fn label(self) -> &'static str {
        match self {
            SensorChannel::HeartRate => "Heart Rate",
            SensorChannel::Movement => "Movement",
            SensorChannel::BloodOxygen => "SpO2",
            SensorChannel::Temperature => "Temperature",
            SensorChannel::Load => "Load",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            SensorChannel::HeartRate => paths::HEART_RATE_FILE,
            SensorChannel::Movement => paths::MOVEMENT_FILE,
            SensorChannel::BloodOxygen => paths::BLOOD_OXYGEN_FILE,
            SensorChannel::Temperature => paths::TEMPERATURE_FILE,
            SensorChannel::Load => paths::LOAD_FILE,
        }
    }

    pub fn format(self) -> OutputFormat {
        match self {
            SensorChannel::HeartRate | SensorChannel::BloodOxygen | SensorChannel::Temperature => {
                OutputFormat::Csv
            }
            SensorChannel::Movement | SensorChannel::Load => OutputFormat::Json,
        }
    }
}

impl fmt::Display for SensorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record paired with the true elapsed time of the tick that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Emission<R> {
    pub elapsed_s: f64,
    pub record: R,
}

/// A record type bound to its channel and persisted field order
pub trait ChannelRecord: Serialize + Clone + Send + Sync {
    const CHANNEL: SensorChannel;
    /// Column (CSV) or key (JSON) order
    const FIELDS: &'static [&'static str];

    /// Cells in `FIELDS` order; null values become empty cells
    fn csv_row(&self) -> Vec<String>;
}

fn optional_cell(value: Option<f64>) -> String {
    value.map(format_float).unwrap_or_default()
}

/// Heart rate strap sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateRecord {
    /// ISO-8601 in UTC, drifted by the strap clock
    pub timestamp: String,
    /// Beats per minute, `-1` on sensor error
    pub bpm: i32,
    /// 0.0 on sensor error
    pub confidence: f64,
}

impl ChannelRecord for HeartRateRecord {
    const CHANNEL: SensorChannel = SensorChannel::HeartRate;
    const FIELDS: &'static [&'static str] = &["timestamp", "bpm", "confidence"];

    fn csv_row(&self) -> Vec<String> {
        vec![self.timestamp.clone(), self.bpm.to_string(), format_float(self.confidence)]
    }
}

/// Triaxial accelerometer frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRecord {
    /// Unix milliseconds
    pub ts: i64,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub magnitude: Option<f64>,
}

impl ChannelRecord for MovementRecord {
    const CHANNEL: SensorChannel = SensorChannel::Movement;
    const FIELDS: &'static [&'static str] = &["ts", "x", "y", "z", "magnitude"];

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.ts.to_string(),
            optional_cell(self.x),
            optional_cell(self.y),
            optional_cell(self.z),
            optional_cell(self.magnitude),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseQuality {
    Good,
    Fair,
    Poor,
}

impl PulseQuality {
    pub fn from_spo2(spo2: f64) -> Self {
        if spo2 >= physiology::SPO2_GOOD_THRESHOLD {
            PulseQuality::Good
        } else if spo2 >= physiology::SPO2_FAIR_THRESHOLD {
            PulseQuality::Fair
        } else {
            PulseQuality::Poor
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PulseQuality::Good => "good",
            PulseQuality::Fair => "fair",
            PulseQuality::Poor => "poor",
        }
    }
}

/// Pulse oximeter reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodOxygenRecord {
    /// Unix seconds
    pub time: i64,
    pub spo2: f64,
    pub pulse_quality: PulseQuality,
}

impl ChannelRecord for BloodOxygenRecord {
    const CHANNEL: SensorChannel = SensorChannel::BloodOxygen;
    const FIELDS: &'static [&'static str] = &["time", "spo2", "pulse_quality"];

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.time.to_string(),
            format_float(self.spo2),
            self.pulse_quality.as_str().to_string(),
        ]
    }
}

/// Skin temperature patch reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRecord {
    /// ISO-8601 at the logger's fixed UTC offset
    pub recorded_at: String,
    pub temp_celsius: f64,
    pub ambient_temp: f64,
}

impl ChannelRecord for TemperatureRecord {
    const CHANNEL: SensorChannel = SensorChannel::Temperature;
    const FIELDS: &'static [&'static str] = &["recorded_at", "temp_celsius", "ambient_temp"];

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.recorded_at.clone(),
            format_float(self.temp_celsius),
            format_float(self.ambient_temp),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Rest,
    Walk,
    Exercise,
    Unknown,
}

impl ActivityType {
    pub fn from_score(score: i32) -> Self {
        if score < physiology::LOAD_REST_THRESHOLD {
            ActivityType::Rest
        } else if score < physiology::LOAD_WALK_THRESHOLD {
            ActivityType::Walk
        } else {
            ActivityType::Exercise
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Rest => "rest",
            ActivityType::Walk => "walk",
            ActivityType::Exercise => "exercise",
            ActivityType::Unknown => "unknown",
        }
    }
}

/// Physical load estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRecord {
    /// One of three string formats, chosen per record
    pub timestamp: String,
    /// 0..=100, `-1` on sensor error
    pub load_score: i32,
    pub activity_type: ActivityType,
    pub hr_derived: bool,
}

impl ChannelRecord for LoadRecord {
    const CHANNEL: SensorChannel = SensorChannel::Load;
    const FIELDS: &'static [&'static str] = &["timestamp", "load_score", "activity_type", "hr_derived"];

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.timestamp.clone(),
            self.load_score.to_string(),
            self.activity_type.as_str().to_string(),
            self.hr_derived.to_string(),
        ]
    }
}
