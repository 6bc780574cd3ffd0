// src/config/constants.rs
//! Fixture generation constants
//!
//! Values mirror the reference fixture set; everything tunable is also
//! exposed through [`crate::simulation::config::ChannelProfiles`].

/// Run-level defaults
pub mod generation {
    pub const DEFAULT_SEED: u64 = 42;
    /// Shared reference instant every channel offset is relative to
    pub const DEFAULT_REFERENCE_TIME: &str = "2024-03-15T08:00:00Z";
    pub const DEFAULT_OUTPUT_DIR: &str = "data";
    pub const SECONDS_PER_HOUR: f64 = 3600.0;
}

/// Physiological envelopes used by the activity pattern models
pub mod physiology {
    pub const GRAVITY_MS2: f64 = 9.81;

    /// Exercise phases are normalized against a fixed three hour session
    pub const EXERCISE_REFERENCE_SECONDS: f64 = 3.0 * 3600.0;
    pub const EXERCISE_RAMP_END: f64 = 0.3;
    pub const EXERCISE_PLATEAU_END: f64 = 0.7;

    pub const HEART_RATE_MIN_BPM: i32 = 45;
    pub const HEART_RATE_MAX_BPM: i32 = 185;
    pub const HEART_RATE_NOISE: f64 = 0.03;

    pub const SPO2_MIN: f64 = 90.0;
    pub const SPO2_MAX: f64 = 100.0;
    pub const SPO2_NOISE: f64 = 0.01;
    pub const SPO2_GOOD_THRESHOLD: f64 = 97.0;
    pub const SPO2_FAIR_THRESHOLD: f64 = 94.0;

    pub const SKIN_TEMP_BASELINE_C: f64 = 36.5;
    pub const SKIN_TEMP_MAX_RISE_C: f64 = 1.5;
    pub const SKIN_TEMP_NOISE: f64 = 0.005;

    pub const AMBIENT_TEMP_MIN_C: f64 = 18.0;
    pub const AMBIENT_TEMP_MAX_C: f64 = 28.0;
    pub const AMBIENT_TEMP_INITIAL_RANGE: (f64, f64) = (20.0, 24.0);
    pub const AMBIENT_TEMP_STEP: f64 = 0.02;

    pub const LOAD_SCORE_MIN: i32 = 0;
    pub const LOAD_SCORE_MAX: i32 = 100;
    pub const LOAD_REST_THRESHOLD: i32 = 20;
    pub const LOAD_WALK_THRESHOLD: i32 = 50;
}

/// Sentinel values written by simulated sensor faults
pub mod sentinels {
    pub const HEART_RATE_ERROR_BPM: i32 = -1;
    pub const LOAD_ERROR_SCORE: i32 = -1;
    pub const MOVEMENT_CORRUPT_VALUE: f64 = 999.99;
}

/// Heart rate channel tuning
pub mod heart_rate {
    pub const STEP_RANGE_S: (f64, f64) = (0.85, 1.15);
    pub const DROPOUT_PROBABILITY: f64 = 0.005;
    pub const CLOCK_DRIFT_MAX: f64 = 0.0001;
    pub const SENSOR_ERROR_PROBABILITY: f64 = 0.008;
    pub const WEAK_CONTACT_PROBABILITY: f64 = 0.03;
    pub const WEAK_CONFIDENCE_RANGE: (f64, f64) = (0.2, 0.5);
    pub const NORMAL_CONFIDENCE_RANGE: (f64, f64) = (0.85, 0.99);
}

/// Accelerometer channel tuning
pub mod movement {
    pub const STEP_RANGE_S: (f64, f64) = (0.08, 0.12);
    pub const DROPOUT_PROBABILITY: f64 = 0.003;
    pub const DROPPED_AXIS_PROBABILITY: f64 = 0.004;
    pub const CORRUPT_FRAME_PROBABILITY: f64 = 0.002;
    pub const FIDGET_PROBABILITY: f64 = 0.1;
}

/// Pulse oximeter channel tuning
pub mod blood_oxygen {
    pub const STEP_RANGE_S: (f64, f64) = (1.5, 2.5);
    pub const DROPOUT_PROBABILITY: f64 = 0.01;
    pub const LOW_READING_PROBABILITY: f64 = 0.005;
    pub const LOW_READING_RANGE: (f64, f64) = (65.0, 84.0);
    pub const HIGH_READING_PROBABILITY: f64 = 0.003;
    pub const HIGH_READING_RANGE: (f64, f64) = (101.0, 110.0);
}

/// Skin temperature channel tuning
pub mod temperature {
    pub const STEP_RANGE_S: (f64, f64) = (8.0, 14.0);
    pub const DROPOUT_PROBABILITY: f64 = 0.015;
    pub const SPIKE_PROBABILITY: f64 = 0.015;
    pub const SPIKE_RANGE_C: (f64, f64) = (3.0, 8.0);
    pub const LIFT_OFF_PROBABILITY: f64 = 0.01;
    pub const LIFT_OFF_RANGE_C: (f64, f64) = (2.0, 5.0);
    /// Extra run time after the nominal session, on top of the early start
    pub const EXTENSION_MARGIN_S: f64 = 600.0;
    /// Fixed UTC offset of the temperature logger clock (EST)
    pub const UTC_OFFSET_HOURS: i32 = -5;
}

/// Physical load channel tuning
pub mod load {
    pub const STEP_RANGE_S: (f64, f64) = (4.0, 6.0);
    pub const DROPOUT_PROBABILITY: f64 = 0.012;
    pub const SENSOR_ERROR_PROBABILITY: f64 = 0.015;
    pub const HR_DERIVED_PROBABILITY: f64 = 0.7;
    /// Cumulative thresholds for the (no-ms, with-ms, slash) timestamp formats
    pub const FORMAT_WEIGHTS: (f64, f64) = (0.3, 0.3);
}

/// Output file layout
pub mod paths {
    pub const DEFAULT_CONFIG_FILE: &str = "vitalsim.toml";
    pub const PROJECT_CONFIG_FILE: &str = "config/vitalsim.toml";
    pub const LOCAL_CONFIG_FILE: &str = "config/local.toml";
    pub const ENV_PREFIX: &str = "VITALSIM_";

    pub const HEART_RATE_FILE: &str = "heart_rate.csv";
    pub const MOVEMENT_FILE: &str = "movement.json";
    pub const BLOOD_OXYGEN_FILE: &str = "blood_oxygen.csv";
    pub const TEMPERATURE_FILE: &str = "skin_temperature.csv";
    pub const LOAD_FILE: &str = "load.json";
}
