//! Activity pattern models mapping elapsed time to physiological values
//! Location: src/simulation/physiology.rs
//!
//! Every model is pure apart from the draws it takes from the caller's
//! [`SimRng`]. Clamping happens here; fault injection happens later in the
//! imperfection layer and is allowed to leave these ranges.

use super::noise_models::SimRng;
use crate::config::constants::physiology::*;
use crate::utils::conversion::{round_to, truncate_clamp};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Named physiological regime governing a patient's session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityPattern {
    Resting,
    MorningRoutine,
    ExerciseSession,
}

impl ActivityPattern {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityPattern::Resting => "resting",
            ActivityPattern::MorningRoutine => "morning_routine",
            ActivityPattern::ExerciseSession => "exercise_session",
        }
    }
}

impl fmt::Display for ActivityPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position within the reference exercise session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionProgress(pub f64);

impl SessionProgress {
    pub fn at(elapsed_s: f64) -> Self {
        SessionProgress(elapsed_s / EXERCISE_REFERENCE_SECONDS)
    }

    /// Heart-rate view: `[0, 0.3)` ramp, `[0.3, 0.7)` plateau, rest cool-down
    pub fn in_ramp(self) -> bool {
        self.0 < EXERCISE_RAMP_END
    }

    pub fn before_cool_down(self) -> bool {
        self.0 < EXERCISE_PLATEAU_END
    }

    /// Exclusive mid-phase used by movement, SpO2 and load: `(0.3, 0.7)`
    pub fn in_mid_phase(self) -> bool {
        self.0 > EXERCISE_RAMP_END && self.0 < EXERCISE_PLATEAU_END
    }

    /// Past the warm-up, used by skin temperature
    pub fn past_warm_up(self) -> bool {
        self.0 > EXERCISE_RAMP_END
    }
}

/// Triaxial acceleration in m/s², rounded to 3 decimals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub magnitude: f64,
}

impl Acceleration {
    fn from_axes(x: f64, y: f64, z: f64) -> Self {
        let (x, y, z) = (round_to(x, 3), round_to(y, 3), round_to(z, 3));
        Self {
            x,
            y,
            z,
            magnitude: euclidean_magnitude(x, y, z),
        }
    }
}

/// Norm of three axes rounded to 3 decimals
pub fn euclidean_magnitude(x: f64, y: f64, z: f64) -> f64 {
    round_to((x * x + y * y + z * z).sqrt(), 3)
}

/// Activity-driven model for all five channels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternModel {
    pattern: ActivityPattern,
}

impl PatternModel {
    pub fn new(pattern: ActivityPattern) -> Self {
        Self { pattern }
    }

    pub fn pattern(&self) -> ActivityPattern {
        self.pattern
    }

    /// Beats per minute in [45, 185]
    pub fn heart_rate(&self, elapsed_s: f64, rng: &mut SimRng) -> i32 {
        let base = match self.pattern {
            ActivityPattern::MorningRoutine => {
                let phase = (elapsed_s % 3600.0) / 3600.0;
                65.0 + 20.0 * (phase * PI * 2.0).sin()
            }
            ActivityPattern::ExerciseSession => {
                let progress = SessionProgress::at(elapsed_s);
                let nt = progress.0;
                if progress.in_ramp() {
                    70.0 + nt * 100.0
                } else if progress.before_cool_down() {
                    130.0 + 20.0 * (nt * 20.0).sin()
                } else {
                    130.0 - (nt - EXERCISE_PLATEAU_END) * 200.0
                }
            }
            ActivityPattern::Resting => 60.0 + 5.0 * (elapsed_s / 600.0).sin(),
        };

        truncate_clamp(rng.noisy(base, HEART_RATE_NOISE), HEART_RATE_MIN_BPM, HEART_RATE_MAX_BPM)
    }

    pub fn movement(&self, elapsed_s: f64, rng: &mut SimRng) -> Acceleration {
        let (x, y, z) = match self.pattern {
            ActivityPattern::ExerciseSession if SessionProgress::at(elapsed_s).in_mid_phase() => {
                let bx = rng.uniform(-2.0, 2.0);
                let x = rng.noisy(bx, 0.5);
                let by = -GRAVITY_MS2 + rng.uniform(-1.0, 1.0);
                let y = rng.noisy(by, 0.1);
                let bz = rng.uniform(-2.0, 2.0);
                let z = rng.noisy(bz, 0.5);
                (x, y, z)
            }
            ActivityPattern::ExerciseSession => {
                let bx = rng.uniform(-0.2, 0.2);
                let x = rng.noisy(bx, 0.3);
                let y = rng.noisy(-GRAVITY_MS2, 0.01);
                let bz = rng.uniform(-0.2, 0.2);
                let z = rng.noisy(bz, 0.3);
                (x, y, z)
            }
            ActivityPattern::MorningRoutine => {
                let (x, z) = if rng.chance(crate::config::constants::movement::FIDGET_PROBABILITY) {
                    let bx = rng.uniform(-1.0, 1.0);
                    let x = rng.noisy(bx, 0.3);
                    let bz = rng.uniform(-1.0, 1.0);
                    let z = rng.noisy(bz, 0.3);
                    (x, z)
                } else {
                    (rng.gaussian(0.0, 0.02), rng.gaussian(0.0, 0.02))
                };
                let y = rng.noisy(-GRAVITY_MS2, 0.01);
                (x, y, z)
            }
            ActivityPattern::Resting => {
                let x = rng.gaussian(0.0, 0.01);
                let y = rng.noisy(-GRAVITY_MS2, 0.005);
                let z = rng.gaussian(0.0, 0.01);
                (x, y, z)
            }
        };

        Acceleration::from_axes(x, y, z)
    }

    /// SpO2 percentage in [90, 100], 1 decimal
    pub fn blood_oxygen(&self, elapsed_s: f64, rng: &mut SimRng) -> f64 {
        let base = match self.pattern {
            ActivityPattern::ExerciseSession if SessionProgress::at(elapsed_s).in_mid_phase() => {
                96.0 + rng.uniform(-1.0, 1.0)
            }
            ActivityPattern::ExerciseSession => 98.0 + rng.uniform(-0.5, 0.5),
            _ => 98.0 + rng.uniform(-1.0, 1.0),
        };

        round_to(rng.noisy(base, SPO2_NOISE).clamp(SPO2_MIN, SPO2_MAX), 1)
    }

    /// Skin temperature in °C, 2 decimals
    pub fn skin_temperature(&self, elapsed_s: f64, rng: &mut SimRng) -> f64 {
        let mut base = SKIN_TEMP_BASELINE_C;
        if self.pattern == ActivityPattern::ExerciseSession {
            let progress = SessionProgress::at(elapsed_s);
            if progress.past_warm_up() {
                base += SKIN_TEMP_MAX_RISE_C.min((progress.0 - EXERCISE_RAMP_END) * 3.0);
            }
        }

        round_to(rng.noisy(base, SKIN_TEMP_NOISE), 2)
    }

    /// Load score in [0, 100] derived from the same-tick heart rate
    pub fn load_score(&self, elapsed_s: f64, heart_rate: i32, rng: &mut SimRng) -> i32 {
        let hr = heart_rate as f64;
        let raw = match self.pattern {
            ActivityPattern::ExerciseSession if SessionProgress::at(elapsed_s).in_mid_phase() => {
                50.0 + (hr - 100.0) * 0.5 + rng.int_inclusive(-5, 5) as f64
            }
            ActivityPattern::ExerciseSession => 20.0 + rng.int_inclusive(-5, 5) as f64,
            ActivityPattern::MorningRoutine => 25.0 + (hr - 70.0) * 0.3 + rng.int_inclusive(-3, 3) as f64,
            ActivityPattern::Resting => 10.0 + rng.int_inclusive(-3, 3) as f64,
        };

        truncate_clamp(raw, LOAD_SCORE_MIN, LOAD_SCORE_MAX)
    }
}
