//! Stochastic primitives shared by every simulator
//! Location: src/simulation/noise_models.rs
//!
//! All randomness flows through an explicitly owned [`SimRng`]. The
//! [`StreamSeeder`] is seeded once per run and derives one independent
//! ChaCha stream per (patient, channel) pair, so each stream's draw order
//! depends only on its own generator and never on scheduling.

use super::records::SensorChannel;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

/// Owned pseudo-random state for one unit of generation work
#[derive(Debug, Clone)]
pub struct SimRng {
    inner: ChaCha8Rng,
}

impl SimRng {
    pub fn seed_from_u64(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn with_stream(seed: u64, stream: u64) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(seed);
        inner.set_stream(stream);
        Self { inner }
    }

    /// Uniform draw from the closed interval between `low` and `high`
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        let (lo, hi) = if low <= high { (low, high) } else { (high, low) };
        self.inner.gen_range(lo..=hi)
    }

    /// Uniform integer from `[low, high]`
    pub fn int_inclusive(&mut self, low: i32, high: i32) -> i32 {
        let (lo, hi) = if low <= high { (low, high) } else { (high, low) };
        self.inner.gen_range(lo..=hi)
    }

    /// Standard uniform draw from [0, 1)
    pub fn unit(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Bernoulli trial: draws `u` in [0, 1) and reports `u < probability`
    pub fn chance(&mut self, probability: f64) -> bool {
        self.unit() < probability
    }

    pub fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        let z: f64 = StandardNormal.sample(&mut self.inner);
        mean + std_dev * z
    }

    /// Multiplicative gaussian noise: `value * (1 + N(0, relative_std))`
    pub fn noisy(&mut self, value: f64, relative_std: f64) -> f64 {
        value * (1.0 + self.gaussian(0.0, relative_std))
    }
}

/// Deterministic factory of per-unit random streams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSeeder {
    master_seed: u64,
}

impl StreamSeeder {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Stream for one channel of one patient.
    ///
    /// The ChaCha stream id packs the CRC-32 of the patient id in the high
    /// word and the channel index in the low word.
    pub fn stream(&self, patient_id: &str, channel: SensorChannel) -> SimRng {
        SimRng::with_stream(self.master_seed, Self::stream_id(patient_id, channel))
    }

    /// High word of every stream id for `patient_id`. Two patients with the
    /// same key would share their streams.
    pub fn patient_key(patient_id: &str) -> u32 {
        crc32fast::hash(patient_id.as_bytes())
    }

    fn stream_id(patient_id: &str, channel: SensorChannel) -> u64 {
        ((Self::patient_key(patient_id) as u64) << 32) | channel.index() as u64
    }
}
