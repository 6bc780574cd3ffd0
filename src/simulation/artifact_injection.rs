//! Temporal imperfection layer: gaps, micro-dropouts, jittered ticks,
//! clock drift and ordered value corruption
//! Location: src/simulation/artifact_injection.rs
//!
//! Precedence per candidate tick:
//! 1. gap suppression (no random draw is consumed inside a gap)
//! 2. micro-dropout suppression
//! 3. value corruption, only for records that are emitted
//!
//! Corruption is an explicit ordered list of [`CorruptionRule`]s. Each rule
//! takes one Bernoulli draw in list order and the first rule that fires
//! rewrites the record; later rules are not evaluated.

use super::noise_models::SimRng;
use super::records::Emission;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

const MAX_PREALLOCATED_TICKS: f64 = 1_048_576.0;

/// Half-open window `[start_s, start_s + duration_s)` of total signal loss,
/// in the channel's own elapsed seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Gap {
    pub start_s: f64,
    pub duration_s: f64,
}

impl Gap {
    pub fn new(start_s: f64, duration_s: f64) -> Self {
        Self { start_s, duration_s }
    }

    pub fn end_s(&self) -> f64 {
        self.start_s + self.duration_s
    }

    pub fn contains(&self, elapsed_s: f64) -> bool {
        elapsed_s >= self.start_s && elapsed_s < self.end_s()
    }
}

impl From<(f64, f64)> for Gap {
    fn from((start_s, duration_s): (f64, f64)) -> Self {
        Gap::new(start_s, duration_s)
    }
}

impl From<Gap> for (f64, f64) {
    fn from(gap: Gap) -> Self {
        (gap.start_s, gap.duration_s)
    }
}

/// Overlapping gaps are tolerated
pub fn in_any_gap(gaps: &[Gap], elapsed_s: f64) -> bool {
    gaps.iter().any(|gap| gap.contains(elapsed_s))
}

/// Uniform tick step bounds in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepRange {
    pub min_s: f64,
    pub max_s: f64,
}

impl StepRange {
    pub const fn new(min_s: f64, max_s: f64) -> Self {
        Self { min_s, max_s }
    }

    pub fn mean_s(&self) -> f64 {
        (self.min_s + self.max_s) / 2.0
    }

    pub fn sample(&self, rng: &mut SimRng) -> f64 {
        rng.uniform(self.min_s, self.max_s)
    }
}

impl From<(f64, f64)> for StepRange {
    fn from((min_s, max_s): (f64, f64)) -> Self {
        StepRange::new(min_s, max_s)
    }
}

/// Constant multiplicative error of a sensor clock.
///
/// Only the reported timestamp is distorted; tick scheduling and the
/// physiology always see true elapsed time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockDrift {
    rate: f64,
}

impl ClockDrift {
    pub const NONE: ClockDrift = ClockDrift { rate: 0.0 };

    pub fn from_rate(rate: f64) -> Self {
        Self { rate }
    }

    /// One draw from `[-max_rate, max_rate]`; a zero bound consumes no draw
    pub fn draw(max_rate: f64, rng: &mut SimRng) -> Self {
        if max_rate > 0.0 {
            Self::from_rate(rng.uniform(-max_rate, max_rate))
        } else {
            Self::NONE
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn reported_elapsed(&self, elapsed_s: f64) -> f64 {
        elapsed_s * (1.0 + self.rate)
    }
}

/// Per-channel suppression and timing behaviour for one stream run
#[derive(Debug, Clone)]
pub struct ImperfectionLayer<'a> {
    gaps: &'a [Gap],
    dropout_probability: f64,
    step: StepRange,
    drift: ClockDrift,
}

impl<'a> ImperfectionLayer<'a> {
    /// Builds the layer and draws the clock drift for this run.
    pub fn new(
        gaps: &'a [Gap],
        dropout_probability: f64,
        step: StepRange,
        clock_drift_max: f64,
        rng: &mut SimRng,
    ) -> Self {
        let drift = ClockDrift::draw(clock_drift_max, rng);
        Self {
            gaps,
            dropout_probability,
            step,
            drift,
        }
    }

    pub fn drift(&self) -> ClockDrift {
        self.drift
    }

    /// Gap check first, then the dropout draw
    pub fn admits(&self, elapsed_s: f64, rng: &mut SimRng) -> bool {
        !in_any_gap(self.gaps, elapsed_s) && !rng.chance(self.dropout_probability)
    }

    /// Walks jittered ticks from zero until `duration_s`, asking `emit` for a
    /// record at every admitted tick.
    ///
    /// `emit` receives the true elapsed time and the drifted elapsed time to
    /// report.
    pub fn drive<R, F>(&self, duration_s: f64, rng: &mut SimRng, mut emit: F) -> Vec<Emission<R>>
    where
        F: FnMut(f64, f64, &mut SimRng) -> R,
    {
        let expected = (duration_s / self.step.mean_s()).clamp(0.0, MAX_PREALLOCATED_TICKS);
        let mut emissions = Vec::with_capacity(expected as usize);
        let mut elapsed_s = 0.0;

        while elapsed_s < duration_s {
            if self.admits(elapsed_s, rng) {
                let reported_s = self.drift.reported_elapsed(elapsed_s);
                let record = emit(elapsed_s, reported_s, rng);
                emissions.push(Emission { elapsed_s, record });
            }

            let step = self.step.sample(rng);
            if step.is_nan() || step <= 0.0 {
                warn!(step, elapsed_s, "tick step does not advance, stopping stream");
                break;
            }
            elapsed_s += step;
        }

        emissions
    }
}

/// Record rewrite applied when a rule fires
pub type CorruptionTransform<R> = fn(&mut R, &mut SimRng);

/// One tagged fault branch
#[derive(Clone)]
pub struct CorruptionRule<R, T> {
    pub tag: T,
    pub probability: f64,
    transform: CorruptionTransform<R>,
}

impl<R, T: Copy> CorruptionRule<R, T> {
    pub fn new(tag: T, probability: f64, transform: CorruptionTransform<R>) -> Self {
        Self {
            tag,
            probability,
            transform,
        }
    }
}

impl<R, T: fmt::Debug> fmt::Debug for CorruptionRule<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorruptionRule")
            .field("tag", &self.tag)
            .field("probability", &self.probability)
            .finish()
    }
}

/// Ordered fault branches for one channel; first match wins
#[derive(Clone)]
pub struct CorruptionRules<R, T> {
    rules: Vec<CorruptionRule<R, T>>,
}

impl<R, T: fmt::Debug> fmt::Debug for CorruptionRules<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rules.iter()).finish()
    }
}

impl<R, T: Copy> CorruptionRules<R, T> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, tag: T, probability: f64, transform: CorruptionTransform<R>) -> Self {
        self.rules.push(CorruptionRule::new(tag, probability, transform));
        self
    }

    /// Tags in evaluation order
    pub fn tags(&self) -> Vec<T> {
        self.rules.iter().map(|rule| rule.tag).collect()
    }

    /// Evaluates the rules in order and returns the tag of the one applied
    pub fn apply(&self, record: &mut R, rng: &mut SimRng) -> Option<T> {
        for rule in &self.rules {
            if rng.chance(rule.probability) {
                (rule.transform)(record, rng);
                return Some(rule.tag);
            }
        }
        None
    }
}

impl<R, T: Copy> Default for CorruptionRules<R, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Fault {
        Zeroed,
        Negated,
    }

    #[test]
    fn test_gap_is_half_open() {
        let gap = Gap::new(1200.0, 420.0);
        assert!(!gap.contains(1199.999));
        assert!(gap.contains(1200.0));
        assert!(gap.contains(1619.999));
        assert!(!gap.contains(1620.0));
    }

    #[test]
    fn test_overlapping_gaps_tolerated() {
        let gaps = [Gap::new(100.0, 50.0), Gap::new(120.0, 100.0)];
        assert!(in_any_gap(&gaps, 130.0));
        assert!(in_any_gap(&gaps, 200.0));
        assert!(!in_any_gap(&gaps, 220.0));
        assert!(!in_any_gap(&[], 0.0));
    }

    #[test]
    fn test_gap_serializes_as_pair() {
        let gap = Gap::new(1200.0, 420.0);
        assert_eq!(serde_json::to_string(&gap).unwrap(), "[1200.0,420.0]");
        let parsed: Gap = serde_json::from_str("[900, 480]").unwrap();
        assert_eq!(parsed, Gap::new(900.0, 480.0));
    }

    #[test]
    fn test_zero_drift_consumes_no_draw() {
        let mut a = SimRng::seed_from_u64(9);
        let mut b = SimRng::seed_from_u64(9);
        assert_eq!(ClockDrift::draw(0.0, &mut a), ClockDrift::NONE);
        assert_eq!(a.uniform(0.0, 1.0), b.uniform(0.0, 1.0));
    }

    #[test]
    fn test_drift_within_bound() {
        let mut rng = SimRng::seed_from_u64(10);
        for _ in 0..1_000 {
            let drift = ClockDrift::draw(0.0001, &mut rng);
            assert!(drift.rate().abs() <= 0.0001);
        }
        let drift = ClockDrift::from_rate(0.0001);
        assert!((drift.reported_elapsed(9000.0) - 9000.9).abs() < 1e-9);
    }

    #[test]
    fn test_drive_respects_gaps_and_duration() {
        let mut rng = SimRng::seed_from_u64(11);
        let gaps = [Gap::new(100.0, 50.0)];
        let layer = ImperfectionLayer::new(&gaps, 0.0, StepRange::new(0.85, 1.15), 0.0, &mut rng);

        let emissions = layer.drive(1000.0, &mut rng, |t, _, _| t);
        assert!(!emissions.is_empty());
        assert_eq!(emissions[0].elapsed_s, 0.0);
        for pair in emissions.windows(2) {
            assert!(pair[1].elapsed_s > pair[0].elapsed_s);
        }
        for e in &emissions {
            assert!(e.elapsed_s < 1000.0);
            assert!(!gaps[0].contains(e.elapsed_s));
        }
    }

    #[test]
    fn test_drive_full_dropout_emits_nothing() {
        let mut rng = SimRng::seed_from_u64(12);
        let layer = ImperfectionLayer::new(&[], 1.0, StepRange::new(1.0, 1.0), 0.0, &mut rng);
        assert!(layer.drive(100.0, &mut rng, |t, _, _| t).is_empty());
    }

    #[test]
    fn test_drive_passes_drifted_time() {
        let mut rng = SimRng::seed_from_u64(13);
        let layer = ImperfectionLayer::new(&[], 0.0, StepRange::new(1.0, 1.0), 0.0001, &mut rng);
        let rate = layer.drift().rate();
        let emissions = layer.drive(10.0, &mut rng, |t, reported, _| (t, reported));
        assert_eq!(emissions.len(), 10);
        for e in emissions {
            let (t, reported) = e.record;
            assert_eq!(reported, t * (1.0 + rate));
        }
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules: CorruptionRules<f64, Fault> = CorruptionRules::new()
            .with_rule(Fault::Zeroed, 1.0, |v, _| *v = 0.0)
            .with_rule(Fault::Negated, 1.0, |v, _| *v = -*v);
        assert_eq!(rules.tags(), vec![Fault::Zeroed, Fault::Negated]);

        let mut rng = SimRng::seed_from_u64(14);
        let mut value = 5.0;
        assert_eq!(rules.apply(&mut value, &mut rng), Some(Fault::Zeroed));
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_rules_fall_through_in_order() {
        let rules: CorruptionRules<f64, Fault> = CorruptionRules::new()
            .with_rule(Fault::Zeroed, 0.0, |v, _| *v = 0.0)
            .with_rule(Fault::Negated, 1.0, |v, _| *v = -*v);

        let mut rng = SimRng::seed_from_u64(15);
        let mut value = 5.0;
        assert_eq!(rules.apply(&mut value, &mut rng), Some(Fault::Negated));
        assert_eq!(value, -5.0);

        let none: CorruptionRules<f64, Fault> = CorruptionRules::default();
        assert_eq!(none.apply(&mut value, &mut rng), None);
    }
}
