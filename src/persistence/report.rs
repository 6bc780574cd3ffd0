//! Per-patient offset, gap and record count summaries
//! Location: src/persistence/report.rs

use crate::orchestrator::PatientDataset;
use crate::simulation::{ActivityPattern, PatientProfile, SensorChannel};
use std::fmt;
use tracing::info;

/// Start of one channel relative to the heart rate strap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetSummary {
    pub channel: SensorChannel,
    pub relative_seconds: f64,
}

impl OffsetSummary {
    /// `T+m:ss` or `T-m:ss`, whole seconds truncated
    pub fn label(&self) -> String {
        format_relative_offset(self.relative_seconds)
    }
}

/// Formats signed seconds as `T+m:ss` / `T-m:ss`
pub fn format_relative_offset(seconds: f64) -> String {
    let sign = if seconds < 0.0 { '-' } else { '+' };
    let whole = seconds.abs().trunc() as u64;
    format!("T{}{}:{:02}", sign, whole / 60, whole % 60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapSummary {
    pub channel: SensorChannel,
    pub count: usize,
    /// Floor of the summed gap durations in minutes
    pub total_minutes: u64,
}

/// Summary printed before a patient's files are generated, optionally
/// completed with the record counts once they are
#[derive(Debug, Clone, PartialEq)]
pub struct PatientReport {
    pub patient_id: String,
    pub activity_pattern: ActivityPattern,
    pub offsets: Vec<OffsetSummary>,
    pub gaps: Vec<GapSummary>,
    pub record_counts: Vec<(SensorChannel, usize)>,
}

impl PatientReport {
    pub fn from_profile(profile: &PatientProfile) -> Self {
        let anchor = profile.heart_rate.offset_seconds;

        let offsets = SensorChannel::ALL
            .iter()
            .map(|&channel| OffsetSummary {
                channel,
                relative_seconds: profile.schedule(channel).offset_seconds - anchor,
            })
            .collect();

        let gaps = SensorChannel::ALL
            .iter()
            .map(|&channel| {
                let schedule = profile.schedule(channel);
                GapSummary {
                    channel,
                    count: schedule.gaps.len(),
                    total_minutes: (schedule.total_gap_seconds().max(0.0) / 60.0).floor() as u64,
                }
            })
            .collect();

        Self {
            patient_id: profile.id.clone(),
            activity_pattern: profile.activity_pattern,
            offsets,
            gaps,
            record_counts: Vec::new(),
        }
    }

    pub fn with_dataset(mut self, dataset: &PatientDataset) -> Self {
        self.record_counts = SensorChannel::ALL
            .iter()
            .map(|&channel| (channel, dataset.record_count(channel)))
            .collect();
        self
    }

    pub fn total_records(&self) -> usize {
        self.record_counts.iter().map(|(_, count)| count).sum()
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Structured equivalent of [`render`](Self::render)
    pub fn log(&self) {
        for offset in &self.offsets {
            info!(
                patient = %self.patient_id,
                channel = %offset.channel,
                offset = %offset.label(),
                "start offset"
            );
        }
        for gap in &self.gaps {
            info!(
                patient = %self.patient_id,
                channel = %gap.channel,
                gaps = gap.count,
                minutes = gap.total_minutes,
                "gap summary"
            );
        }
        for (channel, count) in &self.record_counts {
            info!(patient = %self.patient_id, channel = %channel, records = *count, "record count");
        }
    }
}

impl fmt::Display for PatientReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Patient {} ({})", self.patient_id, self.activity_pattern)?;

        writeln!(f, "  Start Time Offsets (relative to heart rate):")?;
        for offset in &self.offsets {
            writeln!(f, "    {}: {}", offset.channel.label(), offset.label())?;
        }

        writeln!(f, "  Gap Summary:")?;
        for gap in &self.gaps {
            writeln!(
                f,
                "    {}: {} gaps, total {} min",
                gap.channel.label(),
                gap.count,
                gap.total_minutes
            )?;
        }

        if !self.record_counts.is_empty() {
            writeln!(f, "  Records:")?;
            for (channel, count) in &self.record_counts {
                writeln!(f, "    {}: {} records", channel.label(), count)?;
            }
        }
        Ok(())
    }
}
