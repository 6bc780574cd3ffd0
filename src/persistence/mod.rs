//! Persistence and reporting of generated fixtures
//!
//! The writer only encodes what it is handed: one file per channel per
//! patient, in descriptor field order, values untouched.

pub mod writer;
pub mod report;

pub use writer::{FixtureWriter, WrittenFile};
pub use report::{GapSummary, OffsetSummary, PatientReport};
