//! Per-channel fixture files
//! Location: src/persistence/writer.rs

use crate::error::{FixtureError, FixtureResult};
use crate::orchestrator::{ChannelDescriptor, PatientDataset};
use crate::simulation::{ChannelRecord, ChannelStream, OutputFormat, SensorChannel};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// CSV rows end in CRLF
const CSV_LINE_END: &str = "\r\n";

/// One file written for one channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub channel: SensorChannel,
    pub path: PathBuf,
    pub records: usize,
}

/// Writes datasets under `<output_dir>/<patient_id>/`
#[derive(Debug, Clone)]
pub struct FixtureWriter {
    output_dir: PathBuf,
}

impl FixtureWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn patient_dir(&self, patient_id: &str) -> PathBuf {
        self.output_dir.join(patient_id)
    }

    /// Writes the five channel files of one patient, creating directories
    /// as needed
    pub fn write_dataset(&self, dataset: &PatientDataset) -> FixtureResult<Vec<WrittenFile>> {
        let dir = self.patient_dir(&dataset.patient_id);
        fs::create_dir_all(&dir).map_err(|e| FixtureError::io("create_dir_all", &dir, e))?;

        let written = vec![
            self.write_channel(&dir, &dataset.heart_rate)?,
            self.write_channel(&dir, &dataset.movement)?,
            self.write_channel(&dir, &dataset.blood_oxygen)?,
            self.write_channel(&dir, &dataset.temperature)?,
            self.write_channel(&dir, &dataset.load)?,
        ];

        info!(
            patient = %dataset.patient_id,
            path = %dir.display(),
            files = written.len(),
            "fixtures written"
        );
        Ok(written)
    }

    pub fn write_channel<R: ChannelRecord>(&self, dir: &Path, stream: &ChannelStream<R>) -> FixtureResult<WrittenFile> {
        let descriptor = ChannelDescriptor::of::<R>();
        let path = dir.join(descriptor.file_name);
        let records: Vec<&R> = stream.records().collect();

        let file = File::create(&path).map_err(|e| FixtureError::io("create", &path, e))?;
        let mut out = BufWriter::new(file);
        let encoded = match descriptor.format {
            OutputFormat::Csv => write_csv(&mut out, &descriptor, &records),
            OutputFormat::Json => write_json(&mut out, &records),
        };
        encoded
            .and_then(|()| out.flush().map_err(FixtureError::from_write))
            .map_err(|e| e.at_path(&path))?;

        debug!(
            channel = %descriptor.channel,
            path = %path.display(),
            records = records.len(),
            "channel file written"
        );
        Ok(WrittenFile {
            channel: descriptor.channel,
            path,
            records: records.len(),
        })
    }
}

/// Quotes a cell when it would otherwise break the row
fn escape_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Header row from the descriptor, then one row per record
pub fn write_csv<W: Write, R: ChannelRecord>(
    out: &mut W,
    descriptor: &ChannelDescriptor,
    records: &[&R],
) -> FixtureResult<()> {
    write!(out, "{}{}", descriptor.fields.join(","), CSV_LINE_END).map_err(FixtureError::from_write)?;
    for record in records {
        let row: Vec<String> = record.csv_row().iter().map(|cell| escape_cell(cell)).collect();
        write!(out, "{}{}", row.join(","), CSV_LINE_END).map_err(FixtureError::from_write)?;
    }
    Ok(())
}

/// Compact JSON array of objects; key order is the record field order
pub fn write_json<W: Write, R: ChannelRecord>(out: &mut W, records: &[&R]) -> FixtureResult<()> {
    serde_json::to_writer(out, records)?;
    Ok(())
}

impl FixtureError {
    fn from_write(source: std::io::Error) -> Self {
        FixtureError::io("write", PathBuf::new(), source)
    }

    /// Fills in the path of an I/O error raised by a path-less writer
    fn at_path(self, path: &Path) -> Self {
        match self {
            FixtureError::Io {
                operation,
                path: missing,
                source,
            } if missing.as_os_str().is_empty() => FixtureError::Io {
                operation,
                path: path.to_path_buf(),
                source,
            },
            other => other,
        }
    }
}
