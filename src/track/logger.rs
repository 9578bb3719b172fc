//! Metric Logger - JSONL metric log inside a run directory
//!
//! Each record is appended as one JSON line to `metrics.jsonl`, so the log
//! survives interruption at any line boundary and can be tailed while the
//! run is training.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use super::MetricRecord;
use crate::Result;

/// Filename of the metric log within a run directory
pub const METRICS_FILENAME: &str = "metrics.jsonl";

/// Appends metric records to a run directory's `metrics.jsonl`.
#[derive(Debug)]
pub struct MetricLogger {
    path: PathBuf,
    file: File,
}

impl MetricLogger {
    /// Open (or create) the metric log inside `run_dir`, appending.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened for append.
    pub fn create(run_dir: impl AsRef<Path>) -> Result<Self> {
        let path = run_dir.as_ref().join(METRICS_FILENAME);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    /// Append one metric record as a JSON line and flush it.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the write fails.
    pub fn log(&mut self, record: MetricRecord) -> Result<()> {
        let line = serde_json::to_string(&record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.file.flush()?;
        Ok(())
    }

    /// Path of the underlying log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record logged so far, in write order.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or a line fails to parse.
    pub fn read_all(&self) -> Result<Vec<MetricRecord>> {
        Self::read_from(&self.path)
    }

    /// Read every record from a run directory's metric log.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or a line fails to parse.
    pub fn read_from_run_dir(run_dir: impl AsRef<Path>) -> Result<Vec<MetricRecord>> {
        Self::read_from(&run_dir.as_ref().join(METRICS_FILENAME))
    }

    fn read_from(path: &Path) -> Result<Vec<MetricRecord>> {
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let record: MetricRecord = serde_json::from_str(&line)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            records.push(record);
        }
        Ok(records)
    }

    /// Get all records for one metric key, ordered by epoch.
    ///
    /// The primary query for plotting a training curve.
    ///
    /// # Errors
    ///
    /// Returns error if the log cannot be read.
    pub fn metrics_for_key(&self, key: &str) -> Result<Vec<MetricRecord>> {
        let mut metrics: Vec<MetricRecord> = self
            .read_all()?
            .into_iter()
            .filter(|m| m.key() == key)
            .collect();

        // Sort by epoch for time-series ordering
        metrics.sort_by_key(MetricRecord::epoch);

        Ok(metrics)
    }
}
