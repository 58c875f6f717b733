//! Metadata persistence and summary formatting

pub mod formats;

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PrepError, Result};
use crate::metadata::UnifiedRecord;
use crate::split::{Split, SplitLabel};

pub use formats::{format_json, read_csv, write_csv};

/// Persisted record sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSet {
    Complete,
    Train,
    Validation,
}

impl RecordSet {
    /// File name stem shared by the CSV and JSON encodings
    pub fn stem(&self) -> &'static str {
        match self {
            RecordSet::Complete => "complete_metadata",
            RecordSet::Train => "train_metadata",
            RecordSet::Validation => "val_metadata",
        }
    }
}

impl From<SplitLabel> for RecordSet {
    fn from(label: SplitLabel) -> Self {
        match label {
            SplitLabel::Train => RecordSet::Train,
            SplitLabel::Validation => RecordSet::Validation,
        }
    }
}

/// Counts describing a completed split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_files: usize,
    pub train_files: usize,
    pub val_files: usize,
    pub files_with_text: usize,
    pub ratio: f64,
    pub seed: u64,
}

/// Directory holding the metadata tables
#[derive(Debug, Clone)]
pub struct MetadataStore {
    dir: PathBuf,
}

impl MetadataStore {
    pub const SUMMARY_FILE: &'static str = "summary.json";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn csv_path(&self, set: RecordSet) -> PathBuf {
        self.dir.join(format!("{}.csv", set.stem()))
    }

    pub fn json_path(&self, set: RecordSet) -> PathBuf {
        self.dir.join(format!("{}.json", set.stem()))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(Self::SUMMARY_FILE)
    }

    /// Write one record set as CSV and JSON
    pub fn write(&self, set: RecordSet, records: &[UnifiedRecord]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let csv_path = self.csv_path(set);
        write_csv(BufWriter::new(File::create(&csv_path)?), records)?;

        let json_path = self.json_path(set);
        let mut json = BufWriter::new(File::create(&json_path)?);
        json.write_all(format_json(records)?.as_bytes())?;
        json.flush()?;

        info!(
            "Wrote {} records to {} and {}",
            records.len(),
            csv_path.display(),
            json_path.display()
        );
        Ok(())
    }

    pub fn write_complete(&self, records: &[UnifiedRecord]) -> Result<()> {
        self.write(RecordSet::Complete, records)
    }

    pub fn write_split(&self, split: &Split) -> Result<()> {
        self.write(RecordSet::Train, &split.train)?;
        self.write(RecordSet::Validation, &split.val)
    }

    pub fn write_summary(&self, summary: &RunSummary) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut file = BufWriter::new(File::create(self.summary_path())?);
        serde_json::to_writer_pretty(&mut file, summary)?;
        file.flush()?;
        Ok(())
    }

    /// Load a record set from its CSV encoding
    pub fn load(&self, set: RecordSet) -> Result<Vec<UnifiedRecord>> {
        let path = self.csv_path(set);
        if !path.is_file() {
            return Err(PrepError::MissingMetadata(path));
        }
        read_csv(BufReader::new(File::open(&path)?))
    }

    pub fn load_complete(&self) -> Result<Vec<UnifiedRecord>> {
        self.load(RecordSet::Complete)
    }

    pub fn load_summary(&self) -> Result<RunSummary> {
        let path = self.summary_path();
        if !path.is_file() {
            return Err(PrepError::MissingMetadata(path));
        }
        Ok(serde_json::from_reader(BufReader::new(File::open(&path)?))?)
    }
}

/// Format milliseconds as HH:MM:SS.mmm
pub fn format_duration(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let millis = ms % 1000;

    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

/// `part` as a percentage of `total`, 0 when `total` is 0
pub fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

/// First `max_chars` characters of `text`, with `...` when cut
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
