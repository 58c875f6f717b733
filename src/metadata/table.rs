//! Tab-separated metadata table loading

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use super::records::{AudioRecord, TranscriptKey, TranscriptKeyKind, TranscriptRecord};
use crate::error::TableError;
use crate::identifier::IdentifierNormalizer;

/// Column holding the clip filename in duration tables
pub const CLIP_COLUMN: &str = "clip";
/// Column holding the clip duration in duration tables
pub const DURATION_COLUMN: &str = "duration[ms]";
/// Column holding the transcript text
pub const SENTENCE_COLUMN: &str = "sentence";

/// One table row, keyed by column name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: HashMap<String, String>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }
}

/// A parsed delimited table with rows in file order
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Load a tab-separated file with a header line
    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        if !path.is_file() {
            return Err(TableError::NotFound(path.to_path_buf()));
        }
        let file = std::fs::File::open(path)
            .map_err(|e| TableError::Read(csv::Error::from(e)))?;
        let table = Self::from_reader(file)?;
        debug!(
            "Loaded {} rows ({} columns) from {}",
            table.len(),
            table.headers.len(),
            path.display()
        );
        Ok(table)
    }

    /// Parse tab-separated text with a header line
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let values = headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.clone(), v.to_string()))
                .collect();
            rows.push(Row { values });
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    fn require_column(&self, column: &str) -> Result<(), TableError> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(TableError::MissingColumn(column.to_string()))
        }
    }

    /// Read transcript rows keyed by the given column.
    ///
    /// Rows with an empty key are skipped; a missing sentence becomes "".
    pub fn transcripts(&self, kind: TranscriptKeyKind) -> Result<Vec<TranscriptRecord>, TableError> {
        let key_column = kind.column();
        self.require_column(key_column)?;
        self.require_column(SENTENCE_COLUMN)?;

        let mut skipped = 0usize;
        let mut transcripts = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let key = row.get(key_column).map(str::trim).unwrap_or_default();
            if key.is_empty() {
                skipped += 1;
                continue;
            }
            transcripts.push(TranscriptRecord {
                key: TranscriptKey::new(kind, key),
                sentence: row.get(SENTENCE_COLUMN).unwrap_or_default().to_string(),
            });
        }

        if skipped > 0 {
            warn!("Skipped {} transcript rows with an empty {}", skipped, key_column);
        }
        Ok(transcripts)
    }

    /// Read a duration table (`clip`, `duration[ms]`) into audio records
    pub fn audio_records(
        &self,
        normalizer: &IdentifierNormalizer,
    ) -> Result<Vec<AudioRecord>, TableError> {
        self.require_column(CLIP_COLUMN)?;
        self.require_column(DURATION_COLUMN)?;

        let mut skipped = 0usize;
        let mut records = Vec::with_capacity(self.rows.len());
        for (index, row) in self.rows.iter().enumerate() {
            let clip = row.get(CLIP_COLUMN).map(str::trim).unwrap_or_default();
            if clip.is_empty() {
                skipped += 1;
                continue;
            }
            let raw = row.get(DURATION_COLUMN).unwrap_or_default();
            let Some(duration_ms) = parse_duration_ms(raw) else {
                warn!(
                    "Skipping {} at row {}: invalid {} {:?}",
                    clip,
                    index + 1,
                    DURATION_COLUMN,
                    raw
                );
                skipped += 1;
                continue;
            };

            records.push(AudioRecord {
                file_name: normalizer.retarget(clip),
                original_file: clip.to_string(),
                duration_ms,
            });
        }

        if skipped > 0 {
            warn!("Skipped {} duration rows without a usable clip or duration", skipped);
        }
        Ok(records)
    }
}

/// Parse a millisecond count, accepting float notation such as `5040.0`
fn parse_duration_ms(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<u64>() {
        return Some(ms);
    }
    match raw.parse::<f64>() {
        Ok(ms) if ms.is_finite() && ms >= 0.0 => Some(ms.floor() as u64),
        _ => None,
    }
}
