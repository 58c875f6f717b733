//! Referential integrity checks over a prepared dataset

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;
use crate::metadata::{count_with_text, UnifiedRecord};
use crate::output::{percent, MetadataStore, RecordSet};

/// Outcome of [`verify`]; every check runs regardless of earlier failures
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationReport {
    /// Records in the complete metadata
    pub total_records: usize,
    /// Regular files present in the audio directory
    pub audio_files_found: usize,
    /// Complete-metadata file names absent from the audio directory
    pub missing_files: Vec<String>,
    /// File names listed more than once in the complete metadata
    pub duplicate_records: Vec<String>,
    pub train_count: usize,
    pub val_count: usize,
    /// File names present in both train and val
    pub overlapping: Vec<String>,
    /// Split file names absent from the complete metadata
    pub unknown: Vec<String>,
    /// Train and val are disjoint, known, and together as large as the complete set
    pub split_consistent: bool,
    pub files_with_text: usize,
    /// Share of records with non-empty text (informational)
    pub coverage_percent: f64,
}

impl VerificationReport {
    pub fn is_ok(&self) -> bool {
        self.missing_files.is_empty() && self.duplicate_records.is_empty() && self.split_consistent
    }

    pub fn missing_text(&self) -> usize {
        self.total_records - self.files_with_text
    }
}

/// Check the metadata store against itself and the audio directory.
///
/// Fails only when one of the required metadata tables is absent.
pub fn verify(audio_dir: &Path, store: &MetadataStore) -> Result<VerificationReport> {
    let complete = store.load(RecordSet::Complete)?;
    let train = store.load(RecordSet::Train)?;
    let val = store.load(RecordSet::Validation)?;

    let mut report = VerificationReport {
        total_records: complete.len(),
        train_count: train.len(),
        val_count: val.len(),
        ..Default::default()
    };

    report.audio_files_found = count_files(audio_dir);
    report.missing_files = find_missing_files(audio_dir, &complete);
    report.duplicate_records = find_duplicates(&complete);

    let known: HashSet<&str> = complete.iter().map(|r| r.file_name.as_str()).collect();
    let train_names: HashSet<&str> = train.iter().map(|r| r.file_name.as_str()).collect();
    report.overlapping = val
        .iter()
        .filter(|r| train_names.contains(r.file_name.as_str()))
        .map(|r| r.file_name.clone())
        .collect();
    report.unknown = train
        .iter()
        .chain(&val)
        .filter(|r| !known.contains(r.file_name.as_str()))
        .map(|r| r.file_name.clone())
        .collect();
    report.split_consistent = report.overlapping.is_empty()
        && report.unknown.is_empty()
        && train.len() + val.len() == complete.len();

    report.files_with_text = count_with_text(&complete);
    report.coverage_percent = percent(report.files_with_text, complete.len());

    if !report.missing_files.is_empty() {
        warn!("{} audio files missing", report.missing_files.len());
    }
    if !report.split_consistent {
        warn!(
            "Split inconsistent: {} train + {} val vs {} total, {} overlapping, {} unknown",
            report.train_count,
            report.val_count,
            report.total_records,
            report.overlapping.len(),
            report.unknown.len()
        );
    }
    info!(
        "Verified {} records: {} missing files, coverage {:.1}%",
        report.total_records,
        report.missing_files.len(),
        report.coverage_percent
    );

    Ok(report)
}

fn count_files(audio_dir: &Path) -> usize {
    match fs::read_dir(audio_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .count(),
        Err(e) => {
            warn!("Cannot read audio directory {}: {}", audio_dir.display(), e);
            0
        }
    }
}

fn find_missing_files(audio_dir: &Path, records: &[UnifiedRecord]) -> Vec<String> {
    records
        .iter()
        .filter(|r| !audio_dir.join(&r.file_name).is_file())
        .map(|r| r.file_name.clone())
        .collect()
}

fn find_duplicates(records: &[UnifiedRecord]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .iter()
        .filter(|r| !seen.insert(r.file_name.as_str()))
        .map(|r| r.file_name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrepError;
    use crate::split::Split;

    fn record(i: usize, text: &str) -> UnifiedRecord {
        UnifiedRecord {
            file_name: format!("common_voice_te_{}.wav", i),
            original_file: format!("common_voice_te_{}.mp3", i),
            sentence_id: i.to_string(),
            text: text.to_string(),
            duration_ms: 100,
        }
    }

    fn setup(records: &[UnifiedRecord], split: &Split) -> (tempfile::TempDir, MetadataStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = MetadataStore::new(dir.path().join("metadata"));
        store.write_complete(records).unwrap();
        store.write_split(split).unwrap();
        fs::create_dir_all(dir.path().join("wav")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_consistent_dataset() {
        let records = vec![record(1, "a"), record(2, ""), record(3, "c"), record(4, "d")];
        let split = Split {
            train: records[..3].to_vec(),
            val: records[3..].to_vec(),
        };
        let (dir, store) = setup(&records, &split);
        let wav = dir.path().join("wav");
        for r in &records {
            fs::write(wav.join(&r.file_name), b"RIFF").unwrap();
        }

        let report = verify(&wav, &store).unwrap();
        assert!(report.is_ok());
        assert_eq!(report.audio_files_found, 4);
        assert_eq!(report.files_with_text, 3);
        assert_eq!(report.missing_text(), 1);
        assert_eq!(report.coverage_percent, 75.0);
    }

    #[test]
    fn test_reports_missing_and_overlap_together() {
        let records = vec![record(1, "a"), record(2, "b"), record(3, "c")];
        let split = Split {
            train: records[..2].to_vec(),
            val: vec![records[1].clone(), record(9, "z")],
        };
        let (dir, store) = setup(&records, &split);
        let wav = dir.path().join("wav");
        fs::write(wav.join("common_voice_te_1.wav"), b"RIFF").unwrap();
        fs::write(wav.join("common_voice_te_3.wav"), b"RIFF").unwrap();

        let report = verify(&wav, &store).unwrap();
        assert!(!report.is_ok());
        assert_eq!(report.missing_files, vec!["common_voice_te_2.wav".to_string()]);
        assert_eq!(report.overlapping, vec!["common_voice_te_2.wav".to_string()]);
        assert_eq!(report.unknown, vec!["common_voice_te_9.wav".to_string()]);
        assert!(!report.split_consistent);
    }

    #[test]
    fn test_size_mismatch_is_inconsistent() {
        let records = vec![record(1, "a"), record(2, "b")];
        let split = Split {
            train: records[..1].to_vec(),
            val: vec![],
        };
        let (dir, store) = setup(&records, &split);
        let report = verify(&dir.path().join("wav"), &store).unwrap();
        assert!(!report.split_consistent);
        assert!(report.overlapping.is_empty());
        assert!(report.unknown.is_empty());
    }

    #[test]
    fn test_missing_audio_dir_reports_everything_missing() {
        let records = vec![record(1, "a"), record(2, "b")];
        let split = Split {
            train: records.clone(),
            val: vec![],
        };
        let (dir, store) = setup(&records, &split);

        let report = verify(&dir.path().join("nowhere"), &store).unwrap();
        assert_eq!(report.missing_files.len(), 2);
        assert_eq!(report.audio_files_found, 0);
        assert!(report.split_consistent);
    }

    #[test]
    fn test_duplicate_records_flagged() {
        let records = vec![record(1, "a"), record(1, "a")];
        let split = Split {
            train: records.clone(),
            val: vec![],
        };
        let (dir, store) = setup(&records, &split);
        let report = verify(&dir.path().join("wav"), &store).unwrap();
        assert_eq!(report.duplicate_records, vec!["common_voice_te_1.wav".to_string()]);
        assert!(!report.is_ok());
    }

    #[test]
    fn test_missing_split_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetadataStore::new(dir.path());
        store.write_complete(&[record(1, "a")]).unwrap();

        let result = verify(dir.path(), &store);
        assert!(matches!(result, Err(PrepError::MissingMetadata(ref p)) if p.ends_with("train_metadata.csv")));
    }
}
