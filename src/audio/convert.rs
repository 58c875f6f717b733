//! Batch conversion of a clip directory

use std::fs;
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{info, warn};

use super::codec::Transcoder;
use crate::config::ConvertConfig;
use crate::error::{AudioError, PrepError, Result};
use crate::identifier::IdentifierNormalizer;
use crate::metadata::AudioRecord;

/// A clip that could not be converted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionFailure {
    pub file: String,
    pub reason: String,
}

/// Result of converting a directory
#[derive(Debug, Clone, Default)]
pub struct ConversionSummary {
    /// Successfully converted clips, in file name order
    pub records: Vec<AudioRecord>,
    pub failures: Vec<ConversionFailure>,
}

impl ConversionSummary {
    pub fn attempted(&self) -> usize {
        self.records.len() + self.failures.len()
    }
}

/// Source clip names in `input_dir`, sorted
pub fn list_source_files(input_dir: &Path, normalizer: &IdentifierNormalizer) -> Result<Vec<String>> {
    if !input_dir.is_dir() {
        return Err(PrepError::MissingInputDir(input_dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(input_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) if normalizer.is_source(&name) => files.push(name),
            Ok(_) => {}
            Err(name) => warn!("Skipping non UTF-8 file name {:?}", name),
        }
    }
    files.sort();
    Ok(files)
}

/// Convert every source clip in `input_dir` into `output_dir`.
///
/// Files are converted in parallel; a file that fails to decode or encode is
/// logged and listed in the summary without stopping the batch.
pub fn convert_directory<T: Transcoder + ?Sized>(
    transcoder: &T,
    input_dir: &Path,
    output_dir: &Path,
    normalizer: &IdentifierNormalizer,
    settings: &ConvertConfig,
) -> Result<ConversionSummary> {
    let files = list_source_files(input_dir, normalizer)?;
    fs::create_dir_all(output_dir)?;

    info!(
        "Converting {} {} files from {} to {}",
        files.len(),
        normalizer.source_extension(),
        input_dir.display(),
        output_dir.display()
    );

    let progress = if settings.show_progress {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let pool = ThreadPoolBuilder::new()
        .num_threads(settings.threads)
        .build()
        .map_err(|e| PrepError::WorkerPool(e.to_string()))?;

    let results: Vec<(&String, std::result::Result<AudioRecord, AudioError>)> = pool.install(|| {
        files
            .par_iter()
            .map(|file| {
                let result = convert_one(transcoder, input_dir, output_dir, file, normalizer);
                progress.inc(1);
                (file, result)
            })
            .collect()
    });
    progress.finish_and_clear();

    let mut summary = ConversionSummary::default();
    for (file, result) in results {
        match result {
            Ok(record) => summary.records.push(record),
            Err(e) => {
                warn!("Error converting {}: {}", file, e);
                summary.failures.push(ConversionFailure {
                    file: file.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        "Converted {} of {} files ({} failed)",
        summary.records.len(),
        summary.attempted(),
        summary.failures.len()
    );

    Ok(summary)
}

fn convert_one<T: Transcoder + ?Sized>(
    transcoder: &T,
    input_dir: &Path,
    output_dir: &Path,
    file: &str,
    normalizer: &IdentifierNormalizer,
) -> std::result::Result<AudioRecord, AudioError> {
    let audio = transcoder.decode(&input_dir.join(file))?;
    let file_name = normalizer.retarget(file);
    transcoder.encode(&audio, &output_dir.join(&file_name))?;

    Ok(AudioRecord {
        file_name,
        original_file: file.to_string(),
        duration_ms: audio.duration_ms(),
    })
}
