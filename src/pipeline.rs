//! Stage wiring: convert, build metadata, split, verify

use std::path::Path;

use tracing::{info, warn};

use crate::audio::{convert_directory, ConversionSummary, Transcoder};
use crate::config::{Config, JoinConfig};
use crate::error::{PrepError, Result};
use crate::identifier::IdentifierNormalizer;
use crate::join::{join, JoinMode, JoinOutcome};
use crate::metadata::{count_with_text, AudioRecord, Table, TranscriptRecord};
use crate::output::{MetadataStore, RunSummary};
use crate::split::{split, Split, SplitRatio};
use crate::verify::{verify, VerificationReport};

/// Output of the convert stage
#[derive(Debug, Clone)]
pub struct ConvertOutcome {
    pub conversion: ConversionSummary,
    pub join: JoinOutcome,
}

/// Output of the split stage
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub split: Split,
    pub summary: RunSummary,
}

/// Load transcripts, choosing the join mode from the table's columns.
///
/// A missing, unreadable or column-less table yields no transcripts: the join
/// still runs and produces records with empty text.
pub fn load_transcripts(path: &Path, config: &JoinConfig) -> (JoinMode, Vec<TranscriptRecord>) {
    let table = match Table::from_path(path) {
        Ok(table) => table,
        Err(e) => {
            warn!("Transcript table {} unavailable: {}", path.display(), e);
            return (JoinMode::resolve(config, false), Vec::new());
        }
    };

    let mode = JoinMode::resolve(config, table.has_column("path"));
    match table.transcripts(mode.key_kind()) {
        Ok(transcripts) => {
            info!(
                "Loaded {} transcripts from {} ({} mode)",
                transcripts.len(),
                path.display(),
                mode
            );
            (mode, transcripts)
        }
        Err(e) => {
            warn!("Transcript table {} unusable: {}", path.display(), e);
            (mode, Vec::new())
        }
    }
}

/// The dataset preparation stages over one configuration
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
    normalizer: IdentifierNormalizer,
    store: MetadataStore,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let normalizer = IdentifierNormalizer::from_config(&config.identifier);
        let store = MetadataStore::new(config.paths.metadata_output_dir.clone());
        Ok(Self {
            config,
            normalizer,
            store,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    pub fn normalizer(&self) -> &IdentifierNormalizer {
        &self.normalizer
    }

    /// Join audio records with the transcript table and persist the complete set
    pub fn build_metadata(&self, audio_records: &[AudioRecord]) -> Result<JoinOutcome> {
        let (mode, transcripts) =
            load_transcripts(&self.config.paths.transcript_table_path, &self.config.join);
        let outcome = join(audio_records, &transcripts, &self.normalizer, mode);
        self.store.write_complete(&outcome.records)?;
        Ok(outcome)
    }

    /// Transcode the clip directory, then build metadata from the converted clips
    pub fn convert<T: Transcoder + ?Sized>(&self, transcoder: &T) -> Result<ConvertOutcome> {
        let paths = &self.config.paths;
        let conversion = convert_directory(
            transcoder,
            &paths.audio_input_dir,
            &paths.audio_output_dir,
            &self.normalizer,
            &self.config.convert,
        )?;
        let join = self.build_metadata(&conversion.records)?;
        Ok(ConvertOutcome { conversion, join })
    }

    /// Build metadata from the duration table without transcoding
    pub fn metadata_from_durations(&self) -> Result<JoinOutcome> {
        let path = &self.config.paths.duration_table_path;
        if !path.is_file() {
            return Err(PrepError::MissingInput(path.clone()));
        }
        let audio_records = Table::from_path(path)?.audio_records(&self.normalizer)?;
        info!(
            "Loaded {} clip durations from {}",
            audio_records.len(),
            path.display()
        );
        self.build_metadata(&audio_records)
    }

    /// Split the persisted complete metadata and persist both subsets
    pub fn split(&self) -> Result<SplitOutcome> {
        let records = self.store.load_complete()?;
        let ratio = SplitRatio::new(self.config.split.ratio)?;
        let seed = self.config.split.seed;

        let split = split(&records, ratio, seed);
        self.store.write_split(&split)?;

        let summary = RunSummary {
            total_files: records.len(),
            train_files: split.train.len(),
            val_files: split.val.len(),
            files_with_text: count_with_text(&records),
            ratio: ratio.value(),
            seed,
        };
        self.store.write_summary(&summary)?;

        info!(
            "Split {} records into {} train / {} val",
            summary.total_files, summary.train_files, summary.val_files
        );
        Ok(SplitOutcome { split, summary })
    }

    /// Check the produced dataset
    pub fn verify(&self) -> Result<VerificationReport> {
        verify(&self.config.paths.audio_output_dir, &self.store)
    }
}
