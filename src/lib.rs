//! Speech Dataset Preparation
//!
//! Converts a directory of compressed speech clips to WAV, joins the clips
//! with their transcripts and durations, and splits the joined records into
//! reproducible train and validation sets.
//!
//! # Architecture
//!
//! The system is organized into the following modules:
//!
//! - `audio`: Clip decoding/encoding and batch directory conversion
//! - `metadata`: Record types and tab-separated table loading
//! - `identifier`: Clip identifier extraction from filenames
//! - `join`: Matching clips with transcripts (exact path or substring)
//! - `split`: Seeded train/validation partitioning
//! - `verify`: Integrity checks over the produced dataset
//! - `output`: Metadata persistence (CSV, JSON) and summary formatting
//! - `pipeline`: Stage wiring driven by `Config`
//! - `config`: Configuration structures
//! - `error`: Error types
//!
//! # Example
//!
//! ```no_run
//! use cv_prep::{Config, Pipeline, SymphoniaTranscoder};
//!
//! let config = Config::default();
//! let pipeline = Pipeline::new(config).unwrap();
//!
//! let converted = pipeline
//!     .convert(&SymphoniaTranscoder::new(pipeline.config().convert.encoding))
//!     .unwrap();
//! println!("{} clips converted", converted.conversion.records.len());
//!
//! let outcome = pipeline.split().unwrap();
//! println!("{} train / {} val", outcome.summary.train_files, outcome.summary.val_files);
//!
//! let report = pipeline.verify().unwrap();
//! assert!(report.is_ok());
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod identifier;
pub mod join;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod split;
pub mod verify;

// Re-exports for convenience
pub use audio::{
    convert_directory, ConversionSummary, DecodedAudio, SymphoniaTranscoder, Transcoder,
};
pub use config::{
    Config, ConvertConfig, IdentifierConfig, JoinConfig, JoinStrategy, PathsConfig,
    SampleEncoding, SplitConfig,
};
pub use error::{AudioError, ConfigError, PrepError, Result, TableError};
pub use identifier::IdentifierNormalizer;
pub use join::{join, AmbiguousMatch, JoinMode, JoinOutcome};
pub use metadata::{AudioRecord, Table, TranscriptKey, TranscriptRecord, UnifiedRecord};
pub use output::{MetadataStore, RecordSet, RunSummary};
pub use pipeline::{load_transcripts, ConvertOutcome, Pipeline, SplitOutcome};
pub use split::{split, Split, SplitLabel, SplitRatio};
pub use verify::{verify, VerificationReport};
