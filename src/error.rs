//! Custom error types for the cv-prep pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the cv-prep pipeline
#[derive(Error, Debug)]
pub enum PrepError {
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Input directory not found: {}", .0.display())]
    MissingInputDir(PathBuf),

    #[error("Required input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Required metadata file not found: {}", .0.display())]
    MissingMetadata(PathBuf),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

/// Audio decode/encode errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to open {}: {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    #[error("Unrecognized audio container: {0}")]
    Probe(String),

    #[error("No audio track found")]
    NoTrack,

    #[error("Unknown sample rate")]
    UnknownSampleRate,

    #[error("Unsupported codec: {0}")]
    Codec(String),

    #[error("Decoding failed: {0}")]
    Decode(String),

    #[error("No audio samples decoded")]
    Empty,

    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Delimited table errors
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Table file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read table: {0}")]
    Read(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },
}

pub type Result<T> = std::result::Result<T, PrepError>;
