//! Configuration structures for the cv-prep pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ConfigError;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub identifier: IdentifierConfig,
    pub join: JoinConfig,
    pub split: SplitConfig,
    pub convert: ConvertConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.split.ratio) {
            return Err(ConfigError::InvalidValue {
                field: "split.ratio".to_string(),
                value: self.split.ratio.to_string(),
            });
        }
        if self.convert.threads == 0 {
            return Err(ConfigError::InvalidValue {
                field: "convert.threads".to_string(),
                value: "0".to_string(),
            });
        }
        for (field, value) in [
            ("identifier.source_extension", &self.identifier.source_extension),
            ("identifier.target_extension", &self.identifier.target_extension),
        ] {
            if value.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: String::new(),
                });
            }
        }
        Ok(())
    }
}

/// Well-known input and output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory of compressed source clips
    pub audio_input_dir: PathBuf,
    /// Tab-separated transcript table (`path`/`sentence` or `sentence_id`/`sentence`)
    pub transcript_table_path: PathBuf,
    /// Tab-separated duration table (`clip`, `duration[ms]`)
    pub duration_table_path: PathBuf,
    /// Directory receiving decoded clips
    pub audio_output_dir: PathBuf,
    /// Directory receiving metadata tables
    pub metadata_output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            audio_input_dir: PathBuf::from("data/clips"),
            transcript_table_path: PathBuf::from("data/other.tsv"),
            duration_table_path: PathBuf::from("data/clip_durations.tsv"),
            audio_output_dir: PathBuf::from("data/wav_clips"),
            metadata_output_dir: PathBuf::from("data/metadata"),
        }
    }
}

/// Filename conventions of the corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierConfig {
    /// Corpus prefix stripped from clip names
    pub prefix: String,
    /// Extension of the source clips, including the dot
    pub source_extension: String,
    /// Extension of the converted clips, including the dot
    pub target_extension: String,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            prefix: "common_voice_te_".to_string(),
            source_extension: ".mp3".to_string(),
            target_extension: ".wav".to_string(),
        }
    }
}

/// Transcript join configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinConfig {
    pub strategy: JoinStrategy,
    /// Take the first substring match without flagging ambiguity
    pub legacy_first_match: bool,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            strategy: JoinStrategy::Auto,
            legacy_first_match: false,
        }
    }
}

/// How audio records are matched against transcripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinStrategy {
    /// Exact path when the table has a `path` column, substring otherwise
    Auto,
    /// Lookup by original filename
    Exact,
    /// Containment match on normalized identifiers
    Substring,
}

impl std::fmt::Display for JoinStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinStrategy::Auto => write!(f, "auto"),
            JoinStrategy::Exact => write!(f, "exact"),
            JoinStrategy::Substring => write!(f, "substring"),
        }
    }
}

impl FromStr for JoinStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(JoinStrategy::Auto),
            "exact" => Ok(JoinStrategy::Exact),
            "substring" => Ok(JoinStrategy::Substring),
            other => Err(ConfigError::InvalidValue {
                field: "join.strategy".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Train/validation split configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of records assigned to train (0.0 - 1.0)
    pub ratio: f64,
    /// Shuffle seed
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            ratio: 0.9,
            seed: 42,
        }
    }
}

/// Audio conversion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Worker threads used for transcoding
    pub threads: usize,
    /// Sample encoding of written WAV files
    pub encoding: SampleEncoding,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            encoding: SampleEncoding::Pcm16,
            show_progress: true,
        }
    }
}

/// WAV sample encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleEncoding {
    /// 16-bit signed integer PCM
    Pcm16,
    /// 32-bit IEEE float
    Float32,
}
