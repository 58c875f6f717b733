//! Record types flowing through the pipeline

use serde::{Deserialize, Serialize};

/// A converted (or catalogued) clip with its duration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioRecord {
    /// Name of the converted file
    pub file_name: String,
    /// Name of the source clip
    pub original_file: String,
    /// Clip duration in milliseconds
    pub duration_ms: u64,
}

/// Column family identifying the clip a transcript belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptKeyKind {
    /// Original clip filename (`path` column)
    Path,
    /// Sentence identifier or hash (`sentence_id` column)
    SentenceId,
}

impl TranscriptKeyKind {
    pub fn column(&self) -> &'static str {
        match self {
            TranscriptKeyKind::Path => "path",
            TranscriptKeyKind::SentenceId => "sentence_id",
        }
    }
}

/// Key of a transcript row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptKey {
    Path(String),
    SentenceId(String),
}

impl TranscriptKey {
    pub fn new(kind: TranscriptKeyKind, value: impl Into<String>) -> Self {
        match kind {
            TranscriptKeyKind::Path => TranscriptKey::Path(value.into()),
            TranscriptKeyKind::SentenceId => TranscriptKey::SentenceId(value.into()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TranscriptKey::Path(s) | TranscriptKey::SentenceId(s) => s,
        }
    }

    pub fn kind(&self) -> TranscriptKeyKind {
        match self {
            TranscriptKey::Path(_) => TranscriptKeyKind::Path,
            TranscriptKey::SentenceId(_) => TranscriptKeyKind::SentenceId,
        }
    }
}

/// A transcript row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptRecord {
    pub key: TranscriptKey,
    pub sentence: String,
}

impl TranscriptRecord {
    pub fn by_path(path: impl Into<String>, sentence: impl Into<String>) -> Self {
        Self {
            key: TranscriptKey::Path(path.into()),
            sentence: sentence.into(),
        }
    }

    pub fn by_sentence_id(sentence_id: impl Into<String>, sentence: impl Into<String>) -> Self {
        Self {
            key: TranscriptKey::SentenceId(sentence_id.into()),
            sentence: sentence.into(),
        }
    }
}

/// One clip joined with its best-available transcript.
///
/// This is the row persisted to every metadata table; the field order is the
/// CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnifiedRecord {
    pub file_name: String,
    pub original_file: String,
    pub sentence_id: String,
    #[serde(default)]
    pub text: String,
    pub duration_ms: u64,
}

impl UnifiedRecord {
    /// CSV header, in field order
    pub const COLUMNS: [&'static str; 5] = [
        "file_name",
        "original_file",
        "sentence_id",
        "text",
        "duration_ms",
    ];

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Number of records carrying transcript text
pub fn count_with_text(records: &[UnifiedRecord]) -> usize {
    records.iter().filter(|r| r.has_text()).count()
}
