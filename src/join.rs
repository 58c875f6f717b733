//! Joining audio records with transcripts
//!
//! Two matching modes exist because the transcript sources identify clips
//! differently:
//!
//! - **Exact path**: the table has a `path` column holding the original clip
//!   filename. Lookups go through a hash index and are unambiguous. This is the
//!   canonical mode and is always chosen by [`JoinStrategy::Auto`] when a
//!   `path` column exists.
//! - **Substring containment**: only a `sentence_id` (often a hash) is
//!   available. The clip filename is normalized to an identifier and the
//!   transcript table is scanned in order for the first identifier that
//!   contains it or is contained by it. This can pick the wrong sentence when
//!   several identifiers overlap, and leaves `text` empty when none do. The
//!   first match in table order always wins; unless `legacy_first_match` is
//!   set, every clip with more than one candidate is logged and reported in
//!   [`JoinOutcome::ambiguous`].
//!
//! Joining never fails. A missing match only costs transcript coverage.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::config::{JoinConfig, JoinStrategy};
use crate::identifier::IdentifierNormalizer;
use crate::metadata::{AudioRecord, TranscriptKey, TranscriptKeyKind, TranscriptRecord, UnifiedRecord};

/// Resolved matching mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    ExactPath,
    Substring { legacy_first_match: bool },
}

impl JoinMode {
    /// Pick the mode for a transcript table, preferring exact paths
    pub fn resolve(config: &JoinConfig, path_column_available: bool) -> Self {
        match config.strategy {
            JoinStrategy::Exact => JoinMode::ExactPath,
            JoinStrategy::Auto if path_column_available => JoinMode::ExactPath,
            JoinStrategy::Auto | JoinStrategy::Substring => JoinMode::Substring {
                legacy_first_match: config.legacy_first_match,
            },
        }
    }

    /// Transcript column the mode matches against
    pub fn key_kind(&self) -> TranscriptKeyKind {
        match self {
            JoinMode::ExactPath => TranscriptKeyKind::Path,
            JoinMode::Substring { .. } => TranscriptKeyKind::SentenceId,
        }
    }
}

impl std::fmt::Display for JoinMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinMode::ExactPath => write!(f, "exact path"),
            JoinMode::Substring {
                legacy_first_match: true,
            } => write!(f, "substring (legacy first match)"),
            JoinMode::Substring { .. } => write!(f, "substring"),
        }
    }
}

/// A clip whose identifier overlapped several transcript identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousMatch {
    pub file_name: String,
    pub identifier: String,
    /// Transcript identifier that was used
    pub chosen: String,
    /// Number of transcript identifiers that satisfied containment
    pub candidates: usize,
}

/// Joined records plus match statistics
#[derive(Debug, Clone, Default)]
pub struct JoinOutcome {
    /// One record per unique audio file, in input order
    pub records: Vec<UnifiedRecord>,
    pub matched: usize,
    /// File names left without text
    pub unmatched: Vec<String>,
    pub ambiguous: Vec<AmbiguousMatch>,
    /// Audio file names dropped because they were already joined
    pub duplicates: Vec<String>,
}

impl JoinOutcome {
    pub fn coverage_percent(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        self.matched as f64 / self.records.len() as f64 * 100.0
    }
}

/// Join audio records with transcripts using the given mode
pub fn join(
    audio_records: &[AudioRecord],
    transcripts: &[TranscriptRecord],
    normalizer: &IdentifierNormalizer,
    mode: JoinMode,
) -> JoinOutcome {
    let mut outcome = JoinOutcome::default();
    let mut seen: HashSet<&str> = HashSet::with_capacity(audio_records.len());

    let path_index = match mode {
        JoinMode::ExactPath => build_path_index(transcripts),
        JoinMode::Substring { .. } => HashMap::new(),
    };

    for audio in audio_records {
        if !seen.insert(audio.file_name.as_str()) {
            warn!("Duplicate audio file {} ignored", audio.file_name);
            outcome.duplicates.push(audio.file_name.clone());
            continue;
        }

        let identifier = normalizer.normalize(&audio.original_file);

        let text = match mode {
            JoinMode::ExactPath => path_index
                .get(audio.original_file.as_str())
                .map(|s| s.to_string()),
            JoinMode::Substring { legacy_first_match } => {
                match find_containing(identifier, transcripts, legacy_first_match) {
                    Some(found) => {
                        if found.candidates > 1 {
                            if legacy_first_match {
                                debug!(
                                    "{}: {} candidates, using {}",
                                    audio.file_name, found.candidates, found.record.key.as_str()
                                );
                            } else {
                                warn!(
                                    "Ambiguous transcript match for {} (id {}): {} candidates, using {}",
                                    audio.file_name,
                                    identifier,
                                    found.candidates,
                                    found.record.key.as_str()
                                );
                                outcome.ambiguous.push(AmbiguousMatch {
                                    file_name: audio.file_name.clone(),
                                    identifier: identifier.to_string(),
                                    chosen: found.record.key.as_str().to_string(),
                                    candidates: found.candidates,
                                });
                            }
                        }
                        Some(found.record.sentence.clone())
                    }
                    None => None,
                }
            }
        };

        let record = UnifiedRecord {
            file_name: audio.file_name.clone(),
            original_file: audio.original_file.clone(),
            sentence_id: identifier.to_string(),
            text: text.unwrap_or_default(),
            duration_ms: audio.duration_ms,
        };

        // A transcript row with a blank sentence leaves the clip without text
        if record.has_text() {
            outcome.matched += 1;
        } else {
            debug!("No transcript text for {}", audio.file_name);
            outcome.unmatched.push(audio.file_name.clone());
        }
        outcome.records.push(record);
    }

    info!(
        "Joined {} records ({} mode): {} matched, {} unmatched, {} ambiguous",
        outcome.records.len(),
        mode,
        outcome.matched,
        outcome.unmatched.len(),
        outcome.ambiguous.len()
    );

    outcome
}

/// Map original clip filenames to sentences; the first row for a path wins
fn build_path_index(transcripts: &[TranscriptRecord]) -> HashMap<&str, &str> {
    let mut index = HashMap::with_capacity(transcripts.len());
    for transcript in transcripts {
        if let TranscriptKey::Path(path) = &transcript.key {
            index
                .entry(path.as_str())
                .or_insert(transcript.sentence.as_str());
        }
    }
    index
}

struct ContainmentMatch<'a> {
    record: &'a TranscriptRecord,
    candidates: usize,
}

/// First transcript whose identifier contains `identifier` or is contained by it.
///
/// With `stop_at_first` the scan ends at the first hit and `candidates` is 1.
fn find_containing<'a>(
    identifier: &str,
    transcripts: &'a [TranscriptRecord],
    stop_at_first: bool,
) -> Option<ContainmentMatch<'a>> {
    if identifier.is_empty() {
        return None;
    }

    let mut found: Option<ContainmentMatch<'a>> = None;
    for transcript in transcripts {
        let key = transcript.key.as_str();
        if key.is_empty() || !(key.contains(identifier) || identifier.contains(key)) {
            continue;
        }
        match found.as_mut() {
            Some(m) => m.candidates += 1,
            None => {
                found = Some(ContainmentMatch {
                    record: transcript,
                    candidates: 1,
                });
                if stop_at_first {
                    break;
                }
            }
        }
    }
    found
}
