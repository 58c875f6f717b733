//! Metadata records and table loading

pub mod records;
pub mod table;

pub use records::{
    count_with_text, AudioRecord, TranscriptKey, TranscriptKeyKind, TranscriptRecord,
    UnifiedRecord,
};
pub use table::{Row, Table};
