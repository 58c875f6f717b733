//! Audio conversion modules

pub mod codec;
pub mod convert;

pub use codec::{DecodedAudio, SymphoniaTranscoder, Transcoder};
pub use convert::{convert_directory, list_source_files, ConversionFailure, ConversionSummary};
