//! Clip identifier extraction from corpus filenames

use crate::config::IdentifierConfig;

/// Strips the corpus prefix and source extension from clip filenames.
///
/// `common_voice_te_43371640.mp3` becomes `43371640`. Normalization is total:
/// a filename missing the prefix or the extension keeps that part, so the
/// worst outcome of an unexpected name is a less precise join downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierNormalizer {
    prefix: String,
    source_extension: String,
    target_extension: String,
}

impl IdentifierNormalizer {
    pub fn new(
        prefix: impl Into<String>,
        source_extension: impl Into<String>,
        target_extension: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            source_extension: source_extension.into(),
            target_extension: target_extension.into(),
        }
    }

    pub fn from_config(config: &IdentifierConfig) -> Self {
        Self::new(
            config.prefix.clone(),
            config.source_extension.clone(),
            config.target_extension.clone(),
        )
    }

    /// Extract the identifier from a clip filename
    pub fn normalize<'a>(&self, filename: &'a str) -> &'a str {
        let rest = filename.strip_prefix(&self.prefix).unwrap_or(filename);
        rest.strip_suffix(&self.source_extension).unwrap_or(rest)
    }

    /// Name of the converted file for a source clip (`a.mp3` -> `a.wav`)
    pub fn retarget(&self, filename: &str) -> String {
        let stem = filename
            .strip_suffix(&self.source_extension)
            .unwrap_or(filename);
        format!("{}{}", stem, self.target_extension)
    }

    /// Whether `filename` carries the source extension
    pub fn is_source(&self, filename: &str) -> bool {
        filename.ends_with(&self.source_extension)
    }

    pub fn source_extension(&self) -> &str {
        &self.source_extension
    }

    pub fn target_extension(&self) -> &str {
        &self.target_extension
    }
}

impl Default for IdentifierNormalizer {
    fn default() -> Self {
        Self::from_config(&IdentifierConfig::default())
    }
}
