//! Deterministic train/validation splitting

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::metadata::UnifiedRecord;

/// Fraction of records assigned to train, validated to lie in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct SplitRatio(f64);

impl SplitRatio {
    pub fn new(ratio: f64) -> Result<Self, ConfigError> {
        if (0.0..=1.0).contains(&ratio) {
            Ok(Self(ratio))
        } else {
            Err(ConfigError::InvalidValue {
                field: "split.ratio".to_string(),
                value: ratio.to_string(),
            })
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Number of train records out of `n`, rounded down
    pub fn train_len(&self, n: usize) -> usize {
        ((self.0 * n as f64).floor() as usize).min(n)
    }
}

impl TryFrom<f64> for SplitRatio {
    type Error = ConfigError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SplitRatio> for f64 {
    fn from(ratio: SplitRatio) -> Self {
        ratio.0
    }
}

/// Which side of a split a record landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitLabel {
    Train,
    Validation,
}

impl std::fmt::Display for SplitLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitLabel::Train => write!(f, "train"),
            SplitLabel::Validation => write!(f, "val"),
        }
    }
}

/// Disjoint train and validation subsets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<UnifiedRecord>,
    pub val: Vec<UnifiedRecord>,
}

impl Split {
    pub fn len(&self) -> usize {
        self.train.len() + self.val.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train.is_empty() && self.val.is_empty()
    }

    pub fn get(&self, label: SplitLabel) -> &[UnifiedRecord] {
        match label {
            SplitLabel::Train => &self.train,
            SplitLabel::Validation => &self.val,
        }
    }
}

/// Shuffle `records` with a seeded RNG and cut at `floor(ratio * n)`.
///
/// The same seed and the same input order always give the same split.
pub fn split(records: &[UnifiedRecord], ratio: SplitRatio, seed: u64) -> Split {
    let mut shuffled = records.to_vec();
    let mut rng = StdRng::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);

    let cut = ratio.train_len(shuffled.len());
    let val = shuffled.split_off(cut);

    debug!(
        "Split {} records at {} (ratio {}, seed {})",
        records.len(),
        cut,
        ratio.value(),
        seed
    );

    Split {
        train: shuffled,
        val,
    }
}
