// Configuration for the divergence detector

use crate::error::ImpactError;
use serde::{Deserialize, Serialize};

/// Control-flow comparison mode; exactly one is active per run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    /// Compare per-instruction execution counts.
    Coverage,
    /// Quick edit distance only.
    Distance,
    /// Equal-length fast path, then full alignment with divergent sections.
    #[default]
    Full,
}

/// Settings threaded into every comparison.
///
/// # Example
/// ```
/// use rastro::divergence::{ComparisonMode, DetectorConfig};
///
/// let config = DetectorConfig::default();
/// assert_eq!(config.mode, ComparisonMode::Full);
/// assert!(config.filter_object_identity);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub mode: ComparisonMode,

    /// Blank values whose text looks like a default object rendering
    /// (`Type@hash`) before comparing.
    ///
    /// Default: true
    pub filter_object_identity: bool,

    /// Longest trace the full alignment will process.
    ///
    /// The full alignment keeps an n*m matrix. Longer traces fall back to the
    /// quick distance and report no divergent sections. `None` disables the
    /// guard.
    ///
    /// Default: 2000 entries
    pub max_alignment_length: Option<usize>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            mode: ComparisonMode::Full,
            filter_object_identity: true,
            max_alignment_length: Some(2_000),
        }
    }
}

impl DetectorConfig {
    pub fn with_mode(mode: ComparisonMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ImpactError> {
        if self.max_alignment_length == Some(0) {
            return Err(ImpactError::InvalidConfig(
                "max_alignment_length must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// True when both traces are short enough for the full alignment.
    pub fn allows_full_alignment(&self, new_len: usize, old_len: usize) -> bool {
        self.max_alignment_length
            .map_or(true, |limit| new_len <= limit && old_len <= limit)
    }
}
