// Configuration for a full impact analysis run

use crate::divergence::DetectorConfig;
use crate::error::ImpactError;
use crate::impact::scoring::ScoringWeights;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../../impact-default.toml");

/// Which evidence the testing targets are built from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// Syntax changes combined with attributed divergences.
    #[default]
    Full,
    /// One target per syntax change; traces are not compared.
    SyntaxOnly,
    /// One target per method with divergences; syntax changes are ignored.
    DivergenceOnly,
}

/// How divergences in unchanged methods are traced back to changed ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributionConfig {
    /// Record an indirect impact only against the closest changed ancestor.
    ///
    /// Equally close ancestors are ranked by method identifier.
    ///
    /// Default: false (every reachable changed ancestor)
    pub restrict_to_nearest: bool,

    /// Ignore changed ancestors more than this many call edges away.
    ///
    /// Default: unlimited
    pub max_call_distance: Option<usize>,
}

impl AttributionConfig {
    pub fn accepts_distance(&self, distance: usize) -> bool {
        self.max_call_distance.map_or(true, |limit| distance <= limit)
    }
}

/// Complete configuration of one analysis run.
///
/// # Example
/// ```
/// use rastro::impact::{ImpactConfig, ReportMode};
///
/// let config = ImpactConfig::from_toml_str(r#"
///     report = "syntax_only"
///
///     [attribution]
///     restrict_to_nearest = true
/// "#)?;
///
/// assert_eq!(config.report, ReportMode::SyntaxOnly);
/// assert!(config.attribution.restrict_to_nearest);
/// assert_eq!(config.scoring.new_class, 5.0); // unspecified values keep defaults
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactConfig {
    pub detector: DetectorConfig,
    pub attribution: AttributionConfig,
    pub scoring: ScoringWeights,
    pub report: ReportMode,
}

impl ImpactConfig {
    /// Attribute each indirect divergence to its closest changed ancestor only.
    pub fn nearest_only() -> Self {
        Self {
            attribution: AttributionConfig {
                restrict_to_nearest: true,
                max_call_distance: None,
            },
            ..Self::default()
        }
    }

    /// Load and validate a configuration file
    ///
    /// # Errors
    /// Returns error if the file cannot be read, is not valid TOML, or
    /// contains out-of-range values.
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read impact config: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid impact config: {}", path.as_ref().display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).context("Failed to parse TOML impact configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// The configuration shipped with the crate.
    pub fn embedded() -> Result<Self> {
        Self::from_toml_str(DEFAULT_TOML).context("Embedded default configuration is invalid")
    }

    pub fn validate(&self) -> Result<(), ImpactError> {
        self.detector.validate()?;
        self.scoring.validate()?;
        if self.attribution.max_call_distance == Some(0) {
            return Err(ImpactError::InvalidConfig(
                "max_call_distance must be positive; 0 would discard every indirect impact"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::divergence::ComparisonMode;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_embedded_matches_default() {
        let embedded = ImpactConfig::embedded().unwrap();
        assert_eq!(embedded, ImpactConfig::default());
    }

    #[test]
    fn test_nearest_only_preset() {
        let config = ImpactConfig::nearest_only();
        assert!(config.attribution.restrict_to_nearest);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ImpactConfig::from_toml_str(
            r#"
            [detector]
            mode = "distance"

            [scoring]
            call_distance = 2.5
            "#,
        )
        .unwrap();

        assert_eq!(config.detector.mode, ComparisonMode::Distance);
        assert!(config.detector.filter_object_identity);
        assert_eq!(config.scoring.call_distance, 2.5);
        assert_eq!(config.scoring.non_local, ScoringWeights::default().non_local);
    }

    #[test]
    fn test_signal_tables_must_be_complete() {
        let err = ImpactConfig::from_toml_str("[scoring.local]\ndistance = 1.0\n").unwrap_err();
        assert!(format!("{:#}", err).contains("missing field"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = ImpactConfig::from_toml_str("[attribution]\nmax_call_distance = 0\n").unwrap_err();
        assert!(format!("{:#}", err).contains("max_call_distance"));

        assert!(ImpactConfig::from_toml_str("[detector]\nmax_alignment_length = 0\n").is_err());
        assert!(ImpactConfig::from_toml_str("report = \"everything\"").is_err());
    }

    #[test]
    fn test_from_toml_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "report = \"divergence_only\"")?;
        writeln!(file, "[attribution]")?;
        writeln!(file, "max_call_distance = 3")?;
        file.flush()?;

        let config = ImpactConfig::from_toml(file.path())?;
        assert_eq!(config.report, ReportMode::DivergenceOnly);
        assert!(config.attribution.accepts_distance(3));
        assert!(!config.attribution.accepts_distance(4));
        Ok(())
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = ImpactConfig::from_toml("/nonexistent/impact.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/impact.toml"));
    }
}
