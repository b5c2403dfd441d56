// Priority scoring for testing targets
//
// score = local · S(direct) + non_local · S(indirect)
//       + call_distance · Σ indirect call-chain distances
//       + affected_methods · |distinct attributed methods|
//       + Σ per syntax change (new_class or syntax_change)
//
// where S(..) is the DivergenceSummary of a divergence list.

use crate::divergence::DivergenceSummary;
use crate::error::ImpactError;
use crate::impact::target::TestingTarget;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One coefficient per divergence signal.
///
/// A configuration table of signal weights must list all six coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalWeights {
    pub divergent_sections: f64,
    pub distance: f64,
    pub return_values: f64,
    pub parameters: f64,
    pub coverage: f64,
    pub method_calls: f64,
}

impl SignalWeights {
    /// Coefficients for divergences inside the changed unit.
    ///
    /// Differences at the edit site are expected, so they count little.
    pub fn local() -> Self {
        Self {
            divergent_sections: 0.1,
            distance: 0.01,
            return_values: 0.1,
            parameters: 0.1,
            coverage: 0.01,
            method_calls: 0.1,
        }
    }

    /// Coefficients for divergences reached through the call graph.
    pub fn non_local() -> Self {
        Self {
            divergent_sections: 10.0,
            distance: 1.0,
            return_values: 10.0,
            parameters: 10.0,
            coverage: 1.0,
            method_calls: 10.0,
        }
    }

    pub fn apply(&self, summary: &DivergenceSummary) -> f64 {
        self.divergent_sections * summary.divergent_sections as f64
            + self.distance * summary.distance as f64
            + self.return_values * summary.return_values as f64
            + self.parameters * summary.parameters as f64
            + self.coverage * summary.coverage as f64
            + self.method_calls * summary.method_calls as f64
    }

    fn values(&self) -> [(&'static str, f64); 6] {
        [
            ("divergent_sections", self.divergent_sections),
            ("distance", self.distance),
            ("return_values", self.return_values),
            ("parameters", self.parameters),
            ("coverage", self.coverage),
            ("method_calls", self.method_calls),
        ]
    }
}

/// Tunable coefficients of the priority score.
///
/// # Example
/// ```
/// use rastro::impact::ScoringWeights;
///
/// let weights = ScoringWeights::default();
/// assert!(weights.non_local.divergent_sections > weights.local.divergent_sections);
/// assert!(weights.new_class > weights.syntax_change);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Applied to direct impacts.
    pub local: SignalWeights,

    /// Applied to indirect impacts.
    pub non_local: SignalWeights,

    /// Multiplies the summed call-chain distance of indirect impacts.
    pub call_distance: f64,

    /// Multiplies the number of distinct methods the target's divergences
    /// are attributed to.
    pub affected_methods: f64,

    /// Flat bonus per ordinary syntax change.
    pub syntax_change: f64,

    /// Flat bonus per new-class marker.
    pub new_class: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            local: SignalWeights::local(),
            non_local: SignalWeights::non_local(),
            call_distance: 1.0,
            affected_methods: 1.0,
            syntax_change: 0.5,
            new_class: 5.0,
        }
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> Result<(), ImpactError> {
        let scalars = [
            ("call_distance", self.call_distance),
            ("affected_methods", self.affected_methods),
            ("syntax_change", self.syntax_change),
            ("new_class", self.new_class),
        ];
        let signals = self
            .local
            .values()
            .into_iter()
            .map(|(name, value)| (format!("local.{}", name), value))
            .chain(
                self.non_local
                    .values()
                    .into_iter()
                    .map(|(name, value)| (format!("non_local.{}", name), value)),
            );

        for (name, value) in scalars
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .chain(signals)
        {
            if !value.is_finite() || value < 0.0 {
                return Err(ImpactError::InvalidConfig(format!(
                    "scoring weight {} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Priority score of one target.
pub fn score_target(target: &TestingTarget, weights: &ScoringWeights) -> f64 {
    let local: DivergenceSummary = target.direct.iter().collect();
    let non_local: DivergenceSummary = target.indirect.iter().map(|i| &i.divergence).collect();

    let call_distance: usize = target.indirect.iter().map(|i| i.call_distance).sum();

    let affected: BTreeSet<&str> = target
        .direct
        .iter()
        .chain(target.indirect.iter().map(|i| &i.divergence))
        .map(|d| d.method())
        .collect();

    let syntax: f64 = target
        .syntax_changes
        .iter()
        .map(|change| {
            if change.is_new_class() {
                weights.new_class
            } else {
                weights.syntax_change
            }
        })
        .sum();

    weights.local.apply(&local)
        + weights.non_local.apply(&non_local)
        + weights.call_distance * call_distance as f64
        + weights.affected_methods * affected.len() as f64
        + syntax
}
