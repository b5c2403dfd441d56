use crate::call_graph::CallGraph;
use crate::divergence::{Divergence, DivergenceDetector, DivergenceSummary};
use crate::impact::{assemble_targets, ImpactConfig, ReportMode, TargetOrigin, TestingTarget};
use crate::invocation::InvocationTree;
use crate::syntax::SyntaxChanges;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A recorded execution of the newer version and its counterpart in the older one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracePair {
    /// Identifies the pair in reports (typically the test name).
    pub label: String,
    pub new: InvocationTree,
    pub old: InvocationTree,
}

impl TracePair {
    pub fn new(label: impl Into<String>, new: InvocationTree, old: InvocationTree) -> Self {
        Self {
            label: label.into(),
            new,
            old,
        }
    }
}

/// Raw detector output for one trace pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairDivergences {
    pub label: String,
    pub divergences: Vec<Divergence>,
}

/// Result of analyzing one version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionReport {
    pub version: String,
    pub mode: ReportMode,
    /// In input order.
    pub pairs: Vec<PairDivergences>,
    /// Highest priority first.
    pub targets: Vec<TestingTarget>,
}

impl VersionReport {
    pub fn divergence_count(&self) -> usize {
        self.pairs.iter().map(|p| p.divergences.len()).sum()
    }

    pub fn summary(&self) -> DivergenceSummary {
        self.pairs.iter().flat_map(|p| &p.divergences).collect()
    }

    /// Format the report as a human-readable string
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        report.push_str(&format!(
            "IMPACT REPORT for version {} ({:?} mode)\n\n",
            self.version, self.mode
        ));

        if self.targets.is_empty() {
            report.push_str("✅ NO TESTING TARGETS\n");
        } else {
            report.push_str(&format!("🎯 TESTING TARGETS ({})\n", self.targets.len()));
            for (rank, target) in self.targets.iter().enumerate() {
                let origin = match target.origin {
                    TargetOrigin::SyntaxChange => "changed",
                    TargetOrigin::Unattributed => "unattributed",
                    TargetOrigin::Divergence => "diverged",
                };
                report.push_str(&format!(
                    "  {:>3}. {} [{}] score={:.2} syntax={} direct={} indirect={}\n",
                    rank + 1,
                    target.key,
                    origin,
                    target.score,
                    target.syntax_changes.len(),
                    target.direct.len(),
                    target.indirect.len()
                ));
            }
        }

        let summary = self.summary();
        report.push_str(&format!(
            "\nDivergences: {} across {} trace pairs\n",
            self.divergence_count(),
            self.pairs.len()
        ));
        if !summary.is_empty() {
            report.push_str(&format!(
                "  method calls={} return values={} parameters={} coverage={} distance={} sections={}\n",
                summary.method_calls,
                summary.return_values,
                summary.parameters,
                summary.coverage,
                summary.distance,
                summary.divergent_sections
            ));
        }
        for pair in self.pairs.iter().filter(|p| !p.divergences.is_empty()) {
            report.push_str(&format!("\n{}:\n", pair.label));
            for divergence in &pair.divergences {
                report.push_str(&format!("  - {}\n", divergence));
            }
        }

        report
    }
}

/// Validate both trees of a pair and run the detector on them.
pub fn compare_pair(pair: &TracePair, detector: &DivergenceDetector) -> Result<PairDivergences> {
    pair.new
        .validate()
        .with_context(|| format!("Malformed newer trace in pair {}", pair.label))?;
    pair.old
        .validate()
        .with_context(|| format!("Malformed older trace in pair {}", pair.label))?;

    let divergences = detector
        .compare(pair.new.root(), pair.old.root())
        .with_context(|| format!("Failed to compare trace pair {}", pair.label))?;
    tracing::debug!(
        pair = %pair.label,
        divergences = divergences.len(),
        "Compared trace pair"
    );

    Ok(PairDivergences {
        label: pair.label.clone(),
        divergences,
    })
}

/// Build the report from already compared pairs.
pub fn assemble_report(
    version: &str,
    pairs: Vec<PairDivergences>,
    changes: &SyntaxChanges,
    graph: &CallGraph,
    config: &ImpactConfig,
) -> VersionReport {
    let all: Vec<Divergence> = pairs
        .iter()
        .flat_map(|p| p.divergences.iter().cloned())
        .collect();
    let targets = assemble_targets(all, changes, graph, config);

    tracing::info!(
        version,
        pairs = pairs.len(),
        targets = targets.len(),
        "Assembled testing targets"
    );

    VersionReport {
        version: version.to_string(),
        mode: config.report,
        pairs,
        targets,
    }
}

/// Analyze one version end to end.
///
/// # Errors
/// Returns error if the configuration is invalid, a trace tree is malformed,
/// or alignment hits an internal failure.
///
/// # Example
/// ```
/// use rastro::analysis::{analyze_version, TracePair};
/// use rastro::call_graph::CallGraph;
/// use rastro::impact::ImpactConfig;
/// use rastro::invocation::{Invocation, InvocationKind, InvocationTree, ValueDescriptor};
/// use rastro::syntax::{ChangeKind, SyntaxChange, SyntaxChanges};
///
/// let total = |value: &str| {
///     Invocation::new("shop.Cart.total()I", "shop.Cart", InvocationKind::Method)
///         .with_return(ValueDescriptor::new("int", value, 0))
/// };
/// let pair = TracePair::new(
///     "CartTest.testTotal",
///     InvocationTree::new("v2", total("12")),
///     InvocationTree::new("v1", total("10")),
/// );
///
/// let mut changes = SyntaxChanges::new();
/// changes.add_method_change("shop.Cart.total()I", SyntaxChange::new(ChangeKind::Update, "tax"));
///
/// let report = analyze_version("v2", &[pair], &changes, &CallGraph::default(), &ImpactConfig::default())?;
/// assert_eq!(report.targets.len(), 1);
/// assert_eq!(report.targets[0].direct.len(), 1);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn analyze_version(
    version: &str,
    pairs: &[TracePair],
    changes: &SyntaxChanges,
    graph: &CallGraph,
    config: &ImpactConfig,
) -> Result<VersionReport> {
    config.validate().context("Invalid impact configuration")?;

    let compared = if config.report == ReportMode::SyntaxOnly {
        Vec::new()
    } else {
        let detector = DivergenceDetector::new(config.detector.clone());
        pairs
            .iter()
            .map(|pair| compare_pair(pair, &detector))
            .collect::<Result<Vec<_>>>()?
    };

    Ok(assemble_report(version, compared, changes, graph, config))
}
