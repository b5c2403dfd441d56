use crate::call_graph::CallGraph;
use crate::divergence::Divergence;
use crate::impact::attribution::{Attributor, IndirectImpact};
use crate::impact::config::{ImpactConfig, ReportMode};
use crate::impact::scoring::score_target;
use crate::syntax::{SyntaxChange, SyntaxChanges};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Code location a testing target points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "level", content = "id")]
pub enum TargetKey {
    Method(String),
    /// Used for classes that are new in this version.
    Class(String),
}

impl TargetKey {
    pub fn as_str(&self) -> &str {
        match self {
            TargetKey::Method(id) | TargetKey::Class(id) => id,
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(self, TargetKey::Class(_))
    }
}

impl Ord for TargetKey {
    /// Identifier first, so sorted output reads alphabetically.
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str()
            .cmp(other.as_str())
            .then_with(|| self.is_class().cmp(&other.is_class()))
    }
}

impl PartialOrd for TargetKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKey::Method(id) => write!(f, "{}", id),
            TargetKey::Class(id) => write!(f, "class {}", id),
        }
    }
}

/// Why a target exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetOrigin {
    /// The key carries at least one syntax change.
    SyntaxChange,
    /// Divergences no changed method could be blamed for.
    Unattributed,
    /// Divergence-only report: grouped by attributed method.
    Divergence,
}

/// A prioritized unit of code likely to need re-testing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestingTarget {
    pub key: TargetKey,
    pub origin: TargetOrigin,
    pub syntax_changes: Vec<SyntaxChange>,
    /// Divergences inside the target itself.
    pub direct: Vec<Divergence>,
    /// Divergences in unchanged code reached from the target.
    pub indirect: Vec<IndirectImpact>,
    pub score: f64,
}

impl TestingTarget {
    pub fn new(key: TargetKey, origin: TargetOrigin) -> Self {
        Self {
            key,
            origin,
            syntax_changes: Vec::new(),
            direct: Vec::new(),
            indirect: Vec::new(),
            score: 0.0,
        }
    }

    pub fn divergence_count(&self) -> usize {
        self.direct.len() + self.indirect.len()
    }

    /// Syntax changed but no behavior difference was observed.
    pub fn is_behavior_preserving(&self) -> bool {
        self.divergence_count() == 0
    }
}

/// Build, score and sort the testing targets of one version.
///
/// `divergences` are the detector results of every trace pair of the version.
/// With [`ReportMode::Full`] there is one target per changed method or class,
/// even when nothing diverged, plus one per method whose divergences no
/// changed method explains.
pub fn assemble_targets(
    divergences: Vec<Divergence>,
    changes: &SyntaxChanges,
    graph: &CallGraph,
    config: &ImpactConfig,
) -> Vec<TestingTarget> {
    let mut targets = match config.report {
        ReportMode::SyntaxOnly => syntax_targets(changes).into_values().collect(),
        ReportMode::DivergenceOnly => divergence_targets(divergences),
        ReportMode::Full => full_targets(divergences, changes, graph, config),
    };

    for target in &mut targets {
        target.score = score_target(target, &config.scoring);
    }
    sort_targets(&mut targets);
    targets
}

/// Highest score first; equal scores ordered by key.
pub fn sort_targets(targets: &mut [TestingTarget]) {
    targets.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.key.cmp(&b.key))
    });
}

fn syntax_targets(changes: &SyntaxChanges) -> BTreeMap<TargetKey, TestingTarget> {
    let methods = changes
        .methods()
        .map(|(method, list)| (TargetKey::Method(method.to_string()), list));
    let classes = changes
        .classes()
        .map(|(class, list)| (TargetKey::Class(class.to_string()), list));

    methods
        .chain(classes)
        .map(|(key, list)| {
            let mut target = TestingTarget::new(key.clone(), TargetOrigin::SyntaxChange);
            target.syntax_changes = list.to_vec();
            (key, target)
        })
        .collect()
}

fn divergence_targets(divergences: Vec<Divergence>) -> Vec<TestingTarget> {
    let mut grouped: BTreeMap<String, Vec<Divergence>> = BTreeMap::new();
    for divergence in divergences {
        grouped
            .entry(divergence.method().to_string())
            .or_default()
            .push(divergence);
    }
    grouped
        .into_iter()
        .map(|(method, list)| {
            let mut target = TestingTarget::new(TargetKey::Method(method), TargetOrigin::Divergence);
            target.direct = list;
            target
        })
        .collect()
}

fn full_targets(
    divergences: Vec<Divergence>,
    changes: &SyntaxChanges,
    graph: &CallGraph,
    config: &ImpactConfig,
) -> Vec<TestingTarget> {
    let buckets = Attributor::new(changes, graph, &config.attribution).attribute(divergences);
    let mut targets = syntax_targets(changes);

    for (key, list) in buckets.direct {
        targets
            .entry(key.clone())
            .or_insert_with(|| TestingTarget::new(key, TargetOrigin::SyntaxChange))
            .direct = list;
    }
    for (ancestor, list) in buckets.indirect {
        let key = TargetKey::Method(ancestor);
        targets
            .entry(key.clone())
            .or_insert_with(|| TestingTarget::new(key, TargetOrigin::SyntaxChange))
            .indirect = list;
    }

    let mut targets: Vec<TestingTarget> = targets.into_values().collect();
    targets.extend(buckets.unattributable.into_iter().map(|(method, list)| {
        let mut target = TestingTarget::new(TargetKey::Method(method), TargetOrigin::Unattributed);
        target.direct = list;
        target
    }));
    targets
}
