use crate::call_graph::CallGraph;
use crate::divergence::{Attribution, Divergence};
use crate::impact::config::AttributionConfig;
use crate::impact::target::TargetKey;
use crate::syntax::SyntaxChanges;
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A divergence in an unchanged method, reached from a changed ancestor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndirectImpact {
    pub divergence: Divergence,
    /// Call edges between the changed ancestor and the attributed method.
    pub call_distance: usize,
}

/// Where a divergence's attributed method stands relative to the syntax changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The method itself changed, or belongs to a class that is new in this version.
    Direct(TargetKey),
    /// Changed ancestors and their call distances, ordered by method identifier.
    ///
    /// Never empty.
    Indirect(Vec<(String, usize)>),
    /// No changed ancestor reaches the method.
    Unattributable,
}

/// Divergences sorted into the three impact buckets.
#[derive(Debug, Clone, Default)]
pub struct ImpactBuckets {
    pub direct: BTreeMap<TargetKey, Vec<Divergence>>,
    /// Keyed by changed ancestor method.
    pub indirect: BTreeMap<String, Vec<IndirectImpact>>,
    /// Keyed by attributed method.
    pub unattributable: BTreeMap<String, Vec<Divergence>>,
}

impl ImpactBuckets {
    pub fn len(&self) -> usize {
        self.direct.values().map(Vec::len).sum::<usize>()
            + self.indirect.values().map(Vec::len).sum::<usize>()
            + self.unattributable.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classifies divergences against one version's syntax changes and call graph.
///
/// # Example
/// ```
/// use rastro::call_graph::CallGraph;
/// use rastro::divergence::Attribution;
/// use rastro::impact::{AttributionConfig, Attributor, Classification};
/// use rastro::syntax::{ChangeKind, SyntaxChange, SyntaxChanges};
///
/// let mut changes = SyntaxChanges::new();
/// changes.add_method_change("a.Cart.total()I", SyntaxChange::new(ChangeKind::Update, "sum"));
/// let graph = CallGraph::from_edges([("a.Cart.total()I", "a.Item.price()I")]);
/// let config = AttributionConfig::default();
///
/// let attributor = Attributor::new(&changes, &graph, &config);
/// let class = attributor.classify(&Attribution::new("a.Item.price()I", "a.Item"));
/// assert_eq!(class, Classification::Indirect(vec![("a.Cart.total()I".to_string(), 1)]));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Attributor<'a> {
    changes: &'a SyntaxChanges,
    graph: &'a CallGraph,
    config: &'a AttributionConfig,
}

impl<'a> Attributor<'a> {
    pub fn new(
        changes: &'a SyntaxChanges,
        graph: &'a CallGraph,
        config: &'a AttributionConfig,
    ) -> Self {
        Self {
            changes,
            graph,
            config,
        }
    }

    pub fn classify(&self, attribution: &Attribution) -> Classification {
        if self.changes.method_changes(&attribution.method).is_some() {
            return Classification::Direct(TargetKey::Method(attribution.method.clone()));
        }
        if self.changes.is_new_class(&attribution.class_name) {
            return Classification::Direct(TargetKey::Class(attribution.class_name.clone()));
        }

        let candidates = self
            .changes
            .changed_methods()
            .filter(|method| *method != attribution.method);
        let mut ancestors: Vec<(String, usize)> = self
            .graph
            .distance_to(&attribution.method, candidates)
            .into_iter()
            .filter_map(|(method, distance)| match distance {
                Some(d) if d > 0 && self.config.accepts_distance(d) => {
                    Some((method.to_string(), d))
                }
                _ => None,
            })
            .collect();

        if self.config.restrict_to_nearest {
            // Ancestors arrive in identifier order, so the first minimum wins ties.
            if let Some(nearest) = ancestors.iter().map(|(_, d)| *d).min() {
                ancestors.retain(|(_, d)| *d == nearest);
                ancestors.truncate(1);
            }
        }

        if ancestors.is_empty() {
            Classification::Unattributable
        } else {
            Classification::Indirect(ancestors)
        }
    }

    /// Sort every divergence into its bucket.
    ///
    /// Classification depends only on the attribution, so each distinct
    /// attributed method costs one breadth-first search.
    pub fn attribute<I>(&self, divergences: I) -> ImpactBuckets
    where
        I: IntoIterator<Item = Divergence>,
    {
        let mut cache: FnvHashMap<Attribution, Classification> = FnvHashMap::default();
        let mut buckets = ImpactBuckets::default();

        for divergence in divergences {
            let classification = cache
                .entry(divergence.attribution().clone())
                .or_insert_with_key(|attribution| self.classify(attribution));

            match classification {
                Classification::Direct(key) => {
                    buckets
                        .direct
                        .entry(key.clone())
                        .or_default()
                        .push(divergence);
                }
                Classification::Indirect(ancestors) => {
                    for (ancestor, call_distance) in ancestors.iter() {
                        buckets
                            .indirect
                            .entry(ancestor.clone())
                            .or_default()
                            .push(IndirectImpact {
                                divergence: divergence.clone(),
                                call_distance: *call_distance,
                            });
                    }
                }
                Classification::Unattributable => {
                    buckets
                        .unattributable
                        .entry(divergence.method().to_string())
                        .or_default()
                        .push(divergence);
                }
            }
        }

        tracing::debug!(
            attributed_methods = cache.len(),
            direct = buckets.direct.len(),
            indirect = buckets.indirect.len(),
            unattributable = buckets.unattributable.len(),
            "Attributed divergences"
        );
        buckets
    }
}
