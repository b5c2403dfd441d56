use crate::alignment::{equal_length_match, full_alignment, match_calls, quick_distance, CallEquality};
use crate::divergence::config::{ComparisonMode, DetectorConfig};
use crate::divergence::types::{
    Attribution, CoverageDivergence, Divergence, MethodCallDivergence, MethodCallKind,
    MetricDivergence, MetricKind, ObjectValueDivergence, ValueKind,
};
use crate::error::ImpactError;
use crate::invocation::{InvocationRef, InvocationTree, ValueDescriptor};
use std::collections::{BTreeMap, BTreeSet};

/// Depth-first comparator for pairs of invocations.
///
/// # Example
/// ```
/// use rastro::divergence::{DetectorConfig, Divergence, DivergenceDetector};
/// use rastro::invocation::{Invocation, InvocationKind, InvocationTree, ValueDescriptor};
///
/// let call = |value: &str| {
///     Invocation::new("m.Calc.sum()I", "m.Calc", InvocationKind::Method)
///         .with_return(ValueDescriptor::new("int", value, 0))
/// };
/// let old = InvocationTree::new("v1", call("3"));
/// let new = InvocationTree::new("v2", call("4"));
///
/// let detector = DivergenceDetector::new(DetectorConfig::default());
/// let divergences = detector.compare(new.root(), old.root()).unwrap();
/// assert_eq!(divergences.len(), 1);
/// assert!(matches!(divergences[0], Divergence::ObjectValue(_)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DivergenceDetector {
    config: DetectorConfig,
}

impl DivergenceDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Compare `new` against `old` and every matched descendant pair.
    ///
    /// Divergences come out in pre-order: an invocation's own findings
    /// precede those of its matched children, taken in call order.
    ///
    /// # Errors
    /// Only internal alignment failures ([`ImpactError::Backtrack`]).
    pub fn compare(
        &self,
        new: InvocationRef<'_>,
        old: InvocationRef<'_>,
    ) -> Result<Vec<Divergence>, ImpactError> {
        let mut divergences = Vec::new();
        let mut pending = vec![(new, old)];
        while let Some((new, old)) = pending.pop() {
            self.compare_pair(new, old, &mut divergences, &mut pending)?;
        }
        Ok(divergences)
    }

    fn compare_pair<'a>(
        &self,
        new: InvocationRef<'a>,
        old: InvocationRef<'a>,
        out: &mut Vec<Divergence>,
        pending: &mut Vec<(InvocationRef<'a>, InvocationRef<'a>)>,
    ) -> Result<(), ImpactError> {
        if !callers_consistent(new, old) {
            if new.method() != old.method() {
                let responsible = new.caller().or_else(|| old.caller()).unwrap_or(new);
                out.push(different_method_called(responsible, new, old));
            } else {
                tracing::warn!(
                    method = new.method(),
                    "Compared invocations have different callers; skipping branch"
                );
            }
            return Ok(());
        }

        if new.method() != old.method() {
            let responsible = new.caller().unwrap_or(new);
            out.push(different_method_called(responsible, new, old));
            return Ok(());
        }

        let before = out.len();
        self.compare_return_values(new, old, out);
        self.compare_parameters(new, old, out);
        match self.config.mode {
            ComparisonMode::Coverage => compare_coverage(new, old, out),
            ComparisonMode::Distance => compare_distance(new, old, out),
            ComparisonMode::Full => self.compare_full(new, old, out)?,
        }
        tracing::trace!(
            method = new.method(),
            found = out.len() - before,
            "Compared invocation"
        );

        self.compare_calls(new, old, out, pending)
    }

    fn values_differ(&self, new: &ValueDescriptor, old: &ValueDescriptor) -> bool {
        let filter = self.config.filter_object_identity;
        new.normalized(filter) != old.normalized(filter)
    }

    fn compare_return_values(
        &self,
        new: InvocationRef<'_>,
        old: InvocationRef<'_>,
        out: &mut Vec<Divergence>,
    ) {
        let new_value = &new.invocation().return_value;
        let old_value = &old.invocation().return_value;
        if self.values_differ(new_value, old_value) {
            out.push(Divergence::ObjectValue(ObjectValueDivergence {
                attribution: Attribution::of(new),
                kind: ValueKind::ReturnValue,
                old: old_value.clone(),
                new: new_value.clone(),
            }));
        }
    }

    /// Parameter values are chosen by the caller, so differences are attributed to it.
    fn compare_parameters(
        &self,
        new: InvocationRef<'_>,
        old: InvocationRef<'_>,
        out: &mut Vec<Divergence>,
    ) {
        let (Some(caller), Some(_)) = (new.caller(), old.caller()) else {
            return;
        };
        let new_params = &new.invocation().parameters;
        let old_params = &old.invocation().parameters;
        if new_params.len() != old_params.len() {
            // A changed arity comes with a syntax change on the signature.
            tracing::debug!(
                method = new.method(),
                new = new_params.len(),
                old = old_params.len(),
                "Parameter counts differ; skipping parameter comparison"
            );
            return;
        }

        for (new_param, old_param) in new_params.iter().zip(old_params) {
            if self.values_differ(new_param, old_param) {
                out.push(Divergence::ObjectValue(ObjectValueDivergence {
                    attribution: Attribution::of(caller),
                    kind: ValueKind::Parameter,
                    old: old_param.clone(),
                    new: new_param.clone(),
                }));
            }
        }
    }

    fn compare_full(
        &self,
        new: InvocationRef<'_>,
        old: InvocationRef<'_>,
        out: &mut Vec<Divergence>,
    ) -> Result<(), ImpactError> {
        let new_trace = new.trace_indices();
        let old_trace = old.trace_indices();
        if equal_length_match(&new_trace, &old_trace) {
            return Ok(());
        }

        let attribution = Attribution::of(new);
        if !self
            .config
            .allows_full_alignment(new_trace.len(), old_trace.len())
        {
            tracing::debug!(
                method = new.method(),
                new_len = new_trace.len(),
                old_len = old_trace.len(),
                "Trace exceeds alignment limit; using quick distance"
            );
            let distance = quick_distance(&new_trace, &old_trace, 0, &CallEquality::Any);
            push_metric(out, &attribution, MetricKind::Distance, distance);
            return Ok(());
        }

        let alignment = full_alignment(&new_trace, &old_trace, &CallEquality::Any)?;
        push_metric(out, &attribution, MetricKind::Distance, alignment.distance);
        push_metric(
            out,
            &attribution,
            MetricKind::DivergentSections,
            alignment.section_count(),
        );
        Ok(())
    }

    /// Pair children by called method and queue matched pairs.
    fn compare_calls<'a>(
        &self,
        new: InvocationRef<'a>,
        old: InvocationRef<'a>,
        out: &mut Vec<Divergence>,
        pending: &mut Vec<(InvocationRef<'a>, InvocationRef<'a>)>,
    ) -> Result<(), ImpactError> {
        let new_calls = new.child_methods();
        let old_calls = old.child_methods();
        let matching = match_calls(&new_calls, &old_calls)?;

        if !matching.is_identical() {
            let attribution = Attribution::of(new);
            for position in matching.unmatched_new() {
                out.push(Divergence::MethodCall(MethodCallDivergence {
                    attribution: attribution.clone(),
                    kind: MethodCallKind::AdditionalCall,
                    old_method: None,
                    new_method: Some(new_calls[position].to_string()),
                }));
            }
            for &position in &matching.unmatched_old {
                out.push(Divergence::MethodCall(MethodCallDivergence {
                    attribution: attribution.clone(),
                    kind: MethodCallKind::MissingCall,
                    old_method: Some(old_calls[position].to_string()),
                    new_method: None,
                }));
            }
        }

        // Reversed so the first matched child is popped next.
        let queued = pending.len();
        pending.extend(
            matching
                .matched_pairs()
                .filter_map(|(n, o)| new.child(n).zip(old.child(o))),
        );
        pending[queued..].reverse();
        Ok(())
    }
}

fn different_method_called(
    responsible: InvocationRef<'_>,
    new: InvocationRef<'_>,
    old: InvocationRef<'_>,
) -> Divergence {
    Divergence::MethodCall(MethodCallDivergence {
        attribution: Attribution::of(responsible),
        kind: MethodCallKind::DifferentMethodCalled,
        old_method: Some(old.method().to_string()),
        new_method: Some(new.method().to_string()),
    })
}

/// Both sides lack a caller, or both callers run the same method.
fn callers_consistent(new: InvocationRef<'_>, old: InvocationRef<'_>) -> bool {
    match (new.caller(), old.caller()) {
        (None, None) => true,
        (Some(a), Some(b)) => a.method() == b.method(),
        _ => false,
    }
}

fn push_metric(out: &mut Vec<Divergence>, attribution: &Attribution, kind: MetricKind, value: usize) {
    out.push(Divergence::Metric(MetricDivergence {
        attribution: attribution.clone(),
        kind,
        value,
    }));
}

fn compare_distance(new: InvocationRef<'_>, old: InvocationRef<'_>, out: &mut Vec<Divergence>) {
    let new_trace = new.trace_indices();
    let old_trace = old.trace_indices();
    let prefix = new_trace
        .iter()
        .zip(&old_trace)
        .take_while(|&(&n, &o)| CallEquality::Any.entries_match(n, o))
        .count();

    let distance = quick_distance(&new_trace, &old_trace, prefix, &CallEquality::Any);
    if distance > 0 {
        push_metric(out, &Attribution::of(new), MetricKind::Distance, distance);
    }
}

fn compare_coverage(new: InvocationRef<'_>, old: InvocationRef<'_>, out: &mut Vec<Divergence>) {
    let empty = BTreeMap::new();
    let new_counts = new.invocation().coverage.as_ref().unwrap_or(&empty);
    let old_counts = old.invocation().coverage.as_ref().unwrap_or(&empty);

    let recorded: BTreeSet<usize> = new_counts.keys().chain(old_counts.keys()).copied().collect();
    let attribution = Attribution::of(new);
    for instruction in recorded {
        let new_count = new_counts.get(&instruction).copied();
        let old_count = old_counts.get(&instruction).copied();
        if new_count != old_count {
            out.push(Divergence::Coverage(CoverageDivergence {
                attribution: attribution.clone(),
                instruction,
                old_count: old_count.unwrap_or(0),
                new_count: new_count.unwrap_or(0),
            }));
        }
    }
}

/// Compare two whole trees from their entry points.
pub fn compare_trees(
    new: &InvocationTree,
    old: &InvocationTree,
    config: &DetectorConfig,
) -> Result<Vec<Divergence>, ImpactError> {
    DivergenceDetector::new(config.clone()).compare(new.root(), old.root())
}
