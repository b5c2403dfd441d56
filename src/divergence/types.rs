use crate::invocation::{InvocationRef, ValueDescriptor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The invocation held responsible for a divergence.
///
/// Often the caller rather than the diverging callee: when a different method
/// got called, the decision was made by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Attribution {
    pub method: String,
    pub class_name: String,
}

impl Attribution {
    pub fn new(method: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            class_name: class_name.into(),
        }
    }

    pub fn of(invocation: InvocationRef<'_>) -> Self {
        Self::new(invocation.method(), invocation.class_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodCallKind {
    DifferentMethodCalled,
    AdditionalCall,
    MissingCall,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCallDivergence {
    pub attribution: Attribution,
    pub kind: MethodCallKind,
    pub old_method: Option<String>,
    pub new_method: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    ReturnValue,
    Parameter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectValueDivergence {
    pub attribution: Attribution,
    pub kind: ValueKind,
    pub old: ValueDescriptor,
    pub new: ValueDescriptor,
}

/// Execution count difference for one instruction index.
///
/// An index recorded on only one side carries a count of 0 on the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageDivergence {
    pub attribution: Attribution,
    pub instruction: usize,
    pub old_count: u64,
    pub new_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Edit distance between the instruction traces.
    Distance,
    /// Number of divergent spans found by the full alignment.
    DivergentSections,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDivergence {
    pub attribution: Attribution,
    pub kind: MetricKind,
    pub value: usize,
}

/// A behavioral difference between two compared invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Divergence {
    MethodCall(MethodCallDivergence),
    ObjectValue(ObjectValueDivergence),
    Coverage(CoverageDivergence),
    Metric(MetricDivergence),
}

impl Divergence {
    pub fn attribution(&self) -> &Attribution {
        match self {
            Divergence::MethodCall(d) => &d.attribution,
            Divergence::ObjectValue(d) => &d.attribution,
            Divergence::Coverage(d) => &d.attribution,
            Divergence::Metric(d) => &d.attribution,
        }
    }

    /// Method identifier of the responsible invocation.
    pub fn method(&self) -> &str {
        &self.attribution().method
    }
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Divergence::MethodCall(d) => match d.kind {
                MethodCallKind::DifferentMethodCalled => write!(
                    f,
                    "{}: called {} instead of {}",
                    d.attribution.method,
                    d.new_method.as_deref().unwrap_or("?"),
                    d.old_method.as_deref().unwrap_or("?")
                ),
                MethodCallKind::AdditionalCall => write!(
                    f,
                    "{}: additional call to {}",
                    d.attribution.method,
                    d.new_method.as_deref().unwrap_or("?")
                ),
                MethodCallKind::MissingCall => write!(
                    f,
                    "{}: missing call to {}",
                    d.attribution.method,
                    d.old_method.as_deref().unwrap_or("?")
                ),
            },
            Divergence::ObjectValue(d) => {
                let what = match d.kind {
                    ValueKind::ReturnValue => "return value",
                    ValueKind::Parameter => "parameter",
                };
                write!(
                    f,
                    "{}: {} changed from {:?} to {:?}",
                    d.attribution.method, what, d.old.display, d.new.display
                )
            }
            Divergence::Coverage(d) => write!(
                f,
                "{}: instruction {} executed {} times (was {})",
                d.attribution.method, d.instruction, d.new_count, d.old_count
            ),
            Divergence::Metric(d) => {
                let what = match d.kind {
                    MetricKind::Distance => "trace distance",
                    MetricKind::DivergentSections => "divergent sections",
                };
                write!(f, "{}: {} {}", d.attribution.method, what, d.value)
            }
        }
    }
}

/// Per-signal totals over a set of divergences; the input of target scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivergenceSummary {
    /// Sum of divergent-section metrics.
    pub divergent_sections: usize,
    /// Sum of distance metrics.
    pub distance: usize,
    pub return_values: usize,
    pub parameters: usize,
    pub coverage: usize,
    pub method_calls: usize,
}

impl DivergenceSummary {
    pub fn add(&mut self, divergence: &Divergence) {
        match divergence {
            Divergence::MethodCall(_) => self.method_calls += 1,
            Divergence::ObjectValue(d) => match d.kind {
                ValueKind::ReturnValue => self.return_values += 1,
                ValueKind::Parameter => self.parameters += 1,
            },
            Divergence::Coverage(_) => self.coverage += 1,
            Divergence::Metric(d) => match d.kind {
                MetricKind::Distance => self.distance += d.value,
                MetricKind::DivergentSections => self.divergent_sections += d.value,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl<'a> FromIterator<&'a Divergence> for DivergenceSummary {
    fn from_iter<I: IntoIterator<Item = &'a Divergence>>(iter: I) -> Self {
        let mut summary = Self::default();
        for divergence in iter {
            summary.add(divergence);
        }
        summary
    }
}
