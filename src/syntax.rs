//! Per-version syntax-change records.
//!
//! Syntax changes are computed by an external source-diff collaborator. The
//! core treats each record as opaque apart from its [`ChangeKind`], and only
//! distinguishes one special shape: a class whose sole change is the
//! [`ChangeKind::NewClass`] marker.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of a syntax change, comparable for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Delete,
    Update,
    Move,
    /// The whole class is new in this version.
    NewClass,
}

/// One externally computed syntax change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxChange {
    pub kind: ChangeKind,
    /// Free-form description from the diff tool (e.g. the edited node).
    #[serde(default)]
    pub detail: String,
}

impl SyntaxChange {
    pub fn new(kind: ChangeKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn new_class() -> Self {
        Self::new(ChangeKind::NewClass, "")
    }

    pub fn is_new_class(&self) -> bool {
        self.kind == ChangeKind::NewClass
    }
}

/// Syntax changes associated with one invocation's method or class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "level", content = "changes")]
pub enum SyntaxAssociation {
    #[default]
    None,
    Method(Vec<SyntaxChange>),
    Class(Vec<SyntaxChange>),
}

impl SyntaxAssociation {
    pub fn is_none(&self) -> bool {
        matches!(self, SyntaxAssociation::None)
    }

    /// Class-level association whose only record is the new-class marker.
    pub fn is_sole_new_class(&self) -> bool {
        match self {
            SyntaxAssociation::Class(changes) => is_sole_new_class(changes),
            _ => false,
        }
    }
}

fn is_sole_new_class(changes: &[SyntaxChange]) -> bool {
    matches!(changes, [only] if only.is_new_class())
}

/// Mapping from method and class identifiers to their syntax changes for one version.
///
/// Both maps are ordered so that every iteration over changed keys is
/// deterministic.
///
/// # Example
/// ```
/// use rastro::syntax::{ChangeKind, SyntaxChange, SyntaxChanges};
///
/// let mut changes = SyntaxChanges::new();
/// changes.add_method_change("shop.Cart.total()I", SyntaxChange::new(ChangeKind::Update, "loop"));
/// changes.mark_new_class("shop.Coupon");
///
/// assert!(changes.method_changes("shop.Cart.total()I").is_some());
/// assert!(changes.is_new_class("shop.Coupon"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxChanges {
    #[serde(default)]
    methods: BTreeMap<String, Vec<SyntaxChange>>,
    #[serde(default)]
    classes: BTreeMap<String, Vec<SyntaxChange>>,
}

impl SyntaxChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_method_change(&mut self, method: impl Into<String>, change: SyntaxChange) {
        self.methods.entry(method.into()).or_default().push(change);
    }

    pub fn add_class_change(&mut self, class: impl Into<String>, change: SyntaxChange) {
        self.classes.entry(class.into()).or_default().push(change);
    }

    pub fn mark_new_class(&mut self, class: impl Into<String>) {
        self.add_class_change(class, SyntaxChange::new_class());
    }

    /// Changes recorded against a method, if any.
    pub fn method_changes(&self, method: &str) -> Option<&[SyntaxChange]> {
        self.methods
            .get(method)
            .filter(|changes| !changes.is_empty())
            .map(Vec::as_slice)
    }

    /// Changes recorded against a class, if any.
    pub fn class_changes(&self, class: &str) -> Option<&[SyntaxChange]> {
        self.classes
            .get(class)
            .filter(|changes| !changes.is_empty())
            .map(Vec::as_slice)
    }

    /// True when the class carries exactly one change and it is the new-class marker.
    pub fn is_new_class(&self, class: &str) -> bool {
        self.class_changes(class).is_some_and(is_sole_new_class)
    }

    /// Resolve the association of a method belonging to `class`.
    ///
    /// Method-level changes win over class-level ones.
    pub fn association_for(&self, method: &str, class: &str) -> SyntaxAssociation {
        if let Some(changes) = self.method_changes(method) {
            return SyntaxAssociation::Method(changes.to_vec());
        }
        match self.class_changes(class) {
            Some(changes) => SyntaxAssociation::Class(changes.to_vec()),
            None => SyntaxAssociation::None,
        }
    }

    /// Changed method identifiers in lexicographic order.
    pub fn changed_methods(&self) -> impl Iterator<Item = &str> {
        self.methods
            .iter()
            .filter(|(_, changes)| !changes.is_empty())
            .map(|(method, _)| method.as_str())
    }

    /// Changed method entries in lexicographic order.
    pub fn methods(&self) -> impl Iterator<Item = (&str, &[SyntaxChange])> {
        self.methods
            .iter()
            .filter(|(_, changes)| !changes.is_empty())
            .map(|(method, changes)| (method.as_str(), changes.as_slice()))
    }

    /// Changed class entries in lexicographic order.
    pub fn classes(&self) -> impl Iterator<Item = (&str, &[SyntaxChange])> {
        self.classes
            .iter()
            .filter(|(_, changes)| !changes.is_empty())
            .map(|(class, changes)| (class.as_str(), changes.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.methods().next().is_none() && self.classes().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sole_new_class_marker() {
        let mut changes = SyntaxChanges::new();
        changes.mark_new_class("a.Fresh");
        changes.mark_new_class("a.Edited");
        changes.add_class_change("a.Edited", SyntaxChange::new(ChangeKind::Insert, "field"));

        assert!(changes.is_new_class("a.Fresh"));
        assert!(!changes.is_new_class("a.Edited"));
        assert!(!changes.is_new_class("a.Missing"));
    }

    #[test]
    fn test_method_association_wins_over_class() {
        let mut changes = SyntaxChanges::new();
        changes.add_method_change("a.B.run()V", SyntaxChange::new(ChangeKind::Update, "if"));
        changes.add_class_change("a.B", SyntaxChange::new(ChangeKind::Insert, "field"));

        assert!(matches!(
            changes.association_for("a.B.run()V", "a.B"),
            SyntaxAssociation::Method(ref c) if c.len() == 1
        ));
        assert!(matches!(
            changes.association_for("a.B.stop()V", "a.B"),
            SyntaxAssociation::Class(_)
        ));
        assert!(changes.association_for("x.Y.z()V", "x.Y").is_none());
    }

    #[test]
    fn test_changed_methods_are_sorted() {
        let mut changes = SyntaxChanges::new();
        changes.add_method_change("b()", SyntaxChange::new(ChangeKind::Update, ""));
        changes.add_method_change("a()", SyntaxChange::new(ChangeKind::Delete, ""));

        let methods: Vec<_> = changes.changed_methods().collect();
        assert_eq!(methods, vec!["a()", "b()"]);
        assert!(!changes.is_empty());
        assert!(SyntaxChanges::new().is_empty());
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{
            "methods": { "a.B.run()V": [ { "kind": "update", "detail": "call" } ] },
            "classes": { "a.C": [ { "kind": "new_class" } ] }
        }"#;
        let changes: SyntaxChanges = serde_json::from_str(json).unwrap();
        assert!(changes.method_changes("a.B.run()V").is_some());
        assert!(changes.is_new_class("a.C"));
    }
}
