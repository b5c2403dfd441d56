//! Invocation trees recorded from one execution trace
//!
//! Each recorded trace file yields one [`InvocationTree`]: the entry-point
//! invocation at the root and every nested call below it. Nodes live in an
//! arena owned by the tree and refer to each other through [`InvocationId`],
//! so the caller back-reference is a plain index rather than an owning pointer.
//!
//! # Instruction traces and call markers
//!
//! An invocation's instruction trace is an ordered list of `(index, description)`
//! pairs. Non-negative indices are executed instructions. Negative indices are
//! call markers: `-(k + 1)` stands for the `k`-th child invocation.
//!
//! ```text
//! Cart.total()        trace: [0, 1, -1, 4, -2, 7]
//! ├─ Item.price()     (child 0, marker -1)
//! └─ Tax.apply()      (child 1, marker -2)
//! ```
//!
//! Trees are built top-down with [`InvocationTree::push_call`], which appends
//! the marker and the child together so marker count and child count always
//! agree. Trees that arrive pre-assembled (e.g. deserialized from JSON) should
//! be checked with [`InvocationTree::validate`].
//!
//! # Example
//!
//! ```
//! use rastro::invocation::{Invocation, InvocationKind, InvocationTree};
//!
//! let mut tree = InvocationTree::new(
//!     "v2",
//!     Invocation::new("shop.Cart.total()I", "shop.Cart", InvocationKind::Method),
//! );
//! let root = tree.root_id();
//! tree.push_instruction(root, 0, "ILOAD");
//! let child = tree.push_call(
//!     root,
//!     Invocation::new("shop.Item.price()I", "shop.Item", InvocationKind::Method),
//! );
//! tree.push_instruction(root, 1, "IRETURN");
//!
//! assert_eq!(tree.root().trace_indices(), vec![0, -1, 1]);
//! assert_eq!(tree.get(child).caller().map(|c| c.method()), Some("shop.Cart.total()I"));
//! assert!(tree.validate().is_ok());
//! ```

use crate::error::ImpactError;
use crate::syntax::{SyntaxAssociation, SyntaxChanges};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Index of an invocation inside its [`InvocationTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(pub usize);

/// What kind of code unit was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationKind {
    Constructor,
    Method,
    StaticInitializer,
}

/// Recorded description of a returned value or a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDescriptor {
    /// Runtime type of the value.
    pub class_name: String,
    /// Text rendering captured at runtime.
    pub display: String,
    /// Identity hash captured at runtime.
    pub identity_hash: i64,
}

impl ValueDescriptor {
    pub fn new(class_name: impl Into<String>, display: impl Into<String>, identity_hash: i64) -> Self {
        Self {
            class_name: class_name.into(),
            display: display.into(),
            identity_hash,
        }
    }

    /// Descriptor recorded for methods without a return value.
    pub fn void() -> Self {
        Self::new("void", "", 0)
    }

    /// Normalized form used for comparisons: `<class> [<display>] hash: <hash>`.
    ///
    /// With `filter_identity` set, a display string containing `@` is the
    /// default object-to-text rendering (type plus address) and carries no
    /// behavioral information, so the display and the hash are blanked.
    pub fn normalized(&self, filter_identity: bool) -> String {
        if filter_identity && self.display.contains('@') {
            format!("{} [] hash: 0", self.class_name)
        } else {
            format!(
                "{} [{}] hash: {}",
                self.class_name, self.display, self.identity_hash
            )
        }
    }
}

impl Default for ValueDescriptor {
    fn default() -> Self {
        Self::void()
    }
}

/// One entry of an instruction trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Instruction index, or a call marker when negative.
    pub index: i64,
    pub description: String,
}

impl TraceEntry {
    pub fn is_call(&self) -> bool {
        self.index < 0
    }

    /// Child position referenced by a call marker.
    pub fn child_position(&self) -> Option<usize> {
        marker_child(self.index)
    }
}

/// Child position encoded by a call marker `-(k + 1)`.
pub fn marker_child(index: i64) -> Option<usize> {
    if index < 0 {
        usize::try_from(-(index + 1)).ok()
    } else {
        None
    }
}

/// Call marker for the child at `position`.
pub fn call_marker(position: usize) -> i64 {
    -(position as i64) - 1
}

/// One recorded call of a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Fully qualified name plus signature.
    pub method: String,
    /// Owning class identifier.
    pub class_name: String,
    pub kind: InvocationKind,
    #[serde(default)]
    pub caller: Option<InvocationId>,
    #[serde(default)]
    pub children: Vec<InvocationId>,
    #[serde(default)]
    pub trace: Vec<TraceEntry>,
    #[serde(default)]
    pub return_value: ValueDescriptor,
    #[serde(default)]
    pub parameters: Vec<ValueDescriptor>,
    /// Instruction index to execution count.
    #[serde(default)]
    pub coverage: Option<BTreeMap<usize, u64>>,
}

impl Invocation {
    pub fn new(method: impl Into<String>, class_name: impl Into<String>, kind: InvocationKind) -> Self {
        Self {
            method: method.into(),
            class_name: class_name.into(),
            kind,
            caller: None,
            children: Vec::new(),
            trace: Vec::new(),
            return_value: ValueDescriptor::void(),
            parameters: Vec::new(),
            coverage: None,
        }
    }

    pub fn with_return(mut self, value: ValueDescriptor) -> Self {
        self.return_value = value;
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<ValueDescriptor>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_coverage(mut self, coverage: BTreeMap<usize, u64>) -> Self {
        self.coverage = Some(coverage);
        self
    }
}

/// Arena-backed call tree for one recorded trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationTree {
    /// Version the trace was recorded against.
    pub version: String,
    nodes: Vec<Invocation>,
}

impl InvocationTree {
    /// Start a tree with its entry-point invocation.
    ///
    /// Any caller, children or call markers already present on `root` are
    /// discarded; nested calls are added with [`push_call`](Self::push_call).
    pub fn new(version: impl Into<String>, mut root: Invocation) -> Self {
        root.caller = None;
        root.children.clear();
        root.trace.retain(|entry| !entry.is_call());
        Self {
            version: version.into(),
            nodes: vec![root],
        }
    }

    pub fn root_id(&self) -> InvocationId {
        InvocationId(0)
    }

    pub fn root(&self) -> InvocationRef<'_> {
        self.get(self.root_id())
    }

    /// Handle for `id`.
    ///
    /// # Panics
    /// Panics if `id` does not belong to this tree.
    pub fn get(&self, id: InvocationId) -> InvocationRef<'_> {
        assert!(id.0 < self.nodes.len(), "invocation {:?} out of range", id);
        InvocationRef { tree: self, id }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append an executed instruction to an invocation's trace.
    pub fn push_instruction(&mut self, id: InvocationId, index: u32, description: impl Into<String>) {
        self.nodes[id.0].trace.push(TraceEntry {
            index: i64::from(index),
            description: description.into(),
        });
    }

    /// Record a nested call: appends the call marker to the parent's trace and
    /// the child to the parent's child list.
    pub fn push_call(&mut self, parent: InvocationId, mut child: Invocation) -> InvocationId {
        let id = InvocationId(self.nodes.len());
        child.caller = Some(parent);
        child.children.clear();
        child.trace.retain(|entry| !entry.is_call());

        let node = &mut self.nodes[parent.0];
        let position = node.children.len();
        node.trace.push(TraceEntry {
            index: call_marker(position),
            description: format!("invoke {}", child.method),
        });
        node.children.push(id);
        self.nodes.push(child);
        id
    }

    /// Check that every call marker resolves to a child and that marker and
    /// child counts agree.
    pub fn validate(&self) -> Result<(), ImpactError> {
        let Some(root) = self.nodes.first() else {
            return Err(ImpactError::EmptyTree {
                version: self.version.clone(),
            });
        };
        if root.caller.is_some() {
            return Err(ImpactError::InconsistentCaller {
                method: root.method.clone(),
            });
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            let mut markers = 0usize;
            for entry in node.trace.iter().filter(|e| e.is_call()) {
                markers += 1;
                match entry.child_position() {
                    Some(pos) if pos < node.children.len() => {}
                    _ => {
                        return Err(ImpactError::DanglingCallMarker {
                            method: node.method.clone(),
                            marker: entry.index,
                        })
                    }
                }
            }
            if markers != node.children.len() {
                return Err(ImpactError::CallMarkerCount {
                    method: node.method.clone(),
                    markers,
                    children: node.children.len(),
                });
            }
            for (position, child) in node.children.iter().enumerate() {
                let Some(child_node) = self.nodes.get(child.0) else {
                    return Err(ImpactError::DanglingCallMarker {
                        method: node.method.clone(),
                        marker: call_marker(position),
                    });
                };
                if child.0 == 0 || child_node.caller != Some(InvocationId(idx)) {
                    return Err(ImpactError::InconsistentCaller {
                        method: child_node.method.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Parse a tree handed over as JSON and check its structure.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let tree: Self = serde_json::from_str(json).context("Failed to parse invocation tree")?;
        tree.validate()
            .with_context(|| format!("Malformed invocation tree for version {}", tree.version))?;
        Ok(tree)
    }
}

/// Borrowed handle to one invocation inside its tree.
#[derive(Clone, Copy)]
pub struct InvocationRef<'a> {
    tree: &'a InvocationTree,
    id: InvocationId,
}

impl<'a> InvocationRef<'a> {
    pub fn id(&self) -> InvocationId {
        self.id
    }

    pub fn tree(&self) -> &'a InvocationTree {
        self.tree
    }

    pub fn invocation(&self) -> &'a Invocation {
        &self.tree.nodes[self.id.0]
    }

    pub fn method(&self) -> &'a str {
        &self.invocation().method
    }

    pub fn class_name(&self) -> &'a str {
        &self.invocation().class_name
    }

    pub fn version(&self) -> &'a str {
        &self.tree.version
    }

    pub fn caller(&self) -> Option<InvocationRef<'a>> {
        self.invocation().caller.map(|id| self.tree.get(id))
    }

    /// Entry points have no recorded caller.
    pub fn is_entry_point(&self) -> bool {
        self.invocation().caller.is_none()
    }

    pub fn children(&self) -> impl Iterator<Item = InvocationRef<'a>> + 'a {
        let tree = self.tree;
        self.invocation()
            .children
            .iter()
            .map(move |&id| tree.get(id))
    }

    pub fn child(&self, position: usize) -> Option<InvocationRef<'a>> {
        self.invocation()
            .children
            .get(position)
            .map(|&id| self.tree.get(id))
    }

    /// Method identifiers of the direct children, in call order.
    pub fn child_methods(&self) -> Vec<&'a str> {
        self.children().map(|child| child.method()).collect()
    }

    /// The instruction trace reduced to its signed indices.
    pub fn trace_indices(&self) -> Vec<i64> {
        self.invocation().trace.iter().map(|e| e.index).collect()
    }

    /// Number of calls between this invocation and the entry point.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.caller();
        while let Some(caller) = current {
            depth += 1;
            current = caller.caller();
        }
        depth
    }

    /// Resolve this invocation's syntax association against a version's changes.
    pub fn syntax_association(&self, changes: &SyntaxChanges) -> SyntaxAssociation {
        changes.association_for(self.method(), self.class_name())
    }
}

impl fmt::Debug for InvocationRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationRef")
            .field("id", &self.id)
            .field("method", &self.method())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{ChangeKind, SyntaxChange};

    fn method(name: &str) -> Invocation {
        Invocation::new(name, "a.B", InvocationKind::Method)
    }

    #[test]
    fn test_marker_encoding() {
        assert_eq!(call_marker(0), -1);
        assert_eq!(call_marker(4), -5);
        assert_eq!(marker_child(-1), Some(0));
        assert_eq!(marker_child(-5), Some(4));
        assert_eq!(marker_child(3), None);
    }

    #[test]
    fn test_push_call_links_both_directions() {
        let mut tree = InvocationTree::new("v1", method("root()"));
        let root = tree.root_id();
        let first = tree.push_call(root, method("first()"));
        let nested = tree.push_call(first, method("nested()"));
        let second = tree.push_call(root, method("second()"));

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.root().child_methods(), vec!["first()", "second()"]);
        assert_eq!(tree.root().trace_indices(), vec![-1, -2]);
        assert_eq!(tree.get(nested).depth(), 2);
        assert_eq!(tree.get(second).caller().unwrap().id(), root);
        assert!(tree.root().is_entry_point());
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_new_discards_stale_markers() {
        let mut root = method("root()");
        root.trace.push(TraceEntry {
            index: -3,
            description: "stale".into(),
        });
        root.children.push(InvocationId(9));
        let tree = InvocationTree::new("v1", root);
        assert!(tree.root().trace_indices().is_empty());
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_dangling_marker() {
        let json = r#"{
            "version": "v1",
            "nodes": [
                { "method": "root()", "class_name": "a.B", "kind": "method",
                  "trace": [ { "index": -2, "description": "invoke" } ],
                  "children": [1] },
                { "method": "c()", "class_name": "a.B", "kind": "method", "caller": 0 }
            ]
        }"#;
        let tree: InvocationTree = serde_json::from_str(json).unwrap();
        assert_eq!(
            tree.validate(),
            Err(ImpactError::DanglingCallMarker {
                method: "root()".into(),
                marker: -2
            })
        );
    }

    #[test]
    fn test_validate_rejects_count_mismatch() {
        let json = r#"{
            "version": "v1",
            "nodes": [
                { "method": "root()", "class_name": "a.B", "kind": "method", "children": [1] },
                { "method": "c()", "class_name": "a.B", "kind": "method", "caller": 0 }
            ]
        }"#;
        let tree: InvocationTree = serde_json::from_str(json).unwrap();
        assert!(matches!(
            tree.validate(),
            Err(ImpactError::CallMarkerCount { markers: 0, children: 1, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_broken_caller_links() {
        let json = r#"{
            "version": "v1",
            "nodes": [
                { "method": "root()", "class_name": "a.B", "kind": "method",
                  "trace": [ { "index": -1, "description": "invoke" } ],
                  "children": [1] },
                { "method": "c()", "class_name": "a.B", "kind": "method" }
            ]
        }"#;
        let tree: InvocationTree = serde_json::from_str(json).unwrap();
        assert_eq!(
            tree.validate(),
            Err(ImpactError::InconsistentCaller {
                method: "c()".into()
            })
        );

        let empty: InvocationTree = serde_json::from_str(r#"{ "version": "v9", "nodes": [] }"#).unwrap();
        assert!(matches!(empty.validate(), Err(ImpactError::EmptyTree { .. })));
    }

    #[test]
    fn test_from_json_validates() {
        let mut tree = InvocationTree::new("v3", method("root()"));
        let root = tree.root_id();
        tree.push_call(root, method("leaf()"));
        let json = serde_json::to_string(&tree).unwrap();

        assert_eq!(InvocationTree::from_json(&json).unwrap(), tree);

        let err = InvocationTree::from_json(r#"{ "version": "v9", "nodes": [] }"#).unwrap_err();
        assert!(err.to_string().contains("v9"));
        assert!(InvocationTree::from_json("not json").is_err());
    }

    #[test]
    fn test_normalized_value_filters_identity_text() {
        let plain = ValueDescriptor::new("java.lang.Integer", "42", 42);
        let identity = ValueDescriptor::new("a.Node", "a.Node@1b6d3586", 459296134);

        assert_eq!(plain.normalized(true), "java.lang.Integer [42] hash: 42");
        assert_eq!(identity.normalized(true), "a.Node [] hash: 0");
        assert_eq!(
            identity.normalized(false),
            "a.Node [a.Node@1b6d3586] hash: 459296134"
        );
    }

    #[test]
    fn test_syntax_association_lookup() {
        let tree = InvocationTree::new("v2", method("a.B.run()V"));
        let mut changes = SyntaxChanges::new();
        changes.add_method_change("a.B.run()V", SyntaxChange::new(ChangeKind::Update, ""));
        assert!(matches!(
            tree.root().syntax_association(&changes),
            SyntaxAssociation::Method(_)
        ));
    }
}
