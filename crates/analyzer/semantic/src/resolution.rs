//! # Resolution side tables
//!
//! The syntax tree is never mutated by analysis. Every binding and every
//! computed type is recorded here, keyed by the [`NodeId`] of the annotated
//! node. Static annotations come from declared types; propagated ones from
//! flow narrowing and are only recorded when they add information.

use std::sync::Arc;

use quill_analyzer_diagnostics::{Diagnostic, DiagnosticCollection};
use quill_analyzer_syntax::ast::{ClassDeclaration, ClassMember, CompilationUnit, Declaration};
use quill_analyzer_syntax::visitor::{walk_class_member, walk_declaration, Visitor};
use quill_analyzer_syntax::NodeId;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::element::ElementId;
use crate::types::Type;

/// Element and type annotations of one compilation unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    static_elements: FxHashMap<NodeId, ElementId>,
    propagated_elements: FxHashMap<NodeId, ElementId>,
    static_types: FxHashMap<NodeId, Type>,
    propagated_types: FxHashMap<NodeId, Type>,
}

impl Resolution {
    pub fn record_static_element(&mut self, node: NodeId, element: ElementId) {
        self.static_elements.insert(node, element);
    }

    pub fn record_propagated_element(&mut self, node: NodeId, element: ElementId) {
        self.propagated_elements.insert(node, element);
    }

    pub fn record_static_type(&mut self, node: NodeId, ty: Type) {
        self.static_types.insert(node, ty);
    }

    pub fn record_propagated_type(&mut self, node: NodeId, ty: Type) {
        self.propagated_types.insert(node, ty);
    }

    pub fn static_element(&self, node: NodeId) -> Option<ElementId> {
        self.static_elements.get(&node).copied()
    }

    pub fn propagated_element(&self, node: NodeId) -> Option<ElementId> {
        self.propagated_elements.get(&node).copied()
    }

    pub fn static_type(&self, node: NodeId) -> Option<&Type> {
        self.static_types.get(&node)
    }

    pub fn propagated_type(&self, node: NodeId) -> Option<&Type> {
        self.propagated_types.get(&node)
    }

    /// Propagated type when there is one, otherwise the static type
    pub fn best_type(&self, node: NodeId) -> Option<&Type> {
        self.propagated_type(node).or_else(|| self.static_type(node))
    }

    /// Propagated element when there is one, otherwise the static element
    pub fn best_element(&self, node: NodeId) -> Option<ElementId> {
        self.propagated_element(node)
            .or_else(|| self.static_element(node))
    }

    pub fn is_empty(&self) -> bool {
        self.static_elements.is_empty()
            && self.propagated_elements.is_empty()
            && self.static_types.is_empty()
            && self.propagated_types.is_empty()
    }

    /// Number of annotated nodes per table: static elements, propagated
    /// elements, static types, propagated types
    pub fn counts(&self) -> [usize; 4] {
        [
            self.static_elements.len(),
            self.propagated_elements.len(),
            self.static_types.len(),
            self.propagated_types.len(),
        ]
    }

    /// Removes every annotation recorded for `nodes`
    pub fn strip_nodes(&mut self, nodes: &FxHashSet<NodeId>) {
        self.static_elements.retain(|node, _| !nodes.contains(node));
        self.propagated_elements.retain(|node, _| !nodes.contains(node));
        self.static_types.retain(|node, _| !nodes.contains(node));
        self.propagated_types.retain(|node, _| !nodes.contains(node));
    }

    /// Removes every annotation recorded inside `declaration`
    pub fn strip_subtree(&mut self, declaration: DeclarationRef<'_>) {
        let nodes = declaration.node_ids();
        tracing::trace!(nodes = nodes.len(), "stripping resolution");
        self.strip_nodes(&nodes);
    }
}

/// A declaration that can be re-resolved on its own: a top-level declaration
/// or one member of a class.
#[derive(Debug, Clone, Copy)]
pub enum DeclarationRef<'a> {
    TopLevel(&'a Declaration),
    Member {
        class: &'a ClassDeclaration,
        member: &'a ClassMember,
    },
}

impl DeclarationRef<'_> {
    pub fn id(&self) -> NodeId {
        match self {
            Self::TopLevel(declaration) => declaration.id(),
            Self::Member { member, .. } => member.id(),
        }
    }

    /// Ids of every node inside the declaration, the declaration included
    pub fn node_ids(&self) -> FxHashSet<NodeId> {
        let mut collector = NodeCollector::default();
        match self {
            Self::TopLevel(declaration) => walk_declaration(&mut collector, declaration),
            Self::Member { member, .. } => walk_class_member(&mut collector, member),
        }
        collector.nodes
    }
}

#[derive(Default)]
struct NodeCollector {
    nodes: FxHashSet<NodeId>,
}

impl Visitor<'_> for NodeCollector {
    fn visit_node(&mut self, id: NodeId) {
        self.nodes.insert(id);
    }
}

/// Resolution output of one compilation unit.
#[derive(Debug, Clone)]
pub struct UnitResult {
    pub uri: String,
    pub unit: Arc<CompilationUnit>,
    pub resolution: Resolution,
    /// Each diagnostic with the node that owns it: a class member, a top-level
    /// declaration, a directive, or the unit itself
    pub diagnostics: Vec<(NodeId, Diagnostic)>,
}

impl UnitResult {
    pub fn new(uri: impl Into<String>, unit: Arc<CompilationUnit>) -> Self {
        Self {
            uri: uri.into(),
            unit,
            resolution: Resolution::default(),
            diagnostics: Vec::new(),
        }
    }

    pub fn report(&mut self, owner: NodeId, diagnostic: Diagnostic) {
        tracing::debug!(uri = %self.uri, code = ?diagnostic.code, "{}", diagnostic.message);
        self.diagnostics.push((owner, diagnostic));
    }

    /// Diagnostics in source order
    pub fn diagnostics(&self) -> DiagnosticCollection {
        let mut collection = DiagnosticCollection::new();
        collection.extend(self.diagnostics.iter().map(|(_, diagnostic)| diagnostic.clone()));
        collection.sort();
        collection
    }

    /// Drops the diagnostics owned by `owner`
    pub fn strip_diagnostics(&mut self, owner: NodeId) {
        self.diagnostics.retain(|(node, _)| *node != owner);
    }
}
