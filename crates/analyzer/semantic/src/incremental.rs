//! # Incremental re-resolution
//!
//! Re-runs both resolution passes over a single declaration of an already
//! resolved unit. The caller establishes the precondition: the declaration's
//! shape matched its previous elements ([`crate::DeclarationMatcher`]), those
//! elements were moved onto the new nodes with [`rebind`], and the stale
//! annotations and diagnostics were stripped.
//!
//! Local elements are keyed by the node that declares them, so resolving the
//! same nodes again reuses them and reproduces the original annotations.

use quill_analyzer_syntax::ast::{ClassMember, Declaration};
use quill_analyzer_syntax::NodeId;
use rustc_hash::FxHashSet;

use crate::declaration_matcher::Rebinding;
use crate::element::{ElementArena, ElementId};
use crate::inheritance::InheritanceManager;
use crate::options::AnalysisOptions;
use crate::resolution::{DeclarationRef, UnitResult};
use crate::resolver::Resolver;
use crate::scope::LibraryScope;
use crate::type_resolver::TypeResolver;

pub struct IncrementalResolver<'a> {
    arena: &'a mut ElementArena,
    inheritance: &'a mut InheritanceManager,
    unit: ElementId,
    options: AnalysisOptions,
}

impl<'a> IncrementalResolver<'a> {
    pub fn new(
        arena: &'a mut ElementArena,
        inheritance: &'a mut InheritanceManager,
        unit: ElementId,
    ) -> Self {
        Self {
            arena,
            inheritance,
            unit,
            options: AnalysisOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolves `declaration` again, recording into `result`
    pub fn resolve(&mut self, result: &mut UnitResult, declaration: DeclarationRef<'_>) {
        let _span = tracing::trace_span!(
            "resolve_incrementally",
            uri = %result.uri,
            declaration = ?declaration.id()
        )
        .entered();
        let Some(library) = self.arena.library_of(self.unit) else {
            tracing::debug!("unit is not part of a library");
            return;
        };
        let scope = LibraryScope::new(self.arena, library);
        TypeResolver::new(self.arena, &scope, self.unit, result)
            .with_bodies(self.options.analyze_function_bodies)
            .resolve_declaration(declaration);
        Resolver::new(self.arena, self.inheritance, &scope, self.unit, result)
            .with_options(self.options)
            .resolve_declaration(declaration);
    }
}

/// Moves the elements of `rebinding` onto their new declaring nodes
pub fn rebind(arena: &mut ElementArena, unit: ElementId, rebinding: &Rebinding) {
    let rebound: FxHashSet<ElementId> =
        rebinding.pairs.iter().map(|(element, ..)| *element).collect();
    for &(element, node, offset) in &rebinding.pairs {
        if let Some(element) = arena.get_mut(element) {
            element.node = Some(node);
            element.offset = offset;
        }
    }
    let Some(data) = arena.get_mut(unit).and_then(|unit| unit.as_unit_mut()) else {
        return;
    };
    data.declarations.retain(|_, element| !rebound.contains(element));
    data.declarations
        .extend(rebinding.pairs.iter().map(|(element, node, _)| (*node, *element)));
}

/// Nodes that own the diagnostics reported inside `declaration`
pub fn diagnostic_owners(declaration: DeclarationRef<'_>) -> Vec<NodeId> {
    match declaration {
        DeclarationRef::TopLevel(Declaration::Class(class)) => std::iter::once(class.id)
            .chain(class.members.iter().map(ClassMember::id))
            .collect(),
        _ => vec![declaration.id()],
    }
}
