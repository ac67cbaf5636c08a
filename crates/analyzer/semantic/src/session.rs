//! # Analysis sessions
//!
//! An [`AnalysisSession`] holds everything one run of the
//! [`crate::LibraryResolver`] produced: the element arena, the inheritance
//! caches and the resolution tables of every unit. It is also the entry point
//! for cheap re-analysis after an edit that keeps a declaration's shape.

use std::sync::Arc;

use indexmap::IndexMap;
use quill_analyzer_diagnostics::DiagnosticCollection;
use quill_analyzer_syntax::ast::{ClassMember, Declaration};
use rustc_hash::FxHashSet;

use crate::declaration_matcher::{declaring_nodes, DeclarationMatcher};
use crate::element::{ElementArena, ElementId, ElementKind};
use crate::incremental::{diagnostic_owners, rebind, IncrementalResolver};
use crate::inheritance::InheritanceManager;
use crate::options::AnalysisOptions;
use crate::resolution::{DeclarationRef, UnitResult};

/// A resolved compilation unit and the elements it belongs to
#[derive(Debug, Clone)]
pub struct AnalyzedUnit {
    pub element: ElementId,
    pub library: ElementId,
    pub result: UnitResult,
}

#[derive(Debug)]
pub struct AnalysisSession {
    pub(crate) arena: ElementArena,
    pub(crate) inheritance: InheritanceManager,
    pub(crate) options: AnalysisOptions,
    pub(crate) libraries: IndexMap<String, ElementId>,
    pub(crate) units: IndexMap<String, AnalyzedUnit>,
}

impl AnalysisSession {
    pub(crate) fn new(options: AnalysisOptions) -> Self {
        Self {
            arena: ElementArena::default(),
            inheritance: InheritanceManager::new(),
            options,
            libraries: IndexMap::new(),
            units: IndexMap::new(),
        }
    }

    pub const fn arena(&self) -> &ElementArena {
        &self.arena
    }

    pub const fn options(&self) -> AnalysisOptions {
        self.options
    }

    /// Library element of the library whose defining unit is at `uri`
    pub fn library(&self, uri: &str) -> Option<ElementId> {
        self.libraries.get(uri).copied()
    }

    /// Every resolved library, in resolution order
    pub fn libraries(&self) -> impl Iterator<Item = (&str, ElementId)> {
        self.libraries
            .iter()
            .map(|(uri, library)| (uri.as_str(), *library))
    }

    pub fn unit(&self, uri: &str) -> Option<&AnalyzedUnit> {
        self.units.get(uri)
    }

    pub fn units(&self) -> impl Iterator<Item = &AnalyzedUnit> {
        self.units.values()
    }

    /// Diagnostics of the unit at `uri`, in source order
    pub fn diagnostics(&self, uri: &str) -> DiagnosticCollection {
        self.units
            .get(uri)
            .map(|unit| unit.result.diagnostics())
            .unwrap_or_default()
    }

    /// Libraries `library` imports directly, the synthetic core import
    /// included
    pub fn imported_libraries(&self, library: ElementId) -> Vec<ElementId> {
        let Some(data) = self.arena[library].as_library() else {
            return Vec::new();
        };
        let mut libraries = Vec::new();
        for import in &data.imports {
            if let ElementKind::Import(import) = &self.arena[*import].kind {
                if let Some(imported) = import.imported_library {
                    if !libraries.contains(&imported) {
                        libraries.push(imported);
                    }
                }
            }
        }
        libraries
    }

    /// Libraries reachable from `library` through imports, `library` excluded
    pub fn transitive_imports(&self, library: ElementId) -> Vec<ElementId> {
        let mut visited = FxHashSet::default();
        visited.insert(library);
        let mut order = Vec::new();
        let mut pending = vec![library];
        while let Some(current) = pending.pop() {
            for imported in self.imported_libraries(current) {
                if visited.insert(imported) {
                    order.push(imported);
                    pending.push(imported);
                }
            }
        }
        order
    }

    /// Member `class` declares or inherits under `name`
    pub fn lookup_in_hierarchy(&mut self, class: ElementId, name: &str) -> Option<ElementId> {
        self.inheritance.lookup_in_hierarchy(&self.arena, class, name)
    }

    /// Replaces the top-level declaration at `index` in the unit at `uri`.
    ///
    /// When the new declaration has the shape of the old one its elements are
    /// kept and only the declaration is resolved again; returns `false`
    /// without touching anything otherwise, and the caller resolves the
    /// library from scratch. Node ids of `declaration` must not collide with
    /// the ids of the rest of the unit.
    pub fn update_declaration(
        &mut self,
        uri: &str,
        index: usize,
        declaration: Declaration,
    ) -> bool {
        let Some(analyzed) = self.units.get_mut(uri) else {
            return false;
        };
        let unit = Arc::clone(&analyzed.result.unit);
        let Some(old) = unit.declarations.get(index) else {
            return false;
        };
        let old = DeclarationRef::TopLevel(old);
        let previous = declared_elements(&self.arena, analyzed.element, old);
        let Some(rebinding) = DeclarationMatcher::new(&self.arena)
            .with_locals(self.options.analyze_function_bodies)
            .match_declaration(DeclarationRef::TopLevel(&declaration), &previous)
        else {
            return false;
        };

        strip(&mut analyzed.result, old);
        rebind(&mut self.arena, analyzed.element, &rebinding);
        drop(unit);
        Arc::make_mut(&mut analyzed.result.unit).declarations[index] = declaration;

        let unit = Arc::clone(&analyzed.result.unit);
        IncrementalResolver::new(&mut self.arena, &mut self.inheritance, analyzed.element)
            .with_options(self.options)
            .resolve(
                &mut analyzed.result,
                DeclarationRef::TopLevel(&unit.declarations[index]),
            );
        true
    }

    /// Replaces member `member_index` of the class declared at
    /// `class_index`, with the same contract as
    /// [`Self::update_declaration`]
    pub fn update_member(
        &mut self,
        uri: &str,
        class_index: usize,
        member_index: usize,
        member: ClassMember,
    ) -> bool {
        let Some(analyzed) = self.units.get_mut(uri) else {
            return false;
        };
        let unit = Arc::clone(&analyzed.result.unit);
        let Some(Declaration::Class(class)) = unit.declarations.get(class_index) else {
            return false;
        };
        let Some(old) = class.members.get(member_index) else {
            return false;
        };
        let old = DeclarationRef::Member { class, member: old };
        let previous = declared_elements(&self.arena, analyzed.element, old);
        let Some(rebinding) = DeclarationMatcher::new(&self.arena)
            .with_locals(self.options.analyze_function_bodies)
            .match_declaration(
                DeclarationRef::Member {
                    class,
                    member: &member,
                },
                &previous,
            )
        else {
            return false;
        };

        strip(&mut analyzed.result, old);
        rebind(&mut self.arena, analyzed.element, &rebinding);
        drop(unit);
        if let Some(Declaration::Class(class)) =
            Arc::make_mut(&mut analyzed.result.unit).declarations.get_mut(class_index)
        {
            class.members[member_index] = member;
        }

        let unit = Arc::clone(&analyzed.result.unit);
        let Some(Declaration::Class(class)) = unit.declarations.get(class_index) else {
            return false;
        };
        IncrementalResolver::new(&mut self.arena, &mut self.inheritance, analyzed.element)
            .with_options(self.options)
            .resolve(
                &mut analyzed.result,
                DeclarationRef::Member {
                    class,
                    member: &class.members[member_index],
                },
            );
        true
    }
}

/// Elements the unit recorded for the declaring nodes of `declaration`
fn declared_elements(
    arena: &ElementArena,
    unit: ElementId,
    declaration: DeclarationRef<'_>,
) -> Vec<ElementId> {
    let Some(data) = arena[unit].as_unit() else {
        return Vec::new();
    };
    declaring_nodes(declaration)
        .into_iter()
        .filter_map(|node| data.declarations.get(&node).copied())
        .collect()
}

fn strip(result: &mut UnitResult, declaration: DeclarationRef<'_>) {
    result.resolution.strip_subtree(declaration);
    for owner in diagnostic_owners(declaration) {
        result.strip_diagnostics(owner);
    }
}
