//! # Namespaces
//!
//! A namespace is the flat name → element map a library makes visible to its
//! importers. The export namespace of a library is its public top-level names
//! plus, recursively, the export namespaces of the libraries it re-exports;
//! imports see that namespace through their `show`/`hide` combinators.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::element::{ElementArena, ElementId, ElementKind, NamespaceCombinator};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    names: IndexMap<SmolStr, ElementId>,
}

impl Namespace {
    /// Binds `name`, returning the element it previously denoted
    pub fn define(&mut self, name: impl Into<SmolStr>, element: ElementId) -> Option<ElementId> {
        self.names.insert(name.into(), element)
    }

    pub fn get(&self, name: &str) -> Option<ElementId> {
        self.names.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SmolStr, ElementId)> {
        self.names.iter().map(|(name, element)| (name, *element))
    }

    /// The names surviving `combinators`. A setter `x=` follows the fate of
    /// its base name `x`.
    pub fn filtered(&self, combinators: &[NamespaceCombinator]) -> Self {
        let names = self
            .names
            .iter()
            .filter(|(name, _)| {
                let base = name.strip_suffix('=').unwrap_or(name);
                combinators.iter().all(|combinator| match combinator {
                    NamespaceCombinator::Show(shown) => shown.iter().any(|n| n == base),
                    NamespaceCombinator::Hide(hidden) => !hidden.iter().any(|n| n == base),
                })
            })
            .map(|(name, element)| (name.clone(), *element))
            .collect();
        Self { names }
    }

    /// Adds the names of `other` not already bound here
    fn merge(&mut self, other: Self) {
        for (name, element) in other.names {
            self.names.entry(name).or_insert(element);
        }
    }
}

/// Public top-level declarations of every unit of `library`
pub fn public_namespace(arena: &ElementArena, library: ElementId) -> Namespace {
    let mut namespace = Namespace::default();
    let Some(data) = arena[library].as_library() else {
        return namespace;
    };
    for unit in data.defining_unit.iter().chain(&data.parts) {
        let Some(unit) = arena[*unit].as_unit() else {
            continue;
        };
        for element in unit.top_level_elements() {
            if !arena[element].is_private() {
                namespace
                    .names
                    .entry(arena[element].name.clone())
                    .or_insert(element);
            }
        }
    }
    namespace
}

/// Names `library` makes visible to importers
pub fn export_namespace(arena: &ElementArena, library: ElementId) -> Namespace {
    let mut visited = FxHashSet::default();
    export_namespace_in(arena, library, &mut visited)
}

fn export_namespace_in(
    arena: &ElementArena,
    library: ElementId,
    visited: &mut FxHashSet<ElementId>,
) -> Namespace {
    if !visited.insert(library) {
        return Namespace::default();
    }
    let mut namespace = public_namespace(arena, library);
    let exports = arena[library]
        .as_library()
        .map(|data| data.exports.clone())
        .unwrap_or_default();
    for export in exports {
        let ElementKind::Export(data) = &arena[export].kind else {
            continue;
        };
        let Some(exported) = data.exported_library else {
            continue;
        };
        let exported = export_namespace_in(arena, exported, visited).filtered(&data.combinators);
        namespace.merge(exported);
    }
    namespace
}

/// Names an import element brings into scope
pub fn import_namespace(arena: &ElementArena, import: ElementId) -> Namespace {
    match &arena[import].kind {
        ElementKind::Import(data) => match data.imported_library {
            Some(library) => export_namespace(arena, library).filtered(&data.combinators),
            None => Namespace::default(),
        },
        _ => Namespace::default(),
    }
}
