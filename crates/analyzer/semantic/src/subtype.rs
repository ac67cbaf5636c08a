//! Subclass queries over the classes a library can see.

use rustc_hash::FxHashSet;

use crate::element::{ElementArena, ElementId, ElementKind};

/// Finds the classes that extend a class, directly or transitively.
///
/// The candidates are the classes of the queried class's library and of
/// every library it reaches through imports and exports. Only `extends`
/// edges count.
#[derive(Debug, Default)]
pub struct SubtypeManager {
    indexed_libraries: FxHashSet<ElementId>,
    classes: Vec<ElementId>,
}

impl SubtypeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every accessible class whose superclass chain reaches `class`. A class
    /// that is its own ancestor is among its subtypes.
    pub fn compute_all_subtypes(
        &mut self,
        arena: &ElementArena,
        class: ElementId,
    ) -> FxHashSet<ElementId> {
        if let Some(library) = arena.library_of(class) {
            self.index_library(arena, library);
        }
        self.classes
            .iter()
            .copied()
            .filter(|candidate| extends_transitively(arena, *candidate, class))
            .collect()
    }

    fn index_library(&mut self, arena: &ElementArena, library: ElementId) {
        let mut pending = vec![library];
        while let Some(library) = pending.pop() {
            if !self.indexed_libraries.insert(library) {
                continue;
            }
            let Some(data) = arena[library].as_library() else {
                continue;
            };
            for unit in data.defining_unit.iter().chain(&data.parts) {
                if let Some(unit) = arena[*unit].as_unit() {
                    self.classes.extend(&unit.types);
                }
            }
            for directive in data.imports.iter().chain(&data.exports) {
                let target = match &arena[*directive].kind {
                    ElementKind::Import(import) => import.imported_library,
                    ElementKind::Export(export) => export.exported_library,
                    _ => None,
                };
                pending.extend(target);
            }
        }
        tracing::trace!(classes = self.classes.len(), "indexed accessible classes");
    }
}

/// Whether the superclass chain of `candidate` reaches `ancestor`
fn extends_transitively(arena: &ElementArena, candidate: ElementId, ancestor: ElementId) -> bool {
    let superclass = |class: ElementId| {
        arena[class]
            .as_class()
            .and_then(|data| data.supertype.as_ref())
            .map(|supertype| supertype.element)
    };
    let mut visited = FxHashSet::default();
    let mut current = superclass(candidate);
    while let Some(class) = current {
        if class == ancestor {
            return true;
        }
        if !visited.insert(class) {
            return false;
        }
        current = superclass(class);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ClassData, Element, ImportData, LibraryData, UnitData};
    use crate::types::InterfaceType;

    struct Fixture {
        arena: ElementArena,
    }

    impl Fixture {
        fn library(&mut self, uri: &str) -> (ElementId, ElementId) {
            let library = self.arena.alloc(Element::new(
                uri,
                ElementKind::Library(LibraryData {
                    uri: uri.to_string(),
                    ..Default::default()
                }),
            ));
            let unit = self.arena.alloc(
                Element::new(uri, ElementKind::CompilationUnit(UnitData::default()))
                    .with_enclosing(library),
            );
            if let Some(data) = self.arena[library].as_library_mut() {
                data.defining_unit = Some(unit);
            }
            (library, unit)
        }

        fn class(
            &mut self,
            unit: ElementId,
            name: &str,
            superclass: Option<ElementId>,
        ) -> ElementId {
            let class = self.arena.alloc(
                Element::new(
                    name,
                    ElementKind::Class(ClassData {
                        supertype: superclass.map(InterfaceType::raw),
                        ..Default::default()
                    }),
                )
                .with_enclosing(unit),
            );
            if let Some(data) = self.arena[unit].as_unit_mut() {
                data.types.push(class);
            }
            class
        }

        fn import(&mut self, library: ElementId, imported: ElementId) {
            let import = self.arena.alloc(
                Element::new(
                    "",
                    ElementKind::Import(ImportData {
                        imported_library: Some(imported),
                        ..Default::default()
                    }),
                )
                .with_enclosing(library),
            );
            if let Some(data) = self.arena[library].as_library_mut() {
                data.imports.push(import);
            }
        }
    }

    #[test]
    fn test_subtypes_across_imports() {
        let mut f = Fixture {
            arena: ElementArena::default(),
        };
        let (base_library, base_unit) = f.library("base.q");
        let (app_library, app_unit) = f.library("app.q");
        f.import(app_library, base_library);
        f.import(base_library, app_library);

        let a = f.class(base_unit, "A", None);
        let b = f.class(base_unit, "B", Some(a));
        let c = f.class(app_unit, "C", Some(b));
        let unrelated = f.class(app_unit, "D", None);

        let mut manager = SubtypeManager::new();
        let subtypes = manager.compute_all_subtypes(&f.arena, a);
        assert_eq!(subtypes, FxHashSet::from_iter([b, c]));
        assert!(manager.compute_all_subtypes(&f.arena, unrelated).is_empty());
        assert!(manager.compute_all_subtypes(&f.arena, c).is_empty());
    }

    #[test]
    fn test_cyclic_class_is_its_own_subtype() {
        let mut f = Fixture {
            arena: ElementArena::default(),
        };
        let (_, unit) = f.library("cycle.q");
        let a = f.class(unit, "A", None);
        let b = f.class(unit, "B", Some(a));
        if let Some(data) = f.arena[a].as_class_mut() {
            data.supertype = Some(InterfaceType::raw(b));
        }
        let self_cyclic = f.class(unit, "S", None);
        if let Some(data) = f.arena[self_cyclic].as_class_mut() {
            data.supertype = Some(InterfaceType::raw(self_cyclic));
        }

        let mut manager = SubtypeManager::new();
        assert_eq!(manager.compute_all_subtypes(&f.arena, a), FxHashSet::from_iter([a, b]));
        assert_eq!(
            manager.compute_all_subtypes(&f.arena, self_cyclic),
            FxHashSet::from_iter([self_cyclic])
        );
    }
}
