//! # Inheritance
//!
//! Member lookup through class hierarchies.
//!
//! Two member maps are computed per class and cached:
//!
//! - the **class chain** map: everything inherited through `extends` and
//!   `with`, where a mixin's members override the superclass's;
//! - the **interface** map: everything reachable through any supertype,
//!   mixin or interface. When two unrelated paths contribute distinct members
//!   under one name, the name is dropped from the map and, unless the class
//!   chain settles it, recorded as an inconsistency of the class.
//!
//! Static members never take part in inheritance. Every walk keeps the path
//! of classes being visited; a class met again on its own path contributes
//! nothing, so cyclic hierarchies terminate. A map is cached only when its
//! walk never met a cycle: a cut-short map depends on where the query
//! started, so results on cyclic hierarchies are recomputed per query.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::element::{ElementArena, ElementId};
use crate::types::{InterfaceType, TypeSystem};

type MemberMap = IndexMap<SmolStr, ElementId>;

/// Cached inherited-member maps of the classes of one resolution session.
#[derive(Debug, Default)]
pub struct InheritanceManager {
    class_chains: FxHashMap<ElementId, MemberMap>,
    interfaces: FxHashMap<ElementId, MemberMap>,
    conflicts: FxHashMap<ElementId, Vec<SmolStr>>,
}

impl InheritanceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-static member declared directly on `class`. Setters are named with
    /// a trailing `=`.
    pub fn lookup_member(arena: &ElementArena, class: ElementId, name: &str) -> Option<ElementId> {
        let data = arena[class].as_class()?;
        data.methods
            .iter()
            .chain(&data.accessors)
            .copied()
            .find(|member| !arena[*member].is_static() && arena[*member].name == name)
    }

    /// The member `class` inherits for `name`: the class chain first, then
    /// the interfaces. `None` when nothing is inherited or the interfaces
    /// disagree.
    pub fn lookup_inheritance(
        &mut self,
        arena: &ElementArena,
        class: ElementId,
        name: &str,
    ) -> Option<ElementId> {
        if let Some(member) = self.class_chain(arena, class).get(name) {
            return Some(*member);
        }
        self.interface_members(arena, class).get(name).copied()
    }

    /// Member declared on `class` or inherited by it
    pub fn lookup_in_hierarchy(
        &mut self,
        arena: &ElementArena,
        class: ElementId,
        name: &str,
    ) -> Option<ElementId> {
        Self::lookup_member(arena, class, name)
            .or_else(|| self.lookup_inheritance(arena, class, name))
    }

    /// Names for which the interfaces of `class` contribute conflicting
    /// members the class does not resolve itself
    pub fn inconsistencies(&mut self, arena: &ElementArena, class: ElementId) -> Vec<SmolStr> {
        self.interface_members(arena, class);
        self.conflicts.get(&class).cloned().unwrap_or_default()
    }

    fn class_chain(&mut self, arena: &ElementArena, class: ElementId) -> MemberMap {
        let mut path = FxHashSet::default();
        path.insert(class);
        self.class_chain_in(arena, class, &mut path).0
    }

    /// The class chain map of `class` and whether the walk completed
    /// without meeting a class on `path`
    fn class_chain_in(
        &mut self,
        arena: &ElementArena,
        class: ElementId,
        path: &mut FxHashSet<ElementId>,
    ) -> (MemberMap, bool) {
        if let Some(map) = self.class_chains.get(&class) {
            return (map.clone(), true);
        }
        let Some(data) = arena[class].as_class() else {
            return (MemberMap::default(), true);
        };
        let mut map = MemberMap::default();
        let mut complete = true;
        if let Some(supertype) = &data.supertype {
            let superclass = supertype.element;
            if !path.insert(superclass) {
                tracing::trace!(class = %arena[class].name, "cyclic superclass chain");
                return (map, false);
            }
            let (inherited, inherited_complete) = self.class_chain_in(arena, superclass, path);
            map = inherited;
            complete &= inherited_complete;
            add_declared_members(arena, superclass, &mut map);
            path.remove(&superclass);
        }
        for mixin in &data.mixins {
            if path.contains(&mixin.element) {
                complete = false;
            } else {
                add_declared_members(arena, mixin.element, &mut map);
            }
        }
        if complete {
            self.class_chains.insert(class, map.clone());
        }
        (map, complete)
    }

    fn interface_members(&mut self, arena: &ElementArena, class: ElementId) -> MemberMap {
        let mut path = FxHashSet::default();
        self.interface_members_in(arena, class, &mut path).0
    }

    fn interface_members_in(
        &mut self,
        arena: &ElementArena,
        class: ElementId,
        path: &mut FxHashSet<ElementId>,
    ) -> (MemberMap, bool) {
        if let Some(map) = self.interfaces.get(&class) {
            return (map.clone(), true);
        }
        let Some(data) = arena[class].as_class() else {
            return (MemberMap::default(), true);
        };
        path.insert(class);
        let mut complete = true;
        let mut candidates: IndexMap<SmolStr, Vec<ElementId>> = IndexMap::new();
        let supertypes: Vec<ElementId> = data
            .supertype
            .iter()
            .chain(&data.mixins)
            .chain(&data.interfaces)
            .map(|supertype| supertype.element)
            .collect();
        for supertype in supertypes {
            if path.contains(&supertype) {
                complete = false;
                continue;
            }
            let (mut inherited, inherited_complete) =
                self.interface_members_in(arena, supertype, path);
            complete &= inherited_complete;
            add_declared_members(arena, supertype, &mut inherited);
            for (name, member) in inherited {
                let members = candidates.entry(name).or_default();
                if !members.contains(&member) {
                    members.push(member);
                }
            }
        }
        path.remove(&class);
        let queried = path.is_empty();

        let chain = self.class_chain(arena, class);
        let mut map = MemberMap::default();
        let mut conflicts = Vec::new();
        for (name, members) in candidates {
            match most_specific(arena, members).as_slice() {
                [member] => {
                    map.insert(name, *member);
                }
                _ => {
                    if !chain.contains_key(&name)
                        && Self::lookup_member(arena, class, &name).is_none()
                    {
                        tracing::debug!(
                            class = %arena[class].name,
                            member = %name,
                            "conflicting inherited members"
                        );
                        conflicts.push(name);
                    }
                }
            }
        }
        if complete || queried {
            if conflicts.is_empty() {
                self.conflicts.remove(&class);
            } else {
                self.conflicts.insert(class, conflicts);
            }
        }
        if complete {
            self.interfaces.insert(class, map.clone());
        }
        (map, complete)
    }
}

fn add_declared_members(arena: &ElementArena, class: ElementId, map: &mut MemberMap) {
    let Some(data) = arena[class].as_class() else {
        return;
    };
    for member in data.methods.iter().chain(&data.accessors) {
        if !arena[*member].is_static() {
            map.insert(arena[*member].name.clone(), *member);
        }
    }
}

/// Drops every candidate that a candidate from a subclass overrides
fn most_specific(arena: &ElementArena, members: Vec<ElementId>) -> Vec<ElementId> {
    if members.len() < 2 {
        return members;
    }
    let system = TypeSystem::new(arena);
    let owner = |member: ElementId| arena[member].enclosing;
    members
        .iter()
        .copied()
        .filter(|member| {
            let Some(class) = owner(*member) else {
                return true;
            };
            !members.iter().any(|other| {
                other != member
                    && owner(*other).is_some_and(|other_class| {
                        other_class != class
                            && system
                                .as_instance_of(&InterfaceType::raw(other_class), class)
                                .is_some()
                    })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ClassData, Element, ElementFlags, ElementKind, ExecutableData};

    fn class(arena: &mut ElementArena, name: &str, superclass: Option<ElementId>) -> ElementId {
        let object = arena.type_provider().object_type.clone();
        let supertype = superclass.map_or(object, InterfaceType::raw);
        arena.alloc(Element::new(
            name,
            ElementKind::Class(ClassData {
                supertype: Some(supertype),
                ..Default::default()
            }),
        ))
    }

    fn method(
        arena: &mut ElementArena,
        class: ElementId,
        name: &str,
        flags: ElementFlags,
    ) -> ElementId {
        let method = arena.alloc(
            Element::new(name, ElementKind::Method(ExecutableData::default()))
                .with_enclosing(class)
                .with_flags(flags),
        );
        if let Some(data) = arena[class].as_class_mut() {
            data.methods.push(method);
        }
        method
    }

    fn implement(arena: &mut ElementArena, class: ElementId, interface: ElementId) {
        if let Some(data) = arena[class].as_class_mut() {
            data.interfaces.push(InterfaceType::raw(interface));
        }
    }

    #[test]
    fn test_superclass_members_are_inherited_but_statics_are_not() {
        let mut arena = ElementArena::default();
        let a = class(&mut arena, "A", None);
        let m = method(&mut arena, a, "m", ElementFlags::empty());
        method(&mut arena, a, "s", ElementFlags::STATIC);
        let b = class(&mut arena, "B", Some(a));
        let c = class(&mut arena, "C", Some(b));

        let mut manager = InheritanceManager::new();
        assert_eq!(manager.lookup_inheritance(&arena, c, "m"), Some(m));
        assert_eq!(manager.lookup_inheritance(&arena, c, "s"), None);
        assert_eq!(InheritanceManager::lookup_member(&arena, a, "s"), None);
        assert_eq!(InheritanceManager::lookup_member(&arena, a, "m"), Some(m));
    }

    #[test]
    fn test_mixin_overrides_superclass() {
        let mut arena = ElementArena::default();
        let a = class(&mut arena, "A", None);
        method(&mut arena, a, "m", ElementFlags::empty());
        let mixin = class(&mut arena, "M", None);
        let mixed = method(&mut arena, mixin, "m", ElementFlags::empty());
        let b = class(&mut arena, "B", Some(a));
        if let Some(data) = arena[b].as_class_mut() {
            data.mixins.push(InterfaceType::raw(mixin));
        }

        let mut manager = InheritanceManager::new();
        assert_eq!(manager.lookup_inheritance(&arena, b, "m"), Some(mixed));
    }

    #[test]
    fn test_interface_members_are_inherited() {
        let mut arena = ElementArena::default();
        let i = class(&mut arena, "I", None);
        let m = method(&mut arena, i, "m", ElementFlags::empty());
        let j = class(&mut arena, "J", None);
        implement(&mut arena, j, i);
        let c = class(&mut arena, "C", None);
        implement(&mut arena, c, i);
        implement(&mut arena, c, j);

        let mut manager = InheritanceManager::new();
        assert_eq!(manager.lookup_inheritance(&arena, c, "m"), Some(m));
        let to_string = manager.lookup_inheritance(&arena, c, "toString");
        assert_eq!(
            to_string.map(|member| arena.qualified_name(member)).as_deref(),
            Some("Object.toString")
        );
        assert!(manager.inconsistencies(&arena, c).is_empty());
    }

    #[test]
    fn test_conflicting_interfaces_yield_nothing() {
        let mut arena = ElementArena::default();
        let i = class(&mut arena, "I", None);
        method(&mut arena, i, "m", ElementFlags::empty());
        let j = class(&mut arena, "J", None);
        method(&mut arena, j, "m", ElementFlags::empty());
        let c = class(&mut arena, "C", None);
        implement(&mut arena, c, i);
        implement(&mut arena, c, j);

        let mut manager = InheritanceManager::new();
        assert_eq!(manager.lookup_inheritance(&arena, c, "m"), None);
        assert_eq!(manager.inconsistencies(&arena, c), vec![SmolStr::new("m")]);
    }

    #[test]
    fn test_own_declaration_settles_a_conflict() {
        let mut arena = ElementArena::default();
        let i = class(&mut arena, "I", None);
        method(&mut arena, i, "m", ElementFlags::empty());
        let j = class(&mut arena, "J", None);
        method(&mut arena, j, "m", ElementFlags::empty());
        let c = class(&mut arena, "C", None);
        let own = method(&mut arena, c, "m", ElementFlags::empty());
        implement(&mut arena, c, i);
        implement(&mut arena, c, j);

        let mut manager = InheritanceManager::new();
        assert!(manager.inconsistencies(&arena, c).is_empty());
        assert_eq!(manager.lookup_in_hierarchy(&arena, c, "m"), Some(own));
    }

    #[test]
    fn test_cyclic_hierarchies_terminate() {
        let mut arena = ElementArena::default();
        let a = class(&mut arena, "A", None);
        method(&mut arena, a, "m", ElementFlags::empty());
        if let Some(data) = arena[a].as_class_mut() {
            data.supertype = Some(InterfaceType::raw(a));
        }
        let b = class(&mut arena, "B", None);
        let c = class(&mut arena, "C", Some(b));
        if let Some(data) = arena[b].as_class_mut() {
            data.supertype = Some(InterfaceType::raw(c));
        }
        let i = class(&mut arena, "I", None);
        method(&mut arena, i, "n", ElementFlags::empty());
        implement(&mut arena, i, i);

        let mut manager = InheritanceManager::new();
        assert_eq!(manager.lookup_inheritance(&arena, a, "m"), None);
        assert_eq!(manager.lookup_inheritance(&arena, b, "m"), None);
        assert_eq!(manager.lookup_inheritance(&arena, c, "m"), None);
        assert_eq!(manager.lookup_inheritance(&arena, i, "n"), None);
    }

    #[test]
    fn test_cyclic_interface_lookups_do_not_depend_on_query_order() {
        let mut arena = ElementArena::default();
        let a = class(&mut arena, "A", None);
        let b = class(&mut arena, "B", None);
        let foo = method(&mut arena, b, "foo", ElementFlags::empty());
        implement(&mut arena, a, b);
        implement(&mut arena, b, a);

        let mut fresh = InheritanceManager::new();
        assert_eq!(fresh.lookup_in_hierarchy(&arena, a, "foo"), Some(foo));

        let mut warmed = InheritanceManager::new();
        assert!(warmed.inconsistencies(&arena, b).is_empty());
        assert!(warmed.lookup_in_hierarchy(&arena, b, "toString").is_some());
        assert_eq!(warmed.lookup_in_hierarchy(&arena, a, "foo"), Some(foo));
        assert_eq!(warmed.lookup_in_hierarchy(&arena, b, "foo"), Some(foo));
    }
}
