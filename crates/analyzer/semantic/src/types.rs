//! # Type System
//!
//! Resolved types and the relations between them.
//!
//! ## Architecture
//!
//! - [`Type`]: closed set of type values. `dynamic`, `void` and the bottom
//!   type are unit variants and need no interning.
//! - [`InterfaceType`]: a class applied to type arguments. Two interface
//!   types are equal when their element and arguments are equal.
//! - [`FunctionType`]: structural function type with required, optional
//!   positional and named parameters kept apart.
//! - [`TypeSystem`]: relations that need the element graph (more-specific,
//!   subtype, assignability, least upper bound). Every walk over supertypes
//!   carries a visited set so cyclic hierarchies terminate.

use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::element::{ElementArena, ElementId, ElementKind};

/// A resolved type value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// The unchecked type; member lookups on it are skipped
    Dynamic,
    Void,
    /// The type of `null` and of expressions that never complete
    Bottom,
    Interface(InterfaceType),
    Function(FunctionType),
    TypeParameter(ElementId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceType {
    pub element: ElementId,
    pub type_arguments: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionType {
    pub normal_parameters: Vec<Type>,
    pub optional_parameters: Vec<Type>,
    pub named_parameters: IndexMap<SmolStr, Type>,
    pub return_type: Box<Type>,
}

impl Type {
    pub const fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic)
    }

    pub const fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    pub const fn is_bottom(&self) -> bool {
        matches!(self, Self::Bottom)
    }

    pub const fn as_interface(&self) -> Option<&InterfaceType> {
        match self {
            Self::Interface(interface) => Some(interface),
            _ => None,
        }
    }

    /// Replaces every occurrence of `parameters[i]` by `arguments[i]`.
    /// Parameters without a corresponding argument become `dynamic`.
    pub fn substitute(&self, parameters: &[ElementId], arguments: &[Type]) -> Self {
        if parameters.is_empty() {
            return self.clone();
        }
        match self {
            Self::TypeParameter(parameter) => parameters
                .iter()
                .position(|candidate| candidate == parameter)
                .map_or_else(
                    || self.clone(),
                    |index| arguments.get(index).cloned().unwrap_or(Self::Dynamic),
                ),
            Self::Interface(interface) => {
                Self::Interface(interface.substitute(parameters, arguments))
            }
            Self::Function(function) => Self::Function(function.substitute(parameters, arguments)),
            Self::Dynamic | Self::Void | Self::Bottom => self.clone(),
        }
    }

    pub const fn display<'a>(&'a self, arena: &'a ElementArena) -> TypeDisplay<'a> {
        TypeDisplay { ty: self, arena }
    }
}

impl InterfaceType {
    pub const fn new(element: ElementId, type_arguments: Vec<Type>) -> Self {
        Self {
            element,
            type_arguments,
        }
    }

    /// The class without type arguments
    pub const fn raw(element: ElementId) -> Self {
        Self::new(element, Vec::new())
    }

    pub fn substitute(&self, parameters: &[ElementId], arguments: &[Type]) -> Self {
        Self {
            element: self.element,
            type_arguments: self
                .type_arguments
                .iter()
                .map(|argument| argument.substitute(parameters, arguments))
                .collect(),
        }
    }

    /// Type argument `index`, `dynamic` when not supplied
    pub fn argument(&self, index: usize) -> Type {
        self.type_arguments
            .get(index)
            .cloned()
            .unwrap_or(Type::Dynamic)
    }
}

impl FunctionType {
    pub fn substitute(&self, parameters: &[ElementId], arguments: &[Type]) -> Self {
        let map = |types: &[Type]| -> Vec<Type> {
            types
                .iter()
                .map(|ty| ty.substitute(parameters, arguments))
                .collect()
        };
        Self {
            normal_parameters: map(&self.normal_parameters),
            optional_parameters: map(&self.optional_parameters),
            named_parameters: self
                .named_parameters
                .iter()
                .map(|(name, ty)| (name.clone(), ty.substitute(parameters, arguments)))
                .collect(),
            return_type: Box::new(self.return_type.substitute(parameters, arguments)),
        }
    }
}

/// Renders a type with element names looked up in an arena
pub struct TypeDisplay<'a> {
    ty: &'a Type,
    arena: &'a ElementArena,
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type(f, self.ty, self.arena)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[Type], arena: &ElementArena) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write_type(f, ty, arena)?;
    }
    Ok(())
}

fn write_type(f: &mut fmt::Formatter<'_>, ty: &Type, arena: &ElementArena) -> fmt::Result {
    match ty {
        Type::Dynamic => write!(f, "dynamic"),
        Type::Void => write!(f, "void"),
        Type::Bottom => write!(f, "Bottom"),
        Type::TypeParameter(parameter) => write!(f, "{}", arena[*parameter].name),
        Type::Interface(interface) => {
            write!(f, "{}", arena[interface.element].name)?;
            if !interface.type_arguments.is_empty() {
                write!(f, "<")?;
                write_list(f, &interface.type_arguments, arena)?;
                write!(f, ">")?;
            }
            Ok(())
        }
        Type::Function(function) => {
            write!(f, "(")?;
            write_list(f, &function.normal_parameters, arena)?;
            let mut needs_comma = !function.normal_parameters.is_empty();
            if !function.optional_parameters.is_empty() {
                if needs_comma {
                    write!(f, ", ")?;
                }
                write!(f, "[")?;
                write_list(f, &function.optional_parameters, arena)?;
                write!(f, "]")?;
                needs_comma = true;
            }
            if !function.named_parameters.is_empty() {
                if needs_comma {
                    write!(f, ", ")?;
                }
                write!(f, "{{")?;
                for (i, (name, ty)) in function.named_parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: ")?;
                    write_type(f, ty, arena)?;
                }
                write!(f, "}}")?;
            }
            write!(f, ") -> ")?;
            write_type(f, &function.return_type, arena)
        }
    }
}

/// Type relations over an element graph.
pub struct TypeSystem<'a> {
    arena: &'a ElementArena,
}

impl<'a> TypeSystem<'a> {
    pub const fn new(arena: &'a ElementArena) -> Self {
        Self { arena }
    }

    fn object_type(&self) -> InterfaceType {
        self.arena.type_provider().object_type.clone()
    }

    /// Bound of a type parameter, `Object` when unbounded
    pub fn bound_of(&self, parameter: ElementId) -> Type {
        match &self.arena[parameter].kind {
            ElementKind::TypeParameter(data) => data
                .bound
                .clone()
                .unwrap_or_else(|| Type::Interface(self.object_type())),
            _ => Type::Dynamic,
        }
    }

    /// Bound of a type parameter with chains of type-parameter bounds followed
    pub fn interface_bound_of(&self, parameter: ElementId) -> Type {
        let mut visited = FxHashSet::default();
        let mut bound = self.bound_of(parameter);
        while let Type::TypeParameter(next) = bound {
            if !visited.insert(next) {
                return Type::Interface(self.object_type());
            }
            bound = self.bound_of(next);
        }
        bound
    }

    /// Superclass of `ty` with `ty`'s type arguments substituted
    pub fn superclass(&self, ty: &InterfaceType) -> Option<InterfaceType> {
        let class = self.arena[ty.element].as_class()?;
        let supertype = class.supertype.as_ref()?;
        Some(supertype.substitute(&class.type_parameters, &ty.type_arguments))
    }

    /// Direct supertypes of `ty`: superclass, mixins, then interfaces
    pub fn direct_supertypes(&self, ty: &InterfaceType) -> Vec<InterfaceType> {
        let Some(class) = self.arena[ty.element].as_class() else {
            return Vec::new();
        };
        class
            .supertype
            .iter()
            .chain(&class.mixins)
            .chain(&class.interfaces)
            .map(|supertype| supertype.substitute(&class.type_parameters, &ty.type_arguments))
            .collect()
    }

    /// The supertype of `ty` whose element is `class`, if `ty` inherits from it
    pub fn as_instance_of(&self, ty: &InterfaceType, class: ElementId) -> Option<InterfaceType> {
        let mut visited = FxHashSet::default();
        let mut pending = vec![ty.clone()];
        while let Some(candidate) = pending.pop() {
            if candidate.element == class {
                return Some(candidate);
            }
            if !visited.insert(candidate.element) {
                continue;
            }
            // Reverse so that the superclass is explored first.
            pending.extend(self.direct_supertypes(&candidate).into_iter().rev());
        }
        None
    }

    /// `s << t`: `s` is more specific than `t`
    pub fn is_more_specific(&self, s: &Type, t: &Type) -> bool {
        self.more_specific(s, t, false, &mut FxHashSet::default())
    }

    /// `s <: t`: `s` with `dynamic` read as bottom is more specific than `t`
    pub fn is_subtype(&self, s: &Type, t: &Type) -> bool {
        self.more_specific(s, t, true, &mut FxHashSet::default())
    }

    /// Either type is a subtype of the other
    pub fn is_assignable(&self, s: &Type, t: &Type) -> bool {
        self.is_subtype(s, t) || self.is_subtype(t, s)
    }

    fn more_specific(
        &self,
        s: &Type,
        t: &Type,
        dynamic_is_bottom: bool,
        visited: &mut FxHashSet<ElementId>,
    ) -> bool {
        if s == t {
            return true;
        }
        match (s, t) {
            (_, Type::Dynamic) | (Type::Bottom, _) => true,
            (Type::Dynamic, _) => dynamic_is_bottom,
            (_, Type::Bottom) | (Type::Void, _) | (_, Type::Void) => false,
            (Type::TypeParameter(parameter), _) => {
                if !visited.insert(*parameter) {
                    return false;
                }
                let bound = self.bound_of(*parameter);
                self.more_specific(&bound, t, dynamic_is_bottom, visited)
            }
            (_, Type::TypeParameter(_)) => false,
            (Type::Function(_), Type::Interface(target)) => {
                let types = self.arena.type_provider();
                target.element == types.object_type.element
                    || target.element == types.function_type.element
            }
            (Type::Interface(_), Type::Function(_)) => false,
            (Type::Function(f), Type::Function(g)) => self.function_more_specific(f, g),
            (Type::Interface(i), Type::Interface(j)) => {
                self.interface_more_specific(i, j, dynamic_is_bottom, visited)
            }
        }
    }

    fn interface_more_specific(
        &self,
        s: &InterfaceType,
        t: &InterfaceType,
        dynamic_is_bottom: bool,
        visited: &mut FxHashSet<ElementId>,
    ) -> bool {
        if s.element == t.element {
            let count = s.type_arguments.len().max(t.type_arguments.len());
            return (0..count).all(|index| {
                self.more_specific(
                    &s.argument(index),
                    &t.argument(index),
                    dynamic_is_bottom,
                    &mut FxHashSet::default(),
                )
            });
        }
        if t.element == self.arena.type_provider().object_type.element {
            return true;
        }
        if !visited.insert(s.element) {
            return false;
        }
        self.direct_supertypes(s)
            .iter()
            .any(|supertype| self.interface_more_specific(supertype, t, dynamic_is_bottom, visited))
    }

    fn function_more_specific(&self, f: &FunctionType, g: &FunctionType) -> bool {
        if f.normal_parameters.len() != g.normal_parameters.len() {
            return false;
        }
        let f_positional = f.normal_parameters.len() + f.optional_parameters.len();
        let g_positional = g.normal_parameters.len() + g.optional_parameters.len();
        if f_positional < g_positional {
            return false;
        }
        let positional = |function: &'_ FunctionType, index: usize| -> Type {
            function
                .normal_parameters
                .iter()
                .chain(&function.optional_parameters)
                .nth(index)
                .cloned()
                .unwrap_or(Type::Dynamic)
        };
        let parameters_match = (0..g_positional)
            .all(|index| self.is_assignable(&positional(f, index), &positional(g, index)));
        let named_match = g.named_parameters.iter().all(|(name, ty)| {
            f.named_parameters
                .get(name)
                .is_some_and(|own| self.is_assignable(own, ty))
        });
        parameters_match
            && named_match
            && (g.return_type.is_void() || self.is_assignable(&f.return_type, &g.return_type))
    }

    /// Length of the longest superclass/interface path from `class` to `Object`
    fn depth(&self, class: ElementId, visited: &mut FxHashSet<ElementId>) -> usize {
        if !visited.insert(class) {
            return 0;
        }
        let depth = self
            .direct_supertypes(&InterfaceType::raw(class))
            .iter()
            .map(|supertype| self.depth(supertype.element, visited) + 1)
            .max()
            .unwrap_or(0);
        visited.remove(&class);
        depth
    }

    /// `ty` and all its supertypes, substituted, without repeats
    fn all_supertypes(&self, ty: &InterfaceType) -> Vec<InterfaceType> {
        let mut result: Vec<InterfaceType> = Vec::new();
        let mut visited = FxHashSet::default();
        let mut pending = vec![ty.clone()];
        while let Some(candidate) = pending.pop() {
            if !visited.insert(candidate.element) {
                continue;
            }
            pending.extend(self.direct_supertypes(&candidate));
            result.push(candidate);
        }
        let object = self.object_type();
        if !result.contains(&object) {
            result.push(object);
        }
        result
    }

    /// Least upper bound of two types
    pub fn least_upper_bound(&self, a: &Type, b: &Type) -> Type {
        if a == b {
            return a.clone();
        }
        match (a, b) {
            (Type::Dynamic, _) | (_, Type::Dynamic) | (Type::Void, _) | (_, Type::Void) => {
                Type::Dynamic
            }
            (Type::Bottom, other) | (other, Type::Bottom) => other.clone(),
            (Type::TypeParameter(parameter), other) | (other, Type::TypeParameter(parameter)) => {
                if self.is_subtype(other, &Type::TypeParameter(*parameter)) {
                    return Type::TypeParameter(*parameter);
                }
                let bound = self.interface_bound_of(*parameter);
                self.least_upper_bound(&bound, other)
            }
            (Type::Function(_), Type::Function(_)) => {
                Type::Interface(self.arena.type_provider().function_type.clone())
            }
            (Type::Function(_), Type::Interface(_)) | (Type::Interface(_), Type::Function(_)) => {
                let function = Type::Interface(self.arena.type_provider().function_type.clone());
                let other = if matches!(a, Type::Function(_)) { b } else { a };
                self.least_upper_bound(&function, other)
            }
            (Type::Interface(i), Type::Interface(j)) => Type::Interface(self.interface_lub(i, j)),
        }
    }

    fn interface_lub(&self, i: &InterfaceType, j: &InterfaceType) -> InterfaceType {
        if self.is_subtype(&Type::Interface(i.clone()), &Type::Interface(j.clone())) {
            return j.clone();
        }
        if self.is_subtype(&Type::Interface(j.clone()), &Type::Interface(i.clone())) {
            return i.clone();
        }
        let of_j = self.all_supertypes(j);
        let mut candidates: Vec<(usize, InterfaceType)> = self
            .all_supertypes(i)
            .into_iter()
            .filter(|candidate| of_j.contains(candidate))
            .map(|candidate| {
                let depth = self.depth(candidate.element, &mut FxHashSet::default());
                (depth, candidate)
            })
            .collect();
        candidates.sort_by(|a, b| b.0.cmp(&a.0));
        let mut index = 0;
        while index < candidates.len() {
            let depth = candidates[index].0;
            let same_depth = candidates[index..]
                .iter()
                .take_while(|(candidate_depth, _)| *candidate_depth == depth)
                .count();
            if same_depth == 1 {
                return candidates[index].1.clone();
            }
            index += same_depth;
        }
        self.object_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_library::TypeProvider;

    fn iface(ty: &InterfaceType) -> Type {
        Type::Interface(ty.clone())
    }

    fn provider(arena: &ElementArena) -> TypeProvider {
        arena.type_provider().clone()
    }

    #[test]
    fn test_more_specific_with_dynamic_and_bottom() {
        let arena = ElementArena::default();
        let types = provider(&arena);
        let system = TypeSystem::new(&arena);
        let int = iface(&types.int_type);
        assert!(system.is_more_specific(&int, &Type::Dynamic));
        assert!(system.is_more_specific(&Type::Bottom, &int));
        assert!(!system.is_more_specific(&Type::Dynamic, &int));
        assert!(system.is_more_specific(&Type::Dynamic, &Type::Dynamic));
        assert!(system.is_subtype(&Type::Dynamic, &int));
    }

    #[test]
    fn test_numeric_hierarchy() {
        let arena = ElementArena::default();
        let types = provider(&arena);
        let system = TypeSystem::new(&arena);
        let int = iface(&types.int_type);
        let num = iface(&types.num_type);
        let string = iface(&types.string_type);
        assert!(system.is_subtype(&int, &num));
        assert!(!system.is_subtype(&num, &int));
        assert!(system.is_assignable(&num, &int));
        assert!(!system.is_assignable(&string, &int));
        assert!(system.is_subtype(&string, &iface(&types.object_type)));
    }

    #[test]
    fn test_generic_arguments_are_covariant() {
        let arena = ElementArena::default();
        let types = provider(&arena);
        let system = TypeSystem::new(&arena);
        let list_of_int = Type::Interface(types.list_of(iface(&types.int_type)));
        let list_of_num = Type::Interface(types.list_of(iface(&types.num_type)));
        let iterable_of_num = Type::Interface(types.iterable_of(iface(&types.num_type)));
        assert!(system.is_subtype(&list_of_int, &list_of_num));
        assert!(system.is_subtype(&list_of_int, &iterable_of_num));
        assert!(!system.is_subtype(&list_of_num, &list_of_int));
    }

    #[test]
    fn test_as_instance_of_substitutes_arguments() {
        let arena = ElementArena::default();
        let types = provider(&arena);
        let system = TypeSystem::new(&arena);
        let list_of_string = types.list_of(iface(&types.string_type));
        let iterable = system
            .as_instance_of(&list_of_string, types.iterable_type.element)
            .expect("List implements Iterable");
        assert_eq!(iterable.type_arguments, vec![iface(&types.string_type)]);
    }

    #[test]
    fn test_least_upper_bound() {
        let arena = ElementArena::default();
        let types = provider(&arena);
        let system = TypeSystem::new(&arena);
        let int = iface(&types.int_type);
        let double = iface(&types.double_type);
        let string = iface(&types.string_type);
        assert_eq!(system.least_upper_bound(&int, &double), iface(&types.num_type));
        assert_eq!(system.least_upper_bound(&int, &Type::Bottom), int);
        assert_eq!(system.least_upper_bound(&int, &string), iface(&types.object_type));
        assert_eq!(system.least_upper_bound(&int, &Type::Dynamic), Type::Dynamic);
    }

    #[test]
    fn test_display() {
        let arena = ElementArena::default();
        let types = provider(&arena);
        let function = Type::Function(FunctionType {
            normal_parameters: vec![iface(&types.int_type)],
            optional_parameters: vec![iface(&types.string_type)],
            named_parameters: IndexMap::from([(SmolStr::new("flag"), iface(&types.bool_type))]),
            return_type: Box::new(Type::Interface(types.list_of(Type::Dynamic))),
        });
        insta::assert_snapshot!(
            function.display(&arena).to_string(),
            @"(int, [String], {flag: bool}) -> List<dynamic>"
        );
    }
}
