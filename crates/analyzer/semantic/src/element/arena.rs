//! Layered element storage.
//!
//! The core library's elements form a frozen base shared by every arena; the
//! ids of a session's own elements continue after it. Writing to a base
//! element is a caller bug and panics.

use std::ops::{Index, IndexMut};
use std::sync::Arc;

use indexmap::IndexMap;
use quill_analyzer_syntax::ast::ParameterKind;

use super::{Element, ElementId, ElementKind};
use crate::core_library::{CoreLibrary, TypeProvider};
use crate::types::{FunctionType, InterfaceType, Type};

#[derive(Debug, Clone)]
pub struct ElementArena {
    core: Arc<CoreLibrary>,
    elements: Vec<Element>,
}

impl Default for ElementArena {
    fn default() -> Self {
        Self::new(CoreLibrary::shared())
    }
}

impl ElementArena {
    pub fn new(core: Arc<CoreLibrary>) -> Self {
        Self {
            core,
            elements: Vec::new(),
        }
    }

    pub fn core(&self) -> &CoreLibrary {
        &self.core
    }

    pub fn type_provider(&self) -> &TypeProvider {
        self.core.type_provider()
    }

    fn base(&self) -> usize {
        self.core.elements().len()
    }

    pub fn alloc(&mut self, element: Element) -> ElementId {
        let id = ElementId::new(self.base() + self.elements.len());
        self.elements.push(element);
        id
    }

    /// Whether `id` belongs to the shared core library
    pub fn is_frozen(&self, id: ElementId) -> bool {
        id.index() < self.base()
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        let base = self.base();
        id.index()
            .checked_sub(base)
            .and_then(|local| self.elements.get_mut(local))
    }

    pub fn len(&self) -> usize {
        self.base() + self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every element, core library first
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        let base = self.base();
        self.core.elements().iter_enumerated().chain(
            self.elements
                .iter()
                .enumerate()
                .map(move |(i, element)| (ElementId::new(base + i), element)),
        )
    }

    // ===== Navigation =====

    /// Nearest enclosing element (or the element itself) satisfying `predicate`
    fn ancestor(&self, id: ElementId, predicate: impl Fn(&Element) -> bool) -> Option<ElementId> {
        let mut current = Some(id);
        while let Some(candidate) = current {
            if predicate(&self[candidate]) {
                return Some(candidate);
            }
            current = self[candidate].enclosing;
        }
        None
    }

    pub fn library_of(&self, id: ElementId) -> Option<ElementId> {
        self.ancestor(id, |element| matches!(element.kind, ElementKind::Library(_)))
    }

    pub fn unit_of(&self, id: ElementId) -> Option<ElementId> {
        self.ancestor(id, |element| {
            matches!(element.kind, ElementKind::CompilationUnit(_))
        })
    }

    pub fn enclosing_class(&self, id: ElementId) -> Option<ElementId> {
        let enclosing = self[id].enclosing?;
        self.ancestor(enclosing, |element| matches!(element.kind, ElementKind::Class(_)))
    }

    /// Whether `ancestor` is `id` or one of its enclosing elements
    pub fn is_enclosed_by(&self, id: ElementId, ancestor: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            current = self[candidate].enclosing;
        }
        false
    }

    // ===== Types of elements =====

    /// The type a class declares for `this`: the class applied to its own
    /// type parameters
    pub fn this_type(&self, class: ElementId) -> InterfaceType {
        let arguments = self[class]
            .as_class()
            .map(|data| {
                data.type_parameters
                    .iter()
                    .map(|parameter| Type::TypeParameter(*parameter))
                    .collect()
            })
            .unwrap_or_default();
        InterfaceType::new(class, arguments)
    }

    /// Type parameters of a class or function type alias
    pub fn type_parameters_of(&self, id: ElementId) -> &[ElementId] {
        match &self[id].kind {
            ElementKind::Class(data) => &data.type_parameters,
            ElementKind::FunctionTypeAlias(data) => &data.type_parameters,
            _ => &[],
        }
    }

    pub fn parameters_of(&self, id: ElementId) -> &[ElementId] {
        match &self[id].kind {
            ElementKind::FunctionTypeAlias(data) => &data.parameters,
            _ => self[id]
                .as_executable()
                .map_or(&[][..], |data| data.parameters.as_slice()),
        }
    }

    /// Declared type of a parameter or variable, `dynamic` when untyped
    pub fn declared_type(&self, id: ElementId) -> Type {
        match &self[id].kind {
            ElementKind::Parameter(data) => data.ty.clone().unwrap_or(Type::Dynamic),
            _ => self[id]
                .as_variable()
                .and_then(|data| data.ty.clone())
                .unwrap_or(Type::Dynamic),
        }
    }

    /// Structural function type of an executable element or function type alias
    pub fn function_type_of(&self, id: ElementId) -> FunctionType {
        let mut normal_parameters = Vec::new();
        let mut optional_parameters = Vec::new();
        let mut named_parameters = IndexMap::new();
        for parameter in self.parameters_of(id) {
            let Some(data) = self[*parameter].as_parameter() else {
                continue;
            };
            let ty = data.ty.clone().unwrap_or(Type::Dynamic);
            match data.kind {
                ParameterKind::Required => normal_parameters.push(ty),
                ParameterKind::Positional => optional_parameters.push(ty),
                ParameterKind::Named => {
                    named_parameters.insert(self[*parameter].name.clone(), ty);
                }
            }
        }
        let element = &self[id];
        let return_type = match &element.kind {
            ElementKind::Constructor(_) => self.enclosing_class(id).map_or(Type::Dynamic, |class| {
                Type::Interface(self.this_type(class))
            }),
            ElementKind::FunctionTypeAlias(data) => {
                data.return_type.clone().unwrap_or(Type::Dynamic)
            }
            ElementKind::PropertyAccessor(accessor) if !accessor.is_getter => accessor
                .executable
                .return_type
                .clone()
                .unwrap_or(Type::Void),
            _ => element
                .as_executable()
                .and_then(|data| data.return_type.clone())
                .unwrap_or(Type::Dynamic),
        };
        FunctionType {
            normal_parameters,
            optional_parameters,
            named_parameters,
            return_type: Box::new(return_type),
        }
    }

    /// Return type of an executable as declared, `dynamic` when omitted
    pub fn return_type_of(&self, id: ElementId) -> Type {
        *self.function_type_of(id).return_type
    }

    /// The static type of a reference to element `id`
    pub fn type_of(&self, id: ElementId) -> Type {
        match &self[id].kind {
            ElementKind::Field(_)
            | ElementKind::TopLevelVariable(_)
            | ElementKind::LocalVariable(_)
            | ElementKind::Parameter(_) => self.declared_type(id),
            ElementKind::PropertyAccessor(accessor) if accessor.is_getter => {
                accessor.executable.return_type.clone().unwrap_or(Type::Dynamic)
            }
            ElementKind::PropertyAccessor(accessor) => accessor
                .executable
                .parameters
                .first()
                .map_or(Type::Dynamic, |parameter| self.declared_type(*parameter)),
            ElementKind::Constructor(_) | ElementKind::Method(_) | ElementKind::Function(_) => {
                Type::Function(self.function_type_of(id))
            }
            ElementKind::Class(_)
            | ElementKind::FunctionTypeAlias(_)
            | ElementKind::TypeParameter(_) => {
                Type::Interface(self.type_provider().type_type.clone())
            }
            ElementKind::Library(_)
            | ElementKind::CompilationUnit(_)
            | ElementKind::Label(_)
            | ElementKind::Import(_)
            | ElementKind::Export(_)
            | ElementKind::Prefix(_) => Type::Dynamic,
        }
    }

    /// `Name` or `Class.name`, for messages
    pub fn qualified_name(&self, id: ElementId) -> String {
        let element = &self[id];
        match self.enclosing_class(id) {
            Some(class) if !matches!(element.kind, ElementKind::TypeParameter(_)) => {
                format!("{}.{}", self[class].name, element.name)
            }
            _ => element.name.to_string(),
        }
    }
}

impl Index<ElementId> for ElementArena {
    type Output = Element;

    fn index(&self, id: ElementId) -> &Element {
        match id.index().checked_sub(self.base()) {
            Some(local) => &self.elements[local],
            None => &self.core.elements()[id],
        }
    }
}

impl IndexMut<ElementId> for ElementArena {
    fn index_mut(&mut self, id: ElementId) -> &mut Element {
        match self.get_mut(id) {
            Some(element) => element,
            None => panic!("element {id:?} belongs to the frozen core library"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ClassData, ElementKind};

    #[test]
    fn test_session_ids_continue_after_core() {
        let mut arena = ElementArena::default();
        let base = arena.len();
        let id = arena.alloc(Element::new("A", ElementKind::Class(ClassData::default())));
        assert_eq!(id.index(), base);
        assert!(!arena.is_frozen(id));
        assert!(arena.is_frozen(arena.type_provider().object_type.element));
        assert_eq!(arena[id].name, "A");
    }

    #[test]
    #[should_panic(expected = "frozen core library")]
    fn test_core_elements_are_frozen() {
        let mut arena = ElementArena::default();
        let object = arena.type_provider().object_type.element;
        arena[object].name = "Thing".into();
    }

    #[test]
    fn test_core_member_navigation() {
        let arena = ElementArena::default();
        let list = arena.type_provider().list_type.element;
        let core = arena.core().library();
        assert_eq!(arena.library_of(list), Some(core));
        let length = arena[list]
            .as_class()
            .and_then(|data| {
                data.accessors
                    .iter()
                    .copied()
                    .find(|accessor| arena[*accessor].name == "length")
            })
            .expect("List declares length");
        assert_eq!(arena.enclosing_class(length), Some(list));
        assert_eq!(arena.qualified_name(length), "List.length");
    }
}
