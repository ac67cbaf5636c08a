//! # Scopes
//!
//! Lexical name lookup during resolution. A [`LibraryScope`] holds the
//! library's own top-level declarations and its import namespaces; a
//! [`ScopeChain`] stacks class, type-parameter, function and block frames on
//! top of it while a declaration is walked. Labels live in a separate
//! [`LabelScope`] because they obey different visibility rules: a label is
//! never visible across a function boundary.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::fmt;

use crate::element::{ElementArena, ElementId, ElementKind};
use crate::namespace::{import_namespace, Namespace};

/// Outcome of a name lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(ElementId),
    /// Two or more imports contribute distinct elements
    Ambiguous(Vec<ElementId>),
    NotFound,
}

impl Lookup {
    pub const fn element(&self) -> Option<ElementId> {
        match self {
            Self::Found(element) => Some(*element),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct ImportedNamespace {
    prefix: Option<SmolStr>,
    namespace: Namespace,
    is_core: bool,
}

/// Names visible at the top level of a library.
#[derive(Debug, Clone)]
pub struct LibraryScope {
    library: ElementId,
    definitions: Namespace,
    imports: Vec<ImportedNamespace>,
    /// Top-level elements whose name was already taken
    duplicates: Vec<ElementId>,
}

impl LibraryScope {
    /// Builds the scope from the library element's units, imports and prefixes
    pub fn new(arena: &ElementArena, library: ElementId) -> Self {
        let mut scope = Self {
            library,
            definitions: Namespace::default(),
            imports: Vec::new(),
            duplicates: Vec::new(),
        };
        let Some(data) = arena[library].as_library() else {
            return scope;
        };
        for unit in data.defining_unit.iter().chain(&data.parts) {
            let Some(unit) = arena[*unit].as_unit() else {
                continue;
            };
            for element in unit.top_level_elements() {
                if scope
                    .definitions
                    .define(arena[element].name.clone(), element)
                    .is_some()
                {
                    scope.duplicates.push(element);
                }
            }
        }
        for prefix in &data.prefixes {
            if scope.definitions.define(arena[*prefix].name.clone(), *prefix).is_some() {
                scope.duplicates.push(*prefix);
            }
        }
        let core = arena.core().library();
        for import in &data.imports {
            let ElementKind::Import(import_data) = &arena[*import].kind else {
                continue;
            };
            scope.imports.push(ImportedNamespace {
                prefix: import_data.prefix.map(|prefix| arena[prefix].name.clone()),
                namespace: import_namespace(arena, *import),
                is_core: import_data.imported_library == Some(core),
            });
        }
        scope
    }

    pub const fn library(&self) -> ElementId {
        self.library
    }

    pub fn duplicates(&self) -> &[ElementId] {
        &self.duplicates
    }

    /// Unprefixed lookup: own declarations shadow imports
    pub fn lookup(&self, name: &str) -> Lookup {
        if let Some(element) = self.definitions.get(name) {
            return Lookup::Found(element);
        }
        self.lookup_imported(None, name)
    }

    /// `prefix.name`
    pub fn lookup_prefixed(&self, prefix: &str, name: &str) -> Lookup {
        self.lookup_imported(Some(prefix), name)
    }

    fn lookup_imported(&self, prefix: Option<&str>, name: &str) -> Lookup {
        let mut found: Vec<(ElementId, bool)> = Vec::new();
        for import in &self.imports {
            if import.prefix.as_deref() != prefix {
                continue;
            }
            if let Some(element) = import.namespace.get(name) {
                if !found.iter().any(|(existing, _)| *existing == element) {
                    found.push((element, import.is_core));
                }
            }
        }
        match found.as_slice() {
            [] => Lookup::NotFound,
            [(element, _)] => Lookup::Found(*element),
            _ => {
                // A core declaration yields to any other import of the name.
                let non_core: Vec<ElementId> = found
                    .iter()
                    .filter(|(_, is_core)| !is_core)
                    .map(|(element, _)| *element)
                    .collect();
                match non_core.as_slice() {
                    [element] => Lookup::Found(*element),
                    _ => Lookup::Ambiguous(found.into_iter().map(|(element, _)| element).collect()),
                }
            }
        }
    }
}

/// The lexical construct a frame covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Members of a class body
    Class(ElementId),
    TypeParameters,
    /// Parameters of a function, method or constructor
    Function(ElementId),
    Block,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(_) => write!(f, "class"),
            Self::TypeParameters => write!(f, "type parameters"),
            Self::Function(_) => write!(f, "function"),
            Self::Block => write!(f, "block"),
        }
    }
}

#[derive(Debug)]
struct Frame {
    kind: ScopeKind,
    names: FxHashMap<SmolStr, ElementId>,
}

/// Nested lookup frames over a library scope.
#[derive(Debug)]
pub struct ScopeChain<'s> {
    library: &'s LibraryScope,
    frames: Vec<Frame>,
}

impl<'s> ScopeChain<'s> {
    pub const fn new(library: &'s LibraryScope) -> Self {
        Self {
            library,
            frames: Vec::new(),
        }
    }

    pub const fn library_scope(&self) -> &'s LibraryScope {
        self.library
    }

    pub fn push(&mut self, kind: ScopeKind) {
        self.frames.push(Frame {
            kind,
            names: FxHashMap::default(),
        });
    }

    /// Pushes the member frame of `class`: methods and accessors, static or not
    pub fn push_class(&mut self, arena: &ElementArena, class: ElementId) {
        self.push(ScopeKind::Class(class));
        if let Some(data) = arena[class].as_class() {
            for member in data.methods.iter().chain(&data.accessors) {
                self.define(arena[*member].name.clone(), *member);
            }
        }
    }

    /// Pushes a frame binding the given type parameters
    pub fn push_type_parameters(&mut self, arena: &ElementArena, parameters: &[ElementId]) {
        self.push(ScopeKind::TypeParameters);
        for parameter in parameters {
            self.define(arena[*parameter].name.clone(), *parameter);
        }
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Binds `name` in the innermost frame
    pub fn define(&mut self, name: impl Into<SmolStr>, element: ElementId) {
        if let Some(frame) = self.frames.last_mut() {
            frame.names.insert(name.into(), element);
        }
    }

    /// Innermost binding of `name`, falling back to the library scope
    pub fn lookup(&self, name: &str) -> Lookup {
        match self.lookup_lexical(name) {
            Some(element) => Lookup::Found(element),
            None => self.library.lookup(name),
        }
    }

    /// Innermost binding of `name` among the pushed frames only
    pub fn lookup_lexical(&self, name: &str) -> Option<ElementId> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.names.get(name).copied())
    }

    pub fn enclosing_class(&self) -> Option<ElementId> {
        self.frames.iter().rev().find_map(|frame| match frame.kind {
            ScopeKind::Class(class) => Some(class),
            _ => None,
        })
    }

    pub fn enclosing_function(&self) -> Option<ElementId> {
        self.frames.iter().rev().find_map(|frame| match frame.kind {
            ScopeKind::Function(function) => Some(function),
            _ => None,
        })
    }
}

/// Result of looking up a label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelLookup {
    Found(ElementId),
    /// Declared, but outside the current function
    OuterScope(ElementId),
    NotFound,
}

#[derive(Debug, Clone)]
enum LabelEntry {
    Label { name: SmolStr, element: ElementId },
    FunctionBoundary,
}

/// Labels visible at the current point of a walk.
#[derive(Debug, Default)]
pub struct LabelScope {
    entries: Vec<LabelEntry>,
}

impl LabelScope {
    /// Current height, for restoring with [`LabelScope::truncate`]
    pub fn mark(&self) -> usize {
        self.entries.len()
    }

    pub fn truncate(&mut self, mark: usize) {
        self.entries.truncate(mark);
    }

    pub fn define(&mut self, name: impl Into<SmolStr>, element: ElementId) {
        self.entries.push(LabelEntry::Label {
            name: name.into(),
            element,
        });
    }

    /// Labels defined before a boundary are not targets after it
    pub fn enter_function(&mut self) {
        self.entries.push(LabelEntry::FunctionBoundary);
    }

    pub fn lookup(&self, name: &str) -> LabelLookup {
        let mut crossed_boundary = false;
        for entry in self.entries.iter().rev() {
            match entry {
                LabelEntry::FunctionBoundary => crossed_boundary = true,
                LabelEntry::Label {
                    name: label,
                    element,
                } if label == name => {
                    return if crossed_boundary {
                        LabelLookup::OuterScope(*element)
                    } else {
                        LabelLookup::Found(*element)
                    };
                }
                LabelEntry::Label { .. } => {}
            }
        }
        LabelLookup::NotFound
    }
}
