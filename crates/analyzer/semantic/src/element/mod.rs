//! # Element Model
//!
//! Elements are the symbol table of the analyzer: one entry per declaration
//! (library, compilation unit, class, member, parameter, local variable,
//! label, directive). They live in an [`ElementArena`] and refer to each other
//! by [`ElementId`]. Ownership flows forward (a class lists its members); the
//! `enclosing` link is a back-reference resolved through the arena, never a
//! pointer.
//!
//! Elements are created by the [`ElementBuilder`] (declarations visible outside
//! a body) and by the resolver (locals, labels, closures). Once the passes that
//! fill them in are done they are treated as immutable.

use bitflags::bitflags;
use quill_analyzer_syntax::ast::ParameterKind;
use quill_analyzer_syntax::NodeId;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::types::{InterfaceType, Type};

mod arena;
mod builder;

pub use arena::ElementArena;
pub use builder::ElementBuilder;

index_vec::define_index_type! {
    /// A unique ID for an element within an arena
    pub struct ElementId = u32;

    MAX_INDEX = u32::MAX as usize;
}

bitflags! {
    /// Modifiers and provenance of an element
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ElementFlags: u16 {
        /// Declared `static` (class members only)
        const STATIC = 1 << 0;
        /// Induced by another declaration rather than written in source
        const SYNTHETIC = 1 << 1;
        /// Declared without a body, or an `abstract` class
        const ABSTRACT = 1 << 2;
        const FINAL = 1 << 3;
        const CONST = 1 << 4;
        const FACTORY = 1 << 5;
        /// A user-definable operator method
        const OPERATOR = 1 << 6;
        /// `this.x` parameter
        const FIELD_FORMAL = 1 << 7;
        /// Variable declared with an initializer
        const HAS_INITIALIZER = 1 << 8;
    }
}

/// A single symbol-table entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: SmolStr,
    pub kind: ElementKind,
    /// Owning element; `None` only for libraries
    pub enclosing: Option<ElementId>,
    /// Offset of the declaring name in its source
    pub offset: usize,
    /// Declaring syntax node, when there is one
    pub node: Option<NodeId>,
    pub flags: ElementFlags,
    /// Declaration shape, compared by the declaration matcher
    pub signature: Option<String>,
}

impl Element {
    pub fn new(name: impl Into<SmolStr>, kind: ElementKind) -> Self {
        Self {
            name: name.into(),
            kind,
            enclosing: None,
            offset: 0,
            node: None,
            flags: ElementFlags::empty(),
            signature: None,
        }
    }

    pub fn with_enclosing(mut self, enclosing: ElementId) -> Self {
        self.enclosing = Some(enclosing);
        self
    }

    pub fn with_flags(mut self, flags: ElementFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_node(mut self, node: NodeId, offset: usize) -> Self {
        self.node = Some(node);
        self.offset = offset;
        self
    }

    pub fn with_signature(mut self, signature: String) -> Self {
        self.signature = Some(signature);
        self
    }

    pub const fn is_static(&self) -> bool {
        self.flags.contains(ElementFlags::STATIC)
    }

    pub const fn is_synthetic(&self) -> bool {
        self.flags.contains(ElementFlags::SYNTHETIC)
    }

    pub const fn is_abstract(&self) -> bool {
        self.flags.contains(ElementFlags::ABSTRACT)
    }

    /// Library-private names start with an underscore
    pub fn is_private(&self) -> bool {
        self.name.starts_with('_')
    }

    pub const fn is_getter(&self) -> bool {
        matches!(&self.kind, ElementKind::PropertyAccessor(accessor) if accessor.is_getter)
    }

    pub const fn is_setter(&self) -> bool {
        matches!(&self.kind, ElementKind::PropertyAccessor(accessor) if !accessor.is_getter)
    }

    /// Locals and parameters: the bindings type narrowing applies to
    pub const fn is_local_binding(&self) -> bool {
        matches!(
            self.kind,
            ElementKind::LocalVariable(_) | ElementKind::Parameter(_)
        )
    }

    pub const fn as_library(&self) -> Option<&LibraryData> {
        match &self.kind {
            ElementKind::Library(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_library_mut(&mut self) -> Option<&mut LibraryData> {
        match &mut self.kind {
            ElementKind::Library(data) => Some(data),
            _ => None,
        }
    }

    pub const fn as_unit(&self) -> Option<&UnitData> {
        match &self.kind {
            ElementKind::CompilationUnit(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_unit_mut(&mut self) -> Option<&mut UnitData> {
        match &mut self.kind {
            ElementKind::CompilationUnit(data) => Some(data),
            _ => None,
        }
    }

    pub const fn as_class(&self) -> Option<&ClassData> {
        match &self.kind {
            ElementKind::Class(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_class_mut(&mut self) -> Option<&mut ClassData> {
        match &mut self.kind {
            ElementKind::Class(data) => Some(data),
            _ => None,
        }
    }

    /// Constructors, methods, functions and accessors
    pub const fn as_executable(&self) -> Option<&ExecutableData> {
        match &self.kind {
            ElementKind::Constructor(data)
            | ElementKind::Method(data)
            | ElementKind::Function(data) => Some(data),
            ElementKind::PropertyAccessor(accessor) => Some(&accessor.executable),
            _ => None,
        }
    }

    pub fn as_executable_mut(&mut self) -> Option<&mut ExecutableData> {
        match &mut self.kind {
            ElementKind::Constructor(data)
            | ElementKind::Method(data)
            | ElementKind::Function(data) => Some(data),
            ElementKind::PropertyAccessor(accessor) => Some(&mut accessor.executable),
            _ => None,
        }
    }

    /// Fields, top-level variables and local variables
    pub const fn as_variable(&self) -> Option<&VariableData> {
        match &self.kind {
            ElementKind::Field(data)
            | ElementKind::TopLevelVariable(data)
            | ElementKind::LocalVariable(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_variable_mut(&mut self) -> Option<&mut VariableData> {
        match &mut self.kind {
            ElementKind::Field(data)
            | ElementKind::TopLevelVariable(data)
            | ElementKind::LocalVariable(data) => Some(data),
            _ => None,
        }
    }

    pub const fn as_parameter(&self) -> Option<&ParameterData> {
        match &self.kind {
            ElementKind::Parameter(data) => Some(data),
            _ => None,
        }
    }

    pub const fn as_accessor(&self) -> Option<&AccessorData> {
        match &self.kind {
            ElementKind::PropertyAccessor(data) => Some(data),
            _ => None,
        }
    }
}

/// What kind of declaration an element stands for, with its kind-specific data.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Library(LibraryData),
    CompilationUnit(UnitData),
    /// Classes and class type aliases (mixin applications)
    Class(ClassData),
    FunctionTypeAlias(FunctionTypeAliasData),
    TypeParameter(TypeParameterData),
    Constructor(ExecutableData),
    Method(ExecutableData),
    /// Top-level, local and anonymous functions
    Function(ExecutableData),
    PropertyAccessor(AccessorData),
    Field(VariableData),
    TopLevelVariable(VariableData),
    LocalVariable(VariableData),
    Parameter(ParameterData),
    Label(LabelData),
    Import(ImportData),
    Export(ExportData),
    Prefix(PrefixData),
}

impl ElementKind {
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Library(_) => "library",
            Self::CompilationUnit(_) => "compilation unit",
            Self::Class(_) => "class",
            Self::FunctionTypeAlias(_) => "function type alias",
            Self::TypeParameter(_) => "type parameter",
            Self::Constructor(_) => "constructor",
            Self::Method(_) => "method",
            Self::Function(_) => "function",
            Self::PropertyAccessor(accessor) if accessor.is_getter => "getter",
            Self::PropertyAccessor(_) => "setter",
            Self::Field(_) => "field",
            Self::TopLevelVariable(_) => "top-level variable",
            Self::LocalVariable(_) => "local variable",
            Self::Parameter(_) => "parameter",
            Self::Label(_) => "label",
            Self::Import(_) => "import",
            Self::Export(_) => "export",
            Self::Prefix(_) => "prefix",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryData {
    pub uri: String,
    pub defining_unit: Option<ElementId>,
    pub parts: Vec<ElementId>,
    pub imports: Vec<ElementId>,
    pub exports: Vec<ElementId>,
    pub prefixes: Vec<ElementId>,
    /// Whether the source imports the core library itself. When it does not,
    /// a synthetic import is added and this stays `false`.
    pub explicitly_imports_core: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitData {
    pub uri: String,
    /// Stamp of the source text the unit was built from
    pub modification_stamp: u64,
    pub types: Vec<ElementId>,
    pub function_type_aliases: Vec<ElementId>,
    pub functions: Vec<ElementId>,
    pub top_level_variables: Vec<ElementId>,
    pub accessors: Vec<ElementId>,
    /// Declaring node → element, for every element declared in this unit
    pub declarations: FxHashMap<NodeId, ElementId>,
}

impl UnitData {
    /// Elements nameable from the library scope
    pub fn top_level_elements(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.types
            .iter()
            .chain(&self.function_type_aliases)
            .chain(&self.functions)
            .chain(&self.accessors)
            .copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassData {
    pub type_parameters: Vec<ElementId>,
    /// `None` before type resolution, and for `Object`
    pub supertype: Option<InterfaceType>,
    pub mixins: Vec<InterfaceType>,
    pub interfaces: Vec<InterfaceType>,
    pub fields: Vec<ElementId>,
    pub accessors: Vec<ElementId>,
    pub methods: Vec<ElementId>,
    pub constructors: Vec<ElementId>,
    /// `class A = B with M;`
    pub is_mixin_application: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeParameterData {
    pub bound: Option<Type>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionTypeAliasData {
    pub type_parameters: Vec<ElementId>,
    pub parameters: Vec<ElementId>,
    pub return_type: Option<Type>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutableData {
    pub parameters: Vec<ElementId>,
    /// Declared return type; `None` when omitted
    pub return_type: Option<Type>,
    pub local_variables: Vec<ElementId>,
    pub functions: Vec<ElementId>,
    pub labels: Vec<ElementId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessorData {
    pub executable: ExecutableData,
    pub is_getter: bool,
    /// The field or top-level variable this accessor reads or writes
    pub variable: Option<ElementId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableData {
    /// Declared type; `None` when untyped
    pub ty: Option<Type>,
    pub getter: Option<ElementId>,
    pub setter: Option<ElementId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterData {
    pub kind: ParameterKind,
    pub ty: Option<Type>,
    pub has_default_value: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelData {
    /// Label on a `case`/`default` member rather than on a statement
    pub on_switch_member: bool,
}

/// Show/hide filter carried by an import or export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceCombinator {
    Show(Vec<SmolStr>),
    Hide(Vec<SmolStr>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportData {
    /// Resolved URI; `None` when the directive's URI could not be evaluated
    pub uri: Option<String>,
    pub imported_library: Option<ElementId>,
    pub prefix: Option<ElementId>,
    pub combinators: Vec<NamespaceCombinator>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportData {
    pub uri: Option<String>,
    pub exported_library: Option<ElementId>,
    pub combinators: Vec<NamespaceCombinator>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrefixData {
    pub imports: Vec<ElementId>,
}

/// Name under which a setter is stored and looked up
pub fn setter_name(name: &str) -> SmolStr {
    SmolStr::from(format!("{name}="))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessor_queries() {
        let getter = Element::new(
            "x",
            ElementKind::PropertyAccessor(AccessorData {
                is_getter: true,
                ..Default::default()
            }),
        );
        assert!(getter.is_getter());
        assert!(!getter.is_setter());
        assert!(getter.as_executable().is_some());
        assert_eq!(getter.kind.display_name(), "getter");
    }

    #[test]
    fn test_flags_accumulate() {
        let element = Element::new("_f", ElementKind::Method(ExecutableData::default()))
            .with_flags(ElementFlags::STATIC)
            .with_flags(ElementFlags::ABSTRACT);
        assert!(element.is_static());
        assert!(element.is_abstract());
        assert!(element.is_private());
        assert!(!element.is_synthetic());
    }

    #[test]
    fn test_setter_name() {
        assert_eq!(setter_name("length"), "length=");
    }
}
