//! # Core library
//!
//! The foundational `quill:core` library (`Object`, the numeric tower,
//! `String`, collections, ...) is built programmatically once per process and
//! shared read-only by every analysis session. Its elements form the frozen
//! base of each [`ElementArena`](crate::element::ElementArena), and its
//! [`TypeProvider`] hands out the built-in types the resolver needs.

use std::sync::{Arc, OnceLock};

use index_vec::IndexVec;
use quill_analyzer_syntax::ast::ParameterKind;

use crate::element::{
    setter_name, AccessorData, ClassData, Element, ElementFlags, ElementId, ElementKind,
    ExecutableData, LibraryData, ParameterData, TypeParameterData, UnitData, VariableData,
};
use crate::namespace::Namespace;
use crate::types::{InterfaceType, Type};

pub const CORE_LIBRARY_URI: &str = "quill:core";

/// Built-in types. Generic classes are stored applied to their own type
/// parameters; use the `*_of` helpers for concrete instantiations.
#[derive(Debug, Clone)]
pub struct TypeProvider {
    pub object_type: InterfaceType,
    pub bool_type: InterfaceType,
    pub num_type: InterfaceType,
    pub int_type: InterfaceType,
    pub double_type: InterfaceType,
    pub string_type: InterfaceType,
    pub function_type: InterfaceType,
    pub type_type: InterfaceType,
    pub null_type: InterfaceType,
    pub symbol_type: InterfaceType,
    pub stack_trace_type: InterfaceType,
    pub deprecated_type: InterfaceType,
    pub iterator_type: InterfaceType,
    pub iterable_type: InterfaceType,
    pub list_type: InterfaceType,
    pub map_type: InterfaceType,
}

impl TypeProvider {
    pub fn list_of(&self, element: Type) -> InterfaceType {
        InterfaceType::new(self.list_type.element, vec![element])
    }

    pub fn iterable_of(&self, element: Type) -> InterfaceType {
        InterfaceType::new(self.iterable_type.element, vec![element])
    }

    pub fn map_of(&self, key: Type, value: Type) -> InterfaceType {
        InterfaceType::new(self.map_type.element, vec![key, value])
    }

    /// `int` or `double`
    pub fn is_numeric_leaf(&self, ty: &Type) -> bool {
        ty == &Type::Interface(self.int_type.clone())
            || ty == &Type::Interface(self.double_type.clone())
    }
}

#[derive(Debug)]
pub struct CoreLibrary {
    elements: IndexVec<ElementId, Element>,
    library: ElementId,
    types: TypeProvider,
    namespace: Namespace,
}

impl CoreLibrary {
    /// The process-wide core library
    pub fn shared() -> Arc<Self> {
        static CORE: OnceLock<Arc<CoreLibrary>> = OnceLock::new();
        CORE.get_or_init(|| Arc::new(Self::build())).clone()
    }

    pub const fn elements(&self) -> &IndexVec<ElementId, Element> {
        &self.elements
    }

    pub const fn library(&self) -> ElementId {
        self.library
    }

    pub const fn type_provider(&self) -> &TypeProvider {
        &self.types
    }

    /// Names the core library exports
    pub const fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn build() -> Self {
        let _span = tracing::trace_span!("build_core_library").entered();
        let mut b = CoreBuilder::new();

        let object = b.class("Object", &[]);
        let bool_class = b.class("bool", &[]);
        let num = b.class("num", &[]);
        let int = b.class("int", &[]);
        let double = b.class("double", &[]);
        let string = b.class("String", &[]);
        let function = b.class("Function", &[]);
        let type_class = b.class("Type", &[]);
        let null = b.class("Null", &[]);
        let symbol = b.class("Symbol", &[]);
        let stack_trace = b.class("StackTrace", &[]);
        let deprecated = b.class("Deprecated", &[]);
        let iterator = b.class("Iterator", &["E"]);
        let iterable = b.class("Iterable", &["E"]);
        let list = b.class("List", &["E"]);
        let map = b.class("Map", &["K", "V"]);

        let t = |class: ElementId| Type::Interface(InterfaceType::raw(class));
        let (object_t, bool_t, num_t, int_t, double_t, string_t) =
            (t(object), t(bool_class), t(num), t(int), t(double), t(string));
        let required = ParameterKind::Required;
        let positional = ParameterKind::Positional;

        for class in [
            bool_class, num, string, function, type_class, null, symbol, stack_trace, deprecated,
            iterator, iterable, list, map,
        ] {
            b.extend(class, InterfaceType::raw(object));
        }
        b.extend(int, InterfaceType::raw(num));
        b.extend(double, InterfaceType::raw(num));

        // Object
        b.constructor(object, "", &[]);
        b.method(object, "==", &[("other", required, object_t.clone())], bool_t.clone());
        b.method(object, "toString", &[], string_t.clone());
        b.method(object, "noSuchMethod", &[("invocation", required, Type::Dynamic)], Type::Dynamic);
        b.getter(object, "hashCode", int_t.clone());
        b.getter(object, "runtimeType", t(type_class));

        // num
        for operator in ["+", "-", "*", "%"] {
            b.method(num, operator, &[("other", required, num_t.clone())], num_t.clone());
        }
        b.method(num, "/", &[("other", required, num_t.clone())], double_t.clone());
        b.method(num, "~/", &[("other", required, num_t.clone())], int_t.clone());
        for operator in ["<", "<=", ">", ">="] {
            b.method(num, operator, &[("other", required, num_t.clone())], bool_t.clone());
        }
        b.method(num, "unary-", &[], num_t.clone());
        b.method(num, "abs", &[], num_t.clone());
        b.method(num, "compareTo", &[("other", required, num_t.clone())], int_t.clone());
        for conversion in ["toInt", "round", "floor", "ceil"] {
            b.method(num, conversion, &[], int_t.clone());
        }
        b.method(num, "toDouble", &[], double_t.clone());
        b.getter(num, "isNaN", bool_t.clone());
        b.getter(num, "isNegative", bool_t.clone());

        // int deliberately inherits `+` from num; see the numeric rule in the
        // static type analyzer.
        for operator in ["&", "|", "^", "<<", ">>"] {
            b.method(int, operator, &[("other", required, int_t.clone())], int_t.clone());
        }
        b.method(int, "~", &[], int_t.clone());
        b.method(int, "unary-", &[], int_t.clone());
        b.method(int, "abs", &[], int_t.clone());
        b.getter(int, "isEven", bool_t.clone());
        b.getter(int, "isOdd", bool_t.clone());

        // double
        for operator in ["+", "-", "*", "%"] {
            b.method(double, operator, &[("other", required, num_t.clone())], double_t.clone());
        }
        b.method(double, "unary-", &[], double_t.clone());
        b.method(double, "abs", &[], double_t.clone());

        // String
        b.method(string, "+", &[("other", required, string_t.clone())], string_t.clone());
        b.method(string, "[]", &[("index", required, int_t.clone())], string_t.clone());
        b.getter(string, "length", int_t.clone());
        b.getter(string, "isEmpty", bool_t.clone());
        b.getter(
            string,
            "codeUnits",
            Type::Interface(InterfaceType::new(list, vec![int_t.clone()])),
        );
        b.method(string, "toLowerCase", &[], string_t.clone());
        b.method(string, "toUpperCase", &[], string_t.clone());
        b.method(
            string,
            "substring",
            &[("start", required, int_t.clone()), ("end", positional, int_t.clone())],
            string_t.clone(),
        );
        b.method(string, "contains", &[("other", required, string_t.clone())], bool_t.clone());
        b.method(string, "indexOf", &[("other", required, string_t.clone())], int_t.clone());

        b.constructor(symbol, "", &[("name", required, string_t.clone())]);
        b.constructor(deprecated, "", &[("expires", required, string_t.clone())]);
        b.getter(deprecated, "expires", string_t.clone());

        // Iterator<E>
        let iterator_e = b.type_parameter(iterator, 0);
        b.getter(iterator, "current", iterator_e);
        b.method(iterator, "moveNext", &[], bool_t.clone());

        // Iterable<E>
        let iterable_e = b.type_parameter(iterable, 0);
        b.getter(
            iterable,
            "iterator",
            Type::Interface(InterfaceType::new(iterator, vec![iterable_e.clone()])),
        );
        b.getter(iterable, "length", int_t.clone());
        b.getter(iterable, "isEmpty", bool_t.clone());
        b.getter(iterable, "first", iterable_e.clone());
        b.getter(iterable, "last", iterable_e.clone());
        b.method(iterable, "contains", &[("element", required, object_t.clone())], bool_t.clone());
        b.method(iterable, "forEach", &[("action", required, t(function))], Type::Void);
        b.method(
            iterable,
            "join",
            &[("separator", positional, string_t.clone())],
            string_t.clone(),
        );
        b.method(
            iterable,
            "toList",
            &[],
            Type::Interface(InterfaceType::new(list, vec![iterable_e.clone()])),
        );

        // List<E>
        let list_e = b.type_parameter(list, 0);
        b.implement(list, InterfaceType::new(iterable, vec![list_e.clone()]));
        b.constructor(list, "", &[("length", positional, int_t.clone())]);
        b.method(list, "[]", &[("index", required, int_t.clone())], list_e.clone());
        b.method(
            list,
            "[]=",
            &[("index", required, int_t.clone()), ("value", required, list_e.clone())],
            Type::Void,
        );
        b.field(list, "length", int_t.clone());
        b.method(list, "add", &[("value", required, list_e.clone())], Type::Void);
        b.method(
            list,
            "addAll",
            &[(
                "iterable",
                required,
                Type::Interface(InterfaceType::new(iterable, vec![list_e.clone()])),
            )],
            Type::Void,
        );
        b.method(list, "removeLast", &[], list_e.clone());
        b.method(list, "indexOf", &[("element", required, list_e.clone())], int_t.clone());
        b.method(list, "clear", &[], Type::Void);

        // Map<K, V>
        let map_k = b.type_parameter(map, 0);
        let map_v = b.type_parameter(map, 1);
        b.constructor(map, "", &[]);
        b.method(map, "[]", &[("key", required, object_t.clone())], map_v.clone());
        b.method(
            map,
            "[]=",
            &[("key", required, map_k.clone()), ("value", required, map_v.clone())],
            Type::Void,
        );
        b.getter(map, "length", int_t.clone());
        b.getter(map, "isEmpty", bool_t.clone());
        b.getter(
            map,
            "keys",
            Type::Interface(InterfaceType::new(iterable, vec![map_k])),
        );
        b.getter(
            map,
            "values",
            Type::Interface(InterfaceType::new(iterable, vec![map_v.clone()])),
        );
        b.method(map, "containsKey", &[("key", required, object_t.clone())], bool_t.clone());
        b.method(map, "remove", &[("key", required, object_t.clone())], map_v);

        // Top level
        b.function("print", &[("object", required, object_t.clone())], Type::Void);
        b.function(
            "identical",
            &[("a", required, object_t.clone()), ("b", required, object_t)],
            bool_t,
        );
        b.top_level_constant("deprecated", t(deprecated));

        let raw_generic = |class: ElementId, b: &CoreBuilder| {
            let arguments = b.elements[class]
                .as_class()
                .map(|data| {
                    data.type_parameters
                        .iter()
                        .map(|parameter| Type::TypeParameter(*parameter))
                        .collect()
                })
                .unwrap_or_default();
            InterfaceType::new(class, arguments)
        };
        let types = TypeProvider {
            object_type: InterfaceType::raw(object),
            bool_type: InterfaceType::raw(bool_class),
            num_type: InterfaceType::raw(num),
            int_type: InterfaceType::raw(int),
            double_type: InterfaceType::raw(double),
            string_type: InterfaceType::raw(string),
            function_type: InterfaceType::raw(function),
            type_type: InterfaceType::raw(type_class),
            null_type: InterfaceType::raw(null),
            symbol_type: InterfaceType::raw(symbol),
            stack_trace_type: InterfaceType::raw(stack_trace),
            deprecated_type: InterfaceType::raw(deprecated),
            iterator_type: raw_generic(iterator, &b),
            iterable_type: raw_generic(iterable, &b),
            list_type: raw_generic(list, &b),
            map_type: raw_generic(map, &b),
        };
        tracing::trace!(elements = b.elements.len(), "core library built");
        CoreLibrary {
            library: b.library,
            elements: b.elements,
            types,
            namespace: b.namespace,
        }
    }
}

/// Incremental construction of the core element graph.
struct CoreBuilder {
    elements: IndexVec<ElementId, Element>,
    library: ElementId,
    unit: ElementId,
    namespace: Namespace,
}

impl CoreBuilder {
    fn new() -> Self {
        let mut elements = IndexVec::new();
        let library = elements.push(Element::new(
            "quill.core",
            ElementKind::Library(LibraryData {
                uri: CORE_LIBRARY_URI.to_string(),
                ..Default::default()
            }),
        ));
        let unit = elements.push(
            Element::new(
                CORE_LIBRARY_URI,
                ElementKind::CompilationUnit(UnitData {
                    uri: CORE_LIBRARY_URI.to_string(),
                    ..Default::default()
                }),
            )
            .with_enclosing(library),
        );
        if let Some(data) = elements[library].as_library_mut() {
            data.defining_unit = Some(unit);
        }
        Self {
            elements,
            library,
            unit,
            namespace: Namespace::default(),
        }
    }

    fn unit_data(&mut self) -> &mut UnitData {
        match &mut self.elements[self.unit].kind {
            ElementKind::CompilationUnit(data) => data,
            _ => unreachable!("core unit is a compilation unit"),
        }
    }

    fn class_data(&mut self, class: ElementId) -> &mut ClassData {
        match &mut self.elements[class].kind {
            ElementKind::Class(data) => data,
            _ => unreachable!("core member owner is a class"),
        }
    }

    fn class(&mut self, name: &str, type_parameters: &[&str]) -> ElementId {
        let class = self.elements.push(
            Element::new(name, ElementKind::Class(ClassData::default())).with_enclosing(self.unit),
        );
        for parameter in type_parameters {
            let parameter = self.elements.push(
                Element::new(
                    *parameter,
                    ElementKind::TypeParameter(TypeParameterData::default()),
                )
                .with_enclosing(class),
            );
            self.class_data(class).type_parameters.push(parameter);
        }
        self.unit_data().types.push(class);
        self.namespace.define(name, class);
        class
    }

    fn type_parameter(&self, class: ElementId, index: usize) -> Type {
        self.elements[class]
            .as_class()
            .and_then(|data| data.type_parameters.get(index))
            .map_or(Type::Dynamic, |parameter| Type::TypeParameter(*parameter))
    }

    fn extend(&mut self, class: ElementId, supertype: InterfaceType) {
        self.class_data(class).supertype = Some(supertype);
    }

    fn implement(&mut self, class: ElementId, interface: InterfaceType) {
        self.class_data(class).interfaces.push(interface);
    }

    fn parameters(
        &mut self,
        owner: ElementId,
        parameters: &[(&str, ParameterKind, Type)],
    ) -> Vec<ElementId> {
        parameters
            .iter()
            .map(|(name, kind, ty)| {
                self.elements.push(
                    Element::new(
                        *name,
                        ElementKind::Parameter(ParameterData {
                            kind: *kind,
                            ty: Some(ty.clone()),
                            has_default_value: false,
                        }),
                    )
                    .with_enclosing(owner),
                )
            })
            .collect()
    }

    fn method(
        &mut self,
        class: ElementId,
        name: &str,
        parameters: &[(&str, ParameterKind, Type)],
        return_type: Type,
    ) -> ElementId {
        let is_operator = !name.starts_with(|c: char| c.is_alphabetic() || c == '_');
        let method = self.elements.push(
            Element::new(
                name,
                ElementKind::Method(ExecutableData {
                    return_type: Some(return_type),
                    ..Default::default()
                }),
            )
            .with_enclosing(class)
            .with_flags(if is_operator {
                ElementFlags::OPERATOR
            } else {
                ElementFlags::empty()
            }),
        );
        let parameters = self.parameters(method, parameters);
        if let Some(data) = self.elements[method].as_executable_mut() {
            data.parameters = parameters;
        }
        self.class_data(class).methods.push(method);
        method
    }

    fn constructor(
        &mut self,
        class: ElementId,
        name: &str,
        parameters: &[(&str, ParameterKind, Type)],
    ) -> ElementId {
        let constructor = self.elements.push(
            Element::new(name, ElementKind::Constructor(ExecutableData::default()))
                .with_enclosing(class),
        );
        let parameters = self.parameters(constructor, parameters);
        if let Some(data) = self.elements[constructor].as_executable_mut() {
            data.parameters = parameters;
        }
        self.class_data(class).constructors.push(constructor);
        constructor
    }

    /// Variable plus its synthetic accessors. Returns the variable.
    fn variable(
        &mut self,
        owner: ElementId,
        name: &str,
        ty: Type,
        kind: fn(VariableData) -> ElementKind,
        with_setter: bool,
    ) -> (ElementId, Vec<ElementId>) {
        let flags = if with_setter {
            ElementFlags::empty()
        } else {
            ElementFlags::FINAL
        };
        let variable = self.elements.push(
            Element::new(
                name,
                kind(VariableData {
                    ty: Some(ty.clone()),
                    ..Default::default()
                }),
            )
            .with_enclosing(owner)
            .with_flags(ElementFlags::SYNTHETIC | flags),
        );
        let getter = self.elements.push(
            Element::new(
                name,
                ElementKind::PropertyAccessor(AccessorData {
                    executable: ExecutableData {
                        return_type: Some(ty.clone()),
                        ..Default::default()
                    },
                    is_getter: true,
                    variable: Some(variable),
                }),
            )
            .with_enclosing(owner)
            .with_flags(ElementFlags::SYNTHETIC),
        );
        let mut accessors = vec![getter];
        let mut setter = None;
        if with_setter {
            let id = self.elements.push(
                Element::new(
                    setter_name(name),
                    ElementKind::PropertyAccessor(AccessorData {
                        executable: ExecutableData {
                            return_type: Some(Type::Void),
                            ..Default::default()
                        },
                        is_getter: false,
                        variable: Some(variable),
                    }),
                )
                .with_enclosing(owner)
                .with_flags(ElementFlags::SYNTHETIC),
            );
            let parameters = self.parameters(id, &[("value", ParameterKind::Required, ty)]);
            if let Some(data) = self.elements[id].as_executable_mut() {
                data.parameters = parameters;
            }
            accessors.push(id);
            setter = Some(id);
        }
        if let Some(data) = self.elements[variable].as_variable_mut() {
            data.getter = Some(getter);
            data.setter = setter;
        }
        (variable, accessors)
    }

    /// Read-only property backed by a synthetic field
    fn getter(&mut self, class: ElementId, name: &str, ty: Type) {
        let (field, accessors) = self.variable(class, name, ty, ElementKind::Field, false);
        let data = self.class_data(class);
        data.fields.push(field);
        data.accessors.extend(accessors);
    }

    fn field(&mut self, class: ElementId, name: &str, ty: Type) {
        let (field, accessors) = self.variable(class, name, ty, ElementKind::Field, true);
        let data = self.class_data(class);
        data.fields.push(field);
        data.accessors.extend(accessors);
    }

    fn function(
        &mut self,
        name: &str,
        parameters: &[(&str, ParameterKind, Type)],
        return_type: Type,
    ) -> ElementId {
        let function = self.elements.push(
            Element::new(
                name,
                ElementKind::Function(ExecutableData {
                    return_type: Some(return_type),
                    ..Default::default()
                }),
            )
            .with_enclosing(self.unit),
        );
        let parameters = self.parameters(function, parameters);
        if let Some(data) = self.elements[function].as_executable_mut() {
            data.parameters = parameters;
        }
        self.unit_data().functions.push(function);
        self.namespace.define(name, function);
        function
    }

    fn top_level_constant(&mut self, name: &str, ty: Type) {
        let unit = self.unit;
        let (variable, accessors) =
            self.variable(unit, name, ty, ElementKind::TopLevelVariable, false);
        self.elements[variable].flags |= ElementFlags::CONST;
        self.elements[variable].flags.remove(ElementFlags::SYNTHETIC);
        for accessor in &accessors {
            self.namespace.define(self.elements[*accessor].name.clone(), *accessor);
        }
        let data = self.unit_data();
        data.top_level_variables.push(variable);
        data.accessors.extend(accessors);
    }
}
