//! Builds the elements a compilation unit declares outside of bodies: types,
//! members, top-level functions and variables, parameters and the accessors
//! variables induce. Locals, labels and closures are created later by the
//! resolver, which walks the bodies.

use quill_analyzer_diagnostics::Diagnostic;
use quill_analyzer_syntax::ast::{
    ClassDeclaration, ClassMember, ClassTypeAlias, CompilationUnit, ConstructorDeclaration,
    Declaration, FieldDeclaration, FormalParameterList, FunctionDeclaration, FunctionTypeAlias,
    MethodDeclaration, ParameterKind, PropertyKind, Span, TypeParameter, VariableDeclarationList,
};
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use super::{
    setter_name, AccessorData, ClassData, Element, ElementArena, ElementFlags, ElementId,
    ElementKind, ExecutableData, FunctionTypeAliasData, ParameterData, TypeParameterData,
    UnitData, VariableData,
};
use crate::declaration_matcher::{
    class_alias_signature, class_signature, constructor_signature, function_signature,
    function_type_alias_signature, method_element_name, method_signature, variable_signature,
};
use crate::types::Type;

/// Fills one compilation-unit element from its syntax tree.
pub struct ElementBuilder<'a> {
    arena: &'a mut ElementArena,
    unit: ElementId,
    data: UnitData,
    diagnostics: Vec<Diagnostic>,
}

/// Names already taken inside one class body
#[derive(Default)]
struct MemberNames {
    members: FxHashSet<SmolStr>,
    constructors: FxHashSet<SmolStr>,
}

impl<'a> ElementBuilder<'a> {
    pub fn new(arena: &'a mut ElementArena, unit: ElementId) -> Self {
        Self {
            arena,
            unit,
            data: UnitData::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Creates the elements of `ast` and returns the duplicate-member
    /// diagnostics found on the way
    pub fn build(mut self, ast: &CompilationUnit) -> Vec<Diagnostic> {
        for declaration in &ast.declarations {
            self.declaration(declaration);
        }
        let data = std::mem::take(&mut self.data);
        if let Some(unit) = self.arena[self.unit].as_unit_mut() {
            unit.types.extend(data.types);
            unit.function_type_aliases.extend(data.function_type_aliases);
            unit.functions.extend(data.functions);
            unit.top_level_variables.extend(data.top_level_variables);
            unit.accessors.extend(data.accessors);
            unit.declarations.extend(data.declarations);
        }
        self.diagnostics
    }

    fn alloc(&mut self, element: Element) -> ElementId {
        let node = element.node;
        let id = self.arena.alloc(element);
        if let Some(node) = node {
            self.data.declarations.insert(node, id);
        }
        id
    }

    fn declaration(&mut self, declaration: &Declaration) {
        match declaration {
            Declaration::Class(class) => {
                let class = self.class(class);
                self.data.types.push(class);
            }
            Declaration::ClassTypeAlias(alias) => {
                let alias = self.class_alias(alias);
                self.data.types.push(alias);
            }
            Declaration::FunctionTypeAlias(alias) => {
                let alias = self.function_type_alias(alias);
                self.data.function_type_aliases.push(alias);
            }
            Declaration::Function(function) => self.top_level_function(function),
            Declaration::Variables(list) => self.top_level_variables(list),
        }
    }

    // ===== Types =====

    fn class(&mut self, declaration: &ClassDeclaration) -> ElementId {
        let flags = if declaration.is_abstract {
            ElementFlags::ABSTRACT
        } else {
            ElementFlags::empty()
        };
        let class = self.alloc(
            Element::new(
                declaration.name.name.clone(),
                ElementKind::Class(ClassData::default()),
            )
            .with_enclosing(self.unit)
            .with_node(declaration.id, declaration.name.span.start)
            .with_flags(flags)
            .with_signature(class_signature(declaration)),
        );
        let mut data = ClassData {
            type_parameters: self.type_parameters(class, &declaration.type_parameters),
            ..Default::default()
        };
        let mut names = MemberNames::default();
        for member in &declaration.members {
            match member {
                ClassMember::Field(field) => self.field(class, field, &mut data, &mut names),
                ClassMember::Method(method) => self.method(class, method, &mut data, &mut names),
                ClassMember::Constructor(constructor) => {
                    let constructor = self.constructor(class, declaration, constructor, &mut names);
                    data.constructors.push(constructor);
                }
            }
        }
        if data.constructors.is_empty() {
            data.constructors.push(self.default_constructor(class));
        }
        self.arena[class].kind = ElementKind::Class(data);
        class
    }

    fn class_alias(&mut self, alias: &ClassTypeAlias) -> ElementId {
        let flags = if alias.is_abstract {
            ElementFlags::ABSTRACT
        } else {
            ElementFlags::empty()
        };
        let class = self.alloc(
            Element::new(alias.name.name.clone(), ElementKind::Class(ClassData::default()))
                .with_enclosing(self.unit)
                .with_node(alias.id, alias.name.span.start)
                .with_flags(flags)
                .with_signature(class_alias_signature(alias)),
        );
        let type_parameters = self.type_parameters(class, &alias.type_parameters);
        let constructor = self.default_constructor(class);
        self.arena[class].kind = ElementKind::Class(ClassData {
            type_parameters,
            constructors: vec![constructor],
            is_mixin_application: true,
            ..Default::default()
        });
        class
    }

    fn function_type_alias(&mut self, alias: &FunctionTypeAlias) -> ElementId {
        let id = self.alloc(
            Element::new(
                alias.name.name.clone(),
                ElementKind::FunctionTypeAlias(FunctionTypeAliasData::default()),
            )
            .with_enclosing(self.unit)
            .with_node(alias.id, alias.name.span.start)
            .with_signature(function_type_alias_signature(alias)),
        );
        let type_parameters = self.type_parameters(id, &alias.type_parameters);
        let parameters = self.parameters(id, &alias.parameters);
        self.arena[id].kind = ElementKind::FunctionTypeAlias(FunctionTypeAliasData {
            type_parameters,
            parameters,
            return_type: None,
        });
        id
    }

    fn type_parameters(
        &mut self,
        owner: ElementId,
        parameters: &[TypeParameter],
    ) -> Vec<ElementId> {
        parameters
            .iter()
            .map(|parameter| {
                self.alloc(
                    Element::new(
                        parameter.name.name.clone(),
                        ElementKind::TypeParameter(TypeParameterData::default()),
                    )
                    .with_enclosing(owner)
                    .with_node(parameter.id, parameter.name.span.start),
                )
            })
            .collect()
    }

    fn parameters(&mut self, owner: ElementId, parameters: &FormalParameterList) -> Vec<ElementId> {
        parameters
            .parameters
            .iter()
            .map(|parameter| {
                let flags = if parameter.is_field_formal {
                    ElementFlags::FIELD_FORMAL
                } else {
                    ElementFlags::empty()
                };
                self.alloc(
                    Element::new(
                        parameter.name.name.clone(),
                        ElementKind::Parameter(ParameterData {
                            kind: parameter.kind,
                            ty: None,
                            has_default_value: parameter.default_value.is_some(),
                        }),
                    )
                    .with_enclosing(owner)
                    .with_node(parameter.id, parameter.name.span.start)
                    .with_flags(flags),
                )
            })
            .collect()
    }

    fn set_parameters(&mut self, executable: ElementId, parameters: Vec<ElementId>) {
        if let Some(data) = self.arena[executable].as_executable_mut() {
            data.parameters = parameters;
        }
    }

    // ===== Class members =====

    fn claim(&mut self, taken: &mut FxHashSet<SmolStr>, name: &SmolStr, display: &str, span: Span) {
        if !taken.insert(name.clone()) {
            self.diagnostics
                .push(Diagnostic::duplicate_definition(display, span));
        }
    }

    fn field(
        &mut self,
        class: ElementId,
        field: &FieldDeclaration,
        data: &mut ClassData,
        names: &mut MemberNames,
    ) {
        let list = &field.variables;
        let mut flags = variable_flags(list);
        if field.is_static {
            flags |= ElementFlags::STATIC;
        }
        let signature = variable_signature(list, field.is_static);
        for variable in &list.variables {
            let mut flags = flags;
            if variable.initializer.is_some() {
                flags |= ElementFlags::HAS_INITIALIZER;
            }
            let element = self.alloc(
                Element::new(
                    variable.name.name.clone(),
                    ElementKind::Field(VariableData::default()),
                )
                .with_enclosing(class)
                .with_node(variable.id, variable.name.span.start)
                .with_flags(flags)
                .with_signature(signature.clone()),
            );
            let has_setter = !list.is_final && !list.is_const;
            let accessors = self.induced_accessors(class, element, field.is_static, has_setter);
            data.fields.push(element);
            data.accessors.extend(accessors);
            let name = &variable.name.name;
            self.claim(&mut names.members, name, name, variable.name.span);
            if has_setter {
                self.claim(&mut names.members, &setter_name(name), name, variable.name.span);
            }
        }
    }

    fn method(
        &mut self,
        class: ElementId,
        method: &MethodDeclaration,
        data: &mut ClassData,
        names: &mut MemberNames,
    ) {
        let mut flags = ElementFlags::empty();
        if method.is_static {
            flags |= ElementFlags::STATIC;
        }
        if method.is_abstract {
            flags |= ElementFlags::ABSTRACT;
        }
        let signature = method_signature(method);
        match method.property {
            Some(property) => {
                let is_getter = property == PropertyKind::Get;
                let name = if is_getter {
                    method.name.name.clone()
                } else {
                    setter_name(&method.name.name)
                };
                let field = self.property_variable(
                    &data.fields,
                    class,
                    &method.name.name,
                    method.is_static,
                    ElementKind::Field,
                );
                if !data.fields.contains(&field) {
                    data.fields.push(field);
                }
                let accessor = self.alloc(
                    Element::new(
                        name.clone(),
                        ElementKind::PropertyAccessor(AccessorData {
                            executable: ExecutableData::default(),
                            is_getter,
                            variable: Some(field),
                        }),
                    )
                    .with_enclosing(class)
                    .with_node(method.id, method.name.span.start)
                    .with_flags(flags)
                    .with_signature(signature),
                );
                if let Some(parameters) = &method.parameters {
                    let parameters = self.parameters(accessor, parameters);
                    self.set_parameters(accessor, parameters);
                }
                self.link_accessor(field, accessor, is_getter);
                data.accessors.push(accessor);
                self.claim(&mut names.members, &name, &method.name.name, method.name.span);
            }
            None => {
                if method.is_operator {
                    flags |= ElementFlags::OPERATOR;
                }
                let name = method_element_name(method);
                let element = self.alloc(
                    Element::new(name.clone(), ElementKind::Method(ExecutableData::default()))
                        .with_enclosing(class)
                        .with_node(method.id, method.name.span.start)
                        .with_flags(flags)
                        .with_signature(signature),
                );
                if let Some(parameters) = &method.parameters {
                    let parameters = self.parameters(element, parameters);
                    self.set_parameters(element, parameters);
                }
                data.methods.push(element);
                self.claim(&mut names.members, &name, &method.name.name, method.name.span);
            }
        }
    }

    fn constructor(
        &mut self,
        class: ElementId,
        declaration: &ClassDeclaration,
        constructor: &ConstructorDeclaration,
        names: &mut MemberNames,
    ) -> ElementId {
        let mut flags = ElementFlags::empty();
        if constructor.is_factory {
            flags |= ElementFlags::FACTORY;
        }
        if constructor.is_const {
            flags |= ElementFlags::CONST;
        }
        let (name, offset, span) = match &constructor.name {
            Some(name) => (name.name.clone(), name.span.start, name.span),
            None => (
                SmolStr::default(),
                constructor.return_type.span.start,
                constructor.return_type.span,
            ),
        };
        let element = self.alloc(
            Element::new(name.clone(), ElementKind::Constructor(ExecutableData::default()))
                .with_enclosing(class)
                .with_node(constructor.id, offset)
                .with_flags(flags)
                .with_signature(constructor_signature(constructor)),
        );
        let parameters = self.parameters(element, &constructor.parameters);
        self.set_parameters(element, parameters);
        let display = if name.is_empty() {
            declaration.name.name.to_string()
        } else {
            format!("{}.{}", declaration.name.name, name)
        };
        self.claim(&mut names.constructors, &name, &display, span);
        element
    }

    fn default_constructor(&mut self, class: ElementId) -> ElementId {
        let offset = self.arena[class].offset;
        let mut constructor = Element::new("", ElementKind::Constructor(ExecutableData::default()))
            .with_enclosing(class)
            .with_flags(ElementFlags::SYNTHETIC);
        constructor.offset = offset;
        self.alloc(constructor)
    }

    // ===== Top-level functions and variables =====

    fn top_level_function(&mut self, function: &FunctionDeclaration) {
        let signature = function_signature(function);
        let Some(property) = function.property else {
            let element = self.alloc(
                Element::new(
                    function.name.name.clone(),
                    ElementKind::Function(ExecutableData::default()),
                )
                .with_enclosing(self.unit)
                .with_node(function.id, function.name.span.start)
                .with_signature(signature),
            );
            let parameters = self.parameters(element, &function.function.parameters);
            self.set_parameters(element, parameters);
            self.data.functions.push(element);
            return;
        };
        let is_getter = property == PropertyKind::Get;
        let existing = self.data.top_level_variables.clone();
        let variable = self.property_variable(
            &existing,
            self.unit,
            &function.name.name,
            false,
            ElementKind::TopLevelVariable,
        );
        if !existing.contains(&variable) {
            self.data.top_level_variables.push(variable);
        }
        let name = if is_getter {
            function.name.name.clone()
        } else {
            setter_name(&function.name.name)
        };
        let accessor = self.alloc(
            Element::new(
                name,
                ElementKind::PropertyAccessor(AccessorData {
                    executable: ExecutableData::default(),
                    is_getter,
                    variable: Some(variable),
                }),
            )
            .with_enclosing(self.unit)
            .with_node(function.id, function.name.span.start)
            .with_signature(signature),
        );
        let parameters = self.parameters(accessor, &function.function.parameters);
        self.set_parameters(accessor, parameters);
        self.link_accessor(variable, accessor, is_getter);
        self.data.accessors.push(accessor);
    }

    fn top_level_variables(&mut self, list: &VariableDeclarationList) {
        let signature = variable_signature(list, false);
        for variable in &list.variables {
            let mut flags = variable_flags(list);
            if variable.initializer.is_some() {
                flags |= ElementFlags::HAS_INITIALIZER;
            }
            let element = self.alloc(
                Element::new(
                    variable.name.name.clone(),
                    ElementKind::TopLevelVariable(VariableData::default()),
                )
                .with_enclosing(self.unit)
                .with_node(variable.id, variable.name.span.start)
                .with_flags(flags)
                .with_signature(signature.clone()),
            );
            let has_setter = !list.is_final && !list.is_const;
            let accessors = self.induced_accessors(self.unit, element, false, has_setter);
            self.data.top_level_variables.push(element);
            self.data.accessors.extend(accessors);
        }
    }

    // ===== Variables and accessors =====

    /// Synthetic getter (and setter) of a declared variable
    fn induced_accessors(
        &mut self,
        owner: ElementId,
        variable: ElementId,
        is_static: bool,
        has_setter: bool,
    ) -> Vec<ElementId> {
        let name = self.arena[variable].name.clone();
        let offset = self.arena[variable].offset;
        let mut flags = ElementFlags::SYNTHETIC;
        if is_static {
            flags |= ElementFlags::STATIC;
        }
        let accessor = |name: SmolStr, is_getter: bool| {
            let mut element = Element::new(
                name,
                ElementKind::PropertyAccessor(AccessorData {
                    executable: ExecutableData {
                        return_type: (!is_getter).then_some(Type::Void),
                        ..Default::default()
                    },
                    is_getter,
                    variable: Some(variable),
                }),
            )
            .with_enclosing(owner)
            .with_flags(flags);
            element.offset = offset;
            element
        };
        let getter = self.alloc(accessor(name.clone(), true));
        self.link_accessor(variable, getter, true);
        let mut accessors = vec![getter];
        if has_setter {
            let setter = self.alloc(accessor(setter_name(&name), false));
            let mut value = Element::new(
                "value",
                ElementKind::Parameter(ParameterData {
                    kind: ParameterKind::Required,
                    ty: None,
                    has_default_value: false,
                }),
            )
            .with_enclosing(setter)
            .with_flags(ElementFlags::SYNTHETIC);
            value.offset = offset;
            let value = self.alloc(value);
            self.set_parameters(setter, vec![value]);
            self.link_accessor(variable, setter, false);
            accessors.push(setter);
        }
        accessors
    }

    /// The variable an explicit accessor reads or writes: the synthetic one a
    /// sibling accessor already induced, or a fresh one
    fn property_variable(
        &mut self,
        candidates: &[ElementId],
        owner: ElementId,
        name: &SmolStr,
        is_static: bool,
        kind: fn(VariableData) -> ElementKind,
    ) -> ElementId {
        let existing = candidates.iter().copied().find(|candidate| {
            let candidate = &self.arena[*candidate];
            candidate.is_synthetic() && candidate.name == *name
        });
        if let Some(existing) = existing {
            return existing;
        }
        let mut flags = ElementFlags::SYNTHETIC;
        if is_static {
            flags |= ElementFlags::STATIC;
        }
        self.alloc(
            Element::new(name.clone(), kind(VariableData::default()))
                .with_enclosing(owner)
                .with_flags(flags),
        )
    }

    fn link_accessor(&mut self, variable: ElementId, accessor: ElementId, is_getter: bool) {
        if let Some(data) = self.arena[variable].as_variable_mut() {
            if is_getter {
                data.getter = Some(accessor);
            } else {
                data.setter = Some(accessor);
            }
        }
    }
}

fn variable_flags(list: &VariableDeclarationList) -> ElementFlags {
    let mut flags = ElementFlags::empty();
    if list.is_final {
        flags |= ElementFlags::FINAL;
    }
    if list.is_const {
        flags |= ElementFlags::CONST;
    }
    flags
}
