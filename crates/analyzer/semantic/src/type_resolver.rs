//! # Type-name resolution
//!
//! First resolution pass. Binds every type annotation to a [`Type`], wires
//! `extends`/`with`/`implements` onto class elements and fills in the
//! declared types of parameters, variables, accessors and return types.
//!
//! The pass runs in two phases so that declarations can refer to each other
//! in any order: [`TypeResolver::resolve_headers`] settles class hierarchies,
//! type parameter bounds and function type aliases; then
//! [`TypeResolver::resolve_members`] handles everything else, bodies
//! included. A type name inside a body is annotated in the resolution tables
//! only; the second pass reads the annotation when it creates the local that
//! needs it.
//!
//! A type name that cannot be resolved is reported and left unannotated.
//! Consumers read a missing type as `dynamic`.

use quill_analyzer_diagnostics::Diagnostic;
use quill_analyzer_syntax::ast::{
    CatchClause, ClassDeclaration, ClassMember, ClassTypeAlias, CompilationUnit,
    ConstructorDeclaration, ConstructorInitializer, Declaration, FormalParameterList, FunctionBody,
    FunctionDeclaration, FunctionTypeAlias, MethodDeclaration, PropertyKind, TypeName,
    TypeParameter, VariableDeclarationList,
};
use quill_analyzer_syntax::visitor::{walk_block, walk_function_body, Visitor};
use quill_analyzer_syntax::NodeId;

use crate::element::{ElementArena, ElementId, ElementKind};
use crate::resolution::{DeclarationRef, UnitResult};
use crate::scope::{LibraryScope, Lookup, ScopeChain};
use crate::types::{InterfaceType, Type};

/// Which clause of a class header a supertype comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SupertypeClause {
    Extends,
    With,
    Implements,
}

pub struct TypeResolver<'a, 's> {
    arena: &'a mut ElementArena,
    unit: ElementId,
    scope: ScopeChain<'s>,
    result: &'a mut UnitResult,
    /// Node owning the diagnostics reported right now
    owner: NodeId,
    analyze_bodies: bool,
}

impl<'a, 's> TypeResolver<'a, 's> {
    pub fn new(
        arena: &'a mut ElementArena,
        library_scope: &'s LibraryScope,
        unit: ElementId,
        result: &'a mut UnitResult,
    ) -> Self {
        let owner = result.unit.id;
        Self {
            arena,
            unit,
            scope: ScopeChain::new(library_scope),
            result,
            owner,
            analyze_bodies: true,
        }
    }

    pub fn with_bodies(mut self, analyze_bodies: bool) -> Self {
        self.analyze_bodies = analyze_bodies;
        self
    }

    /// Class hierarchies, type parameter bounds and function type aliases
    pub fn resolve_headers(&mut self, ast: &CompilationUnit) {
        let _span = tracing::trace_span!("resolve_headers", uri = %self.result.uri).entered();
        for declaration in &ast.declarations {
            self.owner = declaration.id();
            self.header(declaration);
        }
    }

    /// Declared types of members, functions and variables, bodies included
    pub fn resolve_members(&mut self, ast: &CompilationUnit) {
        let _span = tracing::trace_span!("resolve_types", uri = %self.result.uri).entered();
        for declaration in &ast.declarations {
            self.owner = declaration.id();
            self.members(declaration);
        }
    }

    /// Both phases for a single declaration
    pub fn resolve_declaration(&mut self, declaration: DeclarationRef<'_>) {
        match declaration {
            DeclarationRef::TopLevel(declaration) => {
                self.owner = declaration.id();
                self.header(declaration);
                self.members(declaration);
            }
            DeclarationRef::Member { class, member } => {
                let Some(element) = self.element_of(class.id) else {
                    return;
                };
                self.owner = member.id();
                self.push_type_parameters(element);
                self.fields_then_members(element, std::slice::from_ref(member));
                self.scope.pop();
            }
        }
    }

    fn element_of(&self, node: NodeId) -> Option<ElementId> {
        self.arena[self.unit]
            .as_unit()
            .and_then(|unit| unit.declarations.get(&node).copied())
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.result.report(self.owner, diagnostic);
    }

    fn push_type_parameters(&mut self, owner: ElementId) {
        let parameters = self.arena.type_parameters_of(owner).to_vec();
        self.scope.push_type_parameters(self.arena, &parameters);
    }

    // ===== Headers =====

    fn header(&mut self, declaration: &Declaration) {
        match declaration {
            Declaration::Class(class) => self.class_header(class),
            Declaration::ClassTypeAlias(alias) => self.class_alias_header(alias),
            Declaration::FunctionTypeAlias(alias) => self.function_type_alias(alias),
            Declaration::Function(_) | Declaration::Variables(_) => {}
        }
    }

    fn class_header(&mut self, class: &ClassDeclaration) {
        let Some(element) = self.element_of(class.id) else {
            return;
        };
        self.push_type_parameters(element);
        self.bounds(&class.type_parameters);
        let supertype = class
            .extends
            .as_ref()
            .and_then(|extends| self.supertype(extends, SupertypeClause::Extends));
        let mixins = self.supertypes(&class.with, SupertypeClause::With);
        let interfaces = self.supertypes(&class.implements, SupertypeClause::Implements);
        self.scope.pop();
        self.set_hierarchy(element, supertype, mixins, interfaces);
    }

    fn class_alias_header(&mut self, alias: &ClassTypeAlias) {
        let Some(element) = self.element_of(alias.id) else {
            return;
        };
        self.push_type_parameters(element);
        self.bounds(&alias.type_parameters);
        let supertype = self.supertype(&alias.superclass, SupertypeClause::Extends);
        let mixins = self.supertypes(&alias.with, SupertypeClause::With);
        let interfaces = self.supertypes(&alias.implements, SupertypeClause::Implements);
        self.scope.pop();
        self.set_hierarchy(element, supertype, mixins, interfaces);
    }

    fn set_hierarchy(
        &mut self,
        class: ElementId,
        supertype: Option<InterfaceType>,
        mixins: Vec<InterfaceType>,
        interfaces: Vec<InterfaceType>,
    ) {
        let object = self.arena.type_provider().object_type.clone();
        if let Some(data) = self.arena[class].as_class_mut() {
            data.supertype = Some(supertype.unwrap_or(object));
            data.mixins = mixins;
            data.interfaces = interfaces;
        }
    }

    fn supertypes(
        &mut self,
        type_names: &[TypeName],
        clause: SupertypeClause,
    ) -> Vec<InterfaceType> {
        type_names
            .iter()
            .filter_map(|type_name| self.supertype(type_name, clause))
            .collect()
    }

    /// A supertype clause entry, which must denote a class
    fn supertype(
        &mut self,
        type_name: &TypeName,
        clause: SupertypeClause,
    ) -> Option<InterfaceType> {
        match self.resolve_type_name(type_name)? {
            Type::Interface(interface)
                if matches!(self.arena[interface.element].kind, ElementKind::Class(_)) =>
            {
                Some(interface)
            }
            _ => {
                let name = type_name.qualified_name();
                let diagnostic = match clause {
                    SupertypeClause::Extends => {
                        Diagnostic::extends_non_class(&name, type_name.span)
                    }
                    SupertypeClause::With => Diagnostic::mixin_of_non_class(&name, type_name.span),
                    SupertypeClause::Implements => {
                        Diagnostic::implements_non_class(&name, type_name.span)
                    }
                };
                self.report(diagnostic);
                None
            }
        }
    }

    fn bounds(&mut self, type_parameters: &[TypeParameter]) {
        for parameter in type_parameters {
            let Some(bound) = &parameter.bound else {
                continue;
            };
            let bound = self.resolve_type_name(bound);
            if let Some(element) = self.element_of(parameter.id) {
                if let ElementKind::TypeParameter(data) = &mut self.arena[element].kind {
                    data.bound = bound;
                }
            }
        }
    }

    fn function_type_alias(&mut self, alias: &FunctionTypeAlias) {
        let Some(element) = self.element_of(alias.id) else {
            return;
        };
        self.push_type_parameters(element);
        self.bounds(&alias.type_parameters);
        let return_type = alias
            .return_type
            .as_ref()
            .map(|return_type| self.resolve_type_name(return_type).unwrap_or(Type::Dynamic));
        self.parameters(&alias.parameters, None);
        self.scope.pop();
        if let ElementKind::FunctionTypeAlias(data) = &mut self.arena[element].kind {
            data.return_type = return_type;
        }
    }

    // ===== Members =====

    fn members(&mut self, declaration: &Declaration) {
        match declaration {
            Declaration::Class(class) => {
                let Some(element) = self.element_of(class.id) else {
                    return;
                };
                self.push_type_parameters(element);
                self.fields_then_members(element, &class.members);
                self.scope.pop();
            }
            Declaration::Function(function) => self.function(function),
            Declaration::Variables(list) => self.variables(list),
            Declaration::ClassTypeAlias(_) | Declaration::FunctionTypeAlias(_) => {}
        }
    }

    /// Field types first: initializing formals default to them
    fn fields_then_members(&mut self, class: ElementId, members: &[ClassMember]) {
        for member in members {
            if let ClassMember::Field(field) = member {
                self.owner = member.id();
                self.variables(&field.variables);
            }
        }
        for member in members {
            self.owner = member.id();
            match member {
                ClassMember::Field(_) => {}
                ClassMember::Method(method) => self.method(method),
                ClassMember::Constructor(constructor) => self.constructor(class, constructor),
            }
        }
    }

    fn variables(&mut self, list: &VariableDeclarationList) {
        let ty = list
            .type_name
            .as_ref()
            .and_then(|type_name| self.resolve_type_name(type_name));
        for variable in &list.variables {
            if let Some(element) = self.element_of(variable.id) {
                self.set_variable_type(element, ty.clone());
            }
            if let Some(initializer) = &variable.initializer {
                self.visit_expression(initializer);
            }
        }
    }

    /// Declared type of a variable and of the accessors it induced
    fn set_variable_type(&mut self, variable: ElementId, ty: Option<Type>) {
        let Some(data) = self.arena[variable].as_variable_mut() else {
            return;
        };
        data.ty = ty.clone();
        let accessors = [data.getter, data.setter];
        for accessor in accessors.into_iter().flatten() {
            if !self.arena[accessor].is_synthetic() {
                continue;
            }
            let is_getter = self.arena[accessor].is_getter();
            let parameter = self.arena.parameters_of(accessor).first().copied();
            if is_getter {
                if let Some(data) = self.arena[accessor].as_executable_mut() {
                    data.return_type = ty.clone();
                }
            } else if let Some(parameter) = parameter {
                if let ElementKind::Parameter(data) = &mut self.arena[parameter].kind {
                    data.ty = Some(ty.clone().unwrap_or(Type::Dynamic));
                }
            }
        }
    }

    fn function(&mut self, function: &FunctionDeclaration) {
        let Some(element) = self.element_of(function.id) else {
            return;
        };
        let return_type = self.return_type(function.return_type.as_ref(), function.property);
        self.set_return_type(element, return_type.clone());
        self.parameters(&function.function.parameters, None);
        self.type_accessor_variable(element, return_type);
        self.body(&function.function.body);
    }

    fn method(&mut self, method: &MethodDeclaration) {
        let Some(element) = self.element_of(method.id) else {
            return;
        };
        let mut return_type = self.return_type(method.return_type.as_ref(), method.property);
        if method.is_operator && method.name.name == "[]=" && return_type.is_none() {
            return_type = Some(Type::Void);
        }
        self.set_return_type(element, return_type.clone());
        if let Some(parameters) = &method.parameters {
            self.parameters(parameters, None);
        }
        self.type_accessor_variable(element, return_type);
        self.body(&method.body);
    }

    /// Declared return type; setters return `void` unless they say otherwise
    fn return_type(
        &mut self,
        type_name: Option<&TypeName>,
        property: Option<PropertyKind>,
    ) -> Option<Type> {
        match type_name {
            Some(type_name) => Some(self.resolve_type_name(type_name).unwrap_or(Type::Dynamic)),
            None if property == Some(PropertyKind::Set) => Some(Type::Void),
            None => None,
        }
    }

    fn set_return_type(&mut self, executable: ElementId, return_type: Option<Type>) {
        if let Some(data) = self.arena[executable].as_executable_mut() {
            data.return_type = return_type;
        }
    }

    /// An explicit accessor gives the synthetic variable behind it a type:
    /// the getter's return type, or the setter's parameter type
    fn type_accessor_variable(&mut self, accessor: ElementId, return_type: Option<Type>) {
        let Some(data) = self.arena[accessor].as_accessor() else {
            return;
        };
        let Some(variable) = data.variable else {
            return;
        };
        let ty = if data.is_getter {
            return_type
        } else {
            data.executable
                .parameters
                .first()
                .and_then(|parameter| self.arena[*parameter].as_parameter())
                .and_then(|parameter| parameter.ty.clone())
        };
        let is_getter = data.is_getter;
        if !self.arena[variable].is_synthetic() {
            return;
        }
        if let Some(variable) = self.arena[variable].as_variable_mut() {
            if variable.ty.is_none() || is_getter {
                variable.ty = ty;
            }
        }
    }

    fn constructor(&mut self, class: ElementId, constructor: &ConstructorDeclaration) {
        self.parameters(&constructor.parameters, Some(class));
        for initializer in &constructor.initializers {
            match initializer {
                ConstructorInitializer::Field { expression, .. } => {
                    self.visit_expression(expression)
                }
                ConstructorInitializer::Super { arguments, .. }
                | ConstructorInitializer::Redirecting { arguments, .. } => {
                    for argument in arguments {
                        self.visit_expression(argument);
                    }
                }
            }
        }
        self.body(&constructor.body);
    }

    /// Types of the parameter elements the builder created. An untyped
    /// initializing formal takes the type of its field.
    fn parameters(&mut self, parameters: &FormalParameterList, class: Option<ElementId>) {
        for parameter in &parameters.parameters {
            let declared = parameter
                .type_name
                .as_ref()
                .map(|type_name| self.resolve_type_name(type_name).unwrap_or(Type::Dynamic));
            let ty = match (declared, class) {
                (Some(ty), _) => ty,
                (None, Some(class)) if parameter.is_field_formal => self
                    .field_named(class, &parameter.name.name)
                    .map_or(Type::Dynamic, |field| self.arena.declared_type(field)),
                (None, _) => Type::Dynamic,
            };
            if let Some(element) = self.element_of(parameter.id) {
                if let ElementKind::Parameter(data) = &mut self.arena[element].kind {
                    data.ty = Some(ty);
                }
            }
            if let Some(default_value) = &parameter.default_value {
                self.visit_expression(default_value);
            }
        }
    }

    fn field_named(&self, class: ElementId, name: &str) -> Option<ElementId> {
        self.arena[class].as_class().and_then(|data| {
            data.fields
                .iter()
                .copied()
                .find(|field| self.arena[*field].name == name)
        })
    }

    fn body(&mut self, body: &FunctionBody) {
        if self.analyze_bodies {
            walk_function_body(self, body);
        }
    }

    // ===== Type names =====

    /// Resolves `type_name`, annotating it and its arguments. `None` when the
    /// name does not denote a type.
    pub fn resolve_type_name(&mut self, type_name: &TypeName) -> Option<Type> {
        let name = type_name.name.name.as_str();
        if type_name.prefix.is_none() {
            let builtin = match name {
                "dynamic" => Some(Type::Dynamic),
                "void" => Some(Type::Void),
                _ => None,
            };
            if let Some(ty) = builtin {
                self.result
                    .resolution
                    .record_static_type(type_name.id, ty.clone());
                return Some(ty);
            }
        }
        let arguments: Vec<Option<Type>> = type_name
            .arguments
            .iter()
            .map(|argument| self.resolve_type_name(argument))
            .collect();
        let lookup = match &type_name.prefix {
            Some(prefix) => {
                let library_scope = self.scope.library_scope();
                if let Lookup::Found(element) = library_scope.lookup(&prefix.name) {
                    if matches!(self.arena[element].kind, ElementKind::Prefix(_)) {
                        self.result
                            .resolution
                            .record_static_element(prefix.id, element);
                    }
                }
                library_scope.lookup_prefixed(&prefix.name, name)
            }
            None => self.scope.lookup(name),
        };
        let element = match lookup {
            Lookup::Found(element) => element,
            Lookup::NotFound => {
                tracing::debug!(name = %type_name.qualified_name(), "unresolved type name");
                self.report(Diagnostic::undefined_class(
                    &type_name.qualified_name(),
                    type_name.span,
                ));
                return None;
            }
            Lookup::Ambiguous(_) => {
                self.report(Diagnostic::ambiguous_import(name, type_name.span));
                return None;
            }
        };
        self.result
            .resolution
            .record_static_element(type_name.name.id, element);
        let ty = match &self.arena[element].kind {
            ElementKind::Class(data) => {
                let expected = data.type_parameters.len();
                let arguments = self.type_arguments(type_name, expected, arguments);
                Type::Interface(InterfaceType::new(element, arguments))
            }
            ElementKind::FunctionTypeAlias(data) => {
                let parameters = data.type_parameters.clone();
                let arguments = self.type_arguments(type_name, parameters.len(), arguments);
                Type::Function(
                    self.arena
                        .function_type_of(element)
                        .substitute(&parameters, &arguments),
                )
            }
            ElementKind::TypeParameter(_) => Type::TypeParameter(element),
            _ => {
                self.report(Diagnostic::not_a_type(&type_name.qualified_name(), type_name.span));
                return None;
            }
        };
        self.result
            .resolution
            .record_static_type(type_name.id, ty.clone());
        Some(ty)
    }

    /// One argument per type parameter; missing or miscounted arguments
    /// become `dynamic`
    fn type_arguments(
        &mut self,
        type_name: &TypeName,
        expected: usize,
        arguments: Vec<Option<Type>>,
    ) -> Vec<Type> {
        if arguments.len() == expected {
            return arguments
                .into_iter()
                .map(|argument| argument.unwrap_or(Type::Dynamic))
                .collect();
        }
        if !arguments.is_empty() {
            self.report(Diagnostic::wrong_number_of_type_arguments(
                &type_name.qualified_name(),
                expected,
                arguments.len(),
                type_name.span,
            ));
        }
        vec![Type::Dynamic; expected]
    }
}

impl<'ast> Visitor<'ast> for TypeResolver<'_, '_> {
    fn visit_type_name(&mut self, type_name: &'ast TypeName) {
        self.resolve_type_name(type_name);
    }

    /// The exception parameter is typed by its `on` clause, `Object` without
    /// one; the stack trace parameter is always a `StackTrace`
    fn visit_catch_clause(&mut self, clause: &'ast CatchClause) {
        let exception_type = match &clause.exception_type {
            Some(type_name) => self.resolve_type_name(type_name).unwrap_or(Type::Dynamic),
            None => Type::Interface(self.arena.type_provider().object_type.clone()),
        };
        if let Some(parameter) = &clause.exception_parameter {
            self.result
                .resolution
                .record_static_type(parameter.id, exception_type);
        }
        if let Some(parameter) = &clause.stack_trace_parameter {
            let stack_trace = Type::Interface(self.arena.type_provider().stack_trace_type.clone());
            self.result
                .resolution
                .record_static_type(parameter.id, stack_trace);
        }
        walk_block(self, &clause.body);
    }
}
