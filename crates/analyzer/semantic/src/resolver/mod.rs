//! # Element and type resolution
//!
//! Second resolution pass. A single walk per compilation unit binds every
//! name, operator, invocation, constructor reference, directive and label to
//! its element ([`element_resolver`]) and gives every expression a static
//! type, plus a propagated type where flow narrowing knows more
//! ([`static_type_analyzer`]). Children are always resolved before their
//! parent, so a parent reads its operands' annotations from the resolution
//! tables.
//!
//! Elements for declarations inside bodies (locals, local functions,
//! closures, labels, loop and catch variables) are created here. When the
//! unit already maps the declaring node to an element, that element is
//! reused, which is what lets an incremental re-resolution reproduce the
//! annotations of a full one.

mod element_resolver;
mod static_type_analyzer;

use quill_analyzer_diagnostics::Diagnostic;
use quill_analyzer_syntax::ast::{
    Block, ClassMember, CompilationUnit, ConstructorDeclaration, ConstructorInitializer,
    Declaration, Expression, ExpressionKind, FormalParameterList, FunctionBody,
    FunctionDeclaration, FunctionExpression, Identifier, PostfixOperator, PrefixOperator,
    Statement, SwitchMember, VariableDeclarationList,
};
use quill_analyzer_syntax::visitor::{walk_expression, Visitor};
use quill_analyzer_syntax::NodeId;
use smol_str::SmolStr;

use crate::declaration_matcher::{
    exception_parameter_signature, function_signature, label_signature, loop_variable_signature,
    stack_trace_parameter_signature, variable_signature,
};
use crate::element::{
    Element, ElementArena, ElementFlags, ElementId, ElementKind, ExecutableData, LabelData,
    ParameterData, UnitData, VariableData,
};
use crate::inheritance::InheritanceManager;
use crate::options::AnalysisOptions;
use crate::resolution::{DeclarationRef, UnitResult};
use crate::scope::{LabelScope, LibraryScope, ScopeChain, ScopeKind};
use crate::type_override::TypeOverrideManager;
use crate::types::{InterfaceType, Type, TypeSystem};

/// Where the walk currently is
#[derive(Debug, Clone, Default)]
struct Context {
    class: Option<ElementId>,
    /// Type of `this`; `None` outside instance members
    this_type: Option<InterfaceType>,
    /// Innermost function, method or constructor
    executable: Option<ElementId>,
    /// Variable whose initializer is being resolved
    variable: Option<ElementId>,
}

/// Executable list a body-level element is recorded in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocalList {
    Variables,
    Functions,
    Labels,
}

pub struct Resolver<'a, 's> {
    arena: &'a mut ElementArena,
    inheritance: &'a mut InheritanceManager,
    result: &'a mut UnitResult,
    unit: ElementId,
    library: ElementId,
    options: AnalysisOptions,
    scope: ScopeChain<'s>,
    labels: LabelScope,
    overrides: TypeOverrideManager,
    /// Node owning the diagnostics reported right now
    owner: NodeId,
    context: Context,
}

impl<'a, 's> Resolver<'a, 's> {
    pub fn new(
        arena: &'a mut ElementArena,
        inheritance: &'a mut InheritanceManager,
        library_scope: &'s LibraryScope,
        unit: ElementId,
        result: &'a mut UnitResult,
    ) -> Self {
        let owner = result.unit.id;
        Self {
            arena,
            inheritance,
            result,
            unit,
            library: library_scope.library(),
            options: AnalysisOptions::default(),
            scope: ScopeChain::new(library_scope),
            labels: LabelScope::default(),
            overrides: TypeOverrideManager::new(),
            owner,
            context: Context::default(),
        }
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    pub fn resolve_unit(&mut self, ast: &CompilationUnit) {
        let _span = tracing::trace_span!("resolve_elements", uri = %self.result.uri).entered();
        for directive in &ast.directives {
            self.owner = directive.id();
            self.directive(directive);
        }
        for declaration in &ast.declarations {
            self.owner = declaration.id();
            self.declaration(declaration);
        }
    }

    /// Resolves one top-level declaration or class member in the scope it
    /// is declared in
    pub fn resolve_declaration(&mut self, declaration: DeclarationRef<'_>) {
        match declaration {
            DeclarationRef::TopLevel(declaration) => {
                self.owner = declaration.id();
                self.declaration(declaration);
            }
            DeclarationRef::Member { class, member } => {
                let Some(element) = self.element_of(class.id) else {
                    return;
                };
                self.in_class(element, |this| {
                    this.owner = member.id();
                    this.member(element, member);
                });
            }
        }
    }

    // ===== Test access =====

    #[cfg(test)]
    pub(crate) fn scope_depth(&self) -> usize {
        self.scope.depth()
    }

    #[cfg(test)]
    pub(crate) fn override_depth(&self) -> usize {
        self.overrides.depth()
    }

    // ===== Shared helpers =====

    fn unit_data(&self) -> Option<&UnitData> {
        self.arena[self.unit].as_unit()
    }

    fn element_of(&self, node: NodeId) -> Option<ElementId> {
        self.unit_data()
            .and_then(|unit| unit.declarations.get(&node).copied())
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.result.report(self.owner, diagnostic);
    }

    fn type_system(&self) -> TypeSystem<'_> {
        TypeSystem::new(self.arena)
    }

    /// Static type recorded for a type annotation by the type-name pass
    fn annotated_type(&self, node: NodeId) -> Option<Type> {
        self.result.resolution.static_type(node).cloned()
    }

    /// Binds a declaring identifier to the element it declares
    fn record_declared(&mut self, name: &Identifier, element: ElementId) {
        self.result
            .resolution
            .record_static_element(name.id, element);
    }

    fn in_class<R>(&mut self, class: ElementId, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = std::mem::take(&mut self.context);
        self.context.class = Some(class);
        self.context.this_type = Some(self.arena.this_type(class));
        self.scope.push_class(self.arena, class);
        let parameters = self.arena.type_parameters_of(class).to_vec();
        self.scope.push_type_parameters(self.arena, &parameters);
        let result = f(self);
        self.scope.pop();
        self.scope.pop();
        self.context = saved;
        result
    }

    // ===== Declarations =====

    fn declaration(&mut self, declaration: &Declaration) {
        match declaration {
            Declaration::Class(class) => {
                let Some(element) = self.element_of(class.id) else {
                    return;
                };
                self.record_declared(&class.name, element);
                self.in_class(element, |this| {
                    for member in &class.members {
                        this.owner = member.id();
                        this.member(element, member);
                    }
                });
            }
            Declaration::ClassTypeAlias(alias) => {
                if let Some(element) = self.element_of(alias.id) {
                    self.record_declared(&alias.name, element);
                }
            }
            Declaration::FunctionTypeAlias(alias) => {
                if let Some(element) = self.element_of(alias.id) {
                    self.record_declared(&alias.name, element);
                }
                for parameter in &alias.parameters.parameters {
                    if let Some(element) = self.element_of(parameter.id) {
                        self.record_declared(&parameter.name, element);
                    }
                }
            }
            Declaration::Function(function) => {
                let Some(element) = self.element_of(function.id) else {
                    return;
                };
                self.record_declared(&function.name, element);
                self.executable(element, Some(&function.function.parameters), false, |this| {
                    this.function_body(&function.function.body);
                });
            }
            Declaration::Variables(list) => self.variable_initializers(list, false),
        }
    }

    fn member(&mut self, class: ElementId, member: &ClassMember) {
        match member {
            ClassMember::Field(field) => {
                self.variable_initializers(&field.variables, field.is_static)
            }
            ClassMember::Method(method) => {
                let Some(element) = self.element_of(method.id) else {
                    return;
                };
                self.record_declared(&method.name, element);
                self.executable(element, method.parameters.as_ref(), method.is_static, |this| {
                    this.function_body(&method.body);
                });
            }
            ClassMember::Constructor(constructor) => {
                let Some(element) = self.element_of(constructor.id) else {
                    return;
                };
                self.result
                    .resolution
                    .record_static_element(constructor.return_type.id, class);
                if let Some(name) = &constructor.name {
                    self.record_declared(name, element);
                }
                self.executable(
                    element,
                    Some(&constructor.parameters),
                    constructor.is_factory,
                    |this| {
                        this.constructor_initializers(class, constructor);
                        this.function_body(&constructor.body);
                    },
                );
            }
        }
    }

    /// Walks an executable: parameters in a function frame, labels fenced
    /// off from the enclosing function, narrowings in a fresh frame
    fn executable(
        &mut self,
        element: ElementId,
        parameters: Option<&FormalParameterList>,
        is_static: bool,
        body: impl FnOnce(&mut Self),
    ) {
        if let Some(parameters) = parameters {
            for parameter in &parameters.parameters {
                if let Some(default_value) = &parameter.default_value {
                    self.expression(default_value);
                }
            }
        }
        let saved = self.context.clone();
        self.context.executable = Some(element);
        self.context.variable = None;
        if is_static {
            self.context.this_type = None;
        }
        self.scope.push(ScopeKind::Function(element));
        for parameter in parameters.iter().flat_map(|list| &list.parameters) {
            let Some(parameter_element) = self.element_of(parameter.id) else {
                continue;
            };
            self.scope.define(parameter.name.name.clone(), parameter_element);
            let field = if parameter.is_field_formal {
                self.context
                    .class
                    .and_then(|class| self.field_named(class, &parameter.name.name))
            } else {
                None
            };
            self.record_declared(&parameter.name, field.unwrap_or(parameter_element));
        }
        let mark = self.labels.mark();
        self.labels.enter_function();
        self.overrides.enter_scope();
        body(self);
        self.overrides.exit_scope();
        self.labels.truncate(mark);
        self.scope.pop();
        self.context = saved;
    }

    fn function_body(&mut self, body: &FunctionBody) {
        if !self.options.analyze_function_bodies {
            return;
        }
        match body {
            FunctionBody::Empty => {}
            FunctionBody::Block(block) => self.block(block),
            FunctionBody::Expression(expression) => self.expression(expression),
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

    fn constructor_initializers(&mut self, class: ElementId, constructor: &ConstructorDeclaration) {
        let mut invokes_constructor = false;
        for initializer in &constructor.initializers {
            match initializer {
                ConstructorInitializer::Field {
                    field, expression, ..
                } => {
                    self.expression(expression);
                    match self.field_named(class, &field.name) {
                        Some(element) => self.record_declared(field, element),
                        None => {
                            self.report(Diagnostic::undefined_identifier(&field.name, field.span))
                        }
                    }
                }
                ConstructorInitializer::Super {
                    id,
                    constructor_name,
                    arguments,
                    span,
                } => {
                    invokes_constructor = true;
                    let superclass = self.superclass_of(class);
                    let target =
                        superclass.map(|superclass| (superclass, constructor_name.as_ref()));
                    let element = self.constructor_invocation(*id, target, *span);
                    self.arguments(arguments, element);
                }
                ConstructorInitializer::Redirecting {
                    id,
                    constructor_name,
                    arguments,
                    span,
                } => {
                    invokes_constructor = true;
                    let target = Some((class, constructor_name.as_ref()));
                    let element = self.constructor_invocation(*id, target, *span);
                    self.arguments(arguments, element);
                }
            }
        }
        if !invokes_constructor && !constructor.is_factory {
            // Implicit `super()`, recorded on the constructor itself
            let implicit = self
                .superclass_of(class)
                .and_then(|superclass| self.constructor_named(superclass, ""));
            if let Some(implicit) = implicit {
                self.result
                    .resolution
                    .record_static_element(constructor.id, implicit);
            }
        }
    }

    fn superclass_of(&self, class: ElementId) -> Option<ElementId> {
        self.arena[class]
            .as_class()
            .and_then(|data| data.supertype.as_ref())
            .map(|supertype| supertype.element)
    }

    fn variable_initializers(&mut self, list: &VariableDeclarationList, is_static: bool) {
        for variable in &list.variables {
            let element = self.element_of(variable.id);
            if let Some(element) = element {
                self.record_declared(&variable.name, element);
            }
            let Some(initializer) = &variable.initializer else {
                continue;
            };
            let saved = self.context.clone();
            self.context.executable = None;
            self.context.variable = element;
            if is_static {
                self.context.this_type = None;
            }
            self.overrides.enter_scope();
            self.expression(initializer);
            self.overrides.exit_scope();
            self.context = saved;
        }
    }

    // ===== Body-level elements =====

    /// The element declared by `node`: the one the unit already maps it to,
    /// refreshed, or a new one
    fn declare(&mut self, node: NodeId, mut element: Element) -> ElementId {
        if let Some(existing) = self.element_of(node) {
            if !self.arena.is_frozen(existing) {
                self.arena[existing] = element;
                return existing;
            }
        }
        element.node = Some(node);
        let id = self.arena.alloc(element);
        if let Some(unit) = self.arena[self.unit].as_unit_mut() {
            unit.declarations.insert(node, id);
        }
        id
    }

    /// Declares a local, local function, closure or label and lists it on
    /// the enclosing executable
    fn declare_local(
        &mut self,
        node: NodeId,
        name: SmolStr,
        offset: usize,
        kind: ElementKind,
        flags: ElementFlags,
        signature: String,
        list: LocalList,
    ) -> ElementId {
        let enclosing = self
            .context
            .executable
            .or(self.context.variable)
            .unwrap_or(self.unit);
        let element = self.declare(
            node,
            Element::new(name, kind)
                .with_enclosing(enclosing)
                .with_node(node, offset)
                .with_flags(flags)
                .with_signature(signature),
        );
        if let Some(executable) = self.context.executable {
            if let Some(data) = self.arena[executable].as_executable_mut() {
                let list = match list {
                    LocalList::Variables => &mut data.local_variables,
                    LocalList::Functions => &mut data.functions,
                    LocalList::Labels => &mut data.labels,
                };
                if !list.contains(&element) {
                    list.push(element);
                }
            }
        }
        element
    }

    /// Parameter elements of a local function or closure
    fn declare_parameters(&mut self, function: ElementId, parameters: &FormalParameterList) {
        let mut elements = Vec::with_capacity(parameters.parameters.len());
        for parameter in &parameters.parameters {
            let ty = parameter
                .type_name
                .as_ref()
                .and_then(|type_name| self.annotated_type(type_name.id))
                .unwrap_or(Type::Dynamic);
            let element = self.declare(
                parameter.id,
                Element::new(
                    parameter.name.name.clone(),
                    ElementKind::Parameter(ParameterData {
                        kind: parameter.kind,
                        ty: Some(ty),
                        has_default_value: parameter.default_value.is_some(),
                    }),
                )
                .with_enclosing(function)
                .with_node(parameter.id, parameter.name.span.start),
            );
            elements.push(element);
        }
        if let Some(data) = self.arena[function].as_executable_mut() {
            data.parameters = elements;
        }
    }

    fn local_function(&mut self, function: &FunctionDeclaration) {
        let return_type = function.return_type.as_ref().map(|type_name| {
            self.annotated_type(type_name.id)
                .unwrap_or(Type::Dynamic)
        });
        let element = self.declare_local(
            function.id,
            function.name.name.clone(),
            function.name.span.start,
            ElementKind::Function(ExecutableData {
                return_type,
                ..Default::default()
            }),
            ElementFlags::empty(),
            function_signature(function),
            LocalList::Functions,
        );
        self.scope.define(function.name.name.clone(), element);
        self.record_declared(&function.name, element);
        self.declare_parameters(element, &function.function.parameters);
        self.executable(element, Some(&function.function.parameters), false, |this| {
            this.function_body(&function.function.body);
        });
    }

    /// Declares the element of a function literal and resolves its body
    fn closure(&mut self, function: &FunctionExpression) -> ElementId {
        let element = self.declare_local(
            function.id,
            SmolStr::default(),
            function.span.start,
            ElementKind::Function(ExecutableData::default()),
            ElementFlags::empty(),
            crate::declaration_matcher::closure_signature(function),
            LocalList::Functions,
        );
        self.declare_parameters(element, &function.parameters);
        self.executable(element, Some(&function.parameters), false, |this| {
            this.function_body(&function.body);
        });
        element
    }

    fn local_variables(&mut self, list: &VariableDeclarationList) {
        let declared = list
            .type_name
            .as_ref()
            .map(|type_name| self.annotated_type(type_name.id).unwrap_or(Type::Dynamic));
        let signature = variable_signature(list, false);
        let mut flags = ElementFlags::empty();
        if list.is_final {
            flags |= ElementFlags::FINAL;
        }
        if list.is_const {
            flags |= ElementFlags::CONST;
        }
        for variable in &list.variables {
            if let Some(initializer) = &variable.initializer {
                self.expression(initializer);
            }
            let mut variable_flags = flags;
            if variable.initializer.is_some() {
                variable_flags |= ElementFlags::HAS_INITIALIZER;
            }
            let element = self.declare_local(
                variable.id,
                variable.name.name.clone(),
                variable.name.span.start,
                ElementKind::LocalVariable(VariableData {
                    ty: declared.clone(),
                    ..Default::default()
                }),
                variable_flags,
                signature.clone(),
                LocalList::Variables,
            );
            self.scope.define(variable.name.name.clone(), element);
            self.record_declared(&variable.name, element);
            if let Some(initializer) = &variable.initializer {
                let initializer_type = self.best_type(initializer);
                self.narrow(element, initializer_type);
            }
        }
    }

    /// A loop or catch variable: a local with no declaring list
    fn declare_variable(
        &mut self,
        name: &Identifier,
        ty: Option<Type>,
        signature: String,
    ) -> ElementId {
        let element = self.declare_local(
            name.id,
            name.name.clone(),
            name.span.start,
            ElementKind::LocalVariable(VariableData {
                ty,
                ..Default::default()
            }),
            ElementFlags::empty(),
            signature,
            LocalList::Variables,
        );
        self.scope.define(name.name.clone(), element);
        self.record_declared(name, element);
        element
    }

    fn declare_label(&mut self, label: &Identifier, on_switch_member: bool) {
        let element = self.declare_local(
            label.id,
            label.name.clone(),
            label.span.start,
            ElementKind::Label(LabelData { on_switch_member }),
            ElementFlags::empty(),
            label_signature(on_switch_member),
            LocalList::Labels,
        );
        self.labels.define(label.name.clone(), element);
        self.record_declared(label, element);
    }

    // ===== Statements =====

    fn block(&mut self, block: &Block) {
        self.scope.push(ScopeKind::Block);
        for statement in &block.statements {
            self.statement(statement);
        }
        self.scope.pop();
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Block(block) => self.block(block),
            Statement::Variables(list) => self.local_variables(list),
            Statement::Function(function) => self.local_function(function),
            Statement::Expression(expression) => self.expression(expression),
            Statement::Return { expression, .. } => {
                if let Some(expression) = expression {
                    self.expression(expression);
                }
            }
            Statement::If {
                condition,
                then_statement,
                else_statement,
                ..
            } => {
                self.condition(condition);
                self.overrides.enter_scope();
                self.promote(condition, true);
                self.statement(then_statement);
                self.overrides.exit_scope();
                if let Some(else_statement) = else_statement {
                    self.overrides.enter_scope();
                    self.promote(condition, false);
                    self.statement(else_statement);
                    self.overrides.exit_scope();
                }
                if !can_complete_normally(then_statement) {
                    self.promote(condition, false);
                }
            }
            Statement::While {
                condition, body, ..
            } => {
                self.clear_assigned(&[Loop::Expression(condition), Loop::Statement(body)]);
                self.condition(condition);
                self.overrides.enter_scope();
                self.promote(condition, true);
                self.statement(body);
                self.overrides.exit_scope();
            }
            Statement::DoWhile {
                body, condition, ..
            } => {
                self.clear_assigned(&[Loop::Statement(body), Loop::Expression(condition)]);
                self.overrides.enter_scope();
                self.statement(body);
                self.overrides.exit_scope();
                self.condition(condition);
            }
            Statement::For {
                variables,
                initialization,
                condition,
                updaters,
                body,
                ..
            } => {
                self.scope.push(ScopeKind::Block);
                if let Some(variables) = variables {
                    self.local_variables(variables);
                }
                if let Some(initialization) = initialization {
                    self.expression(initialization);
                }
                let mut parts: Vec<Loop<'_>> = updaters.iter().map(Loop::Expression).collect();
                parts.extend(condition.iter().map(Loop::Expression));
                parts.push(Loop::Statement(body));
                self.clear_assigned(&parts);
                if let Some(condition) = condition {
                    self.condition(condition);
                }
                self.overrides.enter_scope();
                if let Some(condition) = condition {
                    self.promote(condition, true);
                }
                self.statement(body);
                for updater in updaters {
                    self.expression(updater);
                }
                self.overrides.exit_scope();
                self.scope.pop();
            }
            Statement::ForEach {
                type_name,
                loop_variable,
                iterable,
                body,
                ..
            } => {
                self.expression(iterable);
                self.scope.push(ScopeKind::Block);
                let declared = type_name
                    .as_ref()
                    .map(|type_name| self.annotated_type(type_name.id).unwrap_or(Type::Dynamic));
                let element = self.declare_variable(
                    loop_variable,
                    declared.clone(),
                    loop_variable_signature(type_name.as_ref()),
                );
                self.clear_assigned(&[Loop::Statement(body)]);
                self.overrides.enter_scope();
                if declared.is_none() {
                    let iterable_type = self.best_type(iterable);
                    if let Some(element_type) = self.iterated_type(&iterable_type) {
                        self.narrow(element, element_type);
                    }
                }
                self.statement(body);
                self.overrides.exit_scope();
                self.scope.pop();
            }
            Statement::Switch {
                expression,
                members,
                ..
            } => {
                self.expression(expression);
                let mark = self.labels.mark();
                for label in members.iter().flat_map(|member| &member.labels) {
                    self.declare_label(label, true);
                }
                for member in members {
                    self.switch_member(member);
                }
                self.labels.truncate(mark);
            }
            Statement::Labeled {
                labels, statement, ..
            } => {
                let mark = self.labels.mark();
                for label in labels {
                    self.declare_label(label, false);
                }
                self.statement(statement);
                self.labels.truncate(mark);
            }
            Statement::Break { label, .. } => {
                if let Some(label) = label {
                    self.label_reference(label, true);
                }
            }
            Statement::Continue { label, .. } => {
                if let Some(label) = label {
                    self.label_reference(label, false);
                }
            }
            Statement::Try {
                body,
                catch_clauses,
                finally_block,
                ..
            } => {
                self.block(body);
                for clause in catch_clauses {
                    self.scope.push(ScopeKind::Block);
                    if let Some(parameter) = &clause.exception_parameter {
                        let ty = self.annotated_type(parameter.id);
                        self.declare_variable(parameter, ty, exception_parameter_signature(clause));
                    }
                    if let Some(parameter) = &clause.stack_trace_parameter {
                        let ty = self.annotated_type(parameter.id);
                        self.declare_variable(parameter, ty, stack_trace_parameter_signature());
                    }
                    self.block(&clause.body);
                    self.scope.pop();
                }
                if let Some(finally_block) = finally_block {
                    self.block(finally_block);
                }
            }
            Statement::Empty { .. } => {}
        }
    }

    fn switch_member(&mut self, member: &SwitchMember) {
        if let Some(expression) = &member.expression {
            self.expression(expression);
        }
        self.scope.push(ScopeKind::Block);
        for statement in &member.statements {
            self.statement(statement);
        }
        self.scope.pop();
    }

    /// Element type of an iterable, for an untyped loop variable
    fn iterated_type(&self, iterable: &Type) -> Option<Type> {
        let receiver = self.interface_of(iterable)?;
        let iterable_class = self.arena.type_provider().iterable_type.element;
        self.type_system()
            .as_instance_of(&receiver, iterable_class)
            .map(|instance| instance.argument(0))
    }

    // ===== Narrowing =====

    /// Narrows `element` to `ty` when that says more than its declared type
    fn narrow(&mut self, element: ElementId, ty: Type) {
        if !self.options.enable_type_propagation || ty.is_bottom() {
            return;
        }
        let declared = self.arena.declared_type(element);
        if ty != declared && self.type_system().is_more_specific(&ty, &declared) {
            self.overrides.set_type(element, ty);
        }
    }

    /// Applies the narrowings `condition` implies when it evaluates to
    /// `when_true`
    fn promote(&mut self, condition: &Expression, when_true: bool) {
        if !self.options.enable_type_propagation {
            return;
        }
        for (element, ty) in self.promotions(condition, when_true) {
            let current = self.local_type(element);
            if ty != current && self.type_system().is_more_specific(&ty, &current) {
                self.overrides.set_type(element, ty);
            }
        }
    }

    fn promotions(&self, condition: &Expression, when_true: bool) -> Vec<(ElementId, Type)> {
        match &condition.kind {
            ExpressionKind::Parenthesized(inner) => self.promotions(inner, when_true),
            ExpressionKind::Prefix {
                operator: PrefixOperator::Bang,
                operand,
            } => self.promotions(operand, !when_true),
            ExpressionKind::Binary {
                left,
                operator,
                right,
            } if operator.is_logical() => {
                let conjunction =
                    *operator == quill_analyzer_syntax::ast::BinaryOperator::AmpAmp;
                if conjunction == when_true {
                    let mut promotions = self.promotions(left, when_true);
                    promotions.extend(self.promotions(right, when_true));
                    promotions
                } else {
                    Vec::new()
                }
            }
            ExpressionKind::Is {
                expression,
                negated,
                type_name,
            } if *negated != when_true => {
                let local = self
                    .result
                    .resolution
                    .static_element(expression.unparenthesized().id)
                    .filter(|element| self.arena[*element].is_local_binding());
                match (local, self.annotated_type(type_name.id)) {
                    (Some(element), Some(ty)) => vec![(element, ty)],
                    _ => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }

    /// Current type of a local or parameter: its narrowing, else its
    /// declared type
    fn local_type(&self, element: ElementId) -> Type {
        self.overrides
            .get_type(element)
            .cloned()
            .unwrap_or_else(|| self.arena.declared_type(element))
    }

    /// Forgets the narrowings of every local assigned somewhere in a loop
    fn clear_assigned(&mut self, parts: &[Loop<'_>]) {
        if !self.options.enable_type_propagation {
            return;
        }
        let mut collector = AssignedNames::default();
        for part in parts {
            match part {
                Loop::Expression(expression) => collector.visit_expression(expression),
                Loop::Statement(statement) => collector.visit_statement(statement),
            }
        }
        for name in collector.names {
            if let Some(element) = self.scope.lookup_lexical(&name) {
                if self.arena[element].is_local_binding() {
                    self.overrides.clear_type(element);
                }
            }
        }
    }
}

/// A piece of a loop whose assignments invalidate narrowings
enum Loop<'ast> {
    Expression(&'ast Expression),
    Statement(&'ast Statement),
}

/// Names of the simple identifiers written inside a subtree
#[derive(Default)]
struct AssignedNames {
    names: Vec<SmolStr>,
}

impl AssignedNames {
    fn target(&mut self, target: &Expression) {
        if let ExpressionKind::Identifier(name) = &target.unparenthesized().kind {
            if !self.names.contains(name) {
                self.names.push(name.clone());
            }
        }
    }
}

impl<'ast> Visitor<'ast> for AssignedNames {
    fn visit_expression(&mut self, expression: &'ast Expression) {
        match &expression.kind {
            ExpressionKind::Assignment { left, .. } => self.target(left),
            ExpressionKind::Prefix {
                operator: PrefixOperator::PlusPlus | PrefixOperator::MinusMinus,
                operand,
            } => self.target(operand),
            ExpressionKind::Postfix {
                operand,
                operator: PostfixOperator::PlusPlus | PostfixOperator::MinusMinus,
            } => self.target(operand),
            _ => {}
        }
        walk_expression(self, expression);
    }
}

/// Whether control can flow past `statement`
fn can_complete_normally(statement: &Statement) -> bool {
    match statement {
        Statement::Return { .. } | Statement::Break { .. } | Statement::Continue { .. } => false,
        Statement::Expression(expression) => !matches!(
            expression.unparenthesized().kind,
            ExpressionKind::Throw(_) | ExpressionKind::Rethrow
        ),
        Statement::Block(block) => block.statements.last().map_or(true, can_complete_normally),
        Statement::If {
            then_statement,
            else_statement: Some(else_statement),
            ..
        } => can_complete_normally(then_statement) || can_complete_normally(else_statement),
        _ => true,
    }
}
