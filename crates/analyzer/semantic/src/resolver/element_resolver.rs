//! Binding of names to elements: identifiers, members, invocations,
//! constructors, named arguments, directives and labels.

use quill_analyzer_diagnostics::Diagnostic;
use quill_analyzer_syntax::ast::{
    ConstructorName, Directive, Expression, ExpressionKind, Identifier, ParameterKind, Span,
};
use quill_analyzer_syntax::NodeId;
use smol_str::SmolStr;

use super::Resolver;
use crate::element::{setter_name, ElementId, ElementKind};
use crate::scope::{LabelLookup, Lookup};
use crate::types::{InterfaceType, Type};

/// How a member is being used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum MemberKind {
    Getter,
    Setter,
    Method,
    Operator,
}

/// Static and propagated types of an evaluated receiver
#[derive(Debug, Clone)]
pub(super) struct Receiver {
    pub static_type: Type,
    pub propagated: Option<Type>,
}

/// What a reference resolved to and the types it has there
#[derive(Debug, Clone)]
pub(super) struct Resolved {
    pub element: Option<ElementId>,
    pub static_type: Type,
    pub propagated_type: Option<Type>,
}

impl Resolved {
    const fn unresolved() -> Self {
        Self {
            element: None,
            static_type: Type::Dynamic,
            propagated_type: None,
        }
    }
}

/// The type a call to a value of type `ty` produces
pub(super) fn invocation_type(ty: &Type) -> Type {
    match ty {
        Type::Function(function) => (*function.return_type).clone(),
        _ => Type::Dynamic,
    }
}

impl Resolver<'_, '_> {
    // ===== Unqualified names =====

    /// Lexical bindings, then members inherited by the enclosing class, then
    /// the library scope
    pub(super) fn lookup_name(&mut self, name: &str) -> Lookup {
        if let Some(element) = self.scope.lookup_lexical(name) {
            return Lookup::Found(element);
        }
        if let Some(class) = self.context.class {
            if let Some(member) = self.inheritance.lookup_inheritance(self.arena, class, name) {
                return Lookup::Found(member);
            }
        }
        self.scope.library_scope().lookup(name)
    }

    /// Resolves a simple identifier read at `node`
    pub(super) fn identifier(&mut self, node: NodeId, name: &str, span: Span) -> Resolved {
        let lookup = self.lookup_name(name);
        self.reference(node, name, span, lookup)
    }

    fn reference(&mut self, node: NodeId, name: &str, span: Span, lookup: Lookup) -> Resolved {
        match lookup {
            Lookup::Found(element) => {
                self.result.resolution.record_static_element(node, element);
                let propagated_type = if self.arena[element].is_local_binding() {
                    self.overrides.get_type(element).cloned()
                } else {
                    None
                };
                Resolved {
                    element: Some(element),
                    static_type: self.reference_type(element),
                    propagated_type,
                }
            }
            Lookup::Ambiguous(_) => {
                self.report(Diagnostic::ambiguous_import(name, span));
                Resolved::unresolved()
            }
            Lookup::NotFound => {
                self.report(Diagnostic::undefined_identifier(name, span));
                Resolved::unresolved()
            }
        }
    }

    /// Type of a reference to `element` from the current context. Members
    /// are seen through the type of `this`.
    pub(super) fn reference_type(&self, element: ElementId) -> Type {
        if self.arena[element].is_local_binding() {
            return self.arena.declared_type(element);
        }
        match &self.context.this_type {
            Some(this_type) if self.arena.enclosing_class(element).is_some() => {
                self.member_type(element, this_type)
            }
            _ => self.arena.type_of(element),
        }
    }

    /// Resolves a simple identifier being assigned to. A local wins; then a
    /// setter; then a getter, for a final variable.
    pub(super) fn write_target(
        &mut self,
        node: NodeId,
        name: &str,
        span: Span,
    ) -> Option<ElementId> {
        if let Some(element) = self.scope.lookup_lexical(name) {
            if self.arena[element].is_local_binding() {
                self.result.resolution.record_static_element(node, element);
                return Some(element);
            }
        }
        let setter = match self.lookup_name(&setter_name(name)) {
            Lookup::Found(element) => Some(element),
            Lookup::Ambiguous(_) => {
                self.report(Diagnostic::ambiguous_import(name, span));
                return None;
            }
            Lookup::NotFound => None,
        };
        match setter.or_else(|| self.lookup_name(name).element()) {
            Some(element) => {
                self.result.resolution.record_static_element(node, element);
                Some(element)
            }
            None => {
                self.report(Diagnostic::undefined_identifier(name, span));
                None
            }
        }
    }

    // ===== Members =====

    /// Interface whose members a value of type `ty` has. `dynamic`, `void`
    /// and the bottom type have none.
    pub(super) fn interface_of(&self, ty: &Type) -> Option<InterfaceType> {
        let function_type = || self.arena.type_provider().function_type.clone();
        match ty {
            Type::Interface(interface) => Some(interface.clone()),
            Type::Function(_) => Some(function_type()),
            Type::TypeParameter(parameter) => {
                match self.type_system().interface_bound_of(*parameter) {
                    Type::Interface(interface) => Some(interface),
                    Type::Function(_) => Some(function_type()),
                    _ => None,
                }
            }
            Type::Dynamic | Type::Void | Type::Bottom => None,
        }
    }

    /// Type of `member` as seen through `receiver`, with the type
    /// parameters of its declaring class substituted
    pub(super) fn member_type(&self, member: ElementId, receiver: &InterfaceType) -> Type {
        let ty = self.arena.type_of(member);
        let Some(class) = self.arena.enclosing_class(member) else {
            return ty;
        };
        match self.type_system().as_instance_of(receiver, class) {
            Some(instance) => ty.substitute(
                self.arena.type_parameters_of(class),
                &instance.type_arguments,
            ),
            None => ty,
        }
    }

    /// Member `name` of a receiver of type `ty`, with its type there
    pub(super) fn lookup_member_of(&mut self, ty: &Type, name: &str) -> Option<(ElementId, Type)> {
        let interface = self.interface_of(ty)?;
        let member = self
            .inheritance
            .lookup_in_hierarchy(self.arena, interface.element, name)?;
        Some((member, self.member_type(member, &interface)))
    }

    /// Static member `name` of `class`
    pub(super) fn static_member(&self, class: ElementId, name: &str) -> Option<ElementId> {
        let data = self.arena[class].as_class()?;
        data.methods
            .iter()
            .chain(&data.accessors)
            .copied()
            .find(|member| self.arena[*member].is_static() && self.arena[*member].name == name)
    }

    /// Resolves `name` on a receiver and records the result on `node`. A
    /// propagated receiver type that finds a different member records it as
    /// the propagated element.
    pub(super) fn member_access(
        &mut self,
        node: NodeId,
        name: &str,
        kind: MemberKind,
        receiver: &Receiver,
        span: Span,
    ) -> Resolved {
        let lookup_name: SmolStr = match kind {
            MemberKind::Setter => setter_name(name),
            _ => SmolStr::new(name),
        };
        let found = self.lookup_member_of(&receiver.static_type, &lookup_name);
        let mut resolved = match &found {
            Some((member, ty)) => {
                self.result.resolution.record_static_element(node, *member);
                Resolved {
                    element: Some(*member),
                    static_type: ty.clone(),
                    propagated_type: None,
                }
            }
            None => {
                let callable = kind == MemberKind::Method
                    && name == "call"
                    && self.is_callable(&receiver.static_type);
                if !callable {
                    self.report_undefined_member(kind, name, &receiver.static_type, span);
                }
                Resolved::unresolved()
            }
        };
        if let Some(propagated) = &receiver.propagated {
            if *propagated != receiver.static_type {
                if let Some((member, ty)) = self.lookup_member_of(propagated, &lookup_name) {
                    if resolved.element != Some(member) {
                        self.result.resolution.record_propagated_element(node, member);
                    }
                    resolved.propagated_type = Some(ty);
                }
            }
        }
        resolved
    }

    fn is_callable(&self, ty: &Type) -> bool {
        match ty {
            Type::Function(_) => true,
            Type::Interface(interface) => {
                interface.element == self.arena.type_provider().function_type.element
            }
            _ => false,
        }
    }

    /// Reports a failed member lookup on a receiver whose static type is
    /// known
    pub(super) fn report_undefined_member(
        &mut self,
        kind: MemberKind,
        name: &str,
        receiver: &Type,
        span: Span,
    ) {
        if !self.options.report_undefined_members || self.interface_of(receiver).is_none() {
            return;
        }
        let type_name = receiver.display(self.arena).to_string();
        let diagnostic = match kind {
            MemberKind::Getter => Diagnostic::undefined_getter(name, &type_name, span),
            MemberKind::Setter => Diagnostic::undefined_setter(name, &type_name, span),
            MemberKind::Method => Diagnostic::undefined_method(name, &type_name, span),
            MemberKind::Operator => Diagnostic::undefined_operator(name, &type_name, span),
        };
        self.report(diagnostic);
    }

    /// Resolves `prefix.identifier`: an imported name, a static member, or a
    /// member of the value `prefix` names
    pub(super) fn prefixed_identifier(
        &mut self,
        prefix: &Identifier,
        identifier: &Identifier,
        kind: MemberKind,
    ) -> Resolved {
        match self.lookup_name(&prefix.name) {
            Lookup::Found(element)
                if matches!(self.arena[element].kind, ElementKind::Prefix(_)) =>
            {
                self.result.resolution.record_static_element(prefix.id, element);
                self.prefixed_name(&prefix.name, identifier, kind)
            }
            Lookup::Found(element) if matches!(self.arena[element].kind, ElementKind::Class(_)) => {
                self.result.resolution.record_static_element(prefix.id, element);
                let type_type = Type::Interface(self.arena.type_provider().type_type.clone());
                self.result.resolution.record_static_type(prefix.id, type_type);
                self.static_access(element, identifier, kind)
            }
            lookup => {
                let target = self.reference(prefix.id, &prefix.name, prefix.span, lookup);
                self.record_types(
                    prefix.id,
                    target.static_type.clone(),
                    target.propagated_type.clone(),
                );
                let receiver = Receiver {
                    static_type: target.static_type,
                    propagated: target.propagated_type,
                };
                self.member_access(
                    identifier.id,
                    &identifier.name,
                    kind,
                    &receiver,
                    identifier.span,
                )
            }
        }
    }

    /// `prefix.name` where `prefix` is an import prefix
    fn prefixed_name(
        &mut self,
        prefix: &str,
        identifier: &Identifier,
        kind: MemberKind,
    ) -> Resolved {
        let library_scope = self.scope.library_scope();
        let mut lookup = Lookup::NotFound;
        if kind == MemberKind::Setter {
            lookup = library_scope.lookup_prefixed(prefix, &setter_name(&identifier.name));
        }
        if lookup == Lookup::NotFound {
            lookup = library_scope.lookup_prefixed(prefix, &identifier.name);
        }
        match lookup {
            Lookup::Found(element) => {
                self.result
                    .resolution
                    .record_static_element(identifier.id, element);
                Resolved {
                    element: Some(element),
                    static_type: self.arena.type_of(element),
                    propagated_type: None,
                }
            }
            Lookup::Ambiguous(_) => {
                self.report(Diagnostic::ambiguous_import(&identifier.name, identifier.span));
                Resolved::unresolved()
            }
            Lookup::NotFound => {
                self.report(Diagnostic::undefined_identifier(
                    &format!("{prefix}.{}", identifier.name),
                    identifier.span,
                ));
                Resolved::unresolved()
            }
        }
    }

    /// `Class.name` naming a static member
    fn static_access(
        &mut self,
        class: ElementId,
        identifier: &Identifier,
        kind: MemberKind,
    ) -> Resolved {
        let member = match kind {
            MemberKind::Setter => self
                .static_member(class, &setter_name(&identifier.name))
                .or_else(|| self.static_member(class, &identifier.name)),
            _ => self.static_member(class, &identifier.name),
        };
        match member {
            Some(member) => {
                self.result
                    .resolution
                    .record_static_element(identifier.id, member);
                Resolved {
                    element: Some(member),
                    static_type: self.arena.type_of(member),
                    propagated_type: None,
                }
            }
            None => {
                let class_type = Type::Interface(InterfaceType::raw(class));
                self.report_undefined_member(kind, &identifier.name, &class_type, identifier.span);
                Resolved::unresolved()
            }
        }
    }

    // ===== Invocations =====

    /// Resolves the callee of `target.name(arguments)` and the arguments.
    /// The returned types are those of the callee, not of the call.
    pub(super) fn method_invocation(
        &mut self,
        target: Option<&Expression>,
        method_name: &Identifier,
        arguments: &[Expression],
    ) -> Resolved {
        let callee = match target {
            None => self.unqualified_invocation(method_name),
            Some(target) => self.qualified_invocation(target, method_name),
        };
        if let Some(element) = callee.element {
            self.result
                .resolution
                .record_static_element(method_name.id, element);
        }
        self.result
            .resolution
            .record_static_type(method_name.id, callee.static_type.clone());
        self.arguments(arguments, callee.element);
        callee
    }

    fn unqualified_invocation(&mut self, method_name: &Identifier) -> Resolved {
        match self.lookup_name(&method_name.name) {
            Lookup::NotFound => {
                match self.context.this_type.clone() {
                    Some(this_type) => self.report_undefined_member(
                        MemberKind::Method,
                        &method_name.name,
                        &Type::Interface(this_type),
                        method_name.span,
                    ),
                    None => self.report(Diagnostic::undefined_identifier(
                        &method_name.name,
                        method_name.span,
                    )),
                }
                Resolved::unresolved()
            }
            lookup => self.reference(method_name.id, &method_name.name, method_name.span, lookup),
        }
    }

    fn qualified_invocation(&mut self, target: &Expression, method_name: &Identifier) -> Resolved {
        if let ExpressionKind::Identifier(name) = &target.kind {
            match self.lookup_name(name) {
                Lookup::Found(element)
                    if matches!(self.arena[element].kind, ElementKind::Prefix(_)) =>
                {
                    self.result.resolution.record_static_element(target.id, element);
                    return self.prefixed_name(name, method_name, MemberKind::Method);
                }
                Lookup::Found(class) if matches!(self.arena[class].kind, ElementKind::Class(_)) => {
                    self.result.resolution.record_static_element(target.id, class);
                    let type_type = Type::Interface(self.arena.type_provider().type_type.clone());
                    self.result.resolution.record_static_type(target.id, type_type);
                    if self.static_member(class, &method_name.name).is_none() {
                        // `Class.named(...)` without a keyword
                        let constructor = self.constructor_named(class, &method_name.name);
                        if let Some(constructor) = constructor {
                            return Resolved {
                                element: Some(constructor),
                                static_type: self.arena.type_of(constructor),
                                propagated_type: None,
                            };
                        }
                    }
                    return self.static_access(class, method_name, MemberKind::Method);
                }
                _ => {}
            }
        }
        self.expression(target);
        let receiver = self.receiver(target);
        if method_name.name == "call" {
            if let Type::Function(_) = &receiver.static_type {
                return Resolved {
                    element: None,
                    static_type: receiver.static_type,
                    propagated_type: None,
                };
            }
        }
        self.member_access(
            method_name.id,
            &method_name.name,
            MemberKind::Method,
            &receiver,
            method_name.span,
        )
    }

    /// Resolves the arguments of a call, then binds named arguments to the
    /// named parameters of `callee`
    pub(super) fn arguments(&mut self, arguments: &[Expression], callee: Option<ElementId>) {
        for argument in arguments {
            self.expression(argument);
        }
        let Some(callee) = callee else {
            return;
        };
        if !matches!(
            self.arena[callee].kind,
            ElementKind::Method(_) | ElementKind::Function(_) | ElementKind::Constructor(_)
        ) {
            return;
        }
        let parameters = self.arena.parameters_of(callee).to_vec();
        for argument in arguments {
            let ExpressionKind::Named { name, .. } = &argument.kind else {
                continue;
            };
            let parameter = parameters.iter().copied().find(|parameter| {
                self.arena[*parameter].name == name.name
                    && self.arena[*parameter]
                        .as_parameter()
                        .is_some_and(|data| data.kind == ParameterKind::Named)
            });
            match parameter {
                Some(parameter) => self
                    .result
                    .resolution
                    .record_static_element(name.id, parameter),
                None => self.report(Diagnostic::undefined_named_parameter(&name.name, name.span)),
            }
        }
    }

    // ===== Constructors =====

    pub(super) fn constructor_named(&self, class: ElementId, name: &str) -> Option<ElementId> {
        self.arena[class]
            .as_class()?
            .constructors
            .iter()
            .copied()
            .find(|constructor| self.arena[*constructor].name == name)
    }

    /// Binds a constructor reference at `node` to constructor `name` of
    /// `class`; the unnamed constructor when no name is given
    pub(super) fn constructor_invocation(
        &mut self,
        node: NodeId,
        target: Option<(ElementId, Option<&Identifier>)>,
        span: Span,
    ) -> Option<ElementId> {
        let (class, name) = target?;
        let constructor_name = name.map_or("", |name| name.name.as_str());
        match self.constructor_named(class, constructor_name) {
            Some(constructor) => {
                self.result.resolution.record_static_element(node, constructor);
                if let Some(name) = name {
                    self.result
                        .resolution
                        .record_static_element(name.id, constructor);
                }
                Some(constructor)
            }
            None => {
                let class_name = self.arena[class].name.clone();
                self.report(Diagnostic::undefined_constructor(
                    &class_name,
                    name.map(|name| name.name.as_str()),
                    span,
                ));
                None
            }
        }
    }

    /// `new C.name(arguments)`: binds the constructor and returns the
    /// created type
    pub(super) fn instance_creation(
        &mut self,
        node: NodeId,
        constructor: &ConstructorName,
        arguments: &[Expression],
    ) -> Type {
        let (element, ty) = match self.annotated_type(constructor.type_name.id) {
            Some(Type::Interface(interface)) => {
                let element = self.constructor_invocation(
                    constructor.id,
                    Some((interface.element, constructor.name.as_ref())),
                    constructor.span,
                );
                (element, Type::Interface(interface))
            }
            _ => (None, Type::Dynamic),
        };
        if let Some(element) = element {
            self.result.resolution.record_static_element(node, element);
        }
        self.arguments(arguments, element);
        ty
    }

    // ===== Directives and labels =====

    pub(super) fn directive(&mut self, directive: &Directive) {
        match directive {
            Directive::Library(library) => {
                let element = self.library;
                self.record_declared(&library.name, element);
            }
            Directive::PartOf(part_of) => {
                let element = self.library;
                self.result
                    .resolution
                    .record_static_element(part_of.library_name.id, element);
            }
            Directive::Import(import) => {
                self.expression(&import.uri);
                let Some(element) = self.element_of(import.id) else {
                    return;
                };
                self.result.resolution.record_static_element(import.id, element);
                let prefix_element = match &self.arena[element].kind {
                    ElementKind::Import(data) => data.prefix,
                    _ => None,
                };
                if let (Some(prefix), Some(prefix_element)) = (&import.prefix, prefix_element) {
                    self.record_declared(prefix, prefix_element);
                }
            }
            Directive::Export(export) => {
                self.expression(&export.uri);
                if let Some(element) = self.element_of(export.id) {
                    self.result.resolution.record_static_element(export.id, element);
                }
            }
            Directive::Part(part) => {
                self.expression(&part.uri);
                if let Some(element) = self.element_of(part.id) {
                    self.result.resolution.record_static_element(part.id, element);
                }
            }
        }
    }

    /// `break label` or `continue label`
    pub(super) fn label_reference(&mut self, label: &Identifier, is_break: bool) {
        match self.labels.lookup(&label.name) {
            LabelLookup::Found(element) => {
                self.result.resolution.record_static_element(label.id, element);
                let on_switch_member = matches!(
                    self.arena[element].kind,
                    ElementKind::Label(ref data) if data.on_switch_member
                );
                if is_break && on_switch_member {
                    self.report(Diagnostic::break_label_on_switch_member(label.span));
                }
            }
            LabelLookup::OuterScope(_) => {
                self.report(Diagnostic::label_in_outer_scope(&label.name, label.span));
            }
            LabelLookup::NotFound => {
                self.report(Diagnostic::undefined_label(&label.name, label.span));
            }
        }
    }
}
