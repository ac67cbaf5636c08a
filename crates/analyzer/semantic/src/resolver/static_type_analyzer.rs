//! Expression typing. Every expression gets a static type computed from the
//! static types of its operands; when the flow-narrowed types of the
//! operands say more, a propagated type is recorded next to it.

use quill_analyzer_diagnostics::Diagnostic;
use quill_analyzer_syntax::ast::{
    AssignmentOperator, BinaryOperator, Expression, ExpressionKind, FunctionBody,
    InterpolationElement, PostfixOperator, PrefixOperator,
};
use quill_analyzer_syntax::NodeId;

use super::element_resolver::{invocation_type, MemberKind, Receiver};
use super::Resolver;
use crate::element::ElementId;
use crate::types::{InterfaceType, Type};

/// An assignable expression: what it writes and what reading it yields
struct Target {
    element: Option<ElementId>,
    write_type: Type,
    read_type: Type,
    read_propagated: Option<Type>,
}

impl Resolver<'_, '_> {
    /// Resolves and types `expression` and everything below it
    pub(super) fn expression(&mut self, expression: &Expression) {
        let (static_type, propagated) = self.expression_types(expression);
        self.record_types(expression.id, static_type, propagated);
    }

    /// Records the static type of `node`, and `propagated` when it is more
    /// specific
    pub(super) fn record_types(
        &mut self,
        node: NodeId,
        static_type: Type,
        propagated: Option<Type>,
    ) {
        if let Some(propagated) = propagated {
            if self.options.enable_type_propagation
                && propagated != static_type
                && !propagated.is_bottom()
                && self.type_system().is_more_specific(&propagated, &static_type)
            {
                self.result
                    .resolution
                    .record_propagated_type(node, propagated);
            }
        }
        self.result.resolution.record_static_type(node, static_type);
    }

    pub(super) fn static_type_of(&self, expression: &Expression) -> Type {
        self.result
            .resolution
            .static_type(expression.id)
            .cloned()
            .unwrap_or(Type::Dynamic)
    }

    /// Propagated type of an evaluated expression, else its static type
    pub(super) fn best_type(&self, expression: &Expression) -> Type {
        self.result
            .resolution
            .best_type(expression.id)
            .cloned()
            .unwrap_or(Type::Dynamic)
    }

    pub(super) fn receiver(&self, expression: &Expression) -> Receiver {
        Receiver {
            static_type: self.static_type_of(expression),
            propagated: self
                .result
                .resolution
                .propagated_type(expression.id)
                .cloned(),
        }
    }

    /// Resolves a condition; `false` when it was reported as non-bool
    pub(super) fn condition(&mut self, condition: &Expression) -> bool {
        self.expression(condition);
        let ty = self.static_type_of(condition);
        let bool_type = Type::Interface(self.arena.type_provider().bool_type.clone());
        if !ty.is_dynamic() && !self.type_system().is_assignable(&ty, &bool_type) {
            self.report(Diagnostic::non_bool_condition(condition.span));
            return false;
        }
        true
    }

    fn interface(&self, ty: &InterfaceType) -> Type {
        Type::Interface(ty.clone())
    }

    fn expression_types(&mut self, expression: &Expression) -> (Type, Option<Type>) {
        let provider = self.arena.type_provider();
        let bool_type = self.interface(&provider.bool_type);
        let string_type = self.interface(&provider.string_type);
        let int_type = self.interface(&provider.int_type);
        let double_type = self.interface(&provider.double_type);
        match &expression.kind {
            ExpressionKind::Integer(_) => (int_type, None),
            ExpressionKind::Double(_) => (double_type, None),
            ExpressionKind::Boolean(_) => (bool_type, None),
            ExpressionKind::Null => (Type::Bottom, None),
            ExpressionKind::SimpleString(_) => (string_type, None),
            ExpressionKind::AdjacentStrings(strings) => {
                for string in strings {
                    self.expression(string);
                }
                (string_type, None)
            }
            ExpressionKind::StringInterpolation(elements) => {
                for element in elements {
                    if let InterpolationElement::Expression(inner) = element {
                        self.expression(inner);
                    }
                }
                (string_type, None)
            }
            ExpressionKind::List {
                type_arguments,
                elements,
                ..
            } => {
                for element in elements {
                    self.expression(element);
                }
                let element_type = self.type_argument(type_arguments, 0);
                let list = self.arena.type_provider().list_of(element_type);
                (Type::Interface(list), None)
            }
            ExpressionKind::Map {
                type_arguments,
                entries,
                ..
            } => {
                for entry in entries {
                    self.expression(&entry.key);
                    self.expression(&entry.value);
                }
                let key = self.type_argument(type_arguments, 0);
                let value = self.type_argument(type_arguments, 1);
                let map = self.arena.type_provider().map_of(key, value);
                (Type::Interface(map), None)
            }
            ExpressionKind::Identifier(name) => {
                let resolved = self.identifier(expression.id, name, expression.span);
                (resolved.static_type, resolved.propagated_type)
            }
            ExpressionKind::PrefixedIdentifier { prefix, identifier } => {
                let resolved = self.prefixed_identifier(prefix, identifier, MemberKind::Getter);
                (resolved.static_type, resolved.propagated_type)
            }
            ExpressionKind::PropertyAccess { target, property } => {
                self.expression(target);
                let receiver = self.receiver(target);
                let resolved = self.member_access(
                    property.id,
                    &property.name,
                    MemberKind::Getter,
                    &receiver,
                    property.span,
                );
                (resolved.static_type, resolved.propagated_type)
            }
            ExpressionKind::MethodInvocation {
                target,
                method_name,
                arguments,
            } => {
                let callee = self.method_invocation(target.as_deref(), method_name, arguments);
                (
                    invocation_type(&callee.static_type),
                    callee.propagated_type.as_ref().map(invocation_type),
                )
            }
            ExpressionKind::FunctionInvocation {
                function,
                arguments,
            } => {
                self.expression(function);
                self.arguments(arguments, None);
                let receiver = self.receiver(function);
                (
                    invocation_type(&receiver.static_type),
                    receiver.propagated.as_ref().map(invocation_type),
                )
            }
            ExpressionKind::InstanceCreation {
                constructor,
                arguments,
                ..
            } => (self.instance_creation(expression.id, constructor, arguments), None),
            ExpressionKind::Binary {
                left,
                operator,
                right,
            } => self.binary(expression, left, *operator, right),
            ExpressionKind::Prefix { operator, operand } => {
                self.prefix(expression, *operator, operand)
            }
            ExpressionKind::Postfix { operand, operator } => {
                let target = self.assignment_target(operand);
                let name = match operator {
                    PostfixOperator::PlusPlus => "+",
                    PostfixOperator::MinusMinus => "-",
                };
                let receiver = Receiver {
                    static_type: target.read_type.clone(),
                    propagated: target.read_propagated.clone(),
                };
                self.member_access(
                    expression.id,
                    name,
                    MemberKind::Operator,
                    &receiver,
                    expression.span,
                );
                (target.read_type, target.read_propagated)
            }
            ExpressionKind::Assignment {
                left,
                operator,
                right,
            } => self.assignment(expression, left, *operator, right),
            ExpressionKind::Index { target, index } => {
                self.expression(target);
                self.expression(index);
                let receiver = self.receiver(target);
                let resolved = self.member_access(
                    expression.id,
                    "[]",
                    MemberKind::Operator,
                    &receiver,
                    expression.span,
                );
                (
                    invocation_type(&resolved.static_type),
                    resolved.propagated_type.as_ref().map(invocation_type),
                )
            }
            ExpressionKind::Conditional {
                condition,
                then_expression,
                else_expression,
            } => {
                let well_typed = self.condition(condition);
                self.overrides.enter_scope();
                self.promote(condition, true);
                self.expression(then_expression);
                self.overrides.exit_scope();
                self.overrides.enter_scope();
                self.promote(condition, false);
                self.expression(else_expression);
                self.overrides.exit_scope();
                if !well_typed {
                    return (
                        self.static_type_of(then_expression),
                        self.result.resolution.propagated_type(then_expression.id).cloned(),
                    );
                }
                let type_system = self.type_system();
                let static_type = type_system.least_upper_bound(
                    &self.static_type_of(then_expression),
                    &self.static_type_of(else_expression),
                );
                let propagated = type_system.least_upper_bound(
                    &self.best_type(then_expression),
                    &self.best_type(else_expression),
                );
                (static_type, Some(propagated))
            }
            ExpressionKind::Is { expression, .. } => {
                self.expression(expression);
                (bool_type, None)
            }
            ExpressionKind::As {
                expression,
                type_name,
            } => {
                self.expression(expression);
                let ty = self.annotated_type(type_name.id).unwrap_or(Type::Dynamic);
                (ty, None)
            }
            ExpressionKind::Throw(thrown) => {
                self.expression(thrown);
                (Type::Bottom, None)
            }
            ExpressionKind::Rethrow => (Type::Bottom, None),
            ExpressionKind::This => match &self.context.this_type {
                Some(this_type) => (Type::Interface(this_type.clone()), None),
                None => (Type::Dynamic, None),
            },
            ExpressionKind::Super => {
                let superclass = self
                    .context
                    .this_type
                    .as_ref()
                    .and_then(|this_type| self.type_system().superclass(this_type));
                match superclass {
                    Some(superclass) => (Type::Interface(superclass), None),
                    None => {
                        self.report(Diagnostic::super_in_invalid_context(expression.span));
                        (Type::Dynamic, None)
                    }
                }
            }
            ExpressionKind::Parenthesized(inner)
            | ExpressionKind::Named {
                expression: inner, ..
            } => {
                self.expression(inner);
                let receiver = self.receiver(inner);
                (receiver.static_type, receiver.propagated)
            }
            ExpressionKind::Function(function) => {
                let element = self.closure(function);
                if let FunctionBody::Expression(body) = &function.body {
                    let return_type = self.result.resolution.static_type(body.id).cloned();
                    if let Some(return_type) = return_type {
                        if let Some(data) = self.arena[element].as_executable_mut() {
                            data.return_type = Some(return_type);
                        }
                    }
                }
                (Type::Function(self.arena.function_type_of(element)), None)
            }
        }
    }

    /// Type argument `index` of a literal, `dynamic` when absent
    fn type_argument(
        &self,
        type_arguments: &[quill_analyzer_syntax::ast::TypeName],
        index: usize,
    ) -> Type {
        type_arguments
            .get(index)
            .and_then(|type_name| self.annotated_type(type_name.id))
            .unwrap_or(Type::Dynamic)
    }

    fn binary(
        &mut self,
        expression: &Expression,
        left: &Expression,
        operator: BinaryOperator,
        right: &Expression,
    ) -> (Type, Option<Type>) {
        let bool_type = Type::Interface(self.arena.type_provider().bool_type.clone());
        if operator.is_logical() {
            self.expression(left);
            self.overrides.enter_scope();
            self.promote(left, operator == BinaryOperator::AmpAmp);
            self.expression(right);
            self.overrides.exit_scope();
            return (bool_type, None);
        }
        self.expression(left);
        self.expression(right);
        let name = if operator.is_equality() { "==" } else { operator.lexeme() };
        let receiver = self.receiver(left);
        let resolved = self.member_access(
            expression.id,
            name,
            MemberKind::Operator,
            &receiver,
            expression.span,
        );
        if operator.is_equality() || operator.is_relational() {
            return (bool_type, None);
        }
        let static_type = self.operator_result(
            operator,
            &receiver.static_type,
            &self.static_type_of(right),
            &resolved.static_type,
        );
        let propagated = resolved
            .propagated_type
            .as_ref()
            .or(Some(&resolved.static_type))
            .map(|member| {
                let (left, right) = (self.best_type(left), self.best_type(right));
                self.operator_result(operator, &left, &right, member)
            });
        (static_type, propagated)
    }

    /// Result of a binary operator: `int` op `int` stays `int`, a `double`
    /// operand makes it `double`, anything else is the operator's return type
    fn operator_result(
        &self,
        operator: BinaryOperator,
        left: &Type,
        right: &Type,
        member: &Type,
    ) -> Type {
        let provider = self.arena.type_provider();
        let arithmetic = matches!(
            operator,
            BinaryOperator::Plus
                | BinaryOperator::Minus
                | BinaryOperator::Star
                | BinaryOperator::Percent
        );
        if arithmetic && provider.is_numeric_leaf(left) && provider.is_numeric_leaf(right) {
            let int_type = Type::Interface(provider.int_type.clone());
            if *left == int_type && *right == int_type {
                return int_type;
            }
            return Type::Interface(provider.double_type.clone());
        }
        invocation_type(member)
    }

    fn prefix(
        &mut self,
        expression: &Expression,
        operator: PrefixOperator,
        operand: &Expression,
    ) -> (Type, Option<Type>) {
        match operator {
            PrefixOperator::Bang => {
                self.expression(operand);
                (Type::Interface(self.arena.type_provider().bool_type.clone()), None)
            }
            PrefixOperator::Minus | PrefixOperator::Tilde => {
                self.expression(operand);
                let name = if operator == PrefixOperator::Minus { "unary-" } else { "~" };
                let receiver = self.receiver(operand);
                let resolved = self.member_access(
                    expression.id,
                    name,
                    MemberKind::Operator,
                    &receiver,
                    expression.span,
                );
                (
                    invocation_type(&resolved.static_type),
                    resolved.propagated_type.as_ref().map(invocation_type),
                )
            }
            PrefixOperator::PlusPlus | PrefixOperator::MinusMinus => {
                let target = self.assignment_target(operand);
                let operator = if operator == PrefixOperator::PlusPlus {
                    BinaryOperator::Plus
                } else {
                    BinaryOperator::Minus
                };
                let int_type = Type::Interface(self.arena.type_provider().int_type.clone());
                self.compound(expression, &target, operator, &int_type, &int_type)
            }
        }
    }

    fn assignment(
        &mut self,
        expression: &Expression,
        left: &Expression,
        operator: AssignmentOperator,
        right: &Expression,
    ) -> (Type, Option<Type>) {
        match operator {
            AssignmentOperator::Assign => {
                self.expression(right);
                let target = self.assignment_target(left);
                self.record_types(left.id, target.write_type.clone(), None);
                let assigned = self.best_type(right);
                if let Some(element) = target.element {
                    self.assign_local(element, assigned);
                }
                let receiver = self.receiver(right);
                (receiver.static_type, receiver.propagated)
            }
            AssignmentOperator::Compound(operator) => {
                let target = self.assignment_target(left);
                self.record_types(
                    left.id,
                    target.read_type.clone(),
                    target.read_propagated.clone(),
                );
                self.expression(right);
                let right_static = self.static_type_of(right);
                let right_best = self.best_type(right);
                self.compound(expression, &target, operator, &right_static, &right_best)
            }
        }
    }

    /// `target op= value`, `++target` and `--target`
    fn compound(
        &mut self,
        expression: &Expression,
        target: &Target,
        operator: BinaryOperator,
        right_static: &Type,
        right_best: &Type,
    ) -> (Type, Option<Type>) {
        let receiver = Receiver {
            static_type: target.read_type.clone(),
            propagated: target.read_propagated.clone(),
        };
        let resolved = self.member_access(
            expression.id,
            operator.lexeme(),
            MemberKind::Operator,
            &receiver,
            expression.span,
        );
        let static_type = self.operator_result(
            operator,
            &target.read_type,
            right_static,
            &resolved.static_type,
        );
        let read_best = target.read_propagated.clone().unwrap_or_else(|| target.read_type.clone());
        let member = resolved.propagated_type.unwrap_or(resolved.static_type);
        let propagated = self.operator_result(operator, &read_best, right_best, &member);
        if let Some(element) = target.element {
            self.assign_local(element, propagated.clone());
        }
        (static_type, Some(propagated))
    }

    /// A local is narrowed to an assigned type that says more than its
    /// declaration, and loses any narrowing otherwise
    fn assign_local(&mut self, element: ElementId, assigned: Type) {
        if !self.options.enable_type_propagation || !self.arena[element].is_local_binding() {
            return;
        }
        let declared = self.arena.declared_type(element);
        if assigned != declared
            && !assigned.is_bottom()
            && self.type_system().is_more_specific(&assigned, &declared)
        {
            self.overrides.set_type(element, assigned);
        } else {
            self.overrides.clear_type(element);
        }
    }

    /// Resolves the left-hand side of an assignment or increment
    fn assignment_target(&mut self, target: &Expression) -> Target {
        match &target.kind {
            ExpressionKind::Identifier(name) => {
                let element = self.write_target(target.id, name, target.span);
                let Some(element) = element else {
                    return Target {
                        element: None,
                        write_type: Type::Dynamic,
                        read_type: Type::Dynamic,
                        read_propagated: None,
                    };
                };
                if self.arena[element].is_local_binding() {
                    let declared = self.arena.declared_type(element);
                    return Target {
                        element: Some(element),
                        write_type: declared.clone(),
                        read_type: declared,
                        read_propagated: self.overrides.get_type(element).cloned(),
                    };
                }
                let write_type = self.reference_type(element);
                let read_type = match self.lookup_name(name).element() {
                    Some(getter) => self.reference_type(getter),
                    None => write_type.clone(),
                };
                Target {
                    element: None,
                    write_type,
                    read_type,
                    read_propagated: None,
                }
            }
            ExpressionKind::PrefixedIdentifier { prefix, identifier } => {
                let resolved = self.prefixed_identifier(prefix, identifier, MemberKind::Setter);
                Target {
                    element: None,
                    write_type: resolved.static_type.clone(),
                    read_type: resolved.static_type,
                    read_propagated: None,
                }
            }
            ExpressionKind::PropertyAccess {
                target: receiver_expression,
                property,
            } => {
                self.expression(receiver_expression);
                let receiver = self.receiver(receiver_expression);
                let resolved = self.member_access(
                    property.id,
                    &property.name,
                    MemberKind::Setter,
                    &receiver,
                    property.span,
                );
                let read_type = self
                    .lookup_member_of(&receiver.static_type, &property.name)
                    .map_or_else(|| resolved.static_type.clone(), |(_, ty)| ty);
                Target {
                    element: None,
                    write_type: resolved.static_type,
                    read_type,
                    read_propagated: None,
                }
            }
            ExpressionKind::Index {
                target: receiver_expression,
                index,
            } => {
                self.expression(receiver_expression);
                self.expression(index);
                let receiver = self.receiver(receiver_expression);
                let resolved = self.member_access(
                    target.id,
                    "[]=",
                    MemberKind::Operator,
                    &receiver,
                    target.span,
                );
                let write_type = match &resolved.static_type {
                    Type::Function(function) => function
                        .normal_parameters
                        .get(1)
                        .cloned()
                        .unwrap_or(Type::Dynamic),
                    _ => Type::Dynamic,
                };
                let read_type = self
                    .lookup_member_of(&receiver.static_type, "[]")
                    .map_or(Type::Dynamic, |(_, ty)| invocation_type(&ty));
                Target {
                    element: None,
                    write_type,
                    read_type,
                    read_propagated: None,
                }
            }
            ExpressionKind::Parenthesized(inner) => self.assignment_target(inner),
            _ => {
                self.expression(target);
                let receiver = self.receiver(target);
                Target {
                    element: None,
                    write_type: receiver.static_type.clone(),
                    read_type: receiver.static_type,
                    read_propagated: receiver.propagated,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::resolve;
    use crate::types::Type;
    use quill_analyzer_diagnostics::DiagnosticCode;
    use quill_analyzer_syntax::ast::{AssignmentOperator, BinaryOperator, PrefixOperator};
    use quill_analyzer_syntax::AstFactory;

    #[test]
    fn test_int_plus_int_is_int() {
        let f = AstFactory::new();
        let sum = f.binary(f.integer(1), BinaryOperator::Plus, f.integer(2));
        let quotient = f.binary(f.integer(1), BinaryOperator::Slash, f.integer(2));
        let mixed = f.binary(f.integer(1), BinaryOperator::Plus, f.double(2.0));
        let comparison = f.binary(f.integer(1), BinaryOperator::Less, f.integer(2));
        let ids = [sum.id, quotient.id, mixed.id, comparison.id];
        let unit = f.compilation_unit(
            vec![],
            vec![f.function(
                None,
                "main",
                f.no_parameters(),
                f.block_body(vec![
                    f.expression_statement(sum),
                    f.expression_statement(quotient),
                    f.expression_statement(mixed),
                    f.expression_statement(comparison),
                ]),
            )],
        );
        let resolved = resolve(unit);
        let types: Vec<String> = ids.iter().map(|id| resolved.static_type(*id)).collect();
        assert_eq!(types, vec!["int", "double", "double", "bool"]);
        assert!(resolved.result.diagnostics().is_empty());
    }

    #[test]
    fn test_untyped_local_is_propagated_only() {
        let f = AstFactory::new();
        let read = f.identifier_expr("x");
        let read_id = read.id;
        let unit = f.compilation_unit(
            vec![],
            vec![f.function(
                None,
                "main",
                f.no_parameters(),
                f.block_body(vec![
                    f.local_variable(None, "x", Some(f.integer(1))),
                    f.expression_statement(read),
                ]),
            )],
        );
        let resolved = resolve(unit);
        assert_eq!(resolved.static_type(read_id), "dynamic");
        assert_eq!(resolved.propagated_type(read_id).as_deref(), Some("int"));
    }

    #[test]
    fn test_is_check_narrows_then_branch() {
        let f = AstFactory::new();
        let inside = f.identifier_expr("p");
        let outside = f.identifier_expr("p");
        let (inside_id, outside_id) = (inside.id, outside.id);
        let unit = f.compilation_unit(
            vec![],
            vec![f.function(
                None,
                "check",
                f.parameters(vec![f.required_parameter(Some(f.type_name("Object", vec![])), "p")]),
                f.block_body(vec![
                    f.if_statement(
                        f.is_expression(
                            f.identifier_expr("p"),
                            false,
                            f.type_name("String", vec![]),
                        ),
                        f.expression_statement(inside),
                        None,
                    ),
                    f.expression_statement(outside),
                ]),
            )],
        );
        let resolved = resolve(unit);
        assert_eq!(resolved.static_type(inside_id), "Object");
        assert_eq!(resolved.propagated_type(inside_id).as_deref(), Some("String"));
        assert_eq!(resolved.propagated_type(outside_id), None);
    }

    #[test]
    fn test_non_bool_condition() {
        let f = AstFactory::new();
        let unit = f.compilation_unit(
            vec![],
            vec![f.function(
                None,
                "main",
                f.no_parameters(),
                f.block_body(vec![
                    f.if_statement(f.integer(1), f.empty_statement(), None),
                    f.while_statement(f.identifier_expr("flag"), f.empty_statement()),
                ]),
            )],
        );
        let resolved = resolve(unit);
        let mut codes = resolved.result.diagnostics().codes();
        codes.sort();
        assert_eq!(
            codes,
            vec![DiagnosticCode::UndefinedIdentifier, DiagnosticCode::NonBoolCondition]
        );
    }

    #[test]
    fn test_undefined_members_on_typed_receivers_only() {
        let f = AstFactory::new();
        let unit = f.compilation_unit(
            vec![],
            vec![f.function(
                None,
                "main",
                f.parameters(vec![
                    f.required_parameter(Some(f.type_name("int", vec![])), "i"),
                    f.required_parameter(None, "d"),
                ]),
                f.block_body(vec![
                    f.expression_statement(f.property_access(f.identifier_expr("i"), "size")),
                    f.expression_statement(f.method_invocation(
                        Some(f.identifier_expr("i")),
                        "shout",
                        vec![],
                    )),
                    f.expression_statement(f.prefix(PrefixOperator::Tilde, f.string("s"))),
                    f.expression_statement(f.property_access(f.identifier_expr("d"), "size")),
                    f.expression_statement(f.method_invocation(
                        Some(f.identifier_expr("d")),
                        "shout",
                        vec![],
                    )),
                ]),
            )],
        );
        let resolved = resolve(unit);
        let mut codes = resolved.result.diagnostics().codes();
        codes.sort();
        assert_eq!(
            codes,
            vec![
                DiagnosticCode::UndefinedMethod,
                DiagnosticCode::UndefinedOperator,
                DiagnosticCode::UndefinedGetter,
            ]
        );
    }

    #[test]
    fn test_compound_assignment_binds_operator() {
        let f = AstFactory::new();
        let compound = f.assignment(
            f.identifier_expr("total"),
            AssignmentOperator::Compound(BinaryOperator::Plus),
            f.integer(1),
        );
        let compound_id = compound.id;
        let unit = f.compilation_unit(
            vec![],
            vec![f.function(
                None,
                "main",
                f.no_parameters(),
                f.block_body(vec![
                    f.local_variable(Some(f.type_name("num", vec![])), "total", Some(f.integer(0))),
                    f.expression_statement(compound),
                ]),
            )],
        );
        let resolved = resolve(unit);
        let plus = resolved.result.resolution.static_element(compound_id);
        assert_eq!(
            plus.map(|element| resolved.arena.qualified_name(element)).as_deref(),
            Some("num.+")
        );
        assert_eq!(resolved.static_type(compound_id), "num");
        assert_eq!(resolved.propagated_type(compound_id).as_deref(), Some("int"));
    }

    #[test]
    fn test_list_literal_and_index() {
        let f = AstFactory::new();
        let list = f.list(vec![f.type_name("String", vec![])], vec![f.string("a")]);
        let index = f.index(f.identifier_expr("names"), f.integer(0));
        let (list_id, index_id) = (list.id, index.id);
        let unit = f.compilation_unit(
            vec![],
            vec![f.function(
                None,
                "main",
                f.no_parameters(),
                f.block_body(vec![
                    f.local_variable(
                        Some(f.type_name("List", vec![f.type_name("String", vec![])])),
                        "names",
                        Some(list),
                    ),
                    f.expression_statement(index),
                ]),
            )],
        );
        let resolved = resolve(unit);
        assert_eq!(resolved.static_type(list_id), "List<String>");
        assert_eq!(resolved.static_type(index_id), "String");
        assert!(matches!(
            resolved.result.resolution.static_type(index_id),
            Some(Type::Interface(_))
        ));
    }
}
