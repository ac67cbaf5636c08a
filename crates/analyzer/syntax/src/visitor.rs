//! # AST Visitor
//!
//! Read-only traversal of the syntax tree. It separates traversal from
//! analysis for passes that only care about a few node kinds (collecting the
//! ids of a subtree, finding the names assigned inside a loop, resolving the
//! type names of a body).
//!
//! The resolution passes proper do not use this trait: they match on node
//! kinds exhaustively so that a new node kind cannot be silently skipped.
//!
//! Every `walk_*` function reports each [`NodeId`] it passes through to
//! [`Visitor::visit_node`], including ids of identifiers and type names.

use crate::ast::*;

/// Core visitor trait for AST traversal.
///
/// Each visit method has a default implementation that calls the corresponding
/// walk function, enabling selective overriding of traversal behavior.
pub trait Visitor<'ast> {
    /// Called once for every node id reached by the walk
    fn visit_node(&mut self, _id: NodeId) {}

    fn visit_unit(&mut self, unit: &'ast CompilationUnit) {
        walk_unit(self, unit);
    }

    fn visit_directive(&mut self, directive: &'ast Directive) {
        walk_directive(self, directive);
    }

    fn visit_declaration(&mut self, declaration: &'ast Declaration) {
        walk_declaration(self, declaration);
    }

    fn visit_class_member(&mut self, member: &'ast ClassMember) {
        walk_class_member(self, member);
    }

    fn visit_statement(&mut self, statement: &'ast Statement) {
        walk_statement(self, statement);
    }

    fn visit_expression(&mut self, expression: &'ast Expression) {
        walk_expression(self, expression);
    }

    fn visit_type_name(&mut self, type_name: &'ast TypeName) {
        walk_type_name(self, type_name);
    }

    fn visit_identifier(&mut self, identifier: &'ast Identifier) {
        self.visit_node(identifier.id);
    }

    fn visit_formal_parameter(&mut self, parameter: &'ast FormalParameter) {
        walk_formal_parameter(self, parameter);
    }

    fn visit_function_expression(&mut self, function: &'ast FunctionExpression) {
        walk_function_expression(self, function);
    }

    fn visit_variable_list(&mut self, list: &'ast VariableDeclarationList) {
        walk_variable_list(self, list);
    }

    fn visit_catch_clause(&mut self, clause: &'ast CatchClause) {
        walk_catch_clause(self, clause);
    }
}

pub fn walk_unit<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, unit: &'ast CompilationUnit) {
    visitor.visit_node(unit.id);
    for directive in &unit.directives {
        visitor.visit_directive(directive);
    }
    for declaration in &unit.declarations {
        visitor.visit_declaration(declaration);
    }
}

pub fn walk_directive<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    directive: &'ast Directive,
) {
    match directive {
        Directive::Library(library) => {
            visitor.visit_node(library.id);
            visitor.visit_identifier(&library.name);
        }
        Directive::Import(import) => {
            visitor.visit_node(import.id);
            visitor.visit_expression(&import.uri);
            if let Some(prefix) = &import.prefix {
                visitor.visit_identifier(prefix);
            }
            walk_combinators(visitor, &import.combinators);
        }
        Directive::Export(export) => {
            visitor.visit_node(export.id);
            visitor.visit_expression(&export.uri);
            walk_combinators(visitor, &export.combinators);
        }
        Directive::Part(part) => {
            visitor.visit_node(part.id);
            visitor.visit_expression(&part.uri);
        }
        Directive::PartOf(part_of) => {
            visitor.visit_node(part_of.id);
            visitor.visit_identifier(&part_of.library_name);
        }
    }
}

fn walk_combinators<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    combinators: &'ast [Combinator],
) {
    for combinator in combinators {
        let (Combinator::Show(names) | Combinator::Hide(names)) = combinator;
        for name in names {
            visitor.visit_identifier(name);
        }
    }
}

fn walk_type_parameters<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    type_parameters: &'ast [TypeParameter],
) {
    for type_parameter in type_parameters {
        visitor.visit_node(type_parameter.id);
        visitor.visit_identifier(&type_parameter.name);
        if let Some(bound) = &type_parameter.bound {
            visitor.visit_type_name(bound);
        }
    }
}

pub fn walk_declaration<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    declaration: &'ast Declaration,
) {
    visitor.visit_node(declaration.id());
    match declaration {
        Declaration::Class(class) => {
            visitor.visit_identifier(&class.name);
            walk_type_parameters(visitor, &class.type_parameters);
            if let Some(extends) = &class.extends {
                visitor.visit_type_name(extends);
            }
            for type_name in class.with.iter().chain(&class.implements) {
                visitor.visit_type_name(type_name);
            }
            for member in &class.members {
                visitor.visit_class_member(member);
            }
        }
        Declaration::ClassTypeAlias(alias) => {
            visitor.visit_identifier(&alias.name);
            walk_type_parameters(visitor, &alias.type_parameters);
            visitor.visit_type_name(&alias.superclass);
            for type_name in alias.with.iter().chain(&alias.implements) {
                visitor.visit_type_name(type_name);
            }
        }
        Declaration::FunctionTypeAlias(alias) => {
            if let Some(return_type) = &alias.return_type {
                visitor.visit_type_name(return_type);
            }
            visitor.visit_identifier(&alias.name);
            walk_type_parameters(visitor, &alias.type_parameters);
            walk_parameter_list(visitor, &alias.parameters);
        }
        Declaration::Function(function) => walk_function_declaration(visitor, function),
        Declaration::Variables(list) => visitor.visit_variable_list(list),
    }
}

pub fn walk_function_declaration<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    function: &'ast FunctionDeclaration,
) {
    visitor.visit_node(function.id);
    if let Some(return_type) = &function.return_type {
        visitor.visit_type_name(return_type);
    }
    visitor.visit_identifier(&function.name);
    visitor.visit_function_expression(&function.function);
}

pub fn walk_class_member<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    member: &'ast ClassMember,
) {
    visitor.visit_node(member.id());
    match member {
        ClassMember::Constructor(constructor) => {
            visitor.visit_identifier(&constructor.return_type);
            if let Some(name) = &constructor.name {
                visitor.visit_identifier(name);
            }
            walk_parameter_list(visitor, &constructor.parameters);
            for initializer in &constructor.initializers {
                match initializer {
                    ConstructorInitializer::Field {
                        id,
                        field,
                        expression,
                    } => {
                        visitor.visit_node(*id);
                        visitor.visit_identifier(field);
                        visitor.visit_expression(expression);
                    }
                    ConstructorInitializer::Super {
                        id,
                        constructor_name,
                        arguments,
                        ..
                    }
                    | ConstructorInitializer::Redirecting {
                        id,
                        constructor_name,
                        arguments,
                        ..
                    } => {
                        visitor.visit_node(*id);
                        if let Some(name) = constructor_name {
                            visitor.visit_identifier(name);
                        }
                        for argument in arguments {
                            visitor.visit_expression(argument);
                        }
                    }
                }
            }
            walk_function_body(visitor, &constructor.body);
        }
        ClassMember::Field(field) => visitor.visit_variable_list(&field.variables),
        ClassMember::Method(method) => {
            if let Some(return_type) = &method.return_type {
                visitor.visit_type_name(return_type);
            }
            visitor.visit_identifier(&method.name);
            if let Some(parameters) = &method.parameters {
                walk_parameter_list(visitor, parameters);
            }
            walk_function_body(visitor, &method.body);
        }
    }
}

pub fn walk_parameter_list<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    parameters: &'ast FormalParameterList,
) {
    visitor.visit_node(parameters.id);
    for parameter in &parameters.parameters {
        visitor.visit_formal_parameter(parameter);
    }
}

pub fn walk_formal_parameter<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    parameter: &'ast FormalParameter,
) {
    visitor.visit_node(parameter.id);
    if let Some(type_name) = &parameter.type_name {
        visitor.visit_type_name(type_name);
    }
    visitor.visit_identifier(&parameter.name);
    if let Some(default_value) = &parameter.default_value {
        visitor.visit_expression(default_value);
    }
}

pub fn walk_function_expression<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    function: &'ast FunctionExpression,
) {
    visitor.visit_node(function.id);
    walk_parameter_list(visitor, &function.parameters);
    walk_function_body(visitor, &function.body);
}

pub fn walk_function_body<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    body: &'ast FunctionBody,
) {
    match body {
        FunctionBody::Empty => {}
        FunctionBody::Block(block) => walk_block(visitor, block),
        FunctionBody::Expression(expression) => visitor.visit_expression(expression),
    }
}

pub fn walk_block<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, block: &'ast Block) {
    visitor.visit_node(block.id);
    for statement in &block.statements {
        visitor.visit_statement(statement);
    }
}

pub fn walk_variable_list<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    list: &'ast VariableDeclarationList,
) {
    visitor.visit_node(list.id);
    if let Some(type_name) = &list.type_name {
        visitor.visit_type_name(type_name);
    }
    for variable in &list.variables {
        visitor.visit_node(variable.id);
        visitor.visit_identifier(&variable.name);
        if let Some(initializer) = &variable.initializer {
            visitor.visit_expression(initializer);
        }
    }
}

pub fn walk_catch_clause<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    clause: &'ast CatchClause,
) {
    visitor.visit_node(clause.id);
    if let Some(exception_type) = &clause.exception_type {
        visitor.visit_type_name(exception_type);
    }
    if let Some(parameter) = &clause.exception_parameter {
        visitor.visit_identifier(parameter);
    }
    if let Some(parameter) = &clause.stack_trace_parameter {
        visitor.visit_identifier(parameter);
    }
    walk_block(visitor, &clause.body);
}

pub fn walk_statement<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    statement: &'ast Statement,
) {
    match statement {
        Statement::Block(block) => walk_block(visitor, block),
        Statement::Variables(list) => visitor.visit_variable_list(list),
        Statement::Function(function) => walk_function_declaration(visitor, function),
        Statement::Expression(expression) => visitor.visit_expression(expression),
        Statement::Return { id, expression, .. } => {
            visitor.visit_node(*id);
            if let Some(expression) = expression {
                visitor.visit_expression(expression);
            }
        }
        Statement::If {
            id,
            condition,
            then_statement,
            else_statement,
            ..
        } => {
            visitor.visit_node(*id);
            visitor.visit_expression(condition);
            visitor.visit_statement(then_statement);
            if let Some(else_statement) = else_statement {
                visitor.visit_statement(else_statement);
            }
        }
        Statement::While {
            id,
            condition,
            body,
            ..
        } => {
            visitor.visit_node(*id);
            visitor.visit_expression(condition);
            visitor.visit_statement(body);
        }
        Statement::DoWhile {
            id,
            body,
            condition,
            ..
        } => {
            visitor.visit_node(*id);
            visitor.visit_statement(body);
            visitor.visit_expression(condition);
        }
        Statement::For {
            id,
            variables,
            initialization,
            condition,
            updaters,
            body,
            ..
        } => {
            visitor.visit_node(*id);
            if let Some(variables) = variables {
                visitor.visit_variable_list(variables);
            }
            if let Some(initialization) = initialization {
                visitor.visit_expression(initialization);
            }
            if let Some(condition) = condition {
                visitor.visit_expression(condition);
            }
            for updater in updaters {
                visitor.visit_expression(updater);
            }
            visitor.visit_statement(body);
        }
        Statement::ForEach {
            id,
            type_name,
            loop_variable,
            iterable,
            body,
            ..
        } => {
            visitor.visit_node(*id);
            if let Some(type_name) = type_name {
                visitor.visit_type_name(type_name);
            }
            visitor.visit_identifier(loop_variable);
            visitor.visit_expression(iterable);
            visitor.visit_statement(body);
        }
        Statement::Switch {
            id,
            expression,
            members,
            ..
        } => {
            visitor.visit_node(*id);
            visitor.visit_expression(expression);
            for member in members {
                visitor.visit_node(member.id);
                for label in &member.labels {
                    visitor.visit_identifier(label);
                }
                if let Some(expression) = &member.expression {
                    visitor.visit_expression(expression);
                }
                for statement in &member.statements {
                    visitor.visit_statement(statement);
                }
            }
        }
        Statement::Labeled {
            id,
            labels,
            statement,
            ..
        } => {
            visitor.visit_node(*id);
            for label in labels {
                visitor.visit_identifier(label);
            }
            visitor.visit_statement(statement);
        }
        Statement::Break { id, label, .. } | Statement::Continue { id, label, .. } => {
            visitor.visit_node(*id);
            if let Some(label) = label {
                visitor.visit_identifier(label);
            }
        }
        Statement::Try {
            id,
            body,
            catch_clauses,
            finally_block,
            ..
        } => {
            visitor.visit_node(*id);
            walk_block(visitor, body);
            for clause in catch_clauses {
                visitor.visit_catch_clause(clause);
            }
            if let Some(finally_block) = finally_block {
                walk_block(visitor, finally_block);
            }
        }
        Statement::Empty { id, .. } => visitor.visit_node(*id),
    }
}

pub fn walk_type_name<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, type_name: &'ast TypeName) {
    visitor.visit_node(type_name.id);
    if let Some(prefix) = &type_name.prefix {
        visitor.visit_identifier(prefix);
    }
    visitor.visit_identifier(&type_name.name);
    for argument in &type_name.arguments {
        visitor.visit_type_name(argument);
    }
}

pub fn walk_expression<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    expression: &'ast Expression,
) {
    visitor.visit_node(expression.id);
    match &expression.kind {
        ExpressionKind::Integer(_)
        | ExpressionKind::Double(_)
        | ExpressionKind::Boolean(_)
        | ExpressionKind::Null
        | ExpressionKind::SimpleString(_)
        | ExpressionKind::Identifier(_)
        | ExpressionKind::Rethrow
        | ExpressionKind::This
        | ExpressionKind::Super => {}
        ExpressionKind::AdjacentStrings(strings) => {
            for string in strings {
                visitor.visit_expression(string);
            }
        }
        ExpressionKind::StringInterpolation(elements) => {
            for element in elements {
                if let InterpolationElement::Expression(expression) = element {
                    visitor.visit_expression(expression);
                }
            }
        }
        ExpressionKind::List {
            type_arguments,
            elements,
            ..
        } => {
            for type_argument in type_arguments {
                visitor.visit_type_name(type_argument);
            }
            for element in elements {
                visitor.visit_expression(element);
            }
        }
        ExpressionKind::Map {
            type_arguments,
            entries,
            ..
        } => {
            for type_argument in type_arguments {
                visitor.visit_type_name(type_argument);
            }
            for entry in entries {
                visitor.visit_expression(&entry.key);
                visitor.visit_expression(&entry.value);
            }
        }
        ExpressionKind::PrefixedIdentifier { prefix, identifier } => {
            visitor.visit_identifier(prefix);
            visitor.visit_identifier(identifier);
        }
        ExpressionKind::PropertyAccess { target, property } => {
            visitor.visit_expression(target);
            visitor.visit_identifier(property);
        }
        ExpressionKind::MethodInvocation {
            target,
            method_name,
            arguments,
        } => {
            if let Some(target) = target {
                visitor.visit_expression(target);
            }
            visitor.visit_identifier(method_name);
            for argument in arguments {
                visitor.visit_expression(argument);
            }
        }
        ExpressionKind::FunctionInvocation {
            function,
            arguments,
        } => {
            visitor.visit_expression(function);
            for argument in arguments {
                visitor.visit_expression(argument);
            }
        }
        ExpressionKind::InstanceCreation {
            constructor,
            arguments,
            ..
        } => {
            visitor.visit_node(constructor.id);
            visitor.visit_type_name(&constructor.type_name);
            if let Some(name) = &constructor.name {
                visitor.visit_identifier(name);
            }
            for argument in arguments {
                visitor.visit_expression(argument);
            }
        }
        ExpressionKind::Binary { left, right, .. } => {
            visitor.visit_expression(left);
            visitor.visit_expression(right);
        }
        ExpressionKind::Prefix { operand, .. } | ExpressionKind::Postfix { operand, .. } => {
            visitor.visit_expression(operand);
        }
        ExpressionKind::Assignment { left, right, .. } => {
            visitor.visit_expression(left);
            visitor.visit_expression(right);
        }
        ExpressionKind::Index { target, index } => {
            visitor.visit_expression(target);
            visitor.visit_expression(index);
        }
        ExpressionKind::Conditional {
            condition,
            then_expression,
            else_expression,
        } => {
            visitor.visit_expression(condition);
            visitor.visit_expression(then_expression);
            visitor.visit_expression(else_expression);
        }
        ExpressionKind::Is {
            expression,
            type_name,
            ..
        }
        | ExpressionKind::As {
            expression,
            type_name,
        } => {
            visitor.visit_expression(expression);
            visitor.visit_type_name(type_name);
        }
        ExpressionKind::Throw(expression) | ExpressionKind::Parenthesized(expression) => {
            visitor.visit_expression(expression);
        }
        ExpressionKind::Named { name, expression } => {
            visitor.visit_identifier(name);
            visitor.visit_expression(expression);
        }
        ExpressionKind::Function(function) => visitor.visit_function_expression(function),
    }
}
