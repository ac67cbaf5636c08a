//! Programmatic construction of syntax trees.
//!
//! The parser lives outside this workspace; resolver tests and tools build
//! trees through [`AstFactory`], which hands out fresh [`NodeId`]s. Ids are
//! unique per factory, so every unit of one library graph should come from the
//! same factory (or from factories seeded with disjoint ranges).

use std::cell::Cell;

use chumsky::span::SimpleSpan;
use smol_str::SmolStr;

use crate::ast::*;

#[derive(Debug, Default)]
pub struct AstFactory {
    next_id: Cell<u32>,
}

impl AstFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory whose ids start at `first_id`
    pub fn starting_at(first_id: u32) -> Self {
        Self {
            next_id: Cell::new(first_id),
        }
    }

    pub fn next_id(&self) -> NodeId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        NodeId::new(id as usize)
    }

    fn span() -> Span {
        SimpleSpan::from(0..0)
    }

    fn expression(&self, kind: ExpressionKind) -> Expression {
        Expression {
            id: self.next_id(),
            kind,
            span: Self::span(),
        }
    }

    // ===== Names and types =====

    pub fn identifier(&self, name: &str) -> Identifier {
        Identifier {
            id: self.next_id(),
            name: SmolStr::new(name),
            span: Self::span(),
        }
    }

    pub fn type_name(&self, name: &str, arguments: Vec<TypeName>) -> TypeName {
        TypeName {
            id: self.next_id(),
            prefix: None,
            name: self.identifier(name),
            arguments,
            span: Self::span(),
        }
    }

    pub fn prefixed_type_name(&self, prefix: &str, name: &str) -> TypeName {
        TypeName {
            id: self.next_id(),
            prefix: Some(self.identifier(prefix)),
            name: self.identifier(name),
            arguments: Vec::new(),
            span: Self::span(),
        }
    }

    pub fn type_parameter(&self, name: &str, bound: Option<TypeName>) -> TypeParameter {
        TypeParameter {
            id: self.next_id(),
            name: self.identifier(name),
            bound,
        }
    }

    // ===== Units and directives =====

    pub fn compilation_unit(
        &self,
        directives: Vec<Directive>,
        declarations: Vec<Declaration>,
    ) -> CompilationUnit {
        CompilationUnit {
            id: self.next_id(),
            directives,
            declarations,
            span: Self::span(),
        }
    }

    pub fn library_directive(&self, name: &str) -> Directive {
        Directive::Library(LibraryDirective {
            id: self.next_id(),
            name: self.identifier(name),
            span: Self::span(),
        })
    }

    pub fn import_directive(
        &self,
        uri: &str,
        prefix: Option<&str>,
        combinators: Vec<Combinator>,
    ) -> Directive {
        self.import_directive_with_uri(self.string(uri), prefix, combinators)
    }

    /// Import whose URI is an arbitrary expression (e.g. an interpolation)
    pub fn import_directive_with_uri(
        &self,
        uri: Expression,
        prefix: Option<&str>,
        combinators: Vec<Combinator>,
    ) -> Directive {
        Directive::Import(ImportDirective {
            id: self.next_id(),
            uri,
            prefix: prefix.map(|prefix| self.identifier(prefix)),
            combinators,
            span: Self::span(),
        })
    }

    pub fn export_directive(&self, uri: &str, combinators: Vec<Combinator>) -> Directive {
        Directive::Export(ExportDirective {
            id: self.next_id(),
            uri: self.string(uri),
            combinators,
            span: Self::span(),
        })
    }

    pub fn part_directive(&self, uri: &str) -> Directive {
        Directive::Part(PartDirective {
            id: self.next_id(),
            uri: self.string(uri),
            span: Self::span(),
        })
    }

    pub fn part_of_directive(&self, library_name: &str) -> Directive {
        Directive::PartOf(PartOfDirective {
            id: self.next_id(),
            library_name: self.identifier(library_name),
            span: Self::span(),
        })
    }

    pub fn show(&self, names: &[&str]) -> Combinator {
        Combinator::Show(names.iter().map(|name| self.identifier(name)).collect())
    }

    pub fn hide(&self, names: &[&str]) -> Combinator {
        Combinator::Hide(names.iter().map(|name| self.identifier(name)).collect())
    }

    // ===== Declarations =====

    pub fn class_declaration(
        &self,
        name: &str,
        type_parameters: Vec<TypeParameter>,
        extends: Option<TypeName>,
        with: Vec<TypeName>,
        implements: Vec<TypeName>,
        members: Vec<ClassMember>,
    ) -> ClassDeclaration {
        ClassDeclaration {
            id: self.next_id(),
            is_abstract: false,
            name: self.identifier(name),
            type_parameters,
            extends,
            with,
            implements,
            members,
            span: Self::span(),
        }
    }

    /// `class name { members }`
    pub fn class(&self, name: &str, members: Vec<ClassMember>) -> Declaration {
        Declaration::Class(self.class_declaration(name, vec![], None, vec![], vec![], members))
    }

    pub fn class_type_alias(
        &self,
        name: &str,
        superclass: TypeName,
        with: Vec<TypeName>,
        implements: Vec<TypeName>,
    ) -> Declaration {
        Declaration::ClassTypeAlias(ClassTypeAlias {
            id: self.next_id(),
            is_abstract: false,
            name: self.identifier(name),
            type_parameters: Vec::new(),
            superclass,
            with,
            implements,
            span: Self::span(),
        })
    }

    pub fn function_type_alias(
        &self,
        return_type: Option<TypeName>,
        name: &str,
        type_parameters: Vec<TypeParameter>,
        parameters: FormalParameterList,
    ) -> Declaration {
        Declaration::FunctionTypeAlias(FunctionTypeAlias {
            id: self.next_id(),
            return_type,
            name: self.identifier(name),
            type_parameters,
            parameters,
            span: Self::span(),
        })
    }

    pub fn function_declaration(
        &self,
        return_type: Option<TypeName>,
        property: Option<PropertyKind>,
        name: &str,
        parameters: FormalParameterList,
        body: FunctionBody,
    ) -> FunctionDeclaration {
        FunctionDeclaration {
            id: self.next_id(),
            return_type,
            property,
            name: self.identifier(name),
            function: self.function_expression(parameters, body),
            span: Self::span(),
        }
    }

    /// Top-level function
    pub fn function(
        &self,
        return_type: Option<TypeName>,
        name: &str,
        parameters: FormalParameterList,
        body: FunctionBody,
    ) -> Declaration {
        Declaration::Function(self.function_declaration(return_type, None, name, parameters, body))
    }

    pub fn top_level_variables(&self, variables: VariableDeclarationList) -> Declaration {
        Declaration::Variables(variables)
    }

    pub fn variable_list(
        &self,
        is_final: bool,
        type_name: Option<TypeName>,
        variables: Vec<VariableDeclaration>,
    ) -> VariableDeclarationList {
        VariableDeclarationList {
            id: self.next_id(),
            is_final,
            is_const: false,
            type_name,
            variables,
            span: Self::span(),
        }
    }

    pub fn variable(&self, name: &str, initializer: Option<Expression>) -> VariableDeclaration {
        VariableDeclaration {
            id: self.next_id(),
            name: self.identifier(name),
            initializer,
        }
    }

    // ===== Class members =====

    pub fn constructor(
        &self,
        class_name: &str,
        name: Option<&str>,
        parameters: FormalParameterList,
        initializers: Vec<ConstructorInitializer>,
    ) -> ClassMember {
        ClassMember::Constructor(ConstructorDeclaration {
            id: self.next_id(),
            is_factory: false,
            is_const: false,
            return_type: self.identifier(class_name),
            name: name.map(|name| self.identifier(name)),
            parameters,
            initializers,
            body: FunctionBody::Empty,
            span: Self::span(),
        })
    }

    pub fn field(
        &self,
        is_static: bool,
        is_final: bool,
        type_name: Option<TypeName>,
        names: &[&str],
    ) -> ClassMember {
        let variables = names.iter().map(|name| self.variable(name, None)).collect();
        ClassMember::Field(FieldDeclaration {
            id: self.next_id(),
            is_static,
            variables: self.variable_list(is_final, type_name, variables),
            span: Self::span(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn method_declaration(
        &self,
        is_static: bool,
        return_type: Option<TypeName>,
        property: Option<PropertyKind>,
        is_operator: bool,
        name: &str,
        parameters: Option<FormalParameterList>,
        body: FunctionBody,
    ) -> ClassMember {
        let is_abstract = matches!(body, FunctionBody::Empty);
        ClassMember::Method(MethodDeclaration {
            id: self.next_id(),
            is_static,
            is_abstract,
            return_type,
            property,
            is_operator,
            name: self.identifier(name),
            parameters,
            body,
            span: Self::span(),
        })
    }

    pub fn method(
        &self,
        return_type: Option<TypeName>,
        name: &str,
        parameters: FormalParameterList,
        body: FunctionBody,
    ) -> ClassMember {
        self.method_declaration(false, return_type, None, false, name, Some(parameters), body)
    }

    pub fn static_method(
        &self,
        return_type: Option<TypeName>,
        name: &str,
        parameters: FormalParameterList,
        body: FunctionBody,
    ) -> ClassMember {
        self.method_declaration(true, return_type, None, false, name, Some(parameters), body)
    }

    pub fn getter(
        &self,
        return_type: Option<TypeName>,
        name: &str,
        body: FunctionBody,
    ) -> ClassMember {
        self.method_declaration(
            false,
            return_type,
            Some(PropertyKind::Get),
            false,
            name,
            None,
            body,
        )
    }

    pub fn setter(
        &self,
        name: &str,
        parameter: FormalParameter,
        body: FunctionBody,
    ) -> ClassMember {
        let parameters = self.parameters(vec![parameter]);
        self.method_declaration(
            false,
            None,
            Some(PropertyKind::Set),
            false,
            name,
            Some(parameters),
            body,
        )
    }

    pub fn operator(
        &self,
        return_type: Option<TypeName>,
        name: &str,
        parameters: FormalParameterList,
        body: FunctionBody,
    ) -> ClassMember {
        self.method_declaration(false, return_type, None, true, name, Some(parameters), body)
    }

    pub fn super_initializer(
        &self,
        name: Option<&str>,
        arguments: Vec<Expression>,
    ) -> ConstructorInitializer {
        ConstructorInitializer::Super {
            id: self.next_id(),
            constructor_name: name.map(|name| self.identifier(name)),
            arguments,
            span: Self::span(),
        }
    }

    pub fn redirecting_initializer(
        &self,
        name: Option<&str>,
        arguments: Vec<Expression>,
    ) -> ConstructorInitializer {
        ConstructorInitializer::Redirecting {
            id: self.next_id(),
            constructor_name: name.map(|name| self.identifier(name)),
            arguments,
            span: Self::span(),
        }
    }

    pub fn field_initializer(&self, field: &str, expression: Expression) -> ConstructorInitializer {
        ConstructorInitializer::Field {
            id: self.next_id(),
            field: self.identifier(field),
            expression,
        }
    }

    // ===== Parameters and bodies =====

    pub fn parameters(&self, parameters: Vec<FormalParameter>) -> FormalParameterList {
        FormalParameterList {
            id: self.next_id(),
            parameters,
        }
    }

    pub fn no_parameters(&self) -> FormalParameterList {
        self.parameters(Vec::new())
    }

    fn parameter(
        &self,
        kind: ParameterKind,
        type_name: Option<TypeName>,
        name: &str,
        default_value: Option<Expression>,
    ) -> FormalParameter {
        FormalParameter {
            id: self.next_id(),
            kind,
            is_field_formal: false,
            type_name,
            name: self.identifier(name),
            default_value,
            span: Self::span(),
        }
    }

    pub fn required_parameter(&self, type_name: Option<TypeName>, name: &str) -> FormalParameter {
        self.parameter(ParameterKind::Required, type_name, name, None)
    }

    pub fn positional_parameter(
        &self,
        type_name: Option<TypeName>,
        name: &str,
        default_value: Option<Expression>,
    ) -> FormalParameter {
        self.parameter(ParameterKind::Positional, type_name, name, default_value)
    }

    pub fn named_parameter(
        &self,
        type_name: Option<TypeName>,
        name: &str,
        default_value: Option<Expression>,
    ) -> FormalParameter {
        self.parameter(ParameterKind::Named, type_name, name, default_value)
    }

    /// `this.name`
    pub fn field_formal_parameter(&self, name: &str) -> FormalParameter {
        FormalParameter {
            is_field_formal: true,
            ..self.parameter(ParameterKind::Required, None, name, None)
        }
    }

    pub fn block(&self, statements: Vec<Statement>) -> Block {
        Block {
            id: self.next_id(),
            statements,
            span: Self::span(),
        }
    }

    pub fn block_body(&self, statements: Vec<Statement>) -> FunctionBody {
        FunctionBody::Block(self.block(statements))
    }

    pub fn expression_body(&self, expression: Expression) -> FunctionBody {
        FunctionBody::Expression(Box::new(expression))
    }

    pub fn function_expression(
        &self,
        parameters: FormalParameterList,
        body: FunctionBody,
    ) -> FunctionExpression {
        FunctionExpression {
            id: self.next_id(),
            parameters,
            body,
            span: Self::span(),
        }
    }

    // ===== Statements =====

    pub fn block_statement(&self, statements: Vec<Statement>) -> Statement {
        Statement::Block(self.block(statements))
    }

    /// `var name = initializer;` or `Type name = initializer;`
    pub fn local_variable(
        &self,
        type_name: Option<TypeName>,
        name: &str,
        initializer: Option<Expression>,
    ) -> Statement {
        let variables = vec![self.variable(name, initializer)];
        Statement::Variables(self.variable_list(false, type_name, variables))
    }

    pub fn local_function(&self, declaration: FunctionDeclaration) -> Statement {
        Statement::Function(declaration)
    }

    pub fn expression_statement(&self, expression: Expression) -> Statement {
        Statement::Expression(expression)
    }

    pub fn return_statement(&self, expression: Option<Expression>) -> Statement {
        Statement::Return {
            id: self.next_id(),
            expression,
            span: Self::span(),
        }
    }

    pub fn if_statement(
        &self,
        condition: Expression,
        then_statement: Statement,
        else_statement: Option<Statement>,
    ) -> Statement {
        Statement::If {
            id: self.next_id(),
            condition,
            then_statement: Box::new(then_statement),
            else_statement: else_statement.map(Box::new),
            span: Self::span(),
        }
    }

    pub fn while_statement(&self, condition: Expression, body: Statement) -> Statement {
        Statement::While {
            id: self.next_id(),
            condition,
            body: Box::new(body),
            span: Self::span(),
        }
    }

    pub fn do_while_statement(&self, body: Statement, condition: Expression) -> Statement {
        Statement::DoWhile {
            id: self.next_id(),
            body: Box::new(body),
            condition,
            span: Self::span(),
        }
    }

    pub fn for_statement(
        &self,
        variables: Option<VariableDeclarationList>,
        condition: Option<Expression>,
        updaters: Vec<Expression>,
        body: Statement,
    ) -> Statement {
        Statement::For {
            id: self.next_id(),
            variables,
            initialization: None,
            condition,
            updaters,
            body: Box::new(body),
            span: Self::span(),
        }
    }

    pub fn for_each_statement(
        &self,
        type_name: Option<TypeName>,
        loop_variable: &str,
        iterable: Expression,
        body: Statement,
    ) -> Statement {
        Statement::ForEach {
            id: self.next_id(),
            type_name,
            loop_variable: self.identifier(loop_variable),
            iterable,
            body: Box::new(body),
            span: Self::span(),
        }
    }

    pub fn switch_statement(
        &self,
        expression: Expression,
        members: Vec<SwitchMember>,
    ) -> Statement {
        Statement::Switch {
            id: self.next_id(),
            expression,
            members,
            span: Self::span(),
        }
    }

    pub fn switch_case(
        &self,
        labels: &[&str],
        expression: Expression,
        statements: Vec<Statement>,
    ) -> SwitchMember {
        SwitchMember {
            id: self.next_id(),
            labels: labels.iter().map(|label| self.identifier(label)).collect(),
            expression: Some(expression),
            statements,
            span: Self::span(),
        }
    }

    pub fn switch_default(&self, labels: &[&str], statements: Vec<Statement>) -> SwitchMember {
        SwitchMember {
            id: self.next_id(),
            labels: labels.iter().map(|label| self.identifier(label)).collect(),
            expression: None,
            statements,
            span: Self::span(),
        }
    }

    pub fn labeled_statement(&self, labels: &[&str], statement: Statement) -> Statement {
        Statement::Labeled {
            id: self.next_id(),
            labels: labels.iter().map(|label| self.identifier(label)).collect(),
            statement: Box::new(statement),
            span: Self::span(),
        }
    }

    pub fn break_statement(&self, label: Option<&str>) -> Statement {
        Statement::Break {
            id: self.next_id(),
            label: label.map(|label| self.identifier(label)),
            span: Self::span(),
        }
    }

    pub fn continue_statement(&self, label: Option<&str>) -> Statement {
        Statement::Continue {
            id: self.next_id(),
            label: label.map(|label| self.identifier(label)),
            span: Self::span(),
        }
    }

    pub fn try_statement(
        &self,
        body: Block,
        catch_clauses: Vec<CatchClause>,
        finally_block: Option<Block>,
    ) -> Statement {
        Statement::Try {
            id: self.next_id(),
            body,
            catch_clauses,
            finally_block,
            span: Self::span(),
        }
    }

    pub fn catch_clause(
        &self,
        exception_type: Option<TypeName>,
        exception_parameter: Option<&str>,
        stack_trace_parameter: Option<&str>,
        body: Block,
    ) -> CatchClause {
        CatchClause {
            id: self.next_id(),
            exception_type,
            exception_parameter: exception_parameter.map(|name| self.identifier(name)),
            stack_trace_parameter: stack_trace_parameter.map(|name| self.identifier(name)),
            body,
            span: Self::span(),
        }
    }

    pub fn empty_statement(&self) -> Statement {
        Statement::Empty {
            id: self.next_id(),
            span: Self::span(),
        }
    }

    // ===== Expressions =====

    pub fn integer(&self, value: i64) -> Expression {
        self.expression(ExpressionKind::Integer(value))
    }

    pub fn double(&self, value: f64) -> Expression {
        self.expression(ExpressionKind::Double(value))
    }

    pub fn boolean(&self, value: bool) -> Expression {
        self.expression(ExpressionKind::Boolean(value))
    }

    pub fn null(&self) -> Expression {
        self.expression(ExpressionKind::Null)
    }

    pub fn string(&self, value: &str) -> Expression {
        self.expression(ExpressionKind::SimpleString(value.to_string()))
    }

    pub fn adjacent_strings(&self, strings: Vec<Expression>) -> Expression {
        self.expression(ExpressionKind::AdjacentStrings(strings))
    }

    pub fn interpolation(&self, elements: Vec<InterpolationElement>) -> Expression {
        self.expression(ExpressionKind::StringInterpolation(elements))
    }

    pub fn list(&self, type_arguments: Vec<TypeName>, elements: Vec<Expression>) -> Expression {
        self.expression(ExpressionKind::List {
            is_const: false,
            type_arguments,
            elements,
        })
    }

    pub fn map(
        &self,
        type_arguments: Vec<TypeName>,
        entries: Vec<(Expression, Expression)>,
    ) -> Expression {
        self.expression(ExpressionKind::Map {
            is_const: false,
            type_arguments,
            entries: entries
                .into_iter()
                .map(|(key, value)| MapEntry { key, value })
                .collect(),
        })
    }

    pub fn identifier_expr(&self, name: &str) -> Expression {
        self.expression(ExpressionKind::Identifier(SmolStr::new(name)))
    }

    pub fn prefixed_identifier(&self, prefix: &str, name: &str) -> Expression {
        self.expression(ExpressionKind::PrefixedIdentifier {
            prefix: self.identifier(prefix),
            identifier: self.identifier(name),
        })
    }

    pub fn property_access(&self, target: Expression, property: &str) -> Expression {
        self.expression(ExpressionKind::PropertyAccess {
            target: Box::new(target),
            property: self.identifier(property),
        })
    }

    pub fn method_invocation(
        &self,
        target: Option<Expression>,
        method_name: &str,
        arguments: Vec<Expression>,
    ) -> Expression {
        self.expression(ExpressionKind::MethodInvocation {
            target: target.map(Box::new),
            method_name: self.identifier(method_name),
            arguments,
        })
    }

    pub fn function_invocation(
        &self,
        function: Expression,
        arguments: Vec<Expression>,
    ) -> Expression {
        self.expression(ExpressionKind::FunctionInvocation {
            function: Box::new(function),
            arguments,
        })
    }

    pub fn instance_creation(
        &self,
        keyword: CreationKeyword,
        type_name: TypeName,
        constructor_name: Option<&str>,
        arguments: Vec<Expression>,
    ) -> Expression {
        let constructor = ConstructorName {
            id: self.next_id(),
            type_name,
            name: constructor_name.map(|name| self.identifier(name)),
            span: Self::span(),
        };
        self.expression(ExpressionKind::InstanceCreation {
            keyword,
            constructor,
            arguments,
        })
    }

    pub fn binary(
        &self,
        left: Expression,
        operator: BinaryOperator,
        right: Expression,
    ) -> Expression {
        self.expression(ExpressionKind::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    pub fn prefix(&self, operator: PrefixOperator, operand: Expression) -> Expression {
        self.expression(ExpressionKind::Prefix {
            operator,
            operand: Box::new(operand),
        })
    }

    pub fn postfix(&self, operand: Expression, operator: PostfixOperator) -> Expression {
        self.expression(ExpressionKind::Postfix {
            operand: Box::new(operand),
            operator,
        })
    }

    pub fn assignment(
        &self,
        left: Expression,
        operator: AssignmentOperator,
        right: Expression,
    ) -> Expression {
        self.expression(ExpressionKind::Assignment {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    pub fn index(&self, target: Expression, index: Expression) -> Expression {
        self.expression(ExpressionKind::Index {
            target: Box::new(target),
            index: Box::new(index),
        })
    }

    pub fn conditional(
        &self,
        condition: Expression,
        then_expression: Expression,
        else_expression: Expression,
    ) -> Expression {
        self.expression(ExpressionKind::Conditional {
            condition: Box::new(condition),
            then_expression: Box::new(then_expression),
            else_expression: Box::new(else_expression),
        })
    }

    pub fn is_expression(
        &self,
        expression: Expression,
        negated: bool,
        type_name: TypeName,
    ) -> Expression {
        self.expression(ExpressionKind::Is {
            expression: Box::new(expression),
            negated,
            type_name,
        })
    }

    pub fn as_expression(&self, expression: Expression, type_name: TypeName) -> Expression {
        self.expression(ExpressionKind::As {
            expression: Box::new(expression),
            type_name,
        })
    }

    pub fn throw(&self, expression: Expression) -> Expression {
        self.expression(ExpressionKind::Throw(Box::new(expression)))
    }

    pub fn rethrow(&self) -> Expression {
        self.expression(ExpressionKind::Rethrow)
    }

    pub fn this(&self) -> Expression {
        self.expression(ExpressionKind::This)
    }

    pub fn super_expression(&self) -> Expression {
        self.expression(ExpressionKind::Super)
    }

    pub fn parenthesized(&self, expression: Expression) -> Expression {
        self.expression(ExpressionKind::Parenthesized(Box::new(expression)))
    }

    pub fn named_expression(&self, name: &str, expression: Expression) -> Expression {
        self.expression(ExpressionKind::Named {
            name: self.identifier(name),
            expression: Box::new(expression),
        })
    }

    pub fn function_literal(
        &self,
        parameters: FormalParameterList,
        body: FunctionBody,
    ) -> Expression {
        self.expression(ExpressionKind::Function(self.function_expression(parameters, body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let f = AstFactory::new();
        let expression = f.binary(f.identifier_expr("a"), BinaryOperator::Plus, f.integer(1));
        let ExpressionKind::Binary { left, right, .. } = &expression.kind else {
            panic!("expected a binary expression");
        };
        assert_ne!(left.id, right.id);
        assert_ne!(expression.id, left.id);
        assert_ne!(expression.id, right.id);
    }

    #[test]
    fn test_starting_at_offsets_ids() {
        let f = AstFactory::starting_at(1000);
        assert_eq!(f.identifier("x").id, NodeId::new(1000));
    }

    #[test]
    fn test_field_formal_parameter() {
        let f = AstFactory::new();
        let parameter = f.field_formal_parameter("x");
        assert!(parameter.is_field_formal);
        assert_eq!(parameter.kind, ParameterKind::Required);
    }
}
