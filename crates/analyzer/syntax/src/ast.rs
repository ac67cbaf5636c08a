//! # Quill AST
//!
//! The syntax tree consumed by the resolver. The tree is produced by an
//! external parser (or by [`crate::AstFactory`] in tests) and is never mutated
//! by analysis: every resolution result is recorded in side tables keyed by the
//! [`NodeId`] each annotatable node carries.
//!
//! Node kinds form closed enums so that every resolution pass is an exhaustive
//! `match`; adding a node kind fails to compile until each pass handles it.

use chumsky::span::SimpleSpan;
use smol_str::SmolStr;
use std::fmt;

index_vec::define_index_type! {
    /// Identity of a syntax node within the tree that produced it.
    pub struct NodeId = u32;

    MAX_INDEX = u32::MAX as usize;
}

pub type Span = SimpleSpan<usize>;

/// A simple identifier (e.g., `foo`, `List`, `outer`)
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub id: NodeId,
    pub name: SmolStr,
    pub span: Span,
}

/// A (possibly prefixed, possibly parameterized) reference to a type
/// (e.g., `int`, `List<String>`, `core.Map<K, V>`)
#[derive(Debug, Clone, PartialEq)]
pub struct TypeName {
    pub id: NodeId,
    /// Import prefix, for `prefix.Name`
    pub prefix: Option<Identifier>,
    pub name: Identifier,
    pub arguments: Vec<TypeName>,
    pub span: Span,
}

impl TypeName {
    /// The name as written, without type arguments (`p.Foo` or `Foo`)
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}.{}", prefix.name, self.name.name),
            None => self.name.name.to_string(),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name())?;
        if !self.arguments.is_empty() {
            write!(f, "<")?;
            for (i, argument) in self.arguments.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{argument}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

/// A type parameter declaration (e.g., `E`, `T extends num`)
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParameter {
    pub id: NodeId,
    pub name: Identifier,
    pub bound: Option<TypeName>,
}

/// One compilation unit: the contents of a single source.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    pub id: NodeId,
    pub directives: Vec<Directive>,
    pub declarations: Vec<Declaration>,
    pub span: Span,
}

impl CompilationUnit {
    /// The `part of` directive, when this unit is a part
    pub fn part_of(&self) -> Option<&PartOfDirective> {
        self.directives.iter().find_map(|directive| match directive {
            Directive::PartOf(part_of) => Some(part_of),
            _ => None,
        })
    }

    /// The `library` directive, if any
    pub fn library_directive(&self) -> Option<&LibraryDirective> {
        self.directives.iter().find_map(|directive| match directive {
            Directive::Library(library) => Some(library),
            _ => None,
        })
    }
}

/// Directives at the head of a compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// `library a.b;`
    Library(LibraryDirective),
    /// `import 'uri' as p show A hide B;`
    Import(ImportDirective),
    /// `export 'uri' show A;`
    Export(ExportDirective),
    /// `part 'uri';`
    Part(PartDirective),
    /// `part of a.b;`
    PartOf(PartOfDirective),
}

impl Directive {
    pub fn id(&self) -> NodeId {
        match self {
            Self::Library(node) => node.id,
            Self::Import(node) => node.id,
            Self::Export(node) => node.id,
            Self::Part(node) => node.id,
            Self::PartOf(node) => node.id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Library(node) => node.span,
            Self::Import(node) => node.span,
            Self::Export(node) => node.span,
            Self::Part(node) => node.span,
            Self::PartOf(node) => node.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryDirective {
    pub id: NodeId,
    /// Dotted library name, stored joined (e.g., `app.util`)
    pub name: Identifier,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDirective {
    pub id: NodeId,
    /// Must evaluate to a constant string
    pub uri: Expression,
    pub prefix: Option<Identifier>,
    pub combinators: Vec<Combinator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportDirective {
    pub id: NodeId,
    pub uri: Expression,
    pub combinators: Vec<Combinator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartDirective {
    pub id: NodeId,
    pub uri: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartOfDirective {
    pub id: NodeId,
    pub library_name: Identifier,
    pub span: Span,
}

/// Import/export namespace filters
#[derive(Debug, Clone, PartialEq)]
pub enum Combinator {
    Show(Vec<Identifier>),
    Hide(Vec<Identifier>),
}

/// Top-level declarations of a compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Class(ClassDeclaration),
    /// `class A = B with M implements I;`
    ClassTypeAlias(ClassTypeAlias),
    /// `typedef int Compare(a, b);`
    FunctionTypeAlias(FunctionTypeAlias),
    Function(FunctionDeclaration),
    Variables(VariableDeclarationList),
}

impl Declaration {
    pub fn id(&self) -> NodeId {
        match self {
            Self::Class(node) => node.id,
            Self::ClassTypeAlias(node) => node.id,
            Self::FunctionTypeAlias(node) => node.id,
            Self::Function(node) => node.id,
            Self::Variables(node) => node.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDeclaration {
    pub id: NodeId,
    pub is_abstract: bool,
    pub name: Identifier,
    pub type_parameters: Vec<TypeParameter>,
    pub extends: Option<TypeName>,
    pub with: Vec<TypeName>,
    pub implements: Vec<TypeName>,
    pub members: Vec<ClassMember>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassTypeAlias {
    pub id: NodeId,
    pub is_abstract: bool,
    pub name: Identifier,
    pub type_parameters: Vec<TypeParameter>,
    pub superclass: TypeName,
    pub with: Vec<TypeName>,
    pub implements: Vec<TypeName>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionTypeAlias {
    pub id: NodeId,
    pub return_type: Option<TypeName>,
    pub name: Identifier,
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: FormalParameterList,
    pub span: Span,
}

/// Whether a function or method is a getter or a setter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Get,
    Set,
}

/// A top-level or local function (e.g., `int f(x) => x;`, `get answer => 42;`)
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub id: NodeId,
    pub return_type: Option<TypeName>,
    pub property: Option<PropertyKind>,
    pub name: Identifier,
    pub function: FunctionExpression,
    pub span: Span,
}

/// Members of a class body.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassMember {
    Constructor(ConstructorDeclaration),
    Field(FieldDeclaration),
    Method(MethodDeclaration),
}

impl ClassMember {
    pub fn id(&self) -> NodeId {
        match self {
            Self::Constructor(node) => node.id,
            Self::Field(node) => node.id,
            Self::Method(node) => node.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDeclaration {
    pub id: NodeId,
    pub is_factory: bool,
    pub is_const: bool,
    /// The class name written before the constructor name
    pub return_type: Identifier,
    /// `None` for the unnamed constructor
    pub name: Option<Identifier>,
    pub parameters: FormalParameterList,
    pub initializers: Vec<ConstructorInitializer>,
    pub body: FunctionBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstructorInitializer {
    /// `: x = 0`
    Field {
        id: NodeId,
        field: Identifier,
        expression: Expression,
    },
    /// `: super.named(args)` or `: super(args)`
    Super {
        id: NodeId,
        constructor_name: Option<Identifier>,
        arguments: Vec<Expression>,
        span: Span,
    },
    /// `: this.other(args)`
    Redirecting {
        id: NodeId,
        constructor_name: Option<Identifier>,
        arguments: Vec<Expression>,
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDeclaration {
    pub id: NodeId,
    pub is_static: bool,
    pub variables: VariableDeclarationList,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDeclaration {
    pub id: NodeId,
    pub is_static: bool,
    pub is_abstract: bool,
    pub return_type: Option<TypeName>,
    pub property: Option<PropertyKind>,
    pub is_operator: bool,
    pub name: Identifier,
    /// `None` for getters
    pub parameters: Option<FormalParameterList>,
    pub body: FunctionBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarationList {
    pub id: NodeId,
    pub is_final: bool,
    pub is_const: bool,
    pub type_name: Option<TypeName>,
    pub variables: Vec<VariableDeclaration>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub id: NodeId,
    pub name: Identifier,
    pub initializer: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormalParameterList {
    pub id: NodeId,
    pub parameters: Vec<FormalParameter>,
}

/// How an argument binds to a formal parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    Required,
    /// `[x]`
    Positional,
    /// `{x}`
    Named,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormalParameter {
    pub id: NodeId,
    pub kind: ParameterKind,
    /// `this.x` initializing formal
    pub is_field_formal: bool,
    pub type_name: Option<TypeName>,
    pub name: Identifier,
    pub default_value: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    /// Abstract or external: no body at all
    Empty,
    Block(Block),
    /// `=> expression`
    Expression(Box<Expression>),
}

/// A function literal; also the parameters-plus-body of a function declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpression {
    pub id: NodeId,
    pub parameters: FormalParameterList,
    pub body: FunctionBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: NodeId,
    pub statements: Vec<Statement>,
    pub span: Span,
}

/// Represents a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Block(Block),
    /// Local variable declaration (e.g., `var x = 1;`, `int y;`)
    Variables(VariableDeclarationList),
    /// Local function declaration
    Function(FunctionDeclaration),
    /// Expression used as a statement (e.g., `foo();`)
    Expression(Expression),
    Return {
        id: NodeId,
        expression: Option<Expression>,
        span: Span,
    },
    If {
        id: NodeId,
        condition: Expression,
        then_statement: Box<Statement>,
        else_statement: Option<Box<Statement>>,
        span: Span,
    },
    While {
        id: NodeId,
        condition: Expression,
        body: Box<Statement>,
        span: Span,
    },
    DoWhile {
        id: NodeId,
        body: Box<Statement>,
        condition: Expression,
        span: Span,
    },
    /// `for (init; condition; updaters) body`
    For {
        id: NodeId,
        variables: Option<VariableDeclarationList>,
        initialization: Option<Expression>,
        condition: Option<Expression>,
        updaters: Vec<Expression>,
        body: Box<Statement>,
        span: Span,
    },
    /// `for (T x in iterable) body`
    ForEach {
        id: NodeId,
        type_name: Option<TypeName>,
        loop_variable: Identifier,
        iterable: Expression,
        body: Box<Statement>,
        span: Span,
    },
    Switch {
        id: NodeId,
        expression: Expression,
        members: Vec<SwitchMember>,
        span: Span,
    },
    /// `outer: while (true) { ... }`
    Labeled {
        id: NodeId,
        labels: Vec<Identifier>,
        statement: Box<Statement>,
        span: Span,
    },
    Break {
        id: NodeId,
        label: Option<Identifier>,
        span: Span,
    },
    Continue {
        id: NodeId,
        label: Option<Identifier>,
        span: Span,
    },
    Try {
        id: NodeId,
        body: Block,
        catch_clauses: Vec<CatchClause>,
        finally_block: Option<Block>,
        span: Span,
    },
    Empty {
        id: NodeId,
        span: Span,
    },
}

/// `case e:` (expression present) or `default:` (expression absent)
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchMember {
    pub id: NodeId,
    pub labels: Vec<Identifier>,
    pub expression: Option<Expression>,
    pub statements: Vec<Statement>,
    pub span: Span,
}

/// `on T catch (e, s) { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub id: NodeId,
    pub exception_type: Option<TypeName>,
    pub exception_parameter: Option<Identifier>,
    pub stack_trace_parameter: Option<Identifier>,
    pub body: Block,
    pub span: Span,
}

/// Binary operators, including the short-circuiting logical ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Star,
    Slash,
    TildeSlash,
    Percent,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    EqEq,
    BangEq,
    AmpAmp,
    BarBar,
    Amp,
    Bar,
    Caret,
    ShiftLeft,
    ShiftRight,
}

impl BinaryOperator {
    pub const fn lexeme(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::TildeSlash => "~/",
            Self::Percent => "%",
            Self::Less => "<",
            Self::LessEq => "<=",
            Self::Greater => ">",
            Self::GreaterEq => ">=",
            Self::EqEq => "==",
            Self::BangEq => "!=",
            Self::AmpAmp => "&&",
            Self::BarBar => "||",
            Self::Amp => "&",
            Self::Bar => "|",
            Self::Caret => "^",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
        }
    }

    /// Operators a class may declare a method for. `!=` is dispatched
    /// through `==`; `&&` and `||` are not methods.
    pub const fn is_user_definable(self) -> bool {
        !matches!(self, Self::BangEq | Self::AmpAmp | Self::BarBar)
    }

    pub const fn is_logical(self) -> bool {
        matches!(self, Self::AmpAmp | Self::BarBar)
    }

    pub const fn is_relational(self) -> bool {
        matches!(
            self,
            Self::Less | Self::LessEq | Self::Greater | Self::GreaterEq
        )
    }

    pub const fn is_equality(self) -> bool {
        matches!(self, Self::EqEq | Self::BangEq)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefixOperator {
    /// `!`
    Bang,
    /// `-`
    Minus,
    /// `~`
    Tilde,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
}

impl PrefixOperator {
    pub const fn lexeme(self) -> &'static str {
        match self {
            Self::Bang => "!",
            Self::Minus => "-",
            Self::Tilde => "~",
            Self::PlusPlus => "++",
            Self::MinusMinus => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostfixOperator {
    PlusPlus,
    MinusMinus,
}

impl PostfixOperator {
    pub const fn lexeme(self) -> &'static str {
        match self {
            Self::PlusPlus => "++",
            Self::MinusMinus => "--",
        }
    }
}

/// `=` or a compound form such as `+=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentOperator {
    Assign,
    Compound(BinaryOperator),
}

impl AssignmentOperator {
    pub fn lexeme(self) -> String {
        match self {
            Self::Assign => "=".to_string(),
            Self::Compound(op) => format!("{}=", op.lexeme()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreationKeyword {
    New,
    Const,
}

/// `Type` or `Type.named` in an instance creation
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorName {
    pub id: NodeId,
    pub type_name: TypeName,
    pub name: Option<Identifier>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub key: Expression,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterpolationElement {
    Text(String),
    Expression(Expression),
}

/// Represents an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub id: NodeId,
    pub kind: ExpressionKind,
    pub span: Span,
}

/// The closed set of expression forms.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    /// Integer literal (e.g., `42`)
    Integer(i64),
    /// Floating point literal (e.g., `4.2`)
    Double(f64),
    Boolean(bool),
    Null,
    /// Single string literal without interpolation (e.g., `'abc'`)
    SimpleString(String),
    /// `'a' 'b'`
    AdjacentStrings(Vec<Expression>),
    /// `'a $b ${c}'`
    StringInterpolation(Vec<InterpolationElement>),
    /// `<E>[a, b]`
    List {
        is_const: bool,
        type_arguments: Vec<TypeName>,
        elements: Vec<Expression>,
    },
    /// `<K, V>{k: v}`
    Map {
        is_const: bool,
        type_arguments: Vec<TypeName>,
        entries: Vec<MapEntry>,
    },
    /// A simple identifier used as an expression
    Identifier(SmolStr),
    /// `a.b` where `a` is a simple identifier (an import prefix, a class or a variable)
    PrefixedIdentifier {
        prefix: Identifier,
        identifier: Identifier,
    },
    /// `expr.name` where `expr` is not a simple identifier
    PropertyAccess {
        target: Box<Expression>,
        property: Identifier,
    },
    /// `m(args)` or `target.m(args)`
    MethodInvocation {
        target: Option<Box<Expression>>,
        method_name: Identifier,
        arguments: Vec<Expression>,
    },
    /// `(expr)(args)`
    FunctionInvocation {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
    /// `new C.named(args)`
    InstanceCreation {
        keyword: CreationKeyword,
        constructor: ConstructorName,
        arguments: Vec<Expression>,
    },
    Binary {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    Prefix {
        operator: PrefixOperator,
        operand: Box<Expression>,
    },
    Postfix {
        operand: Box<Expression>,
        operator: PostfixOperator,
    },
    Assignment {
        left: Box<Expression>,
        operator: AssignmentOperator,
        right: Box<Expression>,
    },
    /// `target[index]`, read or written depending on context
    Index {
        target: Box<Expression>,
        index: Box<Expression>,
    },
    Conditional {
        condition: Box<Expression>,
        then_expression: Box<Expression>,
        else_expression: Box<Expression>,
    },
    /// `e is T` / `e is! T`
    Is {
        expression: Box<Expression>,
        negated: bool,
        type_name: TypeName,
    },
    /// `e as T`
    As {
        expression: Box<Expression>,
        type_name: TypeName,
    },
    Throw(Box<Expression>),
    Rethrow,
    This,
    Super,
    Parenthesized(Box<Expression>),
    /// `name: expr` inside an argument list
    Named {
        name: Identifier,
        expression: Box<Expression>,
    },
    Function(FunctionExpression),
}

impl Expression {
    /// Value of a string literal that needs no evaluation. Interpolations and
    /// non-string expressions have none.
    pub fn string_value(&self) -> Option<String> {
        match &self.kind {
            ExpressionKind::SimpleString(value) => Some(value.clone()),
            ExpressionKind::AdjacentStrings(strings) => {
                let mut value = String::new();
                for string in strings {
                    value.push_str(&string.string_value()?);
                }
                Some(value)
            }
            _ => None,
        }
    }

    /// Strips any number of enclosing parentheses
    pub fn unparenthesized(&self) -> &Self {
        let mut expression = self;
        while let ExpressionKind::Parenthesized(inner) = &expression.kind {
            expression = inner;
        }
        expression
    }
}
