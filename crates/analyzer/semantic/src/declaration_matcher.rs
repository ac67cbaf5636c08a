//! # Declaration matcher
//!
//! Decides whether a freshly built declaration still has the shape recorded by
//! the elements of its previous version, so that only its bodies need to be
//! resolved again.
//!
//! A shape is a declared name, its kind, and a textual signature (modifiers,
//! declared types, parameter list). Shapes nest: a class contains its members,
//! an executable contains the locals, local functions, closures and labels its
//! body declares. Statements that declare nothing are not part of any shape,
//! so rewriting an expression never breaks a match while adding a parameter
//! or a local does.
//!
//! The signature functions at the bottom of this module are shared with the
//! element builder and the resolver, which store their output on every element
//! they create.

use quill_analyzer_syntax::ast::{
    CatchClause, ClassDeclaration, ClassMember, ClassTypeAlias, CompilationUnit,
    ConstructorDeclaration, ConstructorInitializer, Declaration, FormalParameter,
    FormalParameterList, FunctionDeclaration, FunctionExpression, FunctionTypeAlias,
    MethodDeclaration, ParameterKind, PropertyKind, Statement, TypeName, TypeParameter,
    VariableDeclarationList,
};
use quill_analyzer_syntax::visitor::{
    walk_catch_clause, walk_function_body, walk_function_expression,
    walk_parameter_list, walk_statement, Visitor,
};
use quill_analyzer_syntax::NodeId;
use smol_str::SmolStr;

use crate::element::{setter_name, ElementArena, ElementId, ElementKind};
use crate::resolution::DeclarationRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ShapeKind {
    Class,
    ClassAlias,
    TypeAlias,
    Function,
    Getter,
    Setter,
    Variable,
    Field,
    Method,
    Constructor,
    Local,
    LocalFunction,
    Closure,
    Label,
}

/// A declared name. `A` anchors it: an element on the old side, a node and
/// name offset on the new side.
#[derive(Debug, Clone)]
struct Shape<A> {
    kind: ShapeKind,
    name: SmolStr,
    signature: String,
    anchor: A,
    /// Type parameters, then parameters, in declaration order
    parts: Vec<A>,
    children: Vec<Shape<A>>,
}

type NodeAnchor = (NodeId, usize);

/// Old elements paired with the nodes that now declare them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rebinding {
    /// `(element, declaring node, name offset)`
    pub pairs: Vec<(ElementId, NodeId, usize)>,
}

impl Rebinding {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

pub struct DeclarationMatcher<'a> {
    arena: &'a ElementArena,
    compare_locals: bool,
}

impl<'a> DeclarationMatcher<'a> {
    pub const fn new(arena: &'a ElementArena) -> Self {
        Self {
            arena,
            compare_locals: true,
        }
    }

    /// Whether locals declared in bodies take part in the comparison. They
    /// must not when bodies were never resolved, since no local elements
    /// exist then.
    pub const fn with_locals(mut self, compare_locals: bool) -> Self {
        self.compare_locals = compare_locals;
        self
    }

    /// Whether `declaration` has the shape recorded by `previous`, the
    /// elements built for the declaration it replaces
    pub fn matches(&self, declaration: DeclarationRef<'_>, previous: &[ElementId]) -> bool {
        self.match_declaration(declaration, previous).is_some()
    }

    /// Pairs every element in `previous` (and below) with its new declaring
    /// node, or `None` when the shapes differ
    pub fn match_declaration(
        &self,
        declaration: DeclarationRef<'_>,
        previous: &[ElementId],
    ) -> Option<Rebinding> {
        let new = match declaration {
            DeclarationRef::TopLevel(declaration) => self.declaration_shapes(declaration),
            DeclarationRef::Member { member, .. } => self.member_shapes(member),
        };
        let old: Vec<Shape<ElementId>> = previous
            .iter()
            .filter_map(|element| self.element_shape(*element))
            .collect();
        let mut rebinding = Rebinding::default();
        if match_lists(old, &new, &mut rebinding) {
            Some(rebinding)
        } else {
            tracing::debug!(
                declaration = ?declaration.id(),
                "declaration shape changed"
            );
            None
        }
    }

    /// Whether every top-level declaration of `unit` matches the declarations
    /// recorded on `unit_element` one-to-one
    pub fn matches_unit(&self, unit: &CompilationUnit, unit_element: ElementId) -> bool {
        let Some(data) = self.arena[unit_element].as_unit() else {
            return false;
        };
        let previous: Vec<ElementId> = data
            .types
            .iter()
            .chain(&data.function_type_aliases)
            .chain(&data.functions)
            .chain(&data.accessors)
            .chain(&data.top_level_variables)
            .copied()
            .collect();
        let new: Vec<Shape<NodeAnchor>> = unit
            .declarations
            .iter()
            .flat_map(|declaration| self.declaration_shapes(declaration))
            .collect();
        let old: Vec<Shape<ElementId>> = previous
            .iter()
            .filter_map(|element| self.element_shape(*element))
            .collect();
        match_lists(old, &new, &mut Rebinding::default())
    }

    // ===== Shapes of the previous version =====

    fn element_shape(&self, id: ElementId) -> Option<Shape<ElementId>> {
        let element = &self.arena[id];
        if element.is_synthetic() {
            return None;
        }
        let kind = match &element.kind {
            ElementKind::Class(data) if data.is_mixin_application => ShapeKind::ClassAlias,
            ElementKind::Class(_) => ShapeKind::Class,
            ElementKind::FunctionTypeAlias(_) => ShapeKind::TypeAlias,
            ElementKind::Function(_) => {
                let enclosing = element.enclosing.map(|enclosing| &self.arena[enclosing].kind);
                match enclosing {
                    Some(ElementKind::CompilationUnit(_)) => ShapeKind::Function,
                    _ if element.name.is_empty() => ShapeKind::Closure,
                    _ => ShapeKind::LocalFunction,
                }
            }
            ElementKind::PropertyAccessor(accessor) if accessor.is_getter => ShapeKind::Getter,
            ElementKind::PropertyAccessor(_) => ShapeKind::Setter,
            ElementKind::TopLevelVariable(_) => ShapeKind::Variable,
            ElementKind::Field(_) => ShapeKind::Field,
            ElementKind::LocalVariable(_) => ShapeKind::Local,
            ElementKind::Method(_) => ShapeKind::Method,
            ElementKind::Constructor(_) => ShapeKind::Constructor,
            ElementKind::Label(_) => ShapeKind::Label,
            _ => return None,
        };
        let parts = self
            .arena
            .type_parameters_of(id)
            .iter()
            .chain(self.arena.parameters_of(id))
            .copied()
            .collect();
        let mut children = Vec::new();
        if let Some(class) = element.as_class() {
            for member in class
                .fields
                .iter()
                .chain(&class.accessors)
                .chain(&class.methods)
                .chain(&class.constructors)
            {
                children.extend(self.element_shape(*member));
            }
        } else if let Some(executable) = element.as_executable() {
            if self.compare_locals {
                let mut locals: Vec<ElementId> = executable
                    .local_variables
                    .iter()
                    .chain(&executable.functions)
                    .chain(&executable.labels)
                    .copied()
                    .collect();
                locals.sort();
                children.extend(locals.into_iter().filter_map(|local| self.element_shape(local)));
            }
        }
        Some(Shape {
            kind,
            name: element.name.clone(),
            signature: element.signature.clone().unwrap_or_default(),
            anchor: id,
            parts,
            children,
        })
    }

    // ===== Shapes of the new version =====

    fn declaration_shapes(&self, declaration: &Declaration) -> Vec<Shape<NodeAnchor>> {
        match declaration {
            Declaration::Class(class) => vec![Shape {
                kind: ShapeKind::Class,
                name: class.name.name.clone(),
                signature: class_signature(class),
                anchor: (class.id, class.name.span.start),
                parts: type_parameter_anchors(&class.type_parameters),
                children: class
                    .members
                    .iter()
                    .flat_map(|member| self.member_shapes(member))
                    .collect(),
            }],
            Declaration::ClassTypeAlias(alias) => vec![Shape {
                kind: ShapeKind::ClassAlias,
                name: alias.name.name.clone(),
                signature: class_alias_signature(alias),
                anchor: (alias.id, alias.name.span.start),
                parts: type_parameter_anchors(&alias.type_parameters),
                children: Vec::new(),
            }],
            Declaration::FunctionTypeAlias(alias) => {
                let mut parts = type_parameter_anchors(&alias.type_parameters);
                parts.extend(parameter_anchors(&alias.parameters));
                vec![Shape {
                    kind: ShapeKind::TypeAlias,
                    name: alias.name.name.clone(),
                    signature: function_type_alias_signature(alias),
                    anchor: (alias.id, alias.name.span.start),
                    parts,
                    children: Vec::new(),
                }]
            }
            Declaration::Function(function) => {
                let (kind, name) = match function.property {
                    Some(PropertyKind::Get) => (ShapeKind::Getter, function.name.name.clone()),
                    Some(PropertyKind::Set) => {
                        (ShapeKind::Setter, setter_name(&function.name.name))
                    }
                    None => (ShapeKind::Function, function.name.name.clone()),
                };
                vec![Shape {
                    kind,
                    name,
                    signature: function_signature(function),
                    anchor: (function.id, function.name.span.start),
                    parts: parameter_anchors(&function.function.parameters),
                    children: self.body_shapes(|collector| {
                        collector.function_contents(&function.function);
                    }),
                }]
            }
            Declaration::Variables(list) => variable_shapes(ShapeKind::Variable, list, false),
        }
    }

    fn member_shapes(&self, member: &ClassMember) -> Vec<Shape<NodeAnchor>> {
        match member {
            ClassMember::Field(field) => {
                variable_shapes(ShapeKind::Field, &field.variables, field.is_static)
            }
            ClassMember::Method(method) => {
                let (kind, name) = match method.property {
                    Some(PropertyKind::Get) => (ShapeKind::Getter, method.name.name.clone()),
                    Some(PropertyKind::Set) => (ShapeKind::Setter, setter_name(&method.name.name)),
                    None => (ShapeKind::Method, method_element_name(method)),
                };
                vec![Shape {
                    kind,
                    name,
                    signature: method_signature(method),
                    anchor: (method.id, method.name.span.start),
                    parts: method
                        .parameters
                        .as_ref()
                        .map(parameter_anchors)
                        .unwrap_or_default(),
                    children: self.body_shapes(|collector| {
                        if let Some(parameters) = &method.parameters {
                            walk_parameter_list(collector, parameters);
                        }
                        walk_function_body(collector, &method.body);
                    }),
                }]
            }
            ClassMember::Constructor(constructor) => vec![Shape {
                kind: ShapeKind::Constructor,
                name: constructor
                    .name
                    .as_ref()
                    .map(|name| name.name.clone())
                    .unwrap_or_default(),
                signature: constructor_signature(constructor),
                anchor: (
                    constructor.id,
                    constructor
                        .name
                        .as_ref()
                        .map_or(constructor.return_type.span.start, |name| name.span.start),
                ),
                parts: parameter_anchors(&constructor.parameters),
                children: self.body_shapes(|collector| collector.constructor_contents(constructor)),
            }],
        }
    }

    fn body_shapes(&self, walk: impl FnOnce(&mut LocalCollector)) -> Vec<Shape<NodeAnchor>> {
        if !self.compare_locals {
            return Vec::new();
        }
        let mut collector = LocalCollector::default();
        walk(&mut collector);
        collector.finish()
    }
}

/// Pairs old shapes with new ones: same kind, name and signature, nested
/// shapes matching recursively. Every shape on either side must be used once.
fn match_lists(
    old: Vec<Shape<ElementId>>,
    new: &[Shape<NodeAnchor>],
    rebinding: &mut Rebinding,
) -> bool {
    if old.len() != new.len() {
        return false;
    }
    let mut remaining: Vec<Option<Shape<ElementId>>> = old.into_iter().map(Some).collect();
    for shape in new {
        let position = remaining.iter().position(|candidate| {
            candidate.as_ref().is_some_and(|candidate| {
                candidate.kind == shape.kind
                    && candidate.name == shape.name
                    && candidate.signature == shape.signature
                    && candidate.parts.len() == shape.parts.len()
            })
        });
        let Some(previous) = position.and_then(|position| remaining[position].take()) else {
            return false;
        };
        let (node, offset) = shape.anchor;
        rebinding.pairs.push((previous.anchor, node, offset));
        for (element, (node, offset)) in previous.parts.iter().zip(&shape.parts) {
            rebinding.pairs.push((*element, *node, *offset));
        }
        if !match_lists(previous.children, &shape.children, rebinding) {
            return false;
        }
    }
    true
}

fn variable_shapes(
    kind: ShapeKind,
    list: &VariableDeclarationList,
    is_static: bool,
) -> Vec<Shape<NodeAnchor>> {
    let signature = variable_signature(list, is_static);
    list.variables
        .iter()
        .map(|variable| Shape {
            kind,
            name: variable.name.name.clone(),
            signature: signature.clone(),
            anchor: (variable.id, variable.name.span.start),
            parts: Vec::new(),
            children: Vec::new(),
        })
        .collect()
}

fn type_parameter_anchors(parameters: &[TypeParameter]) -> Vec<NodeAnchor> {
    parameters
        .iter()
        .map(|parameter| (parameter.id, parameter.name.span.start))
        .collect()
}

fn parameter_anchors(parameters: &FormalParameterList) -> Vec<NodeAnchor> {
    parameters
        .parameters
        .iter()
        .map(|parameter| (parameter.id, parameter.name.span.start))
        .collect()
}

/// Collects the declarations made inside bodies, nesting them under the local
/// function or closure that declares them.
#[derive(Default)]
struct LocalCollector {
    frames: Vec<Vec<Shape<NodeAnchor>>>,
    current: Vec<Shape<NodeAnchor>>,
}

impl LocalCollector {
    fn finish(self) -> Vec<Shape<NodeAnchor>> {
        self.current
    }

    fn push(&mut self, kind: ShapeKind, name: &SmolStr, signature: String, anchor: NodeAnchor) {
        self.current.push(Shape {
            kind,
            name: name.clone(),
            signature,
            anchor,
            parts: Vec::new(),
            children: Vec::new(),
        });
    }

    fn enter(&mut self) {
        self.frames.push(std::mem::take(&mut self.current));
    }

    fn exit(&mut self) -> Vec<Shape<NodeAnchor>> {
        let children = std::mem::take(&mut self.current);
        self.current = self.frames.pop().unwrap_or_default();
        children
    }

    fn function_contents(&mut self, function: &FunctionExpression) {
        walk_parameter_list(self, &function.parameters);
        walk_function_body(self, &function.body);
    }

    fn constructor_contents(&mut self, constructor: &ConstructorDeclaration) {
        walk_parameter_list(self, &constructor.parameters);
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
        walk_function_body(self, &constructor.body);
    }

    fn local_function(&mut self, function: &FunctionDeclaration) {
        self.enter();
        self.function_contents(&function.function);
        let children = self.exit();
        self.current.push(Shape {
            kind: ShapeKind::LocalFunction,
            name: function.name.name.clone(),
            signature: function_signature(function),
            anchor: (function.id, function.name.span.start),
            parts: parameter_anchors(&function.function.parameters),
            children,
        });
    }
}

impl<'ast> Visitor<'ast> for LocalCollector {
    fn visit_statement(&mut self, statement: &'ast Statement) {
        match statement {
            Statement::Function(function) => self.local_function(function),
            Statement::ForEach {
                type_name,
                loop_variable,
                ..
            } => {
                self.push(
                    ShapeKind::Local,
                    &loop_variable.name,
                    loop_variable_signature(type_name.as_ref()),
                    (loop_variable.id, loop_variable.span.start),
                );
                walk_statement(self, statement);
            }
            Statement::Labeled { labels, .. } => {
                for label in labels {
                    self.push(
                        ShapeKind::Label,
                        &label.name,
                        label_signature(false),
                        (label.id, label.span.start),
                    );
                }
                walk_statement(self, statement);
            }
            Statement::Switch { members, .. } => {
                for label in members.iter().flat_map(|member| &member.labels) {
                    self.push(
                        ShapeKind::Label,
                        &label.name,
                        label_signature(true),
                        (label.id, label.span.start),
                    );
                }
                walk_statement(self, statement);
            }
            _ => walk_statement(self, statement),
        }
    }

    fn visit_variable_list(&mut self, list: &'ast VariableDeclarationList) {
        let signature = variable_signature(list, false);
        for variable in &list.variables {
            if let Some(initializer) = &variable.initializer {
                self.visit_expression(initializer);
            }
            self.push(
                ShapeKind::Local,
                &variable.name.name,
                signature.clone(),
                (variable.id, variable.name.span.start),
            );
        }
    }

    fn visit_catch_clause(&mut self, clause: &'ast CatchClause) {
        if let Some(parameter) = &clause.exception_parameter {
            self.push(
                ShapeKind::Local,
                &parameter.name,
                exception_parameter_signature(clause),
                (parameter.id, parameter.span.start),
            );
        }
        if let Some(parameter) = &clause.stack_trace_parameter {
            self.push(
                ShapeKind::Local,
                &parameter.name,
                stack_trace_parameter_signature(),
                (parameter.id, parameter.span.start),
            );
        }
        walk_catch_clause(self, clause);
    }

    fn visit_function_expression(&mut self, function: &'ast FunctionExpression) {
        self.enter();
        walk_function_expression(self, function);
        let children = self.exit();
        self.current.push(Shape {
            kind: ShapeKind::Closure,
            name: SmolStr::default(),
            signature: closure_signature(function),
            anchor: (function.id, function.span.start),
            parts: parameter_anchors(&function.parameters),
            children,
        });
    }

    fn visit_formal_parameter(&mut self, parameter: &'ast FormalParameter) {
        if let Some(default_value) = &parameter.default_value {
            self.visit_expression(default_value);
        }
    }
}

// ===== Signatures =====

fn optional_type(type_name: Option<&TypeName>) -> String {
    type_name.map_or_else(String::new, |type_name| format!("{type_name} "))
}

fn push_type_list(signature: &mut String, keyword: &str, types: &[TypeName]) {
    if types.is_empty() {
        return;
    }
    let types: Vec<String> = types.iter().map(ToString::to_string).collect();
    signature.push_str(keyword);
    signature.push_str(&types.join(", "));
}

pub(crate) fn type_parameters_signature(parameters: &[TypeParameter]) -> String {
    if parameters.is_empty() {
        return String::new();
    }
    let parameters: Vec<String> = parameters
        .iter()
        .map(|parameter| match &parameter.bound {
            Some(bound) => format!("{} extends {bound}", parameter.name.name),
            None => parameter.name.name.to_string(),
        })
        .collect();
    format!("<{}>", parameters.join(", "))
}

fn parameter_signature(parameter: &FormalParameter) -> String {
    let mut text = optional_type(parameter.type_name.as_ref());
    if parameter.is_field_formal {
        text.push_str("this.");
    }
    text.push_str(&parameter.name.name);
    if parameter.default_value.is_some() {
        text.push_str(" = _");
    }
    match parameter.kind {
        ParameterKind::Required => text,
        ParameterKind::Positional => format!("[{text}]"),
        ParameterKind::Named => format!("{{{text}}}"),
    }
}

pub(crate) fn parameters_signature(parameters: &FormalParameterList) -> String {
    let parameters: Vec<String> = parameters.parameters.iter().map(parameter_signature).collect();
    format!("({})", parameters.join(", "))
}

pub(crate) fn class_signature(class: &ClassDeclaration) -> String {
    let mut signature = String::new();
    if class.is_abstract {
        signature.push_str("abstract ");
    }
    signature.push_str("class");
    signature.push_str(&type_parameters_signature(&class.type_parameters));
    if let Some(extends) = &class.extends {
        signature.push_str(&format!(" extends {extends}"));
    }
    push_type_list(&mut signature, " with ", &class.with);
    push_type_list(&mut signature, " implements ", &class.implements);
    signature
}

pub(crate) fn class_alias_signature(alias: &ClassTypeAlias) -> String {
    let mut signature = String::new();
    if alias.is_abstract {
        signature.push_str("abstract ");
    }
    signature.push_str("class");
    signature.push_str(&type_parameters_signature(&alias.type_parameters));
    signature.push_str(&format!(" = {}", alias.superclass));
    push_type_list(&mut signature, " with ", &alias.with);
    push_type_list(&mut signature, " implements ", &alias.implements);
    signature
}

pub(crate) fn function_type_alias_signature(alias: &FunctionTypeAlias) -> String {
    format!(
        "typedef {}{}{}",
        optional_type(alias.return_type.as_ref()),
        type_parameters_signature(&alias.type_parameters),
        parameters_signature(&alias.parameters)
    )
}

fn property_keyword(property: Option<PropertyKind>) -> &'static str {
    match property {
        Some(PropertyKind::Get) => "get ",
        Some(PropertyKind::Set) => "set ",
        None => "",
    }
}

/// Top-level and local functions and accessors
pub(crate) fn function_signature(function: &FunctionDeclaration) -> String {
    format!(
        "{}{}{}",
        optional_type(function.return_type.as_ref()),
        property_keyword(function.property),
        parameters_signature(&function.function.parameters)
    )
}

pub(crate) fn closure_signature(function: &FunctionExpression) -> String {
    parameters_signature(&function.parameters)
}

pub(crate) fn method_signature(method: &MethodDeclaration) -> String {
    let mut signature = String::new();
    if method.is_static {
        signature.push_str("static ");
    }
    if method.is_abstract {
        signature.push_str("abstract ");
    }
    signature.push_str(&optional_type(method.return_type.as_ref()));
    signature.push_str(property_keyword(method.property));
    if method.is_operator {
        signature.push_str("operator ");
    }
    if let Some(parameters) = &method.parameters {
        signature.push_str(&parameters_signature(parameters));
    }
    signature
}

pub(crate) fn constructor_signature(constructor: &ConstructorDeclaration) -> String {
    let mut signature = String::new();
    if constructor.is_factory {
        signature.push_str("factory ");
    }
    if constructor.is_const {
        signature.push_str("const ");
    }
    signature.push_str(&parameters_signature(&constructor.parameters));
    signature
}

/// Shared by every variable of a list: fields, top-level and local variables
pub(crate) fn variable_signature(list: &VariableDeclarationList, is_static: bool) -> String {
    let mut signature = String::new();
    if is_static {
        signature.push_str("static ");
    }
    if list.is_final {
        signature.push_str("final ");
    }
    if list.is_const {
        signature.push_str("const ");
    }
    match &list.type_name {
        Some(type_name) => signature.push_str(&type_name.to_string()),
        None => signature.push_str("var"),
    }
    signature
}

pub(crate) fn loop_variable_signature(type_name: Option<&TypeName>) -> String {
    type_name.map_or_else(|| "var".to_string(), ToString::to_string)
}

pub(crate) fn exception_parameter_signature(clause: &CatchClause) -> String {
    match &clause.exception_type {
        Some(exception_type) => format!("on {exception_type}"),
        None => "catch".to_string(),
    }
}

pub(crate) fn stack_trace_parameter_signature() -> String {
    "stack trace".to_string()
}

pub(crate) fn label_signature(on_switch_member: bool) -> String {
    let signature = if on_switch_member { "case" } else { "label" };
    signature.to_string()
}

/// Name a method is stored under: unary minus becomes `unary-`
pub(crate) fn method_element_name(method: &MethodDeclaration) -> SmolStr {
    let takes_no_parameters = method
        .parameters
        .as_ref()
        .map_or(true, |parameters| parameters.parameters.is_empty());
    if method.is_operator && method.name.name == "-" && takes_no_parameters {
        SmolStr::new_static("unary-")
    } else {
        method.name.name.clone()
    }
}

/// Nodes that declare the elements of `declaration` itself (not of its
/// members or locals)
pub fn declaring_nodes(declaration: DeclarationRef<'_>) -> Vec<NodeId> {
    let variables = |list: &VariableDeclarationList| -> Vec<NodeId> {
        list.variables.iter().map(|variable| variable.id).collect()
    };
    match declaration {
        DeclarationRef::TopLevel(Declaration::Variables(list)) => variables(list),
        DeclarationRef::TopLevel(declaration) => vec![declaration.id()],
        DeclarationRef::Member {
            member: ClassMember::Field(field),
            ..
        } => variables(&field.variables),
        DeclarationRef::Member { member, .. } => vec![member.id()],
    }
}
