use quill_analyzer_semantic::{AnalysisSession, DeclarationMatcher};
use quill_analyzer_syntax::ast::{
    AssignmentOperator, BinaryOperator, ClassMember, CompilationUnit, Declaration, Expression,
    Statement,
};
use quill_analyzer_syntax::AstFactory;

use crate::*;

/// `int square(int p) => body; class Counter { members } extra`
fn unit(
    f: &AstFactory,
    body: Expression,
    members: Vec<ClassMember>,
    extra: Vec<Declaration>,
) -> CompilationUnit {
    let square = f.function(
        Some(f.type_name("int", vec![])),
        "square",
        f.parameters(vec![f.required_parameter(Some(f.type_name("int", vec![])), "p")]),
        f.expression_body(body),
    );
    let mut declarations = vec![square, f.class("Counter", members)];
    declarations.extend(extra);
    f.compilation_unit(vec![], declarations)
}

fn count(f: &AstFactory) -> ClassMember {
    f.field(false, false, Some(f.type_name("int", vec![])), &["count"])
}

fn tick(f: &AstFactory, statements: Vec<Statement>) -> ClassMember {
    f.method(
        Some(f.type_name("void", vec![])),
        "tick",
        f.no_parameters(),
        f.block_body(statements),
    )
}

fn p_op_p(f: &AstFactory, operator: BinaryOperator) -> Expression {
    f.binary(f.identifier_expr("p"), operator, f.identifier_expr("p"))
}

fn original(f: &AstFactory) -> AnalysisSession {
    let members = vec![count(f), tick(f, vec![])];
    let session = resolve_unit(unit(f, p_op_p(f, BinaryOperator::Plus), members, vec![]));
    assert_no_diagnostics(&session, "main.q");
    session
}

fn matches(session: &AnalysisSession, unit: &CompilationUnit) -> bool {
    let element = session.unit("main.q").expect("unit was resolved").element;
    DeclarationMatcher::new(session.arena()).matches_unit(unit, element)
}

#[test]
fn test_unit_with_rewritten_bodies_matches() {
    let f = AstFactory::new();
    let session = original(&f);

    let g = AstFactory::new();
    let squared = g.binary(
        g.parenthesized(p_op_p(&g, BinaryOperator::Star)),
        BinaryOperator::Plus,
        g.parenthesized(p_op_p(&g, BinaryOperator::Star)),
    );
    let increment = g.expression_statement(g.assignment(
        g.identifier_expr("count"),
        AssignmentOperator::Assign,
        g.binary(g.identifier_expr("count"), BinaryOperator::Plus, g.integer(1)),
    ));
    let edited = unit(&g, squared, vec![count(&g), tick(&g, vec![increment])], vec![]);
    assert!(matches(&session, &edited));
}

#[test]
fn test_unit_with_added_or_removed_declarations_does_not_match() {
    let f = AstFactory::new();
    let session = original(&f);
    let g = AstFactory::new();
    let body = || p_op_p(&g, BinaryOperator::Plus);

    let extra_function = g.function(None, "extra", g.no_parameters(), g.block_body(vec![]));
    let members = vec![count(&g), tick(&g, vec![])];
    let added_top_level = unit(&g, body(), members, vec![extra_function]);
    assert!(!matches(&session, &added_top_level));

    let removed_member = unit(&g, body(), vec![count(&g)], vec![]);
    assert!(!matches(&session, &removed_member));

    let reset = g.method(None, "reset", g.no_parameters(), g.block_body(vec![]));
    let added_member = unit(&g, body(), vec![count(&g), tick(&g, vec![]), reset], vec![]);
    assert!(!matches(&session, &added_member));

    let with_local = tick(&g, vec![g.local_variable(None, "step", Some(g.integer(1)))]);
    let added_local = unit(&g, body(), vec![count(&g), with_local], vec![]);
    assert!(!matches(&session, &added_local));

    let renamed = g.function(
        Some(g.type_name("int", vec![])),
        "cube",
        g.parameters(vec![g.required_parameter(Some(g.type_name("int", vec![])), "p")]),
        g.expression_body(body()),
    );
    let counter = g.class("Counter", vec![count(&g), tick(&g, vec![])]);
    let renamed_function = g.compilation_unit(vec![], vec![renamed, counter]);
    assert!(!matches(&session, &renamed_function));
}
