use quill_analyzer_diagnostics::DiagnosticCode;
use quill_analyzer_semantic::AnalysisSession;
use quill_analyzer_syntax::ast::{
    AssignmentOperator, BinaryOperator, Declaration, Expression, ExpressionKind,
};
use quill_analyzer_syntax::{AstFactory, NodeId};

use crate::*;

/// `int square(int p) => body;`
fn square(f: &AstFactory, body: Expression) -> Declaration {
    f.function(
        Some(f.type_name("int", vec![])),
        "square",
        f.parameters(vec![f.required_parameter(Some(f.type_name("int", vec![])), "p")]),
        f.expression_body(body),
    )
}

fn p_op_p(f: &AstFactory, operator: BinaryOperator) -> (Expression, NodeId) {
    let read = f.identifier_expr("p");
    let read_id = read.id;
    (f.binary(read, operator, f.identifier_expr("p")), read_id)
}

/// `square(2);` inside `main`, with the node of the `square` name
fn caller(f: &AstFactory) -> (Declaration, NodeId) {
    let call = f.method_invocation(None, "square", vec![f.integer(2)]);
    let ExpressionKind::MethodInvocation { method_name, .. } = &call.kind else {
        unreachable!("factory built a method invocation");
    };
    let callee_id = method_name.id;
    let main = f.function(
        None,
        "main",
        f.no_parameters(),
        f.block_body(vec![f.expression_statement(call)]),
    );
    (main, callee_id)
}

#[test]
fn test_body_edit_keeps_elements() {
    let f = AstFactory::new();
    let (sum, old_read) = p_op_p(&f, BinaryOperator::Plus);
    let (main, callee_id) = caller(&f);
    let unit = f.compilation_unit(vec![], vec![square(&f, sum), main]);
    let mut session = resolve_unit(unit);
    let recorded = |session: &AnalysisSession, node| {
        session
            .unit("main.q")
            .and_then(|unit| unit.result.resolution.static_element(node))
    };
    let parameter = recorded(&session, old_read);
    assert!(parameter.is_some());
    let function = recorded(&session, callee_id);
    assert!(function.is_some());
    assert_eq!(
        element_name(&session, "main.q", callee_id).as_deref(),
        Some("square")
    );

    let (product, new_read) = p_op_p(&f, BinaryOperator::Star);
    let product_id = product.id;
    assert!(session.update_declaration("main.q", 0, square(&f, product)));

    let resolution = &session.unit("main.q").expect("unit was resolved").result.resolution;
    assert_eq!(resolution.static_element(new_read), parameter);
    assert_eq!(resolution.static_element(old_read), None);
    assert_eq!(resolution.static_element(callee_id), function);
    assert_eq!(element_name(&session, "main.q", product_id).as_deref(), Some("num.*"));
    assert_eq!(static_type(&session, "main.q", product_id), "int");
    assert_no_diagnostics(&session, "main.q");
}

#[test]
fn test_incremental_result_matches_a_fresh_resolution() {
    let f = AstFactory::new();
    let (sum, _) = p_op_p(&f, BinaryOperator::Plus);
    let (main, _) = caller(&f);
    let mut session = resolve_unit(f.compilation_unit(vec![], vec![square(&f, sum), main]));
    let nested = f.binary(
        f.parenthesized(p_op_p(&f, BinaryOperator::Star).0),
        BinaryOperator::Plus,
        f.parenthesized(p_op_p(&f, BinaryOperator::Star).0),
    );
    assert!(session.update_declaration("main.q", 0, square(&f, nested)));

    let g = AstFactory::new();
    let nested = g.binary(
        g.parenthesized(p_op_p(&g, BinaryOperator::Star).0),
        BinaryOperator::Plus,
        g.parenthesized(p_op_p(&g, BinaryOperator::Star).0),
    );
    let (main, _) = caller(&g);
    let fresh = resolve_unit(g.compilation_unit(vec![], vec![square(&g, nested), main]));

    let counts = |session: &quill_analyzer_semantic::AnalysisSession| {
        session.unit("main.q").map(|unit| unit.result.resolution.counts())
    };
    assert_eq!(counts(&session), counts(&fresh));
    assert_eq!(codes(&session, "main.q"), codes(&fresh, "main.q"));
}

#[test]
fn test_diagnostics_follow_the_edited_declaration() {
    let f = AstFactory::new();
    let broken = f.binary(f.identifier_expr("p"), BinaryOperator::Plus, f.identifier_expr("q"));
    let (main, _) = caller(&f);
    let unit = f.compilation_unit(
        vec![],
        vec![
            square(&f, broken),
            main,
            f.function(None, "other", f.no_parameters(), f.expression_body(f.identifier_expr("r"))),
        ],
    );
    let mut session = resolve_unit(unit);
    assert_codes(
        &session,
        "main.q",
        &[DiagnosticCode::UndefinedIdentifier, DiagnosticCode::UndefinedIdentifier],
    );

    let (fixed, _) = p_op_p(&f, BinaryOperator::Plus);
    assert!(session.update_declaration("main.q", 0, square(&f, fixed)));
    insta::assert_snapshot!(
        diagnostic_summary(&session, "main.q"),
        @"UndefinedIdentifier: Undefined name 'r'"
    );
}

#[test]
fn test_shape_changes_are_rejected() {
    let f = AstFactory::new();
    let (sum, sum_read) = p_op_p(&f, BinaryOperator::Plus);
    let unit = f.compilation_unit(vec![], vec![square(&f, sum)]);
    let mut session = resolve_unit(unit);

    let retyped = f.function(
        Some(f.type_name("int", vec![])),
        "square",
        f.parameters(vec![f.required_parameter(Some(f.type_name("num", vec![])), "p")]),
        f.expression_body(f.identifier_expr("p")),
    );
    let extra_parameter = f.function(
        Some(f.type_name("int", vec![])),
        "square",
        f.parameters(vec![
            f.required_parameter(Some(f.type_name("int", vec![])), "p"),
            f.positional_parameter(None, "q", None),
        ]),
        f.expression_body(f.identifier_expr("p")),
    );
    let renamed = f.function(
        Some(f.type_name("int", vec![])),
        "cube",
        f.parameters(vec![f.required_parameter(Some(f.type_name("int", vec![])), "p")]),
        f.expression_body(f.identifier_expr("p")),
    );
    let new_local = f.function(
        Some(f.type_name("int", vec![])),
        "square",
        f.parameters(vec![f.required_parameter(Some(f.type_name("int", vec![])), "p")]),
        f.block_body(vec![
            f.local_variable(None, "t", Some(f.identifier_expr("p"))),
            f.return_statement(Some(f.identifier_expr("t"))),
        ]),
    );
    let variable = f.top_level_variables(f.variable_list(
        false,
        None,
        vec![f.variable("square", None)],
    ));

    for declaration in [retyped, extra_parameter, renamed, new_local, variable] {
        assert!(!session.update_declaration("main.q", 0, declaration));
    }
    assert!(static_type(&session, "main.q", sum_read) != "<none>");
    assert!(!session.update_declaration("main.q", 7, square(&f, f.integer(1))));
    assert!(!session.update_declaration("other.q", 0, square(&f, f.integer(1))));
}

#[test]
fn test_locals_are_ignored_when_bodies_are_not_analyzed() {
    let f = AstFactory::new();
    let unit = f.compilation_unit(
        vec![],
        vec![f.function(None, "main", f.no_parameters(), f.block_body(vec![]))],
    );
    let options = quill_analyzer_semantic::AnalysisOptions {
        analyze_function_bodies: false,
        ..Default::default()
    };
    let mut session = project_with_options(vec![("main.q", unit)], options)
        .resolve_library("main.q")
        .expect("main.q resolves");

    let with_local = f.function(
        None,
        "main",
        f.no_parameters(),
        f.block_body(vec![f.local_variable(None, "x", Some(f.integer(1)))]),
    );
    assert!(session.update_declaration("main.q", 0, with_local));
}

#[test]
fn test_resolving_a_declaration_again_reproduces_its_annotations() {
    let f = AstFactory::new();
    let body = f.block_body(vec![
        f.local_variable(None, "total", Some(f.integer(0))),
        f.if_statement(
            f.is_expression(f.identifier_expr("p"), false, f.type_name("int", vec![])),
            f.expression_statement(f.assignment(
                f.identifier_expr("total"),
                AssignmentOperator::Compound(BinaryOperator::Plus),
                f.identifier_expr("p"),
            )),
            None,
        ),
        f.expression_statement(f.identifier_expr("unknown")),
        f.return_statement(Some(f.identifier_expr("total"))),
    ]);
    let function = f.function(
        None,
        "accumulate",
        f.parameters(vec![f.required_parameter(Some(f.type_name("num", vec![])), "p")]),
        body,
    );
    let unit = f.compilation_unit(vec![], vec![function.clone()]);
    let mut session = resolve_unit(unit);
    let before = session.unit("main.q").expect("unit was resolved").result.resolution.clone();
    let diagnostics_before = diagnostic_summary(&session, "main.q");

    assert!(session.update_declaration("main.q", 0, function));

    let after = &session.unit("main.q").expect("unit was resolved").result.resolution;
    assert_eq!(after, &before);
    assert_eq!(diagnostic_summary(&session, "main.q"), diagnostics_before);
    insta::assert_snapshot!(diagnostics_before, @"UndefinedIdentifier: Undefined name 'unknown'");
}
