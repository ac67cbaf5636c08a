use quill_analyzer_semantic::AnalysisOptions;
use quill_analyzer_syntax::ast::{BinaryOperator, PrefixOperator};
use quill_analyzer_syntax::AstFactory;

use super::{main_unit, resolve_with, typed};
use crate::*;

#[test]
fn test_early_return_narrows_the_rest_of_the_body() {
    let f = AstFactory::new();
    let before = f.identifier_expr("p");
    let after = f.identifier_expr("p");
    let (before_id, after_id) = (before.id, after.id);
    let is_string = f.is_expression(f.identifier_expr("p"), false, f.type_name("String", vec![]));
    let unit = main_unit(
        &f,
        vec![typed(&f, "Object", "p")],
        vec![
            f.expression_statement(before),
            f.if_statement(
                f.prefix(PrefixOperator::Bang, f.parenthesized(is_string)),
                f.return_statement(None),
                None,
            ),
            f.expression_statement(after),
        ],
    );
    let session = resolve_unit(unit);

    assert_no_diagnostics(&session, "main.q");
    assert_eq!(propagated_type(&session, "main.q", before_id), None);
    assert_eq!(static_type(&session, "main.q", after_id), "Object");
    assert_eq!(propagated_type(&session, "main.q", after_id).as_deref(), Some("String"));
}

#[test]
fn test_negated_check_narrows_the_else_branch() {
    let f = AstFactory::new();
    let then_read = f.identifier_expr("p");
    let else_read = f.identifier_expr("p");
    let (then_id, else_id) = (then_read.id, else_read.id);
    let unit = main_unit(
        &f,
        vec![typed(&f, "num", "p")],
        vec![f.if_statement(
            f.is_expression(f.identifier_expr("p"), true, f.type_name("int", vec![])),
            f.expression_statement(then_read),
            Some(f.expression_statement(else_read)),
        )],
    );
    let session = resolve_unit(unit);

    assert_eq!(propagated_type(&session, "main.q", then_id), None);
    assert_eq!(propagated_type(&session, "main.q", else_id).as_deref(), Some("int"));
}

#[test]
fn test_conjunction_narrows_its_right_operand() {
    let f = AstFactory::new();
    let right = f.identifier_expr("p");
    let right_id = right.id;
    let conjunction = f.binary(
        f.is_expression(f.identifier_expr("p"), false, f.type_name("String", vec![])),
        BinaryOperator::AmpAmp,
        right,
    );
    let conjunction_id = conjunction.id;
    let unit = main_unit(
        &f,
        vec![typed(&f, "Object", "p")],
        vec![f.expression_statement(conjunction)],
    );
    let session = resolve_unit(unit);

    assert_eq!(static_type(&session, "main.q", conjunction_id), "bool");
    assert_eq!(propagated_type(&session, "main.q", right_id).as_deref(), Some("String"));
}

#[test]
fn test_narrowing_ends_with_its_branch() {
    let f = AstFactory::new();
    let inside = f.identifier_expr("p");
    let outside = f.identifier_expr("p");
    let (inside_id, outside_id) = (inside.id, outside.id);
    let unit = main_unit(
        &f,
        vec![typed(&f, "Object", "p")],
        vec![
            f.if_statement(
                f.is_expression(f.identifier_expr("p"), false, f.type_name("int", vec![])),
                f.block_statement(vec![f.expression_statement(inside)]),
                None,
            ),
            f.expression_statement(outside),
        ],
    );
    let session = resolve_unit(unit);

    assert_eq!(propagated_type(&session, "main.q", inside_id).as_deref(), Some("int"));
    assert_eq!(propagated_type(&session, "main.q", outside_id), None);
}

#[test]
fn test_disabled_propagation_records_static_types_only() {
    let f = AstFactory::new();
    let read = f.identifier_expr("x");
    let narrowed = f.identifier_expr("p");
    let (read_id, narrowed_id) = (read.id, narrowed.id);
    let unit = main_unit(
        &f,
        vec![typed(&f, "Object", "p")],
        vec![
            f.local_variable(None, "x", Some(f.integer(1))),
            f.expression_statement(read),
            f.if_statement(
                f.is_expression(f.identifier_expr("p"), false, f.type_name("String", vec![])),
                f.expression_statement(narrowed),
                None,
            ),
        ],
    );
    let options = AnalysisOptions {
        enable_type_propagation: false,
        ..AnalysisOptions::default()
    };
    let session = resolve_with(unit, options);

    assert_eq!(static_type(&session, "main.q", read_id), "dynamic");
    assert_eq!(propagated_type(&session, "main.q", read_id), None);
    assert_eq!(static_type(&session, "main.q", narrowed_id), "Object");
    assert_eq!(propagated_type(&session, "main.q", narrowed_id), None);
}
