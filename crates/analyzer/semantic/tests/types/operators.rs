use quill_analyzer_diagnostics::DiagnosticCode;
use quill_analyzer_syntax::ast::BinaryOperator;
use quill_analyzer_syntax::AstFactory;

use super::{main_unit, typed};
use crate::*;

#[test]
fn test_typed_plus_untyped_binds_numeric_addition() {
    let f = AstFactory::new();
    let sum = f.binary(f.identifier_expr("i"), BinaryOperator::Plus, f.identifier_expr("j"));
    let sum_id = sum.id;
    let unit = main_unit(
        &f,
        vec![typed(&f, "int", "i")],
        vec![
            f.local_variable(None, "j", Some(f.integer(2))),
            f.expression_statement(sum),
        ],
    );
    let session = resolve_unit(unit);

    assert_no_diagnostics(&session, "main.q");
    assert_eq!(element_name(&session, "main.q", sum_id).as_deref(), Some("num.+"));
    assert_eq!(static_type(&session, "main.q", sum_id), "num");
    assert_eq!(propagated_type(&session, "main.q", sum_id).as_deref(), Some("int"));
}

#[test]
fn test_untyped_operands_bind_a_propagated_operator() {
    let f = AstFactory::new();
    let sum = f.binary(f.identifier_expr("a"), BinaryOperator::Plus, f.identifier_expr("b"));
    let sum_id = sum.id;
    let unit = main_unit(
        &f,
        vec![],
        vec![
            f.local_variable(None, "a", Some(f.integer(1))),
            f.local_variable(None, "b", Some(f.integer(2))),
            f.expression_statement(sum),
        ],
    );
    let session = resolve_unit(unit);

    assert_no_diagnostics(&session, "main.q");
    let resolution = &session.unit("main.q").expect("unit was resolved").result.resolution;
    assert_eq!(resolution.static_element(sum_id), None);
    let propagated = resolution.propagated_element(sum_id).expect("propagated operator");
    assert_eq!(session.arena().qualified_name(propagated), "num.+");
    assert_eq!(static_type(&session, "main.q", sum_id), "dynamic");
    assert_eq!(propagated_type(&session, "main.q", sum_id).as_deref(), Some("int"));
}

#[test]
fn test_operator_return_types() {
    let f = AstFactory::new();
    let cases = [
        (f.binary(f.identifier_expr("i"), BinaryOperator::Slash, f.identifier_expr("i")), "double"),
        (f.binary(f.identifier_expr("i"), BinaryOperator::TildeSlash, f.integer(2)), "int"),
        (f.binary(f.identifier_expr("i"), BinaryOperator::Star, f.identifier_expr("d")), "double"),
        (f.binary(f.identifier_expr("n"), BinaryOperator::Minus, f.identifier_expr("i")), "num"),
        (f.binary(f.identifier_expr("s"), BinaryOperator::Plus, f.string("!")), "String"),
        (
            f.binary(f.identifier_expr("i"), BinaryOperator::GreaterEq, f.identifier_expr("n")),
            "bool",
        ),
        (f.binary(f.identifier_expr("s"), BinaryOperator::EqEq, f.null()), "bool"),
    ];
    let ids: Vec<_> = cases.iter().map(|(expression, _)| expression.id).collect();
    let expected: Vec<&str> = cases.iter().map(|(_, ty)| *ty).collect();
    let unit = main_unit(
        &f,
        vec![
            typed(&f, "int", "i"),
            typed(&f, "double", "d"),
            typed(&f, "num", "n"),
            typed(&f, "String", "s"),
        ],
        cases
            .into_iter()
            .map(|(expression, _)| f.expression_statement(expression))
            .collect(),
    );
    let session = resolve_unit(unit);

    assert_no_diagnostics(&session, "main.q");
    let types: Vec<String> = ids.iter().map(|id| static_type(&session, "main.q", *id)).collect();
    assert_eq!(types, expected);
}

#[test]
fn test_undefined_operator_on_a_typed_receiver() {
    let f = AstFactory::new();
    let unit = main_unit(
        &f,
        vec![typed(&f, "String", "s")],
        vec![
            f.expression_statement(f.binary(
                f.identifier_expr("s"),
                BinaryOperator::Minus,
                f.integer(1),
            )),
            f.local_variable(None, "untyped", None),
            f.expression_statement(f.binary(
                f.identifier_expr("untyped"),
                BinaryOperator::Minus,
                f.integer(1),
            )),
        ],
    );
    let session = resolve_unit(unit);

    assert_codes(&session, "main.q", &[DiagnosticCode::UndefinedOperator]);
    insta::assert_snapshot!(
        diagnostic_summary(&session, "main.q"),
        @"UndefinedOperator: The operator '-' is not defined for the type 'String'"
    );
}
