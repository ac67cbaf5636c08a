use quill_analyzer_diagnostics::DiagnosticCode;
use quill_analyzer_syntax::AstFactory;

use super::{main_unit, typed};
use crate::*;

#[test]
fn test_conditional_is_typed_by_the_least_upper_bound() {
    let f = AstFactory::new();
    let mixed = f.conditional(f.identifier_expr("c"), f.integer(1), f.double(2.0));
    let same = f.conditional(f.identifier_expr("c"), f.integer(1), f.integer(2));
    let unrelated = f.conditional(f.identifier_expr("c"), f.integer(1), f.string("two"));
    let ids = [mixed.id, same.id, unrelated.id];
    let unit = main_unit(
        &f,
        vec![typed(&f, "bool", "c")],
        vec![
            f.expression_statement(mixed),
            f.expression_statement(same),
            f.expression_statement(unrelated),
        ],
    );
    let session = resolve_unit(unit);

    assert_no_diagnostics(&session, "main.q");
    let types: Vec<String> = ids.iter().map(|id| static_type(&session, "main.q", *id)).collect();
    assert_eq!(types, vec!["num", "int", "Object"]);
}

#[test]
fn test_branches_of_a_type_check_see_the_narrowing() {
    let f = AstFactory::new();
    let narrowed = f.identifier_expr("p");
    let narrowed_id = narrowed.id;
    let conditional = f.conditional(
        f.is_expression(f.identifier_expr("p"), false, f.type_name("String", vec![])),
        narrowed,
        f.string("none"),
    );
    let conditional_id = conditional.id;
    let unit = main_unit(
        &f,
        vec![typed(&f, "Object", "p")],
        vec![f.expression_statement(conditional)],
    );
    let session = resolve_unit(unit);

    assert_eq!(propagated_type(&session, "main.q", narrowed_id).as_deref(), Some("String"));
    assert_eq!(static_type(&session, "main.q", conditional_id), "Object");
    assert_eq!(propagated_type(&session, "main.q", conditional_id).as_deref(), Some("String"));
}

#[test]
fn test_non_bool_condition_keeps_the_then_type() {
    let f = AstFactory::new();
    let conditional = f.conditional(f.integer(1), f.string("a"), f.integer(2));
    let conditional_id = conditional.id;
    let unit = main_unit(&f, vec![], vec![f.expression_statement(conditional)]);
    let session = resolve_unit(unit);

    assert_eq!(static_type(&session, "main.q", conditional_id), "String");
    assert_codes(&session, "main.q", &[DiagnosticCode::NonBoolCondition]);
    insta::assert_snapshot!(
        diagnostic_summary(&session, "main.q"),
        @"NonBoolCondition: Conditions must have a static type of 'bool'"
    );
}
