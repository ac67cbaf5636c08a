use quill_analyzer_diagnostics::DiagnosticCode;
use quill_analyzer_syntax::ast::{ClassMember, Expression};
use quill_analyzer_syntax::AstFactory;

use crate::*;

/// `int m() => body;`
fn m(f: &AstFactory, body: Expression) -> ClassMember {
    f.method(Some(f.type_name("int", vec![])), "m", f.no_parameters(), f.expression_body(body))
}

#[test]
fn test_member_edit_keeps_the_class_intact() {
    let f = AstFactory::new();
    let unit = f.compilation_unit(
        vec![],
        vec![f.class(
            "A",
            vec![
                m(&f, f.identifier_expr("missing")),
                f.field(false, false, Some(f.type_name("int", vec![])), &["count"]),
            ],
        )],
    );
    let mut session = resolve_unit(unit);
    assert_codes(&session, "main.q", &[DiagnosticCode::UndefinedIdentifier]);
    let class = class_named(&session, "main.q", "A");
    let method = session.lookup_in_hierarchy(class, "m");

    let read = f.identifier_expr("count");
    let read_id = read.id;
    assert!(session.update_member("main.q", 0, 0, m(&f, read)));

    assert_no_diagnostics(&session, "main.q");
    assert_eq!(session.lookup_in_hierarchy(class, "m"), method);
    assert_eq!(element_name(&session, "main.q", read_id).as_deref(), Some("A.count"));
    assert_eq!(static_type(&session, "main.q", read_id), "int");
}

#[test]
fn test_member_shape_changes_are_rejected() {
    let f = AstFactory::new();
    let unit = f.compilation_unit(
        vec![],
        vec![
            f.function(None, "main", f.no_parameters(), f.block_body(vec![])),
            f.class("A", vec![m(&f, f.integer(1))]),
        ],
    );
    let mut session = resolve_unit(unit);

    let getter = f.getter(Some(f.type_name("int", vec![])), "m", f.expression_body(f.integer(1)));
    let static_method = f.static_method(
        Some(f.type_name("int", vec![])),
        "m",
        f.no_parameters(),
        f.expression_body(f.integer(1)),
    );
    assert!(!session.update_member("main.q", 1, 0, getter));
    assert!(!session.update_member("main.q", 1, 0, static_method));
    assert!(!session.update_member("main.q", 0, 0, m(&f, f.integer(2))));
    assert!(!session.update_member("main.q", 1, 3, m(&f, f.integer(2))));
    assert!(session.update_member("main.q", 1, 0, m(&f, f.integer(2))));
}
