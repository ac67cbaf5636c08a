use quill_analyzer_diagnostics::DiagnosticCode;
use quill_analyzer_semantic::AnalysisSession;
use quill_analyzer_syntax::ast::{ClassMember, Declaration};
use quill_analyzer_syntax::AstFactory;

use crate::*;

fn class(
    f: &AstFactory,
    name: &str,
    extends: Option<&str>,
    implements: &[&str],
    members: Vec<ClassMember>,
) -> Declaration {
    Declaration::Class(f.class_declaration(
        name,
        vec![],
        extends.map(|superclass| f.type_name(superclass, vec![])),
        vec![],
        implements.iter().map(|interface| f.type_name(interface, vec![])).collect(),
        members,
    ))
}

fn void_method(f: &AstFactory, name: &str) -> ClassMember {
    f.method(Some(f.type_name("void", vec![])), name, f.no_parameters(), f.block_body(vec![]))
}

fn lookup(session: &mut AnalysisSession, class: &str, name: &str) -> Option<String> {
    let class = class_named(session, "main.q", class);
    session
        .lookup_in_hierarchy(class, name)
        .map(|member| session.arena().qualified_name(member))
}

#[test]
fn test_superclass_members_are_found_through_the_chain() {
    let f = AstFactory::new();
    let unit = f.compilation_unit(
        vec![],
        vec![
            class(
                &f,
                "A",
                None,
                &[],
                vec![
                    void_method(&f, "m"),
                    f.static_method(None, "s", f.no_parameters(), f.block_body(vec![])),
                    f.field(false, false, Some(f.type_name("int", vec![])), &["x"]),
                ],
            ),
            class(&f, "B", Some("A"), &[], vec![]),
            class(&f, "C", Some("B"), &[], vec![void_method(&f, "n")]),
        ],
    );
    let mut session = resolve_unit(unit);
    assert_no_diagnostics(&session, "main.q");

    assert_eq!(lookup(&mut session, "C", "m").as_deref(), Some("A.m"));
    assert_eq!(lookup(&mut session, "C", "n").as_deref(), Some("C.n"));
    assert_eq!(lookup(&mut session, "C", "x").as_deref(), Some("A.x"));
    assert_eq!(lookup(&mut session, "C", "x=").as_deref(), Some("A.x="));
    assert_eq!(lookup(&mut session, "C", "toString").as_deref(), Some("Object.toString"));
    assert_eq!(lookup(&mut session, "B", "s"), None);
    assert_eq!(lookup(&mut session, "B", "missing"), None);
}

#[test]
fn test_mixins_and_interfaces_contribute_members() {
    let f = AstFactory::new();
    let unit = f.compilation_unit(
        vec![],
        vec![
            class(&f, "A", None, &[], vec![void_method(&f, "m")]),
            class(&f, "M", None, &[], vec![void_method(&f, "m")]),
            class(&f, "I", None, &[], vec![void_method(&f, "i")]),
            Declaration::Class(f.class_declaration(
                "C",
                vec![],
                Some(f.type_name("A", vec![])),
                vec![f.type_name("M", vec![])],
                vec![f.type_name("I", vec![])],
                vec![],
            )),
        ],
    );
    let mut session = resolve_unit(unit);
    assert_no_diagnostics(&session, "main.q");

    assert_eq!(lookup(&mut session, "C", "m").as_deref(), Some("M.m"));
    assert_eq!(lookup(&mut session, "C", "i").as_deref(), Some("I.i"));
}

#[test]
fn test_conflicting_interfaces_are_reported() {
    let f = AstFactory::new();
    let unit = f.compilation_unit(
        vec![],
        vec![
            class(
                &f,
                "I",
                None,
                &[],
                vec![f.method(
                    Some(f.type_name("int", vec![])),
                    "m",
                    f.no_parameters(),
                    f.block_body(vec![]),
                )],
            ),
            class(
                &f,
                "J",
                None,
                &[],
                vec![f.method(
                    Some(f.type_name("String", vec![])),
                    "m",
                    f.no_parameters(),
                    f.block_body(vec![]),
                )],
            ),
            class(&f, "C", None, &["I", "J"], vec![]),
        ],
    );
    let mut session = resolve_unit(unit);

    assert_eq!(lookup(&mut session, "C", "m"), None);
    assert_codes(&session, "main.q", &[DiagnosticCode::InconsistentMethodInheritance]);
    insta::assert_snapshot!(
        diagnostic_summary(&session, "main.q"),
        @"InconsistentMethodInheritance: 'C' inherits conflicting definitions of 'm' from its interfaces"
    );
}

#[test]
fn test_own_declaration_settles_an_interface_conflict() {
    let f = AstFactory::new();
    let unit = f.compilation_unit(
        vec![],
        vec![
            class(&f, "I", None, &[], vec![void_method(&f, "m")]),
            class(&f, "J", None, &[], vec![void_method(&f, "m")]),
            class(&f, "C", None, &["I", "J"], vec![void_method(&f, "m")]),
        ],
    );
    let mut session = resolve_unit(unit);

    assert_no_diagnostics(&session, "main.q");
    assert_eq!(lookup(&mut session, "C", "m").as_deref(), Some("C.m"));
}

#[test]
fn test_member_shared_through_two_interfaces_is_not_a_conflict() {
    let f = AstFactory::new();
    let unit = f.compilation_unit(
        vec![],
        vec![
            class(&f, "K", None, &[], vec![void_method(&f, "k")]),
            class(&f, "I", None, &["K"], vec![]),
            class(&f, "J", None, &["K"], vec![]),
            class(&f, "C", None, &["I", "J"], vec![]),
        ],
    );
    let mut session = resolve_unit(unit);

    assert_no_diagnostics(&session, "main.q");
    assert_eq!(lookup(&mut session, "C", "k").as_deref(), Some("K.k"));
}

#[test]
fn test_override_in_a_subinterface_wins() {
    let f = AstFactory::new();
    let unit = f.compilation_unit(
        vec![],
        vec![
            class(&f, "I", None, &[], vec![void_method(&f, "m")]),
            class(&f, "J", Some("I"), &[], vec![void_method(&f, "m")]),
            class(&f, "C", None, &["I", "J"], vec![]),
        ],
    );
    let mut session = resolve_unit(unit);

    assert_no_diagnostics(&session, "main.q");
    assert_eq!(lookup(&mut session, "C", "m").as_deref(), Some("J.m"));
}

#[test]
fn test_cyclic_hierarchy_lookups_terminate() {
    let f = AstFactory::new();
    let unit = f.compilation_unit(
        vec![],
        vec![
            class(&f, "A", Some("B"), &[], vec![]),
            class(&f, "B", Some("A"), &[], vec![void_method(&f, "m")]),
            class(&f, "C", Some("C"), &["C"], vec![]),
        ],
    );
    let mut session = resolve_unit(unit);

    assert_eq!(lookup(&mut session, "A", "m").as_deref(), Some("B.m"));
    assert_eq!(lookup(&mut session, "B", "m").as_deref(), Some("B.m"));
    assert_eq!(lookup(&mut session, "A", "missing"), None);
    assert_eq!(lookup(&mut session, "C", "missing"), None);
}

#[test]
fn test_cyclic_interface_lookups_ignore_declaration_order() {
    for b_first in [false, true] {
        let f = AstFactory::new();
        let a = class(&f, "A", None, &["B"], vec![]);
        let b = class(&f, "B", None, &["A"], vec![void_method(&f, "foo")]);
        let declarations = if b_first { vec![b, a] } else { vec![a, b] };
        let mut session = resolve_unit(f.compilation_unit(vec![], declarations));

        assert_eq!(
            lookup(&mut session, "A", "foo").as_deref(),
            Some("B.foo"),
            "B first: {b_first}"
        );
        assert_eq!(
            lookup(&mut session, "B", "foo").as_deref(),
            Some("B.foo"),
            "B first: {b_first}"
        );
        assert_eq!(lookup(&mut session, "A", "missing"), None);
    }
}
