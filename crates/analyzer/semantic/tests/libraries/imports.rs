use quill_analyzer_diagnostics::DiagnosticCode;
use quill_analyzer_syntax::ast::{CompilationUnit, Declaration, Directive, Expression};
use quill_analyzer_syntax::{AstFactory, NodeId};

use crate::*;

/// `int name;`
fn int_variable(f: &AstFactory, name: &str) -> Declaration {
    f.top_level_variables(f.variable_list(
        false,
        Some(f.type_name("int", vec![])),
        vec![f.variable(name, None)],
    ))
}

/// `main() { expression; }` with the id of `expression`
fn reading(
    f: &AstFactory,
    directives: Vec<Directive>,
    expression: Expression,
) -> (CompilationUnit, NodeId) {
    let id = expression.id;
    let unit = f.compilation_unit(
        directives,
        vec![f.function(
            None,
            "main",
            f.no_parameters(),
            f.block_body(vec![f.expression_statement(expression)]),
        )],
    );
    (unit, id)
}

#[test]
fn test_core_is_imported_implicitly() {
    let f = AstFactory::new();
    let (main, _) = reading(&f, vec![f.import_directive("util.q", None, vec![])], f.integer(1));
    let util = f.compilation_unit(vec![], vec![int_variable(&f, "value")]);
    let session = resolve(vec![("main.q", main), ("util.q", util)]);

    let main_library = session.library("main.q").expect("main library");
    let util_library = session.library("util.q").expect("util library");
    let core = session.arena().core().library();
    assert_eq!(session.imported_libraries(main_library), vec![util_library, core]);
    assert_eq!(session.imported_libraries(util_library), vec![core]);
    assert_eq!(session.transitive_imports(main_library), vec![util_library, core]);

    let data = session.arena()[main_library].as_library().expect("library data");
    assert!(!data.explicitly_imports_core);
    let order: Vec<&str> = session.libraries().map(|(uri, _)| uri).collect();
    assert_eq!(order, vec!["util.q", "main.q"]);
}

#[test]
fn test_explicit_core_import_replaces_the_implicit_one() {
    let f = AstFactory::new();
    let (main, print_id) = reading(
        &f,
        vec![f.import_directive("quill:core", None, vec![f.show(&["print"])])],
        f.method_invocation(None, "print", vec![f.string("hi")]),
    );
    let session = resolve(vec![("main.q", main)]);

    assert_no_diagnostics(&session, "main.q");
    let library = session.library("main.q").expect("library");
    let data = session.arena()[library].as_library().expect("library data");
    assert!(data.explicitly_imports_core);
    assert_eq!(data.imports.len(), 1);
    assert_eq!(static_type(&session, "main.q", print_id), "void");
}

#[test]
fn test_prefixed_imports() {
    let f = AstFactory::new();
    let prefixed = f.prefixed_identifier("u", "value");
    let prefixed_id = prefixed.id;
    let unprefixed = f.identifier_expr("value");
    let unprefixed_id = unprefixed.id;
    let main = f.compilation_unit(
        vec![f.import_directive("util.q", Some("u"), vec![])],
        vec![f.function(
            None,
            "main",
            f.no_parameters(),
            f.block_body(vec![
                f.expression_statement(prefixed),
                f.expression_statement(unprefixed),
            ]),
        )],
    );
    let util = f.compilation_unit(vec![], vec![int_variable(&f, "value")]);
    let session = resolve(vec![("main.q", main), ("util.q", util)]);

    assert_codes(&session, "main.q", &[DiagnosticCode::UndefinedIdentifier]);
    assert_eq!(static_type(&session, "main.q", prefixed_id), "int");
    assert_eq!(element_name(&session, "main.q", unprefixed_id), None);
    let library = session.library("main.q").expect("library");
    let data = session.arena()[library].as_library().expect("library data");
    assert_eq!(data.prefixes.len(), 1);
    assert_eq!(session.arena()[data.prefixes[0]].name, "u");
}

#[test]
fn test_combinators_filter_imported_names() {
    let f = AstFactory::new();
    let shown = f.identifier_expr("shown");
    let hidden = f.identifier_expr("hidden");
    let (shown_id, hidden_id) = (shown.id, hidden.id);
    let main = f.compilation_unit(
        vec![f.import_directive("util.q", None, vec![f.hide(&["hidden"])])],
        vec![f.function(
            None,
            "main",
            f.no_parameters(),
            f.block_body(vec![f.expression_statement(shown), f.expression_statement(hidden)]),
        )],
    );
    let util = f.compilation_unit(
        vec![],
        vec![int_variable(&f, "shown"), int_variable(&f, "hidden")],
    );
    let session = resolve(vec![("main.q", main), ("util.q", util)]);

    assert_eq!(static_type(&session, "main.q", shown_id), "int");
    assert_eq!(element_name(&session, "main.q", hidden_id), None);
    insta::assert_snapshot!(
        diagnostic_summary(&session, "main.q"),
        @"UndefinedIdentifier: Undefined name 'hidden'"
    );
}

#[test]
fn test_exports_are_visible_to_importers() {
    let f = AstFactory::new();
    let (main, read_id) = reading(
        &f,
        vec![f.import_directive("api.q", None, vec![])],
        f.identifier_expr("value"),
    );
    let api = f.compilation_unit(vec![f.export_directive("impl.q", vec![])], vec![]);
    let implementation = f.compilation_unit(vec![], vec![int_variable(&f, "value")]);
    let session = resolve(vec![("main.q", main), ("api.q", api), ("impl.q", implementation)]);

    assert_no_diagnostics(&session, "main.q");
    assert_eq!(element_name(&session, "main.q", read_id).as_deref(), Some("value"));
    let element = session
        .unit("main.q")
        .and_then(|unit| unit.result.resolution.static_element(read_id));
    let implementation_library = session.library("impl.q");
    assert_eq!(
        element.and_then(|element| session.arena().library_of(element)),
        implementation_library
    );
}

#[test]
fn test_ambiguous_and_shadowed_imports() {
    let f = AstFactory::new();
    let (main, read_id) = reading(
        &f,
        vec![f.import_directive("a.q", None, vec![]), f.import_directive("b.q", None, vec![])],
        f.identifier_expr("shared"),
    );
    let a = f.compilation_unit(vec![], vec![int_variable(&f, "shared")]);
    let b = f.compilation_unit(vec![], vec![int_variable(&f, "shared")]);
    let session = resolve(vec![("main.q", main), ("a.q", a), ("b.q", b)]);

    assert_eq!(element_name(&session, "main.q", read_id), None);
    insta::assert_snapshot!(
        diagnostic_summary(&session, "main.q"),
        @"AmbiguousImport: The name 'shared' is defined in more than one imported library"
    );

    let g = AstFactory::new();
    let read = g.identifier_expr("shared");
    let read_id = read.id;
    let main = g.compilation_unit(
        vec![g.import_directive("a.q", None, vec![]), g.import_directive("b.q", None, vec![])],
        vec![
            int_variable(&g, "shared"),
            g.function(None, "main", g.no_parameters(), g.expression_body(read)),
        ],
    );
    let a = g.compilation_unit(vec![], vec![int_variable(&g, "shared")]);
    let b = g.compilation_unit(vec![], vec![int_variable(&g, "shared")]);
    let session = resolve(vec![("main.q", main), ("a.q", a), ("b.q", b)]);

    assert_no_diagnostics(&session, "main.q");
    let element = session
        .unit("main.q")
        .and_then(|unit| unit.result.resolution.static_element(read_id))
        .expect("resolved");
    assert_eq!(session.arena().library_of(element), session.library("main.q"));
}

#[test]
fn test_user_declarations_win_over_core_names() {
    let f = AstFactory::new();
    let (main, read_id) = reading(
        &f,
        vec![f.import_directive("util.q", None, vec![])],
        f.identifier_expr("print"),
    );
    let util = f.compilation_unit(vec![], vec![int_variable(&f, "print")]);
    let session = resolve(vec![("main.q", main), ("util.q", util)]);

    assert_no_diagnostics(&session, "main.q");
    assert_eq!(static_type(&session, "main.q", read_id), "int");
}

#[test]
fn test_import_cycles_resolve_together() {
    let f = AstFactory::new();
    let (main, read_id) = reading(
        &f,
        vec![f.import_directive("peer.q", None, vec![])],
        f.identifier_expr("fromPeer"),
    );
    let peer = f.compilation_unit(
        vec![f.import_directive("main.q", None, vec![])],
        vec![f.function(
            Some(f.type_name("int", vec![])),
            "fromPeer",
            f.no_parameters(),
            f.expression_body(f.method_invocation(None, "main", vec![])),
        )],
    );
    let session = resolve(vec![("main.q", main), ("peer.q", peer)]);

    assert_no_diagnostics(&session, "main.q");
    assert_no_diagnostics(&session, "peer.q");
    assert_eq!(element_name(&session, "main.q", read_id).as_deref(), Some("fromPeer"));
    let main_library = session.library("main.q").expect("main library");
    let peer_library = session.library("peer.q").expect("peer library");
    assert!(session.transitive_imports(peer_library).contains(&main_library));
}
