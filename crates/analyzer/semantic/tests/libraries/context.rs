use quill_analyzer_semantic::{AnalysisContext, AnalysisOptions};
use quill_analyzer_syntax::{line_column, SourceFile};
use quill_analyzer_syntax::AstFactory;

use crate::*;

#[test]
fn test_modification_stamps_reach_unit_elements() {
    let f = AstFactory::new();
    let mut context = AnalysisContext::new();
    context.add_source("main.q", "", f.compilation_unit(vec![], vec![]));
    assert!(context.set_contents("main.q", "int a;", f.compilation_unit(vec![], vec![])));
    let unit = f.compilation_unit(
        vec![],
        vec![f.top_level_variables(f.variable_list(false, None, vec![f.variable("b", None)]))],
    );
    assert!(context.set_contents("main.q", "var b;", unit));

    let session = context.resolve_library("main.q").expect("main.q resolves");
    let element = session.unit("main.q").expect("unit was resolved").element;
    let data = session.arena()[element].as_unit().expect("unit data");
    assert_eq!(data.modification_stamp, 2);
    assert_eq!(data.top_level_variables.len(), 1);
}

#[test]
fn test_rendered_diagnostics_carry_code_and_message() {
    init_tracing();
    let f = AstFactory::new();
    let unit = f.compilation_unit(
        vec![],
        vec![f.function(
            None,
            "main",
            f.no_parameters(),
            f.expression_body(f.identifier_expr("x")),
        )],
    );
    let mut context = AnalysisContext::new();
    context.add_source("main.q", "main() => x;\n", unit);
    let session = context.resolve_library("main.q").expect("main.q resolves");

    let rendered = context.render_diagnostics(&session, "main.q", false);
    assert_eq!(rendered.len(), 1);
    assert!(rendered[0].contains("2002"));
    assert!(rendered[0].contains("Undefined name 'x'"));
    assert!(context.render_diagnostics(&session, "other.q", false).is_empty());
}

#[test]
fn test_options_file_disables_body_analysis() {
    let options = AnalysisOptions::from_file_content("analyze_function_bodies = false\n")
        .expect("valid options");
    let f = AstFactory::new();
    let read = f.identifier_expr("undefined");
    let read_id = read.id;
    let unit = f.compilation_unit(
        vec![],
        vec![f.function(None, "main", f.no_parameters(), f.expression_body(read))],
    );
    let session = project_with_options(vec![("main.q", unit)], options)
        .resolve_library("main.q")
        .expect("main.q resolves");

    assert_no_diagnostics(&session, "main.q");
    assert_eq!(static_type(&session, "main.q", read_id), "<none>");
}

#[test]
fn test_sources_are_salsa_inputs() {
    let db = test_db();
    let file = SourceFile::new(&db, "a.q".to_string(), "int a;\nint b;\n".to_string(), 0);
    assert_eq!(line_column(&db, file, 9), (1, 2));

    let f = AstFactory::new();
    let context = project(vec![("b.q", f.compilation_unit(vec![], vec![]))]);
    let source = context.source("b.q").expect("registered source");
    assert_eq!(source.uri(context.db()), "b.q");
    assert_eq!(source.modification_stamp(context.db()), 0);
    assert_eq!(context.source("c.q"), None);
}
