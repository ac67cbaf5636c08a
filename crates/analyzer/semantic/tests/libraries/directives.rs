use quill_analyzer_diagnostics::DiagnosticCode;
use quill_analyzer_semantic::ResolverError;
use quill_analyzer_syntax::ast::InterpolationElement;
use quill_analyzer_syntax::AstFactory;

use crate::*;

#[test]
fn test_unresolvable_uris_are_reported() {
    let f = AstFactory::new();
    let interpolated = f.interpolation(vec![
        InterpolationElement::Text("lib_".to_string()),
        InterpolationElement::Expression(f.integer(2)),
    ]);
    let main = f.compilation_unit(
        vec![
            f.import_directive("missing.q", None, vec![]),
            f.import_directive_with_uri(interpolated, None, vec![]),
            f.import_directive("quill:io", None, vec![]),
            f.export_directive("gone.q", vec![]),
        ],
        vec![],
    );
    let session = resolve(vec![("main.q", main)]);

    insta::assert_snapshot!(diagnostic_summary(&session, "main.q"), @r"
    InvalidUri: Invalid URI syntax: 'quill:io'
    InvalidUri: URI must be a constant string literal
    UriDoesNotExist: Target of URI does not exist: 'gone.q'
    UriDoesNotExist: Target of URI does not exist: 'missing.q'
    ");
    let library = session.library("main.q").expect("library");
    assert!(session.imported_libraries(library) == vec![session.arena().core().library()]);
}

#[test]
fn test_parts_join_their_library() {
    let f = AstFactory::new();
    let main = f.compilation_unit(
        vec![f.library_directive("app"), f.part_directive("shapes.q")],
        vec![f.function(
            None,
            "main",
            f.no_parameters(),
            f.block_body(vec![f.local_variable(Some(f.type_name("Circle", vec![])), "c", None)]),
        )],
    );
    let part = f.compilation_unit(
        vec![f.part_of_directive("app")],
        vec![f.class("Circle", vec![])],
    );
    let session = resolve(vec![("main.q", main), ("shapes.q", part)]);

    assert_no_diagnostics(&session, "main.q");
    assert_no_diagnostics(&session, "shapes.q");
    let library = session.library("main.q").expect("library");
    let part_unit = session.unit("shapes.q").expect("part was resolved");
    assert_eq!(part_unit.library, library);
    let data = session.arena()[library].as_library().expect("library data");
    assert_eq!(data.parts, vec![part_unit.element]);
    assert_eq!(session.library("shapes.q"), None);
    let circle = class_named(&session, "shapes.q", "Circle");
    assert_eq!(session.arena().library_of(circle), Some(library));
}

#[test]
fn test_part_directive_errors() {
    let f = AstFactory::new();
    let main = f.compilation_unit(
        vec![
            f.library_directive("app"),
            f.part_directive("plain.q"),
            f.part_directive("stranger.q"),
            f.part_directive("absent.q"),
        ],
        vec![],
    );
    let plain = f.compilation_unit(vec![], vec![]);
    let stranger = f.compilation_unit(vec![f.part_of_directive("other")], vec![]);
    let session = resolve(vec![("main.q", main), ("plain.q", plain), ("stranger.q", stranger)]);

    assert_codes(
        &session,
        "main.q",
        &[
            DiagnosticCode::MissingPartOfDirective,
            DiagnosticCode::PartOfDifferentLibrary,
            DiagnosticCode::UriDoesNotExist,
        ],
    );
    insta::assert_snapshot!(diagnostic_summary(&session, "main.q"), @r"
    MissingPartOfDirective: The included part 'plain.q' must have a part-of directive
    PartOfDifferentLibrary: Expected this library to be part of 'app', not 'other'
    UriDoesNotExist: Target of URI does not exist: 'absent.q'
    ");
}

#[test]
fn test_parts_need_a_library_directive() {
    let f = AstFactory::new();
    let main = f.compilation_unit(vec![f.part_directive("a.q"), f.part_directive("b.q")], vec![]);
    let a = f.compilation_unit(vec![f.part_of_directive("app")], vec![]);
    let b = f.compilation_unit(vec![f.part_of_directive("app")], vec![]);
    let session = resolve(vec![("main.q", main), ("a.q", a), ("b.q", b)]);

    assert_codes(&session, "main.q", &[DiagnosticCode::MissingLibraryDirectiveWithPart]);
}

#[test]
fn test_parts_cannot_be_imported_or_exported() {
    let f = AstFactory::new();
    let main = f.compilation_unit(
        vec![
            f.import_directive("piece.q", None, vec![]),
            f.export_directive("piece.q", vec![]),
        ],
        vec![],
    );
    let piece = f.compilation_unit(vec![f.part_of_directive("app")], vec![]);
    let session = resolve(vec![("main.q", main), ("piece.q", piece)]);

    assert_codes(
        &session,
        "main.q",
        &[DiagnosticCode::ImportOfNonLibrary, DiagnosticCode::ExportOfNonLibrary],
    );
    let library = session.library("main.q").expect("library");
    let data = session.arena()[library].as_library().expect("library data");
    assert!(data.exports.is_empty());
}

#[test]
fn test_root_must_be_a_known_library() {
    let f = AstFactory::new();
    let context = project(vec![(
        "piece.q",
        f.compilation_unit(vec![f.part_of_directive("app")], vec![]),
    )]);

    assert_eq!(
        context.resolve_library("nowhere.q").err(),
        Some(ResolverError::UnknownSource("nowhere.q".to_string()))
    );
    assert_eq!(
        context.resolve_library("piece.q").err(),
        Some(ResolverError::NotALibrary("piece.q".to_string()))
    );
}

#[test]
fn test_duplicate_top_level_names() {
    let f = AstFactory::new();
    let main = f.compilation_unit(
        vec![],
        vec![
            f.function(None, "run", f.no_parameters(), f.block_body(vec![])),
            f.class("run", vec![]),
            f.function(None, "other", f.no_parameters(), f.block_body(vec![])),
        ],
    );
    let session = resolve(vec![("main.q", main)]);

    insta::assert_snapshot!(
        diagnostic_summary(&session, "main.q"),
        @"DuplicateDefinition: Duplicate definition of 'run'"
    );
}
