//! Common test utilities for resolution tests
//!
//! This module contains the shared test infrastructure:
//! - Test database setup
//! - Project creation from factory-built units
//! - Lookups of elements and annotations in a resolved session
//! - Diagnostic formatting and assertion helpers

use quill_analyzer_diagnostics::DiagnosticCode;
use quill_analyzer_semantic::{
    AnalysisContext, AnalysisOptions, AnalysisSession, ElementId, SemanticDb,
};
use quill_analyzer_syntax::ast::CompilationUnit;
use quill_analyzer_syntax::{Db as SyntaxDb, NodeId};

// ===== Test Database Setup =====

#[salsa::db]
#[derive(Clone, Default)]
pub struct TestDb {
    storage: salsa::Storage<Self>,
}

#[salsa::db]
impl salsa::Database for TestDb {}
#[salsa::db]
impl SyntaxDb for TestDb {}
#[salsa::db]
impl SemanticDb for TestDb {}

pub fn test_db() -> TestDb {
    TestDb::default()
}

/// Routes resolver tracing to the test output; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

// ===== Test Project Utilities =====

/// A context holding `units`, each registered with empty text
pub fn project(units: Vec<(&str, CompilationUnit)>) -> AnalysisContext {
    project_with_options(units, AnalysisOptions::default())
}

pub fn project_with_options(
    units: Vec<(&str, CompilationUnit)>,
    options: AnalysisOptions,
) -> AnalysisContext {
    let mut context = AnalysisContext::new().with_options(options);
    for (uri, unit) in units {
        context.add_source(uri, "", unit);
    }
    context
}

/// Resolves the first of `units` as the root library
#[track_caller]
pub fn resolve(units: Vec<(&str, CompilationUnit)>) -> AnalysisSession {
    let root = units.first().map(|(uri, _)| uri.to_string()).expect("at least one unit");
    project(units)
        .resolve_library(&root)
        .unwrap_or_else(|error| panic!("resolution of {root} failed: {error}"))
}

/// Resolves a single library unit at `main.q`
#[track_caller]
pub fn resolve_unit(unit: CompilationUnit) -> AnalysisSession {
    resolve(vec![("main.q", unit)])
}

// ===== Session Lookups =====

/// Class or class alias named `name` declared in the unit at `uri`
#[track_caller]
pub fn class_named(session: &AnalysisSession, uri: &str, name: &str) -> ElementId {
    let unit = session.unit(uri).expect("unit was resolved");
    let data = session.arena()[unit.element].as_unit().expect("unit element");
    data.types
        .iter()
        .copied()
        .find(|class| session.arena()[*class].name == name)
        .unwrap_or_else(|| panic!("no class {name} in {uri}"))
}

/// Display of the static type recorded for `node`, `<none>` when missing
pub fn static_type(session: &AnalysisSession, uri: &str, node: NodeId) -> String {
    let unit = session.unit(uri).expect("unit was resolved");
    unit.result
        .resolution
        .static_type(node)
        .map_or_else(|| "<none>".to_string(), |ty| ty.display(session.arena()).to_string())
}

pub fn propagated_type(session: &AnalysisSession, uri: &str, node: NodeId) -> Option<String> {
    let unit = session.unit(uri).expect("unit was resolved");
    unit.result
        .resolution
        .propagated_type(node)
        .map(|ty| ty.display(session.arena()).to_string())
}

/// Qualified name of the static element recorded for `node`
pub fn element_name(session: &AnalysisSession, uri: &str, node: NodeId) -> Option<String> {
    let unit = session.unit(uri).expect("unit was resolved");
    unit.result
        .resolution
        .static_element(node)
        .map(|element| session.arena().qualified_name(element))
}

// ===== Diagnostics =====

/// Codes of the diagnostics of `uri`, sorted by code
pub fn codes(session: &AnalysisSession, uri: &str) -> Vec<DiagnosticCode> {
    let mut codes = session.diagnostics(uri).codes();
    codes.sort();
    codes
}

#[track_caller]
pub fn assert_codes(session: &AnalysisSession, uri: &str, expected: &[DiagnosticCode]) {
    let mut expected = expected.to_vec();
    expected.sort();
    assert_eq!(codes(session, uri), expected, "diagnostics of {uri}");
}

#[track_caller]
pub fn assert_no_diagnostics(session: &AnalysisSession, uri: &str) {
    let diagnostics = session.diagnostics(uri);
    assert!(
        diagnostics.is_empty(),
        "expected no diagnostics in {uri}, got:\n{}",
        diagnostic_summary(session, uri)
    );
}

/// One `Code: message` line per diagnostic, sorted
pub fn diagnostic_summary(session: &AnalysisSession, uri: &str) -> String {
    let mut lines: Vec<String> = session
        .diagnostics(uri)
        .iter()
        .map(|diagnostic| format!("{:?}: {}", diagnostic.code, diagnostic.message))
        .collect();
    lines.sort();
    lines.join("\n")
}
