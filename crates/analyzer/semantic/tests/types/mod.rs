//! # Expression Type Tests
//!
//! Static and propagated types the resolver records for expressions, the
//! operator methods it binds, and flow-sensitive narrowing.

use quill_analyzer_semantic::{AnalysisOptions, AnalysisSession};
use quill_analyzer_syntax::ast::{CompilationUnit, FormalParameter, Statement};
use quill_analyzer_syntax::AstFactory;

mod conditionals;
mod narrowing;
mod operators;

/// `main(parameters) { statements }` as the only declaration of a unit
fn main_unit(
    f: &AstFactory,
    parameters: Vec<FormalParameter>,
    statements: Vec<Statement>,
) -> CompilationUnit {
    f.compilation_unit(
        vec![],
        vec![f.function(None, "main", f.parameters(parameters), f.block_body(statements))],
    )
}

fn typed(f: &AstFactory, type_name: &str, name: &str) -> FormalParameter {
    f.required_parameter(Some(f.type_name(type_name, vec![])), name)
}

fn resolve_with(unit: CompilationUnit, options: AnalysisOptions) -> AnalysisSession {
    crate::project_with_options(vec![("main.q", unit)], options)
        .resolve_library("main.q")
        .expect("main.q resolves")
}
