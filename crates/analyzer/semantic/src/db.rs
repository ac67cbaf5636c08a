use quill_analyzer_syntax::Db as SyntaxDb;

/// Database trait for semantic analysis, extending the syntax database
#[salsa::db]
pub trait SemanticDb: SyntaxDb {}

/// Concrete database owned by an [`crate::AnalysisContext`]
#[salsa::db]
#[derive(Clone, Default)]
pub struct SemanticDatabaseImpl {
    storage: salsa::Storage<Self>,
}

#[salsa::db]
impl salsa::Database for SemanticDatabaseImpl {}

#[salsa::db]
impl SyntaxDb for SemanticDatabaseImpl {}

#[salsa::db]
impl SemanticDb for SemanticDatabaseImpl {}
