//! Source provider backed by salsa inputs.
//!
//! The resolver only reads a source's identity, text and modification stamp.
//! Everything else about where sources come from lives outside this crate.

#[salsa::db]
#[derive(Clone, Default)]
pub struct SyntaxDatabaseImpl {
    storage: salsa::Storage<Self>,
}

#[salsa::db]
impl salsa::Database for SyntaxDatabaseImpl {}

/// Most basic database: gives access to source inputs.
#[salsa::db]
pub trait Db: salsa::Database {}

#[salsa::db]
impl Db for SyntaxDatabaseImpl {}

#[salsa::input(debug)]
pub struct SourceFile {
    #[returns(ref)]
    pub uri: String,
    #[returns(ref)]
    pub text: String,
    /// Bumped by the owner every time `text` is replaced
    pub modification_stamp: u64,
}

/// Byte offsets at which each line of the source starts.
#[salsa::tracked(returns(ref))]
pub fn line_starts(db: &dyn Db, file: SourceFile) -> Vec<usize> {
    std::iter::once(0)
        .chain(
            file.text(db)
                .char_indices()
                .filter(|(_, c)| *c == '\n')
                .map(|(i, _)| i + 1),
        )
        .collect()
}

/// Zero-based `(line, column)` of a byte offset, clamped to the end of the text
pub fn line_column(db: &dyn Db, file: SourceFile, offset: usize) -> (usize, usize) {
    let starts = line_starts(db, file);
    let offset = offset.min(file.text(db).len());
    let line = starts.partition_point(|start| *start <= offset).saturating_sub(1);
    (line, offset - starts[line])
}
