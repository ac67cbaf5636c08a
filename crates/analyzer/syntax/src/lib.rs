//! # Quill syntax
//!
//! The syntax tree consumed by the semantic analyzer, a programmatic
//! [`AstFactory`] for building trees, a read-only [`visitor::Visitor`], and the
//! salsa source inputs.

pub mod ast;
mod db;
mod factory;
pub mod visitor;

pub use ast::NodeId;
pub use db::{line_column, line_starts, Db, SourceFile, SyntaxDatabaseImpl};
pub use factory::AstFactory;
