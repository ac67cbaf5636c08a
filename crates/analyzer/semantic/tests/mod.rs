//! # Semantic Resolution Tests
//!
//! End-to-end tests of the resolution core, organized by concern. Every test
//! builds its syntax trees with an [`quill_analyzer_syntax::AstFactory`],
//! registers them with an [`quill_analyzer_semantic::AnalysisContext`] and
//! inspects the resulting session.
//!
//! ## Test Organization
//!
//! - `inheritance/` - Member lookup across supertypes, mixins and interfaces, subtype queries
//! - `types/` - Static and propagated expression types, the override stack
//! - `incremental/` - Declaration matching and in-place re-resolution
//! - `libraries/` - Directives, imports, parts and resolution order

pub mod common;
pub use common::*;

pub mod incremental;
pub mod inheritance;
pub mod libraries;
pub mod types;
