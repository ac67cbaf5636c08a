//! # Library Resolution Tests
//!
//! Directive validation, import and export namespaces, parts, and what the
//! [`quill_analyzer_semantic::AnalysisContext`] records about its sources.

pub mod context;
pub mod directives;
pub mod imports;
