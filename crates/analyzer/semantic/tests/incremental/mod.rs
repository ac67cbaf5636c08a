//! # Incremental Resolution Tests
//!
//! Edits applied to a resolved session through
//! [`quill_analyzer_semantic::AnalysisSession::update_declaration`] and
//! [`quill_analyzer_semantic::AnalysisSession::update_member`]: which edits
//! keep a declaration's or a whole unit's shape, and what re-resolution leaves
//! behind.

pub mod members;
pub mod top_level;
pub mod units;
