//! Diagnostics produced by the quill analyzer.
//!
//! Resolution never aborts on a source-level problem: every directive error,
//! binding failure and type-rule violation becomes a [`Diagnostic`] collected
//! into a [`DiagnosticCollection`] and handed back to the caller.

mod diagnostics;
mod reporting;

pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollection, DiagnosticSeverity};
pub use reporting::build_diagnostic_message;
