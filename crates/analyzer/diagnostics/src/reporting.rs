//! # Error Reporting Utilities
//!
//! Renders resolution diagnostics against the text of the unit they were
//! reported in.

use crate::Diagnostic;
use ariadne::{Label, Report, Source};

/// Build a formatted message for a diagnostic.
///
/// `source_id` names the unit in the report header (usually its URI).
pub fn build_diagnostic_message(
    source_id: &str,
    source: &str,
    diagnostic: &Diagnostic,
    with_color: bool,
) -> String {
    let mut write_buffer = Vec::new();
    let code_u32: u32 = diagnostic.code.into();
    let mut report = Report::build(
        diagnostic.severity.into(),
        (source_id, diagnostic.span.into_range()),
    )
    .with_config(
        ariadne::Config::new()
            .with_index_type(ariadne::IndexType::Byte)
            .with_color(with_color),
    )
    .with_code(code_u32)
    .with_message(&diagnostic.message)
    .with_label(
        Label::new((source_id, diagnostic.span.into_range())).with_message(&diagnostic.message),
    );
    for (span, note) in &diagnostic.related_spans {
        report = report.with_label(Label::new((source_id, span.into_range())).with_message(note));
    }
    // Writing into a Vec cannot fail; fall back to the plain display otherwise.
    match report
        .finish()
        .write((source_id, Source::from(source)), &mut write_buffer)
    {
        Ok(()) => String::from_utf8_lossy(&write_buffer).to_string(),
        Err(_) => diagnostic.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chumsky::span::SimpleSpan;

    #[test]
    fn test_report_mentions_code_and_message() {
        let source = "if (x) {}";
        let diagnostic = Diagnostic::non_bool_condition(SimpleSpan::from(4..5));
        let rendered = build_diagnostic_message("main.q", source, &diagnostic, false);
        assert!(rendered.contains("3005"));
        assert!(rendered.contains("Conditions must have a static type of 'bool'"));
        assert!(rendered.contains("main.q"));
    }
}
