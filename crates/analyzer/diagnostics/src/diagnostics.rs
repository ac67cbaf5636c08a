//! # Diagnostic System for Resolution
//!
//! This module provides the diagnostic infrastructure for reporting directive
//! errors, binding failures and type-rule violations found while resolving a
//! library cycle.

use ariadne::ReportKind;
use chumsky::span::SimpleSpan;
use std::fmt;

/// A diagnostic message from resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub code: DiagnosticCode,
    pub message: String,
    /// Source span where this diagnostic applies
    pub span: SimpleSpan<usize>,
    /// Optional related spans for additional context
    pub related_spans: Vec<(SimpleSpan<usize>, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
    Hint,
}

impl From<ReportKind<'static>> for DiagnosticSeverity {
    fn from(kind: ReportKind<'static>) -> Self {
        match kind {
            ReportKind::Error => Self::Error,
            ReportKind::Warning => Self::Warning,
            ReportKind::Advice => Self::Info,
            ReportKind::Custom(_, _) => Self::Info,
        }
    }
}

impl From<DiagnosticSeverity> for ReportKind<'static> {
    fn from(severity: DiagnosticSeverity) -> Self {
        match severity {
            DiagnosticSeverity::Error => ReportKind::Error,
            DiagnosticSeverity::Warning => ReportKind::Warning,
            DiagnosticSeverity::Info => ReportKind::Advice,
            DiagnosticSeverity::Hint => ReportKind::Advice,
        }
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
            Self::Hint => write!(f, "hint"),
        }
    }
}

/// Stable identifiers for every problem the analyzer reports.
///
/// The numeric value (see `From<DiagnosticCode> for u32`) is part of the
/// analyzer's output contract and must not be reused once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticCode {
    // Directive errors (1000-1999)
    InvalidUri,
    UriDoesNotExist,
    MissingLibraryDirectiveWithPart,
    MissingPartOfDirective,
    PartOfDifferentLibrary,
    ImportOfNonLibrary,
    ExportOfNonLibrary,
    AmbiguousImport,
    DuplicateDefinition,

    // Binding failures (2000-2999)
    UndefinedClass,
    UndefinedIdentifier,
    UndefinedMethod,
    UndefinedOperator,
    UndefinedGetter,
    UndefinedSetter,
    UndefinedConstructor,
    UndefinedNamedParameter,
    UndefinedLabel,
    LabelInOuterScope,
    BreakLabelOnSwitchMember,
    NotAType,
    SuperInInvalidContext,

    // Type-rule violations (3000-3999)
    WrongNumberOfTypeArguments,
    ExtendsNonClass,
    ImplementsNonClass,
    MixinOfNonClass,
    NonBoolCondition,
    InconsistentMethodInheritance,
}

impl From<DiagnosticCode> for u32 {
    fn from(code: DiagnosticCode) -> Self {
        match code {
            DiagnosticCode::InvalidUri => 1001,
            DiagnosticCode::UriDoesNotExist => 1002,
            DiagnosticCode::MissingLibraryDirectiveWithPart => 1003,
            DiagnosticCode::MissingPartOfDirective => 1004,
            DiagnosticCode::PartOfDifferentLibrary => 1005,
            DiagnosticCode::ImportOfNonLibrary => 1006,
            DiagnosticCode::ExportOfNonLibrary => 1007,
            DiagnosticCode::AmbiguousImport => 1008,
            DiagnosticCode::DuplicateDefinition => 1009,
            DiagnosticCode::UndefinedClass => 2001,
            DiagnosticCode::UndefinedIdentifier => 2002,
            DiagnosticCode::UndefinedMethod => 2003,
            DiagnosticCode::UndefinedOperator => 2004,
            DiagnosticCode::UndefinedGetter => 2005,
            DiagnosticCode::UndefinedSetter => 2006,
            DiagnosticCode::UndefinedConstructor => 2007,
            DiagnosticCode::UndefinedNamedParameter => 2008,
            DiagnosticCode::UndefinedLabel => 2009,
            DiagnosticCode::LabelInOuterScope => 2010,
            DiagnosticCode::BreakLabelOnSwitchMember => 2011,
            DiagnosticCode::NotAType => 2012,
            DiagnosticCode::SuperInInvalidContext => 2013,
            DiagnosticCode::WrongNumberOfTypeArguments => 3001,
            DiagnosticCode::ExtendsNonClass => 3002,
            DiagnosticCode::ImplementsNonClass => 3003,
            DiagnosticCode::MixinOfNonClass => 3004,
            DiagnosticCode::NonBoolCondition => 3005,
            DiagnosticCode::InconsistentMethodInheritance => 3006,
        }
    }
}

impl Diagnostic {
    /// Create an error diagnostic
    pub fn error(code: DiagnosticCode, message: String) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            code,
            message,
            span: SimpleSpan::from(0..0),
            related_spans: Vec::new(),
        }
    }

    /// Create a warning diagnostic
    pub fn warning(code: DiagnosticCode, message: String) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            code,
            message,
            span: SimpleSpan::from(0..0),
            related_spans: Vec::new(),
        }
    }

    /// Create an info diagnostic
    pub fn info(code: DiagnosticCode, message: String) -> Self {
        Self {
            severity: DiagnosticSeverity::Info,
            code,
            message,
            span: SimpleSpan::from(0..0),
            related_spans: Vec::new(),
        }
    }

    /// Add location information to this diagnostic
    pub const fn with_location(mut self, span: SimpleSpan<usize>) -> Self {
        self.span = span;
        self
    }

    /// Add a related span with context message
    pub fn with_related_span(mut self, span: SimpleSpan<usize>, message: String) -> Self {
        self.related_spans.push((span, message));
        self
    }

    pub fn invalid_uri(uri: Option<&str>, span: SimpleSpan<usize>) -> Self {
        let message = match uri {
            Some(uri) => format!("Invalid URI syntax: '{uri}'"),
            None => "URI must be a constant string literal".to_string(),
        };
        Self::error(DiagnosticCode::InvalidUri, message).with_location(span)
    }

    pub fn uri_does_not_exist(uri: &str, span: SimpleSpan<usize>) -> Self {
        Self::error(
            DiagnosticCode::UriDoesNotExist,
            format!("Target of URI does not exist: '{uri}'"),
        )
        .with_location(span)
    }

    pub fn missing_library_directive_with_part(span: SimpleSpan<usize>) -> Self {
        Self::error(
            DiagnosticCode::MissingLibraryDirectiveWithPart,
            "Libraries that have parts must have a library directive".to_string(),
        )
        .with_location(span)
    }

    pub fn missing_part_of_directive(uri: &str, span: SimpleSpan<usize>) -> Self {
        Self::error(
            DiagnosticCode::MissingPartOfDirective,
            format!("The included part '{uri}' must have a part-of directive"),
        )
        .with_location(span)
    }

    pub fn part_of_different_library(expected: &str, found: &str, span: SimpleSpan<usize>) -> Self {
        Self::error(
            DiagnosticCode::PartOfDifferentLibrary,
            format!("Expected this library to be part of '{expected}', not '{found}'"),
        )
        .with_location(span)
    }

    pub fn import_of_non_library(uri: &str, span: SimpleSpan<usize>) -> Self {
        Self::error(
            DiagnosticCode::ImportOfNonLibrary,
            format!("The imported library '{uri}' must not have a part-of directive"),
        )
        .with_location(span)
    }

    pub fn export_of_non_library(uri: &str, span: SimpleSpan<usize>) -> Self {
        Self::error(
            DiagnosticCode::ExportOfNonLibrary,
            format!("The exported library '{uri}' must not have a part-of directive"),
        )
        .with_location(span)
    }

    pub fn ambiguous_import(name: &str, span: SimpleSpan<usize>) -> Self {
        Self::warning(
            DiagnosticCode::AmbiguousImport,
            format!("The name '{name}' is defined in more than one imported library"),
        )
        .with_location(span)
    }

    /// Convenience method for duplicate definition error
    pub fn duplicate_definition(name: &str, span: SimpleSpan<usize>) -> Self {
        Self::error(
            DiagnosticCode::DuplicateDefinition,
            format!("Duplicate definition of '{name}'"),
        )
        .with_location(span)
    }

    pub fn undefined_class(name: &str, span: SimpleSpan<usize>) -> Self {
        Self::warning(
            DiagnosticCode::UndefinedClass,
            format!("Undefined class '{name}'"),
        )
        .with_location(span)
    }

    pub fn undefined_identifier(name: &str, span: SimpleSpan<usize>) -> Self {
        Self::warning(
            DiagnosticCode::UndefinedIdentifier,
            format!("Undefined name '{name}'"),
        )
        .with_location(span)
    }

    pub fn undefined_method(name: &str, type_name: &str, span: SimpleSpan<usize>) -> Self {
        Self::warning(
            DiagnosticCode::UndefinedMethod,
            format!("The method '{name}' is not defined for the type '{type_name}'"),
        )
        .with_location(span)
    }

    pub fn undefined_operator(operator: &str, type_name: &str, span: SimpleSpan<usize>) -> Self {
        Self::warning(
            DiagnosticCode::UndefinedOperator,
            format!("The operator '{operator}' is not defined for the type '{type_name}'"),
        )
        .with_location(span)
    }

    pub fn undefined_getter(name: &str, type_name: &str, span: SimpleSpan<usize>) -> Self {
        Self::warning(
            DiagnosticCode::UndefinedGetter,
            format!("The getter '{name}' is not defined for the type '{type_name}'"),
        )
        .with_location(span)
    }

    pub fn undefined_setter(name: &str, type_name: &str, span: SimpleSpan<usize>) -> Self {
        Self::warning(
            DiagnosticCode::UndefinedSetter,
            format!("The setter '{name}' is not defined for the type '{type_name}'"),
        )
        .with_location(span)
    }

    pub fn undefined_constructor(
        class_name: &str,
        name: Option<&str>,
        span: SimpleSpan<usize>,
    ) -> Self {
        let message = match name {
            Some(name) => format!("The class '{class_name}' does not have a constructor '{name}'"),
            None => format!("The class '{class_name}' does not have a default constructor"),
        };
        Self::warning(DiagnosticCode::UndefinedConstructor, message).with_location(span)
    }

    pub fn undefined_named_parameter(name: &str, span: SimpleSpan<usize>) -> Self {
        Self::warning(
            DiagnosticCode::UndefinedNamedParameter,
            format!("The named parameter '{name}' is not defined"),
        )
        .with_location(span)
    }

    pub fn undefined_label(name: &str, span: SimpleSpan<usize>) -> Self {
        Self::error(
            DiagnosticCode::UndefinedLabel,
            format!("Cannot reference undefined label '{name}'"),
        )
        .with_location(span)
    }

    pub fn label_in_outer_scope(name: &str, span: SimpleSpan<usize>) -> Self {
        Self::error(
            DiagnosticCode::LabelInOuterScope,
            format!("Cannot reference label '{name}' declared in an outer method"),
        )
        .with_location(span)
    }

    pub fn break_label_on_switch_member(span: SimpleSpan<usize>) -> Self {
        Self::error(
            DiagnosticCode::BreakLabelOnSwitchMember,
            "Break label resolves to case or default statement".to_string(),
        )
        .with_location(span)
    }

    pub fn not_a_type(name: &str, span: SimpleSpan<usize>) -> Self {
        Self::warning(DiagnosticCode::NotAType, format!("'{name}' is not a type"))
            .with_location(span)
    }

    pub fn super_in_invalid_context(span: SimpleSpan<usize>) -> Self {
        Self::error(
            DiagnosticCode::SuperInInvalidContext,
            "Invalid context for 'super' invocation".to_string(),
        )
        .with_location(span)
    }

    pub fn wrong_number_of_type_arguments(
        name: &str,
        expected: usize,
        found: usize,
        span: SimpleSpan<usize>,
    ) -> Self {
        Self::warning(
            DiagnosticCode::WrongNumberOfTypeArguments,
            format!("The type '{name}' is declared with {expected} type parameters, but {found} type arguments were given"),
        )
        .with_location(span)
    }

    pub fn extends_non_class(name: &str, span: SimpleSpan<usize>) -> Self {
        Self::error(
            DiagnosticCode::ExtendsNonClass,
            format!("Classes can only extend other classes, not '{name}'"),
        )
        .with_location(span)
    }

    pub fn implements_non_class(name: &str, span: SimpleSpan<usize>) -> Self {
        Self::error(
            DiagnosticCode::ImplementsNonClass,
            format!("Classes can only implement other classes, not '{name}'"),
        )
        .with_location(span)
    }

    pub fn mixin_of_non_class(name: &str, span: SimpleSpan<usize>) -> Self {
        Self::error(
            DiagnosticCode::MixinOfNonClass,
            format!("Classes can only mixin other classes, not '{name}'"),
        )
        .with_location(span)
    }

    pub fn non_bool_condition(span: SimpleSpan<usize>) -> Self {
        Self::warning(
            DiagnosticCode::NonBoolCondition,
            "Conditions must have a static type of 'bool'".to_string(),
        )
        .with_location(span)
    }

    pub fn inconsistent_method_inheritance(
        class_name: &str,
        member: &str,
        span: SimpleSpan<usize>,
    ) -> Self {
        Self::error(
            DiagnosticCode::InconsistentMethodInheritance,
            format!("'{class_name}' inherits conflicting definitions of '{member}' from its interfaces"),
        )
        .with_location(span)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        write!(f, " (at {}:{})", self.span.start, self.span.end)?;
        for (span, message) in &self.related_spans {
            write!(f, "\n  note: {} (at {}:{})", message, span.start, span.end)?;
        }
        Ok(())
    }
}

/// Collection of diagnostics from resolution
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic to the collection
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add multiple diagnostics
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// Get all diagnostics in the order they were reported
    pub fn all(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Get only error diagnostics
    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
            .collect()
    }

    /// Get only warning diagnostics
    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
            .collect()
    }

    /// Codes of every diagnostic, in report order
    pub fn codes(&self) -> Vec<DiagnosticCode> {
        self.diagnostics.iter().map(|d| d.code).collect()
    }

    pub fn contains_code(&self, code: DiagnosticCode) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Error)
    }

    /// Get the total number of diagnostics
    pub const fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Check if the collection is empty
    pub const fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Sort diagnostics by position, then severity (errors first), then message
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            a.span
                .start
                .cmp(&b.span.start)
                .then(a.severity.cmp(&b.severity))
                .then(a.message.cmp(&b.message))
        });
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        let errors = self.errors().len();
        let warnings = self.warnings().len();
        let total = self.diagnostics.len();

        if total == 0 {
            "No issues found".to_string()
        } else {
            format!("{errors} errors, {warnings} warnings")
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }
}

impl From<Vec<Diagnostic>> for DiagnosticCollection {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

impl IntoIterator for DiagnosticCollection {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

impl<'a> IntoIterator for &'a DiagnosticCollection {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}
