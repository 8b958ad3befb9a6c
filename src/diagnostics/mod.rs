//! Diagnostics collection and rendering.
//!
//! Per §7's propagation policy, errors are pushed into a collector rather
//! than raised as control flow; a [`DiagnosticBag`] is the collector, and
//! this module renders its contents to a terminal (via `ariadne`, as the
//! teacher's `diagnostics` module does for its own error types) or to JSON
//! for tooling that wants structured output.

use std::ops::Range;

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use serde::Serialize;

use crate::token::Span;

/// Distinguishes a fatal diagnostic (stops emission for the affected
/// function, §7) from a non-fatal one (the `@extern` without `@link`
/// warning, which does not).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic, carrying everything a driver needs to format it:
/// `(code, span, one-line message, optional hint)` per §7.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub code: &'static str,
    pub severity: Severity,
    pub message: String,
    pub span: Option<Span>,
    pub hint: Option<String>,
}

impl Diagnostic {
    pub fn error(code: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        Diagnostic { code, severity: Severity::Error, message: message.into(), span, hint: None }
    }

    pub fn warning(code: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        Diagnostic { code, severity: Severity::Warning, message: message.into(), span, hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Accumulates diagnostics emitted over the lifetime of one
/// [`crate::codegen::CodegenContext`] run.
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        DiagnosticBag::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Renders the bag to a JSON array, as promised by §7 ("the driver
    /// formats these into terminal output or JSON").
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!(self.diagnostics)
    }

    /// Renders every diagnostic to stderr as an `ariadne` report, falling
    /// back to a plain `eprintln!` if report construction fails — mirroring
    /// the teacher's `report_semantic_error` graceful-degradation path.
    pub fn print_terminal(&self, filename: &str, source: &str) {
        for diagnostic in &self.diagnostics {
            print_one(filename, source, diagnostic);
        }
    }
}

fn end_of_source_range(source: &str) -> Range<usize> {
    if source.is_empty() {
        0..0
    } else {
        let end = source.len().saturating_sub(1);
        end..source.len()
    }
}

fn print_one(filename: &str, source: &str, diagnostic: &Diagnostic) {
    let (kind, color) = match diagnostic.severity {
        Severity::Error => (ReportKind::Error, Color::Red),
        Severity::Warning => (ReportKind::Warning, Color::Yellow),
    };
    let range = diagnostic.span.map(|s| s.start..s.end).unwrap_or_else(|| end_of_source_range(source));

    let mut report = Report::build(kind, (filename, range.clone()))
        .with_config(Config::default().with_index_type(IndexType::Byte))
        .with_code(diagnostic.code)
        .with_message(&diagnostic.message)
        .with_label(Label::new((filename, range)).with_message(&diagnostic.message).with_color(color));

    if let Some(hint) = &diagnostic.hint {
        report = report.with_help(hint);
    }

    if let Err(report_err) = report.finish().eprint((filename, Source::from(source))) {
        eprintln!("{}: {}: {}", diagnostic.code, diagnostic.message, report_err);
        if let Some(hint) = &diagnostic.hint {
            eprintln!("help: {hint}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bag_tracks_errors() {
        let mut bag = DiagnosticBag::new();
        assert!(!bag.has_errors());
        bag.push(Diagnostic::warning("W001", "unused", None));
        assert!(!bag.has_errors());
        bag.push(Diagnostic::error("E001", "boom", None));
        assert!(bag.has_errors());
        assert_eq!(bag.iter().count(), 2);
    }

    #[test]
    fn test_to_json_round_trips_fields() {
        let mut bag = DiagnosticBag::new();
        bag.push(Diagnostic::error("E001", "boom", Some(Span::new(0, 3, 1, 1))).with_hint("try again"));
        let json = bag.to_json();
        assert_eq!(json[0]["code"], "E001");
        assert_eq!(json[0]["hint"], "try again");
    }

    #[test]
    fn test_end_of_source_range_empty() {
        assert_eq!(end_of_source_range(""), 0..0);
    }

    #[test]
    fn test_print_terminal_does_not_panic_on_empty_bag() {
        DiagnosticBag::new().print_terminal("test.tml", "");
    }
}
