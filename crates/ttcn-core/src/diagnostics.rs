//! The diagnostic sink shared by every checking component.
//!
//! Diagnostics are appended in the order they are found. Because the checker
//! visits siblings in declaration order, the sequence is deterministic for a
//! fixed input tree.

use std::fmt;

use crate::{CheckError, Span};

/// The severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The template is illegal.
    Error,
    /// The template is legal but suspicious (may fail at run time, is redundant).
    Warning,
    /// Additional information attached to the preceding error or warning.
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A single diagnostic message.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// The severity level.
    pub severity: Severity,
    /// Rendered message text.
    pub message: String,
    /// Location of the offending node.
    pub span: Span,
    /// Enclosing contexts, outermost first ("In template for record field `a'").
    pub context: Vec<String>,
    /// Structured form of the problem, present for errors.
    pub error: Option<CheckError>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: ", self.span, self.severity)?;
        for ctx in &self.context {
            write!(f, "{ctx}: ")?;
        }
        write!(f, "{}", self.message)
    }
}

/// A collection of diagnostics produced while checking.
///
/// Also tracks the current context stack; every diagnostic records the stack
/// that was active when it was reported.
#[derive(Debug, Default)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
    context: Vec<String>,
    error_count: usize,
    warning_count: usize,
}

impl Diagnostics {
    /// Creates a new, empty diagnostics collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report an error.
    pub fn error(&mut self, span: Span, error: CheckError) {
        self.error_count += 1;
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            message: error.to_string(),
            span,
            context: self.context.clone(),
            error: Some(error),
        });
    }

    /// Report a warning.
    pub fn warning(&mut self, span: Span, message: impl Into<String>) {
        self.warning_count += 1;
        self.push_plain(Severity::Warning, span, message.into());
    }

    /// Attach a note.
    pub fn note(&mut self, span: Span, message: impl Into<String>) {
        self.push_plain(Severity::Note, span, message.into());
    }

    fn push_plain(&mut self, severity: Severity, span: Span, message: String) {
        self.diagnostics.push(Diagnostic {
            severity,
            message,
            span,
            context: self.context.clone(),
            error: None,
        });
    }

    /// Enter a nested reporting context.
    pub fn push_context(&mut self, context: impl Into<String>) {
        self.context.push(context.into());
    }

    /// Leave the innermost reporting context.
    pub fn pop_context(&mut self) {
        self.context.pop();
    }

    /// Drop every open context. Used after an aborted definition.
    pub fn reset_context(&mut self) {
        self.context.clear();
    }

    /// Depth of the context stack.
    pub fn context_depth(&self) -> usize {
        self.context.len()
    }

    /// Returns `true` if any error was reported.
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Number of errors reported.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Number of warnings reported.
    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    /// Iterate over the errors.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.by_severity(Severity::Error)
    }

    /// Iterate over the warnings.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.by_severity(Severity::Warning)
    }

    /// Iterate over the notes.
    pub fn notes(&self) -> impl Iterator<Item = &Diagnostic> {
        self.by_severity(Severity::Note)
    }

    fn by_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.severity == severity)
    }

    /// Iterate over every diagnostic in report order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Total number of diagnostics, notes included.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Whether nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Whether any diagnostic's message contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.diagnostics.iter().any(|d| d.message.contains(needle))
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_severity() {
        let mut diags = Diagnostics::new();
        diags.error(Span::new(1, 1, 1), CheckError::OmitNotAllowed);
        diags.warning(Span::new(2, 1, 1), "redundant");
        diags.note(Span::new(2, 1, 1), "see here");

        assert!(diags.has_errors());
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.warning_count(), 1);
        assert_eq!(diags.notes().count(), 1);
        assert_eq!(diags.len(), 3);
    }

    #[test]
    fn records_context_stack() {
        let mut diags = Diagnostics::new();
        diags.push_context("In template for record field `a'");
        diags.error(Span::default(), CheckError::AnyOrOmitForMandatory);
        diags.pop_context();
        diags.warning(Span::default(), "outside");

        let first = diags.iter().next().unwrap();
        assert_eq!(first.context, vec!["In template for record field `a'"]);
        assert!(diags.warnings().next().unwrap().context.is_empty());
    }

    #[test]
    fn display_includes_context() {
        let mut diags = Diagnostics::new();
        diags.push_context("In x");
        diags.error(Span::new(4, 2, 0), CheckError::RangeBounds);
        let text = diags.to_string();
        assert_eq!(
            text,
            "4:2: error: In x: The lower boundary is higher than the upper boundary\n"
        );
    }

    #[test]
    fn structured_error_is_kept() {
        let mut diags = Diagnostics::new();
        diags.error(Span::default(), CheckError::UnionFieldCount);
        assert!(matches!(
            diags.errors().next().unwrap().error,
            Some(CheckError::UnionFieldCount)
        ));
        assert!(diags.mentions("exactly one selected field"));
    }
}
