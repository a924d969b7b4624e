//! Compiler diagnostics
//!
//! Diagnostics carry a severity, a title, an optional body and a source
//! range. They are accumulated in a sink so one run can report many
//! independent mistakes; the decorator and the IR generator consult the
//! error count before continuing. Rendering quotes the offending source line
//! with a caret run under the range.

use crate::lexer::SrcLocationRange;
use crate::source::SourceManager;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        };
        write!(f, "{}", name)
    }
}

/// A follow-up message chained to a primary diagnostic, e.g.
/// "name 'x' previously declared here".
#[derive(Debug, Clone)]
pub struct Note {
    pub message: String,
    pub location: SrcLocationRange,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub location: SrcLocationRange,
    pub notes: Vec<Note>,
}

/// Accumulating diagnostics sink.
#[derive(Debug, Default)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
    errors: usize,
    warnings: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    /// Report an error. The returned scope lets the caller chain notes to
    /// this diagnostic.
    pub fn error(&mut self, title: impl Into<String>, location: SrcLocationRange) -> MsgScope<'_> {
        self.push(Severity::Error, title.into(), String::new(), location)
    }

    pub fn warning(
        &mut self,
        title: impl Into<String>,
        location: SrcLocationRange,
    ) -> MsgScope<'_> {
        self.push(Severity::Warning, title.into(), String::new(), location)
    }

    fn push(
        &mut self,
        severity: Severity,
        title: String,
        message: String,
        location: SrcLocationRange,
    ) -> MsgScope<'_> {
        match severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Note => {}
        }
        self.diagnostics.push(Diagnostic {
            severity,
            title,
            message,
            location,
            notes: Vec::new(),
        });
        let index = self.diagnostics.len() - 1;
        MsgScope {
            diagnostic: &mut self.diagnostics[index],
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn all(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// True when any diagnostic title contains the given text. Test helper.
    #[cfg(test)]
    pub fn contains(&self, text: &str) -> bool {
        self.diagnostics.iter().any(|d| d.title.contains(text))
    }
}

/// Scope over the most recent diagnostic, used to chain notes:
///
/// ```ignore
/// diags.error("name 'x' already declared", location)
///     .note("name 'x' previously declared here", previous_location);
/// ```
pub struct MsgScope<'a> {
    diagnostic: &'a mut Diagnostic,
}

impl MsgScope<'_> {
    pub fn note(self, message: impl Into<String>, location: SrcLocationRange) -> Self {
        self.diagnostic.notes.push(Note {
            message: message.into(),
            location,
        });
        self
    }

    pub fn body(self, message: impl Into<String>) -> Self {
        self.diagnostic.message = message.into();
        self
    }
}

/// Render one diagnostic: file path with `line:col`, the title, the quoted
/// source line with a caret run, chained notes indented below.
pub fn format_diagnostic(diagnostic: &Diagnostic, sources: &SourceManager) -> String {
    let mut out = String::new();
    format_message(
        &mut out,
        &diagnostic.severity.to_string(),
        &diagnostic.title,
        &diagnostic.message,
        diagnostic.location,
        sources,
        "",
    );
    for note in &diagnostic.notes {
        format_message(&mut out, "note", &note.message, "", note.location, sources, "  ");
    }
    out
}

/// Render all diagnostics in order.
pub fn format_diagnostics(diagnostics: &[Diagnostic], sources: &SourceManager) -> String {
    let mut out = String::new();
    for diagnostic in diagnostics {
        out.push_str(&format_diagnostic(diagnostic, sources));
    }
    out
}

fn format_message(
    out: &mut String,
    severity: &str,
    title: &str,
    body: &str,
    location: SrcLocationRange,
    sources: &SourceManager,
    indent: &str,
) {
    let start = location.start;
    out.push_str(&format!(
        "{}{}:{}:{}: {}: {}\n",
        indent,
        sources.path_string(),
        start.line,
        start.column,
        severity,
        title
    ));
    if !body.is_empty() {
        out.push_str(&format!("{}    {}\n", indent, body));
    }

    let line_text = sources.line(start.line);
    if line_text.is_empty() && start.line == 0 {
        return;
    }
    out.push_str(&format!("{}    {}\n", indent, line_text));

    // caret run under the range; for multi-line ranges the run extends to
    // the end of the first line and an ellipsis names the rest
    let col = start.column.max(1);
    let width = match location.end {
        Some(end) if end.line == start.line && end.column > start.column => {
            end.column - start.column
        }
        Some(end) if end.line > start.line => line_text.len().saturating_sub(col - 1).max(1),
        _ => 1,
    };
    out.push_str(&format!(
        "{}    {}{}\n",
        indent,
        " ".repeat(col - 1),
        "^".repeat(width.max(1))
    ));
    if let Some(end) = location.end {
        if end.line > start.line {
            out.push_str(&format!(
                "{}    ... and next {} lines\n",
                indent,
                end.line - start.line
            ));
        }
    }
}
