use std::io::Write;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use serde::Serialize;

use crate::span::Position;

/// A positioned semantic error.
///
/// Only the start of the offending node is known at this stage, so a
/// diagnostic carries a single position rather than a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Path of the file the offending node was parsed from.
    pub file: String,
    pub start: Position,
    pub message: String,
}

impl Diagnostic {
    pub fn new(file: impl Into<String>, start: Position, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            start,
            message: message.into(),
        }
    }

    /// Write an annotated source excerpt for this diagnostic to `out`.
    pub fn write_report(
        &self,
        source: &str,
        color: bool,
        out: &mut impl Write,
    ) -> std::io::Result<()> {
        let file_name = self.file.as_str();
        let start = (self.start.offset as usize).min(source.len());
        let end = start + 1;

        Report::build(ReportKind::Error, file_name, start)
            .with_config(Config::default().with_color(color))
            .with_message(&self.message)
            .with_label(
                Label::new((file_name, start..end))
                    .with_message(&self.message)
                    .with_color(Color::Red),
            )
            .finish()
            .write((file_name, Source::from(source)), out)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: error: {}", self.file, self.start, self.message)
    }
}

/// Append-only collector for diagnostics during analysis.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, file: impl Into<String>, start: Position, message: impl Into<String>) {
        self.report(Diagnostic::new(file, start, message));
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Render every diagnostic, in the order recorded.
    ///
    /// `source_of` maps a file path to its text; files it cannot supply are
    /// rendered in the one-line `Display` form instead.
    pub fn render<'s>(
        &self,
        source_of: impl Fn(&str) -> Option<&'s str>,
        color: bool,
    ) -> std::io::Result<String> {
        let mut out = Vec::new();
        for diag in &self.diagnostics {
            match source_of(&diag.file) {
                Some(source) => diag.write_report(source, color, &mut out)?,
                None => writeln!(out, "{}", diag)?,
            }
        }
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
