//! Annotation Mapper - diagnostics to inline editor markers.
//!
//! Markers span a whole source line: column 1 up to `line length + 1`,
//! both 1-based. Diagnostics without a usable line, or pointing past the
//! end of the current text, are dropped here and only appear in the log.

use crate::diagnostic::{Diagnostic, Severity};

/// Marker severity as understood by the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSeverity {
    Error,
    Warning,
}

impl From<Severity> for MarkerSeverity {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => Self::Error,
            Severity::Warning => Self::Warning,
        }
    }
}

/// An inline annotation over a source range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub line: u32,
    pub start_column: u32,
    pub end_column: u32,
    pub severity: MarkerSeverity,
    pub message: String,
}

/// Read access to the lines of the document being annotated.
pub trait LineSource {
    /// Number of lines. A trailing newline starts a final empty line.
    fn line_count(&self) -> usize;

    /// Length in characters of 1-based `line`, without its line terminator.
    fn line_len(&self, line: usize) -> Option<usize>;
}

impl LineSource for str {
    fn line_count(&self) -> usize {
        self.split('\n').count()
    }

    fn line_len(&self, line: usize) -> Option<usize> {
        let text = self.split('\n').nth(line.checked_sub(1)?)?;
        let text = text.strip_suffix('\r').unwrap_or(text);
        Some(text.chars().count())
    }
}

/// Pre-split line lengths, for projecting many diagnostics over one text.
pub struct LineIndex {
    lengths: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let lengths = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).chars().count())
            .collect();
        Self { lengths }
    }
}

impl LineSource for LineIndex {
    fn line_count(&self) -> usize {
        self.lengths.len()
    }

    fn line_len(&self, line: usize) -> Option<usize> {
        self.lengths.get(line.checked_sub(1)?).copied()
    }
}

/// Project diagnostics onto `lines`, in input order.
///
/// The result always replaces the previous marker set wholesale.
pub fn project<L: LineSource + ?Sized>(diagnostics: &[Diagnostic], lines: &L) -> Vec<Marker> {
    diagnostics
        .iter()
        .filter_map(|diag| {
            let line = diag.placeable_line()?;
            let len = lines.line_len(line as usize)?;
            Some(Marker {
                line,
                start_column: 1,
                end_column: u32::try_from(len).unwrap_or(u32::MAX - 1) + 1,
                severity: diag.severity.into(),
                message: diag.message.clone(),
            })
        })
        .collect()
}

/// Project against raw text.
pub fn project_text(diagnostics: &[Diagnostic], text: &str) -> Vec<Marker> {
    if diagnostics.is_empty() {
        return Vec::new();
    }
    project(diagnostics, &LineIndex::new(text))
}
