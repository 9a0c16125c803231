//! Compiler diagnostics.
//!
//! # Module Structure
//!
//! - `classify` - Partition by severity and render the compilation log
//! - `parse` - Extract diagnostics from raw pdflatex output
//!
//! A [`Diagnostic`] with no line is document-level: it only shows up in the
//! rendered log, never as an inline marker.

mod classify;
mod parse;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use classify::classify;
pub use parse::parse_latex_output;

/// Two-level severity scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single compiler diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based source line; `None` for document-level diagnostics.
    pub line: Option<u32>,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            line: None,
            message: message.into(),
            severity,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Attach a source line.
    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Line usable for inline placement (present and positive).
    pub fn placeable_line(&self) -> Option<u32> {
        self.line.filter(|&line| line > 0)
    }
}

impl fmt::Display for Diagnostic {
    /// `Line L: message`, or just `message` when document-level.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "Line {}: {}", line, self.message),
            None => f.write_str(&self.message),
        }
    }
}
