//! Severity partitioning and log rendering.

use std::fmt::Write;

use super::Diagnostic;

const LOG_HEADER: &str = "LaTeX compilation log";

/// Diagnostics split by severity, plus the rendered log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub log: String,
}

/// Partition `diagnostics` by severity and render the log.
///
/// Relative order inside each partition is the input order. Pure: the same
/// input always yields byte-identical output.
pub fn classify(diagnostics: &[Diagnostic], success: bool) -> Classification {
    let (errors, warnings): (Vec<_>, Vec<_>) =
        diagnostics.iter().cloned().partition(Diagnostic::is_error);

    let log = render_log(&errors, &warnings, success);
    Classification {
        errors,
        warnings,
        log,
    }
}

/// Render the multi-section compilation log.
///
/// ```text
/// LaTeX compilation log
/// =====================
///
/// ERRORS (1):
///   Line 12: Undefined control sequence
///
/// Status: compilation failed
/// ```
pub fn render_log(errors: &[Diagnostic], warnings: &[Diagnostic], success: bool) -> String {
    let mut out = String::new();
    writeln!(out, "{LOG_HEADER}").ok();
    writeln!(out, "{}", "=".repeat(LOG_HEADER.len())).ok();
    writeln!(out).ok();

    write_section(&mut out, "ERRORS", errors);
    write_section(&mut out, "WARNINGS", warnings);

    let status = if success {
        "compilation succeeded"
    } else {
        "compilation failed"
    };
    writeln!(out, "Status: {status}").ok();
    out
}

fn write_section(out: &mut String, title: &str, items: &[Diagnostic]) {
    if items.is_empty() {
        return;
    }
    writeln!(out, "{} ({}):", title, items.len()).ok();
    for item in items {
        writeln!(out, "  {item}").ok();
    }
    writeln!(out).ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;

    fn mixed() -> Vec<Diagnostic> {
        vec![
            Diagnostic::warning("Citation `knuth' undefined").at_line(4),
            Diagnostic::error("Undefined control sequence").at_line(12),
            Diagnostic::warning("There were undefined references"),
            Diagnostic::error("Missing $ inserted").at_line(3),
        ]
    }

    #[test]
    fn test_partition_preserves_order() {
        let result = classify(&mixed(), false);

        let error_lines: Vec<_> = result.errors.iter().map(|d| d.line).collect();
        assert_eq!(error_lines, vec![Some(12), Some(3)]);

        let warning_lines: Vec<_> = result.warnings.iter().map(|d| d.line).collect();
        assert_eq!(warning_lines, vec![Some(4), None]);
    }

    #[test]
    fn test_partition_is_complete_and_idempotent() {
        let input = mixed();
        let first = classify(&input, false);
        assert_eq!(first.errors.len() + first.warnings.len(), input.len());
        assert!(first.errors.iter().all(|d| d.severity == Severity::Error));
        assert!(first.warnings.iter().all(|d| d.severity == Severity::Warning));

        let joined: Vec<_> = first
            .errors
            .iter()
            .chain(first.warnings.iter())
            .cloned()
            .collect();
        let second = classify(&joined, false);
        assert_eq!(second.errors, first.errors);
        assert_eq!(second.warnings, first.warnings);
    }

    #[test]
    fn test_log_layout() {
        let log = classify(&mixed(), false).log;
        let expected = "\
LaTeX compilation log
=====================

ERRORS (2):
  Line 12: Undefined control sequence
  Line 3: Missing $ inserted

WARNINGS (2):
  Line 4: Citation `knuth' undefined
  There were undefined references

Status: compilation failed
";
        assert_eq!(log, expected);
    }

    #[test]
    fn test_empty_sections_omitted() {
        let log = classify(&[], true).log;
        assert!(!log.contains("ERRORS"));
        assert!(!log.contains("WARNINGS"));
        assert!(log.ends_with("Status: compilation succeeded\n"));
    }

    #[test]
    fn test_only_warnings_on_success() {
        let diags = vec![Diagnostic::warning("Overfull \\hbox").at_line(9)];
        let result = classify(&diags, true);
        assert!(result.errors.is_empty());
        assert!(!result.log.contains("ERRORS"));
        assert!(result.log.contains("WARNINGS (1):\n  Line 9: Overfull \\hbox\n"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let input = mixed();
        assert_eq!(classify(&input, false).log, classify(&input, false).log);
        assert_ne!(classify(&input, false).log, classify(&input, true).log);
    }

    #[test]
    fn test_resume_scenario() {
        let diags = vec![Diagnostic::error("Undefined control sequence").at_line(12)];
        let result = classify(&diags, false);

        assert_eq!(result.errors, diags);
        assert!(result.warnings.is_empty());
        assert!(result.log.contains("Line 12: Undefined control sequence"));
        assert!(result.log.contains("Status: compilation failed"));
    }
}
