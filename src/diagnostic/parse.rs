//! pdflatex output parsing.
//!
//! Recognized shapes:
//!
//! ```text
//! ! Undefined control sequence.          error, line from the next `l.N`
//! l.12 \foo
//! ./doc.tex:12: Undefined control sequence.     (-file-line-error)
//! LaTeX Warning: Reference `x' on page 1 undefined on input line 5.
//! Package hyperref Warning: Token not allowed in a PDF string
//! (hyperref)                removing `\\' on input line 7.
//! Overfull \hbox (15.0pt too wide) in paragraph at lines 10--12
//! ```

use std::sync::LazyLock;

use regex::Regex;

use super::Diagnostic;

static FILE_LINE_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*\.tex:([0-9]+): (.+)$").unwrap());

static CONTEXT_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^l\.([0-9]+)").unwrap());

static WARNING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:LaTeX(?: Font)?|(?:Package|Class) ([^ \t]+)) Warning: (.*)$").unwrap()
});

static INPUT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*on input line ([0-9]+)\.?").unwrap());

static BAD_BOX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:Over|Under)full \\[hv]box").unwrap());

static BOX_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)[ \t]+(?:detected[ \t]+)?at lines? ([0-9]+)").unwrap());

/// How far past a `!` error we look for its `l.N` context line.
const CONTEXT_LOOKAHEAD: usize = 12;

/// Extract diagnostics from pdflatex terminal output, in output order.
pub fn parse_latex_output(output: &str) -> Vec<Diagnostic> {
    let lines: Vec<&str> = output.lines().collect();
    let mut diagnostics = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if let Some(caps) = FILE_LINE_ERROR.captures(line) {
            let mut diag = Diagnostic::error(tidy(&caps[2]));
            if let Ok(n) = caps[1].parse() {
                diag = diag.at_line(n);
            }
            diagnostics.push(diag);
        } else if let Some(rest) = line.strip_prefix('!') {
            let mut diag = Diagnostic::error(tidy(rest));
            if let Some(n) = context_line(&lines[i + 1..]) {
                diag = diag.at_line(n);
            }
            diagnostics.push(diag);
        } else if let Some(caps) = WARNING.captures(line) {
            let package = caps.get(1).map(|m| m.as_str());
            let mut text = caps[2].trim().to_string();

            let continued = continuation_lines(&lines[i + 1..], package);
            for extra in &lines[i + 1..i + 1 + continued] {
                text.push(' ');
                text.push_str(strip_continuation_prefix(extra, package));
            }
            i += continued;

            diagnostics.push(warning_from(&text));
        } else if BAD_BOX.is_match(line) {
            let diag = match BOX_LINE.captures(line) {
                Some(caps) => {
                    let diag = Diagnostic::warning(tidy(&caps[1]));
                    match caps[2].parse() {
                        Ok(n) => diag.at_line(n),
                        Err(_) => diag,
                    }
                }
                None => Diagnostic::warning(tidy(line)),
            };
            diagnostics.push(diag);
        }

        i += 1;
    }

    diagnostics
}

/// Find the `l.N` line that follows a `!` error, stopping at the next error.
fn context_line(following: &[&str]) -> Option<u32> {
    for line in following.iter().take(CONTEXT_LOOKAHEAD) {
        if line.starts_with('!') || FILE_LINE_ERROR.is_match(line) {
            return None;
        }
        if let Some(caps) = CONTEXT_LINE.captures(line) {
            return caps[1].parse().ok();
        }
    }
    None
}

/// Count continuation lines of a multi-line warning.
///
/// Package/class warnings continue with `(name)` prefixed lines; LaTeX
/// warnings continue with indented lines.
fn continuation_lines(following: &[&str], package: Option<&str>) -> usize {
    following
        .iter()
        .take_while(|line| {
            if line.trim().is_empty() {
                return false;
            }
            match package {
                Some(name) => line.starts_with(&format!("({name})")),
                None => line.starts_with(' '),
            }
        })
        .count()
}

fn strip_continuation_prefix<'a>(line: &'a str, package: Option<&str>) -> &'a str {
    let line = match package {
        Some(name) => line
            .strip_prefix(&format!("({name})"))
            .unwrap_or(line),
        None => line,
    };
    line.trim()
}

/// Build a warning, lifting `on input line N` into the structured line.
fn warning_from(text: &str) -> Diagnostic {
    match INPUT_LINE.captures(text) {
        Some(caps) => {
            let message = INPUT_LINE.replace(text, "");
            let diag = Diagnostic::warning(tidy(&message));
            match caps[1].parse() {
                Ok(n) => diag.at_line(n),
                Err(_) => diag,
            }
        }
        None => Diagnostic::warning(tidy(text)),
    }
}

/// Trim whitespace and one trailing period.
fn tidy(message: &str) -> String {
    let message = message.trim();
    message.strip_suffix('.').unwrap_or(message).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;

    #[test]
    fn test_bang_error_with_context_line() {
        let output = "\
(./doc.tex
! Undefined control sequence.
l.12 \\foo

?
";
        let diags = parse_latex_output(output);
        assert_eq!(
            diags,
            vec![Diagnostic::error("Undefined control sequence").at_line(12)]
        );
    }

    #[test]
    fn test_file_line_error() {
        let output = "/tmp/vitae/temp/abc.tex:7: LaTeX Error: Environment foo undefined.\n\
                      l.7 \\begin{foo}\n";
        let diags = parse_latex_output(output);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].line, Some(7));
        assert_eq!(diags[0].message, "LaTeX Error: Environment foo undefined");
        assert_eq!(diags[0].severity, Severity::Error);
    }

    #[test]
    fn test_bang_error_without_context_is_document_level() {
        let output = "! Emergency stop.\n<*> doc.tex\n!  ==> Fatal error occurred, no output PDF file produced!\n";
        let diags = parse_latex_output(output);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0], Diagnostic::error("Emergency stop"));
        assert_eq!(
            diags[1].message,
            "==> Fatal error occurred, no output PDF file produced!"
        );
        assert!(diags.iter().all(|d| d.line.is_none()));
    }

    #[test]
    fn test_context_search_stops_at_next_error() {
        let output = "! First problem.\n! Second problem.\nl.4 x\n";
        let diags = parse_latex_output(output);
        assert_eq!(diags[0].line, None);
        assert_eq!(diags[1].line, Some(4));
    }

    #[test]
    fn test_latex_warning_input_line() {
        let output = "LaTeX Warning: Reference `fig:1' on page 1 undefined on input line 5.\n";
        let diags = parse_latex_output(output);
        assert_eq!(
            diags,
            vec![Diagnostic::warning("Reference `fig:1' on page 1 undefined").at_line(5)]
        );
    }

    #[test]
    fn test_package_warning_continuation() {
        let output = "\
Package hyperref Warning: Token not allowed in a PDF string (Unicode):
(hyperref)                removing `\\\\' on input line 7.

[1]
";
        let diags = parse_latex_output(output);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].line, Some(7));
        assert_eq!(
            diags[0].message,
            "Token not allowed in a PDF string (Unicode): removing `\\\\'"
        );
    }

    #[test]
    fn test_document_level_warning() {
        let output = "LaTeX Warning: There were undefined references.\n";
        let diags = parse_latex_output(output);
        assert_eq!(
            diags,
            vec![Diagnostic::warning("There were undefined references")]
        );
    }

    #[test]
    fn test_bad_boxes() {
        let output = "\
Overfull \\hbox (15.0pt too wide) in paragraph at lines 10--12
Underfull \\vbox (badness 10000) detected at line 20
";
        let diags = parse_latex_output(output);
        assert_eq!(
            diags,
            vec![
                Diagnostic::warning("Overfull \\hbox (15.0pt too wide) in paragraph").at_line(10),
                Diagnostic::warning("Underfull \\vbox (badness 10000)").at_line(20),
            ]
        );
    }

    #[test]
    fn test_mixed_output_keeps_order() {
        let output = "\
LaTeX Warning: Citation `knuth' on page 1 undefined on input line 3.
! Missing $ inserted.
<inserted text>
                $
l.9 a_b
";
        let diags = parse_latex_output(output);
        let severities: Vec<_> = diags.iter().map(|d| d.severity).collect();
        assert_eq!(severities, vec![Severity::Warning, Severity::Error]);
        assert_eq!(diags[1].line, Some(9));
    }

    #[test]
    fn test_patterns_compile_without_unicode_classes() {
        for pattern in [
            &FILE_LINE_ERROR,
            &CONTEXT_LINE,
            &WARNING,
            &INPUT_LINE,
            &BAD_BOX,
            &BOX_LINE,
        ] {
            LazyLock::force(pattern);
        }
    }

    #[test]
    fn test_clean_output() {
        let output = "This is pdfTeX, Version 3.141592653\nOutput written on doc.pdf (1 page).\n";
        assert!(parse_latex_output(output).is_empty());
    }
}
