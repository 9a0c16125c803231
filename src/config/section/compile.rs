//! `[compile]` section configuration.
//!
//! ```toml
//! [compile]
//! program = "pdflatex"
//! args = ["-interaction=nonstopmode", "-file-line-error"]
//! output_dir = ""                    # empty: <data_dir>/temp
//! auto = false                       # auto-compile after edits
//! debounce_ms = 2000                 # quiet period before auto-compile
//! large_document_threshold = 10000   # characters, 0 disables the gate
//! confirm_large_documents = true
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Compiler executable, looked up on `PATH`.
    pub program: String,

    /// Arguments placed before `-output-directory <dir> <file>.tex`.
    pub args: Vec<String>,

    /// Where `.tex` sources and PDFs are written.
    pub output_dir: Option<PathBuf>,

    /// Whether auto-compile starts enabled.
    pub auto: bool,

    pub debounce_ms: u64,

    /// Manual compiles of documents longer than this many characters ask
    /// for confirmation first.
    pub large_document_threshold: usize,

    pub confirm_large_documents: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            program: "pdflatex".into(),
            args: vec!["-interaction=nonstopmode".into(), "-file-line-error".into()],
            output_dir: None,
            auto: false,
            debounce_ms: 2000,
            large_document_threshold: 10_000,
            confirm_large_documents: true,
        }
    }
}

impl CompileConfig {
    pub const PROGRAM: FieldPath = FieldPath::new("compile.program");
    pub const DEBOUNCE_MS: FieldPath = FieldPath::new("compile.debounce_ms");
    pub const ARGS: FieldPath = FieldPath::new("compile.args");

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Size gate, `None` when disabled.
    pub fn confirm_threshold(&self) -> Option<usize> {
        (self.confirm_large_documents && self.large_document_threshold > 0)
            .then_some(self.large_document_threshold)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.program.trim().is_empty() {
            diag.error_with_hint(
                Self::PROGRAM,
                "compiler program is empty",
                "set it to `pdflatex` or another LaTeX engine on PATH",
            );
        }
        if self.args.iter().any(|arg| arg.starts_with("-output-directory")) {
            diag.error(Self::ARGS, "`-output-directory` is chosen per compile run");
        }
        if self.debounce_ms == 0 {
            diag.error_with_hint(
                Self::DEBOUNCE_MS,
                "debounce must be positive",
                "the default is 2000",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_compile_defaults() {
        let config = test_parse_config("");
        let compile = &config.compile;
        assert_eq!(compile.program, "pdflatex");
        assert_eq!(compile.debounce(), Duration::from_secs(2));
        assert!(!compile.auto);
        assert_eq!(compile.confirm_threshold(), Some(10_000));
    }

    #[test]
    fn test_compile_overrides() {
        let config = test_parse_config(
            "[compile]\nprogram = \"xelatex\"\nauto = true\ndebounce_ms = 500\nlarge_document_threshold = 0",
        );
        assert_eq!(config.compile.program, "xelatex");
        assert!(config.compile.auto);
        assert_eq!(config.compile.debounce(), Duration::from_millis(500));
        assert_eq!(config.compile.confirm_threshold(), None);
    }

    #[test]
    fn test_confirmation_can_be_turned_off() {
        let config = test_parse_config("[compile]\nconfirm_large_documents = false");
        assert_eq!(config.compile.confirm_threshold(), None);
    }

    #[test]
    fn test_validate() {
        let compile = CompileConfig {
            program: " ".into(),
            args: vec!["-output-directory=/tmp".into()],
            debounce_ms: 0,
            ..CompileConfig::default()
        };
        let mut diag = ConfigDiagnostics::new();
        compile.validate(&mut diag);
        let fields: Vec<_> = diag.errors().iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                CompileConfig::PROGRAM,
                CompileConfig::ARGS,
                CompileConfig::DEBOUNCE_MS
            ]
        );
    }
}
