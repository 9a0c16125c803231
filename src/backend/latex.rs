//! pdflatex-backed toolchain, compiler and artifact source.
//!
//! Every compile call runs in its own directory, `<output_dir>/<id>/<run>/`,
//! so a run that finishes late or fails never touches the PDF of another.
//! The workspace discards run directories it stops showing.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use uuid::Uuid;

use super::{ArtifactSource, CompilationResult, Compiler, Toolchain};
use crate::config::CompileConfig;
use crate::core::{BackendError, DocumentId};
use crate::diagnostic::{Diagnostic, parse_latex_output};
use crate::preview::ArtifactRef;
use crate::utils::exec::{Cmd, combined_output};
use crate::{debug, log};

/// Wide log lines keep `file:line: message` errors on one line.
const MAX_PRINT_LINE: &str = "10000";

struct Settings {
    program: String,
    args: Vec<String>,
    output_dir: PathBuf,
}

impl Settings {
    /// Fresh directory for one compile call of `id`.
    fn run_dir(&self, id: &DocumentId) -> PathBuf {
        self.output_dir
            .join(id.as_str())
            .join(Uuid::new_v4().simple().to_string())
    }

    fn compile(&self, id: &DocumentId, content: &str) -> Result<CompilationResult, BackendError> {
        let dir = self.run_dir(id);
        let result = self.compile_in(&dir, id, content);
        if !matches!(&result, Ok(r) if r.success()) {
            let _ = fs::remove_dir_all(&dir);
        }
        result
    }

    fn compile_in(
        &self,
        dir: &Path,
        id: &DocumentId,
        content: &str,
    ) -> Result<CompilationResult, BackendError> {
        fs::create_dir_all(dir)
            .map_err(|e| BackendError::compiler("Failed to create output directory", e))?;

        let tex = dir.join(format!("{id}.tex"));
        fs::write(&tex, content)
            .map_err(|e| BackendError::compiler("Failed to write tex file", e))?;

        let output = Cmd::new(&self.program)
            .args(&self.args)
            .arg("-output-directory")
            .arg(dir)
            .arg(&tex)
            .cwd(dir)
            .env("max_print_line", MAX_PRINT_LINE)
            .output()
            .map_err(|e| {
                BackendError::Compiler(format!(
                    "Failed to run {program}: {e:#}. Make sure {program} is installed and in PATH.",
                    program = self.program
                ))
            })?;

        let mut diagnostics = parse_latex_output(&combined_output(&output));
        let pdf = dir.join(format!("{id}.pdf"));
        let success = output.status.success() && pdf.is_file();

        if success {
            return Ok(CompilationResult::succeeded(
                pdf.to_string_lossy().replace('\\', "/"),
                diagnostics,
            ));
        }

        if !diagnostics.iter().any(Diagnostic::is_error) {
            let message = if output.status.success() {
                "PDF file was not generated".to_string()
            } else {
                format!("{} exited with {}", self.program, output.status)
            };
            diagnostics.push(Diagnostic::error(message));
        }
        Ok(CompilationResult::failed(diagnostics))
    }

    fn export(&self, artifact: &ArtifactRef, destination: &Path) -> Result<(), BackendError> {
        let pdf = Path::new(artifact.locator());
        if !pdf.is_file() {
            return Err(BackendError::Export(
                "PDF not found. Please compile first.".into(),
            ));
        }
        fs::copy(pdf, destination)
            .map(|_| ())
            .map_err(|e| BackendError::Export(format!("Failed to export PDF: {e}")))
    }

    /// Remove the run directory holding `artifact`.
    ///
    /// Locators outside a run directory of ours are left alone.
    fn discard(&self, artifact: &str) {
        let Some(dir) = Path::new(artifact).parent() else {
            return;
        };
        let is_run_dir = dir
            .parent()
            .and_then(Path::parent)
            .is_some_and(|root| root == self.output_dir);
        if !is_run_dir {
            return;
        }
        if let Err(e) = fs::remove_dir_all(dir) {
            debug!("latex"; "failed to remove {}: {}", dir.display(), e);
        }
    }
}

/// Local pdflatex installation.
#[derive(Clone)]
pub struct PdfLatex {
    settings: Arc<Settings>,
}

impl PdfLatex {
    pub fn new(config: &CompileConfig, output_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&output_dir).with_context(|| {
            format!("Failed to create output directory {}", output_dir.display())
        })?;
        Ok(Self {
            settings: Arc::new(Settings {
                program: config.program.clone(),
                args: config.args.clone(),
                output_dir,
            }),
        })
    }

    pub fn program(&self) -> &str {
        &self.settings.program
    }

    pub fn output_dir(&self) -> &Path {
        &self.settings.output_dir
    }

    /// Resolved path of the compiler binary, if it is on `PATH`.
    pub fn resolve(&self) -> Option<PathBuf> {
        which::which(&self.settings.program).ok()
    }

    /// First line of `<program> --version`, for diagnostics.
    pub fn version(&self) -> Result<String> {
        let output = Cmd::new(&self.settings.program).arg("--version").run()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }
}

#[async_trait]
impl Toolchain for PdfLatex {
    async fn is_installed(&self) -> bool {
        let installed = self.resolve().is_some();
        if !installed {
            log!("latex"; "`{}` not found on PATH", self.settings.program);
        }
        installed
    }
}

#[async_trait]
impl Compiler for PdfLatex {
    async fn compile(
        &self,
        id: &DocumentId,
        content: &str,
    ) -> Result<CompilationResult, BackendError> {
        let settings = Arc::clone(&self.settings);
        let id = id.clone();
        let content = content.to_string();
        tokio::task::spawn_blocking(move || settings.compile(&id, &content))
            .await
            .map_err(|e| BackendError::compiler("compile task failed", e))?
    }

    async fn export(&self, artifact: &ArtifactRef, destination: &Path) -> Result<(), BackendError> {
        let settings = Arc::clone(&self.settings);
        let artifact = artifact.clone();
        let destination = destination.to_path_buf();
        tokio::task::spawn_blocking(move || settings.export(&artifact, &destination))
            .await
            .map_err(|e| BackendError::Export(format!("export task failed: {e}")))?
    }

    async fn discard(&self, artifact: &str) {
        let settings = Arc::clone(&self.settings);
        let artifact = artifact.to_string();
        let _ = tokio::task::spawn_blocking(move || settings.discard(&artifact)).await;
    }
}

#[async_trait]
impl ArtifactSource for PdfLatex {
    async fn fetch(&self, reference: &ArtifactRef) -> Result<Vec<u8>, BackendError> {
        let locator = reference.locator().to_string();
        tokio::task::spawn_blocking(move || {
            fs::read(&locator).map_err(|e| BackendError::fetch(&locator, e))
        })
        .await
        .map_err(|e| BackendError::fetch("fetch task failed", e))?
    }
}

// ============================================================================
// Setup guidance
// ============================================================================

/// Install instructions for a LaTeX distribution on one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupGuide {
    pub platform: &'static str,
    pub distribution: &'static str,
    pub steps: &'static [&'static str],
    pub size: Option<&'static str>,
}

const WINDOWS: SetupGuide = SetupGuide {
    platform: "Windows",
    distribution: "MiKTeX",
    steps: &[
        "Download MiKTeX from https://miktex.org/download",
        "Run the installer (MiKTeX Setup)",
        "Choose \"Install MiKTeX for all users\" or \"for yourself\"",
        "Set \"Install missing packages on-the-fly\" to Yes",
        "Complete the installation",
        "Run `vitae doctor` to confirm pdflatex is found",
    ],
    size: Some("~200-500 MB"),
};

const MACOS: SetupGuide = SetupGuide {
    platform: "macOS",
    distribution: "MacTeX",
    steps: &[
        "Download MacTeX from https://www.tug.org/mactex/",
        "Run the MacTeX.pkg installer",
        "Follow the installation wizard",
        "Run `vitae doctor` to confirm pdflatex is found",
    ],
    size: Some("~4-5 GB"),
};

const LINUX: SetupGuide = SetupGuide {
    platform: "Linux",
    distribution: "TeX Live",
    steps: &[
        "Ubuntu/Debian: sudo apt-get install texlive-latex-base texlive-latex-extra",
        "Fedora: sudo dnf install texlive-scheme-medium",
        "Arch Linux: sudo pacman -S texlive-core texlive-latexextra",
        "Run `vitae doctor` to confirm pdflatex is found",
    ],
    size: None,
};

/// Guide for the platform this binary runs on.
pub fn setup_guide() -> &'static SetupGuide {
    guide_for(std::env::consts::OS)
}

fn guide_for(os: &str) -> &'static SetupGuide {
    match os {
        "windows" => &WINDOWS,
        "macos" => &MACOS,
        _ => &LINUX,
    }
}

impl fmt::Display for SetupGuide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "For {} - {}", self.platform, self.distribution)?;
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(f, "  {}. {step}", i + 1)?;
        }
        if let Some(size) = self.size {
            writeln!(f, "Installation size: {size}")?;
        }
        Ok(())
    }
}
