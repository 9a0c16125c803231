//! Collaborators driven by the workspace.
//!
//! | Trait            | Responsibility                               |
//! |------------------|----------------------------------------------|
//! | `Toolchain`      | Is a LaTeX distribution available?           |
//! | `DocumentStore`  | Persistent document storage                  |
//! | `Compiler`       | Compile snapshots, export or release output  |
//! | `ArtifactSource` | Read compiled artifact bytes                 |
//!
//! Local implementations: [`JsonStore`] for storage and [`PdfLatex`] for the
//! three compiler-side traits.

mod latex;
mod store;

#[cfg(test)]
pub(crate) mod fake;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::EditorConfig;
use crate::core::{BackendError, Document, DocumentId};
use crate::diagnostic::Diagnostic;
use crate::preview::ArtifactRef;

pub use latex::{PdfLatex, setup_guide};
pub use store::JsonStore;

/// Outcome of a compile call that reached the compiler.
///
/// The artifact locator is present exactly when the compilation succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationResult {
    success: bool,
    artifact: Option<String>,
    diagnostics: Vec<Diagnostic>,
}

impl CompilationResult {
    pub fn succeeded(artifact: impl Into<String>, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            success: true,
            artifact: Some(artifact.into()),
            diagnostics,
        }
    }

    pub fn failed(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            success: false,
            artifact: None,
            diagnostics,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn artifact(&self) -> Option<&str> {
        self.artifact.as_deref()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_parts(self) -> (Option<String>, Vec<Diagnostic>) {
        (self.artifact, self.diagnostics)
    }
}

#[async_trait]
pub trait Toolchain: Send + Sync {
    async fn is_installed(&self) -> bool;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Document>, BackendError>;

    /// Fails with [`BackendError::NotFound`] if absent.
    async fn get(&self, id: &DocumentId) -> Result<Document, BackendError>;

    async fn create(&self, title: &str) -> Result<Document, BackendError>;

    async fn update(&self, id: &DocumentId, content: &str) -> Result<(), BackendError>;

    async fn delete(&self, id: &DocumentId) -> Result<(), BackendError>;
}

#[async_trait]
pub trait Compiler: Send + Sync {
    /// `Err` means the call itself failed; a compilation that ran and failed
    /// is `Ok` with `success() == false`.
    async fn compile(
        &self,
        id: &DocumentId,
        content: &str,
    ) -> Result<CompilationResult, BackendError>;

    /// Copy a compiled artifact to `destination`.
    async fn export(&self, artifact: &ArtifactRef, destination: &Path) -> Result<(), BackendError>;

    /// The artifact at `artifact` will not be shown or exported again.
    async fn discard(&self, _artifact: &str) {}
}

#[async_trait]
pub trait ArtifactSource: Send + Sync {
    async fn fetch(&self, reference: &ArtifactRef) -> Result<Vec<u8>, BackendError>;
}

/// The full set of collaborators.
#[derive(Clone)]
pub struct Backend {
    pub toolchain: Arc<dyn Toolchain>,
    pub store: Arc<dyn DocumentStore>,
    pub compiler: Arc<dyn Compiler>,
    pub artifacts: Arc<dyn ArtifactSource>,
}

impl Backend {
    /// JSON store + pdflatex, laid out under the configured data directory.
    pub fn local(config: &EditorConfig) -> Result<Self> {
        let store = Arc::new(JsonStore::open(config.storage.documents_file())?);
        crate::debug!("store"; "documents at {}", store.path().display());
        let latex = Arc::new(PdfLatex::new(&config.compile, config.output_dir())?);

        Ok(Self {
            toolchain: latex.clone(),
            store,
            compiler: latex.clone(),
            artifacts: latex,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_only_on_success() {
        let ok = CompilationResult::succeeded("/tmp/a.pdf", vec![]);
        assert!(ok.success());
        assert_eq!(ok.artifact(), Some("/tmp/a.pdf"));

        let failed = CompilationResult::failed(vec![Diagnostic::error("boom")]);
        assert!(!failed.success());
        assert_eq!(failed.artifact(), None);
        assert_eq!(failed.diagnostics().len(), 1);
    }
}
