//! Error taxonomy.
//!
//! `BackendError` is what collaborators return. `ErrorBanner` is the typed
//! display state the workspace converts every failure into, so nothing
//! reaches the shell as an unhandled fault.

use thiserror::Error;

use super::DocumentId;

/// Errors reported by storage, compiler and artifact collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    #[error("{0}")]
    Storage(String),

    /// The compile call itself failed (distinct from a failed compilation).
    #[error("{0}")]
    Compiler(String),

    #[error("{0}")]
    Fetch(String),

    #[error("{0}")]
    Export(String),
}

impl BackendError {
    pub fn storage(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Storage(format!("{context}: {err}"))
    }

    pub fn compiler(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Compiler(format!("{context}: {err}"))
    }

    pub fn fetch(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Fetch(format!("{context}: {err}"))
    }

    /// Banner category this error surfaces as.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound(_) => FailureKind::NotFound,
            Self::Storage(_) => FailureKind::Storage,
            Self::Compiler(_) => FailureKind::CompilerTransport,
            Self::Fetch(_) => FailureKind::Fetch,
            Self::Export(_) => FailureKind::Export,
        }
    }
}

/// Category of the failure shown in the error banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Compile blocked, setup flow offered instead.
    ToolchainMissing,
    Storage,
    NotFound,
    CompilerTransport,
    /// The compiler ran and reported `success = false`.
    CompilationFailure,
    Fetch,
    Export,
}

/// The single dismissible error surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub kind: FailureKind,
    pub message: String,
}

impl ErrorBanner {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Build a banner from a collaborator error, prefixed with what was attempted.
    pub fn from_backend(action: &str, err: &BackendError) -> Self {
        Self::new(err.kind(), format!("{action}: {err}"))
    }
}
