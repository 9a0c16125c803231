//! Read-only projection published to the view layer.

use std::time::Duration;

use crate::annotate::Marker;
use crate::compile::Trigger;
use crate::core::{Document, DocumentId, DocumentSummary, ErrorBanner};
use crate::preview::{ArtifactRef, PreviewState};

/// Large-document prompt waiting for an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    pub doc: DocumentId,
    pub chars: usize,
    pub threshold: usize,
}

/// Outcome of the last applied compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileSummary {
    pub doc: DocumentId,
    pub trigger: Trigger,
    pub success: bool,
    pub errors: usize,
    pub warnings: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub documents: Vec<DocumentSummary>,
    pub active: Option<Document>,
    /// A compile for the active document is outstanding.
    pub compiling: bool,
    pub auto_compile: bool,
    pub toolchain_installed: bool,
    /// A manual compile was blocked by a missing toolchain.
    pub setup_required: bool,
    pub pending_confirmation: Option<PendingConfirmation>,
    /// Most recent failure, until dismissed or replaced.
    pub last_error: Option<ErrorBanner>,
    /// Rendered log of the last applied compile.
    pub log: Option<String>,
    pub log_visible: bool,
    pub markers: Vec<Marker>,
    /// Latest artifact of the active document.
    pub artifact: Option<ArtifactRef>,
    pub preview: PreviewState,
    pub last_compile: Option<CompileSummary>,
}

impl ViewState {
    pub fn active_id(&self) -> Option<&DocumentId> {
        self.active.as_ref().map(|doc| &doc.id)
    }

    /// Nothing outstanding: no compile in flight and no preview loading.
    pub fn is_settled(&self) -> bool {
        !self.compiling && !self.preview.is_loading()
    }
}
