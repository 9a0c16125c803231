//! Message handlers for the workspace actor.
//!
//! Every failure is converted into display state here. Nothing returns an
//! error to the run loop.

use std::path::PathBuf;
use std::time::Duration;

use tokio::time::Instant;

use super::view::{CompileSummary, PendingConfirmation};
use super::{TaskMsg, Workspace, nothing_to_export, toolchain_missing};
use crate::annotate::project_text;
use crate::backend::CompilationResult;
use crate::compile::{Completion, Gate, Ticket, Trigger};
use crate::core::{BackendError, DocumentId, ErrorBanner, FailureKind};
use crate::diagnostic::{Diagnostic, classify};
use crate::preview::{ArtifactRef, fetch_display};
use crate::utils::plural::plural_count;

impl Workspace {
    // =========================================================================
    // Documents
    // =========================================================================

    pub(super) async fn on_create(&mut self, title: &str) {
        let previous = self.session.active_id().cloned();
        match self.session.create(title).await {
            Ok(doc) => {
                crate::debug!("workspace"; "created {} ({})", doc.id, doc.title);
                if let Some(previous) = previous {
                    self.coordinator.deactivate(&previous);
                }
                self.clear_document_state();
            }
            Err(err) => {
                self.view.last_error =
                    Some(ErrorBanner::from_backend("Failed to create document", &err));
            }
        }
    }

    pub(super) async fn on_select(&mut self, id: &DocumentId) {
        let previous = self.session.active_id().cloned();
        if let Err(err) = self.session.select(id).await {
            self.view.last_error = Some(ErrorBanner::from_backend("Failed to load document", &err));
            return;
        }
        if let Some(previous) = previous {
            self.coordinator.deactivate(&previous);
        }
        self.clear_document_state();
    }

    /// Deleting the active document does not schedule a compile for its
    /// replacement; that waits for the next edit.
    pub(super) async fn on_delete(&mut self, id: &DocumentId) {
        match self.session.delete(id).await {
            Ok(deletion) => {
                self.coordinator.forget(id);
                if deletion.was_active {
                    self.clear_document_state();
                }
            }
            Err(err) => {
                self.view.last_error =
                    Some(ErrorBanner::from_backend("Failed to delete document", &err));
            }
        }
    }

    pub(super) async fn on_edit(&mut self, content: &str) -> Result<(), ErrorBanner> {
        let Some(id) = self.session.active_id().cloned() else {
            return Ok(());
        };
        if let Err(err) = self.session.update(&id, content).await {
            let banner = ErrorBanner::from_backend("Failed to save document", &err);
            self.view.last_error = Some(banner.clone());
            return Err(banner);
        }
        self.reproject();
        if let Some(deadline) = self.coordinator.content_changed(&id, Instant::now()) {
            crate::debug!("workspace"; "auto-compile {} at +{:?}", id, deadline - Instant::now());
        }
        Ok(())
    }

    /// Drop everything shown for the previously active document.
    fn clear_document_state(&mut self) {
        self.diagnostics.clear();
        self.loader.clear();
        self.view.markers.clear();
        self.view.log = None;
        if let Some(previous) = self.view.artifact.take() {
            self.spawn_discard(previous.locator().to_string());
        }
        self.view.pending_confirmation = None;
        self.view.last_compile = None;
    }

    // =========================================================================
    // Compilation
    // =========================================================================

    pub(super) fn on_compile(&mut self) {
        self.start_compile(Trigger::Manual);
    }

    pub(super) fn on_confirm(&mut self, proceed: bool) {
        let Some(pending) = self.view.pending_confirmation.take() else {
            return;
        };
        if proceed && self.session.is_active(&pending.doc) {
            self.start_compile(Trigger::Confirmed);
        }
    }

    pub(super) fn on_debounce_elapsed(&mut self, now: Instant) {
        if let Some(id) = self.coordinator.poll_debounce(now)
            && self.session.is_active(&id)
        {
            self.start_compile(Trigger::Auto);
        }
    }

    fn start_compile(&mut self, trigger: Trigger) {
        let Some(doc) = self.session.active().cloned() else {
            return;
        };
        match self.coordinator.request(&doc, trigger) {
            Gate::Proceed(ticket) => {
                crate::debug!("compile"; "{} #{} ({})", ticket.doc, ticket.seq, trigger.label());
                self.view.last_error = None;
                self.view.setup_required = false;
                self.view.pending_confirmation = None;
                self.spawn_compile(ticket, trigger, doc.content);
            }
            Gate::SetupRequired => {
                self.view.setup_required = true;
                self.view.last_error = Some(toolchain_missing());
            }
            Gate::NeedsConfirmation { chars, threshold } => {
                self.view.pending_confirmation = Some(PendingConfirmation {
                    doc: doc.id,
                    chars,
                    threshold,
                });
            }
            Gate::Skipped => {
                crate::debug!("compile"; "skipped {} (no toolchain)", doc.id);
            }
        }
    }

    fn spawn_compile(&self, ticket: Ticket, trigger: Trigger, content: String) {
        let compiler = self.backend.compiler.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = compiler.compile(&ticket.doc, &content).await;
            let _ = tx.send(TaskMsg::CompileDone {
                ticket,
                trigger,
                outcome,
                elapsed: started.elapsed(),
            });
        });
    }

    pub(super) fn on_task(&mut self, task: TaskMsg) {
        match task {
            TaskMsg::CompileDone {
                ticket,
                trigger,
                outcome,
                elapsed,
            } => {
                let completion = self.coordinator.complete(&ticket);
                if completion == Completion::Superseded || !self.session.is_active(&ticket.doc) {
                    crate::debug!("compile"; "dropped stale result {} #{}", ticket.doc, ticket.seq);
                    if let Ok(result) = outcome
                        && let (Some(locator), _) = result.into_parts()
                    {
                        self.spawn_discard(locator);
                    }
                    return;
                }
                match outcome {
                    Ok(result) => self.apply_result(ticket.doc, trigger, result, elapsed),
                    Err(err) => self.apply_transport_error(ticket.doc, trigger, &err, elapsed),
                }
            }
            TaskMsg::PreviewFetched { reference, outcome } => {
                if !self.loader.finish(&reference, outcome) {
                    crate::debug!("preview"; "ignored stale fetch {}", reference);
                }
            }
        }
    }

    fn apply_result(
        &mut self,
        doc: DocumentId,
        trigger: Trigger,
        result: CompilationResult,
        elapsed: Duration,
    ) {
        let success = result.success();
        let (artifact, diagnostics) = result.into_parts();
        let classification = classify(&diagnostics, success);

        self.diagnostics = diagnostics;
        self.reproject();
        self.view.log = Some(classification.log);
        self.view.last_compile = Some(CompileSummary {
            doc,
            trigger,
            success,
            errors: classification.errors.len(),
            warnings: classification.warnings.len(),
            elapsed,
        });

        if success && let Some(locator) = artifact {
            let reference = self.versions.stamp(locator);
            if let Some(previous) = self.view.artifact.replace(reference.clone())
                && previous.locator() != reference.locator()
            {
                self.spawn_discard(previous.locator().to_string());
            }
            if let Some(reference) = self.loader.point_to(Some(reference)) {
                self.spawn_fetch(reference);
            }
        } else {
            self.view.last_error = Some(ErrorBanner::new(
                FailureKind::CompilationFailure,
                format!(
                    "Compilation failed: {}",
                    plural_count(classification.errors.len(), "error")
                ),
            ));
        }
    }

    /// The compile call failed before producing a result.
    fn apply_transport_error(
        &mut self,
        doc: DocumentId,
        trigger: Trigger,
        err: &BackendError,
        elapsed: Duration,
    ) {
        crate::debug!("compile"; "{} failed to run: {}", doc, err);
        let classification = classify(&[Diagnostic::error(err.to_string())], false);

        self.diagnostics.clear();
        self.view.markers.clear();
        self.view.log = Some(classification.log);
        self.view.last_error = Some(ErrorBanner::from_backend("Compilation error", err));
        self.view.last_compile = Some(CompileSummary {
            doc,
            trigger,
            success: false,
            errors: 1,
            warnings: 0,
            elapsed,
        });
    }

    fn spawn_fetch(&self, reference: ArtifactRef) {
        let artifacts = self.backend.artifacts.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let outcome = fetch_display(artifacts.as_ref(), &reference).await;
            let _ = tx.send(TaskMsg::PreviewFetched { reference, outcome });
        });
    }

    /// Release an artifact that is no longer shown.
    fn spawn_discard(&self, locator: String) {
        let compiler = self.backend.compiler.clone();
        tokio::spawn(async move {
            compiler.discard(&locator).await;
        });
    }

    /// Rebuild markers from the kept diagnostics against the current text.
    fn reproject(&mut self) {
        self.view.markers = match self.session.active() {
            Some(doc) => project_text(&self.diagnostics, &doc.content),
            None => Vec::new(),
        };
    }

    // =========================================================================
    // Export and setup
    // =========================================================================

    pub(super) async fn on_export(&mut self, destination: PathBuf) -> Result<(), ErrorBanner> {
        let artifact = match (self.session.active_id(), &self.view.artifact) {
            (Some(_), Some(artifact)) => artifact.clone(),
            _ => {
                let banner = nothing_to_export();
                self.view.last_error = Some(banner.clone());
                return Err(banner);
            }
        };

        match self.backend.compiler.export(&artifact, &destination).await {
            Ok(()) => {
                crate::debug!("export"; "{} -> {}", artifact, destination.display());
                Ok(())
            }
            Err(err) => {
                let banner = ErrorBanner::from_backend("Export failed", &err);
                self.view.last_error = Some(banner.clone());
                Err(banner)
            }
        }
    }

    pub(super) async fn on_finish_setup(&mut self) -> bool {
        let installed = self.backend.toolchain.is_installed().await;
        self.coordinator.set_toolchain_installed(installed);
        if installed {
            self.view.setup_required = false;
            if self
                .view
                .last_error
                .as_ref()
                .is_some_and(|banner| banner.kind == FailureKind::ToolchainMissing)
            {
                self.view.last_error = None;
            }
        }
        installed
    }
}
