//! Workspace Actor - composes session, coordinator, mapper and loader.
//!
//! # Responsibility
//!
//! One task owns all editor state and handles one message at a time.
//! Storage calls are awaited in place; compiler calls and artifact fetches
//! run as spawned tasks and report back over an internal channel, so a slow
//! compile never blocks edits or selection.
//!
//! ```text
//! WorkspaceHandle ──WorkspaceMsg──▶ Workspace ──spawn──▶ compile / fetch
//!        ▲                             │  ▲                   │
//!        └────── watch<ViewState> ─────┘  └──────TaskMsg──────┘
//! ```
//!
//! After every message the view is rebuilt and published on a `watch`
//! channel; replies are sent only after that, so a caller that awaited an
//! action always observes its effect.

mod handlers;
mod messages;
mod view;


use std::future::pending;
use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

use crate::backend::Backend;
use crate::compile::{CompileCoordinator, CompilePolicy};
use crate::core::{Document, ErrorBanner, FailureKind};
use crate::diagnostic::Diagnostic;
use crate::preview::{ArtifactLoader, ArtifactVersions};
use crate::session::SessionManager;

pub use messages::{Reply, TaskMsg, WorkspaceMsg};
pub use view::{CompileSummary, ViewState};

/// Channel buffer size
const CHANNEL_BUFFER: usize = 32;

/// The workspace task has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("workspace is no longer running")]
pub struct WorkspaceClosed;

pub struct Workspace {
    backend: Backend,
    session: SessionManager,
    coordinator: CompileCoordinator,
    loader: ArtifactLoader,
    versions: ArtifactVersions,
    /// Diagnostics of the last applied compile, kept for re-projection.
    diagnostics: Vec<Diagnostic>,
    view: ViewState,
    view_tx: watch::Sender<ViewState>,
    rx: mpsc::Receiver<WorkspaceMsg>,
    task_tx: mpsc::UnboundedSender<TaskMsg>,
    task_rx: mpsc::UnboundedReceiver<TaskMsg>,
}

impl Workspace {
    /// Check the toolchain, load documents and start the actor.
    pub async fn spawn(
        backend: Backend,
        policy: CompilePolicy,
    ) -> (WorkspaceHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(ViewState::default());

        let installed = backend.toolchain.is_installed().await;
        crate::debug!("workspace"; "toolchain installed: {}", installed);

        let mut workspace = Self {
            session: SessionManager::new(backend.store.clone()),
            coordinator: CompileCoordinator::new(policy, installed),
            backend,
            loader: ArtifactLoader::new(),
            versions: ArtifactVersions::new(),
            diagnostics: Vec::new(),
            view: ViewState::default(),
            view_tx,
            rx,
            task_tx,
            task_rx,
        };

        if let Err(err) = workspace.session.load_all().await {
            workspace.view.last_error =
                Some(ErrorBanner::from_backend("Failed to load documents", &err));
        }
        workspace.publish();

        let task = tokio::spawn(workspace.run());
        (WorkspaceHandle { tx, view: view_rx }, task)
    }

    /// Main event loop
    async fn run(mut self) {
        loop {
            let deadline = self.coordinator.debounce_deadline();
            tokio::select! {
                biased; // User actions first

                msg = self.rx.recv() => match msg {
                    Some(WorkspaceMsg::Shutdown) | None => break,
                    Some(msg) => self.dispatch(msg).await,
                },

                Some(task) = self.task_rx.recv() => {
                    self.on_task(task);
                    self.publish();
                }

                _ = wait_deadline(deadline) => {
                    self.on_debounce_elapsed(Instant::now());
                    self.publish();
                }
            }
        }
        crate::debug!("workspace"; "stopped");
    }

    async fn dispatch(&mut self, msg: WorkspaceMsg) {
        match msg {
            WorkspaceMsg::Create { title, reply } => {
                self.on_create(&title).await;
                self.ack(reply, ());
            }
            WorkspaceMsg::Select { id, reply } => {
                self.on_select(&id).await;
                self.ack(reply, ());
            }
            WorkspaceMsg::Delete { id, reply } => {
                self.on_delete(&id).await;
                self.ack(reply, ());
            }
            WorkspaceMsg::Edit { content, reply } => {
                let saved = self.on_edit(&content).await;
                self.ack(reply, saved);
            }
            WorkspaceMsg::Compile { reply } => {
                self.on_compile();
                self.ack(reply, ());
            }
            WorkspaceMsg::ConfirmCompile { proceed, reply } => {
                self.on_confirm(proceed);
                self.ack(reply, ());
            }
            WorkspaceMsg::SetAutoCompile { enabled, reply } => {
                self.coordinator.set_auto_compile(enabled);
                self.ack(reply, ());
            }
            WorkspaceMsg::ToggleLog { reply } => {
                self.view.log_visible = !self.view.log_visible;
                self.ack(reply, ());
            }
            WorkspaceMsg::Export { destination, reply } => {
                let result = self.on_export(destination).await;
                self.ack(reply, result);
            }
            WorkspaceMsg::DismissError { reply } => {
                self.view.last_error = None;
                self.ack(reply, ());
            }
            WorkspaceMsg::FinishSetup { reply } => {
                let installed = self.on_finish_setup().await;
                self.ack(reply, installed);
            }
            WorkspaceMsg::Shutdown => {}
        }
    }

    fn ack<T>(&mut self, reply: Reply<T>, value: T) {
        self.publish();
        let _ = reply.send(value);
    }

    /// Refresh derived fields and broadcast the view.
    fn publish(&mut self) {
        let active = self.session.active().cloned();
        self.view.compiling = active
            .as_ref()
            .is_some_and(|doc| self.coordinator.is_compiling(&doc.id));
        self.view.documents = self.session.documents().iter().map(Document::summary).collect();
        self.view.active = active;
        self.view.auto_compile = self.coordinator.auto_compile();
        self.view.toolchain_installed = self.coordinator.toolchain_installed();
        self.view.preview = self.loader.state().clone();
        self.view_tx.send_replace(self.view.clone());
    }
}

/// Sleep until the debounce deadline, or forever when idle.
async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Cloneable front end for the workspace actor.
#[derive(Clone)]
pub struct WorkspaceHandle {
    tx: mpsc::Sender<WorkspaceMsg>,
    view: watch::Receiver<ViewState>,
}

impl WorkspaceHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> WorkspaceMsg,
    ) -> Result<T, WorkspaceClosed> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(make(reply)).await.map_err(|_| WorkspaceClosed)?;
        rx.await.map_err(|_| WorkspaceClosed)
    }

    pub async fn create(&self, title: impl Into<String>) -> Result<(), WorkspaceClosed> {
        let title = title.into();
        self.request(|reply| WorkspaceMsg::Create { title, reply })
            .await
    }

    pub async fn select(&self, id: crate::core::DocumentId) -> Result<(), WorkspaceClosed> {
        self.request(|reply| WorkspaceMsg::Select { id, reply }).await
    }

    pub async fn delete(&self, id: crate::core::DocumentId) -> Result<(), WorkspaceClosed> {
        self.request(|reply| WorkspaceMsg::Delete { id, reply }).await
    }

    /// Replace the active document's content.
    ///
    /// The inner error is the banner shown when the save failed.
    pub async fn edit(
        &self,
        content: impl Into<String>,
    ) -> Result<Result<(), ErrorBanner>, WorkspaceClosed> {
        let content = content.into();
        self.request(|reply| WorkspaceMsg::Edit { content, reply })
            .await
    }

    pub async fn compile(&self) -> Result<(), WorkspaceClosed> {
        self.request(|reply| WorkspaceMsg::Compile { reply }).await
    }

    pub async fn confirm_compile(&self, proceed: bool) -> Result<(), WorkspaceClosed> {
        self.request(|reply| WorkspaceMsg::ConfirmCompile { proceed, reply })
            .await
    }

    pub async fn set_auto_compile(&self, enabled: bool) -> Result<(), WorkspaceClosed> {
        self.request(|reply| WorkspaceMsg::SetAutoCompile { enabled, reply })
            .await
    }

    pub async fn toggle_log(&self) -> Result<(), WorkspaceClosed> {
        self.request(|reply| WorkspaceMsg::ToggleLog { reply }).await
    }

    /// Export the active document's artifact to `destination`.
    pub async fn export(
        &self,
        destination: impl Into<PathBuf>,
    ) -> Result<Result<(), ErrorBanner>, WorkspaceClosed> {
        let destination = destination.into();
        self.request(|reply| WorkspaceMsg::Export { destination, reply })
            .await
    }

    pub async fn dismiss_error(&self) -> Result<(), WorkspaceClosed> {
        self.request(|reply| WorkspaceMsg::DismissError { reply })
            .await
    }

    /// Check the toolchain again. Returns whether it is installed now.
    pub async fn finish_setup(&self) -> Result<bool, WorkspaceClosed> {
        self.request(|reply| WorkspaceMsg::FinishSetup { reply })
            .await
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(WorkspaceMsg::Shutdown).await;
    }

    /// Latest published view.
    pub fn state(&self) -> ViewState {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view.clone()
    }

    /// Wait until the published view satisfies `predicate`.
    pub async fn wait_until(
        &self,
        predicate: impl FnMut(&ViewState) -> bool,
    ) -> Result<ViewState, WorkspaceClosed> {
        let mut rx = self.view.clone();
        let view = rx.wait_for(predicate).await.map_err(|_| WorkspaceClosed)?;
        Ok(view.clone())
    }
}

/// Banner shown when a compile is blocked on setup.
pub(crate) fn toolchain_missing() -> ErrorBanner {
    ErrorBanner::new(
        FailureKind::ToolchainMissing,
        "No LaTeX toolchain found. Install one to compile.",
    )
}

/// Banner shown when exporting before any successful compile.
pub(crate) fn nothing_to_export() -> ErrorBanner {
    ErrorBanner::new(
        FailureKind::Export,
        "Nothing to export. Compile the document first.",
    )
}
