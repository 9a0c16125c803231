//! Common utilities shared across CLI commands.

use std::io::{self, Write};

use anyhow::{Context, Result, anyhow, bail};
use tokio::task::JoinHandle;

use crate::backend::{Backend, setup_guide};
use crate::compile::CompilePolicy;
use crate::config::{EditorConfig, cfg};
use crate::core::DocumentId;
use crate::preview::PreviewState;
use crate::{debug, log};
use crate::workspace::{ViewState, Workspace, WorkspaceHandle};

/// A running workspace for the lifetime of one command.
pub struct Session {
    pub handle: WorkspaceHandle,
    task: JoinHandle<()>,
}

impl Session {
    /// Start a workspace over the configured local backend.
    ///
    /// Fails if the document store could not be read.
    pub async fn open(config: &EditorConfig) -> Result<Self> {
        let backend = Backend::local(config)?;
        let (handle, task) = Workspace::spawn(backend, CompilePolicy::from(&config.compile)).await;

        if let Some(banner) = handle.state().last_error {
            bail!("{}", banner.message);
        }
        Ok(Self { handle, task })
    }

    /// Make `id` the active document.
    pub async fn activate(&self, id: &str) -> Result<ViewState> {
        let id = DocumentId::new(id);
        self.handle.select(id.clone()).await?;

        let view = self.handle.state();
        if view.active_id() != Some(&id) {
            let reason = view
                .last_error
                .map_or_else(|| format!("document not found: {id}"), |b| b.message);
            bail!("{reason}");
        }
        Ok(view)
    }

    /// Stop the workspace and wait for it to finish.
    pub async fn close(self) {
        self.handle.shutdown().await;
        let _ = self.task.await;
    }
}

/// Ask a yes/no question on stderr. Defaults to no.
pub async fn confirm(question: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || prompt(&question))
        .await
        .context("prompt task failed")?
}

fn prompt(question: &str) -> Result<bool> {
    eprint!("{question} [y/N] ");
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

/// Run a manual compile of the active document to completion.
///
/// Answers the large-document prompt with `assume_yes` or by asking, and
/// fails with the setup guide when no toolchain is installed.
pub async fn compile_active(handle: &WorkspaceHandle, assume_yes: bool) -> Result<ViewState> {
    handle.compile().await?;
    let view = handle.state();

    if view.setup_required {
        print_setup_guide();
        bail!("no LaTeX toolchain found");
    }

    if let Some(pending) = view.pending_confirmation {
        let proceed = assume_yes
            || confirm(format!(
                "Document has {} characters (threshold {}). Compilation may take a while. Continue?",
                pending.chars, pending.threshold
            ))
            .await?;
        handle.confirm_compile(proceed).await?;
        if !proceed {
            bail!("compilation cancelled");
        }
    }

    let view = handle
        .wait_until(|v| v.last_compile.is_some() && v.is_settled())
        .await?;
    Ok(view)
}

/// Log the outcome of a compile; print the log on failure or when the
/// view has it toggled visible.
///
/// Returns an error when the compile failed.
pub fn report_compile(view: &ViewState) -> Result<()> {
    let summary = view
        .last_compile
        .as_ref()
        .ok_or_else(|| anyhow!("no compilation result"))?;

    if (view.log_visible || !summary.success)
        && let Some(text) = &view.log
    {
        eprintln!("{text}");
    }
    for marker in &view.markers {
        debug!("marker"; "line {}: {}", marker.line, marker.message);
    }

    match &view.preview {
        PreviewState::Failed { error, .. } => log!("preview"; "{}", error),
        preview => {
            if let Some(uri) = preview.data_uri() {
                debug!("preview"; "ready, {} bytes encoded", uri.len());
            }
        }
    }

    if summary.success {
        log!("compile"; "{} compiled in {}ms ({} warning{})",
            summary.doc,
            summary.elapsed.as_millis(),
            summary.warnings,
            crate::utils::plural::plural_s(summary.warnings));
        Ok(())
    } else {
        let message = view
            .last_error
            .as_ref()
            .map_or("Compilation failed", |banner| banner.message.as_str());
        bail!("{message}")
    }
}

pub fn print_setup_guide() {
    log!("setup"; "{} is required to compile documents", cfg().compile.program);
    eprintln!("{}", setup_guide());
}
