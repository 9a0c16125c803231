//! `edit` command: a working `.tex` file mirrored into the workspace.
//!
//! ```text
//! editor saves file ─▶ notify ─▶ WorkspaceHandle::edit ─▶ debounce ─▶ compile
//!                                                                      │
//! terminal status line ◀──────────── watch<ViewState> ◀────────────────┘
//! ```
//!
//! The parent directory is watched rather than the file itself, so editors
//! that save by writing a temp file and renaming it are still seen.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use notify::{EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::common::{Session, print_setup_guide};
use crate::config::EditorConfig;
use crate::core::{listen_for_shutdown, shutdown_signal};
use crate::logger::{status_error, status_success, status_warning};
use crate::workspace::{CompileSummary, ViewState, WorkspaceHandle};
use crate::{debug, log};

/// Entries shown under a failed compile before the rest is elided.
const MAX_DETAIL_LINES: usize = 5;

pub async fn edit(
    config: &EditorConfig,
    id: &str,
    file: Option<&Path>,
    no_auto: bool,
) -> Result<()> {
    let session = Session::open(config).await?;
    let result = edit_in(&session, config, id, file, no_auto).await;
    session.close().await;
    result
}

async fn edit_in(
    session: &Session,
    config: &EditorConfig,
    id: &str,
    file: Option<&Path>,
    no_auto: bool,
) -> Result<()> {
    let view = session.activate(id).await?;
    let Some(doc) = view.active else {
        bail!("document not found: {id}");
    };

    let path = match file {
        Some(file) => std::path::absolute(file)?,
        None => config.output_dir().join(format!("{}.edit.tex", doc.id)),
    };
    mirror(&path, &doc.content)?;

    let handle = &session.handle;
    handle.set_auto_compile(!no_auto).await?;
    if !handle.state().auto_compile {
        log!("edit"; "auto-compile off, run `vitae compile {}` to build", doc.id);
    }
    if !view.toolchain_installed {
        print_setup_guide();
        status_warning("no LaTeX toolchain: edits are saved but not compiled");
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })?;
    let dir = path.parent().context("working file has no parent directory")?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;

    log!("edit"; "\"{}\" -> {}", doc.title, path.display());
    log!("edit"; "press Ctrl+C to stop");
    listen_for_shutdown();

    let mut views = handle.subscribe();
    let mut saved = doc.content;
    let mut reported: Option<CompileSummary> = None;

    loop {
        tokio::select! {
            biased;

            _ = shutdown_signal() => break,

            Some(res) = rx.recv() => match res {
                Ok(event) if touches(&event, &path) => {
                    sync_file(handle, &path, &mut saved).await?;
                    if !handle.state().toolchain_installed && handle.finish_setup().await? {
                        status_success("LaTeX toolchain found");
                    }
                }
                Ok(_) => {}
                Err(e) => log!("watch"; "notify error: {}", e),
            },

            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                if view.last_compile.is_some() && view.last_compile != reported {
                    report(&view);
                    reported = view.last_compile;
                }
            }
        }
    }

    log!("edit"; "stopped, last saved content kept in the store");
    Ok(())
}

/// Save the working file into the workspace if it differs from `saved`.
///
/// `saved` only advances when the save succeeded, so a failed save is
/// retried on the next change event even if the text is the same.
async fn sync_file(handle: &WorkspaceHandle, path: &Path, saved: &mut String) -> Result<()> {
    let Ok(content) = fs::read_to_string(path) else {
        return Ok(());
    };
    if content == *saved {
        return Ok(());
    }
    debug!("watch"; "{} changed", path.display());
    match handle.edit(content.as_str()).await? {
        Ok(()) => *saved = content,
        Err(banner) => {
            status_error(&banner.message, "");
            handle.dismiss_error().await?;
        }
    }
    Ok(())
}

/// Write the document into the working file, creating its directory.
fn mirror(path: &Path, content: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// The event modified or created `path`.
fn touches(event: &notify::Event, path: &Path) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event.paths.iter().any(|p| same_file(p, path))
}

fn same_file(a: &Path, b: &Path) -> bool {
    a == b || (a.file_name() == b.file_name() && canonical(a) == canonical(b))
}

fn canonical(path: &Path) -> PathBuf {
    let parent = path
        .parent()
        .and_then(|p| p.canonicalize().ok())
        .unwrap_or_default();
    parent.join(path.file_name().unwrap_or_default())
}

fn report(view: &ViewState) {
    let Some(summary) = &view.last_compile else {
        return;
    };
    if summary.success {
        let warnings = match summary.warnings {
            0 => String::new(),
            n => format!(", {}", crate::utils::plural::plural_count(n, "warning")),
        };
        status_success(&format!(
            "compiled in {}ms{}",
            summary.elapsed.as_millis(),
            warnings
        ));
    } else {
        let message = view
            .last_error
            .as_ref()
            .map_or("Compilation failed", |banner| banner.message.as_str());
        status_error(message, &failure_detail(view.log.as_deref().unwrap_or_default()));
    }
}

/// First entries of the rendered log, indented as in the log itself.
fn failure_detail(log: &str) -> String {
    let entries: Vec<&str> = log.lines().filter(|line| line.starts_with("  ")).collect();
    let mut lines: Vec<String> = entries
        .iter()
        .take(MAX_DETAIL_LINES)
        .map(|line| line.to_string())
        .collect();
    if entries.len() > MAX_DETAIL_LINES {
        lines.push(format!("  ... {} more", entries.len() - MAX_DETAIL_LINES));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;
    use crate::compile::CompilePolicy;
    use crate::diagnostic::{Diagnostic, classify};
    use crate::workspace::Workspace;
    use notify::event::{CreateKind, ModifyKind};

    #[test]
    fn test_failure_detail_truncates() {
        let diagnostics: Vec<_> = (1..=7)
            .map(|n| Diagnostic::error(format!("error {n}")).at_line(n))
            .collect();
        let log = classify(&diagnostics, false).log;

        let detail = failure_detail(&log);
        let lines: Vec<_> = detail.lines().collect();
        assert_eq!(lines.len(), MAX_DETAIL_LINES + 1);
        assert_eq!(lines[0], "  Line 1: error 1");
        assert_eq!(lines[5], "  ... 2 more");
    }

    #[test]
    fn test_failure_detail_empty_log() {
        assert_eq!(failure_detail(""), "");
    }

    #[test]
    fn test_touches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.edit.tex");
        fs::write(&path, "x").unwrap();

        let modify = notify::Event::new(EventKind::Modify(ModifyKind::Any)).add_path(path.clone());
        assert!(touches(&modify, &path));

        let create = notify::Event::new(EventKind::Create(CreateKind::File))
            .add_path(dir.path().join("other.tex"));
        assert!(!touches(&create, &path));

        let access = notify::Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(path.clone());
        assert!(!touches(&access, &path));
    }

    #[tokio::test]
    async fn test_failed_save_is_retried() {
        let doc = crate::core::Document::new("Resume", "old");
        let fake = FakeBackend::new(vec![doc.clone()]);
        let (handle, _task) = Workspace::spawn(fake.backend(), CompilePolicy::default()).await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.tex");
        fs::write(&path, "new").unwrap();
        let mut saved = doc.content.clone();

        fake.store.fail_writes(true);
        sync_file(&handle, &path, &mut saved).await.unwrap();
        assert_eq!(saved, "old");
        assert_eq!(fake.store.content_of(&doc.id).as_deref(), Some("old"));
        assert_eq!(handle.state().last_error, None);

        // Same text on disk, store writable again.
        fake.store.fail_writes(false);
        sync_file(&handle, &path, &mut saved).await.unwrap();
        assert_eq!(saved, "new");
        assert_eq!(fake.store.content_of(&doc.id).as_deref(), Some("new"));

        let updates = fake.store.update_count();
        sync_file(&handle, &path, &mut saved).await.unwrap();
        assert_eq!(fake.store.update_count(), updates);
    }

    #[test]
    fn test_mirror_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.tex");
        mirror(&path, "\\documentclass{article}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "\\documentclass{article}");
    }
}
