//! Document management commands: `list`, `new`, `show`, `delete`.

use std::io::{self, Write};

use anyhow::{Result, bail};
use owo_colors::{OwoColorize, Stream};

use super::common::{Session, confirm};
use crate::config::EditorConfig;
use crate::core::{DocumentId, DocumentSummary};
use crate::log;

pub async fn list(config: &EditorConfig) -> Result<()> {
    let session = Session::open(config).await?;
    let documents = session.handle.state().documents;
    session.close().await;

    if documents.is_empty() {
        log!("list"; "no documents yet, create one with `vitae new <title>`");
        return Ok(());
    }

    let mut out = io::stdout().lock();
    for doc in &documents {
        writeln!(out, "{}", format_row(doc))?;
    }
    Ok(())
}

fn format_row(doc: &DocumentSummary) -> String {
    let updated = doc
        .updated_at
        .with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M");
    let id = doc
        .id
        .as_str()
        .if_supports_color(Stream::Stdout, |s| s.dimmed().to_string())
        .to_string();
    format!("{id}  {updated}  {}", doc.title)
}

pub async fn new(config: &EditorConfig, title: &str) -> Result<()> {
    let title = title.trim();
    if title.is_empty() {
        bail!("title must not be empty");
    }

    let session = Session::open(config).await?;
    session.handle.create(title).await?;
    let view = session.handle.state();
    session.close().await;

    if let Some(banner) = view.last_error {
        bail!("{}", banner.message);
    }
    let Some(doc) = view.active else {
        bail!("document was not created");
    };
    log!("new"; "created \"{}\"", doc.title);
    println!("{}", doc.id);
    Ok(())
}

pub async fn show(config: &EditorConfig, id: &str) -> Result<()> {
    let session = Session::open(config).await?;
    let view = session.activate(id).await;
    session.close().await;

    let Some(doc) = view?.active else {
        bail!("document not found: {id}");
    };
    let mut out = io::stdout().lock();
    write!(out, "{}", doc.content)?;
    if !doc.content.ends_with('\n') {
        writeln!(out)?;
    }
    Ok(())
}

pub async fn delete(config: &EditorConfig, id: &str, yes: bool) -> Result<()> {
    let session = Session::open(config).await?;
    let result = delete_in(&session, id, yes).await;
    session.close().await;
    result
}

async fn delete_in(session: &Session, id: &str, yes: bool) -> Result<()> {
    let view = session.activate(id).await?;
    let title = view.active.map(|doc| doc.title).unwrap_or_default();

    if !yes && !confirm(format!("Delete \"{title}\"?")).await? {
        log!("delete"; "cancelled");
        return Ok(());
    }

    session.handle.delete(DocumentId::new(id)).await?;
    let view = session.handle.state();
    if let Some(banner) = view.last_error {
        bail!("{}", banner.message);
    }
    log!("delete"; "deleted \"{}\"", title);
    Ok(())
}
