//! `compile` and `export` commands.

use std::path::Path;

use anyhow::{Result, bail};

use super::CompileArgs;
use super::common::{Session, compile_active, report_compile};
use crate::config::EditorConfig;
use crate::log;

pub async fn compile(config: &EditorConfig, args: &CompileArgs) -> Result<()> {
    let session = Session::open(config).await?;
    let result = compile_in(&session, args).await;
    session.close().await;
    result
}

async fn compile_in(session: &Session, args: &CompileArgs) -> Result<()> {
    prepare(session, args).await?;
    let view = compile_active(&session.handle, args.yes).await?;
    report_compile(&view)?;

    if let Some(reference) = &view.artifact {
        println!("{}", reference.locator());
    }
    Ok(())
}

/// Activate the document and show its log if asked to.
async fn prepare(session: &Session, args: &CompileArgs) -> Result<()> {
    let view = session.activate(&args.id).await?;
    if args.log != view.log_visible {
        session.handle.toggle_log().await?;
    }
    Ok(())
}

pub async fn export(config: &EditorConfig, args: &CompileArgs, destination: &Path) -> Result<()> {
    let session = Session::open(config).await?;
    let result = export_in(&session, args, destination).await;
    session.close().await;
    result
}

async fn export_in(session: &Session, args: &CompileArgs, destination: &Path) -> Result<()> {
    prepare(session, args).await?;
    let view = compile_active(&session.handle, args.yes).await?;
    report_compile(&view)?;

    if let Err(banner) = session.handle.export(destination).await? {
        bail!("{}", banner.message);
    }
    log!("export"; "saved {}", destination.display());
    Ok(())
}
