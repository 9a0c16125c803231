//! `doctor` command: toolchain and path report.

use anyhow::{Result, bail};
use owo_colors::{OwoColorize, Stream};

use super::common::print_setup_guide;
use crate::backend::PdfLatex;
use crate::config::EditorConfig;
use crate::log;

pub fn doctor(config: &EditorConfig) -> Result<()> {
    let latex = PdfLatex::new(&config.compile, config.output_dir())?;

    if let Some(path) = &config.config_path {
        log!("doctor"; "config: {}", path.display());
    }
    log!("doctor"; "documents: {}", config.storage.documents_file().display());
    log!("doctor"; "output: {}", latex.output_dir().display());

    let Some(path) = latex.resolve() else {
        let missing = format!("`{}` not found on PATH", latex.program());
        log!("doctor"; "{}", missing.if_supports_color(Stream::Stderr, |s| s.red().to_string()));
        print_setup_guide();
        bail!("no LaTeX toolchain found");
    };

    let version = latex
        .version()
        .unwrap_or_else(|e| format!("unknown version ({e})"));
    let found = format!("{} ({})", path.display(), version);
    log!("doctor"; "{}", found.if_supports_color(Stream::Stderr, |s| s.green().to_string()));
    Ok(())
}
