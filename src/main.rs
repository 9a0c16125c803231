//! Vitae - a LaTeX document editor with live PDF preview.

mod annotate;
mod backend;
mod cli;
mod compile;
mod config;
mod core;
mod diagnostic;
mod logger;
mod preview;
mod session;
mod utils;
mod workspace;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use config::{EditorConfig, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();
    logger::set_color(cli.color_override());
    logger::set_verbose(cli.verbose);

    let config = init_config(EditorConfig::load(&cli)?);

    if let Commands::Doctor = cli.command {
        return cli::doctor::doctor(&config);
    }

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    rt.block_on(async {
        match &cli.command {
            Commands::List => cli::documents::list(&config).await,
            Commands::New { title } => cli::documents::new(&config, title).await,
            Commands::Show { id } => cli::documents::show(&config, id).await,
            Commands::Delete { id, yes } => cli::documents::delete(&config, id, *yes).await,
            Commands::Compile { args } => cli::compile::compile(&config, args).await,
            Commands::Export { args, destination } => {
                cli::compile::export(&config, args, destination).await
            }
            Commands::Edit { id, file, no_auto } => {
                cli::edit::edit(&config, id, file.as_deref(), *no_auto).await
            }
            Commands::Doctor => cli::doctor::doctor(&config),
        }
    })
}
