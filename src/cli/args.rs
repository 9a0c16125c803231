//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Vitae LaTeX document editor CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: vitae.toml, searched upward)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Data directory holding documents.json
    #[arg(short = 'D', long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List documents, most recently updated first
    #[command(visible_alias = "ls")]
    List,

    /// Create a document from the article template
    #[command(visible_alias = "n")]
    New {
        /// Document title
        title: String,
    },

    /// Print a document's LaTeX source
    Show {
        /// Document id
        id: String,
    },

    /// Delete a document
    #[command(visible_alias = "rm")]
    Delete {
        /// Document id
        id: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Compile a document to PDF
    #[command(visible_alias = "c")]
    Compile {
        #[command(flatten)]
        args: CompileArgs,
    },

    /// Compile a document and copy the PDF to a destination
    Export {
        #[command(flatten)]
        args: CompileArgs,

        /// Destination PDF path
        #[arg(value_hint = clap::ValueHint::FilePath)]
        destination: PathBuf,
    },

    /// Edit a document in a working file, recompiling on save
    #[command(visible_alias = "e")]
    Edit {
        /// Document id
        id: String,

        /// Working file (default: <output_dir>/<id>.edit.tex)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        file: Option<PathBuf>,

        /// Do not compile automatically after each save
        #[arg(long)]
        no_auto: bool,
    },

    /// Check the LaTeX toolchain
    Doctor,
}

/// Shared arguments for Compile and Export
#[derive(clap::Args, Debug, Clone)]
pub struct CompileArgs {
    /// Document id
    pub id: String,

    /// Compile large documents without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Print the compilation log even on success
    #[arg(short, long)]
    pub log: bool,
}

impl Cli {
    /// Color override for the logger. `None` keeps terminal detection.
    pub const fn color_override(&self) -> Option<bool> {
        match self.color {
            ColorChoice::Always => Some(true),
            ColorChoice::Never => Some(false),
            ColorChoice::Auto => None,
        }
    }
}
