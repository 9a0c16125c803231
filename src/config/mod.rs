//! Editor configuration management for `vitae.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── compile    # [compile]
//! │   └── storage    # [storage]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   ├── field      # FieldPath
//! │   └── handle     # Global config handle
//! └── mod.rs         # EditorConfig (this file)
//! ```
//!
//! The config file is optional: without one every section takes its
//! defaults.

pub mod section;
pub mod types;
mod util;

use util::{find_config_file, resolve_path};

pub use section::{CompileConfig, StorageConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath, cfg, init_config};

use crate::{cli::Cli, log};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name, searched upward from the working directory.
pub const CONFIG_FILE: &str = "vitae.toml";

// ============================================================================
// root configuration
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Config file this was loaded from, if any (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub compile: CompileConfig,
}

impl EditorConfig {
    /// Load configuration for a CLI invocation.
    ///
    /// An explicit `--config` must exist; the default file name is optional.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let name = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));

        let found = find_config_file(&name, &cwd);
        if found.is_none() && cli.config.is_some() {
            bail!("Config file '{}' not found", name.display());
        }

        let mut config = match &found {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };

        let root = found
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.clone());
        config.config_path = found;

        if let Some(dir) = &cli.data_dir {
            config.storage.data_dir = resolve_path(dir, &cwd);
        }
        config.normalize_paths(&root);
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path, warning about unknown fields.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        log!("warning"; "unknown fields in {}, ignoring:", path.display());
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Directory for `.tex` sources and compiled PDFs.
    pub fn output_dir(&self) -> PathBuf {
        self.compile
            .output_dir
            .clone()
            .unwrap_or_else(|| self.storage.data_dir.join("temp"))
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Expand `~` and anchor relative paths at the config file's directory.
    fn normalize_paths(&mut self, root: &Path) {
        self.storage.data_dir = resolve_path(&self.storage.data_dir, root);
        self.compile.output_dir = self
            .compile
            .output_dir
            .take()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(|dir| resolve_path(&dir, root));
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();
        self.compile.validate(&mut diag);
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Parse config, panicking on unknown fields (to catch typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> EditorConfig {
    let (parsed, ignored) = EditorConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
