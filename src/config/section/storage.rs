//! `[storage]` section configuration.
//!
//! ```toml
//! [storage]
//! data_dir = "~/.local/share/vitae"   # documents.json and temp/ live here
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory. Defaults to the platform data dir + `vitae`.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .map(|dir| dir.join("vitae"))
                .unwrap_or_else(|| PathBuf::from(".vitae")),
        }
    }
}

impl StorageConfig {
    pub fn documents_file(&self) -> PathBuf {
        self.data_dir.join("documents.json")
    }
}
