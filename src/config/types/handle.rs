//! Global config handle.
//!
//! Uses `arc-swap` for lock-free reads; commands read the loaded config
//! through [`cfg`] instead of threading it through every call.

use crate::config::EditorConfig;
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

static CONFIG: LazyLock<ArcSwap<EditorConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(EditorConfig::default()));

#[inline]
pub fn cfg() -> Arc<EditorConfig> {
    CONFIG.load_full()
}

/// Install `config` as the global config.
#[inline]
pub fn init_config(config: EditorConfig) -> Arc<EditorConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
