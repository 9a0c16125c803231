//! Artifact references and cache-busting tokens.
//!
//! A compiler may write every run of a document to the same path, so the
//! locator alone cannot tell two builds apart. Each successful compile gets
//! a fresh token, and references compare by locator *and* token.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Locator of a compiled artifact plus its cache-busting token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactRef {
    locator: String,
    token: u64,
}

impl ArtifactRef {
    pub fn new(locator: impl Into<String>, token: u64) -> Self {
        Self {
            locator: locator.into(),
            token,
        }
    }

    /// Storage locator, without the token.
    pub fn locator(&self) -> &str {
        &self.locator
    }

}

/// `locator?v=token`, for consumers keyed on a single string.
impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?v={}", self.locator, self.token)
    }
}

/// Monotonic token allocator.
#[derive(Debug, Default)]
pub struct ArtifactVersions {
    last: AtomicU64,
}

impl ArtifactVersions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp `locator` with a token never handed out before.
    pub fn stamp(&self, locator: impl Into<String>) -> ArtifactRef {
        let token = self.last.fetch_add(1, Ordering::Relaxed) + 1;
        ArtifactRef::new(locator, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_locator_distinct_refs() {
        let versions = ArtifactVersions::new();
        let r1 = versions.stamp("/tmp/vitae/temp/abc.pdf");
        let r2 = versions.stamp("/tmp/vitae/temp/abc.pdf");

        assert_eq!(r1.locator(), r2.locator());
        assert_ne!(r1, r2);
        assert!(r2.token > r1.token);
    }

    #[test]
    fn test_display_carries_token() {
        let r = ArtifactRef::new("/tmp/a.pdf", 7);
        assert_eq!(r.to_string(), "/tmp/a.pdf?v=7");
    }
}
