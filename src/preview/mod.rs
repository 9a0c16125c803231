//! Artifact Loader - compiled artifact to displayable preview.
//!
//! The loader remembers the reference it currently shows. Pointing it at a
//! reference that differs in any way (locator or token) asks for a new
//! fetch; pointing it at the same reference is a no-op. Fetch results for a
//! reference that is no longer current are ignored.

mod version;

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::backend::ArtifactSource;
use crate::core::BackendError;
use crate::utils::mime;

pub use version::{ArtifactRef, ArtifactVersions};

/// What the preview surface shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewState {
    /// Nothing compiled yet (not an error).
    #[default]
    Empty,
    /// Fetch in progress.
    Loading(ArtifactRef),
    /// Embeddable content.
    Ready {
        reference: ArtifactRef,
        data_uri: Arc<str>,
    },
    /// Fetch failed; the last compile still counts as successful.
    Failed {
        reference: ArtifactRef,
        error: String,
    },
}

impl PreviewState {
    pub fn reference(&self) -> Option<&ArtifactRef> {
        match self {
            Self::Empty => None,
            Self::Loading(reference)
            | Self::Ready { reference, .. }
            | Self::Failed { reference, .. } => Some(reference),
        }
    }

    pub fn data_uri(&self) -> Option<&str> {
        match self {
            Self::Ready { data_uri, .. } => Some(data_uri),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading(_))
    }
}

/// Encode bytes as a `data:` URI.
pub fn encode_data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Fetch the bytes behind `reference` and encode them for display.
pub async fn fetch_display(
    source: &dyn ArtifactSource,
    reference: &ArtifactRef,
) -> Result<Arc<str>, BackendError> {
    let bytes = source.fetch(reference).await?;
    let mime = mime::from_locator(reference.locator());
    Ok(Arc::from(encode_data_uri(&bytes, mime)))
}

/// Tracks the current artifact reference and its display state.
#[derive(Debug, Default)]
pub struct ArtifactLoader {
    state: PreviewState,
}

impl ArtifactLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    pub fn current(&self) -> Option<&ArtifactRef> {
        self.state.reference()
    }

    /// Point the preview at `reference`.
    ///
    /// Returns the reference to fetch when its identity changed. `None`
    /// switches to the "no artifact" state.
    pub fn point_to(&mut self, reference: Option<ArtifactRef>) -> Option<ArtifactRef> {
        match reference {
            None => {
                self.state = PreviewState::Empty;
                None
            }
            Some(reference) if self.current() == Some(&reference) => None,
            Some(reference) => {
                self.state = PreviewState::Loading(reference.clone());
                Some(reference)
            }
        }
    }

    /// Apply a fetch outcome. Returns `false` if `reference` is stale.
    pub fn finish(
        &mut self,
        reference: &ArtifactRef,
        outcome: Result<Arc<str>, BackendError>,
    ) -> bool {
        if self.current() != Some(reference) {
            return false;
        }
        self.state = match outcome {
            Ok(data_uri) => PreviewState::Ready {
                reference: reference.clone(),
                data_uri,
            },
            Err(err) => PreviewState::Failed {
                reference: reference.clone(),
                error: format!("Failed to load PDF: {err}"),
            },
        };
        true
    }

    /// Drop the current artifact (document switched or deleted).
    pub fn clear(&mut self) {
        self.state = PreviewState::Empty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeArtifacts;

    /// Point at `reference` and fetch it inline, as the workspace does
    /// across a spawned task.
    async fn load<'a>(
        loader: &'a mut ArtifactLoader,
        source: &dyn ArtifactSource,
        reference: Option<ArtifactRef>,
    ) -> &'a PreviewState {
        if let Some(reference) = loader.point_to(reference) {
            let outcome = fetch_display(source, &reference).await;
            loader.finish(&reference, outcome);
        }
        loader.state()
    }

    #[test]
    fn test_encode_data_uri() {
        assert_eq!(
            encode_data_uri(b"%PDF-1.5", mime::types::PDF),
            "data:application/pdf;base64,JVBERi0xLjU="
        );
    }

    #[tokio::test]
    async fn test_absent_reference_is_empty_not_failure() {
        let source = FakeArtifacts::new();
        let mut loader = ArtifactLoader::new();

        let state = load(&mut loader, &source, None).await;
        assert_eq!(state, &PreviewState::Empty);
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_load_ready() {
        let source = FakeArtifacts::new();
        source.put("/tmp/a.pdf", b"%PDF-1.5".to_vec());
        let mut loader = ArtifactLoader::new();

        let reference = ArtifactRef::new("/tmp/a.pdf", 1);
        let state = load(&mut loader, &source, Some(reference.clone())).await;
        assert_eq!(
            state.data_uri(),
            Some("data:application/pdf;base64,JVBERi0xLjU=")
        );
        assert_eq!(state.reference(), Some(&reference));
    }

    #[tokio::test]
    async fn test_same_locator_new_token_refetches() {
        let source = FakeArtifacts::new();
        source.put("/tmp/a.pdf", b"first".to_vec());
        let versions = ArtifactVersions::new();
        let mut loader = ArtifactLoader::new();

        let r1 = versions.stamp("/tmp/a.pdf");
        load(&mut loader, &source, Some(r1.clone())).await;
        assert_eq!(source.fetch_count(), 1);

        // Same reference again: served from the current view.
        load(&mut loader, &source, Some(r1)).await;
        assert_eq!(source.fetch_count(), 1);

        source.put("/tmp/a.pdf", b"second".to_vec());
        let r2 = versions.stamp("/tmp/a.pdf");
        let state = load(&mut loader, &source, Some(r2)).await;
        assert_eq!(source.fetch_count(), 2);
        assert_eq!(
            state.data_uri(),
            Some(encode_data_uri(b"second", mime::types::PDF).as_str())
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_is_display_state() {
        let source = FakeArtifacts::new();
        let mut loader = ArtifactLoader::new();

        let reference = ArtifactRef::new("/tmp/missing.pdf", 1);
        let state = load(&mut loader, &source, Some(reference.clone())).await;
        match state {
            PreviewState::Failed { reference: r, error } => {
                assert_eq!(r, &reference);
                assert!(error.starts_with("Failed to load PDF:"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_stale_finish_ignored() {
        let mut loader = ArtifactLoader::new();
        let r1 = ArtifactRef::new("/tmp/a.pdf", 1);
        let r2 = ArtifactRef::new("/tmp/a.pdf", 2);

        assert_eq!(loader.point_to(Some(r1.clone())), Some(r1.clone()));
        assert_eq!(loader.point_to(Some(r2.clone())), Some(r2.clone()));

        assert!(!loader.finish(&r1, Ok(Arc::from("data:old"))));
        assert!(loader.state().is_loading());

        assert!(loader.finish(&r2, Ok(Arc::from("data:new"))));
        assert_eq!(loader.state().data_uri(), Some("data:new"));
    }

    #[test]
    fn test_clear() {
        let mut loader = ArtifactLoader::new();
        loader.point_to(Some(ArtifactRef::new("/tmp/a.pdf", 1)));
        loader.clear();
        assert_eq!(loader.state(), &PreviewState::Empty);
        assert_eq!(loader.current(), None);
    }
}
