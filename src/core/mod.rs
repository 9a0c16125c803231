//! Core types - pure abstractions shared across the codebase.

mod document;
mod error;
mod state;

pub use document::{Document, DocumentId, DocumentSummary};
pub use error::{BackendError, ErrorBanner, FailureKind};
pub use state::{listen_for_shutdown, setup_shutdown_handler, shutdown_signal};
