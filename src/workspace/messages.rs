//! Workspace Message Definitions
//!
//! ```text
//! WorkspaceHandle --WorkspaceMsg--> Workspace <--TaskMsg-- spawned compile/fetch tasks
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::backend::CompilationResult;
use crate::compile::{Ticket, Trigger};
use crate::core::{BackendError, DocumentId, ErrorBanner};
use crate::preview::ArtifactRef;

/// Acknowledgement sent once the message is handled and the view published.
pub type Reply<T> = oneshot::Sender<T>;

// =============================================================================
// User actions
// =============================================================================

#[derive(Debug)]
pub enum WorkspaceMsg {
    Create {
        title: String,
        reply: Reply<()>,
    },
    Select {
        id: DocumentId,
        reply: Reply<()>,
    },
    Delete {
        id: DocumentId,
        reply: Reply<()>,
    },
    /// New content for the active document
    Edit {
        content: String,
        reply: Reply<Result<(), ErrorBanner>>,
    },
    /// Manual compile of the active document
    Compile { reply: Reply<()> },
    /// Answer to the large-document prompt
    ConfirmCompile { proceed: bool, reply: Reply<()> },
    SetAutoCompile { enabled: bool, reply: Reply<()> },
    ToggleLog { reply: Reply<()> },
    Export {
        destination: PathBuf,
        reply: Reply<Result<(), ErrorBanner>>,
    },
    DismissError { reply: Reply<()> },
    /// Check the toolchain again after the user went through setup
    FinishSetup { reply: Reply<bool> },
    Shutdown,
}

// =============================================================================
// Task results
// =============================================================================

/// Results reported back by tasks the workspace spawned.
#[derive(Debug)]
pub enum TaskMsg {
    CompileDone {
        ticket: Ticket,
        trigger: Trigger,
        outcome: Result<CompilationResult, BackendError>,
        elapsed: Duration,
    },
    PreviewFetched {
        reference: ArtifactRef,
        outcome: Result<Arc<str>, BackendError>,
    },
}
