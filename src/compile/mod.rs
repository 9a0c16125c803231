//! Compilation Coordinator - decides whether and when a compile runs.
//!
//! # Module Structure
//!
//! - `debouncer` - `Idle` / `Pending(deadline)` state machine for auto-compile
//! - `sequence` - Per-document sequence numbers and supersession
//!
//! The coordinator holds no document content and performs no I/O. The
//! workspace asks it for a [`Gate`] before each compile and reports every
//! finished compile back through [`CompileCoordinator::complete`].

mod debouncer;
mod sequence;

use std::time::Duration;

use tokio::time::Instant;

use crate::config::CompileConfig;
use crate::core::{Document, DocumentId};

pub use debouncer::{DEBOUNCE_MS, Debouncer};
pub use sequence::{Completion, SequenceTable, Ticket};

/// Default size gate, in characters.
pub const LARGE_DOCUMENT_THRESHOLD: usize = 10_000;

/// What started a compile request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Explicit user action.
    Manual,
    /// Manual request the user already confirmed past the size gate.
    Confirmed,
    /// Debounce deadline elapsed.
    Auto,
}

impl Trigger {
    pub fn label(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Confirmed => "confirmed",
            Self::Auto => "auto",
        }
    }
}

/// Outcome of asking to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// Go ahead; report the result with this ticket.
    Proceed(Ticket),
    /// No toolchain: offer setup instead of compiling.
    SetupRequired,
    /// Content exceeds the size gate; ask the user first.
    NeedsConfirmation { chars: usize, threshold: usize },
    /// Auto request dropped without any user-visible effect.
    Skipped,
}

/// Tunables taken from `[compile]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilePolicy {
    pub debounce: Duration,
    /// `None` disables the size gate.
    pub confirm_threshold: Option<usize>,
    pub auto: bool,
}

impl Default for CompilePolicy {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEBOUNCE_MS),
            confirm_threshold: Some(LARGE_DOCUMENT_THRESHOLD),
            auto: false,
        }
    }
}

impl From<&CompileConfig> for CompilePolicy {
    fn from(config: &CompileConfig) -> Self {
        Self {
            debounce: config.debounce(),
            confirm_threshold: config.confirm_threshold(),
            auto: config.auto,
        }
    }
}

#[derive(Debug)]
pub struct CompileCoordinator {
    policy: CompilePolicy,
    toolchain_installed: bool,
    auto: bool,
    sequences: SequenceTable,
    debouncer: Debouncer,
}

impl CompileCoordinator {
    pub fn new(policy: CompilePolicy, toolchain_installed: bool) -> Self {
        Self {
            auto: policy.auto,
            debouncer: Debouncer::new(policy.debounce),
            policy,
            toolchain_installed,
            sequences: SequenceTable::new(),
        }
    }

    // ------------------------------------------------------------------------
    // gating
    // ------------------------------------------------------------------------

    /// Decide whether `doc` may compile now, issuing a ticket if so.
    pub fn request(&mut self, doc: &Document, trigger: Trigger) -> Gate {
        if !self.toolchain_installed {
            return match trigger {
                Trigger::Auto => Gate::Skipped,
                Trigger::Manual | Trigger::Confirmed => Gate::SetupRequired,
            };
        }

        if trigger == Trigger::Manual
            && let Some(threshold) = self.policy.confirm_threshold
        {
            let chars = doc.char_count();
            if chars > threshold {
                return Gate::NeedsConfirmation { chars, threshold };
            }
        }

        Gate::Proceed(self.sequences.issue(&doc.id))
    }

    /// Report a finished compile.
    pub fn complete(&mut self, ticket: &Ticket) -> Completion {
        self.sequences.complete(ticket)
    }

    pub fn is_compiling(&self, doc: &DocumentId) -> bool {
        self.sequences.in_flight(doc)
    }

    // ------------------------------------------------------------------------
    // auto-compile
    // ------------------------------------------------------------------------

    /// Content of `doc` changed. Returns the new deadline when auto-compile
    /// is armed.
    pub fn content_changed(&mut self, doc: &DocumentId, now: Instant) -> Option<Instant> {
        self.auto.then(|| self.debouncer.arm(doc, now))
    }

    /// Document whose debounce deadline elapsed, if any.
    pub fn poll_debounce(&mut self, now: Instant) -> Option<DocumentId> {
        self.debouncer.poll(now)
    }

    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub fn auto_compile(&self) -> bool {
        self.auto
    }

    /// Turning auto-compile off drops any pending deadline.
    pub fn set_auto_compile(&mut self, enabled: bool) {
        self.auto = enabled;
        if !enabled {
            self.debouncer.cancel();
        }
    }

    // ------------------------------------------------------------------------
    // lifecycle
    // ------------------------------------------------------------------------

    pub fn toolchain_installed(&self) -> bool {
        self.toolchain_installed
    }

    pub fn set_toolchain_installed(&mut self, installed: bool) {
        self.toolchain_installed = installed;
    }

    /// `doc` stopped being active: its in-flight results must not apply.
    pub fn deactivate(&mut self, doc: &DocumentId) {
        self.sequences.supersede(doc);
        if self.debouncer.pending_for() == Some(doc) {
            self.debouncer.cancel();
        }
    }

    /// `doc` was deleted.
    pub fn forget(&mut self, doc: &DocumentId) {
        self.deactivate(doc);
        self.sequences.forget(doc);
    }
}
