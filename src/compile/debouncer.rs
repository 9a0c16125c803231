use std::time::Duration;

use tokio::time::Instant;

use crate::core::DocumentId;

pub const DEBOUNCE_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Idle,
    Pending { deadline: Instant, doc: DocumentId },
}

/// Auto-compile debouncer: `Idle` or `Pending(deadline)`.
///
/// Pure state machine; the caller passes the clock in, so coalescing can be
/// tested without sleeping.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    state: State,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEBOUNCE_MS))
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: State::Idle,
        }
    }

    /// (Re)start the timer for `doc`. Replaces any pending deadline.
    pub fn arm(&mut self, doc: &DocumentId, now: Instant) -> Instant {
        let deadline = now + self.delay;
        self.state = State::Pending {
            deadline,
            doc: doc.clone(),
        };
        deadline
    }

    /// Fire if the deadline has passed, returning to `Idle`.
    pub fn poll(&mut self, now: Instant) -> Option<DocumentId> {
        if self.deadline().is_none_or(|deadline| now < deadline) {
            return None;
        }
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Pending { doc, .. } => Some(doc),
            State::Idle => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            State::Pending { deadline, .. } => Some(*deadline),
            State::Idle => None,
        }
    }

    pub fn pending_for(&self) -> Option<&DocumentId> {
        match &self.state {
            State::Pending { doc, .. } => Some(doc),
            State::Idle => None,
        }
    }

    pub fn cancel(&mut self) {
        self.state = State::Idle;
    }
}
