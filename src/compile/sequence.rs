//! Per-document compile sequence numbers.
//!
//! Every compile request for a document takes the next sequence number. A
//! result is applied only if its number is still the latest issued and is
//! greater than the last applied one, so application order follows issue
//! order no matter which compiler call finishes first.

use rustc_hash::FxHashMap;

use crate::core::DocumentId;

/// Handle for one issued compile request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub doc: DocumentId,
    pub seq: u64,
}

/// What to do with a finished compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Latest request for its document: apply it.
    Current,
    /// A newer request exists (or the document was invalidated): drop it.
    Superseded,
}

#[derive(Debug, Default, Clone, Copy)]
struct Slot {
    /// Highest sequence number handed out.
    issued: u64,
    /// Highest sequence number whose result was applied.
    applied: u64,
    /// Requests up to here no longer count as in flight.
    settled: u64,
}

#[derive(Debug, Default)]
pub struct SequenceTable {
    slots: FxHashMap<DocumentId, Slot>,
}

impl SequenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, doc: &DocumentId) -> Ticket {
        let slot = self.slots.entry(doc.clone()).or_default();
        slot.issued += 1;
        Ticket {
            doc: doc.clone(),
            seq: slot.issued,
        }
    }

    pub fn complete(&mut self, ticket: &Ticket) -> Completion {
        let Some(slot) = self.slots.get_mut(&ticket.doc) else {
            return Completion::Superseded;
        };
        if ticket.seq == slot.issued && ticket.seq > slot.applied {
            slot.applied = ticket.seq;
            slot.settled = ticket.seq;
            Completion::Current
        } else {
            Completion::Superseded
        }
    }

    /// Invalidate every outstanding request for `doc`.
    ///
    /// Burns a sequence number so nothing issued before can match, and marks
    /// the document idle.
    pub fn supersede(&mut self, doc: &DocumentId) {
        if let Some(slot) = self.slots.get_mut(doc) {
            slot.issued += 1;
            slot.settled = slot.issued;
        }
    }

    pub fn forget(&mut self, doc: &DocumentId) {
        self.slots.remove(doc);
    }

    /// A request for `doc` has been issued and not yet resolved or invalidated.
    pub fn in_flight(&self, doc: &DocumentId) -> bool {
        self.slots
            .get(doc)
            .is_some_and(|slot| slot.issued > slot.settled)
    }
}
