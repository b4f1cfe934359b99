//! Request sequencing for remote calls that replace step state.
//!
//! Every fetch/save takes a ticket when it is issued. Its response may
//! replace local state only if no response with a newer ticket has been
//! committed already; otherwise it is stale and dropped. This settles the
//! refresh-during-save race: whichever request was issued last wins, no
//! matter which response arrives last.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

#[derive(Debug, Default)]
pub struct RequestSequence {
    /// Last ticket handed out.
    issued: AtomicU64,
    /// Newest ticket whose response replaced state.
    committed: AtomicU64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a ticket for a request about to be sent.
    pub fn next_seq(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Record `seq` as committed if it is newer than anything committed so
    /// far. Returns false for stale tickets.
    pub fn try_commit(&self, seq: u64) -> bool {
        let previous = self.committed.fetch_max(seq, Ordering::SeqCst);
        previous < seq
    }

    /// True when no ticket was issued after `seq`.
    pub fn is_latest(&self, seq: u64) -> bool {
        self.issued.load(Ordering::SeqCst) == seq
    }

    pub fn current_seq(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    pub fn committed_seq(&self) -> u64 {
        self.committed.load(Ordering::SeqCst)
    }
}
