//! Per-channel request sequencing.
//!
//! Each issuance bumps the channel counter. A response is applied only if
//! its ticket still equals the counter when it resolves; anything older is
//! dropped on arrival. Nothing is cancelled at the transport level.

use std::sync::{Mutex, PoisonError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct SequenceGate {
    latest: Mutex<u64>,
}

impl SequenceGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier ticket.
    pub fn issue(&self) -> Ticket {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        *latest += 1;
        Ticket(*latest)
    }

    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) == ticket.0
    }

    /// Run `apply` if `ticket` is still the latest. The gate stays locked
    /// while `apply` runs, so no newer ticket can be issued in between.
    pub fn settle<T>(&self, ticket: Ticket, apply: impl FnOnce() -> T) -> Option<T> {
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        (*latest == ticket.0).then(apply)
    }
}
