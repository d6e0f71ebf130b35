use chrono::{DateTime, Utc};

use classroom_core::model::SessionId;

/// Handle for a scheduled follow-up (flip-back, result pause).
///
/// Only the session identity that issued a ticket will honor it; restarting a
/// session or scheduling a newer action makes older tickets stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferredTicket {
    session: SessionId,
    seq: u64,
    due_at: DateTime<Utc>,
}

impl DeferredTicket {
    #[must_use]
    pub fn session(&self) -> SessionId {
        self.session
    }

    #[must_use]
    pub fn due_at(&self) -> DateTime<Utc> {
        self.due_at
    }

    /// Time left before the ticket is due, floored at zero.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> chrono::Duration {
        (self.due_at - now).max(chrono::Duration::zero())
    }
}

/// Single-slot scheduler; at most one action is outstanding.
#[derive(Debug, Clone)]
pub(crate) struct Deferred<T> {
    slot: Option<(DeferredTicket, T)>,
    next_seq: u64,
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Self {
            slot: None,
            next_seq: 0,
        }
    }
}

impl<T> Deferred<T> {
    /// Replace whatever is pending with `payload`.
    pub(crate) fn schedule(
        &mut self,
        session: SessionId,
        due_at: DateTime<Utc>,
        payload: T,
    ) -> DeferredTicket {
        self.next_seq += 1;
        let ticket = DeferredTicket {
            session,
            seq: self.next_seq,
            due_at,
        };
        self.slot = Some((ticket, payload));
        ticket
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.slot.is_some()
    }

    pub(crate) fn ticket(&self) -> Option<DeferredTicket> {
        self.slot.as_ref().map(|(ticket, _)| *ticket)
    }

    /// Take the payload if `ticket` is the one currently pending.
    pub(crate) fn take(&mut self, ticket: DeferredTicket) -> Option<T> {
        let current = matches!(&self.slot, Some((pending, _)) if *pending == ticket);
        if current {
            self.slot.take().map(|(_, payload)| payload)
        } else {
            None
        }
    }

    /// Take the payload if it is due at `now`.
    pub(crate) fn take_due(&mut self, now: DateTime<Utc>) -> Option<(DeferredTicket, T)> {
        let due = matches!(&self.slot, Some((pending, _)) if pending.due_at <= now);
        if due {
            self.slot.take()
        } else {
            None
        }
    }

    pub(crate) fn cancel(&mut self) {
        self.slot = None;
    }
}
