//! Per-fingerprint promise registry.
//!
//! The first caller for a fingerprint becomes the leader and owns the sending
//! half of a `watch` channel; later callers clone the receiver and wait. The
//! slot is removed before the outcome is published, so a caller arriving after
//! completion never joins a finished computation.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;

use crate::aggregate::Verdict;
use crate::article::Fingerprint;

/// What a leader publishes: the shared verdict or the failure reason.
pub(crate) type Outcome = Result<Arc<Verdict>, String>;

pub(crate) type OutcomeSender = watch::Sender<Option<Outcome>>;
pub(crate) type OutcomeReceiver = watch::Receiver<Option<Outcome>>;

#[derive(Debug)]
struct Slot {
    id: u64,
    rx: OutcomeReceiver,
}

/// Role assigned to a caller that found no cached verdict.
#[derive(Debug)]
pub(crate) enum Join {
    Leader { id: u64, tx: OutcomeSender },
    Waiter(OutcomeReceiver),
}

#[derive(Debug, Default)]
pub(crate) struct InFlight {
    slots: HashMap<Fingerprint, Slot>,
    next_id: u64,
}

impl InFlight {
    /// Joins the computation for `fingerprint`, starting one if none is running.
    pub(crate) fn join(&mut self, fingerprint: Fingerprint) -> Join {
        if let Some(slot) = self.slots.get(&fingerprint) {
            return Join::Waiter(slot.rx.clone());
        }

        let (tx, rx) = watch::channel(None);
        let id = self.next_id;
        self.next_id += 1;
        self.slots.insert(fingerprint, Slot { id, rx });
        Join::Leader { id, tx }
    }

    /// Removes the slot if it still belongs to leader `id`.
    pub(crate) fn release(&mut self, fingerprint: &Fingerprint, id: u64) -> bool {
        match self.slots.get(fingerprint) {
            Some(slot) if slot.id == id => {
                self.slots.remove(fingerprint);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

/// Waits for the leader's outcome.
///
/// `None` means the leader went away without publishing (dropped or
/// cancelled); the caller should retry and may become the new leader.
pub(crate) async fn wait(mut rx: OutcomeReceiver) -> Option<Outcome> {
    loop {
        if let Some(outcome) = rx.borrow_and_update().clone() {
            return Some(outcome);
        }
        if rx.changed().await.is_err() {
            // Sender gone; it may still have published right before dropping.
            return rx.borrow().clone();
        }
    }
}
