//! Bounded LRU store with per-entry time-to-live.
//!
//! Recency is tracked with a monotonically increasing access tick: the
//! `recency` index maps tick -> fingerprint, so the least recently used entry
//! is always the first key. Not thread-safe on its own; `VerdictCache` wraps
//! it in a mutex.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::aggregate::Verdict;
use crate::article::Fingerprint;

#[derive(Debug)]
struct Entry {
    verdict: Arc<Verdict>,
    inserted_at: Instant,
    tick: u64,
}

/// Result of a lookup.
#[derive(Debug)]
pub(crate) enum Lookup {
    Hit(Arc<Verdict>),
    /// The entry existed but outlived its TTL; it has been removed.
    Expired,
    Miss,
}

#[derive(Debug)]
pub(crate) struct LruTtl {
    capacity: usize,
    ttl: Duration,
    entries: HashMap<Fingerprint, Entry>,
    recency: BTreeMap<u64, Fingerprint>,
    next_tick: u64,
}

impl LruTtl {
    pub(crate) fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            entries: HashMap::with_capacity(capacity.min(4096)),
            recency: BTreeMap::new(),
            next_tick: 0,
        }
    }

    fn bump(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }

    /// Looks up an entry, refreshing its recency on a hit.
    pub(crate) fn get(&mut self, fingerprint: &Fingerprint, now: Instant) -> Lookup {
        let Some((inserted_at, old_tick)) = self
            .entries
            .get(fingerprint)
            .map(|e| (e.inserted_at, e.tick))
        else {
            return Lookup::Miss;
        };

        if now.saturating_duration_since(inserted_at) >= self.ttl {
            self.remove(fingerprint);
            return Lookup::Expired;
        }

        let tick = self.bump();
        self.recency.remove(&old_tick);
        self.recency.insert(tick, *fingerprint);

        match self.entries.get_mut(fingerprint) {
            Some(entry) => {
                entry.tick = tick;
                Lookup::Hit(Arc::clone(&entry.verdict))
            }
            None => Lookup::Miss,
        }
    }

    /// Inserts or replaces an entry; returns how many entries were evicted.
    pub(crate) fn insert(&mut self, fingerprint: Fingerprint, verdict: Arc<Verdict>, now: Instant) -> usize {
        self.remove(&fingerprint);

        let mut evicted = 0;
        while self.entries.len() >= self.capacity {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            self.entries.remove(&oldest);
            evicted += 1;
        }

        let tick = self.bump();
        self.recency.insert(tick, fingerprint);
        self.entries.insert(
            fingerprint,
            Entry {
                verdict,
                inserted_at: now,
                tick,
            },
        );
        evicted
    }

    pub(crate) fn remove(&mut self, fingerprint: &Fingerprint) -> bool {
        match self.entries.remove(fingerprint) {
            Some(entry) => {
                self.recency.remove(&entry.tick);
                true
            }
            None => false,
        }
    }

    /// Drops every expired entry; returns how many were removed.
    pub(crate) fn purge_expired(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let expired: Vec<Fingerprint> = self
            .entries
            .iter()
            .filter(|(_, e)| now.saturating_duration_since(e.inserted_at) >= ttl)
            .map(|(fp, _)| *fp)
            .collect();
        for fp in &expired {
            self.remove(fp);
        }
        expired.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
