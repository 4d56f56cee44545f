//! Verdict cache.
//!
//! Bounded LRU + TTL memoization of verdicts keyed by article fingerprint,
//! with at most one computation in flight per fingerprint.
//!
//! All state (entries, recency index, promise registry, counters) lives behind
//! one `std::sync::Mutex`. The lock is only held for map operations and is
//! never held across an `.await`.

mod inflight;
mod lru;

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::aggregate::Verdict;
use crate::article::Fingerprint;
use crate::error::{ExecutionError, ValidationError, VerityError, VerityResult};

use inflight::{InFlight, Join, OutcomeSender};
use lru::{Lookup, LruTtl};

/// Cache sizing and expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of verdicts kept.
    pub capacity: usize,
    /// Seconds a verdict stays valid after insertion.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            ttl_secs: 3600,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.capacity == 0 {
            return Err(ValidationError::InvalidCapacity {
                value: self.capacity,
            });
        }
        if self.ttl_secs == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "cache.ttl_secs must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Counters since the cache was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// Callers that waited on another caller's computation.
    pub coalesced: u64,
}

/// Outcome of a computation handed to [`VerdictCache::get_or_compute`].
#[derive(Debug, Clone)]
pub enum Computed {
    /// Cached and shared with every waiter.
    Shareable(Verdict),
    /// Returned only to the computing caller. Not cached; waiters retry.
    Private(Verdict),
}

#[derive(Debug)]
struct State {
    entries: LruTtl,
    inflight: InFlight,
    stats: CacheStats,
}

impl State {
    fn lookup(&mut self, fingerprint: &Fingerprint) -> Option<Arc<Verdict>> {
        match self.entries.get(fingerprint, Instant::now()) {
            Lookup::Hit(verdict) => {
                self.stats.hits += 1;
                Some(verdict)
            }
            Lookup::Expired => {
                self.stats.expirations += 1;
                self.stats.misses += 1;
                None
            }
            Lookup::Miss => {
                self.stats.misses += 1;
                None
            }
        }
    }

    fn insert(&mut self, fingerprint: Fingerprint, verdict: Arc<Verdict>) {
        let evicted = self.entries.insert(fingerprint, verdict, Instant::now());
        self.stats.evictions += evicted as u64;
    }
}

/// Thread-safe verdict cache.
#[derive(Debug)]
pub struct VerdictCache {
    state: Mutex<State>,
}

impl VerdictCache {
    /// Creates an empty cache.
    pub fn new(config: &CacheConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self {
            state: Mutex::new(State {
                entries: LruTtl::new(config.capacity, config.ttl()),
                inflight: InFlight::default(),
                stats: CacheStats::default(),
            }),
        })
    }

    // Every critical section leaves the state consistent, so a poisoned lock
    // is safe to keep using.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a live verdict, refreshing its recency. Expired entries are
    /// removed and reported as absent.
    #[must_use]
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<Verdict>> {
        self.lock().lookup(fingerprint)
    }

    /// Inserts a verdict, evicting the least recently used entry when full.
    pub fn put(&self, fingerprint: Fingerprint, verdict: impl Into<Arc<Verdict>>) {
        self.lock().insert(fingerprint, verdict.into());
    }

    /// Removes one entry. Returns whether it was present.
    pub fn invalidate(&self, fingerprint: &Fingerprint) -> bool {
        self.lock().entries.remove(fingerprint)
    }

    /// Removes every entry. Running computations are unaffected.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Drops expired entries eagerly; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut state = self.lock();
        let purged = state.entries.purge_expired(Instant::now());
        state.stats.expirations += purged as u64;
        purged
    }

    /// Number of cached entries, expired ones included until touched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of computations currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.lock().inflight.len()
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    /// Returns the cached verdict or computes it, at most once per fingerprint.
    ///
    /// Concurrent callers for the same fingerprint wait on the running
    /// computation and receive the same `Arc<Verdict>`. If the computation
    /// fails, every caller gets `CacheComputationFailed` and the slot is
    /// cleared so the next call starts over. If the computing caller is
    /// dropped, or returns [`Computed::Private`], one waiter takes over.
    pub async fn get_or_compute<F, Fut>(&self, fingerprint: Fingerprint, compute: F) -> VerityResult<Arc<Verdict>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = VerityResult<Computed>>,
    {
        self.get_or_compute_with_cancel(fingerprint, None, compute).await
    }

    /// Like [`get_or_compute`](Self::get_or_compute), but a caller waiting on
    /// another caller's computation stops waiting when `cancel` fires and
    /// gets `Cancelled`. The running computation is left alone.
    ///
    /// The token is not passed to `compute`; a computing caller observes
    /// cancellation through its own future.
    pub async fn get_or_compute_with_cancel<F, Fut>(
        &self,
        fingerprint: Fingerprint,
        cancel: Option<&CancellationToken>,
        compute: F,
    ) -> VerityResult<Arc<Verdict>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = VerityResult<Computed>>,
    {
        let mut compute = Some(compute);
        loop {
            let role = {
                let mut state = self.lock();
                if let Some(verdict) = state.lookup(&fingerprint) {
                    debug!(fingerprint = %fingerprint.short(), "verdict cache hit");
                    return Ok(verdict);
                }
                let role = state.inflight.join(fingerprint);
                if matches!(role, Join::Waiter(_)) {
                    state.stats.coalesced += 1;
                }
                role
            };

            let (id, tx) = match role {
                Join::Waiter(rx) => {
                    debug!(fingerprint = %fingerprint.short(), "waiting on in-flight computation");
                    let outcome = match cancel {
                        Some(token) => tokio::select! {
                            outcome = inflight::wait(rx) => outcome,
                            () = token.cancelled() => {
                                debug!(fingerprint = %fingerprint.short(), "cancelled while waiting on in-flight computation");
                                return Err(ExecutionError::Cancelled.into());
                            }
                        },
                        None => inflight::wait(rx).await,
                    };
                    match outcome {
                        Some(Ok(verdict)) => return Ok(verdict),
                        Some(Err(reason)) => return Err(computation_failed(fingerprint, reason)),
                        None => {
                            debug!(fingerprint = %fingerprint.short(), "in-flight computation abandoned; retrying");
                            continue;
                        }
                    }
                }
                Join::Leader { id, tx } => (id, tx),
            };

            let Some(compute) = compute.take() else {
                return Err(VerityError::internal("verdict computation started twice"));
            };
            debug!(fingerprint = %fingerprint.short(), "verdict cache miss; computing");

            let leader = Leader {
                cache: self,
                fingerprint,
                id,
                tx,
                released: false,
            };
            return match compute().await {
                Ok(Computed::Shareable(verdict)) => {
                    let verdict = Arc::new(verdict);
                    leader.succeed(&verdict);
                    Ok(verdict)
                }
                // Dropping the leader unpublished lets a waiter recompute.
                Ok(Computed::Private(verdict)) => {
                    drop(leader);
                    Ok(Arc::new(verdict))
                }
                Err(err) => {
                    let reason = err.to_string();
                    leader.fail(reason.clone());
                    Err(computation_failed(fingerprint, reason))
                }
            };
        }
    }
}

fn computation_failed(fingerprint: Fingerprint, reason: String) -> VerityError {
    ExecutionError::CacheComputationFailed {
        fingerprint: fingerprint.to_string(),
        reason,
    }
    .into()
}

/// Owns a fingerprint's in-flight slot; releases it on every exit path.
struct Leader<'a> {
    cache: &'a VerdictCache,
    fingerprint: Fingerprint,
    id: u64,
    tx: OutcomeSender,
    released: bool,
}

impl Leader<'_> {
    fn succeed(mut self, verdict: &Arc<Verdict>) {
        {
            let mut state = self.cache.lock();
            state.insert(self.fingerprint, Arc::clone(verdict));
            state.inflight.release(&self.fingerprint, self.id);
        }
        self.released = true;
        self.tx.send_replace(Some(Ok(Arc::clone(verdict))));
    }

    fn fail(mut self, reason: String) {
        self.cache.lock().inflight.release(&self.fingerprint, self.id);
        self.released = true;
        self.tx.send_replace(Some(Err(reason)));
    }
}

impl Drop for Leader<'_> {
    fn drop(&mut self) {
        // The sender drops after this, closing the channel for waiters.
        if !self.released {
            self.cache.lock().inflight.release(&self.fingerprint, self.id);
        }
    }
}
