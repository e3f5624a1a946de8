//! In-memory keyed store of short-lived entries.
//!
//! One `tokio::sync::RwLock` guards each table. Every check-and-mutate sequence
//! (unique insert, take) holds the write guard from lookup to removal, so two
//! concurrent takes of the same key can never both succeed.
//!
//! Expired entries stay in the table until [`TtlStore::sweep`] drains them. The sweep
//! removes them under the write guard, releases it, and only then runs the store's
//! [`ExpiryHandler`] on each drained entry, so slow side-effect I/O never blocks
//! inserts or takes.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, info, warn};

use welfare_core::clock::Clock;

use crate::error::SweepError;

/// Interval between sweep passes.
pub const SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(60);

/// Upper bound on a single expiry side effect.
pub const SIDE_EFFECT_TIMEOUT: StdDuration = StdDuration::from_secs(5);

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Outcome of [`TtlStore::take_if`].
#[derive(Debug, PartialEq, Eq)]
pub enum Take<V> {
    /// The entry was live and accepted; it has been removed.
    Taken(V),
    Missing,
    /// Present but past its expiry. Left in place for the sweep.
    Expired,
    /// Live but the predicate refused it. Left in place.
    Rejected,
}

/// Side effect applied to each entry the sweep drains.
pub trait ExpiryHandler<K, V>: Send + Sync + 'static {
    fn on_expired(&self, key: K, value: V) -> impl Future<Output = Result<(), SweepError>> + Send;
}

/// Handler for stores whose entries simply lapse.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExpiry;

impl<K: Send + 'static, V: Send + 'static> ExpiryHandler<K, V> for NoopExpiry {
    async fn on_expired(&self, _key: K, _value: V) -> Result<(), SweepError> {
        Ok(())
    }
}

pub struct TtlStore<K, V, H = NoopExpiry> {
    name: &'static str,
    entries: RwLock<HashMap<K, Entry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    on_expiry: H,
}

impl<K, V, H> TtlStore<K, V, H>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    H: ExpiryHandler<K, V>,
{
    /// `name` only labels log lines.
    pub fn new(name: &'static str, ttl: Duration, clock: Arc<dyn Clock>, on_expiry: H) -> Self {
        Self {
            name,
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
            on_expiry,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert or overwrite `key`. Returns the new expiry.
    pub async fn insert(&self, key: K, value: V) -> DateTime<Utc> {
        let mut entries = self.entries.write().await;
        let expires_at = self.clock.now() + self.ttl;
        entries.insert(key, Entry { value, expires_at });
        expires_at
    }

    /// Insert under a fresh key drawn from `make_key`.
    ///
    /// Candidates already present are redrawn, including expired entries the sweep has
    /// not reached yet, so a pending expiry side effect is never overwritten.
    pub async fn insert_unique(
        &self,
        mut make_key: impl FnMut() -> K,
        value: V,
    ) -> (K, DateTime<Utc>) {
        let mut entries = self.entries.write().await;
        let key = loop {
            let candidate = make_key();
            if !entries.contains_key(&candidate) {
                break candidate;
            }
            debug!(store = self.name, "key collision, regenerating");
        };
        let expires_at = self.clock.now() + self.ttl;
        entries.insert(key.clone(), Entry { value, expires_at });
        (key, expires_at)
    }

    /// Remove and return the entry at `key` if it is live and `accept` approves it.
    pub async fn take_if<Q>(&self, key: &Q, accept: impl FnOnce(&V) -> bool) -> Take<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut entries = self.entries.write().await;
        let now = self.clock.now();
        let Some(entry) = entries.get(key) else {
            return Take::Missing;
        };
        if entry.is_expired(now) {
            return Take::Expired;
        }
        if !accept(&entry.value) {
            return Take::Rejected;
        }
        match entries.remove(key) {
            Some(entry) => Take::Taken(entry.value),
            None => Take::Missing,
        }
    }

    /// Remove and return the live entry at `key`.
    pub async fn take<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.take_if(key, |_| true).await {
            Take::Taken(value) => Some(value),
            _ => None,
        }
    }

    pub async fn contains_live<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entries = self.entries.read().await;
        let now = self.clock.now();
        entries.get(key).is_some_and(|e| !e.is_expired(now))
    }

    /// Whether any live entry satisfies `pred`.
    pub async fn any_live(&self, pred: impl Fn(&V) -> bool) -> bool {
        let entries = self.entries.read().await;
        let now = self.clock.now();
        entries
            .values()
            .any(|e| !e.is_expired(now) && pred(&e.value))
    }

    /// Number of entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drain every expired entry and run the expiry handler on each.
    ///
    /// Handler failures and timeouts are logged and skipped; they never stop the pass.
    /// Returns the number of entries drained.
    pub async fn sweep(&self) -> usize {
        let expired: Vec<(K, Entry<V>)> = {
            let mut entries = self.entries.write().await;
            let now = self.clock.now();
            let (expired, live): (HashMap<_, _>, HashMap<_, _>) = std::mem::take(&mut *entries)
                .into_iter()
                .partition(|(_, entry)| entry.is_expired(now));
            *entries = live;
            expired.into_iter().collect()
        };

        let drained = expired.len();
        if drained == 0 {
            return 0;
        }

        let mut failed = 0usize;
        for (key, entry) in expired {
            let outcome = match timeout(
                SIDE_EFFECT_TIMEOUT,
                self.on_expiry.on_expired(key, entry.value),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(SweepError::Timeout),
            };
            if let Err(e) = outcome {
                failed += 1;
                warn!(store = self.name, error = %e, "expiry side effect failed");
            }
        }

        info!(store = self.name, drained, failed, "swept expired entries");
        drained
    }

    /// Run [`TtlStore::sweep`] every `period` on a background task until the returned
    /// handle is shut down.
    pub fn spawn_sweeper(self: &Arc<Self>, period: StdDuration) -> SweeperHandle {
        let store = Arc::clone(self);
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; nothing can be expired yet.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        store.sweep().await;
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!(store = store.name, "sweeper stopped");
        });
        SweeperHandle {
            name: self.name,
            stop: stop_tx,
            task,
        }
    }
}

/// Handle to a running sweeper task.
pub struct SweeperHandle {
    name: &'static str,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the sweeper to stop and wait for it. A pass already in flight finishes first.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.task.await {
            warn!(store = self.name, error = %e, "sweeper task ended abnormally");
        }
    }
}
