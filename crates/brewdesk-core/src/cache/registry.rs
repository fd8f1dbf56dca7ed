// ── Cache registry ──
//
// One entry per (operation, canonical args). Every entry carries an epoch
// that invalidation bumps; a fetch remembers the epoch it started under and
// its result only counts as current if the epoch is unchanged when it
// settles. At most one fetch per entry is in flight at any time.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use brewdesk_api::RequestDescriptor;
use chrono::Utc;
use dashmap::DashMap;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::entry::{EntrySnapshot, EntryStatus};
use super::fetcher::Fetcher;
use super::key::CacheKey;
use super::subscription::{Subscription, SubscriptionGuard};
use crate::args::Args;
use crate::error::CoreError;
use crate::operation::{Operation, OperationKind, OperationTable};
use crate::tag::{self, Tag};

type FetchResult = Result<Arc<Value>, CoreError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

struct Entry {
    /// Distinguishes this entry from a later one under the same key.
    id: u64,
    tags: Vec<Tag>,
    /// Replayed on every refetch.
    request: RequestDescriptor,
    state: watch::Sender<EntrySnapshot>,
    subscribers: usize,
    epoch: u64,
    in_flight: Option<(u64, SharedFetch)>,
    last_used: Instant,
}

impl Entry {
    fn new(id: u64, op: &Operation, request: RequestDescriptor) -> Self {
        let (state, _) = watch::channel(EntrySnapshot::pending());
        Self {
            id,
            tags: op.tags.clone(),
            request,
            state,
            subscribers: 0,
            epoch: 0,
            in_flight: None,
            last_used: Instant::now(),
        }
    }

    fn status(&self) -> EntryStatus {
        self.state.borrow().status
    }

    /// Can be answered without touching the network.
    fn fresh_value(&self) -> Option<Arc<Value>> {
        let snap = self.state.borrow();
        match (snap.status, &snap.value) {
            (EntryStatus::Fulfilled, Some(value)) => Some(Arc::clone(value)),
            _ => None,
        }
    }
}

enum Lookup {
    Hit(Arc<Value>),
    Wait { epoch: u64, fetch: SharedFetch },
}

/// Tag-invalidated, deduplicating query cache.
///
/// Cheaply cloneable; clones share the same entries.
#[derive(Clone)]
pub struct CacheRegistry {
    inner: Arc<RegistryInner>,
}

pub(crate) struct RegistryInner {
    fetcher: Arc<dyn Fetcher>,
    table: Arc<OperationTable>,
    entries: DashMap<CacheKey, Entry>,
    next_id: AtomicU64,
    keep_unused_for: Duration,
}

impl CacheRegistry {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        table: Arc<OperationTable>,
        keep_unused_for: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                fetcher,
                table,
                entries: DashMap::new(),
                next_id: AtomicU64::new(0),
                keep_unused_for,
            }),
        }
    }

    pub fn operations(&self) -> &OperationTable {
        &self.inner.table
    }

    /// Run a query through the cache.
    ///
    /// A fulfilled entry is answered locally; a fetch already in flight
    /// for the key is joined; otherwise exactly one fetch is started. If
    /// the entry is invalidated while the fetch is in flight, the query
    /// goes around again so it never returns data older than the
    /// invalidation.
    pub async fn query(&self, operation: &str, args: &Args) -> Result<Arc<Value>, CoreError> {
        let op = self.inner.table.expect_kind(operation, OperationKind::Query)?;
        let request = op.request(args)?;
        let key = CacheKey::new(op.name, args);

        loop {
            let (epoch, fetch) = match self.inner.lookup(&key, op, &request) {
                Lookup::Hit(value) => {
                    trace!(key = %key, "cache hit");
                    return Ok(value);
                }
                Lookup::Wait { epoch, fetch } => (epoch, fetch),
            };

            let result = fetch.await;
            if self.inner.is_current(&key, epoch) {
                return result;
            }
            debug!(key = %key, "invalidated while in flight, querying again");
        }
    }

    /// Run a mutation and, once it settles, invalidate its tags.
    ///
    /// Tags are invalidated on success and on any failure the server
    /// answered. The call is spawned: dropping the returned future does
    /// not stop the request or the invalidation.
    pub async fn mutate(&self, operation: &str, args: &Args) -> Result<Arc<Value>, CoreError> {
        let op = self.inner.table.expect_kind(operation, OperationKind::Mutation)?;
        let request = op.request(args)?;
        let tags = op.tags.clone();
        let name = op.name;
        let inner = Arc::clone(&self.inner);

        let handle = tokio::spawn(async move {
            debug!(operation = name, request = %request, "mutation");
            let result = inner.fetcher.fetch(request).await;
            let touched_server = match &result {
                Ok(_) => true,
                Err(e) => e.reached_server(),
            };
            if touched_server {
                inner.invalidate(&tags);
            }
            result.map(Arc::new)
        });

        handle.await.unwrap_or_else(|e| Err(task_failed(&e)))
    }

    /// Mark every entry carrying one of `tags` stale. Subscribed entries are
    /// refetched, unsubscribed ones evicted. Returns how many entries were hit.
    pub fn invalidate(&self, tags: &[Tag]) -> usize {
        self.inner.invalidate(tags)
    }

    /// Synchronous lookup.
    pub fn read(&self, key: &CacheKey) -> Option<EntrySnapshot> {
        self.inner
            .entries
            .get(key)
            .map(|entry| entry.state.borrow().clone())
    }

    /// Subscribe to a query's entry, fetching it if it holds no current value.
    pub fn subscribe(&self, operation: &str, args: &Args) -> Result<Subscription, CoreError> {
        let op = self.inner.table.expect_kind(operation, OperationKind::Query)?;
        let request = op.request(args)?;
        let key = CacheKey::new(op.name, args);

        let mut entry = self.inner.entry(&key, op, &request);
        entry.subscribers += 1;
        entry.last_used = Instant::now();
        if entry.in_flight.is_none() && entry.status() != EntryStatus::Fulfilled {
            self.inner.refetch(&key, &mut entry);
        }
        let receiver = entry.state.subscribe();
        let id = entry.id;
        drop(entry);

        let guard = SubscriptionGuard::new(Arc::downgrade(&self.inner), key, id);
        Ok(Subscription::new(guard, receiver))
    }

    /// Release a subscription. Same as dropping it; the entry stays until GC.
    pub fn unsubscribe(&self, subscription: Subscription) {
        debug!(key = %subscription.key(), "unsubscribing");
        drop(subscription);
    }

    /// Subscriber count of `key` (zero when absent).
    pub fn subscribers(&self, key: &CacheKey) -> usize {
        self.inner.entries.get(key).map_or(0, |entry| entry.subscribers)
    }

    /// Drop every entry. Open subscriptions see their channel close.
    pub fn clear(&self) {
        self.inner.entries.clear();
        debug!("cache cleared");
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Evict entries nobody subscribes to, nothing is fetching, and that
    /// were either invalidated or unused for the keep-alive period.
    pub fn collect_garbage(&self) -> usize {
        let now = Instant::now();
        let keep = self.inner.keep_unused_for;
        let before = self.inner.entries.len();

        self.inner.entries.retain(|_, entry| {
            entry.subscribers > 0
                || entry.in_flight.is_some()
                || (entry.status() != EntryStatus::Stale
                    && now.duration_since(entry.last_used) < keep)
        });

        let evicted = before.saturating_sub(self.inner.entries.len());
        if evicted > 0 {
            debug!(evicted, "cache garbage collected");
        }
        evicted
    }

    /// Run [`collect_garbage`](Self::collect_garbage) every `interval` until
    /// `cancel` fires.
    pub fn spawn_gc(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // consume the immediate first tick

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        registry.collect_garbage();
                    }
                }
            }
        })
    }
}

impl RegistryInner {
    fn entry(
        &self,
        key: &CacheKey,
        op: &Operation,
        request: &RequestDescriptor,
    ) -> dashmap::mapref::one::RefMut<'_, CacheKey, Entry> {
        self.entries.entry(key.clone()).or_insert_with(|| {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            Entry::new(id, op, request.clone())
        })
    }

    fn lookup(
        self: &Arc<Self>,
        key: &CacheKey,
        op: &Operation,
        request: &RequestDescriptor,
    ) -> Lookup {
        let mut entry = self.entry(key, op, request);
        entry.last_used = Instant::now();

        if let Some((epoch, fetch)) = &entry.in_flight {
            return Lookup::Wait {
                epoch: *epoch,
                fetch: fetch.clone(),
            };
        }
        if let Some(value) = entry.fresh_value() {
            return Lookup::Hit(value);
        }

        let fetch = self.start_fetch(key, &mut entry);
        Lookup::Wait {
            epoch: entry.epoch,
            fetch,
        }
    }

    /// Start a fetch whose outcome nobody awaits directly.
    fn refetch(self: &Arc<Self>, key: &CacheKey, entry: &mut Entry) {
        let fetch = self.start_fetch(key, entry);
        drop(fetch);
    }

    /// True when `epoch` is still the entry's epoch, or the entry is gone.
    fn is_current(&self, key: &CacheKey, epoch: u64) -> bool {
        self.entries.get(key).is_none_or(|entry| entry.epoch == epoch)
    }

    /// Spawn the fetch for `entry` under its current epoch. The caller must
    /// have checked that nothing is in flight.
    fn start_fetch(self: &Arc<Self>, key: &CacheKey, entry: &mut Entry) -> SharedFetch {
        let epoch = entry.epoch;
        let id = entry.id;
        let request = entry.request.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let registry = Arc::downgrade(self);
        let task_key = key.clone();

        debug!(key = %key, request = %request, epoch, "fetching");

        let handle = tokio::spawn(async move {
            let result = AssertUnwindSafe(fetcher.fetch(request))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(CoreError::RequestFailed {
                        status: None,
                        message: "fetcher panicked".into(),
                    })
                })
                .map(Arc::new);
            settle(&registry, &task_key, id, epoch, &result);
            result
        });

        let fetch = async move { handle.await.unwrap_or_else(|e| Err(task_failed(&e))) }
            .boxed()
            .shared();

        entry.in_flight = Some((epoch, fetch.clone()));
        entry.state.send_modify(|snap| {
            snap.is_fetching = true;
            if snap.value.is_none() {
                snap.status = EntryStatus::Pending;
            }
        });
        fetch
    }

    fn complete(self: &Arc<Self>, key: &CacheKey, id: u64, epoch: u64, result: &FetchResult) {
        let Some(mut entry) = self.entries.get_mut(key) else {
            return;
        };
        if entry.id != id {
            // Evicted and recreated while this fetch was in flight.
            return;
        }
        if entry.in_flight.as_ref().is_some_and(|(e, _)| *e == epoch) {
            entry.in_flight = None;
        }

        let current = entry.epoch == epoch;
        let fetched_at = Utc::now();
        entry.state.send_modify(|snap| {
            snap.is_fetching = false;
            match result {
                Ok(value) => {
                    snap.value = Some(Arc::clone(value));
                    snap.error = None;
                    snap.fetched_at = Some(fetched_at);
                    snap.status = if current {
                        EntryStatus::Fulfilled
                    } else {
                        EntryStatus::Stale
                    };
                }
                Err(err) => {
                    snap.error = Some(err.clone());
                    snap.status = if current {
                        EntryStatus::Rejected
                    } else {
                        EntryStatus::Stale
                    };
                }
            }
        });

        if let Err(err) = result {
            warn!(key = %key, error = %err, "fetch failed");
        }

        if !current && entry.subscribers > 0 && entry.in_flight.is_none() {
            self.refetch(key, &mut entry);
        }
    }

    pub(crate) fn invalidate(self: &Arc<Self>, tags: &[Tag]) -> usize {
        let mut hit = 0;
        let mut evict = Vec::new();

        for mut item in self.entries.iter_mut() {
            let (key, entry) = item.pair_mut();
            if !tag::intersects(&entry.tags, tags) {
                continue;
            }
            hit += 1;
            entry.epoch += 1;
            entry.state.send_modify(|snap| {
                if snap.status != EntryStatus::Pending {
                    snap.status = EntryStatus::Stale;
                }
            });

            if entry.in_flight.is_some() {
                // Settles as stale and is refetched from there.
                continue;
            }
            if entry.subscribers > 0 {
                self.refetch(key, entry);
            } else {
                evict.push(key.clone());
            }
        }

        for key in &evict {
            self.entries
                .remove_if(key, |_, entry| entry.subscribers == 0 && entry.in_flight.is_none());
        }

        debug!(tags = ?tags, hit, evicted = evict.len(), "invalidated");
        hit
    }

    /// Drop one subscriber. `id` pins the release to the entry the
    /// subscription was taken on.
    pub(crate) fn release(&self, key: &CacheKey, id: u64) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            if id != entry.id {
                return;
            }
            entry.subscribers = entry.subscribers.saturating_sub(1);
            entry.last_used = Instant::now();
        }
    }
}

fn settle(
    registry: &Weak<RegistryInner>,
    key: &CacheKey,
    id: u64,
    epoch: u64,
    result: &FetchResult,
) {
    if let Some(registry) = registry.upgrade() {
        registry.complete(key, id, epoch, result);
    }
}

fn task_failed(err: &tokio::task::JoinError) -> CoreError {
    CoreError::RequestFailed {
        status: None,
        message: format!("request task failed: {err}"),
    }
}
