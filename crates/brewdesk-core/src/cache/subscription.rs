// ── Cache subscriptions ──
//
// A subscription keeps its entry alive and refetched on invalidation for as
// long as it exists. Dropping it releases the entry; a fetch still in
// flight completes and updates the cache, but is no longer observed here.

use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use super::entry::EntrySnapshot;
use super::key::CacheKey;
use super::registry::RegistryInner;

/// Releases one subscriber on drop.
pub(crate) struct SubscriptionGuard {
    registry: Weak<RegistryInner>,
    key: CacheKey,
    entry_id: u64,
}

impl SubscriptionGuard {
    pub(crate) fn new(registry: Weak<RegistryInner>, key: CacheKey, entry_id: u64) -> Self {
        Self {
            registry,
            key,
            entry_id,
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.release(&self.key, self.entry_id);
        }
    }
}

/// A live view of one cache entry.
pub struct Subscription {
    guard: SubscriptionGuard,
    receiver: watch::Receiver<EntrySnapshot>,
}

impl Subscription {
    pub(crate) fn new(guard: SubscriptionGuard, receiver: watch::Receiver<EntrySnapshot>) -> Self {
        Self { guard, receiver }
    }

    pub fn key(&self) -> &CacheKey {
        &self.guard.key
    }

    /// The newest snapshot, without marking it seen.
    pub fn current(&self) -> EntrySnapshot {
        self.receiver.borrow().clone()
    }

    /// The newest snapshot, marking it seen.
    pub fn latest(&mut self) -> EntrySnapshot {
        self.receiver.borrow_and_update().clone()
    }

    /// Wait for the next change. `None` once the entry has been dropped
    /// from the cache.
    pub async fn changed(&mut self) -> Option<EntrySnapshot> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Wait until the entry holds a current result with no fetch in flight.
    pub async fn settled(&mut self) -> Option<EntrySnapshot> {
        let snap = self.receiver.wait_for(EntrySnapshot::is_settled).await.ok()?;
        Some(snap.clone())
    }

    /// Convert into a `Stream` that yields the current snapshot, then one
    /// per change. The subscription is held until the stream is dropped.
    pub fn into_stream(self) -> SubscriptionStream {
        SubscriptionStream {
            _guard: self.guard,
            inner: WatchStream::new(self.receiver),
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.guard.key)
            .finish_non_exhaustive()
    }
}

/// `Stream` adapter over a [`Subscription`].
pub struct SubscriptionStream {
    _guard: SubscriptionGuard,
    inner: WatchStream<EntrySnapshot>,
}

impl Stream for SubscriptionStream {
    type Item = EntrySnapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
