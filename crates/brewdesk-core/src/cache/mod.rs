//! Query cache keyed by operation and arguments, invalidated by tag.

mod entry;
mod fetcher;
mod key;
mod registry;
mod subscription;

pub use entry::{EntrySnapshot, EntryStatus};
pub use fetcher::Fetcher;
pub use key::CacheKey;
pub use registry::CacheRegistry;
pub use subscription::{Subscription, SubscriptionStream};
