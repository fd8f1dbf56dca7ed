// ── Cache entry state ──
//
// What subscribers observe. The registry owns the bookkeeping (epoch,
// subscriber count, in-flight fetch); only this snapshot is published.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use strum::Display;

use crate::error::CoreError;

/// Lifecycle of a cached result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum EntryStatus {
    /// No result yet; the first fetch is in flight.
    Pending,
    Fulfilled,
    Rejected,
    /// A tag this entry carries was invalidated after the value was fetched.
    Stale,
}

/// Point-in-time view of one cache entry.
#[derive(Debug, Clone)]
pub struct EntrySnapshot {
    pub status: EntryStatus,
    /// Last value fetched, kept across invalidation and failed refetches.
    pub value: Option<Arc<Value>>,
    /// Error of the latest fetch, cleared by the next success.
    pub error: Option<CoreError>,
    pub fetched_at: Option<DateTime<Utc>>,
    /// A fetch for this entry is in flight.
    pub is_fetching: bool,
}

impl EntrySnapshot {
    pub(crate) fn pending() -> Self {
        Self {
            status: EntryStatus::Pending,
            value: None,
            error: None,
            fetched_at: None,
            is_fetching: false,
        }
    }

    /// Settled with a current result and nothing left to fetch.
    pub fn is_settled(&self) -> bool {
        !self.is_fetching && matches!(self.status, EntryStatus::Fulfilled | EntryStatus::Rejected)
    }

    /// The outcome a consumer would render: the error for a rejected entry,
    /// otherwise the value if there is one.
    pub fn result(&self) -> Option<Result<Arc<Value>, CoreError>> {
        match (self.status, &self.error, &self.value) {
            (EntryStatus::Rejected, Some(err), _) => Some(Err(err.clone())),
            (_, _, Some(value)) => Some(Ok(Arc::clone(value))),
            _ => None,
        }
    }
}
