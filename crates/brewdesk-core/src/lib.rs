//! Caching layer between `brewdesk-api` and consumers (CLI or any other UI).
//!
//! - **[`AdminClient`]**: the facade. Owns the session, the dispatcher and
//!   the cache; consumers only issue queries and mutations by operation
//!   name and read the session.
//!
//! - **[`CacheRegistry`]**: one entry per operation and canonical
//!   arguments, deduplicating concurrent fetches. Mutations invalidate
//!   tags; subscribed entries are refetched, the rest evicted.
//!
//! - **[`OperationTable`]**: the invalidation graph as a declarative table
//!   built from the [`resource`] modules. Invalidation is per tag, never
//!   per record.
//!
//! - **[`Subscription`]**: RAII handle on one entry with `current()` /
//!   `latest()` / `changed()` / `into_stream()`.

pub mod args;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod operation;
pub mod resource;
pub mod tag;

// ── Primary re-exports ──────────────────────────────────────────────
pub use args::Args;
pub use cache::{CacheKey, CacheRegistry, EntrySnapshot, EntryStatus, Fetcher, Subscription};
pub use client::AdminClient;
pub use config::{ClientConfig, TlsVerification};
pub use error::CoreError;
pub use operation::{Operation, OperationKind, OperationTable};
pub use resource::ResourceModule;
pub use tag::Tag;

// Session types consumers need without depending on `brewdesk-api`.
pub use brewdesk_api::{AuthEndpoints, Claims, Notice, SecretString, Session, SessionState};
