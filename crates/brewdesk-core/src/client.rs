// ── Admin client facade ──
//
// Owns the session, the dispatcher and the cache, and is the only surface
// consumers talk to: issue a query, issue a mutation, read the session.

use std::sync::Arc;

use brewdesk_api::{Dispatcher, Notice, SecretString, Session, SessionState};
use serde_json::Value;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::args::Args;
use crate::cache::{CacheRegistry, Subscription};
use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::operation::OperationTable;
use crate::resource::{self, ResourceModule};
use crate::tag::Tag;

/// The authenticated, caching admin API client.
///
/// Cheaply cloneable via `Arc<ClientInner>`.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    dispatcher: Dispatcher,
    cache: CacheRegistry,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl AdminClient {
    /// Client over the built-in resource catalogue with a fresh session.
    pub fn new(config: ClientConfig) -> Result<Self, CoreError> {
        Self::with_modules(config, resource::catalog(), Arc::new(SessionState::new()))
    }

    /// Client over a custom set of resource modules and an injected session.
    pub fn with_modules(
        config: ClientConfig,
        modules: Vec<ResourceModule>,
        session: Arc<SessionState>,
    ) -> Result<Self, CoreError> {
        let table = Arc::new(OperationTable::from_modules(modules)?);
        let dispatcher = Dispatcher::new(
            config.base_url.clone(),
            &config.transport(),
            config.endpoints.clone(),
            session,
        )?;
        let cache = CacheRegistry::new(
            Arc::new(dispatcher.clone()),
            table,
            config.keep_unused_for,
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                dispatcher,
                cache,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the background tasks: cache GC, and clearing the cache when the
    /// session is lost.
    pub async fn start(&self) {
        let mut handles = self.inner.task_handles.lock().await;
        if !handles.is_empty() {
            return;
        }

        let interval = self.inner.config.gc_interval;
        if !interval.is_zero() {
            handles.push(
                self.inner
                    .cache
                    .spawn_gc(interval, self.inner.cancel.child_token()),
            );
        }

        handles.push(tokio::spawn(session_watch_task(
            self.session_changes(),
            self.inner.cache.clone(),
            self.inner.cancel.child_token(),
        )));
        debug!(tasks = handles.len(), "background tasks started");
    }

    /// Stop background tasks and wait for them.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handles: Vec<_> = self.inner.task_handles.lock().await.drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
        debug!("client shut down");
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Log in and start from an empty cache.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Arc<Session>, CoreError> {
        let session = self.inner.dispatcher.login(email, password).await?;
        self.inner.cache.clear();
        Ok(session)
    }

    /// End the session (best effort on the server) and drop cached data.
    pub async fn logout(&self) {
        self.inner.dispatcher.logout().await;
        self.inner.cache.clear();
        info!("logged out");
    }

    /// Current session snapshot.
    pub fn session(&self) -> Arc<Session> {
        self.inner.dispatcher.session().snapshot()
    }

    /// Watch session changes. A snapshot without a credential means the
    /// session was lost.
    pub fn session_changes(&self) -> watch::Receiver<Arc<Session>> {
        self.inner.dispatcher.session().subscribe()
    }

    /// Dispatch notifications (404s).
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.dispatcher.notices()
    }

    // ── Operations ───────────────────────────────────────────────────

    pub async fn query(&self, operation: &str, args: &Args) -> Result<Arc<Value>, CoreError> {
        self.inner.cache.query(operation, args).await
    }

    pub async fn mutate(&self, operation: &str, args: &Args) -> Result<Arc<Value>, CoreError> {
        self.inner.cache.mutate(operation, args).await
    }

    pub fn subscribe(&self, operation: &str, args: &Args) -> Result<Subscription, CoreError> {
        self.inner.cache.subscribe(operation, args)
    }

    pub fn unsubscribe(&self, subscription: Subscription) {
        self.inner.cache.unsubscribe(subscription);
    }

    /// Invalidate tags by hand, e.g. after a change made outside this client.
    pub fn invalidate(&self, tags: &[Tag]) -> usize {
        self.inner.cache.invalidate(tags)
    }

    pub fn operations(&self) -> &OperationTable {
        self.inner.cache.operations()
    }

    pub fn cache(&self) -> &CacheRegistry {
        &self.inner.cache
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }
}

/// Drop cached data as soon as the session loses its credential.
async fn session_watch_task(
    mut sessions: watch::Receiver<Arc<Session>>,
    cache: CacheRegistry,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = sessions.changed() => {
                if changed.is_err() {
                    break;
                }
                let authenticated = sessions.borrow_and_update().is_authenticated();
                if !authenticated && !cache.is_empty() {
                    info!("session lost, dropping cached data");
                    cache.clear();
                }
            }
        }
    }
}
