// Session refresh coordination
//
// Exchanges the refresh cookie for a new bearer token. Concurrent callers
// that saw the same expiry share one refresh: the first starts it as a
// spawned task, the rest await the same `Shared` handle. The in-flight slot
// is cleared under the same lock as the session commit, so exactly one
// commit happens per refresh cycle. A refresh only commits over the session
// it started from; a login or logout that lands while it runs wins.

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::request::RequestDescriptor;
use crate::session::{Claims, Session, SessionState};
use crate::transport::Transport;

type PendingRefresh = Shared<BoxFuture<'static, Result<SecretString, Error>>>;

/// Token-bearing response body shared by the login and refresh endpoints.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(
        default,
        rename = "accessToken",
        alias = "access_token",
        alias = "token"
    )]
    pub access_token: Option<String>,
}

impl TokenResponse {
    /// Pull a non-empty token out of a response body.
    pub(crate) fn extract(body: &str) -> Option<SecretString> {
        serde_json::from_str::<Self>(body)
            .ok()?
            .access_token
            .filter(|t| !t.is_empty())
            .map(SecretString::from)
    }
}

/// Single-flight executor for the refresh endpoint.
///
/// Cheaply cloneable; clones share the in-flight slot.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<RefreshInner>,
}

struct RefreshInner {
    transport: Transport,
    session: Arc<SessionState>,
    path: String,
    in_flight: Mutex<Option<PendingRefresh>>,
}

impl RefreshCoordinator {
    pub fn new(transport: Transport, session: Arc<SessionState>, path: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RefreshInner {
                transport,
                session,
                path: path.into(),
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Obtain a credential newer than the one that was rejected.
    ///
    /// `observed_epoch` is the session epoch the failing request was sent
    /// under. If the session has moved on since then (another caller
    /// already refreshed, or the session was cleared), no new refresh is
    /// started and the current outcome is returned instead.
    ///
    /// On failure the session has been cleared and the error is
    /// [`Error::SessionExpired`].
    pub async fn refresh(&self, observed_epoch: u64) -> Result<SecretString, Error> {
        let pending = {
            let mut slot = self.inner.in_flight.lock().await;
            if let Some(pending) = slot.as_ref() {
                debug!("joining in-flight session refresh");
                pending.clone()
            } else {
                let current = self.inner.session.snapshot();
                if current.epoch() > observed_epoch {
                    debug!(
                        observed_epoch,
                        current_epoch = current.epoch(),
                        "session already replaced; skipping refresh"
                    );
                    return current
                        .credential()
                        .cloned()
                        .ok_or_else(|| Error::session_expired("session was cleared"));
                }
                let pending = self.start(current.epoch());
                *slot = Some(pending.clone());
                pending
            }
        };

        pending.await
    }

    /// Whether a refresh is currently running.
    pub async fn is_refreshing(&self) -> bool {
        self.inner.in_flight.lock().await.is_some()
    }

    fn start(&self, started_epoch: u64) -> PendingRefresh {
        let task_inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move { task_inner.run(started_epoch).await });

        let inner = Arc::clone(&self.inner);
        async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    // The task died before clearing its slot.
                    *inner.in_flight.lock().await = None;
                    Err(Error::request_failed(None, format!("refresh task failed: {e}")))
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl RefreshInner {
    async fn run(&self, started_epoch: u64) -> Result<SecretString, Error> {
        let outcome = self.call_endpoint().await;

        let mut slot = self.in_flight.lock().await;
        let current = self.session.snapshot();
        if current.epoch() != started_epoch {
            debug!(
                started_epoch,
                current_epoch = current.epoch(),
                "session changed during refresh; discarding result"
            );
            *slot = None;
            return current
                .credential()
                .cloned()
                .ok_or_else(|| Error::session_expired("session was cleared"));
        }
        let result = match outcome {
            Ok(token) => {
                let previous = self.session.snapshot();
                let identity = previous
                    .identity()
                    .cloned()
                    .or_else(|| Claims::from_token(token.expose_secret()));
                let committed = self
                    .session
                    .commit(Session::with_identity(token.clone(), identity));
                info!(epoch = committed.epoch(), "session refreshed");
                Ok(token)
            }
            Err(reason) => {
                warn!(%reason, "session refresh failed; clearing session");
                self.session.commit(Session::cleared());
                Err(Error::session_expired(reason))
            }
        };
        *slot = None;
        result
    }

    async fn call_endpoint(&self) -> Result<SecretString, String> {
        let request = RequestDescriptor::post(self.path.as_str()).public();
        debug!("refreshing session at {}", self.path);

        let resp = self
            .transport
            .execute(&request, None)
            .await
            .map_err(|e| format!("refresh call failed: {e}"))?;

        if !resp.status.is_success() {
            return Err(format!(
                "refresh rejected (HTTP {}): {}",
                resp.status.as_u16(),
                resp.error_message()
            ));
        }

        TokenResponse::extract(&resp.body)
            .ok_or_else(|| "refresh response did not contain an access token".to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn token_response_accepts_common_field_names() {
        for body in [
            r#"{"accessToken":"abc"}"#,
            r#"{"access_token":"abc"}"#,
            r#"{"token":"abc","user":{"id":1}}"#,
        ] {
            let token = TokenResponse::extract(body).unwrap();
            assert_eq!(token.expose_secret(), "abc");
        }
    }

    #[test]
    fn token_response_rejects_missing_or_empty_tokens() {
        assert!(TokenResponse::extract(r#"{"ok":true}"#).is_none());
        assert!(TokenResponse::extract(r#"{"accessToken":""}"#).is_none());
        assert!(TokenResponse::extract("not json").is_none());
    }
}
