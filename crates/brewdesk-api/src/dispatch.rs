// Authenticated dispatcher
//
// Every API call goes through here: the current credential is attached,
// the response is classified, and a rejected credential is recovered via
// the refresh coordinator with exactly one retry of the same descriptor.

use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::SecretString;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::refresh::RefreshCoordinator;
use crate::request::RequestDescriptor;
use crate::session::SessionState;
use crate::transport::{RawResponse, Transport, TransportConfig};

const NOTICE_CHANNEL_SIZE: usize = 64;

/// Paths of the session endpoints, relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoints {
    pub login: String,
    pub refresh: String,
    pub logout: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login: "/auth/login".into(),
            refresh: "/auth/refresh".into(),
            logout: "/auth/logout".into(),
        }
    }
}

/// Global, best-effort notifications raised as a side effect of dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A request came back 404. Raised regardless of how the caller
    /// handles the error.
    NotFound { path: String, message: String },
}

/// Outcome of one transport round trip, before any recovery.
enum Attempt {
    Settled(Result<Value, Error>),
    /// 401 on an authenticated request. Never leaves this module.
    AuthExpired { message: String },
}

/// The authenticated dispatcher.
///
/// Cheaply cloneable via `Arc<DispatcherInner>`.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    transport: Transport,
    session: Arc<SessionState>,
    refresh: RefreshCoordinator,
    endpoints: AuthEndpoints,
    notices: broadcast::Sender<Notice>,
}

impl Dispatcher {
    /// Build a dispatcher with its own HTTP client.
    pub fn new(
        base_url: Url,
        transport: &TransportConfig,
        endpoints: AuthEndpoints,
        session: Arc<SessionState>,
    ) -> Result<Self, Error> {
        let transport = Transport::new(base_url, transport)?;
        Ok(Self::with_transport(transport, endpoints, session))
    }

    /// Build a dispatcher around an existing transport.
    pub fn with_transport(
        transport: Transport,
        endpoints: AuthEndpoints,
        session: Arc<SessionState>,
    ) -> Self {
        let refresh = RefreshCoordinator::new(
            transport.clone(),
            Arc::clone(&session),
            endpoints.refresh.clone(),
        );
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_SIZE);

        Self {
            inner: Arc::new(DispatcherInner {
                transport,
                session,
                refresh,
                endpoints,
                notices,
            }),
        }
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.inner.session
    }

    pub fn endpoints(&self) -> &AuthEndpoints {
        &self.inner.endpoints
    }

    pub(crate) fn transport(&self) -> &Transport {
        &self.inner.transport
    }

    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.inner.refresh
    }

    /// Subscribe to dispatch side-effect notifications.
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    /// Execute a request on behalf of a consumer.
    ///
    /// - authenticated request, no credential: `SessionExpired`, no network
    /// - 2xx: the JSON body (`Null` when empty)
    /// - 404: `NotFound`, plus a [`Notice::NotFound`]
    /// - 401 on an authenticated request: refresh, then one retry whose
    ///   outcome is final (a second 401 is `SessionExpired`)
    /// - anything else: `RequestFailed`
    pub async fn dispatch(&self, request: &RequestDescriptor) -> Result<Value, Error> {
        let session = self.inner.session.snapshot();

        let bearer = if request.requires_auth() {
            match session.credential() {
                Some(token) => Some(token.clone()),
                None => {
                    debug!(%request, "no credential; rejecting without a network call");
                    return Err(Error::session_expired("not logged in"));
                }
            }
        } else {
            None
        };

        match self.attempt(request, bearer.as_ref()).await {
            Attempt::Settled(result) => result,
            Attempt::AuthExpired { message } => {
                debug!(%request, %message, "credential rejected; refreshing session");
                let token = self.inner.refresh.refresh(session.epoch()).await?;

                match self.attempt(request, Some(&token)).await {
                    Attempt::Settled(result) => result,
                    Attempt::AuthExpired { message } => {
                        warn!(%request, %message, "credential rejected again after refresh");
                        Err(Error::session_expired(format!(
                            "credential rejected after refresh: {message}"
                        )))
                    }
                }
            }
        }
    }

    /// Refresh the session now, outside of any failing request.
    pub async fn refresh_session(&self) -> Result<(), Error> {
        let epoch = self.inner.session.snapshot().epoch();
        self.inner.refresh.refresh(epoch).await.map(|_| ())
    }

    async fn attempt(
        &self,
        request: &RequestDescriptor,
        bearer: Option<&SecretString>,
    ) -> Attempt {
        match self.inner.transport.execute(request, bearer).await {
            Ok(resp) => self.classify(request, &resp),
            Err(e) => Attempt::Settled(Err(e)),
        }
    }

    fn classify(&self, request: &RequestDescriptor, resp: &RawResponse) -> Attempt {
        let status = resp.status;

        if status.is_success() {
            return Attempt::Settled(resp.json());
        }

        let message = resp.error_message();

        if status == StatusCode::NOT_FOUND {
            warn!(%request, %message, "resource not found");
            // Fire-and-forget: no subscribers is fine.
            let _ = self.inner.notices.send(Notice::NotFound {
                path: request.path().to_owned(),
                message: message.clone(),
            });
            return Attempt::Settled(Err(Error::NotFound {
                status: status.as_u16(),
                message,
            }));
        }

        if status == StatusCode::UNAUTHORIZED && request.requires_auth() {
            return Attempt::AuthExpired { message };
        }

        Attempt::Settled(Err(Error::request_failed(Some(status.as_u16()), message)))
    }
}
