// Session state
//
// The current bearer credential and the identity claims decoded from it.
// Only login, refresh, and logout commit a new session; everyone else
// reads `Arc<Session>` snapshots or watches for changes.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Identity claims carried in the access token payload.
///
/// Decoded without signature verification: good for display, never for
/// authorization decisions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub role: Option<String>,

    /// Expiry as seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<i64>,

    /// Any other claim the backend includes.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Claims {
    /// Decode the payload segment of a JWT.
    ///
    /// Returns `None` for opaque tokens or malformed payloads.
    pub fn from_token(token: &str) -> Option<Self> {
        let mut parts = token.split('.');
        let (Some(_header), Some(payload), Some(_sig), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return None;
        };

        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Best label for showing who is logged in.
    pub fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .or(self.sub.as_deref())
    }
}

/// A point-in-time view of the session.
///
/// `credential` is present iff the user is authenticated. `epoch` counts
/// commits to the owning [`SessionState`]; the refresh coordinator uses it
/// to tell whether a 401 was observed under an outdated credential.
#[derive(Debug, Clone, Default)]
pub struct Session {
    identity: Option<Claims>,
    credential: Option<SecretString>,
    epoch: u64,
}

impl Session {
    /// An authenticated session, identity decoded from the token.
    pub fn from_token(token: SecretString) -> Self {
        let identity = Claims::from_token(token.expose_secret());
        Self {
            identity,
            credential: Some(token),
            epoch: 0,
        }
    }

    /// An authenticated session with an already-known identity.
    pub(crate) fn with_identity(token: SecretString, identity: Option<Claims>) -> Self {
        Self {
            identity,
            credential: Some(token),
            epoch: 0,
        }
    }

    /// The logged-out session.
    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> Option<&Claims> {
        self.identity.as_ref()
    }

    pub fn credential(&self) -> Option<&SecretString> {
        self.credential.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Owner of the current [`Session`].
///
/// Injected into the dispatcher and refresh coordinator rather than living
/// in a global, so tests can construct as many as they need.
#[derive(Debug)]
pub struct SessionState {
    current: watch::Sender<Arc<Session>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Start logged out.
    pub fn new() -> Self {
        let (current, _) = watch::channel(Arc::new(Session::cleared()));
        Self { current }
    }

    /// Start from a previously persisted credential.
    pub fn restore(token: SecretString) -> Self {
        let (current, _) = watch::channel(Arc::new(Session::from_token(token)));
        Self { current }
    }

    /// Cheap snapshot of the current session.
    pub fn snapshot(&self) -> Arc<Session> {
        self.current.borrow().clone()
    }

    /// Observe session changes. A snapshot without a credential means the
    /// session was lost and consumers should fall back to logged-out state.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Session>> {
        self.current.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.borrow().is_authenticated()
    }

    /// Replace the session wholesale, bumping the epoch.
    pub(crate) fn commit(&self, next: Session) -> Arc<Session> {
        let mut committed = None;
        self.current.send_modify(|cur| {
            let session = Arc::new(Session {
                epoch: cur.epoch + 1,
                ..next
            });
            committed = Some(Arc::clone(&session));
            *cur = session;
        });
        committed.unwrap_or_else(|| self.snapshot())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use serde_json::json;

    use super::*;

    pub(crate) fn make_jwt(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
        let signature = URL_SAFE_NO_PAD.encode(b"sig");
        format!("{header}.{payload}.{signature}")
    }

    #[test]
    fn decodes_claims_from_jwt_payload() {
        let jwt = make_jwt(&json!({
            "sub": "42",
            "email": "owner@brewdesk.app",
            "role": "SUPER_ADMIN",
            "exp": 1_900_000_000,
            "tenant": "north"
        }));

        let claims = Claims::from_token(&jwt).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("42"));
        assert_eq!(claims.role.as_deref(), Some("SUPER_ADMIN"));
        assert_eq!(claims.display_name(), Some("owner@brewdesk.app"));
        assert_eq!(claims.extra.get("tenant"), Some(&json!("north")));
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_900_000_000);
    }

    #[test]
    fn opaque_tokens_have_no_identity() {
        assert!(Claims::from_token("not-a-jwt").is_none());
        assert!(Claims::from_token("a.b.c.d").is_none());
        assert!(Claims::from_token("a.!!!.c").is_none());

        let session = Session::from_token(SecretString::from("opaque".to_owned()));
        assert!(session.is_authenticated());
        assert!(session.identity().is_none());
    }

    #[test]
    fn commit_bumps_epoch_and_notifies() {
        let state = SessionState::new();
        let mut rx = state.subscribe();
        assert!(!state.is_authenticated());
        assert_eq!(state.snapshot().epoch(), 0);

        let committed = state.commit(Session::from_token(SecretString::from("t1".to_owned())));
        assert_eq!(committed.epoch(), 1);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated());

        state.commit(Session::cleared());
        let snap = state.snapshot();
        assert_eq!(snap.epoch(), 2);
        assert!(snap.credential().is_none());
        assert!(snap.identity().is_none());
    }

    #[test]
    fn restore_starts_authenticated() {
        let jwt = make_jwt(&json!({ "name": "Barista Bob" }));
        let state = SessionState::restore(SecretString::from(jwt));
        assert!(state.is_authenticated());
        assert_eq!(
            state.snapshot().identity().unwrap().display_name(),
            Some("Barista Bob")
        );
    }
}
