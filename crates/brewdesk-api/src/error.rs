use thiserror::Error;

/// Top-level error type for the `brewdesk-api` crate.
///
/// The first three variants are the failure kinds consumers are expected to
/// render: [`NotFound`](Self::NotFound), [`SessionExpired`](Self::SessionExpired)
/// and [`RequestFailed`](Self::RequestFailed). The rest describe setup
/// problems that never come out of a dispatched request.
///
/// `Clone` because a single outcome is shared between every caller that
/// joined the same in-flight request or refresh.
#[derive(Debug, Clone, Error)]
pub enum Error {
    // ── Dispatch outcomes ───────────────────────────────────────────
    /// The backend answered 404.
    #[error("Not found (HTTP {status}): {message}")]
    NotFound { status: u16, message: String },

    /// The session could not be recovered; re-login required.
    #[error("Session expired: {message}")]
    SessionExpired { message: String },

    /// Any other transport or server failure. `status` is `None` when no
    /// response was received (connect failure, timeout, bad body).
    #[error("Request failed{}: {message}", status_suffix(.status))]
    RequestFailed {
        status: Option<u16>,
        message: String,
    },

    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (wrong credentials, disabled account, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Setup ───────────────────────────────────────────────────────
    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or HTTP client construction error.
    #[error("TLS error: {0}")]
    Tls(String),
}

/// ` (HTTP 502)` when a status is known, empty otherwise.
#[allow(clippy::ref_option)]
pub fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" (HTTP {code})")).unwrap_or_default()
}

impl Error {
    pub fn request_failed(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            message: message.into(),
        }
    }

    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::SessionExpired {
            message: message.into(),
        }
    }

    /// HTTP status attached to this failure, if the server responded.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { status, .. } => Some(*status),
            Self::RequestFailed { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns `true` if the session is gone and the user must log in again.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if the backend produced a response for this failure,
    /// i.e. the request reached the server.
    pub fn reached_server(&self) -> bool {
        self.status().is_some()
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::request_failed(None, "request timed out")
        } else if err.is_connect() {
            Self::request_failed(None, format!("connection failed: {err}"))
        } else {
            Self::request_failed(err.status().map(|s| s.as_u16()), err.to_string())
        }
    }
}
