// ── Core error types ──
//
// What consumers of the client see. Dispatch failures keep their three
// user-facing kinds; the remaining variants describe misuse of the
// operation catalogue that is caught before any request is sent.

use brewdesk_api::error::status_suffix;
use thiserror::Error;

use crate::operation::OperationKind;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Dispatch failures ────────────────────────────────────────────
    #[error("Not found (HTTP {status}): {message}")]
    NotFound { status: u16, message: String },

    #[error("Session expired: {message}")]
    SessionExpired { message: String },

    #[error("Request failed{}: {message}", status_suffix(.status))]
    RequestFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Catalogue misuse ─────────────────────────────────────────────
    #[error("Unknown operation: {name}")]
    UnknownOperation { name: String },

    #[error("Operation '{name}' is a {actual}, not a {expected}")]
    WrongOperationKind {
        name: String,
        expected: OperationKind,
        actual: OperationKind,
    },

    #[error("Invalid arguments for '{operation}': {reason}")]
    InvalidArguments { operation: String, reason: String },

    #[error("Operation '{name}' is registered twice")]
    DuplicateOperation { name: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn invalid_args(operation: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            operation: operation.to_owned(),
            reason: reason.into(),
        }
    }

    /// HTTP status of the failure, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { status, .. } => Some(*status),
            Self::RequestFailed { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }

    /// Whether the server answered. A mutation that failed this way may
    /// still have changed server state.
    pub fn reached_server(&self) -> bool {
        self.status().is_some()
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<brewdesk_api::Error> for CoreError {
    fn from(err: brewdesk_api::Error) -> Self {
        match err {
            brewdesk_api::Error::NotFound { status, message } => Self::NotFound { status, message },
            brewdesk_api::Error::SessionExpired { message } => Self::SessionExpired { message },
            brewdesk_api::Error::RequestFailed { status, message } => {
                Self::RequestFailed { status, message }
            }
            brewdesk_api::Error::Authentication { message } => {
                Self::AuthenticationFailed { message }
            }
            brewdesk_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("Invalid URL: {e}"),
            },
            brewdesk_api::Error::Tls(message) => Self::Config {
                message: format!("TLS error: {message}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_failure_keeps_status_in_message() {
        let err = CoreError::from(brewdesk_api::Error::request_failed(Some(502), "bad gateway"));
        assert_eq!(err.to_string(), "Request failed (HTTP 502): bad gateway");
        assert!(err.reached_server());

        let err = CoreError::from(brewdesk_api::Error::request_failed(None, "connection reset"));
        assert_eq!(err.to_string(), "Request failed: connection reset");
        assert!(!err.reached_server());
    }
}
