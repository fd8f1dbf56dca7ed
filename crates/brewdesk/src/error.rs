//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use brewdesk_config::ConfigError;
use brewdesk_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Request failed: {message}")]
    #[diagnostic(
        code(brewdesk::connection_failed),
        help(
            "The API did not answer. Check the URL and that the backend is running.\n\
             Try: brewdesk whoami -v"
        )
    )]
    ConnectionFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(brewdesk::auth_failed),
        help(
            "Verify the email and password for profile '{profile}'.\n\
             Run: brewdesk config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("Session expired: {message}")]
    #[diagnostic(
        code(brewdesk::session_expired),
        help("The session could not be refreshed. Run the command again to log in anew.")
    )]
    SessionExpired { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(brewdesk::no_credentials),
        help(
            "Configure credentials with: brewdesk config init\n\
             Or set BREWDESK_EMAIL and BREWDESK_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Not found: {message}")]
    #[diagnostic(code(brewdesk::not_found))]
    NotFound { message: String },

    #[error("Unknown operation '{name}'")]
    #[diagnostic(
        code(brewdesk::unknown_operation),
        help("Run: brewdesk operations to see what is available")
    )]
    UnknownOperation { name: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error (HTTP {status}): {message}")]
    #[diagnostic(code(brewdesk::api_error))]
    ApiError { status: u16, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(brewdesk::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(brewdesk::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: brewdesk config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No API URL configured")]
    #[diagnostic(
        code(brewdesk::no_config),
        help(
            "Create a profile with: brewdesk config init\n\
             Or pass --api-url. Config expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(brewdesk::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' was not confirmed")]
    #[diagnostic(
        code(brewdesk::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NotConfirmed { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(brewdesk::json), help("Check the JSON arguments and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::SessionExpired { .. } | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::UnknownOperation { .. }
            | Self::Validation { .. }
            | Self::NotConfirmed { .. }
            | Self::Json(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { message, .. } => Self::NotFound { message },
            CoreError::SessionExpired { message } => Self::SessionExpired { message },
            CoreError::RequestFailed {
                status: Some(status),
                message,
            } => Self::ApiError { status, message },
            CoreError::RequestFailed {
                status: None,
                message,
            } => Self::ConnectionFailed { message },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed {
                profile: "current".into(),
                message,
            },
            CoreError::UnknownOperation { name } => Self::UnknownOperation { name },
            err @ CoreError::WrongOperationKind { .. } => Self::Validation {
                field: "operation".into(),
                reason: err.to_string(),
            },
            CoreError::InvalidArguments { operation, reason } => Self::Validation {
                field: format!("arguments of {operation}"),
                reason,
            },
            CoreError::DuplicateOperation { name } => Self::Validation {
                field: "operation catalogue".into(),
                reason: format!("'{name}' is registered twice"),
            },
            CoreError::Config { message } => Self::Validation {
                field: "configuration".into(),
                reason: message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (
                CoreError::NotFound {
                    status: 404,
                    message: "gone".into(),
                },
                exit_code::NOT_FOUND,
            ),
            (
                CoreError::SessionExpired {
                    message: "refresh failed".into(),
                },
                exit_code::AUTH,
            ),
            (
                CoreError::RequestFailed {
                    status: None,
                    message: "connection refused".into(),
                },
                exit_code::CONNECTION,
            ),
            (
                CoreError::RequestFailed {
                    status: Some(500),
                    message: "boom".into(),
                },
                exit_code::GENERAL,
            ),
            (
                CoreError::UnknownOperation {
                    name: "nope".into(),
                },
                exit_code::USAGE,
            ),
        ];

        for (core, expected) in cases {
            let label = core.to_string();
            assert_eq!(CliError::from(core).exit_code(), expected, "{label}");
        }
    }
}
