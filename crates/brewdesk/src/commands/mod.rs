//! Command dispatch: bridges CLI args -> core client -> output formatting.

pub mod config_cmd;
pub mod mutate;
pub mod operations;
pub mod query;
pub mod util;
pub mod whoami;

use std::sync::Arc;

use tracing::debug;

use brewdesk_core::{AdminClient, CoreError, SecretString, SessionState, resource};

use crate::cli::{Command, GlobalOpts};
use crate::config::{self, Resolved};
use crate::error::CliError;

/// A client for the resolved backend, logged in lazily.
pub struct Connection {
    pub client: AdminClient,
    resolved: Resolved,
}

impl Connection {
    /// Build the client. With `--token` the session starts authenticated.
    pub fn open(global: &GlobalOpts) -> Result<Self, CliError> {
        let resolved = config::resolve(global)?;
        let session = match global.token {
            Some(ref token) => SessionState::restore(SecretString::from(token.clone())),
            None => SessionState::new(),
        };
        let client = AdminClient::with_modules(
            resolved.client.clone(),
            resource::catalog(),
            Arc::new(session),
        )?;
        debug!(
            profile = %resolved.profile_name,
            url = %resolved.client.base_url,
            "client ready"
        );
        Ok(Self { client, resolved })
    }

    /// Log in unless the session already holds a credential.
    pub async fn authenticate(&self, global: &GlobalOpts) -> Result<(), CliError> {
        if self.client.session().is_authenticated() {
            return Ok(());
        }
        let email = config::resolve_email(global, &self.resolved)?;
        let password = config::resolve_password(&self.resolved)?;

        self.client
            .login(&email, &password)
            .await
            .map_err(|err| match err {
                CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                    profile: self.resolved.profile_name.clone(),
                    message,
                },
                other => other.into(),
            })?;
        debug!(%email, "logged in");
        Ok(())
    }
}

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, conn: &Connection, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Query(args) => query::handle(conn, &args, global).await,
        Command::Mutate(args) => mutate::handle(conn, &args, global).await,
        Command::Whoami => whoami::handle(conn, global).await,
        // Operations, Config and Completions are handled before dispatch
        Command::Operations(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
