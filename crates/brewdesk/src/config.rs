//! CLI configuration -- thin wrapper around `brewdesk_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--api-url, --email, --token, ...).

use std::io::IsTerminal;
use std::time::Duration;

use secrecy::SecretString;

use brewdesk_core::{ClientConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use brewdesk_config::{
    Config, ConfigError, Defaults, Profile, config_path, load_config_or_default, save_config,
    store_password,
};

/// Everything needed to build and authenticate a client.
#[derive(Debug)]
pub struct Resolved {
    pub profile_name: String,
    pub profile: Option<Profile>,
    pub client: ClientConfig,
}

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Build the client configuration from the config file, the active
/// profile and CLI overrides.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    // Profile present: apply flag overrides on top of it.
    if let Some(profile) = cfg.profiles.get(&profile_name) {
        let mut profile = profile.clone();
        if let Some(ref url) = global.api_url {
            profile.api_url.clone_from(url);
        }
        let mut client = brewdesk_config::profile_to_client_config(&profile, &cfg.defaults)?;
        apply_overrides(&mut client, global);
        return Ok(Resolved {
            profile_name,
            profile: Some(profile),
            client,
        });
    }

    // An explicitly requested profile must exist.
    if global.profile.is_some() && !cfg.profiles.is_empty() {
        let available: Vec<_> = cfg.profiles.keys().cloned().collect();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available.join(", "),
        });
    }

    // No profile -- build from flags / env vars alone.
    let url_str = global.api_url.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let url: url::Url = url_str.parse().map_err(|_| CliError::Validation {
        field: "api-url".into(),
        reason: format!("invalid URL: {url_str}"),
    })?;

    let mut client = ClientConfig::new(url);
    client.timeout = Duration::from_secs(cfg.defaults.timeout);
    client.keep_unused_for = Duration::from_secs(cfg.defaults.cache_keep_secs);
    if cfg.defaults.insecure {
        client.tls = TlsVerification::DangerAcceptInvalid;
    }
    apply_overrides(&mut client, global);

    Ok(Resolved {
        profile_name,
        profile: None,
        client,
    })
}

fn apply_overrides(client: &mut ClientConfig, global: &GlobalOpts) {
    if global.insecure {
        client.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        client.timeout = Duration::from_secs(secs);
    }
    // A one-shot process never needs the background GC.
    client.gc_interval = Duration::ZERO;
}

/// Login email: `--email` / `BREWDESK_EMAIL`, else the profile's.
pub fn resolve_email(global: &GlobalOpts, resolved: &Resolved) -> Result<String, CliError> {
    if let Some(ref email) = global.email {
        return Ok(email.clone());
    }
    let fallback = Profile::default();
    let profile = resolved.profile.as_ref().unwrap_or(&fallback);

    brewdesk_config::resolve_email(profile, &resolved.profile_name).map_err(|e| match e {
        ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
        other => CliError::Config(other),
    })
}

/// Login password: the shared resolution chain, else an interactive prompt.
pub fn resolve_password(resolved: &Resolved) -> Result<SecretString, CliError> {
    let fallback = Profile::default();
    let profile = resolved.profile.as_ref().unwrap_or(&fallback);

    match brewdesk_config::resolve_password(profile, &resolved.profile_name) {
        Ok(password) => Ok(password),
        Err(ConfigError::NoCredentials { profile }) => {
            if !std::io::stdin().is_terminal() {
                return Err(CliError::NoCredentials { profile });
            }
            let password = rpassword::prompt_password("Password: ")?;
            if password.is_empty() {
                return Err(CliError::NoCredentials { profile });
            }
            Ok(SecretString::from(password))
        }
        Err(other) => Err(other.into()),
    }
}
