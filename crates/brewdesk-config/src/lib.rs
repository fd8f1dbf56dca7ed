//! Configuration for brewdesk tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `brewdesk_core::ClientConfig`. The CLI adds
//! flag-aware overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use brewdesk_core::{AuthEndpoints, ClientConfig, TlsVerification};

/// Keyring service name; entries are keyed `{profile}/password`.
const KEYRING_SERVICE: &str = "brewdesk";

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "BREWDESK_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Name of the active profile: the explicit one, else the default.
    pub fn active_profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds an unsubscribed cache entry is kept.
    #[serde(default = "default_cache_keep")]
    pub cache_keep_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            cache_keep_secs: default_cache_keep(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_cache_keep() -> u64 {
    60
}

/// A named backend profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// API base URL (e.g. "https://api.brewdesk.app/api").
    pub api_url: String,

    /// Operator email used to log in.
    pub email: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logout_path: Option<String>,
}

impl Profile {
    /// Session endpoints with this profile's overrides applied.
    pub fn endpoints(&self) -> AuthEndpoints {
        let defaults = AuthEndpoints::default();
        AuthEndpoints {
            login: self.login_path.clone().unwrap_or(defaults.login),
            refresh: self.refresh_path.clone().unwrap_or(defaults.refresh),
            logout: self.logout_path.clone().unwrap_or(defaults.logout),
        }
    }

    pub fn parsed_url(&self) -> Result<Url, ConfigError> {
        self.api_url.parse().map_err(|_| ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("invalid URL: {}", self.api_url),
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `BREWDESK_CONFIG`, else platform
/// conventions (XDG on Linux).
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("app", "brewdesk", "brewdesk").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("brewdesk");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` (missing file is fine) merged with
/// `BREWDESK_*` variables (`__` separates nested keys).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("BREWDESK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Login email: the profile's, else `BREWDESK_EMAIL`.
pub fn resolve_email(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    resolve_email_with(profile, profile_name, |name| std::env::var(name).ok())
}

fn resolve_email_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    profile
        .email
        .clone()
        .or_else(|| env("BREWDESK_EMAIL"))
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve the login password.
///
/// Order: `password_env`, `BREWDESK_PASSWORD`, system keyring, plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_password_with(profile, profile_name, |name| std::env::var(name).ok(), || {
        keyring_password(profile_name)
    })
}

fn resolve_password_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl FnOnce() -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env
    if let Some(pw) = profile.password_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(pw));
    }

    // 2. Global env var
    if let Some(pw) = env("BREWDESK_PASSWORD") {
        return Ok(SecretString::from(pw));
    }

    // 3. Keyring
    if let Some(pw) = keyring() {
        return Ok(SecretString::from(pw));
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

fn keyring_password(profile_name: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .and_then(|entry| entry.get_password())
        .ok()
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))?;
    entry.set_password(password.expose_secret())?;
    Ok(())
}

// ── Runtime config ──────────────────────────────────────────────────

/// Build a `ClientConfig` from a profile, with no CLI flag overrides.
pub fn profile_to_client_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let mut config = ClientConfig::new(profile.parsed_url()?);

    config.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.endpoints = profile.endpoints();
    config.keep_unused_for = Duration::from_secs(defaults.cache_keep_secs);

    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn profile() -> Profile {
        Profile {
            api_url: "https://api.brewdesk.test/api".into(),
            email: Some("ops@brewdesk.test".into()),
            password: Some("plain".into()),
            password_env: Some("OPS_PW".into()),
            ..Profile::default()
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn password_env_wins() {
        let env = |name: &str| match name {
            "OPS_PW" => Some("from-profile-env".to_owned()),
            "BREWDESK_PASSWORD" => Some("from-global-env".to_owned()),
            _ => None,
        };
        let pw = resolve_password_with(&profile(), "default", env, || Some("kr".into())).unwrap();
        assert_eq!(pw.expose_secret(), "from-profile-env");
    }

    #[test]
    fn global_env_then_keyring_then_plaintext() {
        let env = |name: &str| (name == "BREWDESK_PASSWORD").then(|| "global".to_owned());
        let pw = resolve_password_with(&profile(), "default", env, || None).unwrap();
        assert_eq!(pw.expose_secret(), "global");

        let pw = resolve_password_with(&profile(), "default", no_env, || Some("kr".into())).unwrap();
        assert_eq!(pw.expose_secret(), "kr");

        let pw = resolve_password_with(&profile(), "default", no_env, || None).unwrap();
        assert_eq!(pw.expose_secret(), "plain");
    }

    #[test]
    fn missing_password_is_reported_per_profile() {
        let bare = Profile {
            api_url: "http://localhost:3000".into(),
            ..Profile::default()
        };
        let err = resolve_password_with(&bare, "staging", no_env, || None).unwrap_err();
        assert_eq!(err.to_string(), "no credentials configured for profile 'staging'");
    }

    #[test]
    fn email_from_profile_then_env() {
        let with_email = Profile {
            email: Some("ops@brewdesk.app".into()),
            ..Profile::default()
        };
        let env = |name: &str| (name == "BREWDESK_EMAIL").then(|| "env@brewdesk.app".to_owned());
        assert_eq!(resolve_email_with(&with_email, "prod", env).unwrap(), "ops@brewdesk.app");
        assert_eq!(
            resolve_email_with(&Profile::default(), "prod", env).unwrap(),
            "env@brewdesk.app"
        );

        let err = resolve_email_with(&Profile::default(), "prod", no_env).unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { ref profile } if profile == "prod"));
    }

    #[test]
    fn endpoint_overrides() {
        let mut p = profile();
        p.refresh_path = Some("/auth/refresh-token".into());
        let endpoints = p.endpoints();
        assert_eq!(endpoints.refresh, "/auth/refresh-token");
        assert_eq!(endpoints.login, AuthEndpoints::default().login);
    }

    #[test]
    fn client_config_from_profile() {
        let mut p = profile();
        p.ca_cert = Some(PathBuf::from("/etc/brewdesk/ca.pem"));
        p.timeout = Some(5);

        let cfg = profile_to_client_config(&p, &Defaults::default()).unwrap();
        assert_eq!(cfg.base_url.as_str(), "https://api.brewdesk.test/api");
        assert_eq!(cfg.tls, TlsVerification::CustomCa("/etc/brewdesk/ca.pem".into()));
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.keep_unused_for, Duration::from_secs(60));

        p.insecure = Some(true);
        let cfg = profile_to_client_config(&p, &Defaults::default()).unwrap();
        assert_eq!(cfg.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn invalid_url_is_a_validation_error() {
        let p = Profile {
            api_url: "not a url".into(),
            ..Profile::default()
        };
        assert!(matches!(
            profile_to_client_config(&p, &Defaults::default()),
            Err(ConfigError::Validation { field, .. }) if field == "api_url"
        ));
    }
}
