// ── Runtime client configuration ──
//
// Describes how to reach the admin API and how long cached results live.
// Built by the CLI (or any other consumer) and handed in; core never reads
// config files.

use std::path::PathBuf;
use std::time::Duration;

use brewdesk_api::{AuthEndpoints, TlsMode, TransportConfig};
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file (PEM).
    CustomCa(PathBuf),
    /// Skip verification. Only for local development backends.
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// Configuration for one admin API backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL (e.g. `https://api.brewdesk.app/api`).
    pub base_url: Url,
    pub tls: TlsVerification,
    /// Upper bound for every call, refresh included.
    pub timeout: Duration,
    pub endpoints: AuthEndpoints,
    /// How long an unsubscribed cache entry survives garbage collection.
    pub keep_unused_for: Duration,
    /// Interval of the background GC task. Zero disables it.
    pub gc_interval: Duration,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            endpoints: AuthEndpoints::default(),
            keep_unused_for: Duration::from_secs(60),
            gc_interval: Duration::from_secs(30),
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from(&self.tls),
            timeout: self.timeout,
            ..TransportConfig::default()
        }
    }
}
