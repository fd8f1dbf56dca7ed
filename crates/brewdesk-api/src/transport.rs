// HTTP transport
//
// One request/response cycle per call: URL construction, header and body
// serialization, timeout. Knows nothing about sessions beyond attaching
// whatever bearer token the caller hands it. The cookie jar lives here so
// the refresh cookie set at login rides along on the refresh call.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::cookie::Jar;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::request::RequestDescriptor;

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (local development backends).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Upper bound for every call, including login and refresh.
    pub timeout: Duration,
    pub cookie_jar: Arc<Jar>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            cookie_jar: Arc::new(Jar::default()),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("brewdesk/", env!("CARGO_PKG_VERSION")))
            .cookie_provider(Arc::clone(&self.cookie_jar));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// A response whose body has been fully read.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    /// Parse the body as JSON. An empty body (e.g. 204) yields `Null`.
    pub fn json(&self) -> Result<Value, Error> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&self.body).map_err(|e| {
            Error::request_failed(
                Some(self.status.as_u16()),
                format!("invalid JSON body: {e} (preview: {:?})", self.preview()),
            )
        })
    }

    /// Human-readable failure message: the backend's `message`/`error`
    /// field when the body is JSON, else a short text preview.
    pub fn error_message(&self) -> String {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&self.body) {
            for field in ["message", "error", "detail"] {
                match map.get(field) {
                    Some(Value::String(s)) => return s.clone(),
                    Some(Value::Array(items)) if !items.is_empty() => {
                        return items
                            .iter()
                            .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_owned))
                            .collect::<Vec<_>>()
                            .join("; ");
                    }
                    _ => {}
                }
            }
        }
        let preview = self.preview();
        if preview.is_empty() {
            self.status
                .canonical_reason()
                .unwrap_or("no response body")
                .to_owned()
        } else {
            preview.to_owned()
        }
    }

    fn preview(&self) -> &str {
        let body = self.body.trim();
        let mut end = body.len().min(200);
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        &body[..end]
    }
}

/// Performs single HTTP exchanges against the API base URL.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    base_url: Url,
}

impl Transport {
    pub fn new(base_url: Url, config: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: config.build_client()?,
            base_url,
        })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// Build the absolute URL for an API path: `{base}{path}`.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Send one request. Non-2xx statuses are *not* errors here; the
    /// dispatcher classifies them. Only transport failures (connect,
    /// timeout, unreadable body) produce `Err`.
    pub async fn execute(
        &self,
        request: &RequestDescriptor,
        bearer: Option<&SecretString>,
    ) -> Result<RawResponse, Error> {
        let url = self.url(request.path())?;
        debug!("{} {url}", request.method());

        let mut builder = self.http.request(request.method().clone(), url);
        if !request.query_params().is_empty() {
            builder = builder.query(request.query_params());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token.expose_secret());
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        trace!(%status, bytes = body.len(), "response received");

        Ok(RawResponse { status, body })
    }
}
