//! Authenticated data-fetching kernel for the brewdesk admin API.
//!
//! - **[`Dispatcher`]**: attaches the bearer credential, classifies
//!   responses, and recovers from an expired credential by refreshing the
//!   session and retrying the same [`RequestDescriptor`] once.
//! - **[`RefreshCoordinator`]**: single-flight exchange of the refresh
//!   cookie for a new bearer token.
//! - **[`SessionState`]**: the injectable owner of the current [`Session`].
//! - **[`Transport`]**: one HTTP round trip, built from [`TransportConfig`].

mod auth;
pub mod dispatch;
pub mod error;
pub mod refresh;
pub mod request;
pub mod session;
pub mod transport;

pub use dispatch::{AuthEndpoints, Dispatcher, Notice};
pub use error::Error;
pub use refresh::RefreshCoordinator;
pub use request::RequestDescriptor;
pub use session::{Claims, Session, SessionState};
pub use transport::{RawResponse, TlsMode, Transport, TransportConfig};

/// Re-exported so resource definitions can name HTTP methods.
pub use reqwest::Method;
/// Re-exported so callers can build credentials without depending on `secrecy`.
pub use secrecy::SecretString;
