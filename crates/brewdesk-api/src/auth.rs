// Login / logout
//
// The login endpoint returns the bearer token in its JSON body and sets the
// refresh cookie in the transport's jar; subsequent refresh calls present
// that cookie automatically.

use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;
use crate::error::Error;
use crate::refresh::TokenResponse;
use crate::request::RequestDescriptor;
use crate::session::Session;

impl Dispatcher {
    /// Authenticate with email/password and start a new session.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Arc<Session>, Error> {
        let request = RequestDescriptor::post(self.endpoints().login.as_str())
            .json(json!({
                "email": email,
                "password": password.expose_secret(),
            }))
            .public();

        debug!("logging in at {}", request.path());

        let resp = self.transport().execute(&request, None).await?;
        let status = resp.status;

        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {}", resp.error_message()),
            });
        }
        if !status.is_success() {
            return Err(Error::request_failed(
                Some(status.as_u16()),
                resp.error_message(),
            ));
        }

        let token = TokenResponse::extract(&resp.body).ok_or_else(|| Error::Authentication {
            message: "login response did not contain an access token".into(),
        })?;

        let session = self.session().commit(Session::from_token(token));
        info!(
            user = session.identity().and_then(|c| c.display_name()).unwrap_or("unknown"),
            "login successful"
        );
        Ok(session)
    }

    /// End the current session.
    ///
    /// The logout call is best-effort; the local session is cleared whatever
    /// the server answers.
    pub async fn logout(&self) {
        let snapshot = self.session().snapshot();

        if let Some(token) = snapshot.credential() {
            let request = RequestDescriptor::post(self.endpoints().logout.as_str());
            debug!("logging out at {}", request.path());
            match self.transport().execute(&request, Some(token)).await {
                Ok(resp) if resp.status.is_success() => {}
                Ok(resp) => warn!(status = %resp.status, "logout rejected by server"),
                Err(e) => warn!(error = %e, "logout call failed"),
            }
        }

        self.session().commit(Session::cleared());
        debug!("logout complete");
    }
}
