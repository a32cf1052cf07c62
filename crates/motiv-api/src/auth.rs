// Vendor authentication
//
// Two-step login: `POST /parse/login` yields the user id and session
// token, then `GET /parse/sessions/me` yields the session expiry. The
// client's session is only replaced once both calls succeed.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, info};

use crate::client::MotivClient;
use crate::error::Error;
use crate::models::{LoginResponse, SessionInfo};
use crate::session::Session;

pub(crate) const LOGIN_PATH: &str = "/parse/login";
pub(crate) const SESSION_PATH: &str = "/parse/sessions/me";

impl MotivClient {
    /// Log in with the vendor account credentials.
    ///
    /// On success the new session is stored in the client and returned.
    /// A rejected login (any non-200 status) or a failed login request
    /// yields [`Error::Authentication`] with the vendor's code and message;
    /// in every failure case the previous session is left untouched.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Arc<Session>, Error> {
        debug!(username, "logging in");

        let body = json!({
            "_method": "GET",
            "username": username,
            "password": password.expose_secret(),
        });

        let login: LoginResponse = self
            .post(LOGIN_PATH, &body, None)
            .await
            .map_err(into_auth_failure)?;

        let token = SecretString::from(login.session_token);
        let info: SessionInfo = self.get(SESSION_PATH, Some(&token)).await?;

        let session = Arc::new(Session::new(login.object_id, token, info.expires_at.iso));
        self.store_session(Arc::clone(&session));

        info!(
            user_id = session.user_id(),
            expires_at = %session.expires_at(),
            "authenticated"
        );
        Ok(session)
    }
}

fn into_auth_failure(err: Error) -> Error {
    match err {
        Error::Api { code, message, .. } => Error::Authentication { code, message },
        Error::Transport(e) => Error::Authentication {
            code: None,
            message: e.to_string(),
        },
        other => other,
    }
}
