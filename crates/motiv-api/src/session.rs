// Vendor session state
//
// A session is the triple (user id, session token, expiry). It is only
// ever replaced as a whole; validity is recomputed against the clock on
// every check so an expired session is never reported as usable.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

/// An authenticated vendor session.
#[derive(Debug, Clone)]
pub struct Session {
    user_id: String,
    token: SecretString,
    expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, token: SecretString, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            token,
            expires_at,
        }
    }

    /// The vendor `_User` object id this session belongs to.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// `true` iff every field is present and the expiry lies strictly
    /// after `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.user_id.is_empty() && !self.token.expose_secret().is_empty() && now < self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}
