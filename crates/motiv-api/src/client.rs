// Vendor API HTTP client
//
// Wraps `reqwest::Client` with vendor URL construction, session-token
// injection and response/error decoding. Auth and record queries are
// implemented as inherent methods in separate files to keep this module
// focused on transport mechanics and session ownership.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, FixedOffset, Local, Utc};
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{ErrorBody, HeartRateRecord, SleepEvent, UserProfile};
use crate::session::Session;
use crate::transport::{SESSION_TOKEN_HEADER, TransportConfig};

/// Session-owning client for the vendor API.
///
/// Holds at most one [`Session`], swapped atomically on successful
/// authentication. Every record query checks the session first and fails
/// with [`Error::AuthRequired`] without touching the network when it is
/// missing or expired. The most recently fetched record of each kind is
/// kept as a convenience, never as a source of truth.
pub struct MotivClient {
    http: reqwest::Client,
    base_url: Url,
    utc_offset: FixedOffset,
    session: ArcSwapOption<Session>,
    pub(crate) last_sleep_event: ArcSwapOption<SleepEvent>,
    pub(crate) last_heart_rate: ArcSwapOption<HeartRateRecord>,
    pub(crate) profile: ArcSwapOption<UserProfile>,
}

impl MotivClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the vendor root (see
    /// [`DEFAULT_API_URL`](crate::transport::DEFAULT_API_URL)). `session`
    /// is a previously persisted session, if any.
    pub fn new(
        base_url: Url,
        transport: &TransportConfig,
        session: Option<Session>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, session))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// The caller is responsible for the vendor default headers.
    pub fn with_client(http: reqwest::Client, base_url: Url, session: Option<Session>) -> Self {
        Self {
            http,
            base_url,
            utc_offset: *Local::now().offset(),
            session: ArcSwapOption::new(session.map(Arc::new)),
            last_sleep_event: ArcSwapOption::empty(),
            last_heart_rate: ArcSwapOption::empty(),
            profile: ArcSwapOption::empty(),
        }
    }

    /// Override the UTC offset used to interpret the vendor's local-naive
    /// timestamps. Defaults to the machine's current local offset.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    // ── Session state ────────────────────────────────────────────────

    /// The current session, valid or not.
    pub fn session(&self) -> Option<Arc<Session>> {
        self.session.load_full()
    }

    pub(crate) fn store_session(&self, session: Arc<Session>) {
        self.session.store(Some(session));
    }

    /// `true` whenever the session is absent, incomplete or expired.
    /// Recomputed against the wall clock on every call.
    pub fn needs_auth(&self) -> bool {
        self.needs_auth_at(Utc::now())
    }

    pub fn needs_auth_at(&self, now: DateTime<Utc>) -> bool {
        self.session
            .load()
            .as_ref()
            .is_none_or(|session| !session.is_valid_at(now))
    }

    /// Return the session if it is usable right now.
    pub(crate) fn require_session(&self) -> Result<Arc<Session>, Error> {
        match self.session.load_full() {
            Some(session) if session.is_valid() => Ok(session),
            _ => Err(Error::AuthRequired),
        }
    }

    // ── Last-fetched conveniences ────────────────────────────────────

    pub fn last_sleep_event(&self) -> Option<Arc<SleepEvent>> {
        self.last_sleep_event.load_full()
    }

    pub fn last_heart_rate_record(&self) -> Option<Arc<HeartRateRecord>> {
        self.last_heart_rate.load_full()
    }

    pub fn profile(&self) -> Option<Arc<UserProfile>> {
        self.profile.load_full()
    }

    // ── URL builders ─────────────────────────────────────────────────

    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&SecretString>,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {}", url);

        let mut request = self.http.get(url);
        if let Some(token) = token {
            request = request.header(SESSION_TOKEN_HEADER, token_header(token)?);
        }

        let resp = request.send().await.map_err(Error::Transport)?;
        parse_response(resp).await
    }

    /// Send a POST request with JSON body and decode the JSON response.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
        token: Option<&SecretString>,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {}", url);

        let mut request = self.http.post(url).json(body);
        if let Some(token) = token {
            request = request.header(SESSION_TOKEN_HEADER, token_header(token)?);
        }

        let resp = request.send().await.map_err(Error::Transport)?;
        parse_response(resp).await
    }
}

fn token_header(token: &SecretString) -> Result<HeaderValue, Error> {
    let mut value =
        HeaderValue::from_str(token.expose_secret()).map_err(|_| Error::InvalidHeader {
            name: SESSION_TOKEN_HEADER,
        })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Decode a 200 body into `T`, or turn any other status into
/// [`Error::Api`] carrying the vendor's `{code, error}` fields.
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    let body = resp.text().await.map_err(Error::Transport)?;

    if status != reqwest::StatusCode::OK {
        let parsed: Option<ErrorBody> = serde_json::from_str(&body).ok();
        let (code, message) = match parsed {
            Some(ErrorBody { code, error }) => (code, error.unwrap_or_else(|| body.clone())),
            None => (None, body.clone()),
        };
        return Err(Error::Api {
            status: status.as_u16(),
            code,
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}
