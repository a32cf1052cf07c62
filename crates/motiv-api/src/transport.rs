// Shared transport configuration for building reqwest::Client instances.
//
// Every request to the vendor carries the same set of app-identifying
// headers; they are installed once as client default headers here so the
// request helpers only add the per-session token.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::Error;

/// Production vendor API root.
pub const DEFAULT_API_URL: &str = "https://motiv-api.prod.mymotiv.com";

/// Header carrying the session token on authenticated requests.
pub const SESSION_TOKEN_HEADER: &str = "X-Parse-Session-Token";

const USER_AGENT: &str = "Motiv/842 CFNetwork/975.0.3 Darwin/18.2.0";

/// Fixed headers identifying the client application to the vendor.
/// Names are lowercase because `HeaderName::from_static` rejects uppercase.
const VENDOR_HEADERS: &[(&str, &str)] = &[
    ("x-parse-app-build-version", "842"),
    ("x-parse-client-version", "i1.14.2"),
    ("x-parse-os-version", "12.1 (16B92)"),
    ("x-parse-app-display-version", "2.0.5"),
    ("x-parse-client-key", "fnirzSAp2gR77hL2cshFVc8fyBYDiNVhevlqDeMn"),
    ("x-parse-application-id", "hef3dbRS8HehUp8Tod7MAEdItZIt2qkZH8rZ5MJ4"),
    ("x-parse-installation-id", "11ec7737-0d33-43e7-80da-8a7716cc8dbb"),
];

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` with the vendor headers installed as defaults.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .default_headers(vendor_headers())
            .build()
            .map_err(Error::Transport)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The fixed vendor header set.
pub fn vendor_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(VENDOR_HEADERS.len());
    for &(name, value) in VENDOR_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}
