use thiserror::Error;

/// Top-level error type for the `motiv-api` crate.
///
/// Covers every failure mode of the vendor client: the auth guard,
/// rejected logins, transport, non-200 responses and payload decoding.
/// `motiv-core` maps these into bridge-level diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// No valid session (missing, incomplete, or expired). Raised before
    /// any network call is made.
    #[error("Authentication required")]
    AuthRequired,

    /// The vendor rejected the login (or the login request never arrived).
    #[error("Authentication failed: {message}")]
    Authentication { code: Option<i64>, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Header value could not be encoded (e.g. a session token with
    /// non-visible ASCII).
    #[error("Invalid header value for {name}")]
    InvalidHeader { name: &'static str },

    // ── Vendor API ──────────────────────────────────────────────────
    /// Non-200 response, parsed from the Parse `{code, error}` body.
    #[error("Vendor API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A vendor timestamp could not be represented.
    #[error("Timestamp out of range: {seconds}")]
    TimestampOutOfRange { seconds: i64 },
}

impl Error {
    /// Extract the vendor error code, if available.
    pub fn api_error_code(&self) -> Option<i64> {
        match self {
            Self::Authentication { code, .. } | Self::Api { code, .. } => *code,
            _ => None,
        }
    }
}
