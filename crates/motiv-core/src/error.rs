// ── Core error types ──
//
// Bridge-level errors from motiv-core. Consumers never see HTTP status
// codes or JSON parse failures directly; the `From<motiv_api::Error>`
// impl translates them into the bridge taxonomy.

use thiserror::Error;

use crate::host::HostError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication required -- run `motiv login <email>`")]
    AuthRequired,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { code: Option<i64>, message: String },

    // ── Vendor / transport ───────────────────────────────────────────
    #[error("Vendor request failed: {message}")]
    Transport { message: String },

    #[error("Vendor API error: {message}")]
    Api {
        message: String,
        /// The vendor error code (Parse numeric code).
        code: Option<i64>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Accessories ──────────────────────────────────────────────────
    #[error("No Motiv accessory for type \"{kind}\"")]
    UnrecognizedAccessoryType { kind: String },

    #[error(transparent)]
    Host(#[from] HostError),

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<motiv_api::Error> for CoreError {
    fn from(err: motiv_api::Error) -> Self {
        match err {
            motiv_api::Error::AuthRequired => CoreError::AuthRequired,
            motiv_api::Error::Authentication { code, message } => {
                CoreError::AuthenticationFailed { code, message }
            }
            motiv_api::Error::Transport(e) => CoreError::Transport {
                message: e.to_string(),
            },
            motiv_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            motiv_api::Error::InvalidHeader { name } => CoreError::Config {
                message: format!("Invalid value for header {name}"),
            },
            motiv_api::Error::Api {
                status,
                code,
                message,
            } => CoreError::Api {
                message,
                code,
                status: Some(status),
            },
            motiv_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Malformed vendor payload: {message}"),
                code: None,
                status: None,
            },
            motiv_api::Error::TimestampOutOfRange { seconds } => CoreError::Api {
                message: format!("Vendor timestamp out of range: {seconds}"),
                code: None,
                status: None,
            },
        }
    }
}
