//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use motiv_config::ConfigError;
use motiv_core::{CoreError, RejectReason};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed!\n\t{code}: {message}")]
    #[diagnostic(
        code(motiv::auth_failed),
        help("Check the e-mail and password of your MyMotiv account.")
    )]
    AuthFailed { code: String, message: String },

    #[error("No Motiv session configured")]
    #[diagnostic(
        code(motiv::no_account),
        help(
            "Run: motiv login <email>\n\
             Config file: {path}"
        )
    )]
    NoAccount { path: String },

    #[error("The Motiv session is missing or expired")]
    #[diagnostic(code(motiv::auth_required), help("Run: motiv login <email>"))]
    AuthRequired,

    #[error("Bridge refused to start: {reason}")]
    #[diagnostic(code(motiv::rejected))]
    Rejected { reason: RejectReason },

    // ── Vendor ───────────────────────────────────────────────────────
    #[error("Could not reach the Motiv API: {message}")]
    #[diagnostic(
        code(motiv::connection_failed),
        help("Check your network connection, or `api_url` in the config file.")
    )]
    ConnectionFailed { message: String },

    #[error("API error ({code}): {message}")]
    #[diagnostic(code(motiv::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(motiv::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("{source}")]
    #[diagnostic(code(motiv::config), help("Config file: {path}"))]
    Config {
        #[source]
        source: ConfigError,
        path: String,
    },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(motiv::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(motiv::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed { .. }
            | Self::NoAccount { .. }
            | Self::AuthRequired
            | Self::Rejected { .. } => exit_code::AUTH,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Validation { .. } | Self::Config { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the config file path to a `ConfigError`.
    pub fn config(source: ConfigError, path: &std::path::Path) -> Self {
        Self::Config {
            source,
            path: path.display().to_string(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthRequired => CliError::AuthRequired,

            CoreError::AuthenticationFailed { code, message } => CliError::AuthFailed {
                code: code.map_or_else(|| "error".into(), |c| c.to_string()),
                message,
            },

            CoreError::Transport { message } => CliError::ConnectionFailed { message },

            CoreError::Api { message, code, status } => CliError::ApiError {
                code: code
                    .map(|c| c.to_string())
                    .or_else(|| status.map(|s| format!("HTTP {s}")))
                    .unwrap_or_else(|| "unknown".into()),
                message,
            },

            CoreError::UnrecognizedAccessoryType { kind } => CliError::Validation {
                field: "accessory type".into(),
                reason: format!("no Motiv accessory for type \"{kind}\""),
            },

            CoreError::Host(e) => CliError::ApiError {
                code: "host".into(),
                message: e.to_string(),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

impl From<motiv_api::Error> for CliError {
    fn from(err: motiv_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_failure_shows_code_and_message() {
        let err = CliError::from(CoreError::AuthenticationFailed {
            code: Some(101),
            message: "Invalid username/password.".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
        assert!(err.to_string().contains("101: Invalid username/password."));
    }

    #[test]
    fn transport_maps_to_connection_exit_code() {
        let err = CliError::from(CoreError::Transport {
            message: "timed out".into(),
        });
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
    }
}
