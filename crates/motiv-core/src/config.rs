// ── Runtime bridge configuration ──
//
// These types describe *what* the bridge talks to and how often. They
// carry the persisted session but never touch disk: the CLI loads the
// config file and hands a `BridgeConfig` in.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, Utc};
use secrecy::SecretString;
use url::Url;

use motiv_api::Session;
use motiv_api::transport::DEFAULT_API_URL;

/// Default poll period.
pub const DEFAULT_SYNC_SECS: u64 = 120;

/// A persisted vendor session, as written by `motiv login`.
#[derive(Debug, Clone)]
pub struct AccountConfig {
    pub user_id: String,
    pub session_token: SecretString,
    pub session_expiry: DateTime<Utc>,
}

impl AccountConfig {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.session_expiry < now
    }

    pub fn to_session(&self) -> Session {
        Session::new(
            self.user_id.clone(),
            self.session_token.clone(),
            self.session_expiry,
        )
    }
}

/// Configuration for one bridge instance.
///
/// Built by the CLI, passed to [`Platform`](crate::Platform) -- core
/// never reads config files.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Vendor API root.
    pub api_url: Url,
    /// Persisted session. `None` means `motiv login` has never run.
    pub account: Option<AccountConfig>,
    /// Poll period for every live sensor.
    pub sync_interval: Duration,
    /// Request timeout.
    pub timeout: Duration,
    /// Offset used to interpret the vendor's wall-clock timestamps.
    pub utc_offset: FixedOffset,
}

impl BridgeConfig {
    /// Period of the poll task. A zero interval means the default.
    pub fn poll_period(&self) -> Duration {
        if self.sync_interval.is_zero() {
            Duration::from_secs(DEFAULT_SYNC_SECS)
        } else {
            self.sync_interval
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            account: None,
            sync_interval: Duration::from_secs(DEFAULT_SYNC_SECS),
            timeout: Duration::from_secs(30),
            utc_offset: *Local::now().offset(),
        }
    }
}

pub fn default_api_url() -> Url {
    match Url::parse(DEFAULT_API_URL) {
        Ok(url) => url,
        Err(e) => unreachable!("DEFAULT_API_URL is a valid URL: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_polls_at_default_period() {
        let config = BridgeConfig {
            sync_interval: Duration::ZERO,
            ..BridgeConfig::default()
        };
        assert_eq!(config.poll_period(), Duration::from_secs(DEFAULT_SYNC_SECS));
    }

    #[test]
    fn explicit_interval_is_kept() {
        let config = BridgeConfig {
            sync_interval: Duration::from_secs(30),
            ..BridgeConfig::default()
        };
        assert_eq!(config.poll_period(), Duration::from_secs(30));
    }
}
