//! Configuration for the Motiv bridge.
//!
//! TOML config file, `MOTIV_`-prefixed environment overrides, platform
//! paths, and translation to `motiv_core::BridgeConfig`. The CLI owns the
//! only writer (`motiv login`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, SecondsFormat, Utc};
use directories::ProjectDirs;
use figment::{
    Figment, Profile, Provider,
    providers::{Env, Format, Serialized, Toml},
    value::Dict,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use motiv_api::Session;
use motiv_api::transport::DEFAULT_API_URL;
use motiv_core::config::DEFAULT_SYNC_SECS;
use motiv_core::{AccountConfig, BridgeConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Persisted vendor session, written by `motiv login`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,

    /// Seconds between sensor polls. `0` means the default.
    #[serde(default = "default_sync_seconds", alias = "syncSeconds")]
    pub sync_seconds: u64,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Offset of the wearer's clock from UTC, in minutes. Defaults to the
    /// machine's local offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,

    /// Vendor API root.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Accessory cache used by `motiv run`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account: None,
            sync_seconds: default_sync_seconds(),
            timeout: default_timeout(),
            utc_offset_minutes: None,
            api_url: default_api_url(),
            cache_path: None,
        }
    }
}

fn default_sync_seconds() -> u64 {
    DEFAULT_SYNC_SECS
}
fn default_timeout() -> u64 {
    30
}
fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

/// A persisted vendor session.
///
/// Accepts the camelCase keys of the host platform's config block as
/// well.
#[derive(Clone, Deserialize, Serialize)]
pub struct Account {
    #[serde(alias = "userId")]
    pub user_id: String,

    #[serde(alias = "sessionToken")]
    pub session_token: String,

    /// ISO-8601 timestamp.
    #[serde(alias = "sessionExpiry")]
    pub session_expiry: String,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("user_id", &self.user_id)
            .field("session_token", &"[redacted]")
            .field("session_expiry", &self.session_expiry)
            .finish()
    }
}

impl Account {
    /// Capture a freshly authenticated session.
    pub fn from_session(session: &Session) -> Self {
        Self {
            user_id: session.user_id().to_owned(),
            session_token: session.token().expose_secret().to_owned(),
            session_expiry: session
                .expires_at()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn expiry(&self) -> Result<DateTime<Utc>, ConfigError> {
        DateTime::parse_from_rfc3339(&self.session_expiry)
            .map(|expiry| expiry.with_timezone(&Utc))
            .map_err(|e| ConfigError::Validation {
                field: "account.session_expiry".into(),
                reason: format!("'{}' is not an ISO-8601 timestamp: {e}", self.session_expiry),
            })
    }

    pub fn to_account_config(&self) -> Result<AccountConfig, ConfigError> {
        Ok(AccountConfig {
            user_id: self.user_id.clone(),
            session_token: SecretString::from(self.session_token.clone()),
            session_expiry: self.expiry()?,
        })
    }
}

impl Config {
    /// The UTC offset vendor timestamps are read in.
    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        match self.utc_offset_minutes {
            None => Ok(*Local::now().offset()),
            Some(minutes) => minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| ConfigError::Validation {
                    field: "utc_offset_minutes".into(),
                    reason: format!("{minutes} is outside ±24h"),
                }),
        }
    }

    /// The accessory cache file, explicit or platform default.
    pub fn cache_path(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(default_cache_path)
    }

    /// Translate into the runtime configuration the bridge engine takes.
    /// Effective poll period in seconds.
    pub fn sync_seconds(&self) -> u64 {
        if self.sync_seconds == 0 {
            DEFAULT_SYNC_SECS
        } else {
            self.sync_seconds
        }
    }

    pub fn to_bridge_config(&self) -> Result<BridgeConfig, ConfigError> {
        let api_url: url::Url = self.api_url.parse().map_err(|_| ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("invalid URL: {}", self.api_url),
        })?;

        let account = self
            .account
            .as_ref()
            .map(Account::to_account_config)
            .transpose()?;

        Ok(BridgeConfig {
            api_url,
            account,
            sync_interval: Duration::from_secs(self.sync_seconds()),
            timeout: Duration::from_secs(self.timeout),
            utc_offset: self.utc_offset()?,
        })
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "motiv", "motiv")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default location of the accessory cache.
pub fn default_cache_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".local/share").join("accessories.json"),
        |dirs| dirs.data_dir().join("accessories.json"),
    )
}

fn dirs_fallback(base: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(base);
    p.push("motiv");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment. A missing file yields the
/// defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Serialized::defaults(file_values(path)?))
        .merge(Env::prefixed("MOTIV_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Top-level keys of the config file, with the host platform's camelCase
/// spellings folded onto ours so they merge with defaults and env.
fn file_values(path: &Path) -> Result<Dict, ConfigError> {
    let mut values = Toml::file(path)
        .data()?
        .remove(&Profile::Default)
        .unwrap_or_default();

    if let Some(value) = values.remove("syncSeconds") {
        values.entry("sync_seconds".into()).or_insert(value);
    }
    Ok(values)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
