//! Bridge engine between `motiv-api` and a home-automation host.
//!
//! - **[`Platform`]**: orchestrator. Restores cached accessories via
//!   [`configure_accessory()`](Platform::configure_accessory), validates the
//!   account on [`did_finish_launching()`](Platform::did_finish_launching),
//!   then owns the periodic poll task.
//!
//! - **[`AccessoryRegistry`]**: single owner of the UUID → accessory map.
//!   Decides create vs. reuse vs. reject and keeps the host's registrations
//!   in step.
//!
//! - **[`Sensor`]**: closed set of sensor kinds. Each sensor polls the
//!   vendor client, derives its state and pushes edge-triggered updates into
//!   its host accessory. Host reads are answered from memory.
//!
//! - **Host seam** ([`host`]): the [`Host`] and [`Accessory`] traits the
//!   engine calls into, plus in-memory implementations.

pub mod config;
pub mod error;
pub mod host;
pub mod identity;
pub mod platform;
pub mod registry;
pub mod sensor;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AccountConfig, BridgeConfig};
pub use error::CoreError;
pub use host::{
    Accessory, AccessoryHandle, AccessoryInformation, AccessorySnapshot, Host, HostError,
    MemoryAccessory, MemoryHost,
};
pub use identity::AccessoryIdentity;
pub use platform::{Platform, PlatformState, RejectReason};
pub use registry::{AccessoryRecord, AccessoryRegistry};
pub use sensor::{Sensor, SensorKind, SensorLifecycle};

pub use motiv_api::MotivClient;
