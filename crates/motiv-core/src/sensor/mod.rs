// ── Sensors ──
//
// The closed set of sensor kinds the bridge can expose. Each variant of
// `Sensor` owns its host accessory and its last derived state; callers
// only ever see the shared capability set below.

mod sleep;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use strum::{AsRefStr, Display, EnumString};

use motiv_api::MotivClient;

use crate::error::CoreError;
use crate::host::{AccessoryHandle, Host};
use crate::identity::AccessoryIdentity;

pub use sleep::{SleepSensor, is_awake};

/// Manufacturer string shown in every accessory's information service.
pub const MANUFACTURER: &str = "Motiv Bridge Sensors";

/// Logical sensor type tag, persisted in the accessory context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SensorKind {
    /// Occupancy "is awake" signal derived from the last sleep event.
    #[default]
    Awake,
}

impl SensorKind {
    /// Parse a stored or requested type tag.
    pub fn from_tag(tag: &str) -> Result<Self, CoreError> {
        tag.parse().map_err(|_| CoreError::UnrecognizedAccessoryType {
            kind: tag.to_owned(),
        })
    }

    /// Human-facing accessory name (`awake` → `Awake`).
    pub fn display_name(self) -> String {
        title_case(self.as_ref())
    }
}

/// Where a sensor is in its attach lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorLifecycle {
    /// Decoration of the host accessory failed. The sensor is never polled.
    Uninitialized,
    Attached,
}

/// A live sensor bound to one host accessory.
pub enum Sensor {
    Sleep(SleepSensor),
}

impl Sensor {
    /// Re-attach to an accessory restored from the host cache.
    ///
    /// The cached characteristic may hold a stale value, so the sensor's
    /// initial state is written once.
    pub fn attach(
        identity: AccessoryIdentity,
        client: Arc<MotivClient>,
        accessory: AccessoryHandle,
    ) -> Self {
        let sensor = Self::bind(identity, client, accessory);
        match &sensor {
            Self::Sleep(inner) => inner.publish_state(),
        }
        sensor
    }

    /// Build a fresh accessory through the host and attach to it.
    ///
    /// The accessory is not registered; that is the registry's job.
    pub fn create(identity: AccessoryIdentity, client: Arc<MotivClient>, host: &dyn Host) -> Self {
        let accessory = host.create_accessory(&identity.kind.display_name(), identity.uuid());
        Self::bind(identity, client, accessory)
    }

    fn bind(
        identity: AccessoryIdentity,
        client: Arc<MotivClient>,
        accessory: AccessoryHandle,
    ) -> Self {
        match identity.kind {
            SensorKind::Awake => Self::Sleep(SleepSensor::new(identity, client, accessory)),
        }
    }

    /// Poll the vendor and push the derived state if it changed.
    pub async fn update(&self) {
        self.update_at(Utc::now()).await;
    }

    /// [`update()`](Self::update) against an explicit clock.
    pub async fn update_at(&self, now: DateTime<Utc>) {
        match self {
            Self::Sleep(sensor) => sensor.update_at(now).await,
        }
    }

    /// Last derived state, as served to host reads.
    pub fn current_state(&self) -> bool {
        match self {
            Self::Sleep(sensor) => sensor.is_awake_now(),
        }
    }

    pub fn identity(&self) -> &AccessoryIdentity {
        match self {
            Self::Sleep(sensor) => sensor.identity(),
        }
    }

    pub fn accessory(&self) -> &AccessoryHandle {
        match self {
            Self::Sleep(sensor) => sensor.accessory(),
        }
    }

    pub fn lifecycle(&self) -> SensorLifecycle {
        match self {
            Self::Sleep(sensor) => sensor.lifecycle(),
        }
    }

    pub fn is_updatable(&self) -> bool {
        self.lifecycle() == SensorLifecycle::Attached
    }
}

/// Upper-case the first letter of every space-separated word and
/// lower-case the rest. Values shorter than two characters pass through.
pub fn title_case(s: &str) -> String {
    if s.chars().nth(1).is_none() {
        return s.to_owned();
    }
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use url::Url;
    use uuid::Uuid;

    use super::*;
    use crate::host::{AccessorySnapshot, MemoryAccessory, MemoryHost};

    fn offline_client() -> Arc<MotivClient> {
        let url = Url::parse("http://127.0.0.1:9").unwrap();
        Arc::new(MotivClient::with_client(reqwest::Client::new(), url, None))
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!(SensorKind::from_tag("awake").unwrap(), SensorKind::Awake);
        assert_eq!(SensorKind::from_tag("AWAKE").unwrap(), SensorKind::Awake);
        assert_eq!(SensorKind::Awake.to_string(), "awake");
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = SensorKind::from_tag("asleep").unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnrecognizedAccessoryType { ref kind } if kind == "asleep"
        ));
    }

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("awake"), "Awake");
        assert_eq!(title_case("the dOG ran"), "The Dog Ran");
        assert_eq!(title_case("a"), "a");
        assert_eq!(title_case(""), "");
        assert_eq!(SensorKind::Awake.display_name(), "Awake");
    }

    #[test]
    fn attach_overwrites_stale_cached_occupancy() {
        let mut snapshot = AccessorySnapshot::new("Awake", Uuid::from_u128(5));
        snapshot.occupancy_service = Some("Awake".into());
        snapshot.occupancy_detected = true;
        let accessory = Arc::new(MemoryAccessory::from_snapshot(snapshot));

        let handle: AccessoryHandle = Arc::<MemoryAccessory>::clone(&accessory);
        let identity = AccessoryIdentity::new("user-1", SensorKind::Awake);
        let sensor = Sensor::attach(identity, offline_client(), handle);

        assert!(!sensor.current_state());
        assert!(!accessory.occupancy_detected());
        assert_eq!(accessory.occupancy_writes(), 1);
    }

    #[test]
    fn create_does_not_write_initial_state() {
        let host = MemoryHost::new();
        let identity = AccessoryIdentity::new("user-1", SensorKind::Awake);
        let sensor = Sensor::create(identity.clone(), offline_client(), &host);

        assert!(sensor.is_updatable());
        let accessory = host.accessory(&identity.uuid()).unwrap();
        assert_eq!(accessory.occupancy_writes(), 0);
    }
}
