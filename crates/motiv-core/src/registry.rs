// ── Accessory registry ──
//
// Single owner of the host-UUID → accessory map. Every create, restore
// and removal goes through here so the map and the host's registrations
// never drift apart.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use motiv_api::MotivClient;

use crate::error::CoreError;
use crate::host::{AccessoryHandle, Host};
use crate::identity::AccessoryIdentity;
use crate::sensor::{Sensor, SensorKind};

/// One bridged accessory.
#[derive(Clone)]
pub struct AccessoryRecord {
    pub identity: AccessoryIdentity,
    pub accessory: AccessoryHandle,
    pub sensor: Arc<Sensor>,
}

/// Maps host UUIDs to live sensors.
pub struct AccessoryRegistry {
    host: Arc<dyn Host>,
    client: Arc<MotivClient>,
    user_id: Option<String>,
    records: DashMap<Uuid, AccessoryRecord>,
}

impl AccessoryRegistry {
    /// `user_id` is the configured account, if any. It seeds the identity
    /// of every accessory the registry creates.
    pub fn new(host: Arc<dyn Host>, client: Arc<MotivClient>, user_id: Option<String>) -> Self {
        Self {
            host,
            client,
            user_id,
            records: DashMap::new(),
        }
    }

    /// Re-attach a cached accessory handed back by the host.
    ///
    /// A missing type tag means `awake`. An unknown tag gets the accessory
    /// unregistered and dropped.
    pub fn restore(&self, accessory: AccessoryHandle) -> Result<(), CoreError> {
        let uuid = accessory.uuid();
        if self.records.contains_key(&uuid) {
            debug!(%uuid, "accessory already restored");
            return Ok(());
        }

        let tag = accessory
            .context_type()
            .unwrap_or_else(|| SensorKind::default().to_string());

        let kind = match SensorKind::from_tag(&tag) {
            Ok(kind) => kind,
            Err(e) => {
                warn!(%uuid, kind = %tag, "removing accessory of unknown type");
                self.remove(Some(&accessory))?;
                return Err(e);
            }
        };

        let identity = AccessoryIdentity::new(self.user_id.clone().unwrap_or_default(), kind);
        let sensor = Sensor::attach(
            identity.clone(),
            Arc::clone(&self.client),
            Arc::clone(&accessory),
        );

        debug!(%uuid, sensor = %identity, "restored cached accessory");
        self.records.insert(
            uuid,
            AccessoryRecord {
                identity,
                accessory,
                sensor: Arc::new(sensor),
            },
        );
        Ok(())
    }

    /// Make sure an accessory of the given type exists for the configured
    /// account, creating and registering it if needed. Idempotent.
    pub fn ensure(&self, tag: &str) -> Result<Uuid, CoreError> {
        let kind = SensorKind::from_tag(tag)?;
        let user_id = self.user_id.as_deref().ok_or(CoreError::AuthRequired)?;
        let identity = AccessoryIdentity::new(user_id, kind);
        let uuid = identity.uuid();

        match self.records.entry(uuid) {
            Entry::Occupied(_) => {
                debug!(%uuid, sensor = %identity, "accessory already present");
            }
            Entry::Vacant(slot) => {
                let sensor =
                    Sensor::create(identity.clone(), Arc::clone(&self.client), self.host.as_ref());
                let accessory = Arc::clone(sensor.accessory());
                self.host
                    .register_platform_accessories(&[Arc::clone(&accessory)])?;

                info!(%uuid, sensor = %identity, "registered new accessory");
                slot.insert(AccessoryRecord {
                    identity,
                    accessory,
                    sensor: Arc::new(sensor),
                });
            }
        }
        Ok(uuid)
    }

    /// Unregister an accessory from the host and forget it. `None` is a
    /// no-op.
    pub fn remove(&self, accessory: Option<&AccessoryHandle>) -> Result<(), CoreError> {
        let Some(accessory) = accessory else {
            return Ok(());
        };

        self.records.remove(&accessory.uuid());
        self.host
            .unregister_platform_accessories(&[Arc::clone(accessory)])?;
        info!(uuid = %accessory.uuid(), "unregistered accessory");
        Ok(())
    }

    /// Run `f` on every live sensor, one after another. Sensors that never
    /// attached are logged and skipped. Returns how many ran.
    pub async fn for_each_live<F, Fut>(&self, mut f: F) -> usize
    where
        F: FnMut(Arc<Sensor>) -> Fut,
        Fut: Future<Output = ()>,
    {
        let sensors: Vec<Arc<Sensor>> = self
            .records
            .iter()
            .map(|record| Arc::clone(&record.sensor))
            .collect();

        let mut ran = 0;
        for sensor in sensors {
            if sensor.is_updatable() {
                f(sensor).await;
                ran += 1;
            } else {
                error!(
                    accessory = %sensor.accessory().display_name(),
                    "device is not updatable, skipping"
                );
            }
        }
        ran
    }

    pub fn get(&self, uuid: &Uuid) -> Option<AccessoryRecord> {
        self.records.get(uuid).map(|record| record.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
