use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::watch;
use tracing::{debug, error, warn};

use motiv_api::MotivClient;

use super::{MANUFACTURER, SensorLifecycle};
use crate::error::CoreError;
use crate::host::{AccessoryHandle, AccessoryInformation, HostError};
use crate::identity::AccessoryIdentity;

/// Whether a wake-up at `woke` counts as "awake" at `now`: same calendar
/// day in the vendor's offset, and not in the future.
pub fn is_awake(now: DateTime<Utc>, woke: DateTime<FixedOffset>) -> bool {
    let now = now.with_timezone(woke.offset());
    now.date_naive() == woke.date_naive() && woke <= now
}

/// Occupancy sensor that reports "awake" once the wearer's last sleep
/// event ended today.
pub struct SleepSensor {
    identity: AccessoryIdentity,
    client: Arc<MotivClient>,
    accessory: AccessoryHandle,
    awake: watch::Sender<bool>,
    lifecycle: SensorLifecycle,
}

impl SleepSensor {
    pub(crate) fn new(
        identity: AccessoryIdentity,
        client: Arc<MotivClient>,
        accessory: AccessoryHandle,
    ) -> Self {
        let (awake, _) = watch::channel(false);
        let mut sensor = Self {
            identity,
            client,
            accessory,
            awake,
            lifecycle: SensorLifecycle::Uninitialized,
        };

        match sensor.decorate() {
            Ok(()) => sensor.lifecycle = SensorLifecycle::Attached,
            Err(e) => error!(sensor = %sensor.identity, error = %e, "failed to set up accessory"),
        }
        sensor
    }

    /// Name, tag and describe the accessory, make sure it carries an
    /// occupancy service and install the read handler.
    fn decorate(&self) -> Result<(), HostError> {
        let kind = self.identity.kind;
        let name = kind.display_name();

        self.accessory.set_display_name(&name);
        self.accessory.set_context_type(kind.as_ref());
        self.accessory.set_information(&AccessoryInformation {
            manufacturer: MANUFACTURER.to_owned(),
            model: format!("Motiv {kind} sensor"),
            serial_number: self.identity.serial_number(),
        })?;

        if self.accessory.has_occupancy_service() {
            self.accessory.rename_occupancy_service(&name)?;
        } else {
            self.accessory.add_occupancy_service(&name)?;
        }

        let state = self.awake.subscribe();
        self.accessory.on_get_occupancy(Arc::new(move || *state.borrow()))
    }

    pub(crate) async fn update_at(&self, now: DateTime<Utc>) {
        debug!(accessory = %self.accessory.display_name(), "updating");

        let woke = match self.client.last_awakening().await {
            Ok(woke) => woke,
            Err(e) => {
                let e = CoreError::from(e);
                error!(sensor = %self.identity, error = %e, "failed to update awake status");
                return;
            }
        };

        let awake = is_awake(now, woke);
        if self.observe(awake) {
            debug!(
                sensor = %self.identity,
                awake,
                woke = %woke,
                now = %now.with_timezone(woke.offset()),
                "awake status changed"
            );
        }
    }

    /// Record a freshly derived state. Writes the host characteristic only
    /// when the value changes; returns whether it did.
    pub(crate) fn observe(&self, awake: bool) -> bool {
        let changed = self.awake.send_if_modified(|current| {
            if *current == awake {
                false
            } else {
                *current = awake;
                true
            }
        });

        if changed {
            if let Err(e) = self.accessory.set_occupancy_detected(awake) {
                warn!(sensor = %self.identity, error = %e, "host rejected occupancy update");
            }
        }
        changed
    }

    /// Write the current state to the accessory unconditionally. No-op
    /// until the accessory is decorated.
    pub(crate) fn publish_state(&self) {
        if self.lifecycle != SensorLifecycle::Attached {
            return;
        }
        let awake = *self.awake.borrow();
        if let Err(e) = self.accessory.set_occupancy_detected(awake) {
            warn!(sensor = %self.identity, error = %e, "host rejected occupancy update");
        }
    }

    pub(crate) fn is_awake_now(&self) -> bool {
        *self.awake.borrow()
    }

    pub(crate) fn identity(&self) -> &AccessoryIdentity {
        &self.identity
    }

    pub(crate) fn accessory(&self) -> &AccessoryHandle {
        &self.accessory
    }

    pub(crate) fn lifecycle(&self) -> SensorLifecycle {
        self.lifecycle
    }
}
