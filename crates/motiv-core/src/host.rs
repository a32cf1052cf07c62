// ── Host seam ──
//
// The home-automation host owns accessories, services and
// characteristics. The engine only ever talks to it through the two
// traits below. `MemoryHost` / `MemoryAccessory` are complete in-process
// implementations used by the CLI daemon and by tests.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Shared handle to a host accessory.
pub type AccessoryHandle = Arc<dyn Accessory>;

/// Read handler the host invokes for "get occupancy". Must not block.
pub type OccupancyReader = Arc<dyn Fn() -> bool + Send + Sync>;

/// A host-side failure.
#[derive(Debug, Clone, Error)]
#[error("host rejected {operation}: {message}")]
pub struct HostError {
    pub operation: &'static str,
    pub message: String,
}

impl HostError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Static identity metadata shown by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryInformation {
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
}

/// One accessory as the host models it: a display name, a free-form
/// context slot (we store the sensor type there), an information service
/// and at most one occupancy-sensor service.
pub trait Accessory: Send + Sync {
    /// Host-assigned stable UUID.
    fn uuid(&self) -> Uuid;

    fn display_name(&self) -> String;

    fn set_display_name(&self, name: &str);

    /// Logical sensor type persisted alongside the accessory.
    fn context_type(&self) -> Option<String>;

    fn set_context_type(&self, kind: &str);

    fn set_information(&self, info: &AccessoryInformation) -> Result<(), HostError>;

    fn has_occupancy_service(&self) -> bool;

    fn add_occupancy_service(&self, name: &str) -> Result<(), HostError>;

    fn rename_occupancy_service(&self, name: &str) -> Result<(), HostError>;

    /// Push a new value into the occupancy characteristic.
    fn set_occupancy_detected(&self, detected: bool) -> Result<(), HostError>;

    /// Install the handler answering host reads of the occupancy
    /// characteristic.
    fn on_get_occupancy(&self, reader: OccupancyReader) -> Result<(), HostError>;
}

/// Accessory factory and registration surface of the host.
pub trait Host: Send + Sync {
    fn create_accessory(&self, display_name: &str, uuid: Uuid) -> AccessoryHandle;

    fn register_platform_accessories(&self, accessories: &[AccessoryHandle])
    -> Result<(), HostError>;

    fn unregister_platform_accessories(
        &self,
        accessories: &[AccessoryHandle],
    ) -> Result<(), HostError>;
}

// ── In-memory implementation ────────────────────────────────────────

/// Serializable state of a [`MemoryAccessory`], used for the accessory
/// cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessorySnapshot {
    pub uuid: Uuid,
    pub display_name: String,
    #[serde(default)]
    pub context_type: Option<String>,
    #[serde(default)]
    pub information: Option<AccessoryInformation>,
    /// Name of the occupancy service, if the accessory has one.
    #[serde(default)]
    pub occupancy_service: Option<String>,
    #[serde(default)]
    pub occupancy_detected: bool,
}

impl AccessorySnapshot {
    pub fn new(display_name: impl Into<String>, uuid: Uuid) -> Self {
        Self {
            uuid,
            display_name: display_name.into(),
            context_type: None,
            information: None,
            occupancy_service: None,
            occupancy_detected: false,
        }
    }
}

/// An accessory held entirely in memory.
pub struct MemoryAccessory {
    uuid: Uuid,
    state: Mutex<AccessorySnapshot>,
    reader: Mutex<Option<OccupancyReader>>,
    writes: AtomicU64,
}

impl MemoryAccessory {
    pub fn new(display_name: &str, uuid: Uuid) -> Self {
        Self::from_snapshot(AccessorySnapshot::new(display_name, uuid))
    }

    pub fn from_snapshot(snapshot: AccessorySnapshot) -> Self {
        Self {
            uuid: snapshot.uuid,
            state: Mutex::new(snapshot),
            reader: Mutex::new(None),
            writes: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> AccessorySnapshot {
        lock(&self.state).clone()
    }

    /// Last value pushed into the occupancy characteristic.
    pub fn occupancy_detected(&self) -> bool {
        lock(&self.state).occupancy_detected
    }

    /// Number of characteristic writes received.
    pub fn occupancy_writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Simulate a host read: invoke the installed read handler.
    pub fn read_occupancy(&self) -> Option<bool> {
        let reader = lock(&self.reader).clone();
        reader.map(|read| read())
    }
}

impl Accessory for MemoryAccessory {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn display_name(&self) -> String {
        lock(&self.state).display_name.clone()
    }

    fn set_display_name(&self, name: &str) {
        name.clone_into(&mut lock(&self.state).display_name);
    }

    fn context_type(&self) -> Option<String> {
        lock(&self.state).context_type.clone()
    }

    fn set_context_type(&self, kind: &str) {
        lock(&self.state).context_type = Some(kind.to_owned());
    }

    fn set_information(&self, info: &AccessoryInformation) -> Result<(), HostError> {
        lock(&self.state).information = Some(info.clone());
        Ok(())
    }

    fn has_occupancy_service(&self) -> bool {
        lock(&self.state).occupancy_service.is_some()
    }

    fn add_occupancy_service(&self, name: &str) -> Result<(), HostError> {
        let mut state = lock(&self.state);
        if state.occupancy_service.is_some() {
            return Err(HostError::new(
                "add_occupancy_service",
                "accessory already has an occupancy service",
            ));
        }
        state.occupancy_service = Some(name.to_owned());
        Ok(())
    }

    fn rename_occupancy_service(&self, name: &str) -> Result<(), HostError> {
        match lock(&self.state).occupancy_service.as_mut() {
            Some(service) => {
                name.clone_into(service);
                Ok(())
            }
            None => Err(HostError::new(
                "rename_occupancy_service",
                "accessory has no occupancy service",
            )),
        }
    }

    fn set_occupancy_detected(&self, detected: bool) -> Result<(), HostError> {
        let mut state = lock(&self.state);
        if state.occupancy_service.is_none() {
            return Err(HostError::new(
                "set_occupancy_detected",
                "accessory has no occupancy service",
            ));
        }
        state.occupancy_detected = detected;
        self.writes.fetch_add(1, Ordering::Relaxed);
        debug!(accessory = %state.display_name, detected, "occupancy characteristic updated");
        Ok(())
    }

    fn on_get_occupancy(&self, reader: OccupancyReader) -> Result<(), HostError> {
        *lock(&self.reader) = Some(reader);
        Ok(())
    }
}

/// A host that keeps its accessories in memory and counts registration
/// calls.
#[derive(Default)]
pub struct MemoryHost {
    accessories: DashMap<Uuid, Arc<MemoryAccessory>>,
    registered: DashSet<Uuid>,
    register_calls: AtomicUsize,
    unregister_calls: AtomicUsize,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-hydrate a cached accessory. It counts as registered.
    pub fn restore(&self, snapshot: AccessorySnapshot) -> Arc<MemoryAccessory> {
        let accessory = Arc::new(MemoryAccessory::from_snapshot(snapshot));
        self.accessories
            .insert(accessory.uuid(), Arc::clone(&accessory));
        self.registered.insert(accessory.uuid());
        accessory
    }

    pub fn accessory(&self, uuid: &Uuid) -> Option<Arc<MemoryAccessory>> {
        self.accessories.get(uuid).map(|entry| Arc::clone(entry.value()))
    }

    pub fn is_registered(&self, uuid: &Uuid) -> bool {
        self.registered.contains(uuid)
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    /// Snapshots of every registered accessory, ordered by UUID.
    pub fn registered_snapshots(&self) -> Vec<AccessorySnapshot> {
        let mut snapshots: Vec<AccessorySnapshot> = self
            .registered
            .iter()
            .filter_map(|uuid| self.accessory(uuid.key()))
            .map(|accessory| accessory.snapshot())
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.uuid);
        snapshots
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::Relaxed)
    }

    pub fn unregister_calls(&self) -> usize {
        self.unregister_calls.load(Ordering::Relaxed)
    }
}

impl Host for MemoryHost {
    fn create_accessory(&self, display_name: &str, uuid: Uuid) -> AccessoryHandle {
        let accessory = Arc::new(MemoryAccessory::new(display_name, uuid));
        self.accessories.insert(uuid, Arc::clone(&accessory));
        accessory
    }

    fn register_platform_accessories(
        &self,
        accessories: &[AccessoryHandle],
    ) -> Result<(), HostError> {
        self.register_calls.fetch_add(1, Ordering::Relaxed);
        for accessory in accessories {
            self.registered.insert(accessory.uuid());
        }
        Ok(())
    }

    fn unregister_platform_accessories(
        &self,
        accessories: &[AccessoryHandle],
    ) -> Result<(), HostError> {
        self.unregister_calls.fetch_add(1, Ordering::Relaxed);
        for accessory in accessories {
            let uuid = accessory.uuid();
            self.registered.remove(&uuid);
            self.accessories.remove(&uuid);
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
