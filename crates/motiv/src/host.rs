//! File-backed accessory host used by `motiv run`.
//!
//! Keeps accessories in a [`MemoryHost`] and mirrors the registered set
//! to a JSON accessory cache, so the next start can replay them through
//! `Platform::configure_accessory`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use motiv_core::host::OccupancyReader;
use motiv_core::{
    Accessory, AccessoryHandle, AccessoryInformation, AccessorySnapshot, Host, HostError,
    MemoryAccessory, MemoryHost,
};

use crate::error::CliError;

pub struct JsonFileHost {
    inner: MemoryHost,
    path: PathBuf,
}

impl JsonFileHost {
    /// Open the cache at `path`. A missing file is an empty cache.
    pub fn open(path: &Path) -> Result<(Self, Vec<AccessoryHandle>), CliError> {
        let snapshots: Vec<AccessorySnapshot> = match std::fs::read_to_string(path) {
            Ok(body) => serde_json::from_str(&body)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let host = Self {
            inner: MemoryHost::new(),
            path: path.to_owned(),
        };
        let cached = snapshots
            .into_iter()
            .map(|snapshot| LoggedAccessory::wrap(host.inner.restore(snapshot)))
            .collect();

        debug!(path = %path.display(), "opened accessory cache");
        Ok((host, cached))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the registered accessories, including their latest state.
    pub fn flush(&self) -> Result<(), CliError> {
        self.persist().map_err(|e| CliError::Io(std::io::Error::other(e)))
    }

    fn persist(&self) -> Result<(), HostError> {
        let snapshots = self.inner.registered_snapshots();
        let body = serde_json::to_string_pretty(&snapshots)
            .map_err(|e| HostError::new("persist", e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| HostError::new("persist", e.to_string()))?;
        }
        std::fs::write(&self.path, body).map_err(|e| HostError::new("persist", e.to_string()))?;

        debug!(path = %self.path.display(), accessories = snapshots.len(), "accessory cache written");
        Ok(())
    }
}

impl Host for JsonFileHost {
    fn create_accessory(&self, display_name: &str, uuid: Uuid) -> AccessoryHandle {
        let handle = self.inner.create_accessory(display_name, uuid);
        match self.inner.accessory(&uuid) {
            Some(accessory) => LoggedAccessory::wrap(accessory),
            None => handle,
        }
    }

    fn register_platform_accessories(
        &self,
        accessories: &[AccessoryHandle],
    ) -> Result<(), HostError> {
        self.inner.register_platform_accessories(accessories)?;
        for accessory in accessories {
            info!(accessory = %accessory.display_name(), uuid = %accessory.uuid(), "accessory registered");
        }
        self.persist()
    }

    fn unregister_platform_accessories(
        &self,
        accessories: &[AccessoryHandle],
    ) -> Result<(), HostError> {
        self.inner.unregister_platform_accessories(accessories)?;
        for accessory in accessories {
            info!(accessory = %accessory.display_name(), uuid = %accessory.uuid(), "accessory removed");
        }
        self.persist()
    }
}

/// A [`MemoryAccessory`] that reports characteristic writes at `info`.
struct LoggedAccessory(Arc<MemoryAccessory>);

impl LoggedAccessory {
    fn wrap(accessory: Arc<MemoryAccessory>) -> AccessoryHandle {
        Arc::new(Self(accessory))
    }
}

impl Accessory for LoggedAccessory {
    fn uuid(&self) -> Uuid {
        self.0.uuid()
    }

    fn display_name(&self) -> String {
        self.0.display_name()
    }

    fn set_display_name(&self, name: &str) {
        self.0.set_display_name(name);
    }

    fn context_type(&self) -> Option<String> {
        self.0.context_type()
    }

    fn set_context_type(&self, kind: &str) {
        self.0.set_context_type(kind);
    }

    fn set_information(&self, info: &AccessoryInformation) -> Result<(), HostError> {
        self.0.set_information(info)
    }

    fn has_occupancy_service(&self) -> bool {
        self.0.has_occupancy_service()
    }

    fn add_occupancy_service(&self, name: &str) -> Result<(), HostError> {
        self.0.add_occupancy_service(name)
    }

    fn rename_occupancy_service(&self, name: &str) -> Result<(), HostError> {
        self.0.rename_occupancy_service(name)
    }

    fn set_occupancy_detected(&self, detected: bool) -> Result<(), HostError> {
        self.0.set_occupancy_detected(detected)?;
        info!(
            accessory = %self.0.display_name(),
            occupancy = if detected { "awake" } else { "not awake" },
            "occupancy changed"
        );
        Ok(())
    }

    fn on_get_occupancy(&self, reader: OccupancyReader) -> Result<(), HostError> {
        self.0.on_get_occupancy(reader)
    }
}
