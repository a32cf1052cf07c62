use std::fmt;

use uuid::Uuid;

use crate::sensor::SensorKind;

/// Stable identity of one bridged sensor: the vendor user it reports on
/// and the kind of sensor.
///
/// The UUID is a pure function of both, so the same account and kind map
/// to the same host accessory across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessoryIdentity {
    pub user_id: String,
    pub kind: SensorKind,
}

impl AccessoryIdentity {
    pub fn new(user_id: impl Into<String>, kind: SensorKind) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
        }
    }

    /// The seed hashed into the accessory UUID.
    pub fn seed(&self) -> String {
        format!("Motiv_{}_{}", self.user_id, self.kind)
    }

    pub fn uuid(&self) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, self.seed().as_bytes())
    }

    /// Serial number shown in the accessory information service.
    pub fn serial_number(&self) -> String {
        format!("{}-{}", self.kind, self.user_id)
    }
}

impl fmt::Display for AccessoryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.user_id)
    }
}
