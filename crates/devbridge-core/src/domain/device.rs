//! Device types reported by a device bridge.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Status reported when the bridge omits one.
pub const UNKNOWN_DEVICE_STATUS: &str = "unknown";

/// The closed set of device families a bridge can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Android,
}

impl DeviceKind {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Android => "android",
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single attached device. Recomputed on every listing, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub serial: String,
    pub status: String,
}

/// Serial to status, in the order the bridge reported them.
pub type DeviceList = IndexMap<String, String>;

/// Collect records into a listing; later duplicates overwrite earlier ones.
pub fn device_list_from(records: impl IntoIterator<Item = DeviceRecord>) -> DeviceList {
    records
        .into_iter()
        .map(|record| (record.serial, record.status))
        .collect()
}
