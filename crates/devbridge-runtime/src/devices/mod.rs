//! Device bridges.
//!
//! [`DeviceBridge`] is the capability every device family provides; the
//! closed [`DeviceKind`] enum selects one through [`DeviceHub`].

mod android;

use async_trait::async_trait;
use devbridge_core::{DeviceKind, DeviceList};

pub use android::{AndroidBridge, InvokeOptions, command_args, fix_device_path, parse_device_list};

use crate::toolchain::{ToolchainError, ToolchainProvisioner};

/// Common operations of a device family.
#[async_trait]
pub trait DeviceBridge: Send + Sync {
    fn kind(&self) -> DeviceKind;

    /// Attached devices, serial to status.
    async fn devices(&self, options: &InvokeOptions) -> Result<DeviceList, ToolchainError>;
}

/// Owns one bridge per [`DeviceKind`].
#[derive(Debug, Clone)]
pub struct DeviceHub {
    android: AndroidBridge,
}

impl DeviceHub {
    pub const fn new(provisioner: ToolchainProvisioner) -> Self {
        Self {
            android: AndroidBridge::new(provisioner),
        }
    }

    pub fn bridge(&self, kind: DeviceKind) -> &dyn DeviceBridge {
        match kind {
            DeviceKind::Android => &self.android,
        }
    }

    pub const fn android(&self) -> &AndroidBridge {
        &self.android
    }

    pub async fn list_devices(
        &self,
        kind: DeviceKind,
        options: &InvokeOptions,
    ) -> Result<DeviceList, ToolchainError> {
        self.bridge(kind).devices(options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_selects_bridge_by_kind() {
        let hub = DeviceHub::new(ToolchainProvisioner::new());
        assert_eq!(hub.bridge(DeviceKind::Android).kind(), DeviceKind::Android);
    }
}
