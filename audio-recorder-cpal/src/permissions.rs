//! Record permission as seen through cpal.
//!
//! Desktop hosts have no portable consent API. An input device that the
//! host will hand out is treated as permission to record; when the OS
//! privacy settings block the microphone the device is typically missing
//! or fails to open at start.

use audio_recorder_core::traits::permission::PermissionOracle;

use crate::devices::find_input_device;

/// Grants permission while the configured input device is present.
#[derive(Debug, Clone, Default)]
pub struct CpalPermission {
    device_name: Option<String>,
}

impl CpalPermission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }
}

impl PermissionOracle for CpalPermission {
    fn has_record_permission(&self) -> bool {
        match find_input_device(self.device_name.as_deref()) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("no usable input device: {}", e);
                false
            }
        }
    }
}
