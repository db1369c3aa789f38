//! Input device lookup and enumeration through cpal's default host.

use cpal::traits::{DeviceTrait, HostTrait};
use thiserror::Error;

use audio_recorder_core::models::error::RecorderError;

/// Failures locating an input device.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("no default input device")]
    NoDefaultDevice,

    #[error("input device not found: {0}")]
    NotFound(String),

    #[error("audio host error: {0}")]
    Host(String),
}

impl From<DeviceError> for RecorderError {
    fn from(err: DeviceError) -> Self {
        RecorderError::StartFailed(err.to_string())
    }
}

/// An input device as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDevice {
    pub name: String,
    pub is_default: bool,
    /// Lowest and highest supported sample rate across all configs.
    pub sample_rate_range: Option<(u32, u32)>,
    pub max_channels: u16,
}

/// List every input device of the default host.
pub fn list_input_devices() -> Result<Vec<InputDevice>, DeviceError> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());
    let devices = host.input_devices().map_err(|e| DeviceError::Host(e.to_string()))?;

    let mut found = Vec::new();
    for device in devices {
        let name = device.name().unwrap_or_else(|_| "Unknown Device".to_string());
        let mut sample_rate_range: Option<(u32, u32)> = None;
        let mut max_channels = 0;
        if let Ok(configs) = device.supported_input_configs() {
            for range in configs {
                let (lo, hi) = (range.min_sample_rate().0, range.max_sample_rate().0);
                sample_rate_range = Some(match sample_rate_range {
                    Some((a, b)) => (a.min(lo), b.max(hi)),
                    None => (lo, hi),
                });
                max_channels = max_channels.max(range.channels());
            }
        }
        found.push(InputDevice {
            is_default: default_name.as_deref() == Some(name.as_str()),
            name,
            sample_rate_range,
            max_channels,
        });
    }
    Ok(found)
}

/// The named input device, or the default one when `name` is `None`.
pub(crate) fn find_input_device(name: Option<&str>) -> Result<cpal::Device, DeviceError> {
    let host = cpal::default_host();
    let Some(name) = name else {
        return host.default_input_device().ok_or(DeviceError::NoDefaultDevice);
    };
    host.input_devices()
        .map_err(|e| DeviceError::Host(e.to_string()))?
        .find(|d| d.name().map(|n| n == name).unwrap_or(false))
        .ok_or_else(|| DeviceError::NotFound(name.to_string()))
}
