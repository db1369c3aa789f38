//! # audio-recorder-cpal
//!
//! Cross-platform input backend for audio-recorder, built on cpal.
//!
//! Provides:
//! - `CpalPlatform`: raw PCM capture from the default (or a named) input device
//! - `CpalPermission`: "an input device is available" as the record permission
//! - `list_input_devices`: input device enumeration
//!
//! cpal offers no container encoder, so the platform reports
//! `PlatformCapabilities::raw_only()` and compressed formats fall back to
//! PCM 16-bit WAV.
//!
//! ## Usage
//! ```no_run
//! use std::sync::Arc;
//! use audio_recorder_core::{EngineSettings, Preset, RecorderEngine};
//! use audio_recorder_cpal::{CpalPermission, CpalPlatform};
//!
//! let engine = RecorderEngine::new(
//!     Box::new(CpalPlatform::new()),
//!     Arc::new(CpalPermission::new()),
//!     EngineSettings::default(),
//! )
//! .unwrap();
//! engine.use_preset(Preset::Professional).unwrap();
//! engine.start(None).unwrap();
//! ```

pub mod devices;
pub mod permissions;
pub mod platform;

pub use devices::{list_input_devices, DeviceError, InputDevice};
pub use permissions::CpalPermission;
pub use platform::{CpalInputStream, CpalPlatform};
