//! # audio-recorder-core
//!
//! Platform-agnostic audio recording engine.
//!
//! Provides configuration and presets, the recording state machine, a
//! delegated-encoder backend, a raw-sample backend with streaming WAV output,
//! and live level monitoring. Platform crates (e.g. `audio-recorder-cpal`)
//! implement the `AudioPlatform` trait and plug into `RecorderEngine`.
//!
//! ## Architecture
//!
//! ```text
//! audio-recorder-core (this crate)
//! ├── traits/       ← AudioPlatform, DelegatedEncoder, InputStream, PermissionOracle, RecorderListener
//! ├── models/       ← RecorderError, RecorderState, RecordingConfiguration, Preset, RecordingOptions, etc.
//! ├── processing/   ← dB levels, PCM conversion, RingBuffer, WAV header generation
//! ├── session/      ← RecorderEngine, worker thread, capture backends, LevelMonitor
//! └── storage/      ← WavFileWriter, checksum, metadata sidecar
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{AudioLevel, BackendKind, RecorderEvent, RecorderStatus};
pub use models::config::{EncoderParams, RecordingConfiguration, StreamParams};
pub use models::error::RecorderError;
pub use models::format::{AudioFormat, CaptureSource, Codec, Container, PlatformCapabilities, Quality, SampleEncoding};
pub use models::options::RecordingOptions;
pub use models::preset::Preset;
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::RecorderState;
pub use processing::ring_buffer::RingBuffer;
pub use session::engine::RecorderEngine;
pub use session::level_monitor::LevelMonitor;
pub use session::settings::{EngineSettings, OutputRequest};
pub use storage::wav_writer::WavFileWriter;
pub use traits::encoder::DelegatedEncoder;
pub use traits::input_stream::InputStream;
pub use traits::listener::RecorderListener;
pub use traits::permission::{PermissionOracle, StaticPermission};
pub use traits::platform::AudioPlatform;
