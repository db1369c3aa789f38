use std::path::Path;

use crate::models::config::StreamParams;
use crate::models::error::RecorderError;
use crate::models::format::PlatformCapabilities;

use super::encoder::DelegatedEncoder;
use super::input_stream::InputStream;

/// Host audio facilities the engine records through.
///
/// Implemented by:
/// - `CpalPlatform` (audio-recorder-cpal, raw capture only)
/// - test doubles that script encoder and stream behavior
pub trait AudioPlatform: Send {
    fn capabilities(&self) -> PlatformCapabilities;

    /// A fresh, unconfigured encoder for one session.
    fn create_encoder(&mut self) -> Result<Box<dyn DelegatedEncoder>, RecorderError>;

    /// Smallest read size in bytes the input accepts for `params`.
    ///
    /// An `Err` means the parameters are unsupported and the session must
    /// not start.
    fn min_buffer_size(&self, params: &StreamParams) -> Result<usize, RecorderError>;

    /// Open and start a raw input stream.
    fn open_input(&mut self, params: &StreamParams) -> Result<Box<dyn InputStream>, RecorderError>;

    /// Playback length of a finished encoder container, in milliseconds.
    ///
    /// `None` when the platform cannot read the container; the engine then
    /// reports the session's wall time minus pauses.
    fn container_duration_ms(&self, _path: &Path) -> Option<u64> {
        None
    }
}
