use std::path::Path;

use crate::models::config::EncoderParams;
use crate::models::error::RecorderError;

/// Platform encoder that captures, encodes and writes a container file.
///
/// Lifecycle driven by the engine:
///
/// ```text
/// configure(params, path) → start() → [pause() ↔ resume()]* → stop() → release()
/// ```
///
/// `release` is always called exactly once, including after a failed
/// `configure`/`start`. All calls happen on the engine's worker thread.
pub trait DelegatedEncoder: Send {
    fn configure(&mut self, params: &EncoderParams, output: &Path) -> Result<(), RecorderError>;

    fn start(&mut self) -> Result<(), RecorderError>;

    /// Finish the container. The file at the configured path is complete
    /// after this returns `Ok`.
    fn stop(&mut self) -> Result<(), RecorderError>;

    fn pause(&mut self) -> Result<(), RecorderError>;

    fn resume(&mut self) -> Result<(), RecorderError>;

    /// Free platform resources. Must not fail.
    fn release(&mut self);

    /// Maximum absolute sample amplitude since the previous call, in
    /// `0..=32767`. Zero when nothing was captured.
    fn amplitude(&mut self) -> i32;
}
