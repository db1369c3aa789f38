use crate::models::error::RecorderError;

/// Raw PCM input opened by [`AudioPlatform::open_input`](super::platform::AudioPlatform::open_input).
///
/// Bytes are interleaved little-endian samples in the encoding requested
/// through [`StreamParams`](crate::models::config::StreamParams).
pub trait InputStream: Send {
    /// Fill `buf` with up to `buf.len()` bytes.
    ///
    /// `Ok(0)` means nothing was available yet; the caller retries.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, RecorderError>;

    fn stop(&mut self);

    /// Free platform resources. Called once, after `stop`.
    fn release(&mut self);
}
