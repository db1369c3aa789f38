use std::fs;
use std::path::Path;

use crate::models::audio_models::{AudioLevel, BackendKind};
use crate::models::config::{EncoderParams, StreamParams};
use crate::models::error::RecorderError;
use crate::storage::checksum::sha256_file;
use crate::storage::wav_writer::{FinalizedWav, WavFileWriter};
use crate::traits::encoder::DelegatedEncoder;
use crate::traits::input_stream::InputStream;
use crate::traits::platform::AudioPlatform;

use super::level_monitor::chunk_level;

/// The capture strategy of one active session.
pub(crate) enum CaptureBackend {
    Delegated(DelegatedBackend),
    Raw(RawBackend),
}

impl CaptureBackend {
    pub(crate) fn kind(&self) -> BackendKind {
        match self {
            Self::Delegated(_) => BackendKind::Delegated,
            Self::Raw(_) => BackendKind::Raw,
        }
    }

    /// Tear down after a failure. Never reports errors.
    pub(crate) fn abort(self) {
        match self {
            Self::Delegated(backend) => backend.abort(),
            Self::Raw(backend) => backend.abort(),
        }
    }
}

/// File facts gathered once a session's container is closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FinishedFile {
    pub size_bytes: u64,
    /// Duration derived from the data itself, when the backend knows it.
    pub duration_ms: Option<u64>,
    pub checksum: Option<String>,
}

impl From<FinalizedWav> for FinishedFile {
    fn from(wav: FinalizedWav) -> Self {
        Self {
            size_bytes: wav.file_size,
            duration_ms: Some(wav.duration_ms),
            checksum: wav.checksum,
        }
    }
}

// ---------------------------------------------------------------------------
// Delegated
// ---------------------------------------------------------------------------

/// A platform encoder that owns capture, encoding and the container.
pub(crate) struct DelegatedBackend {
    encoder: Box<dyn DelegatedEncoder>,
}

impl DelegatedBackend {
    /// Create, configure and start an encoder as one step.
    ///
    /// On failure the encoder is released and dropped before returning.
    pub(crate) fn start(
        platform: &mut dyn AudioPlatform,
        params: &EncoderParams,
        output: &Path,
    ) -> Result<Self, RecorderError> {
        let mut encoder = platform
            .create_encoder()
            .map_err(|e| wrap(e, RecorderError::StartFailed))?;

        let setup = encoder.configure(params, output).and_then(|_| encoder.start());
        if let Err(e) = setup {
            log::debug!("encoder setup failed, releasing: {}", e);
            encoder.release();
            return Err(wrap(e, RecorderError::StartFailed));
        }

        log::debug!(
            "encoder started: {} {}Hz {}ch {}bps",
            params.codec.label(),
            params.sample_rate,
            params.channels,
            params.bit_rate
        );
        Ok(Self { encoder })
    }

    pub(crate) fn pause(&mut self) -> Result<(), RecorderError> {
        self.encoder.pause().map_err(|e| wrap(e, RecorderError::PauseFailed))
    }

    pub(crate) fn resume(&mut self) -> Result<(), RecorderError> {
        self.encoder.resume().map_err(|e| wrap(e, RecorderError::ResumeFailed))
    }

    pub(crate) fn amplitude(&mut self) -> i32 {
        self.encoder.amplitude()
    }

    /// Stop and release the encoder, then inspect the file it wrote.
    ///
    /// A missing output file is a `FileError`: the encoder reported success
    /// but left nothing behind.
    pub(crate) fn stop(
        mut self,
        platform: &dyn AudioPlatform,
        output: &Path,
    ) -> Result<FinishedFile, RecorderError> {
        let stopped = self.encoder.stop();
        self.encoder.release();
        stopped.map_err(|e| wrap(e, RecorderError::StopFailed))?;

        let size_bytes = fs::metadata(output).map(|m| m.len()).map_err(|e| {
            log::warn!("encoder output missing at {}: {}", output.display(), e);
            RecorderError::FileError(format!("encoder output missing at {}: {}", output.display(), e))
        })?;
        let checksum = if size_bytes > 0 { sha256_file(output).ok() } else { None };
        let duration_ms = platform.container_duration_ms(output);
        if duration_ms.is_none() {
            log::debug!("container duration unavailable for {}", output.display());
        }
        Ok(FinishedFile {
            size_bytes,
            duration_ms,
            checksum,
        })
    }

    fn abort(mut self) {
        if let Err(e) = self.encoder.stop() {
            log::warn!("encoder stop during abort failed: {}", e);
        }
        self.encoder.release();
    }
}

// ---------------------------------------------------------------------------
// Raw
// ---------------------------------------------------------------------------

/// Outcome of one [`RawBackend::pump`] step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Pump {
    /// The stream had nothing to deliver.
    Idle,
    /// `bytes` were appended to the file.
    Wrote { bytes: usize, level: Option<AudioLevel> },
}

/// Raw PCM input framed into WAV by [`WavFileWriter`].
pub(crate) struct RawBackend {
    stream: Box<dyn InputStream>,
    writer: WavFileWriter,
    params: StreamParams,
    chunk: Vec<u8>,
    monitor_levels: bool,
}

impl RawBackend {
    /// Size the read chunk, open the input and create the file.
    ///
    /// The chunk is twice the platform minimum. A minimum the platform
    /// cannot report is a configuration error; it is never guessed.
    pub(crate) fn start(
        platform: &mut dyn AudioPlatform,
        params: StreamParams,
        output: &Path,
        monitor_levels: bool,
    ) -> Result<Self, RecorderError> {
        let min_size = platform
            .min_buffer_size(&params)
            .map_err(|e| wrap(e, RecorderError::ConfigurationFailed))?;
        if min_size == 0 {
            return Err(RecorderError::ConfigurationFailed(format!(
                "no usable buffer size for {}Hz/{}ch",
                params.sample_rate, params.channels
            )));
        }
        let chunk_size = frame_aligned(min_size * 2, params.frame_size());

        let mut stream = platform
            .open_input(&params)
            .map_err(|e| wrap(e, RecorderError::StartFailed))?;

        let writer = match WavFileWriter::create(output, params) {
            Ok(writer) => writer,
            Err(e) => {
                stream.stop();
                stream.release();
                return Err(e);
            }
        };

        log::debug!(
            "raw capture started: {}Hz {}ch {}-bit, {} byte chunks",
            params.sample_rate,
            params.channels,
            params.encoding.bits_per_sample(),
            chunk_size
        );
        Ok(Self {
            stream,
            writer,
            params,
            chunk: vec![0u8; chunk_size],
            monitor_levels,
        })
    }

    /// Read one chunk and append it to the file.
    ///
    /// Read and write failures are both reported as `WriteFailed`; the
    /// session cannot continue after either.
    pub(crate) fn pump(&mut self) -> Result<Pump, RecorderError> {
        let read = self
            .stream
            .read(&mut self.chunk)
            .map_err(|e| wrap(e, RecorderError::WriteFailed))?;
        if read == 0 {
            return Ok(Pump::Idle);
        }
        let read = read.min(self.chunk.len());
        let bytes = &self.chunk[..read];
        self.writer.write(bytes)?;

        let level = self
            .monitor_levels
            .then(|| chunk_level(bytes, self.params.encoding));
        Ok(Pump::Wrote { bytes: read, level })
    }

    pub(crate) fn data_bytes(&self) -> u64 {
        self.writer.data_bytes()
    }

    /// Stop the input and finalize the WAV header.
    pub(crate) fn stop(mut self) -> Result<FinishedFile, RecorderError> {
        self.stream.stop();
        self.stream.release();
        self.writer
            .finalize()
            .map(FinishedFile::from)
            .map_err(|e| wrap(e, RecorderError::StopFailed))
    }

    /// Stop the input and finalize best-effort, keeping the file valid.
    fn abort(mut self) {
        self.stream.stop();
        self.stream.release();
        match self.writer.finalize() {
            Ok(wav) => log::debug!("aborted session left {} data bytes", wav.data_bytes),
            Err(e) => log::warn!("finalize during abort failed: {}", e),
        }
    }
}

fn frame_aligned(size: usize, frame_size: usize) -> usize {
    if frame_size == 0 || size < frame_size {
        return size;
    }
    size - size % frame_size
}

/// Re-label an error as `kind` unless it already is that variant.
pub(crate) fn wrap(error: RecorderError, kind: fn(String) -> RecorderError) -> RecorderError {
    let relabeled = kind(String::new());
    if std::mem::discriminant(&error) == std::mem::discriminant(&relabeled) {
        error
    } else {
        kind(error.to_string())
    }
}
