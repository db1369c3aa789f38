use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::models::config::StreamParams;
use crate::models::error::RecorderError;
use crate::processing::wav_format::{self, DATA_SIZE_OFFSET, RIFF_SIZE_OFFSET, WAV_HEADER_SIZE};

use super::checksum::sha256_file;

/// Streaming WAV writer for the raw capture path.
///
/// ## File lifecycle
///
/// ```text
/// create()   → [44-byte header, sizes = 0]           (valid, empty WAV)
/// write()*   → [header][pcm bytes ...]
/// finalize() → seek 4:  RIFF size  = file size - 8
///              seek 40: data size  = file size - 44
/// ```
///
/// The header is flushed on creation, so a file left behind by a crash is
/// still a well-formed (if empty-looking) WAV.
pub struct WavFileWriter {
    file_path: PathBuf,
    file: Option<BufWriter<File>>,
    params: StreamParams,
    data_bytes: u64,
}

/// Outcome of [`WavFileWriter::finalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedWav {
    pub file_path: PathBuf,
    pub file_size: u64,
    pub data_bytes: u64,
    pub duration_ms: u64,
    pub checksum: Option<String>,
}

impl WavFileWriter {
    /// Create (or truncate) `path` and write the provisional header.
    pub fn create(path: impl Into<PathBuf>, params: StreamParams) -> Result<Self, RecorderError> {
        let file_path = path.into();

        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| RecorderError::FileError(format!("failed to create directory: {}", e)))?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&file_path)
            .map_err(|e| RecorderError::FileError(format!("failed to create {}: {}", file_path.display(), e)))?;

        let mut writer = Self {
            file_path,
            file: Some(BufWriter::new(file)),
            params,
            data_bytes: 0,
        };

        let header = wav_format::generate_wav_header(params.sample_rate, params.encoding, params.channels, 0);
        writer
            .write_raw(&header)
            .and_then(|_| writer.flush())
            .map_err(|e| RecorderError::FileError(format!("failed to write WAV header: {}", e)))?;

        log::debug!(
            "opened {} ({}Hz, {}ch, {}-bit)",
            writer.file_path.display(),
            params.sample_rate,
            params.channels,
            params.encoding.bits_per_sample()
        );
        Ok(writer)
    }

    /// Append raw sample bytes verbatim.
    pub fn write(&mut self, data: &[u8]) -> Result<(), RecorderError> {
        self.write_raw(data)
            .map_err(|e| RecorderError::WriteFailed(e.to_string()))?;
        self.data_bytes += data.len() as u64;
        Ok(())
    }

    /// Patch both size fields and close the file.
    ///
    /// Sizes come from the file's real length, so a short final write is
    /// still described correctly. The writer is closed even when patching
    /// fails; a second call returns `FileError`.
    pub fn finalize(&mut self) -> Result<FinalizedWav, RecorderError> {
        let writer = self
            .file
            .take()
            .ok_or_else(|| RecorderError::FileError("WAV file already finalized".into()))?;

        let mut file = writer
            .into_inner()
            .map_err(|e| RecorderError::FileError(format!("flush failed: {}", e.error())))?;

        let file_size = file
            .seek(SeekFrom::End(0))
            .map_err(|e| RecorderError::FileError(e.to_string()))?;
        let riff_size = clamp_u32(file_size.saturating_sub(8));
        let data_size = clamp_u32(file_size.saturating_sub(WAV_HEADER_SIZE as u64));

        patch_u32(&mut file, RIFF_SIZE_OFFSET, riff_size)?;
        patch_u32(&mut file, DATA_SIZE_OFFSET, data_size)?;
        file.flush().map_err(|e| RecorderError::FileError(e.to_string()))?;
        drop(file);

        let checksum = match sha256_file(&self.file_path) {
            Ok(sum) => Some(sum),
            Err(e) => {
                log::warn!("checksum of {} failed: {}", self.file_path.display(), e);
                None
            }
        };

        let data_bytes = file_size.saturating_sub(WAV_HEADER_SIZE as u64);
        let byte_rate = self.params.byte_rate();
        let duration_ms = if byte_rate == 0 { 0 } else { data_bytes * 1000 / byte_rate };

        log::debug!(
            "finalized {} ({} data bytes, {} ms)",
            self.file_path.display(),
            data_bytes,
            duration_ms
        );

        Ok(FinalizedWav {
            file_path: self.file_path.clone(),
            file_size,
            data_bytes,
            duration_ms,
            checksum,
        })
    }

    /// Sample bytes written so far (excluding the header).
    pub fn data_bytes(&self) -> u64 {
        self.data_bytes
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn write_raw(&mut self, data: &[u8]) -> std::io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.write_all(data),
            None => Err(std::io::Error::new(std::io::ErrorKind::NotConnected, "file is not open")),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

fn patch_u32(file: &mut File, offset: u64, value: u32) -> Result<(), RecorderError> {
    file.seek(SeekFrom::Start(offset))
        .and_then(|_| file.write_all(&value.to_le_bytes()))
        .map_err(|e| RecorderError::FileError(format!("failed to patch header at {}: {}", offset, e)))
}

fn clamp_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
