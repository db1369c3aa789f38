//! WAV header generation and parsing.
//!
//! Layout of the 44-byte canonical header:
//! ```text
//! [0-3]    "RIFF"
//! [4-7]    file size - 8
//! [8-11]   "WAVE"
//! [12-15]  "fmt "
//! [16-19]  16 (fmt chunk size)
//! [20-21]  format tag (1 = integer PCM, 3 = IEEE float)
//! [22-23]  channels
//! [24-27]  sample_rate
//! [28-31]  byte_rate = sample_rate * channels * bits / 8
//! [32-33]  block_align = channels * bits / 8
//! [34-35]  bits per sample
//! [36-39]  "data"
//! [40-43]  data size = file size - 44
//! ```

use crate::models::format::SampleEncoding;

/// Size of the canonical WAV header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Offset of the RIFF chunk size field.
pub const RIFF_SIZE_OFFSET: u64 = 4;

/// Offset of the `data` chunk size field.
pub const DATA_SIZE_OFFSET: u64 = 40;

/// Build a 44-byte header. `data_size` is 0 for a provisional header.
pub fn generate_wav_header(
    sample_rate: u32,
    encoding: SampleEncoding,
    channels: u16,
    data_size: u32,
) -> [u8; WAV_HEADER_SIZE] {
    let bits = encoding.bits_per_sample();
    let byte_rate = sample_rate * channels as u32 * bits as u32 / 8;
    let block_align = channels * bits / 8;
    let chunk_size = 36 + data_size;

    let mut header = [0u8; WAV_HEADER_SIZE];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&encoding.wav_format_tag().to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bits.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Fields of a canonical 44-byte header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub riff_size: u32,
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WavHeader {
    /// Parse the canonical layout. Returns `None` for anything else.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < WAV_HEADER_SIZE
            || &bytes[0..4] != b"RIFF"
            || &bytes[8..12] != b"WAVE"
            || &bytes[12..16] != b"fmt "
            || &bytes[36..40] != b"data"
        {
            return None;
        }
        let u16_at = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
        let u32_at = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Some(Self {
            riff_size: u32_at(4),
            format_tag: u16_at(20),
            channels: u16_at(22),
            sample_rate: u32_at(24),
            byte_rate: u32_at(28),
            block_align: u16_at(32),
            bits_per_sample: u16_at(34),
            data_size: u32_at(40),
        })
    }

    /// Playback duration of the declared data chunk.
    pub fn duration_ms(&self) -> u64 {
        if self.byte_rate == 0 {
            return 0;
        }
        self.data_size as u64 * 1000 / self.byte_rate as u64
    }
}
