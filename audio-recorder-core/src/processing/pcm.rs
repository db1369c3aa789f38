//! Conversions between normalized `f32` samples and raw PCM bytes.
//!
//! Encoded sample layouts (all little-endian):
//! - `Pcm8`: unsigned, 128 = silence
//! - `Pcm16`: signed 16-bit
//! - `PcmFloat`: IEEE 754 single precision

use crate::models::format::SampleEncoding;

/// Encode `samples` (expected in `[-1.0, 1.0]`) into `out`.
///
/// Clamps out-of-range values. Returns the number of bytes written, which is
/// `samples.len() * encoding.bytes_per_sample()` or less if `out` is short.
pub fn encode_samples(samples: &[f32], encoding: SampleEncoding, out: &mut [u8]) -> usize {
    let width = encoding.bytes_per_sample();
    let count = samples.len().min(out.len() / width);

    for (sample, slot) in samples[..count].iter().zip(out.chunks_exact_mut(width)) {
        let clamped = sample.clamp(-1.0, 1.0);
        match encoding {
            SampleEncoding::Pcm8 => {
                slot[0] = (clamped * 127.0 + 128.0).round() as u8;
            }
            SampleEncoding::Pcm16 => {
                let value = (clamped * i16::MAX as f32) as i16;
                slot.copy_from_slice(&value.to_le_bytes());
            }
            SampleEncoding::PcmFloat => {
                slot.copy_from_slice(&clamped.to_le_bytes());
            }
        }
    }
    count * width
}

/// Decode raw PCM bytes into normalized samples. A trailing partial sample is dropped.
pub fn decode_samples(bytes: &[u8], encoding: SampleEncoding) -> Vec<f32> {
    match encoding {
        SampleEncoding::Pcm8 => bytes.iter().map(|b| (*b as f32 - 128.0) / 128.0).collect(),
        SampleEncoding::Pcm16 => bytes
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]) as f32 / 32768.0)
            .collect(),
        SampleEncoding::PcmFloat => bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    }
}

/// Convert interleaved audio between channel counts.
///
/// Downmixing averages channels per frame; upmixing duplicates each sample
/// (mono → stereo). Other counts keep the first `to` channels.
pub fn remix_channels(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }
    let frame_count = samples.len() / from;
    let mut out = Vec::with_capacity(frame_count * to);
    for frame in samples.chunks_exact(from) {
        if to == 1 {
            out.push(frame.iter().sum::<f32>() / from as f32);
        } else if from == 1 {
            out.extend(std::iter::repeat(frame[0]).take(to));
        } else {
            for ch in 0..to {
                out.push(frame[ch.min(from - 1)]);
            }
        }
    }
    out
}
