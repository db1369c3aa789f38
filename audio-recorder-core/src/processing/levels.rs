//! Amplitude to decibel conversion.
//!
//! All readings are dBFS relative to 16-bit full scale, clamped to
//! `[SILENCE_FLOOR_DB, 0.0]`. Zero or negative amplitude maps to the floor
//! rather than `log10(0)`.

use crate::models::audio_models::AudioLevel;
use crate::models::format::SampleEncoding;

/// Level reported for digital silence.
pub const SILENCE_FLOOR_DB: f32 = -160.0;

/// Full-scale amplitude of a signed 16-bit sample.
pub const FULL_SCALE_I16: f32 = 32768.0;

/// `20·log10(amplitude / full_scale)`, clamped.
pub fn amplitude_to_db(amplitude: f32, full_scale: f32) -> f32 {
    if amplitude.is_nan() || amplitude <= 0.0 || full_scale <= 0.0 {
        return SILENCE_FLOOR_DB;
    }
    (20.0 * (amplitude / full_scale).log10()).clamp(SILENCE_FLOOR_DB, 0.0)
}

/// Level from an encoder's coarse amplitude reading (0..=32767).
pub fn level_from_amplitude(amplitude: i32) -> AudioLevel {
    let db = amplitude_to_db(amplitude as f32, FULL_SCALE_I16);
    AudioLevel { db, peak_db: db }
}

/// RMS of normalized samples.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|s| (*s as f64) * (*s as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

/// Peak absolute value of normalized samples.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
}

/// RMS and peak level of a chunk of raw PCM bytes.
///
/// A trailing partial sample is ignored.
pub fn level_from_pcm(bytes: &[u8], encoding: SampleEncoding) -> AudioLevel {
    let samples = super::pcm::decode_samples(bytes, encoding);
    if samples.is_empty() {
        return AudioLevel::SILENCE;
    }
    AudioLevel {
        db: amplitude_to_db(rms(&samples), 1.0),
        peak_db: amplitude_to_db(peak(&samples), 1.0),
    }
}
