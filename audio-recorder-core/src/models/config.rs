use serde::{Deserialize, Serialize};

use super::error::RecorderError;
use super::format::{AudioFormat, CaptureSource, Codec, Container, PlatformCapabilities, Quality, SampleEncoding};

/// Lowest and highest sample rates accepted by [`RecordingConfiguration::validate`].
pub const MIN_SAMPLE_RATE: u32 = 8_000;
pub const MAX_SAMPLE_RATE: u32 = 192_000;

/// Concrete capture parameters for one recording session.
///
/// Built from a [`Preset`](super::preset::Preset), from
/// [`RecordingOptions`](super::options::RecordingOptions), or by hand. The
/// engine takes a copy when a session starts; that copy is frozen until the
/// session ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingConfiguration {
    pub source: CaptureSource,

    /// Output container. Always [`Container::Wav`] on the raw path.
    pub container: Container,

    /// Codec for the delegated encoder. Ignored on the raw path.
    pub codec: Codec,

    /// Sample encoding for raw capture. Ignored on the delegated path.
    pub sample_encoding: SampleEncoding,

    /// Sample rate in Hz (default: 44100).
    pub sample_rate: u32,

    /// Channel count, 1 or 2 (default: 1).
    pub channels: u16,

    /// Encoder bit rate in bits per second (delegated path only).
    pub bit_rate: u32,

    /// `true` selects the delegated encoder backend, `false` raw capture.
    pub use_delegated_encoder: bool,

    pub quality: Quality,

    /// Emit live level notifications while recording (default: true).
    pub enable_level_monitoring: bool,
}

impl Default for RecordingConfiguration {
    fn default() -> Self {
        Self {
            source: CaptureSource::Microphone,
            container: Container::Mpeg4,
            codec: Codec::Aac,
            sample_encoding: SampleEncoding::Pcm16,
            sample_rate: 44_100,
            channels: 1,
            bit_rate: 128_000,
            use_delegated_encoder: true,
            quality: Quality::High,
            enable_level_monitoring: true,
        }
    }
}

impl RecordingConfiguration {
    /// Default configuration with `format` applied.
    pub fn with_format(format: AudioFormat, quality: Quality, capabilities: &PlatformCapabilities) -> Self {
        let mut config = Self {
            quality,
            ..Self::default()
        };
        config.apply_format(format, capabilities);
        config
    }

    /// Map an encoding family onto container, codec and backend selection.
    ///
    /// Formats with a mandated rate (AMR-NB: 8 kHz mono, AMR-WB: 16 kHz mono)
    /// overwrite `sample_rate` and `channels`. Unsupported combinations fall
    /// back deterministically:
    ///
    /// | requested | fallback |
    /// |---|---|
    /// | AAC-ELD, HE-AAC, Opus, Vorbis | AAC in MPEG-4 |
    /// | PCM float | PCM 16-bit |
    /// | any compressed format, no delegated encoder | PCM 16-bit |
    pub fn apply_format(&mut self, format: AudioFormat, capabilities: &PlatformCapabilities) {
        if !format.is_pcm() && !capabilities.delegated_encoder {
            log::debug!("{:?} needs a delegated encoder; falling back to PCM 16-bit", format);
            self.apply_pcm(SampleEncoding::Pcm16);
            return;
        }

        match format {
            AudioFormat::Aac => self.apply_delegated(Container::Mpeg4, Codec::Aac),
            AudioFormat::AacEld if capabilities.aac_eld => self.apply_delegated(Container::Mpeg4, Codec::AacEld),
            AudioFormat::HeAac if capabilities.he_aac => self.apply_delegated(Container::Mpeg4, Codec::HeAac),
            AudioFormat::AmrNb => self.apply_delegated(Container::ThreeGpp, Codec::AmrNb),
            AudioFormat::AmrWb => self.apply_delegated(Container::ThreeGpp, Codec::AmrWb),
            AudioFormat::Opus if capabilities.opus => self.apply_delegated(Container::Ogg, Codec::Opus),
            AudioFormat::Vorbis if capabilities.vorbis => self.apply_delegated(Container::Webm, Codec::Vorbis),
            AudioFormat::AacEld | AudioFormat::HeAac | AudioFormat::Opus | AudioFormat::Vorbis => {
                log::debug!("{:?} unsupported on this platform; falling back to AAC", format);
                self.apply_delegated(Container::Mpeg4, Codec::Aac);
            }
            AudioFormat::Pcm16Bit => self.apply_pcm(SampleEncoding::Pcm16),
            AudioFormat::Pcm8Bit => self.apply_pcm(SampleEncoding::Pcm8),
            AudioFormat::PcmFloat if capabilities.pcm_float => self.apply_pcm(SampleEncoding::PcmFloat),
            AudioFormat::PcmFloat => {
                log::debug!("PCM float unsupported on this platform; falling back to PCM 16-bit");
                self.apply_pcm(SampleEncoding::Pcm16);
            }
        }
    }

    /// Set rate and channel count, keeping any rate the codec mandates.
    pub fn set_stream_params(&mut self, sample_rate: u32, channels: u16) {
        if let Some((forced_rate, forced_channels)) = self.forced_stream_params() {
            if forced_rate != sample_rate || forced_channels != channels {
                log::debug!(
                    "{} requires {}Hz/{}ch; ignoring requested {}Hz/{}ch",
                    self.codec.label(),
                    forced_rate,
                    forced_channels,
                    sample_rate,
                    channels
                );
            }
            self.sample_rate = forced_rate;
            self.channels = forced_channels;
        } else {
            self.sample_rate = sample_rate;
            self.channels = channels;
        }
    }

    /// The encoding family this configuration resolves to.
    pub fn format(&self) -> AudioFormat {
        if !self.use_delegated_encoder {
            return match self.sample_encoding {
                SampleEncoding::Pcm8 => AudioFormat::Pcm8Bit,
                SampleEncoding::Pcm16 => AudioFormat::Pcm16Bit,
                SampleEncoding::PcmFloat => AudioFormat::PcmFloat,
            };
        }
        match self.codec {
            Codec::Aac => AudioFormat::Aac,
            Codec::AacEld => AudioFormat::AacEld,
            Codec::HeAac => AudioFormat::HeAac,
            Codec::AmrNb => AudioFormat::AmrNb,
            Codec::AmrWb => AudioFormat::AmrWb,
            Codec::Opus => AudioFormat::Opus,
            Codec::Vorbis => AudioFormat::Vorbis,
        }
    }

    /// `.wav` on the raw path, otherwise the container's extension.
    pub fn file_extension(&self) -> &'static str {
        if !self.use_delegated_encoder {
            return Container::Wav.extension();
        }
        self.container.extension()
    }

    /// Expected output size per minute of recording.
    pub fn estimated_bytes_per_minute(&self) -> u64 {
        if self.use_delegated_encoder {
            self.bit_rate as u64 * 60 / 8
        } else {
            self.sample_rate as u64 * self.channels as u64 * self.sample_encoding.bytes_per_sample() as u64 * 60
        }
    }

    pub fn estimated_megabytes_per_minute(&self) -> f64 {
        self.estimated_bytes_per_minute() as f64 / (1024.0 * 1024.0)
    }

    /// Human-readable summary, e.g. `AAC - 44100Hz - Mono - 128kbps`.
    pub fn description(&self) -> String {
        let channels = if self.channels == 1 { "Mono" } else { "Stereo" };
        if self.use_delegated_encoder {
            format!(
                "{} - {}Hz - {} - {}kbps",
                self.codec.label(),
                self.sample_rate,
                channels,
                self.bit_rate / 1000
            )
        } else {
            format!(
                "PCM {}-bit - {}Hz - {}",
                self.sample_encoding.bits_per_sample(),
                self.sample_rate,
                channels
            )
        }
    }

    pub fn validate(&self) -> Result<(), RecorderError> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(RecorderError::ConfigurationFailed(format!(
                "unsupported sample rate: {}",
                self.sample_rate
            )));
        }
        if ![1, 2].contains(&self.channels) {
            return Err(RecorderError::ConfigurationFailed(format!(
                "unsupported channel count: {}",
                self.channels
            )));
        }
        if self.use_delegated_encoder && self.bit_rate == 0 {
            return Err(RecorderError::ConfigurationFailed("bit rate must be positive".into()));
        }
        if !self.use_delegated_encoder && self.container != Container::Wav {
            return Err(RecorderError::ConfigurationFailed(format!(
                "raw capture writes WAV, not {:?}",
                self.container
            )));
        }
        Ok(())
    }

    /// Parameters for opening a hardware input stream.
    pub fn stream_params(&self) -> StreamParams {
        StreamParams {
            source: self.source,
            sample_rate: self.sample_rate,
            channels: self.channels,
            encoding: self.sample_encoding,
        }
    }

    /// Parameters handed to a delegated encoder.
    pub fn encoder_params(&self) -> EncoderParams {
        EncoderParams {
            source: self.source,
            container: self.container,
            codec: self.codec,
            sample_rate: self.sample_rate,
            channels: self.channels,
            bit_rate: self.bit_rate,
        }
    }

    fn apply_delegated(&mut self, container: Container, codec: Codec) {
        self.container = container;
        self.codec = codec;
        self.use_delegated_encoder = true;
        if let Some((rate, channels)) = self.forced_stream_params() {
            self.sample_rate = rate;
            self.channels = channels;
        }
    }

    fn apply_pcm(&mut self, encoding: SampleEncoding) {
        self.container = Container::Wav;
        self.sample_encoding = encoding;
        self.use_delegated_encoder = false;
    }

    fn forced_stream_params(&self) -> Option<(u32, u16)> {
        if !self.use_delegated_encoder {
            return None;
        }
        match self.codec {
            Codec::AmrNb => Some((8_000, 1)),
            Codec::AmrWb => Some((16_000, 1)),
            _ => None,
        }
    }
}

/// Raw-path stream parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    pub source: CaptureSource,
    pub sample_rate: u32,
    pub channels: u16,
    pub encoding: SampleEncoding,
}

impl StreamParams {
    /// Bytes per interleaved frame.
    pub fn frame_size(&self) -> usize {
        self.channels as usize * self.encoding.bytes_per_sample()
    }

    /// Bytes per second of audio.
    pub fn byte_rate(&self) -> u64 {
        self.sample_rate as u64 * self.frame_size() as u64
    }
}

/// Delegated-path encoder parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderParams {
    pub source: CaptureSource,
    pub container: Container,
    pub codec: Codec,
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_rate: u32,
}
