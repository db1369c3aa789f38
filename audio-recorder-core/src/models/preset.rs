use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::config::RecordingConfiguration;
use super::format::{AudioFormat, PlatformCapabilities, Quality};

/// Named default configurations.
///
/// | preset | format | quality | rate | channels | bit rate |
/// |---|---|---|---|---|---|
/// | `VoiceNote` | AAC | medium | 44100 | 1 | 96 kbps |
/// | `VoiceCall` | AMR-NB | low | 8000 | 1 | 12.2 kbps |
/// | `MusicHigh` | AAC | maximum | 48000 | 2 | 256 kbps |
/// | `MusicStandard` | AAC | high | 44100 | 2 | 192 kbps |
/// | `Professional` | PCM 16-bit (raw) | maximum | 48000 | 2 | n/a |
/// | `Compact` | AAC | low | 22050 | 1 | 64 kbps |
/// | `Streaming` | Opus, AAC when unsupported | high | 48000 | 2 | 128 kbps |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    #[default]
    VoiceNote,
    VoiceCall,
    MusicHigh,
    MusicStandard,
    Professional,
    Compact,
    Streaming,
}

impl Preset {
    pub const ALL: [Preset; 7] = [
        Preset::VoiceNote,
        Preset::VoiceCall,
        Preset::MusicHigh,
        Preset::MusicStandard,
        Preset::Professional,
        Preset::Compact,
        Preset::Streaming,
    ];

    /// Parse a preset name, falling back to [`Preset::VoiceNote`] when unknown.
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            log::warn!("unknown preset {:?}; using {:?}", name, Preset::default());
            Preset::default()
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::VoiceNote => "voice_note",
            Self::VoiceCall => "voice_call",
            Self::MusicHigh => "music_high",
            Self::MusicStandard => "music_standard",
            Self::Professional => "professional",
            Self::Compact => "compact",
            Self::Streaming => "streaming",
        }
    }

    /// Resolve this preset into a complete configuration.
    pub fn configuration(&self, capabilities: &PlatformCapabilities) -> RecordingConfiguration {
        let (format, quality, sample_rate, channels, bit_rate) = match self {
            Self::VoiceNote => (AudioFormat::Aac, Quality::Medium, 44_100, 1, 96_000),
            Self::VoiceCall => (AudioFormat::AmrNb, Quality::Low, 8_000, 1, 12_200),
            Self::MusicHigh => (AudioFormat::Aac, Quality::Maximum, 48_000, 2, 256_000),
            Self::MusicStandard => (AudioFormat::Aac, Quality::High, 44_100, 2, 192_000),
            Self::Professional => (AudioFormat::Pcm16Bit, Quality::Maximum, 48_000, 2, 0),
            Self::Compact => (AudioFormat::Aac, Quality::Low, 22_050, 1, 64_000),
            Self::Streaming => (AudioFormat::Opus, Quality::High, 48_000, 2, 128_000),
        };

        let mut config = RecordingConfiguration::with_format(format, quality, capabilities);
        config.set_stream_params(sample_rate, channels);
        if config.use_delegated_encoder {
            config.bit_rate = bit_rate;
        }
        config
    }
}

impl FromStr for Preset {
    type Err = String;

    /// Case-insensitive; separators are ignored (`"voice_note"`, `"VoiceNote"`, `"voice-note"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name().replace('_', "") == key)
            .ok_or_else(|| format!("unknown preset: {}", s))
    }
}

impl RecordingConfiguration {
    pub fn from_preset(preset: Preset, capabilities: &PlatformCapabilities) -> Self {
        preset.configuration(capabilities)
    }
}
