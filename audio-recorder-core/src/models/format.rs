use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Encoding family a caller can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    Aac,
    AacEld,
    HeAac,
    AmrNb,
    AmrWb,
    Opus,
    Vorbis,
    #[serde(rename = "pcm_16bit")]
    Pcm16Bit,
    #[serde(rename = "pcm_8bit")]
    Pcm8Bit,
    PcmFloat,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 10] = [
        AudioFormat::Aac,
        AudioFormat::AacEld,
        AudioFormat::HeAac,
        AudioFormat::AmrNb,
        AudioFormat::AmrWb,
        AudioFormat::Opus,
        AudioFormat::Vorbis,
        AudioFormat::Pcm16Bit,
        AudioFormat::Pcm8Bit,
        AudioFormat::PcmFloat,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Aac => "AAC (Advanced Audio Coding)",
            Self::AacEld => "AAC-ELD (Enhanced Low Delay)",
            Self::HeAac => "HE-AAC (High Efficiency)",
            Self::AmrNb => "AMR Narrowband",
            Self::AmrWb => "AMR Wideband",
            Self::Opus => "Opus",
            Self::Vorbis => "Vorbis",
            Self::Pcm16Bit => "PCM 16-bit",
            Self::Pcm8Bit => "PCM 8-bit",
            Self::PcmFloat => "PCM Float",
        }
    }

    /// Whether this format is written by the raw-sample path.
    pub fn is_pcm(&self) -> bool {
        matches!(self, Self::Pcm16Bit | Self::Pcm8Bit | Self::PcmFloat)
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    /// Case-insensitive; `-` and `_` are interchangeable (`"he-aac"`, `"PCM_16BIT"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let format = match normalized.as_str() {
            "aac" => Self::Aac,
            "aac_eld" => Self::AacEld,
            "he_aac" => Self::HeAac,
            "amr_nb" => Self::AmrNb,
            "amr_wb" => Self::AmrWb,
            "opus" => Self::Opus,
            "vorbis" => Self::Vorbis,
            "pcm_16bit" | "pcm16" | "wav" => Self::Pcm16Bit,
            "pcm_8bit" | "pcm8" => Self::Pcm8Bit,
            "pcm_float" => Self::PcmFloat,
            _ => return Err(format!("unknown audio format: {}", s)),
        };
        Ok(format)
    }
}

/// File container produced by a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Container {
    Mpeg4,
    ThreeGpp,
    Webm,
    Ogg,
    Wav,
}

impl Container {
    /// File extension including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mpeg4 => ".m4a",
            Self::ThreeGpp => ".3gp",
            Self::Webm => ".webm",
            Self::Ogg => ".ogg",
            Self::Wav => ".wav",
        }
    }
}

/// Compressed codec handed to a delegated encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Codec {
    Aac,
    AacEld,
    HeAac,
    AmrNb,
    AmrWb,
    Opus,
    Vorbis,
}

impl Codec {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Aac => "AAC",
            Self::AacEld => "AAC-ELD",
            Self::HeAac => "HE-AAC",
            Self::AmrNb => "AMR-NB",
            Self::AmrWb => "AMR-WB",
            Self::Opus => "Opus",
            Self::Vorbis => "Vorbis",
        }
    }

    pub fn is_aac_family(&self) -> bool {
        matches!(self, Self::Aac | Self::AacEld | Self::HeAac)
    }
}

/// Sample encoding of raw PCM capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleEncoding {
    /// Unsigned 8-bit, centered at 128.
    Pcm8,
    /// Signed 16-bit little-endian.
    #[default]
    Pcm16,
    /// IEEE 754 32-bit float little-endian.
    PcmFloat,
}

impl SampleEncoding {
    pub fn bits_per_sample(&self) -> u16 {
        match self {
            Self::Pcm8 => 8,
            Self::Pcm16 => 16,
            Self::PcmFloat => 32,
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bits_per_sample() as usize / 8
    }

    /// WAV `fmt ` format tag: 1 for integer PCM, 3 for IEEE float.
    pub fn wav_format_tag(&self) -> u16 {
        match self {
            Self::PcmFloat => 3,
            _ => 1,
        }
    }
}

/// Quality tier, used to pick a bit rate for compressed formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    Medium,
    #[default]
    High,
    Maximum,
}

impl Quality {
    /// Recommended bit rate for `codec` at this quality.
    pub fn bit_rate_for(&self, codec: Codec) -> u32 {
        if !codec.is_aac_family() {
            return 128_000;
        }
        match self {
            Self::Low => 64_000,
            Self::Medium => 128_000,
            Self::High => 192_000,
            Self::Maximum => 256_000,
        }
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "maximum" | "max" => Ok(Self::Maximum),
            _ => Err(format!("unknown quality: {}", s)),
        }
    }
}

/// Physical capture source requested from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureSource {
    #[default]
    Microphone,
    VoiceRecognition,
    VoiceCommunication,
    Unprocessed,
}

/// What the host platform can do. Drives format fallback and pause support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    /// A delegated (container-encoding) encoder is available at all.
    pub delegated_encoder: bool,
    pub aac_eld: bool,
    pub he_aac: bool,
    pub opus: bool,
    pub vorbis: bool,
    pub pcm_float: bool,
    /// The delegated encoder supports pause/resume.
    pub pause_resume: bool,
}

impl PlatformCapabilities {
    /// A platform supporting every format and pause/resume.
    pub fn full() -> Self {
        Self {
            delegated_encoder: true,
            aac_eld: true,
            he_aac: true,
            opus: true,
            vorbis: true,
            pcm_float: true,
            pause_resume: true,
        }
    }

    /// A platform that can only capture raw samples.
    pub fn raw_only() -> Self {
        Self {
            delegated_encoder: false,
            aac_eld: false,
            he_aac: false,
            opus: false,
            vorbis: false,
            pcm_float: true,
            pause_resume: false,
        }
    }

    /// Whether `format` is recorded as requested, without fallback.
    pub fn supports(&self, format: AudioFormat) -> bool {
        match format {
            AudioFormat::Pcm16Bit | AudioFormat::Pcm8Bit => true,
            AudioFormat::PcmFloat => self.pcm_float,
            AudioFormat::Aac | AudioFormat::AmrNb | AudioFormat::AmrWb => self.delegated_encoder,
            AudioFormat::AacEld => self.delegated_encoder && self.aac_eld,
            AudioFormat::HeAac => self.delegated_encoder && self.he_aac,
            AudioFormat::Opus => self.delegated_encoder && self.opus,
            AudioFormat::Vorbis => self.delegated_encoder && self.vorbis,
        }
    }
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self::full()
    }
}
