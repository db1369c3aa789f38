use serde::{Deserialize, Serialize};

use super::config::RecordingConfiguration;
use super::format::{AudioFormat, PlatformCapabilities, Quality};
use super::preset::Preset;

/// Loosely-typed recording options as received from a caller (e.g. JSON).
///
/// Unknown names fall back to defaults instead of failing: format → AAC,
/// quality → high, preset → voice note. When `preset` is present every
/// other audio field is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordingOptions {
    /// File name placed under the engine's recordings directory.
    pub file_name: Option<String>,
    pub format: Option<String>,
    pub quality: Option<String>,
    pub preset: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub bit_rate: Option<u32>,
    pub enable_level_monitoring: Option<bool>,
}

impl RecordingOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn resolve(&self, capabilities: &PlatformCapabilities) -> RecordingConfiguration {
        let mut config = match &self.preset {
            Some(name) => Preset::from_name_or_default(name).configuration(capabilities),
            None => self.resolve_explicit(capabilities),
        };
        if let Some(enabled) = self.enable_level_monitoring {
            config.enable_level_monitoring = enabled;
        }
        config
    }

    fn resolve_explicit(&self, capabilities: &PlatformCapabilities) -> RecordingConfiguration {
        let format = self
            .format
            .as_deref()
            .map(|s| s.parse().unwrap_or(AudioFormat::Aac))
            .unwrap_or(AudioFormat::Aac);
        let quality = self
            .quality
            .as_deref()
            .map(|s| s.parse().unwrap_or(Quality::High))
            .unwrap_or(Quality::High);

        let mut config = RecordingConfiguration::with_format(format, quality, capabilities);
        config.set_stream_params(self.sample_rate.unwrap_or(44_100), self.channels.unwrap_or(1));
        config.bit_rate = self.bit_rate.unwrap_or_else(|| quality.bit_rate_for(config.codec));
        config
    }
}
