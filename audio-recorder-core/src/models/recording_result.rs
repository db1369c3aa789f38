use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::audio_models::BackendKind;
use super::config::RecordingConfiguration;

/// Result reported when a recording stops cleanly.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub duration_ms: u64,
    pub size_bytes: u64,
    pub backend: BackendKind,
    /// SHA-256 of the finished file, when the file could be read back.
    pub checksum: Option<String>,
}

/// Metadata written next to a recording as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub file_path: String,
    pub duration_ms: u64,
    pub size_bytes: u64,
    pub checksum: Option<String>,
    pub created_at: String,
    pub format: String,
    pub description: String,
    pub sample_rate: u32,
    pub channels: u16,
}

impl RecordingMetadata {
    pub fn new(result: &RecordingResult, config: &RecordingConfiguration) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_path: result.file_path.to_string_lossy().into_owned(),
            duration_ms: result.duration_ms,
            size_bytes: result.size_bytes,
            checksum: result.checksum.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
            format: format!("{:?}", config.format()),
            description: config.description(),
            sample_rate: config.sample_rate,
            channels: config.channels,
        }
    }
}
