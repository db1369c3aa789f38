use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::config::RecordingConfiguration;
use crate::models::error::RecorderError;

/// Engine-wide settings that outlive individual sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Where generated and named recordings are placed. Created on demand.
    pub recordings_dir: PathBuf,

    /// Write a `<file>.metadata.json` sidecar after each clean stop.
    pub write_metadata: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            recordings_dir: PathBuf::from("Recordings"),
            write_metadata: false,
        }
    }
}

/// Where a new recording should be written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputRequest {
    /// Timestamped name under the recordings directory.
    #[default]
    Generated,
    /// A bare file name under the recordings directory. The configured
    /// extension is appended when the name has none.
    Named(String),
    /// An explicit path, used as-is.
    Path(PathBuf),
}

impl EngineSettings {
    /// Resolve `request` to a concrete path and make sure its directory exists.
    pub fn resolve_output(
        &self,
        request: &OutputRequest,
        config: &RecordingConfiguration,
    ) -> Result<PathBuf, RecorderError> {
        let path = match request {
            OutputRequest::Generated => self
                .recordings_dir
                .join(generated_file_name(config.file_extension())),
            OutputRequest::Named(name) => {
                let file_name = Path::new(name)
                    .file_name()
                    .ok_or_else(|| RecorderError::FileError(format!("invalid file name: {:?}", name)))?;
                let mut path = self.recordings_dir.join(file_name);
                if path.extension().is_none() {
                    path.set_extension(config.file_extension().trim_start_matches('.'));
                }
                path
            }
            OutputRequest::Path(path) => path.clone(),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                RecorderError::FileError(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }
        Ok(path)
    }
}

/// `recording-2024-05-01-13-45-09-1a2b3c4d.m4a`
pub fn generated_file_name(extension: &str) -> String {
    let stamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S");
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("recording-{}-{}{}", stamp, &id[..8], extension)
}
