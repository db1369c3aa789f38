use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::RecorderError;
use super::recording_result::RecordingResult;
use super::state::RecorderState;
use crate::processing::levels::SILENCE_FLOOR_DB;

/// Which capture strategy a session runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// A platform encoder writes the container.
    Delegated,
    /// Raw samples are framed into WAV by this crate.
    Raw,
}

/// Live audio level in dBFS. Both values are at most 0.0 and at least
/// [`SILENCE_FLOOR_DB`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioLevel {
    /// RMS level (or the encoder's coarse amplitude on the delegated path).
    pub db: f32,
    /// Peak level over the same window.
    pub peak_db: f32,
}

impl AudioLevel {
    pub const SILENCE: AudioLevel = AudioLevel {
        db: SILENCE_FLOOR_DB,
        peak_db: SILENCE_FLOOR_DB,
    };

    pub fn is_silence(&self) -> bool {
        self.peak_db <= SILENCE_FLOOR_DB
    }
}

/// Notification emitted by the engine. Drained on the caller's thread.
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    Started { path: PathBuf },
    Stopped(RecordingResult),
    Paused,
    Resumed,
    Level(AudioLevel),
    Error(RecorderError),
}

/// Snapshot of the engine as of the last completed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecorderStatus {
    pub state: RecorderState,
    pub is_recording: bool,
    pub is_paused: bool,
    pub current_file_path: Option<PathBuf>,
    pub backend: Option<BackendKind>,
}
