use serde::{Deserialize, Serialize};

/// Recorder state machine.
///
/// State transitions:
/// ```text
/// idle ─(configure)─ idle ─(start)→ recording ⇄ paused
///                                      ↓          ↓
///                                    stopped ←────┘
///
/// any active state ─(backend failure)→ error
/// ```
///
/// Configuration is implicit: an idle engine always holds a configuration
/// (the default one until replaced), so there is no separate "configured"
/// state. `Stopped` and `Error` are entry points for a new session, like
/// `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
    Paused,
    Stopped,
    Error,
}

impl RecorderState {
    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Whether a session currently owns a capture backend.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Recording | Self::Paused)
    }

    /// Whether a new session may be started (and configuration replaced).
    pub fn accepts_new_session(&self) -> bool {
        !self.is_active()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for RecorderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
