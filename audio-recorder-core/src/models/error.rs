use thiserror::Error;

/// Errors reported by the recorder engine and its backends.
///
/// The taxonomy is closed: every failure a caller can observe maps to one of
/// these variants, each with a stable numeric [`code`](RecorderError::code)
/// and [`name`](RecorderError::name).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("not currently recording")]
    NotRecording,

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("failed to start recording: {0}")]
    StartFailed(String),

    #[error("failed to stop recording: {0}")]
    StopFailed(String),

    #[error("failed to pause recording: {0}")]
    PauseFailed(String),

    #[error("failed to resume recording: {0}")]
    ResumeFailed(String),

    #[error("pause is not supported by the active backend")]
    PauseNotSupported,

    #[error("resume is not supported by the active backend")]
    ResumeNotSupported,

    #[error("recording is not paused")]
    NotPaused,

    #[error("failed to write audio data: {0}")]
    WriteFailed(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("file error: {0}")]
    FileError(String),
}

impl RecorderError {
    /// Stable numeric code, suitable for crossing a language boundary.
    pub fn code(&self) -> u16 {
        match self {
            Self::PermissionDenied => 1,
            Self::AlreadyRecording => 2,
            Self::NotRecording => 3,
            Self::InvalidState(_) => 4,
            Self::StartFailed(_) => 5,
            Self::StopFailed(_) => 6,
            Self::PauseFailed(_) => 7,
            Self::ResumeFailed(_) => 8,
            Self::PauseNotSupported => 9,
            Self::ResumeNotSupported => 10,
            Self::NotPaused => 11,
            Self::WriteFailed(_) => 12,
            Self::ConfigurationFailed(_) => 13,
            Self::FileError(_) => 14,
        }
    }

    /// Stable symbolic name of the error kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::AlreadyRecording => "ALREADY_RECORDING",
            Self::NotRecording => "NOT_RECORDING",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::StartFailed(_) => "START_FAILED",
            Self::StopFailed(_) => "STOP_FAILED",
            Self::PauseFailed(_) => "PAUSE_FAILED",
            Self::ResumeFailed(_) => "RESUME_FAILED",
            Self::PauseNotSupported => "PAUSE_NOT_SUPPORTED",
            Self::ResumeNotSupported => "RESUME_NOT_SUPPORTED",
            Self::NotPaused => "NOT_PAUSED",
            Self::WriteFailed(_) => "WRITE_FAILED",
            Self::ConfigurationFailed(_) => "CONFIGURATION_FAILED",
            Self::FileError(_) => "FILE_ERROR",
        }
    }

    /// Whether this error was raised by a precondition check rather than by
    /// a backend or I/O failure. Precondition errors never change state.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied
                | Self::AlreadyRecording
                | Self::NotRecording
                | Self::InvalidState(_)
                | Self::PauseNotSupported
                | Self::ResumeNotSupported
                | Self::NotPaused
        )
    }
}
