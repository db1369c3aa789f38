use std::path::Path;

use crate::models::audio_models::{AudioLevel, RecorderEvent};
use crate::models::error::RecorderError;
use crate::models::recording_result::RecordingResult;

/// Receiver for engine notifications.
///
/// Called from [`RecorderEngine::dispatch_events`](crate::session::engine::RecorderEngine::dispatch_events),
/// on whichever thread drains events. Never called from the worker.
pub trait RecorderListener: Send {
    fn on_started(&mut self, path: &Path);

    fn on_stopped(&mut self, result: &RecordingResult);

    fn on_paused(&mut self) {}

    fn on_resumed(&mut self) {}

    fn on_level(&mut self, _level: AudioLevel) {}

    fn on_error(&mut self, error: &RecorderError);
}

/// Route one event to the matching listener method.
pub fn deliver(listener: &mut dyn RecorderListener, event: &RecorderEvent) {
    match event {
        RecorderEvent::Started { path } => listener.on_started(path),
        RecorderEvent::Stopped(result) => listener.on_stopped(result),
        RecorderEvent::Paused => listener.on_paused(),
        RecorderEvent::Resumed => listener.on_resumed(),
        RecorderEvent::Level(level) => listener.on_level(*level),
        RecorderEvent::Error(error) => listener.on_error(error),
    }
}
