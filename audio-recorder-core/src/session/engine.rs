use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use crate::models::audio_models::{BackendKind, RecorderEvent, RecorderStatus};
use crate::models::config::RecordingConfiguration;
use crate::models::error::RecorderError;
use crate::models::format::{AudioFormat, PlatformCapabilities, Quality};
use crate::models::options::RecordingOptions;
use crate::models::preset::Preset;
use crate::models::state::RecorderState;
use crate::traits::listener::{self, RecorderListener};
use crate::traits::permission::PermissionOracle;
use crate::traits::platform::AudioPlatform;

use super::settings::{EngineSettings, OutputRequest};
use super::worker::{Command, Shared, Snapshot, Worker};

/// Recording session engine.
///
/// A cheap handle in front of the `recorder-worker` thread, which owns the
/// platform, the state machine and the active session:
///
/// ```text
/// caller ──Command──▶ [recorder-worker] ──RecorderEvent──▶ dispatch_events() ──▶ listener
///                           │
///                           └─ publishes Snapshot (state, path) before each event
/// ```
///
/// Control calls never block on the platform. Commands are applied in the
/// order they are submitted, each against the state the previous one left.
/// When no command is in flight, precondition failures are returned
/// directly; otherwise the worker reports them as [`RecorderEvent::Error`]
/// and leaves the state untouched.
///
/// Dropping the engine stops and finalizes any active recording.
pub struct RecorderEngine {
    shared: Arc<Shared>,
    capabilities: PlatformCapabilities,
    permission: Arc<dyn PermissionOracle>,
    commands: Option<Sender<Command>>,
    events: Receiver<RecorderEvent>,
    listener: Mutex<Option<Box<dyn RecorderListener>>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl RecorderEngine {
    pub fn new(
        platform: Box<dyn AudioPlatform>,
        permission: Arc<dyn PermissionOracle>,
        settings: EngineSettings,
    ) -> Result<Self, RecorderError> {
        let capabilities = platform.capabilities();
        let configuration = RecordingConfiguration::with_format(AudioFormat::Aac, Quality::High, &capabilities);
        let shared = Arc::new(Shared::new(configuration.clone()));

        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let worker = Worker::new(platform, settings, configuration, Arc::clone(&shared), command_rx, event_tx);

        let handle = thread::Builder::new()
            .name("recorder-worker".into())
            .spawn(move || worker.run())
            .map_err(|e| RecorderError::ConfigurationFailed(format!("failed to spawn recorder worker: {}", e)))?;

        log::debug!(
            "recorder engine ready (delegated encoder: {}, pause: {})",
            capabilities.delegated_encoder,
            capabilities.pause_resume
        );
        Ok(Self {
            shared,
            capabilities,
            permission,
            commands: Some(command_tx),
            events: event_rx,
            listener: Mutex::new(None),
            worker: Some(handle),
        })
    }

    /// Register the listener. Replaces any previous one.
    pub fn set_listener(&self, listener: impl RecorderListener + 'static) {
        *self.listener.lock() = Some(Box::new(listener));
    }

    pub fn clear_listener(&self) {
        self.listener.lock().take();
    }

    /// Replace the configuration used by the next session.
    ///
    /// Rejected with `InvalidState` while a session is active.
    pub fn configure(&self, config: RecordingConfiguration) -> Result<(), RecorderError> {
        self.check_settled(|snapshot| {
            if snapshot.state.is_active() {
                return Err(RecorderError::InvalidState(format!(
                    "cannot configure while {}",
                    snapshot.state
                )));
            }
            Ok(())
        })?;
        config.validate()?;
        self.send(Command::Configure(Box::new(config)))
    }

    pub fn use_preset(&self, preset: Preset) -> Result<(), RecorderError> {
        log::debug!("using preset {}", preset.name());
        self.configure(RecordingConfiguration::from_preset(preset, &self.capabilities))
    }

    /// Start recording with the current configuration.
    ///
    /// `None` generates a timestamped file name under the recordings
    /// directory. Permission is checked before anything is queued.
    pub fn start(&self, output: Option<PathBuf>) -> Result<(), RecorderError> {
        let output = output.map(OutputRequest::Path).unwrap_or_default();
        self.request_start(output, None)
    }

    /// Resolve `options` to a configuration and start with it.
    pub fn start_with_options(&self, options: &RecordingOptions) -> Result<(), RecorderError> {
        let config = options.resolve(&self.capabilities);
        config.validate()?;
        let output = options
            .file_name
            .clone()
            .map(OutputRequest::Named)
            .unwrap_or_default();
        self.request_start(output, Some(Box::new(config)))
    }

    pub fn stop(&self) -> Result<(), RecorderError> {
        self.check_settled(|snapshot| {
            if !snapshot.state.is_active() {
                return Err(RecorderError::NotRecording);
            }
            Ok(())
        })?;
        self.send(Command::Stop)
    }

    /// Pause the active session. Only the delegated backend can pause.
    pub fn pause(&self) -> Result<(), RecorderError> {
        if !self.capabilities.pause_resume {
            return Err(RecorderError::PauseNotSupported);
        }
        self.check_settled(|snapshot| {
            if snapshot.state != RecorderState::Recording {
                return Err(RecorderError::NotRecording);
            }
            if snapshot.backend == Some(BackendKind::Raw) {
                return Err(RecorderError::PauseNotSupported);
            }
            Ok(())
        })?;
        self.send(Command::Pause)
    }

    pub fn resume(&self) -> Result<(), RecorderError> {
        if !self.capabilities.pause_resume {
            return Err(RecorderError::ResumeNotSupported);
        }
        self.check_settled(|snapshot| {
            if snapshot.state != RecorderState::Paused {
                return Err(RecorderError::NotPaused);
            }
            if snapshot.backend == Some(BackendKind::Raw) {
                return Err(RecorderError::ResumeNotSupported);
            }
            Ok(())
        })?;
        self.send(Command::Resume)
    }

    /// State as of the last completed transition.
    pub fn state(&self) -> RecorderState {
        self.shared.snapshot.lock().state
    }

    /// File of the active session, or of the last one that ended.
    pub fn current_recording_path(&self) -> Option<PathBuf> {
        self.shared.snapshot.lock().current_path.clone()
    }

    pub fn status(&self) -> RecorderStatus {
        self.shared.snapshot.lock().status()
    }

    /// Configuration as last applied by the worker.
    pub fn configuration(&self) -> RecordingConfiguration {
        self.shared.snapshot.lock().configuration.clone()
    }

    pub fn capabilities(&self) -> PlatformCapabilities {
        self.capabilities
    }

    /// No submitted command is still waiting to be applied.
    pub fn is_settled(&self) -> bool {
        self.shared.is_settled()
    }

    /// Block until every submitted command has been applied, or `timeout`.
    pub fn wait_until_settled(&self, timeout: Duration) -> bool {
        self.shared.wait_settled(timeout)
    }

    /// Deliver every queued event to the listener on the calling thread.
    ///
    /// Returns the number delivered. Without a listener nothing is drained,
    /// so events stay available to [`try_next_event`](Self::try_next_event).
    pub fn dispatch_events(&self) -> usize {
        let Some(mut current) = self.listener.lock().take() else {
            return 0;
        };

        let mut delivered = 0;
        while let Ok(event) = self.events.try_recv() {
            listener::deliver(current.as_mut(), &event);
            delivered += 1;
            // A listener registered from inside a callback takes the rest.
            if let Some(newer) = self.listener.lock().take() {
                current = newer;
            }
        }

        let mut slot = self.listener.lock();
        if slot.is_none() {
            *slot = Some(current);
        }
        delivered
    }

    pub fn try_next_event(&self) -> Option<RecorderEvent> {
        self.events.try_recv().ok()
    }

    pub fn next_event_timeout(&self, timeout: Duration) -> Option<RecorderEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    // --- Internal helpers ---

    fn request_start(
        &self,
        output: OutputRequest,
        config: Option<Box<RecordingConfiguration>>,
    ) -> Result<(), RecorderError> {
        if !self.permission.has_record_permission() {
            log::warn!("start refused: no record permission");
            return Err(RecorderError::PermissionDenied);
        }
        self.check_settled(|snapshot| {
            if snapshot.state.is_active() {
                return Err(RecorderError::AlreadyRecording);
            }
            Ok(())
        })?;
        self.send(Command::Start { output, config })
    }

    /// Run `check` against the snapshot when nothing is in flight.
    ///
    /// With commands queued the snapshot is stale; the worker re-checks.
    fn check_settled(
        &self,
        check: impl FnOnce(&Snapshot) -> Result<(), RecorderError>,
    ) -> Result<(), RecorderError> {
        if !self.shared.is_settled() {
            return Ok(());
        }
        let snapshot = self.shared.snapshot.lock();
        check(&snapshot)
    }

    fn send(&self, command: Command) -> Result<(), RecorderError> {
        let sender = self
            .commands
            .as_ref()
            .ok_or_else(|| RecorderError::InvalidState("recorder is shutting down".into()))?;

        self.shared.begin_command();
        if sender.send(command).is_err() {
            self.shared.finish_command();
            return Err(RecorderError::InvalidState("recorder worker is not running".into()));
        }
        Ok(())
    }
}

impl Drop for RecorderEngine {
    fn drop(&mut self) {
        self.commands.take();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::error!("recorder worker panicked");
            }
        }
        self.dispatch_events();
    }
}
