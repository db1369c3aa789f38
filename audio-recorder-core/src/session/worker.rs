use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::{Condvar, Mutex};

use crate::models::audio_models::{BackendKind, RecorderEvent, RecorderStatus};
use crate::models::config::RecordingConfiguration;
use crate::models::error::RecorderError;
use crate::models::format::PlatformCapabilities;
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::models::state::RecorderState;
use crate::storage::metadata::write_metadata;
use crate::traits::platform::AudioPlatform;

use super::backend::{CaptureBackend, DelegatedBackend, Pump, RawBackend};
use super::level_monitor::LevelMonitor;
use super::settings::{EngineSettings, OutputRequest};

/// Back-off when the raw input had nothing to deliver.
const RAW_IDLE_BACKOFF: Duration = Duration::from_millis(5);

/// Requests sent from [`RecorderEngine`](super::engine::RecorderEngine) to the worker.
#[derive(Debug)]
pub(crate) enum Command {
    Configure(Box<RecordingConfiguration>),
    Start {
        output: OutputRequest,
        /// Applied before starting, as part of the same transition.
        config: Option<Box<RecordingConfiguration>>,
    },
    Stop,
    Pause,
    Resume,
}

/// What the engine handle can read without asking the worker.
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    pub state: RecorderState,
    pub current_path: Option<PathBuf>,
    pub backend: Option<BackendKind>,
    pub configuration: RecordingConfiguration,
}

impl Snapshot {
    pub(crate) fn status(&self) -> RecorderStatus {
        RecorderStatus {
            state: self.state,
            is_recording: self.state.is_recording(),
            is_paused: self.state.is_paused(),
            current_file_path: self.current_path.clone(),
            backend: self.backend,
        }
    }
}

/// State shared between the engine handle and the worker.
pub(crate) struct Shared {
    pub snapshot: Mutex<Snapshot>,
    /// Commands sent but not yet fully applied.
    pending: AtomicUsize,
    settle_lock: Mutex<()>,
    settled: Condvar,
}

impl Shared {
    pub(crate) fn new(configuration: RecordingConfiguration) -> Self {
        Self {
            snapshot: Mutex::new(Snapshot {
                state: RecorderState::Idle,
                current_path: None,
                backend: None,
                configuration,
            }),
            pending: AtomicUsize::new(0),
            settle_lock: Mutex::new(()),
            settled: Condvar::new(),
        }
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.pending.load(Ordering::SeqCst) == 0
    }

    pub(crate) fn begin_command(&self) {
        self.pending.fetch_add(1, Ordering::SeqCst);
    }

    /// Mark one command applied (or abandoned), waking waiters at zero.
    pub(crate) fn finish_command(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _guard = self.settle_lock.lock();
            self.settled.notify_all();
        }
    }

    /// Block until no command is pending, or `timeout`.
    pub(crate) fn wait_settled(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.settle_lock.lock();
        while !self.is_settled() {
            if self.settled.wait_until(&mut guard, deadline).timed_out() {
                return self.is_settled();
            }
        }
        true
    }
}

/// One recording in progress.
struct ActiveSession {
    path: PathBuf,
    config: RecordingConfiguration,
    backend: CaptureBackend,
    monitor: LevelMonitor,
    started_at: Instant,
    paused_total: Duration,
    paused_at: Option<Instant>,
}

impl ActiveSession {
    /// Wall time spent recording, excluding pauses.
    fn active_duration(&self) -> Duration {
        let mut paused = self.paused_total;
        if let Some(at) = self.paused_at {
            paused += at.elapsed();
        }
        self.started_at.elapsed().saturating_sub(paused)
    }
}

enum Next {
    Command(Command),
    Idle,
    Disconnected,
}

/// Owns the platform, the configuration, the state machine and the active
/// session. Runs on the `recorder-worker` thread until the command channel
/// disconnects.
///
/// ```text
/// raw + recording     → try_recv, else pump one chunk
/// level monitor armed → recv_timeout(until next poll)
/// otherwise           → recv
/// ```
pub(crate) struct Worker {
    platform: Box<dyn AudioPlatform>,
    capabilities: PlatformCapabilities,
    settings: EngineSettings,
    config: RecordingConfiguration,
    state: RecorderState,
    session: Option<ActiveSession>,
    shared: Arc<Shared>,
    commands: Receiver<Command>,
    events: Sender<RecorderEvent>,
}

impl Worker {
    pub(crate) fn new(
        platform: Box<dyn AudioPlatform>,
        settings: EngineSettings,
        config: RecordingConfiguration,
        shared: Arc<Shared>,
        commands: Receiver<Command>,
        events: Sender<RecorderEvent>,
    ) -> Self {
        let capabilities = platform.capabilities();
        Self {
            platform,
            capabilities,
            settings,
            config,
            state: RecorderState::Idle,
            session: None,
            shared,
            commands,
            events,
        }
    }

    pub(crate) fn run(mut self) {
        log::debug!("recorder worker running");
        loop {
            match self.next() {
                Next::Command(command) => {
                    self.handle(command);
                    self.shared.finish_command();
                }
                Next::Idle => {}
                Next::Disconnected => break,
            }
        }
        self.shutdown();
        log::debug!("recorder worker exited");
    }

    fn next(&mut self) -> Next {
        if self.is_pumping() {
            return match self.commands.try_recv() {
                Ok(command) => Next::Command(command),
                Err(TryRecvError::Empty) => {
                    self.pump_raw();
                    Next::Idle
                }
                Err(TryRecvError::Disconnected) => Next::Disconnected,
            };
        }

        if let Some(deadline) = self.level_deadline() {
            let timeout = deadline.saturating_duration_since(Instant::now());
            return match self.commands.recv_timeout(timeout) {
                Ok(command) => Next::Command(command),
                Err(RecvTimeoutError::Timeout) => {
                    self.poll_level();
                    Next::Idle
                }
                Err(RecvTimeoutError::Disconnected) => Next::Disconnected,
            };
        }

        match self.commands.recv() {
            Ok(command) => Next::Command(command),
            Err(_) => Next::Disconnected,
        }
    }

    fn handle(&mut self, command: Command) {
        log::debug!("applying {:?} in state {}", command, self.state);
        let result = match command {
            Command::Configure(config) => self.configure(*config),
            Command::Start { output, config } => self.start(output, config.map(|c| *c)),
            Command::Stop => self.stop(),
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
        };
        if let Err(error) = result {
            log::error!("{}", error);
            self.emit(RecorderEvent::Error(error));
        }
    }

    // --- Transitions ---

    fn configure(&mut self, config: RecordingConfiguration) -> Result<(), RecorderError> {
        if self.state.is_active() {
            return Err(RecorderError::InvalidState(format!(
                "cannot configure while {}",
                self.state
            )));
        }
        config.validate()?;
        log::info!("configured: {}", config.description());
        self.config = config;
        self.shared.snapshot.lock().configuration = self.config.clone();
        Ok(())
    }

    fn start(
        &mut self,
        output: OutputRequest,
        config: Option<RecordingConfiguration>,
    ) -> Result<(), RecorderError> {
        if self.state.is_active() {
            return Err(RecorderError::AlreadyRecording);
        }
        if let Some(config) = config {
            self.configure(config)?;
        }

        let config = self.config.clone();
        let path = match self.settings.resolve_output(&output, &config) {
            Ok(path) => path,
            Err(e) => return Err(self.fail(e, None)),
        };

        let backend = if config.use_delegated_encoder {
            DelegatedBackend::start(self.platform.as_mut(), &config.encoder_params(), &path)
                .map(CaptureBackend::Delegated)
        } else {
            RawBackend::start(
                self.platform.as_mut(),
                config.stream_params(),
                &path,
                config.enable_level_monitoring,
            )
            .map(CaptureBackend::Raw)
        };
        let backend = match backend {
            Ok(backend) => backend,
            Err(e) => return Err(self.fail(e, Some(path))),
        };

        let now = Instant::now();
        let mut monitor = LevelMonitor::default();
        if config.enable_level_monitoring && matches!(backend, CaptureBackend::Delegated(_)) {
            monitor.start(now);
        }

        let kind = backend.kind();
        log::info!("recording started ({:?}): {}", kind, path.display());
        self.session = Some(ActiveSession {
            path: path.clone(),
            config,
            backend,
            monitor,
            started_at: now,
            paused_total: Duration::ZERO,
            paused_at: None,
        });
        self.transition(RecorderState::Recording, Some(path.clone()), Some(kind));
        self.emit(RecorderEvent::Started { path });
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        let Some(mut session) = self.session.take() else {
            return Err(RecorderError::NotRecording);
        };
        session.monitor.stop();
        let elapsed = session.active_duration();
        let kind = session.backend.kind();

        let finished = match session.backend {
            CaptureBackend::Delegated(backend) => backend.stop(self.platform.as_ref(), &session.path),
            CaptureBackend::Raw(backend) => {
                log::debug!("stopping raw capture after {} data bytes", backend.data_bytes());
                backend.stop()
            }
        };
        let finished = match finished {
            Ok(finished) => finished,
            Err(e) => {
                self.transition(RecorderState::Error, Some(session.path), Some(kind));
                return Err(e);
            }
        };

        let result = RecordingResult {
            file_path: session.path.clone(),
            duration_ms: finished.duration_ms.unwrap_or(elapsed.as_millis() as u64),
            size_bytes: finished.size_bytes,
            backend: kind,
            checksum: finished.checksum,
        };

        if self.settings.write_metadata {
            let metadata = RecordingMetadata::new(&result, &session.config);
            if let Err(e) = write_metadata(&metadata, &result.file_path) {
                log::warn!("metadata sidecar not written: {}", e);
            }
        }

        log::info!(
            "recording stopped: {} ({} ms, {} bytes)",
            result.file_path.display(),
            result.duration_ms,
            result.size_bytes
        );
        self.transition(RecorderState::Stopped, Some(session.path), Some(kind));
        self.emit(RecorderEvent::Stopped(result));
        Ok(())
    }

    fn pause(&mut self) -> Result<(), RecorderError> {
        if !self.capabilities.pause_resume {
            return Err(RecorderError::PauseNotSupported);
        }
        if self.state != RecorderState::Recording {
            return Err(RecorderError::NotRecording);
        }
        let Some(session) = self.session.as_mut() else {
            return Err(RecorderError::NotRecording);
        };
        let CaptureBackend::Delegated(backend) = &mut session.backend else {
            return Err(RecorderError::PauseNotSupported);
        };

        if let Err(e) = backend.pause() {
            return Err(self.abort_session(e));
        }
        session.monitor.stop();
        session.paused_at = Some(Instant::now());

        let path = session.path.clone();
        log::info!("recording paused");
        self.transition(RecorderState::Paused, Some(path), Some(BackendKind::Delegated));
        self.emit(RecorderEvent::Paused);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), RecorderError> {
        if !self.capabilities.pause_resume {
            return Err(RecorderError::ResumeNotSupported);
        }
        if self.state != RecorderState::Paused {
            return Err(RecorderError::NotPaused);
        }
        let Some(session) = self.session.as_mut() else {
            return Err(RecorderError::NotPaused);
        };
        let CaptureBackend::Delegated(backend) = &mut session.backend else {
            return Err(RecorderError::ResumeNotSupported);
        };

        if let Err(e) = backend.resume() {
            return Err(self.abort_session(e));
        }
        if let Some(at) = session.paused_at.take() {
            session.paused_total += at.elapsed();
        }
        if session.config.enable_level_monitoring {
            session.monitor.start(Instant::now());
        }

        let path = session.path.clone();
        log::info!("recording resumed");
        self.transition(RecorderState::Recording, Some(path), Some(BackendKind::Delegated));
        self.emit(RecorderEvent::Resumed);
        Ok(())
    }

    // --- Between commands ---

    fn is_pumping(&self) -> bool {
        self.state == RecorderState::Recording
            && matches!(
                self.session.as_ref().map(|s| &s.backend),
                Some(CaptureBackend::Raw(_))
            )
    }

    fn level_deadline(&self) -> Option<Instant> {
        self.session.as_ref().and_then(|s| s.monitor.deadline())
    }

    fn pump_raw(&mut self) {
        let Some(CaptureBackend::Raw(backend)) = self.session.as_mut().map(|s| &mut s.backend) else {
            return;
        };
        match backend.pump() {
            Ok(Pump::Idle) => thread::sleep(RAW_IDLE_BACKOFF),
            Ok(Pump::Wrote { bytes, level }) => {
                log::trace!("raw chunk: {} bytes", bytes);
                if let Some(level) = level {
                    self.emit(RecorderEvent::Level(level));
                }
            }
            Err(e) => {
                log::error!("raw capture failed: {}", e);
                let error = self.abort_session(e);
                self.emit(RecorderEvent::Error(error));
            }
        }
    }

    fn poll_level(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let CaptureBackend::Delegated(backend) = &mut session.backend else {
            return;
        };
        if let Some(level) = session.monitor.poll(Instant::now(), || backend.amplitude()) {
            self.emit(RecorderEvent::Level(level));
        }
    }

    // --- Helpers ---

    /// Release the active session after a backend failure and enter `Error`.
    fn abort_session(&mut self, error: RecorderError) -> RecorderError {
        match self.session.take() {
            Some(session) => {
                let kind = session.backend.kind();
                session.backend.abort();
                self.fail_with(error, Some(session.path), Some(kind))
            }
            None => self.fail(error, None),
        }
    }

    fn fail(&mut self, error: RecorderError, path: Option<PathBuf>) -> RecorderError {
        self.fail_with(error, path, None)
    }

    fn fail_with(
        &mut self,
        error: RecorderError,
        path: Option<PathBuf>,
        backend: Option<BackendKind>,
    ) -> RecorderError {
        self.transition(RecorderState::Error, path, backend);
        error
    }

    /// Publish before notifying, so listeners observe the new state.
    fn transition(&mut self, state: RecorderState, path: Option<PathBuf>, backend: Option<BackendKind>) {
        if self.state != state {
            log::debug!("state {} -> {}", self.state, state);
        }
        self.state = state;
        let mut snapshot = self.shared.snapshot.lock();
        snapshot.state = state;
        snapshot.current_path = path;
        snapshot.backend = backend;
    }

    fn emit(&self, event: RecorderEvent) {
        // The engine owns the receiver; a send only fails while it is dropping.
        let _ = self.events.send(event);
    }

    fn shutdown(&mut self) {
        if self.session.is_some() {
            log::info!("engine dropped while recording; finalizing");
            if let Err(e) = self.stop() {
                log::warn!("stop during shutdown failed: {}", e);
            }
        }
    }
}
