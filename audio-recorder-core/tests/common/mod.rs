#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use audio_recorder_core::{
    AudioPlatform, DelegatedEncoder, EncoderParams, EngineSettings, InputStream, PlatformCapabilities,
    RecorderEngine, RecorderError, RecorderEvent, RecorderListener, RecordingResult, StaticPermission,
    StreamParams,
};

pub const SETTLE: Duration = Duration::from_secs(5);

/// Bytes a mock encoder leaves in its output file on stop.
pub const ENCODED_FILE_BYTES: usize = 2048;

/// Counters shared between a test and the mocks it scripted.
#[derive(Default)]
pub struct Calls {
    pub encoders_created: AtomicUsize,
    pub configured: AtomicUsize,
    pub started: AtomicUsize,
    pub stopped: AtomicUsize,
    pub paused: AtomicUsize,
    pub resumed: AtomicUsize,
    pub released: AtomicUsize,
    pub streams_opened: AtomicUsize,
    pub stream_reads: AtomicUsize,
    pub streams_released: AtomicUsize,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Behavior the mocks follow.
#[derive(Clone)]
pub struct Script {
    pub fail_configure: bool,
    pub fail_start: bool,
    pub fail_pause: bool,
    pub fail_stop: bool,
    /// Encoder reports a clean stop but writes no file.
    pub skip_output: bool,
    /// What the platform reads back from a finished encoder container.
    pub container_duration_ms: Option<u64>,
    pub amplitude: i32,
    pub min_buffer: Result<usize, RecorderError>,
    /// Sample value every raw chunk is filled with (16-bit).
    pub sample: i16,
    /// Chunks delivered before the stream runs dry.
    pub chunks: usize,
    /// Fail the read after this many chunks.
    pub fail_read_after: Option<usize>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            fail_configure: false,
            fail_start: false,
            fail_pause: false,
            fail_stop: false,
            skip_output: false,
            container_duration_ms: None,
            amplitude: 0,
            min_buffer: Ok(1024),
            sample: 1000,
            chunks: 4,
            fail_read_after: None,
        }
    }
}

pub struct MockPlatform {
    pub capabilities: PlatformCapabilities,
    pub calls: Arc<Calls>,
    pub script: Arc<Mutex<Script>>,
}

impl AudioPlatform for MockPlatform {
    fn capabilities(&self) -> PlatformCapabilities {
        self.capabilities
    }

    fn create_encoder(&mut self) -> Result<Box<dyn DelegatedEncoder>, RecorderError> {
        self.calls.encoders_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockEncoder {
            calls: Arc::clone(&self.calls),
            script: Arc::clone(&self.script),
            output: None,
        }))
    }

    fn min_buffer_size(&self, _params: &StreamParams) -> Result<usize, RecorderError> {
        self.script.lock().min_buffer.clone()
    }

    fn open_input(&mut self, params: &StreamParams) -> Result<Box<dyn InputStream>, RecorderError> {
        self.calls.streams_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockStream {
            calls: Arc::clone(&self.calls),
            script: self.script.lock().clone(),
            encoding: params.encoding,
            delivered: 0,
        }))
    }

    fn container_duration_ms(&self, _path: &Path) -> Option<u64> {
        self.script.lock().container_duration_ms
    }
}

pub struct MockEncoder {
    calls: Arc<Calls>,
    script: Arc<Mutex<Script>>,
    output: Option<PathBuf>,
}

impl DelegatedEncoder for MockEncoder {
    fn configure(&mut self, _params: &EncoderParams, output: &Path) -> Result<(), RecorderError> {
        self.calls.configured.fetch_add(1, Ordering::SeqCst);
        if self.script.lock().fail_configure {
            return Err(RecorderError::StartFailed("encoder rejected parameters".into()));
        }
        self.output = Some(output.to_path_buf());
        Ok(())
    }

    fn start(&mut self) -> Result<(), RecorderError> {
        if self.script.lock().fail_start {
            return Err(RecorderError::StartFailed("device busy".into()));
        }
        self.calls.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        self.calls.stopped.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().clone();
        if script.fail_stop {
            return Err(RecorderError::StopFailed("encoder stop failed".into()));
        }
        if script.skip_output {
            return Ok(());
        }
        if let Some(path) = &self.output {
            fs::write(path, vec![0x5a; ENCODED_FILE_BYTES])
                .map_err(|e| RecorderError::StopFailed(e.to_string()))?;
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<(), RecorderError> {
        if self.script.lock().fail_pause {
            return Err(RecorderError::PauseFailed("encoder refused".into()));
        }
        self.calls.paused.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), RecorderError> {
        self.calls.resumed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&mut self) {
        self.calls.released.fetch_add(1, Ordering::SeqCst);
    }

    fn amplitude(&mut self) -> i32 {
        self.script.lock().amplitude
    }
}

pub struct MockStream {
    calls: Arc<Calls>,
    script: Script,
    encoding: audio_recorder_core::SampleEncoding,
    delivered: usize,
}

impl InputStream for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, RecorderError> {
        if let Some(limit) = self.script.fail_read_after {
            if self.delivered >= limit {
                return Err(RecorderError::WriteFailed("input overrun".into()));
            }
        }
        if self.delivered >= self.script.chunks {
            return Ok(0);
        }
        let sample = self.script.sample.to_le_bytes();
        match self.encoding {
            audio_recorder_core::SampleEncoding::Pcm16 => {
                for pair in buf.chunks_exact_mut(2) {
                    pair.copy_from_slice(&sample);
                }
            }
            _ => buf.fill(0),
        }
        self.delivered += 1;
        self.calls.stream_reads.fetch_add(1, Ordering::SeqCst);
        Ok(buf.len())
    }

    fn stop(&mut self) {}

    fn release(&mut self) {
        self.calls.streams_released.fetch_add(1, Ordering::SeqCst);
    }
}

/// An engine over a mock platform, recording into a scratch directory.
pub struct Harness {
    pub engine: RecorderEngine,
    pub calls: Arc<Calls>,
    pub script: Arc<Mutex<Script>>,
    pub dir: tempfile::TempDir,
}

impl Harness {
    pub fn new(capabilities: PlatformCapabilities) -> Self {
        Self::build(capabilities, Script::default(), true, false)
    }

    pub fn build(capabilities: PlatformCapabilities, script: Script, permission: bool, write_metadata: bool) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let calls = Arc::new(Calls::default());
        let script = Arc::new(Mutex::new(script));
        let platform = MockPlatform {
            capabilities,
            calls: Arc::clone(&calls),
            script: Arc::clone(&script),
        };
        let settings = EngineSettings {
            recordings_dir: dir.path().join("Recordings"),
            write_metadata,
        };
        let engine = RecorderEngine::new(Box::new(platform), Arc::new(StaticPermission(permission)), settings)
            .expect("engine");
        Self {
            engine,
            calls,
            script,
            dir,
        }
    }

    pub fn settle(&self) {
        assert!(self.engine.wait_until_settled(SETTLE), "engine did not settle");
    }

    /// Settle, then collect every event queued so far.
    pub fn drain(&self) -> Vec<RecorderEvent> {
        self.settle();
        std::iter::from_fn(|| self.engine.try_next_event()).collect()
    }

    /// Wait for the first event matching `pred`, discarding others.
    pub fn wait_for(&self, pred: impl Fn(&RecorderEvent) -> bool) -> RecorderEvent {
        let deadline = Instant::now() + SETTLE;
        while Instant::now() < deadline {
            if let Some(event) = self.engine.next_event_timeout(Duration::from_millis(50)) {
                if pred(&event) {
                    return event;
                }
            }
        }
        panic!("timed out waiting for event");
    }

    pub fn wait_for_reads(&self, reads: usize) {
        let deadline = Instant::now() + SETTLE;
        while Calls::get(&self.calls.stream_reads) < reads {
            assert!(Instant::now() < deadline, "stream was not read");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

pub fn non_level(events: Vec<RecorderEvent>) -> Vec<RecorderEvent> {
    events
        .into_iter()
        .filter(|e| !matches!(e, RecorderEvent::Level(_)))
        .collect()
}

pub fn stopped_result(events: &[RecorderEvent]) -> Option<RecordingResult> {
    events.iter().find_map(|e| match e {
        RecorderEvent::Stopped(result) => Some(result.clone()),
        _ => None,
    })
}

/// Listener that records what it was told.
#[derive(Clone, Default)]
pub struct Recorded {
    pub log: Arc<Mutex<Vec<String>>>,
    pub tag: &'static str,
}

impl RecorderListener for Recorded {
    fn on_started(&mut self, path: &Path) {
        self.log.lock().push(format!("{}:started:{}", self.tag, path.display()));
    }

    fn on_stopped(&mut self, result: &RecordingResult) {
        self.log.lock().push(format!("{}:stopped:{}", self.tag, result.size_bytes));
    }

    fn on_error(&mut self, error: &RecorderError) {
        self.log.lock().push(format!("{}:error:{}", self.tag, error.name()));
    }
}
