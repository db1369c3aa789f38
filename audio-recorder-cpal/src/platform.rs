//! cpal-backed [`AudioPlatform`].
//!
//! `cpal::Stream` is not `Send` on every host, so each input stream lives on
//! its own `cpal-input` thread. The data callback converts to `f32`, remixes
//! to the requested channel count and pushes into a shared [`RingBuffer`];
//! [`CpalInputStream::read`] drains it and encodes to the requested PCM
//! layout on the recorder's worker thread.
//!
//! ```text
//! [cpal callback] → f32 → remix → [RingBuffer] → read() → PCM bytes
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, SupportedBufferSize, SupportedStreamConfig};
use parking_lot::Mutex;

use audio_recorder_core::models::config::StreamParams;
use audio_recorder_core::models::error::RecorderError;
use audio_recorder_core::models::format::{PlatformCapabilities, SampleEncoding};
use audio_recorder_core::processing::pcm::{encode_samples, remix_channels};
use audio_recorder_core::processing::ring_buffer::RingBuffer;
use audio_recorder_core::traits::encoder::DelegatedEncoder;
use audio_recorder_core::traits::input_stream::InputStream;
use audio_recorder_core::traits::platform::AudioPlatform;

use crate::devices::find_input_device;

/// Seconds of audio the ring buffer holds before dropping the oldest samples.
const BUFFER_SECONDS: usize = 2;

/// Buffer size assumed when the host does not report one.
const FALLBACK_BUFFER_MS: usize = 20;

const STOP_POLL: Duration = Duration::from_millis(10);

/// Raw capture from a cpal input device.
#[derive(Debug, Clone, Default)]
pub struct CpalPlatform {
    device_name: Option<String>,
}

impl CpalPlatform {
    /// Capture from the host's default input device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture from the input device with this name.
    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }
}

impl AudioPlatform for CpalPlatform {
    fn capabilities(&self) -> PlatformCapabilities {
        PlatformCapabilities::raw_only()
    }

    fn create_encoder(&mut self) -> Result<Box<dyn DelegatedEncoder>, RecorderError> {
        Err(RecorderError::StartFailed("cpal provides no delegated encoder".into()))
    }

    fn min_buffer_size(&self, params: &StreamParams) -> Result<usize, RecorderError> {
        let device = find_input_device(self.device_name.as_deref())
            .map_err(|e| RecorderError::ConfigurationFailed(e.to_string()))?;
        let config = find_input_config(&device, params)?;

        let frames = match config.buffer_size() {
            SupportedBufferSize::Range { min, .. } => *min as usize,
            SupportedBufferSize::Unknown => params.sample_rate as usize * FALLBACK_BUFFER_MS / 1000,
        };
        Ok(frames.max(1) * params.frame_size())
    }

    fn open_input(&mut self, params: &StreamParams) -> Result<Box<dyn InputStream>, RecorderError> {
        let capacity = params.sample_rate as usize * params.channels as usize * BUFFER_SECONDS;
        let buffer = Arc::new(Mutex::new(RingBuffer::new(capacity)));
        let running = Arc::new(AtomicBool::new(true));
        let failure = Arc::new(Mutex::new(None));
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        let handle = {
            let device_name = self.device_name.clone();
            let params = *params;
            let buffer = Arc::clone(&buffer);
            let running = Arc::clone(&running);
            let failure = Arc::clone(&failure);
            thread::Builder::new()
                .name("cpal-input".into())
                .spawn(move || {
                    capture_thread(device_name, params, buffer, running, failure, ready_tx);
                })
                .map_err(|e| RecorderError::StartFailed(format!("failed to spawn input thread: {}", e)))?
        };

        let started = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(RecorderError::StartFailed("input thread exited during startup".into())));
        if let Err(e) = started {
            running.store(false, Ordering::SeqCst);
            let _ = handle.join();
            return Err(e);
        }

        Ok(Box::new(CpalInputStream {
            buffer,
            running,
            failure,
            handle: Some(handle),
            encoding: params.encoding,
            channels: params.channels as usize,
            scratch: Vec::new(),
        }))
    }
}

/// A running cpal input. Dropping it stops the capture thread.
pub struct CpalInputStream {
    buffer: Arc<Mutex<RingBuffer>>,
    running: Arc<AtomicBool>,
    failure: Arc<Mutex<Option<String>>>,
    handle: Option<thread::JoinHandle<()>>,
    encoding: SampleEncoding,
    channels: usize,
    scratch: Vec<f32>,
}

impl CpalInputStream {
    /// Samples lost because reads fell behind the device.
    pub fn dropped_samples(&self) -> u64 {
        self.buffer.lock().dropped()
    }
}

impl InputStream for CpalInputStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, RecorderError> {
        if let Some(message) = self.failure.lock().take() {
            return Err(RecorderError::WriteFailed(format!("input stream error: {}", message)));
        }

        let wanted = buf.len() / self.encoding.bytes_per_sample();
        let frames = {
            let ring = self.buffer.lock();
            ring.count().min(wanted) / self.channels.max(1)
        };
        if frames == 0 {
            return Ok(0);
        }

        self.scratch.resize(frames * self.channels.max(1), 0.0);
        let read = self.buffer.lock().read_into(&mut self.scratch);
        Ok(encode_samples(&self.scratch[..read], self.encoding, buf))
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("cpal input thread panicked");
            }
        }
        let dropped = self.dropped_samples();
        if dropped > 0 {
            log::warn!("{} input samples dropped during capture", dropped);
        }
    }

    fn release(&mut self) {
        self.stop();
        self.buffer.lock().reset();
    }
}

impl Drop for CpalInputStream {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Owns the `cpal::Stream` for its whole life.
fn capture_thread(
    device_name: Option<String>,
    params: StreamParams,
    buffer: Arc<Mutex<RingBuffer>>,
    running: Arc<AtomicBool>,
    failure: Arc<Mutex<Option<String>>>,
    ready: mpsc::SyncSender<Result<(), RecorderError>>,
) {
    let stream = match open_stream(device_name.as_deref(), &params, buffer, failure) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    if let Err(e) = stream.play() {
        let _ = ready.send(Err(RecorderError::StartFailed(format!("failed to start input: {}", e))));
        return;
    }
    let _ = ready.send(Ok(()));

    log::debug!("cpal input running");
    while running.load(Ordering::SeqCst) {
        thread::sleep(STOP_POLL);
    }
    drop(stream);
    log::debug!("cpal input stopped");
}

fn open_stream(
    device_name: Option<&str>,
    params: &StreamParams,
    buffer: Arc<Mutex<RingBuffer>>,
    failure: Arc<Mutex<Option<String>>>,
) -> Result<cpal::Stream, RecorderError> {
    let device = find_input_device(device_name)?;
    let supported = find_input_config(&device, params)?;
    let config = supported.config();
    let target_channels = params.channels as usize;

    log::debug!(
        "opening input: {}Hz {}ch {:?} (requested {}ch)",
        config.sample_rate.0,
        config.channels,
        supported.sample_format(),
        params.channels
    );

    let built = match supported.sample_format() {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, target_channels, buffer, failure),
        SampleFormat::I16 => build_stream::<i16>(&device, &config, target_channels, buffer, failure),
        SampleFormat::U8 => build_stream::<u8>(&device, &config, target_channels, buffer, failure),
        other => {
            return Err(RecorderError::ConfigurationFailed(format!(
                "unsupported device sample format {:?}",
                other
            )))
        }
    };
    built.map_err(|e| RecorderError::StartFailed(format!("failed to build input stream: {}", e)))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    target_channels: usize,
    buffer: Arc<Mutex<RingBuffer>>,
    failure: Arc<Mutex<Option<String>>>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample + Send + 'static,
    f32: FromSample<T>,
{
    let device_channels = config.channels as usize;
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let samples: Vec<f32> = data.iter().map(|s| f32::from_sample(*s)).collect();
            if device_channels == target_channels {
                buffer.lock().write(&samples);
            } else {
                buffer
                    .lock()
                    .write(&remix_channels(&samples, device_channels, target_channels));
            }
        },
        move |err| {
            log::error!("input stream error: {}", err);
            *failure.lock() = Some(err.to_string());
        },
        None,
    )
}

/// Pick a device config that runs at exactly the requested rate.
///
/// Prefers a matching channel count, then float over 16-bit over 8-bit
/// samples. The rate is never substituted.
fn find_input_config(device: &cpal::Device, params: &StreamParams) -> Result<SupportedStreamConfig, RecorderError> {
    let rate = cpal::SampleRate(params.sample_rate);
    let ranges = device
        .supported_input_configs()
        .map_err(|e| RecorderError::ConfigurationFailed(format!("failed to query input configs: {}", e)))?;

    ranges
        .filter(|r| r.min_sample_rate() <= rate && rate <= r.max_sample_rate())
        .filter_map(|r| format_rank(r.sample_format()).map(|rank| (r, rank)))
        .min_by_key(|(r, rank)| (r.channels() != params.channels, *rank))
        .map(|(r, _)| r.with_sample_rate(rate))
        .ok_or_else(|| {
            RecorderError::ConfigurationFailed(format!(
                "input device does not support {}Hz/{}ch",
                params.sample_rate, params.channels
            ))
        })
}

fn format_rank(format: SampleFormat) -> Option<u8> {
    match format {
        SampleFormat::F32 => Some(0),
        SampleFormat::I16 => Some(1),
        SampleFormat::U8 => Some(2),
        _ => None,
    }
}
