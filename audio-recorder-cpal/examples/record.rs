//! Record from the default input device to a WAV file.
//!
//! ```text
//! RUST_LOG=debug cargo run -p audio-recorder-cpal --example record -- [seconds] [device name]
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use audio_recorder_core::{
    AudioLevel, EngineSettings, Preset, RecorderEngine, RecorderError, RecorderListener, RecordingResult,
};
use audio_recorder_cpal::{list_input_devices, CpalPermission, CpalPlatform};

struct ConsoleListener;

impl RecorderListener for ConsoleListener {
    fn on_started(&mut self, path: &Path) {
        println!("recording to {}", path.display());
    }

    fn on_stopped(&mut self, result: &RecordingResult) {
        println!(
            "saved {} ({} ms, {} bytes, sha256 {})",
            result.file_path.display(),
            result.duration_ms,
            result.size_bytes,
            result.checksum.as_deref().unwrap_or("-")
        );
    }

    fn on_level(&mut self, level: AudioLevel) {
        let bars = ((level.db + 60.0).max(0.0) / 2.0) as usize;
        println!("{:>7.1} dB {}", level.db, "#".repeat(bars));
    }

    fn on_error(&mut self, error: &RecorderError) {
        eprintln!("error {} ({}): {}", error.code(), error.name(), error);
    }
}

fn main() -> Result<(), RecorderError> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seconds: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(5);
    let device = args.next();

    match list_input_devices() {
        Ok(devices) => {
            for d in devices {
                println!("{} {}", if d.is_default { "*" } else { " " }, d.name);
            }
        }
        Err(e) => eprintln!("device listing failed: {}", e),
    }

    let (platform, permission) = match device {
        Some(name) => (CpalPlatform::with_device(name.clone()), CpalPermission::for_device(name)),
        None => (CpalPlatform::new(), CpalPermission::new()),
    };

    let engine = RecorderEngine::new(Box::new(platform), Arc::new(permission), EngineSettings::default())?;
    engine.set_listener(ConsoleListener);
    engine.use_preset(Preset::VoiceNote)?;
    engine.start(None)?;

    let deadline = Instant::now() + Duration::from_secs(seconds);
    while Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(100));
        engine.dispatch_events();
    }

    engine.stop()?;
    engine.wait_until_settled(Duration::from_secs(5));
    engine.dispatch_events();
    Ok(())
}
