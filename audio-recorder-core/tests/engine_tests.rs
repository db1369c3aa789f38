mod common;

use std::fs;
use std::path::Path;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use audio_recorder_core::processing::levels::SILENCE_FLOOR_DB;
use audio_recorder_core::storage::metadata::read_metadata;
use audio_recorder_core::{
    BackendKind, PlatformCapabilities, Preset, RecorderEngine, RecorderError, RecorderEvent, RecorderListener,
    RecorderState, RecordingConfiguration, RecordingOptions, RecordingResult,
};

use common::{non_level, stopped_result, Calls, Harness, Recorded, Script, ENCODED_FILE_BYTES};

fn raw_harness(script: Script) -> Harness {
    let h = Harness::build(PlatformCapabilities::full(), script, true, false);
    h.engine.use_preset(Preset::Professional).unwrap();
    h.settle();
    h
}

#[test]
fn start_without_permission_is_refused_before_any_backend_work() {
    let h = Harness::build(PlatformCapabilities::full(), Script::default(), false, false);

    assert_eq!(h.engine.start(None), Err(RecorderError::PermissionDenied));

    h.settle();
    assert_eq!(h.engine.state(), RecorderState::Idle);
    assert_eq!(Calls::get(&h.calls.encoders_created), 0);
    assert_eq!(Calls::get(&h.calls.streams_opened), 0);
    assert!(h.drain().is_empty());
}

#[test]
fn stop_when_idle_reports_not_recording_without_stopped_event() {
    let h = Harness::new(PlatformCapabilities::full());

    assert_eq!(h.engine.stop(), Err(RecorderError::NotRecording));
    std::thread::sleep(Duration::from_millis(20));
    assert!(h.drain().iter().all(|e| !matches!(e, RecorderEvent::Stopped(_))));
    assert_eq!(h.engine.state(), RecorderState::Idle);
}

#[test]
fn delegated_session_round_trip() {
    let h = Harness::new(PlatformCapabilities::full());
    let path = h.path("memo.m4a");

    h.engine.start(Some(path.clone())).unwrap();
    h.settle();
    assert_eq!(h.engine.state(), RecorderState::Recording);
    assert_eq!(h.engine.current_recording_path(), Some(path.clone()));
    let status = h.engine.status();
    assert!(status.is_recording);
    assert_eq!(status.backend, Some(BackendKind::Delegated));

    h.engine.stop().unwrap();
    let events = non_level(h.drain());
    assert_eq!(events[0], RecorderEvent::Started { path: path.clone() });

    let result = stopped_result(&events).expect("stopped event");
    assert_eq!(result.file_path, path);
    assert_eq!(result.size_bytes, ENCODED_FILE_BYTES as u64);
    assert_eq!(result.backend, BackendKind::Delegated);
    assert_eq!(result.checksum.as_ref().map(String::len), Some(64));

    assert_eq!(h.engine.state(), RecorderState::Stopped);
    assert_eq!(h.engine.current_recording_path(), Some(path));
    assert_eq!(Calls::get(&h.calls.started), 1);
    assert_eq!(Calls::get(&h.calls.stopped), 1);
    assert_eq!(Calls::get(&h.calls.released), 1);
}

#[test]
fn raw_session_produces_consistent_wav() {
    let h = raw_harness(Script {
        chunks: 4,
        ..Script::default()
    });
    let path = h.path("take.wav");

    h.engine.start(Some(path.clone())).unwrap();
    h.wait_for_reads(4);
    h.engine.stop().unwrap();
    let events = h.drain();

    let result = stopped_result(&events).expect("stopped event");
    assert_eq!(result.backend, BackendKind::Raw);

    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len() as u64, result.size_bytes);
    let riff = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let data = u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]) as usize;
    assert_eq!(riff, bytes.len() - 8);
    assert_eq!(data, bytes.len() - 44);
    // 4 chunks of twice the 1024-byte minimum
    assert_eq!(data, 4 * 2048);
    // 8192 bytes at 48 kHz stereo 16-bit
    assert_eq!(result.duration_ms, 8192 * 1000 / 192_000);

    let reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, 48_000);
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.bits_per_sample, 16);
    let samples: Vec<i16> = reader.into_samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(samples.len(), 4096);
    assert!(samples.iter().all(|s| *s == 1000));

    assert_eq!(Calls::get(&h.calls.streams_released), 1);
    assert_eq!(Calls::get(&h.calls.encoders_created), 0);
}

#[test]
fn raw_silence_reports_floor_level() {
    let h = raw_harness(Script {
        sample: 0,
        ..Script::default()
    });

    h.engine.start(Some(h.path("quiet.wav"))).unwrap();
    let level = h.wait_for(|e| matches!(e, RecorderEvent::Level(_)));
    let RecorderEvent::Level(level) = level else { unreachable!() };
    assert_eq!(level.db, SILENCE_FLOOR_DB);
    assert_eq!(level.peak_db, SILENCE_FLOOR_DB);
    h.engine.stop().unwrap();
}

#[test]
fn delegated_silence_reports_floor_level() {
    let h = Harness::new(PlatformCapabilities::full());

    h.engine.start(Some(h.path("quiet.m4a"))).unwrap();
    let level = h.wait_for(|e| matches!(e, RecorderEvent::Level(_)));
    let RecorderEvent::Level(level) = level else { unreachable!() };
    assert_eq!(level.db, SILENCE_FLOOR_DB);
    assert!(level.is_silence());
    h.engine.stop().unwrap();
}

#[test]
fn delegated_level_tracks_amplitude() {
    let h = Harness::build(
        PlatformCapabilities::full(),
        Script {
            amplitude: 16384,
            ..Script::default()
        },
        true,
        false,
    );

    h.engine.start(Some(h.path("loud.m4a"))).unwrap();
    let RecorderEvent::Level(level) = h.wait_for(|e| matches!(e, RecorderEvent::Level(_))) else {
        unreachable!()
    };
    approx::assert_relative_eq!(level.db, -6.0206, epsilon = 0.01);
    h.engine.stop().unwrap();
}

#[test]
fn pause_on_raw_is_not_supported() {
    let h = raw_harness(Script::default());

    h.engine.start(Some(h.path("raw.wav"))).unwrap();
    h.settle();
    assert_eq!(h.engine.pause(), Err(RecorderError::PauseNotSupported));
    assert_eq!(h.engine.state(), RecorderState::Recording);
    h.engine.stop().unwrap();
}

#[test]
fn pause_and_resume_on_delegated() {
    let h = Harness::new(PlatformCapabilities::full());

    h.engine.start(Some(h.path("paused.m4a"))).unwrap();
    h.settle();
    h.engine.pause().unwrap();
    h.settle();
    assert_eq!(h.engine.state(), RecorderState::Paused);
    assert!(h.engine.status().is_paused);
    assert_eq!(h.engine.pause(), Err(RecorderError::NotRecording));

    h.engine.resume().unwrap();
    h.settle();
    assert_eq!(h.engine.state(), RecorderState::Recording);
    assert_eq!(h.engine.resume(), Err(RecorderError::NotPaused));

    h.engine.stop().unwrap();
    let events = non_level(h.drain());
    assert!(matches!(events[0], RecorderEvent::Started { .. }));
    assert_eq!(events[1], RecorderEvent::Paused);
    assert_eq!(events[2], RecorderEvent::Resumed);
    assert!(matches!(events[3], RecorderEvent::Stopped(_)));
    assert_eq!(Calls::get(&h.calls.paused), 1);
    assert_eq!(Calls::get(&h.calls.resumed), 1);
}

#[test]
fn pause_without_platform_support_is_refused_first() {
    let caps = PlatformCapabilities {
        pause_resume: false,
        ..PlatformCapabilities::full()
    };
    let h = Harness::new(caps);

    // Capability is checked before state.
    assert_eq!(h.engine.pause(), Err(RecorderError::PauseNotSupported));
}

#[test]
fn resume_without_platform_support_is_refused_first() {
    let caps = PlatformCapabilities {
        pause_resume: false,
        ..PlatformCapabilities::full()
    };
    let h = Harness::new(caps);

    assert_eq!(h.engine.resume(), Err(RecorderError::ResumeNotSupported));

    h.engine.start(Some(h.path("r.m4a"))).unwrap();
    h.settle();
    assert_eq!(h.engine.resume(), Err(RecorderError::ResumeNotSupported));
    assert_eq!(h.engine.state(), RecorderState::Recording);
    assert_eq!(Calls::get(&h.calls.resumed), 0);
}

#[test]
fn stop_while_paused_finalizes() {
    let h = Harness::new(PlatformCapabilities::full());

    h.engine.start(Some(h.path("p.m4a"))).unwrap();
    h.settle();
    h.engine.pause().unwrap();
    h.settle();
    h.engine.stop().unwrap();
    let events = h.drain();
    assert!(stopped_result(&events).is_some());
    assert_eq!(h.engine.state(), RecorderState::Stopped);
}

#[test]
fn rapid_start_stop_start_applies_in_order() {
    let h = Harness::new(PlatformCapabilities::full());
    let first = h.path("first.m4a");
    let second = h.path("second.m4a");

    h.engine.start(Some(first.clone())).unwrap();
    h.engine.stop().unwrap();
    h.engine.start(Some(second.clone())).unwrap();

    let events = non_level(h.drain());
    assert_eq!(events.len(), 3, "{:?}", events);
    assert_eq!(events[0], RecorderEvent::Started { path: first.clone() });
    assert_eq!(stopped_result(&events[1..2]).map(|r| r.file_path), Some(first));
    assert_eq!(events[2], RecorderEvent::Started { path: second.clone() });

    assert_eq!(h.engine.state(), RecorderState::Recording);
    assert_eq!(h.engine.current_recording_path(), Some(second));
    assert_eq!(Calls::get(&h.calls.encoders_created), 2);
    assert_eq!(Calls::get(&h.calls.started), 2);
    assert_eq!(Calls::get(&h.calls.released), 1);

    h.engine.stop().unwrap();
    h.settle();
    assert_eq!(Calls::get(&h.calls.released), 2);
}

#[test]
fn queued_violation_becomes_error_event() {
    let h = Harness::new(PlatformCapabilities::full());

    h.engine.start(Some(h.path("one.m4a"))).unwrap();
    h.engine.stop().unwrap();
    match h.engine.stop() {
        Ok(()) => {
            let events = non_level(h.drain());
            assert_eq!(events.last(), Some(&RecorderEvent::Error(RecorderError::NotRecording)));
        }
        Err(e) => assert_eq!(e, RecorderError::NotRecording),
    }
    assert_eq!(h.engine.state(), RecorderState::Stopped);
    assert_eq!(Calls::get(&h.calls.stopped), 1);
}

#[test]
fn second_start_while_recording_is_already_recording() {
    let h = Harness::new(PlatformCapabilities::full());

    h.engine.start(Some(h.path("a.m4a"))).unwrap();
    h.settle();
    assert_eq!(h.engine.start(Some(h.path("b.m4a"))), Err(RecorderError::AlreadyRecording));
    assert_eq!(Calls::get(&h.calls.encoders_created), 1);
    h.engine.stop().unwrap();
}

#[test]
fn encoder_start_failure_releases_encoder() {
    let h = Harness::build(
        PlatformCapabilities::full(),
        Script {
            fail_start: true,
            ..Script::default()
        },
        true,
        false,
    );

    h.engine.start(Some(h.path("fail.m4a"))).unwrap();
    let events = h.drain();
    assert!(matches!(events.as_slice(), [RecorderEvent::Error(RecorderError::StartFailed(_))]));
    assert_eq!(h.engine.state(), RecorderState::Error);
    assert_eq!(Calls::get(&h.calls.released), 1);

    // Error accepts a new session.
    h.script.lock().fail_start = false;
    h.engine.start(Some(h.path("retry.m4a"))).unwrap();
    h.settle();
    assert_eq!(h.engine.state(), RecorderState::Recording);
    h.engine.stop().unwrap();
}

#[test]
fn encoder_configure_failure_releases_encoder() {
    let h = Harness::build(
        PlatformCapabilities::full(),
        Script {
            fail_configure: true,
            ..Script::default()
        },
        true,
        false,
    );

    h.engine.start(Some(h.path("fail.m4a"))).unwrap();
    h.settle();
    assert_eq!(h.engine.state(), RecorderState::Error);
    assert_eq!(Calls::get(&h.calls.started), 0);
    assert_eq!(Calls::get(&h.calls.released), 1);
}

#[test]
fn pause_failure_moves_to_error_and_releases() {
    let h = Harness::build(
        PlatformCapabilities::full(),
        Script {
            fail_pause: true,
            ..Script::default()
        },
        true,
        false,
    );

    h.engine.start(Some(h.path("x.m4a"))).unwrap();
    h.settle();
    h.engine.pause().unwrap();
    let events = non_level(h.drain());
    assert!(matches!(events.last(), Some(RecorderEvent::Error(RecorderError::PauseFailed(_)))));
    assert_eq!(h.engine.state(), RecorderState::Error);
    assert_eq!(Calls::get(&h.calls.released), 1);
}

#[test]
fn stop_failure_moves_to_error() {
    let h = Harness::build(
        PlatformCapabilities::full(),
        Script {
            fail_stop: true,
            ..Script::default()
        },
        true,
        false,
    );

    h.engine.start(Some(h.path("x.m4a"))).unwrap();
    h.settle();
    h.engine.stop().unwrap();
    let events = non_level(h.drain());
    assert!(matches!(events.last(), Some(RecorderEvent::Error(RecorderError::StopFailed(_)))));
    assert!(stopped_result(&events).is_none());
    assert_eq!(h.engine.state(), RecorderState::Error);
    assert_eq!(Calls::get(&h.calls.released), 1);
}

#[test]
fn missing_encoder_output_is_file_error() {
    let h = Harness::build(
        PlatformCapabilities::full(),
        Script {
            skip_output: true,
            ..Script::default()
        },
        true,
        false,
    );

    h.engine.start(Some(h.path("gone.m4a"))).unwrap();
    h.settle();
    h.engine.stop().unwrap();
    let events = non_level(h.drain());
    assert!(matches!(events.last(), Some(RecorderEvent::Error(RecorderError::FileError(_)))));
    assert!(stopped_result(&events).is_none());
    assert_eq!(h.engine.state(), RecorderState::Error);
    assert_eq!(Calls::get(&h.calls.released), 1);
}

#[test]
fn delegated_duration_is_read_from_container() {
    let h = Harness::build(
        PlatformCapabilities::full(),
        Script {
            container_duration_ms: Some(3250),
            ..Script::default()
        },
        true,
        false,
    );

    h.engine.start(Some(h.path("long.m4a"))).unwrap();
    h.settle();
    h.engine.stop().unwrap();
    let result = stopped_result(&h.drain()).expect("stopped event");
    assert_eq!(result.duration_ms, 3250);
    assert_eq!(result.size_bytes, ENCODED_FILE_BYTES as u64);
}

#[test]
fn delegated_duration_falls_back_to_active_time() {
    let h = Harness::new(PlatformCapabilities::full());

    h.engine.start(Some(h.path("short.m4a"))).unwrap();
    h.settle();
    std::thread::sleep(Duration::from_millis(30));
    h.engine.stop().unwrap();
    let result = stopped_result(&h.drain()).expect("stopped event");
    assert!(result.duration_ms >= 30, "duration {}", result.duration_ms);
    assert!(result.duration_ms < 5_000, "duration {}", result.duration_ms);
}

#[test]
fn raw_read_failure_aborts_with_valid_file() {
    let h = raw_harness(Script {
        chunks: 10,
        fail_read_after: Some(3),
        ..Script::default()
    });
    let path = h.path("broken.wav");

    h.engine.start(Some(path.clone())).unwrap();
    let error = h.wait_for(|e| matches!(e, RecorderEvent::Error(_)));
    assert!(matches!(error, RecorderEvent::Error(RecorderError::WriteFailed(_))));
    h.settle();
    assert_eq!(h.engine.state(), RecorderState::Error);
    assert_eq!(h.engine.stop(), Err(RecorderError::NotRecording));

    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.len() as usize, 3 * 2048 / 2);
    assert_eq!(Calls::get(&h.calls.streams_released), 1);
}

#[test]
fn unusable_buffer_size_is_configuration_failure() {
    let h = raw_harness(Script {
        min_buffer: Err(RecorderError::ConfigurationFailed("unsupported rate".into())),
        ..Script::default()
    });

    h.engine.start(Some(h.path("nope.wav"))).unwrap();
    let events = h.drain();
    assert!(matches!(
        events.as_slice(),
        [RecorderEvent::Error(RecorderError::ConfigurationFailed(_))]
    ));
    assert_eq!(Calls::get(&h.calls.streams_opened), 0);
    assert_eq!(h.engine.state(), RecorderState::Error);
}

#[test]
fn configure_while_recording_is_invalid_state() {
    let h = Harness::new(PlatformCapabilities::full());

    h.engine.start(Some(h.path("c.m4a"))).unwrap();
    h.settle();
    let err = h.engine.configure(RecordingConfiguration::default()).unwrap_err();
    assert!(matches!(err, RecorderError::InvalidState(_)));
    assert!(matches!(h.engine.use_preset(Preset::Compact), Err(RecorderError::InvalidState(_))));
    h.engine.stop().unwrap();
}

#[test]
fn invalid_configuration_is_rejected_synchronously() {
    let h = Harness::new(PlatformCapabilities::full());
    let config = RecordingConfiguration {
        channels: 6,
        ..RecordingConfiguration::default()
    };
    assert!(matches!(h.engine.configure(config), Err(RecorderError::ConfigurationFailed(_))));
}

#[test]
fn presets_are_applied_by_the_worker() {
    let h = Harness::new(PlatformCapabilities::full());

    h.engine.use_preset(Preset::VoiceCall).unwrap();
    h.settle();
    let config = h.engine.configuration();
    assert_eq!(config.sample_rate, 8000);
    assert_eq!(config.channels, 1);
    assert_eq!(config.file_extension(), ".3gp");

    h.engine.use_preset(Preset::Professional).unwrap();
    h.settle();
    assert_eq!(h.engine.configuration().file_extension(), ".wav");
}

#[test]
fn raw_only_platform_defaults_to_wav() {
    let h = Harness::new(PlatformCapabilities::raw_only());
    assert!(!h.engine.configuration().use_delegated_encoder);

    h.engine.start(None).unwrap();
    h.settle();
    let path = h.engine.current_recording_path().unwrap();
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("wav"));
    assert!(path.starts_with(h.dir.path().join("Recordings")));
    h.engine.stop().unwrap();
}

#[test]
fn start_with_options_names_file_and_writes_metadata() {
    let h = Harness::build(PlatformCapabilities::full(), Script::default(), true, true);
    let options = RecordingOptions::from_json(r#"{"fileName":"interview","preset":"music_high"}"#).unwrap();

    h.engine.start_with_options(&options).unwrap();
    h.settle();
    let expected = h.dir.path().join("Recordings").join("interview.m4a");
    assert_eq!(h.engine.current_recording_path(), Some(expected.clone()));
    assert_eq!(h.engine.configuration().sample_rate, 48_000);

    h.engine.stop().unwrap();
    let result = stopped_result(&h.drain()).unwrap();
    let metadata = read_metadata(&expected).unwrap();
    assert_eq!(metadata.size_bytes, result.size_bytes);
    assert_eq!(metadata.channels, 2);
    assert_eq!(metadata.checksum, result.checksum);
}

#[test]
fn listener_receives_events_and_last_registration_wins() {
    let h = Harness::new(PlatformCapabilities::full());
    let log = Arc::new(Mutex::new(Vec::new()));
    h.engine.set_listener(Recorded {
        log: Arc::clone(&log),
        tag: "first",
    });
    h.engine.set_listener(Recorded {
        log: Arc::clone(&log),
        tag: "second",
    });

    h.engine.start(Some(h.path("l.m4a"))).unwrap();
    h.settle();
    h.engine.stop().unwrap();
    h.settle();
    h.engine.dispatch_events();

    let log = log.lock();
    assert!(log.iter().all(|line| line.starts_with("second:")));
    assert!(log.iter().any(|line| line.starts_with("second:started:")));
    assert!(log.contains(&format!("second:stopped:{}", ENCODED_FILE_BYTES)));
}

/// Hands over to `next` from inside its first callback.
struct Handoff {
    engine: Weak<RecorderEngine>,
    log: Arc<Mutex<Vec<String>>>,
    next: Option<Recorded>,
}

impl RecorderListener for Handoff {
    fn on_started(&mut self, _path: &Path) {
        self.log.lock().push("handoff:started".into());
        if let (Some(engine), Some(next)) = (self.engine.upgrade(), self.next.take()) {
            engine.set_listener(next);
        }
    }

    fn on_stopped(&mut self, _result: &RecordingResult) {
        self.log.lock().push("handoff:stopped".into());
    }

    fn on_error(&mut self, error: &RecorderError) {
        self.log.lock().push(format!("handoff:error:{}", error.name()));
    }
}

#[test]
fn listener_registered_during_dispatch_receives_rest_of_batch() {
    let Harness { engine, dir, .. } = Harness::new(PlatformCapabilities::full());
    let engine = Arc::new(engine);
    let log = Arc::new(Mutex::new(Vec::new()));
    engine.set_listener(Handoff {
        engine: Arc::downgrade(&engine),
        log: Arc::clone(&log),
        next: Some(Recorded {
            log: Arc::clone(&log),
            tag: "next",
        }),
    });

    engine.start(Some(dir.path().join("h.m4a"))).unwrap();
    engine.stop().unwrap();
    assert!(engine.wait_until_settled(common::SETTLE));
    engine.dispatch_events();

    let log = log.lock().clone();
    assert_eq!(log[0], "handoff:started");
    assert!(log.contains(&format!("next:stopped:{}", ENCODED_FILE_BYTES)));
    assert!(!log.iter().any(|line| line == "handoff:stopped"));

    drop(engine);
    drop(dir);
}

#[test]
fn dropping_engine_finalizes_active_raw_session() {
    let h = raw_harness(Script {
        chunks: 2,
        ..Script::default()
    });
    let path = h.path("dropped.wav");

    h.engine.start(Some(path.clone())).unwrap();
    h.wait_for_reads(2);
    let Harness { engine, calls, dir, .. } = h;
    drop(engine);

    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.len() as usize, 2 * 2048 / 2);
    assert_eq!(Calls::get(&calls.streams_released), 1);
    drop(dir);
}
