use std::time::{Duration, Instant};

use crate::models::audio_models::AudioLevel;
use crate::models::format::SampleEncoding;
use crate::processing::levels;

/// How often the delegated encoder's amplitude is sampled.
pub const LEVEL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Polling schedule for encoder amplitude readings.
///
/// Owns no thread. The worker asks for [`deadline`](LevelMonitor::deadline),
/// waits on its command queue until then, and calls
/// [`poll`](LevelMonitor::poll) when the wait times out.
#[derive(Debug, Clone)]
pub struct LevelMonitor {
    interval: Duration,
    next_poll: Option<Instant>,
}

impl LevelMonitor {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next_poll: None,
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.next_poll = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next_poll = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_poll.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.next_poll
    }

    /// Take a reading if one is due at `now`.
    ///
    /// Missed deadlines are not replayed; the next poll is scheduled one
    /// interval after `now` when the worker fell behind.
    pub fn poll(&mut self, now: Instant, amplitude: impl FnOnce() -> i32) -> Option<AudioLevel> {
        let due = self.next_poll?;
        if now < due {
            return None;
        }
        let mut next = due + self.interval;
        if next <= now {
            next = now + self.interval;
        }
        self.next_poll = Some(next);
        Some(levels::level_from_amplitude(amplitude()))
    }
}

impl Default for LevelMonitor {
    fn default() -> Self {
        Self::new(LEVEL_POLL_INTERVAL)
    }
}

/// Level of one raw capture chunk.
pub fn chunk_level(bytes: &[u8], encoding: SampleEncoding) -> AudioLevel {
    levels::level_from_pcm(bytes, encoding)
}
