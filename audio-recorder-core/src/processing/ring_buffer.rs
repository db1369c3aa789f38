/// Fixed-capacity circular buffer of `f32` samples.
///
/// Sits between a hardware callback that pushes samples and a reader that
/// pulls fixed-size chunks. Wrap in `Arc<parking_lot::Mutex<RingBuffer>>`
/// for cross-thread access.
///
/// Overflow drops the oldest samples and counts them in [`dropped`](RingBuffer::dropped).
#[derive(Debug)]
pub struct RingBuffer {
    buffer: Vec<f32>,
    write_index: usize,
    read_index: usize,
    available: usize,
    dropped: u64,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            write_index: 0,
            read_index: 0,
            available: 0,
            dropped: 0,
        }
    }

    /// Append samples, dropping the oldest on overflow.
    pub fn write(&mut self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }
        let capacity = self.capacity();

        let samples = if samples.len() > capacity {
            self.dropped += (samples.len() - capacity) as u64;
            &samples[samples.len() - capacity..]
        } else {
            samples
        };

        let overflow = (self.available + samples.len()).saturating_sub(capacity);
        if overflow > 0 {
            self.read_index = (self.read_index + overflow) % capacity;
            self.available -= overflow;
            self.dropped += overflow as u64;
        }

        for &sample in samples {
            self.buffer[self.write_index] = sample;
            self.write_index = (self.write_index + 1) % capacity;
        }
        self.available += samples.len();
    }

    /// Move up to `out.len()` samples into `out`. Returns how many were copied.
    pub fn read_into(&mut self, out: &mut [f32]) -> usize {
        let to_read = out.len().min(self.available);
        let capacity = self.capacity();
        for (i, slot) in out[..to_read].iter_mut().enumerate() {
            *slot = self.buffer[(self.read_index + i) % capacity];
        }
        self.read_index = (self.read_index + to_read) % capacity;
        self.available -= to_read;
        to_read
    }

    /// Read and remove up to `count` samples.
    pub fn read(&mut self, count: usize) -> Vec<f32> {
        let mut out = vec![0.0; count.min(self.available)];
        self.read_into(&mut out);
        out
    }

    /// Number of samples available for reading.
    pub fn count(&self) -> usize {
        self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    /// Samples discarded because the reader fell behind.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn reset(&mut self) {
        self.write_index = 0;
        self.read_index = 0;
        self.available = 0;
        self.dropped = 0;
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}
