pub mod levels;
pub mod pcm;
pub mod ring_buffer;
pub mod wav_format;
