pub mod encoder;
pub mod input_stream;
pub mod listener;
pub mod permission;
pub mod platform;
