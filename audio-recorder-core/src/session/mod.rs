pub(crate) mod backend;
pub mod engine;
pub mod level_monitor;
pub mod settings;
mod worker;
