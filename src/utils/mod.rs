//! Utility helpers shared across the crate

pub mod logging;

pub use logging::{get_log_buffer, init_tracing, LogEntry, LogRingBuffer};
