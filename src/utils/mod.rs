//! Shared utilities

pub mod logger;
pub mod timer;

pub use logger::{init_logger, LogLevel};
pub use timer::PhaseTimer;
