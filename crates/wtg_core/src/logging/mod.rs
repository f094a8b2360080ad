//! Per-job logging.
//!
//! Each job writes its own log file and optionally mirrors messages to a
//! UI callback. Compact mode keeps raw tool output in a bounded tail
//! buffer and only surfaces it after a failure.

pub mod job_logger;
pub mod types;

pub use job_logger::JobLogger;
pub use types::{LogConfig, LogLevel, MessagePrefix, UiLogCallback};
