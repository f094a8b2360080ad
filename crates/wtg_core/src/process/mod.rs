//! External process supervision.

pub mod events;
pub mod supervisor;

pub use events::{parse_progress, CancelToken, ExitSummary, ProcessError, ProcessEvent};
pub use supervisor::{CommandRunner, ProcessSupervisor, DEFAULT_GRACE};
