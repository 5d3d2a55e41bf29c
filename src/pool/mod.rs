mod scheduler;
mod signal;

pub use scheduler::{PoolEvents, PoolReport, TaskPool, default_limit};
pub use signal::{FailureReason, TerminationSignal};
