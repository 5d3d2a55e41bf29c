use std::fmt;
use std::process::ExitStatus;

/// Why a task did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The worker process could not be created or waited on.
    Spawn(String),
    /// The worker ran and exited with a non-zero code.
    NonZeroExit(i32),
    /// The worker was killed by a signal before producing an exit code.
    Signaled(i32),
    /// The worker terminated without an exit code or a known signal.
    Abnormal,
    /// The task's operation panicked inside the driver.
    Panicked(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Spawn(msg) => write!(f, "spawn-error: {msg}"),
            FailureReason::NonZeroExit(code) => write!(f, "nonzero-exit: {code}"),
            FailureReason::Signaled(signal) => write!(f, "terminated by signal {signal}"),
            FailureReason::Abnormal => write!(f, "abnormal termination"),
            FailureReason::Panicked(msg) => write!(f, "panicked: {msg}"),
        }
    }
}

/// Terminal outcome recorded for every task the pool runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationSignal {
    Completed,
    Failed(FailureReason),
}

impl TerminationSignal {
    pub fn is_completed(&self) -> bool {
        matches!(self, TerminationSignal::Completed)
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            TerminationSignal::Completed => None,
            TerminationSignal::Failed(reason) => Some(reason),
        }
    }

    /// Maps a child process exit status: 0 completes, anything else fails.
    pub fn from_exit_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(0) => TerminationSignal::Completed,
            Some(code) => TerminationSignal::Failed(FailureReason::NonZeroExit(code)),
            None => TerminationSignal::Failed(killed_by(status)),
        }
    }
}

#[cfg(unix)]
fn killed_by(status: ExitStatus) -> FailureReason {
    use std::os::unix::process::ExitStatusExt;

    status
        .signal()
        .map(FailureReason::Signaled)
        .unwrap_or(FailureReason::Abnormal)
}

#[cfg(not(unix))]
fn killed_by(_status: ExitStatus) -> FailureReason {
    FailureReason::Abnormal
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationSignal::Completed => write!(f, "completed"),
            TerminationSignal::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_reason_display() {
        assert_eq!(FailureReason::NonZeroExit(1).to_string(), "nonzero-exit: 1");
        assert_eq!(
            FailureReason::Spawn("No such file or directory".into()).to_string(),
            "spawn-error: No such file or directory"
        );
        assert_eq!(FailureReason::Signaled(9).to_string(), "terminated by signal 9");
    }

    #[test]
    fn signal_accessors() {
        assert!(TerminationSignal::Completed.is_completed());
        assert!(TerminationSignal::Completed.failure().is_none());

        let failed = TerminationSignal::Failed(FailureReason::NonZeroExit(3));
        assert!(!failed.is_completed());
        assert_eq!(failed.failure(), Some(&FailureReason::NonZeroExit(3)));
        assert_eq!(failed.to_string(), "failed (nonzero-exit: 3)");
    }

    #[cfg(unix)]
    fn sh_status(script: &str) -> ExitStatus {
        std::process::Command::new("sh")
            .args(["-c", script])
            .status()
            .unwrap()
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_mapping() {
        assert_eq!(
            TerminationSignal::from_exit_status(sh_status("exit 0")),
            TerminationSignal::Completed
        );
        assert_eq!(
            TerminationSignal::from_exit_status(sh_status("exit 42")),
            TerminationSignal::Failed(FailureReason::NonZeroExit(42))
        );
        assert_eq!(
            TerminationSignal::from_exit_status(sh_status("kill -9 $$")),
            TerminationSignal::Failed(FailureReason::Signaled(9))
        );
    }
}
