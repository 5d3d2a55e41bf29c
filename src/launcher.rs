//! Worker subprocess launching.
//!
//! Each job runs in its own process: the driver re-executes its own binary
//! as `<exe> [leading args] worker <descriptor>` and waits for it to exit.
//! The child inherits stdout and stderr so worker logs reach the terminal.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::catalog::Job;
use crate::error::Result;
use crate::pool::{FailureReason, TerminationSignal};

/// Subcommand that puts the binary in worker mode.
pub const WORKER_SUBCOMMAND: &str = "worker";

/// Spawns one isolated worker process per job.
#[derive(Debug, Clone)]
pub struct WorkerLauncher {
    program: PathBuf,
    leading_args: Vec<OsString>,
}

impl WorkerLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Launcher that re-executes the running binary.
    pub fn current_exe() -> Result<Self> {
        Ok(Self::new(std::env::current_exe()?))
    }

    /// Arguments placed before the worker subcommand.
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Makes workers load the same configuration file as the driver.
    pub fn with_config(self, config_path: Option<&Path>) -> Self {
        match config_path {
            Some(path) => self.with_leading_args([OsString::from("--config"), path.into()]),
            None => self,
        }
    }

    /// Makes workers log at the driver's verbosity.
    pub fn with_verbose(self, verbose: bool) -> Self {
        if verbose {
            self.with_leading_args(["--verbose"])
        } else {
            self
        }
    }

    fn command(&self, descriptor: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .arg(WORKER_SUBCOMMAND)
            .arg(descriptor)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        cmd
    }

    /// Runs `job` in a fresh worker process and waits for it to terminate.
    ///
    /// Never fails: spawn errors and non-zero exits become
    /// [`TerminationSignal::Failed`]. The child is reaped before this
    /// returns, and killed if the returned future is dropped early.
    pub async fn launch(&self, job: &Job) -> TerminationSignal {
        let descriptor = match job.to_descriptor() {
            Ok(descriptor) => descriptor,
            Err(e) => return TerminationSignal::Failed(FailureReason::Spawn(e.to_string())),
        };

        let mut child = match self.command(&descriptor).spawn() {
            Ok(child) => child,
            Err(e) => {
                return TerminationSignal::Failed(FailureReason::Spawn(format!(
                    "failed to spawn {}: {e}",
                    self.program.display()
                )));
            }
        };
        debug!(job = %job, pid = ?child.id(), "worker spawned");

        match child.wait().await {
            Ok(status) => TerminationSignal::from_exit_status(status),
            Err(e) => TerminationSignal::Failed(FailureReason::Spawn(format!(
                "failed to wait for worker: {e}"
            ))),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::catalog::Profile;

    fn sh(script: &str) -> WorkerLauncher {
        WorkerLauncher::new("sh").with_leading_args(["-c", script, "sh"])
    }

    fn job() -> Job {
        Job::sculpted(Profile::Oem, 1.5, 2)
    }

    #[tokio::test]
    async fn zero_exit_completes() {
        let signal = sh("exit 0").launch(&job()).await;
        assert_eq!(signal, TerminationSignal::Completed);
    }

    #[tokio::test]
    async fn nonzero_exit_fails_with_code() {
        let signal = sh("exit 1").launch(&job()).await;
        assert_eq!(signal, TerminationSignal::Failed(FailureReason::NonZeroExit(1)));
    }

    #[tokio::test]
    async fn killed_worker_fails_with_signal() {
        let signal = sh("kill -9 $$").launch(&job()).await;
        assert_eq!(signal, TerminationSignal::Failed(FailureReason::Signaled(9)));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let launcher = WorkerLauncher::new("/definitely/not/a/capgen/binary");
        let signal = launcher.launch(&job()).await;
        assert!(matches!(
            signal,
            TerminationSignal::Failed(FailureReason::Spawn(_))
        ));
    }

    #[tokio::test]
    async fn passes_subcommand_and_descriptor() {
        let expected = job().to_descriptor().unwrap();
        let script = format!(
            r#"[ "$#" -eq 2 ] && [ "$1" = "{WORKER_SUBCOMMAND}" ] && [ "$2" = '{expected}' ] || exit 7"#
        );
        let signal = sh(&script).launch(&job()).await;
        assert_eq!(signal, TerminationSignal::Completed);
    }

    #[tokio::test]
    async fn forwards_config_before_subcommand() {
        let launcher = WorkerLauncher::new("sh")
            .with_leading_args(["-c", r#"[ "$1" = --config ] && [ "$2" = /tmp/capgen.toml ] && [ "$3" = worker ] || exit 3"#, "sh"])
            .with_config(Some(Path::new("/tmp/capgen.toml")));
        assert_eq!(launcher.launch(&job()).await, TerminationSignal::Completed);

        let untouched = sh("[ \"$1\" = worker ] || exit 4").with_config(None);
        assert_eq!(untouched.launch(&job()).await, TerminationSignal::Completed);
    }

    #[tokio::test]
    async fn forwards_verbose_before_subcommand() {
        let launcher = WorkerLauncher::new("sh")
            .with_leading_args(["-c", r#"[ "$1" = --verbose ] && [ "$2" = worker ] || exit 5"#, "sh"])
            .with_verbose(true);
        assert_eq!(launcher.launch(&job()).await, TerminationSignal::Completed);

        let quiet = sh("[ \"$1\" = worker ] || exit 6").with_verbose(false);
        assert_eq!(quiet.launch(&job()).await, TerminationSignal::Completed);
    }
}
