use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{error, info};

use crate::catalog::{self, Job};
use crate::config::GenConfig;
use crate::error::Result;
use crate::launcher::WorkerLauncher;
use crate::pool::{PoolEvents, PoolReport, TaskPool};
use crate::producer::ArtifactProducer;

/// Exit code of a worker whose job produced its artifact.
pub const WORKER_OK: u8 = 0;
/// Exit code of a worker whose job failed for any reason.
pub const WORKER_FAILED: u8 = 1;

/// Drives the whole catalog through a bounded pool of worker processes.
pub struct Orchestrator {
    config: GenConfig,
    launcher: WorkerLauncher,
}

impl Orchestrator {
    pub fn new(config: GenConfig, launcher: WorkerLauncher) -> Self {
        Self { config, launcher }
    }

    pub fn config(&self) -> &GenConfig {
        &self.config
    }

    /// Jobs selected by the configured profiles, in catalog order.
    pub fn catalog(&self) -> Vec<Job> {
        catalog::enumerate(&self.config.profiles)
    }

    /// Runs every job in its own worker process and collects the outcomes.
    ///
    /// Configuration problems (zero concurrency, unusable target directory)
    /// are returned before any worker starts. Failures of individual jobs
    /// are only ever recorded in the report.
    pub async fn drive(&self, jobs: Vec<Job>, events: &dyn PoolEvents) -> Result<PoolReport> {
        let mut pool = TaskPool::new(self.config.concurrency_limit())?;
        std::fs::create_dir_all(&self.config.target_dir)?;

        let launcher = Arc::new(self.launcher.clone());
        for job in jobs {
            let launcher = Arc::clone(&launcher);
            pool.add(job.display_name(), move || async move {
                launcher.launch(&job).await
            })?;
        }

        info!(
            limit = pool.limit(),
            target = %self.config.target_dir.display(),
            "starting workers"
        );
        let report = pool.run_with(events).await;
        info!(
            total = report.len(),
            completed = report.completed(),
            failed = report.len() - report.completed(),
            "all workers finished"
        );
        Ok(report)
    }
}

/// Worker mode: produce one artifact in-process and return the exit code.
///
/// Generation errors and panics are both turned into [`WORKER_FAILED`] so the
/// driver sees an ordinary non-zero exit rather than a crash.
pub fn run_worker(job: &Job, producer: &dyn ArtifactProducer) -> u8 {
    match panic::catch_unwind(AssertUnwindSafe(|| producer.produce(job))) {
        Ok(Ok(artifact)) => {
            info!(
                job = %job,
                path = %artifact.path.display(),
                bytes = artifact.bytes,
                "worker finished"
            );
            WORKER_OK
        }
        Ok(Err(e)) => {
            error!(job = %job, error = %e, "generation failed");
            WORKER_FAILED
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(job = %job, panic = %message, "generation panicked");
            WORKER_FAILED
        }
    }
}
