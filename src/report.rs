//! Run report written by the driver once every task has an outcome.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::pool::PoolReport;

/// File name of the report inside the target directory.
pub const REPORT_FILE: &str = "capgen-report.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub name: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: i64,
}

/// Structured record of one driver run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub tasks: Vec<TaskSummary>,
}

impl RunSummary {
    /// Builds the summary of a run that started at `started_at`.
    pub fn new(started_at: DateTime<Utc>, report: &PoolReport) -> Self {
        let now = Utc::now();
        let tasks = report
            .records()
            .map(|(name, record)| TaskSummary {
                name: name.to_string(),
                status: if record.signal.is_completed() {
                    TaskStatus::Completed
                } else {
                    TaskStatus::Failed
                },
                reason: record.signal.failure().map(ToString::to_string),
                started_at: record.started_at,
                duration_ms: record.duration_ms,
            })
            .collect();

        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at,
            completed_at: now,
            duration_ms: (now - started_at).num_milliseconds(),
            total: report.len(),
            completed: report.completed(),
            failed: report.len() - report.completed(),
            tasks,
        }
    }

    /// Writes the summary as pretty JSON into `dir`, returning the file path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(REPORT_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }
}
