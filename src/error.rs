use thiserror::Error;

#[derive(Debug, Error)]
pub enum CapgenError {
    #[error("Invalid concurrency limit {0}: at least one task must be allowed to run")]
    InvalidLimit(usize),

    #[error("Task already registered: {0}")]
    DuplicateTask(String),

    #[error("Task pool has already run; no more tasks can be added")]
    PoolClosed,

    #[error("Invalid job descriptor: {0}")]
    InvalidJob(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = CapgenError> = std::result::Result<T, E>;
