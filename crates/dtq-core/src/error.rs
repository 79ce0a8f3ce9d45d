use thiserror::Error;

use crate::domain::TaskId;

/// Errors the Coordinator surfaces synchronously to its caller.
///
/// Race-induced inconsistencies (stale lease acks, reports against a
/// terminal task, pulling an already-finished task) are *not* represented
/// here — those are silent reconciliations, so the
/// corresponding operations return `Option`/`()` instead of an error.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("task_type must be 1-64 characters, got {0}")]
    InvalidTaskType(usize),

    #[error("max_retries must be between 0 and 20, got {0}")]
    InvalidMaxRetries(u32),

    #[error("timeout_seconds must be between 1 and 3600, got {0}")]
    InvalidTimeoutSeconds(u32),

    #[error("worker_id must be 3-64 characters, got {0}")]
    InvalidWorkerId(usize),

    #[error("task {0} not found")]
    TaskNotFound(TaskId),
}
