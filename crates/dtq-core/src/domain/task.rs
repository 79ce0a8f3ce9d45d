//! Task record and its state machine.
//!
//! `Task` is the authoritative record for one submitted unit of work. All
//! mutation happens through the `mark_*`/`schedule_*` methods below so that
//! the invariants (e.g. `status=RUNNING ⇔ assigned_worker_id
//! != null`) are enforced in one place instead of at every call site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::TaskId;

const MAX_ERROR_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Done,
    Failed,
    Retrying,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Failed)
    }
}

/// Truncate a user-supplied error to a 500-character bound, falling back
/// to a fixed message when none was given.
pub fn trim_error(error: Option<String>) -> String {
    let error = error.unwrap_or_else(|| "Unknown error".to_string());
    if error.len() <= MAX_ERROR_LEN {
        error
    } else {
        error.chars().take(MAX_ERROR_LEN).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    #[serde(rename = "type")]
    pub task_type: String,
    pub payload: serde_json::Value,

    pub status: TaskStatus,
    pub retry_count: u32,
    pub max_retries: u32,
    pub timeout_seconds: u32,

    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,

    pub assigned_worker_id: Option<String>,
    pub result: Option<serde_json::Value>,
    pub last_error: Option<String>,
}

impl Task {
    pub fn new(
        task_id: TaskId,
        task_type: String,
        payload: serde_json::Value,
        max_retries: u32,
        timeout_seconds: u32,
    ) -> Self {
        Self {
            task_id,
            task_type,
            payload,
            status: TaskStatus::Pending,
            retry_count: 0,
            max_retries,
            timeout_seconds,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            assigned_worker_id: None,
            result: None,
            last_error: None,
        }
    }

    /// PENDING/RETRYING -> RUNNING. Awarding the lease already happened in
    /// the queue; this just reflects that fact onto the record.
    pub fn mark_running(&mut self, worker_id: &str) {
        self.status = TaskStatus::Running;
        self.started_at = Some(Utc::now());
        self.assigned_worker_id = Some(worker_id.to_string());
        self.last_error = None;
    }

    /// RUNNING -> DONE (terminal).
    pub fn mark_done(&mut self, result: Option<serde_json::Value>) {
        self.status = TaskStatus::Done;
        self.finished_at = Some(Utc::now());
        self.result = Some(result.unwrap_or_else(|| serde_json::json!({})));
    }

    /// RUNNING -> FAILED (terminal). `retry_count` must already have been
    /// incremented by the caller before this is invoked.
    pub fn mark_failed(&mut self, error: String) {
        self.status = TaskStatus::Failed;
        self.finished_at = Some(Utc::now());
        self.last_error = Some(error);
    }

    /// RUNNING -> RETRYING. Clears the assignment so the task reads as
    /// unowned while it waits out its backoff.
    pub fn mark_retrying(&mut self, error: String) {
        self.status = TaskStatus::Retrying;
        self.last_error = Some(error);
        self.assigned_worker_id = None;
        self.started_at = None;
    }

    /// RETRYING -> PENDING, once the backoff has elapsed and the status is
    /// re-verified unchanged.
    pub fn requeue(&mut self) {
        self.status = TaskStatus::Pending;
    }

    /// Apply a worker's failure report: bump `retry_count` first, then
    /// classify into RETRYING or FAILED.
    pub fn apply_failure(&mut self, error: Option<String>) {
        self.retry_count += 1;
        let trimmed = trim_error(error);
        if self.retry_count <= self.max_retries {
            self.mark_retrying(trimmed);
        } else {
            self.mark_failed(trimmed);
        }
    }

    /// Apply a sweeper-reclaimed, expired lease: bump `retry_count` first,
    /// then classify straight into PENDING or FAILED. Unlike `apply_failure`
    /// there is no RETRYING/backoff leg here — the lease's own expiry already
    /// was the wait, so a still-retryable task is ready to run again
    /// immediately. Returns `true` if the task now waits in PENDING, `false`
    /// if it was pushed to FAILED.
    pub fn reclaim_after_lease_expiry(&mut self) -> bool {
        self.retry_count += 1;
        if self.retry_count <= self.max_retries {
            self.status = TaskStatus::Pending;
            self.assigned_worker_id = None;
            self.started_at = None;
            self.last_error = Some("Lease expired (worker lost/timeout)".to_string());
            true
        } else {
            self.mark_failed("Lease expired and retry limit exceeded".to_string());
            false
        }
    }
}

/// The public, read-only projection of `Task` served over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    pub task_id: TaskId,
    #[serde(rename = "type")]
    pub task_type: String,
    pub payload: serde_json::Value,
    pub status: TaskStatus,
    pub retry_count: u32,
    pub max_retries: u32,
    pub timeout_seconds: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub assigned_worker_id: Option<String>,
    pub last_error: Option<String>,
}

impl From<&Task> for TaskView {
    fn from(t: &Task) -> Self {
        Self {
            task_id: t.task_id,
            task_type: t.task_type.clone(),
            payload: t.payload.clone(),
            status: t.status,
            retry_count: t.retry_count,
            max_retries: t.max_retries,
            timeout_seconds: t.timeout_seconds,
            created_at: t.created_at,
            started_at: t.started_at,
            finished_at: t.finished_at,
            assigned_worker_id: t.assigned_worker_id.clone(),
            last_error: t.last_error.clone(),
        }
    }
}
