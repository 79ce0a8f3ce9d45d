//! Coordinator: the orchestrator tying the Worker Registry, Lease Queue and
//! Task Store together. This is the only component that ever touches more
//! than one of the three locks, and it does so in the fixed order
//! queue -> store -> registry to keep deadlock impossible.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::time::sleep;

use crate::domain::{Task, TaskId, TaskStatus, WorkerStats};
use crate::error::CoreError;
use crate::queue::LeaseQueue;
use crate::registry::WorkerRegistry;
use crate::store::TaskStore;

const MIN_TYPE_LEN: usize = 1;
const MAX_TYPE_LEN: usize = 64;
const MAX_RETRIES_BOUND: u32 = 20;
const MIN_TIMEOUT_SECONDS: u32 = 1;
const MAX_TIMEOUT_SECONDS: u32 = 3600;
const MIN_WORKER_ID_LEN: usize = 3;
const MAX_WORKER_ID_LEN: usize = 64;

/// Backoff before a RETRYING task re-enters PENDING: `min(5s, 0.5 * retry_count)`.
fn retry_backoff(retry_count: u32) -> Duration {
    let secs = (0.5 * retry_count as f64).min(5.0);
    Duration::from_secs_f64(secs)
}

/// Bounds-check a `worker_id` the way every worker-facing endpoint must:
/// register, heartbeat, pull and report all share this constraint at the
/// wire boundary, not just pull.
pub fn validate_worker_id(worker_id: &str) -> Result<(), CoreError> {
    let len = worker_id.len();
    if !(MIN_WORKER_ID_LEN..=MAX_WORKER_ID_LEN).contains(&len) {
        return Err(CoreError::InvalidWorkerId(len));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    pub leases_expired: u64,
    pub requeued: u64,
    pub failed: u64,
    pub ts: String,
}

impl Default for SweepResult {
    fn default() -> Self {
        Self {
            leases_expired: 0,
            requeued: 0,
            failed: 0,
            ts: now_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    pub queue_ready: usize,
    pub queue_inflight: usize,
    pub tasks_total: usize,
    pub tasks_by_status: HashMap<&'static str, u64>,
    #[serde(flatten)]
    pub worker_stats: WorkerStats,
}

pub struct Coordinator {
    registry: WorkerRegistry,
    queue: LeaseQueue,
    store: TaskStore,
    default_lease_seconds: u32,
}

impl Coordinator {
    pub fn new(registry: WorkerRegistry, queue: LeaseQueue, store: TaskStore, default_lease_seconds: u32) -> Self {
        Self {
            registry,
            queue,
            store,
            default_lease_seconds,
        }
    }

    pub fn registry(&self) -> &WorkerRegistry {
        &self.registry
    }

    /// Validate bounds, allocate a task_id, insert PENDING, enqueue ready.
    /// `timeout_seconds`, if given, becomes this task's lease length on
    /// every pull; otherwise the coordinator's
    /// configured default is used.
    pub async fn submit(
        &self,
        task_type: String,
        payload: serde_json::Value,
        max_retries: u32,
        timeout_seconds: Option<u32>,
    ) -> Result<TaskId, CoreError> {
        let type_len = task_type.len();
        if !(MIN_TYPE_LEN..=MAX_TYPE_LEN).contains(&type_len) {
            return Err(CoreError::InvalidTaskType(type_len));
        }
        if max_retries > MAX_RETRIES_BOUND {
            return Err(CoreError::InvalidMaxRetries(max_retries));
        }
        let timeout_seconds = timeout_seconds.unwrap_or(self.default_lease_seconds);
        if !(MIN_TIMEOUT_SECONDS..=MAX_TIMEOUT_SECONDS).contains(&timeout_seconds) {
            return Err(CoreError::InvalidTimeoutSeconds(timeout_seconds));
        }

        let task_id = TaskId::new();
        let task = Task::new(task_id, task_type, payload, max_retries, timeout_seconds);
        self.store.insert(task).await;
        self.queue.push_ready(task_id).await;
        Ok(task_id)
    }

    pub async fn get(&self, task_id: TaskId) -> Option<Task> {
        self.store.get(task_id).await
    }

    /// Lease a task to `worker_id`, transition it to RUNNING, and bump the
    /// worker's in-flight count. Returns `None` if the queue is empty, or if
    /// the popped task turns out to be missing/terminal (in which case it is
    /// simply discarded, not re-queued).
    ///
    /// The lease length is the task's own `timeout_seconds`, which is why
    /// the task must be looked up in the store before the inflight entry
    /// can be created.
    pub async fn pull_for_worker(&self, worker_id: &str) -> Result<Option<Task>, CoreError> {
        validate_worker_id(worker_id)?;

        let Some(task_id) = self.queue.pop_ready().await else {
            return Ok(None);
        };

        let Some(task) = self.store.get(task_id).await else {
            return Ok(None);
        };

        if task.status.is_terminal() {
            return Ok(None);
        }

        self.queue.mark_leased(task_id, worker_id, task.timeout_seconds).await;

        let task = self
            .store
            .update(task_id, |t| {
                t.mark_running(worker_id);
                t.clone()
            })
            .await
            .expect("task existed a moment ago under the same store lock discipline");

        self.registry.mark_in_flight(worker_id, 1).await;
        Ok(Some(task))
    }

    /// Accept (or silently drop) a worker's outcome report for one attempt.
    pub async fn report(
        &self,
        worker_id: &str,
        task_id: TaskId,
        ok: bool,
        result: Option<serde_json::Value>,
        error: Option<String>,
    ) {
        if !self.queue.ack(task_id, worker_id).await {
            return; // stale or foreign lease; already corrected elsewhere.
        }

        let became_retrying = self
            .store
            .update(task_id, |task| {
                if task.assigned_worker_id.as_deref() != Some(worker_id) {
                    return false;
                }
                if ok {
                    task.mark_done(result);
                } else {
                    task.apply_failure(error);
                }
                task.status == TaskStatus::Retrying
            })
            .await
            .unwrap_or(false);

        self.registry.mark_in_flight(worker_id, -1).await;

        if became_retrying {
            self.requeue_after_backoff(task_id).await;
        }
    }

    /// Sleep out the backoff with no locks held, then re-verify the task is
    /// still RETRYING (it may have been acted on concurrently) before
    /// flipping it back to PENDING and re-enqueueing.
    async fn requeue_after_backoff(&self, task_id: TaskId) {
        let Some(retry_count) = self.store.get(task_id).await.map(|t| t.retry_count) else {
            return;
        };
        sleep(retry_backoff(retry_count)).await;

        let requeued = self
            .store
            .update(task_id, |task| {
                if task.status == TaskStatus::Retrying {
                    task.requeue();
                    true
                } else {
                    false
                }
            })
            .await
            .unwrap_or(false);

        if requeued {
            self.queue.push_ready(task_id).await;
        }
    }

    /// Reap expired leases and reclassify their tasks. Each reaped lease
    /// carries its owner, so the registry's in_flight counter is decremented
    /// here instead of drifting.
    pub async fn sweeper_tick(&self) -> SweepResult {
        let expired = self.queue.reap_expired_leases().await;
        let mut result = SweepResult {
            leases_expired: expired.len() as u64,
            ..Default::default()
        };

        for lease in expired {
            let outcome = self
                .store
                .update(lease.task_id, |task| {
                    if task.status != TaskStatus::Running {
                        return None;
                    }
                    Some(task.reclaim_after_lease_expiry())
                })
                .await
                .flatten();

            match outcome {
                Some(true) => result.requeued += 1,
                Some(false) => result.failed += 1,
                None => {} // task wasn't RUNNING anymore; already reconciled.
            }

            self.registry.mark_in_flight(&lease.worker_id, -1).await;
        }

        result
    }

    pub async fn metrics(&self) -> Metrics {
        Metrics {
            queue_ready: self.queue.size_ready().await,
            queue_inflight: self.queue.size_inflight().await,
            tasks_total: self.store.len().await,
            tasks_by_status: self.store.counts_by_status().await,
            worker_stats: self.registry.stats().await,
        }
    }
}

/// Timestamp helper shared by transport layers building `sweeper_tick`
/// responses alongside the sweeper's own counters.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}
