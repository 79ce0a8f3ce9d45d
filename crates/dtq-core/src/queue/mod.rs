//! Lease Queue: a FIFO of ready task_ids plus an inflight table of leased
//! task_ids. Holds no knowledge of task payloads — it only ever sees
//! `TaskId`s, which is what lets it stay a single, narrowly-locked module
//! independent of the Task Store.

mod state;

pub use state::{ExpiredLease, InflightEntry};

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::domain::TaskId;

struct QueueState {
    ready: VecDeque<TaskId>,
    ready_set: HashSet<TaskId>,
    inflight: HashMap<TaskId, InflightEntry>,
}

pub struct LeaseQueue {
    state: Mutex<QueueState>,
}

impl LeaseQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                ready: VecDeque::new(),
                ready_set: HashSet::new(),
                inflight: HashMap::new(),
            }),
        }
    }

    /// Idempotent: a no-op if `task_id` is already inflight or already ready.
    pub async fn push_ready(&self, task_id: TaskId) {
        let mut state = self.state.lock().await;
        if state.inflight.contains_key(&task_id) || state.ready_set.contains(&task_id) {
            return;
        }
        state.ready.push_back(task_id);
        state.ready_set.insert(task_id);
    }

    /// Pop the head of `ready` and award it to `worker_id` for `lease_seconds`.
    pub async fn lease(&self, worker_id: &str, lease_seconds: u32) -> Option<TaskId> {
        let mut state = self.state.lock().await;
        let task_id = state.ready.pop_front()?;
        state.ready_set.remove(&task_id);
        state.inflight.insert(
            task_id,
            InflightEntry {
                worker_id: worker_id.to_string(),
                expiry: Instant::now() + Duration::from_secs(lease_seconds as u64),
            },
        );
        Some(task_id)
    }

    /// Pop the head of `ready` without awarding a lease yet. Used when the
    /// lease length depends on the task itself and must be looked up in the
    /// store before the inflight entry can be created.
    pub async fn pop_ready(&self) -> Option<TaskId> {
        let mut state = self.state.lock().await;
        let task_id = state.ready.pop_front()?;
        state.ready_set.remove(&task_id);
        Some(task_id)
    }

    /// Award an inflight lease for a task already popped via `pop_ready`.
    pub async fn mark_leased(&self, task_id: TaskId, worker_id: &str, lease_seconds: u32) {
        let mut state = self.state.lock().await;
        state.inflight.insert(
            task_id,
            InflightEntry {
                worker_id: worker_id.to_string(),
                expiry: Instant::now() + Duration::from_secs(lease_seconds as u64),
            },
        );
    }

    /// Succeeds only if an inflight entry exists for `task_id` and is owned
    /// by `worker_id`. A stale or foreign report returns `false` and must be
    /// dropped by the caller.
    pub async fn ack(&self, task_id: TaskId, worker_id: &str) -> bool {
        let mut state = self.state.lock().await;
        match state.inflight.get(&task_id) {
            Some(entry) if entry.worker_id == worker_id => {
                state.inflight.remove(&task_id);
                true
            }
            _ => false,
        }
    }

    /// Unconditionally drop any inflight entry for `task_id`, then re-queue it.
    pub async fn release(&self, task_id: TaskId) {
        {
            let mut state = self.state.lock().await;
            state.inflight.remove(&task_id);
        }
        self.push_ready(task_id).await;
    }

    /// Reap every inflight entry whose lease has expired, re-enqueueing each
    /// at the tail of `ready` (a deliberate fairness choice, not an
    /// oversight) and returning the owner alongside each task_id for the
    /// caller's reconciliation.
    pub async fn reap_expired_leases(&self) -> Vec<ExpiredLease> {
        let now = Instant::now();
        let expired: Vec<ExpiredLease> = {
            let mut state = self.state.lock().await;
            let expired_ids: Vec<TaskId> = state
                .inflight
                .iter()
                .filter(|(_, entry)| entry.expiry <= now)
                .map(|(id, _)| *id)
                .collect();

            expired_ids
                .into_iter()
                .map(|id| {
                    let entry = state.inflight.remove(&id).expect("just observed present");
                    ExpiredLease {
                        task_id: id,
                        worker_id: entry.worker_id,
                    }
                })
                .collect()
        };

        for lease in &expired {
            self.push_ready(lease.task_id).await;
        }
        expired
    }

    pub async fn size_ready(&self) -> usize {
        self.state.lock().await.ready.len()
    }

    pub async fn size_inflight(&self) -> usize {
        self.state.lock().await.inflight.len()
    }
}

impl Default for LeaseQueue {
    fn default() -> Self {
        Self::new()
    }
}
