//! Small value types backing `LeaseQueue`'s `inflight` table.

use std::time::Instant;

use crate::domain::TaskId;

/// One entry in the `inflight` table: who holds the lease and when it
/// expires.
#[derive(Debug, Clone)]
pub struct InflightEntry {
    pub worker_id: String,
    pub expiry: Instant,
}

/// A lease that the sweeper reclaimed because it expired before the worker
/// reported back. Carries the owning worker_id so
/// the Coordinator can decrement that worker's `in_flight` counter.
#[derive(Debug, Clone)]
pub struct ExpiredLease {
    pub task_id: TaskId,
    pub worker_id: String,
}
