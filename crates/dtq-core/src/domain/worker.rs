//! Worker-side domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct WorkerInfo {
    pub worker_id: String,
    pub last_heartbeat: DateTime<Utc>,
    pub in_flight: u32,
}

impl WorkerInfo {
    pub fn new(worker_id: String) -> Self {
        Self {
            worker_id,
            last_heartbeat: Utc::now(),
            in_flight: 0,
        }
    }

    pub fn is_alive(&self, dead_after: chrono::Duration, now: DateTime<Utc>) -> bool {
        now - self.last_heartbeat <= dead_after
    }
}

/// Aggregate counters returned by `WorkerRegistry::stats`.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct WorkerStats {
    pub workers_total: u64,
    pub workers_alive: u64,
    pub in_flight_total: u64,
}
