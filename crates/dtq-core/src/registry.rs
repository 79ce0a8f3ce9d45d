//! Worker Registry: liveness and in-flight bookkeeping for known workers.
//!
//! The registry never errors — an operation against an unknown worker_id is
//! simply a no-op, since `register` is the source of truth and a stray
//! heartbeat or in-flight adjustment from a worker we haven't seen yet is not
//! exceptional.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::domain::{WorkerInfo, WorkerStats};

pub struct WorkerRegistry {
    dead_after: chrono::Duration,
    workers: Mutex<HashMap<String, WorkerInfo>>,
}

impl WorkerRegistry {
    pub fn new(dead_after: Duration) -> Self {
        Self {
            dead_after: chrono::Duration::from_std(dead_after).unwrap_or(chrono::Duration::seconds(15)),
            workers: Mutex::new(HashMap::new()),
        }
    }

    /// Install or overwrite a `WorkerInfo`, resetting `in_flight` to zero.
    pub async fn register(&self, worker_id: &str) {
        let mut workers = self.workers.lock().await;
        workers.insert(worker_id.to_string(), WorkerInfo::new(worker_id.to_string()));
    }

    /// Refresh `last_heartbeat` if the worker is known; silent no-op otherwise.
    pub async fn heartbeat(&self, worker_id: &str) {
        let mut workers = self.workers.lock().await;
        if let Some(w) = workers.get_mut(worker_id) {
            w.last_heartbeat = Utc::now();
        }
    }

    /// Clamp-add `delta` to the worker's in-flight counter, floored at zero.
    pub async fn mark_in_flight(&self, worker_id: &str, delta: i64) {
        let mut workers = self.workers.lock().await;
        if let Some(w) = workers.get_mut(worker_id) {
            w.in_flight = (w.in_flight as i64 + delta).max(0) as u32;
        }
    }

    /// The live worker with the smallest `in_flight`, ties broken by the
    /// oldest `last_heartbeat`. Not currently consulted by `pull_for_worker`,
    /// but kept for future dispatch-by-registry policies.
    pub async fn least_busy_alive(&self) -> Option<String> {
        let workers = self.workers.lock().await;
        let now = Utc::now();
        workers
            .values()
            .filter(|w| w.is_alive(self.dead_after, now))
            .min_by_key(|w| (w.in_flight, w.last_heartbeat))
            .map(|w| w.worker_id.clone())
    }

    pub async fn dead_workers(&self) -> Vec<String> {
        let workers = self.workers.lock().await;
        let now = Utc::now();
        workers
            .values()
            .filter(|w| !w.is_alive(self.dead_after, now))
            .map(|w| w.worker_id.clone())
            .collect()
    }

    pub async fn stats(&self) -> WorkerStats {
        let workers = self.workers.lock().await;
        let now = Utc::now();
        let workers_total = workers.len() as u64;
        let workers_alive = workers
            .values()
            .filter(|w| w.is_alive(self.dead_after, now))
            .count() as u64;
        let in_flight_total = workers.values().map(|w| w.in_flight as u64).sum();
        WorkerStats {
            workers_total,
            workers_alive,
            in_flight_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_resets_in_flight_on_overwrite() {
        let reg = WorkerRegistry::new(Duration::from_secs(15));
        reg.register("w1").await;
        reg.mark_in_flight("w1", 5).await;
        reg.register("w1").await;
        let stats = reg.stats().await;
        assert_eq!(stats.in_flight_total, 0);
    }

    #[tokio::test]
    async fn heartbeat_from_unknown_worker_is_a_silent_no_op() {
        let reg = WorkerRegistry::new(Duration::from_secs(15));
        reg.heartbeat("ghost").await;
        let stats = reg.stats().await;
        assert_eq!(stats.workers_total, 0);
    }

    #[tokio::test]
    async fn in_flight_saturates_at_zero() {
        let reg = WorkerRegistry::new(Duration::from_secs(15));
        reg.register("w1").await;
        reg.mark_in_flight("w1", -10).await;
        let stats = reg.stats().await;
        assert_eq!(stats.in_flight_total, 0);
    }

    #[tokio::test]
    async fn least_busy_alive_breaks_ties_by_oldest_heartbeat() {
        let reg = WorkerRegistry::new(Duration::from_secs(15));
        reg.register("old").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        reg.register("new").await;

        assert_eq!(reg.least_busy_alive().await, Some("old".to_string()));
    }

    #[tokio::test]
    async fn dead_workers_lists_those_past_the_liveness_window() {
        let reg = WorkerRegistry::new(Duration::from_millis(10));
        reg.register("w1").await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        let dead = reg.dead_workers().await;
        assert_eq!(dead, vec!["w1".to_string()]);
        assert_eq!(reg.least_busy_alive().await, None);
    }
}
