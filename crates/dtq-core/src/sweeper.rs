//! Background sweeper: periodically calls `Coordinator::sweeper_tick` so
//! leases nobody ever reports back on don't strand their tasks forever.
//! Owns no state of its own beyond the interval; the transport crate is
//! responsible for spawning and stopping it.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::coordinator::Coordinator;

pub struct Sweeper {
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Spawn a task that calls `sweeper_tick` every `interval` until dropped
    /// or explicitly stopped.
    pub fn spawn(coordinator: Arc<Coordinator>, interval: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let result = coordinator.sweeper_tick().await;
                if result.leases_expired > 0 {
                    info!(
                        leases_expired = result.leases_expired,
                        requeued = result.requeued,
                        failed = result.failed,
                        ts = %result.ts,
                        "reaped expired leases"
                    );
                } else {
                    debug!("sweeper tick: nothing expired");
                }
            }
        });
        Self { handle }
    }

    /// Stop the sweeper loop. Idempotent with `Drop`.
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
