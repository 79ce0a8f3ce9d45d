//! Environment-driven configuration shared by the coordinator and its
//! transport. Mirrors `original_source/server/main.py`'s `os.getenv` reads:
//! every value has a default so a bare `dtq-server` run works out of the box.

use std::env;
use std::time::Duration;

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// `DTQ_WORKER_DEAD_AFTER_SECONDS` — worker liveness window.
    pub worker_dead_after: Duration,
    /// `DTQ_TASK_LEASE_SECONDS` — default lease length when a submission
    /// doesn't specify its own `timeout_seconds`.
    pub default_lease: Duration,
}

impl CoreConfig {
    pub fn from_env() -> Self {
        Self {
            worker_dead_after: Duration::from_secs(env_u64("DTQ_WORKER_DEAD_AFTER_SECONDS", 15)),
            default_lease: Duration::from_secs(env_u64("DTQ_TASK_LEASE_SECONDS", 20)),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            worker_dead_after: Duration::from_secs(15),
            default_lease: Duration::from_secs(20),
        }
    }
}

/// Shared-secret auth configuration. Lives here (rather than in
/// `dtq-server`) so both the server and anything embedding `dtq-core`
/// directly can read the same env vars with the same defaults.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub client_api_key: String,
    pub worker_api_key: String,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            client_api_key: env_string("DTQ_CLIENT_API_KEY", "client-dev-key"),
            worker_api_key: env_string("DTQ_WORKER_API_KEY", "worker-dev-key"),
        }
    }
}

pub fn sweep_interval() -> Duration {
    Duration::from_secs(env_u64("DTQ_SWEEP_INTERVAL_SECONDS", 2))
}

pub fn bind_addr() -> String {
    env_string("DTQ_BIND_ADDR", "127.0.0.1:8080")
}

pub fn server_base() -> String {
    env_string("DTQ_SERVER_BASE", "http://127.0.0.1:8080")
}
