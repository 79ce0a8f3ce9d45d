//! Coordination core for a distributed task queue: task state machine,
//! lease queue, worker registry and the coordinator that ties them
//! together. No I/O beyond `tokio::time` lives here — HTTP, CLI and the
//! worker's polling loop are the concern of the other crates in this
//! workspace.

pub mod config;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod queue;
pub mod registry;
pub mod store;
pub mod sweeper;

pub use config::{AuthConfig, CoreConfig};
pub use coordinator::{validate_worker_id, Coordinator, Metrics, SweepResult};
pub use domain::{Task, TaskId, TaskStatus, TaskView, WorkerInfo, WorkerStats};
pub use error::CoreError;
pub use queue::LeaseQueue;
pub use registry::WorkerRegistry;
pub use store::TaskStore;
pub use sweeper::Sweeper;
