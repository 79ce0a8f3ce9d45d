//! Domain model: identifiers, the task record and its state machine, and
//! worker-side bookkeeping types.

pub mod ids;
pub mod task;
pub mod worker;

pub use ids::TaskId;
pub use task::{Task, TaskStatus, TaskView, trim_error};
pub use worker::{WorkerInfo, WorkerStats};
