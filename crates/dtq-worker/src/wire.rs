//! Request/response bodies exchanged with `dtq-server`'s worker API.
//! Kept local to the worker rather than shared with `dtq-server` directly —
//! the wire contract is the seam, not a compile-time shared type.

use dtq_core::TaskView;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub worker_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct RegisterResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct PullRequest<'a> {
    pub worker_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct PullResponse {
    pub task: Option<TaskView>,
}

#[derive(Debug, Serialize)]
pub struct ReportRequest<'a> {
    pub worker_id: &'a str,
    pub task_id: String,
    pub ok: bool,
    pub result: Option<Value>,
    pub error: Option<String>,
}
