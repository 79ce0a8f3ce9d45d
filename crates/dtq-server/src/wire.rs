//! Request/response bodies for the HTTP API, independent of `dtq-core`'s
//! internal types except where `TaskView` is served directly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_seconds() -> u32 {
    30
}

fn default_payload() -> Value {
    Value::Object(Default::default())
}

#[derive(Debug, Deserialize)]
pub struct SubmitTaskRequest {
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default = "default_payload")]
    pub payload: Value,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u32,
}

#[derive(Debug, Serialize)]
pub struct SubmitTaskResponse {
    pub task_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterWorkerRequest {
    pub worker_id: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterWorkerResponse {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct HeartbeatRequest {
    pub worker_id: String,
}

#[derive(Debug, Serialize)]
pub struct PullTaskResponse {
    pub task: Option<dtq_core::TaskView>,
}

#[derive(Debug, Deserialize)]
pub struct ReportResultRequest {
    pub worker_id: String,
    pub task_id: String,
    pub ok: bool,
    pub result: Option<Value>,
    pub error: Option<String>,
}
