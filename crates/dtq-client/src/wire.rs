//! Request/response bodies exchanged with `dtq-server`'s client API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct SubmitRequest {
    #[serde(rename = "type")]
    pub task_type: String,
    pub payload: Value,
    pub max_retries: u32,
    pub timeout_seconds: u32,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub task_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResultResponse {
    pub status: String,
    pub result: Option<Value>,
    pub error: Option<String>,
}
