//! Built-in task-type handlers: add, sleep, echo.

use async_trait::async_trait;
use serde_json::{json, Value};

#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, payload: &Value) -> Result<Value, String>;
}

struct Add;

#[async_trait]
impl Executor for Add {
    async fn execute(&self, payload: &Value) -> Result<Value, String> {
        let a = payload.get("a").and_then(Value::as_f64).unwrap_or(0.0);
        let b = payload.get("b").and_then(Value::as_f64).unwrap_or(0.0);
        Ok(json!({"sum": a + b}))
    }
}

struct Sleep;

#[async_trait]
impl Executor for Sleep {
    async fn execute(&self, payload: &Value) -> Result<Value, String> {
        let requested = payload.get("seconds").and_then(Value::as_u64).unwrap_or(1);
        let seconds = requested.min(30);
        tokio::time::sleep(std::time::Duration::from_secs(seconds)).await;
        Ok(json!({"slept": seconds}))
    }
}

struct Echo;

#[async_trait]
impl Executor for Echo {
    async fn execute(&self, payload: &Value) -> Result<Value, String> {
        Ok(json!({"echo": payload}))
    }
}

/// Dispatch a task by type name. Unknown types are the one "exceptional"
/// outcome an executor can produce, surfaced to the caller as an `Err` so it
/// reports back `ok=false` rather than panicking the worker process.
pub async fn execute(task_type: &str, payload: &Value) -> Result<Value, String> {
    let handler: &dyn Executor = match task_type {
        "add" => &Add,
        "sleep" => &Sleep,
        "echo" => &Echo,
        other => return Err(format!("unknown task type: {other}")),
    };
    handler.execute(payload).await
}
