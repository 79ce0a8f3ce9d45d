//! Polling worker: registers once, then loops pull -> execute -> report.

mod executor;
mod wire;

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{error, info, warn};

const IDLE_START: Duration = Duration::from_millis(200);
const IDLE_MAX: Duration = Duration::from_millis(2000);
const IDLE_GROWTH: f64 = 1.3;

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let server_base = dtq_core::config::server_base();
    let worker_id = env_string("DTQ_WORKER_ID", "worker-1");
    let worker_key = env_string("DTQ_WORKER_API_KEY", "worker-dev-key");

    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("building http client")?;

    register(&client, &server_base, &worker_key, &worker_id).await?;
    info!(worker_id, server_base, "worker registered, entering poll loop");

    let mut idle = IDLE_START;
    loop {
        match pull(&client, &server_base, &worker_key, &worker_id).await {
            Ok(Some(task)) => {
                idle = IDLE_START;
                run_one(&client, &server_base, &worker_key, &worker_id, task).await;
            }
            Ok(None) => {
                tokio::time::sleep(idle).await;
                idle = IDLE_MAX.min(Duration::from_secs_f64(idle.as_secs_f64() * IDLE_GROWTH));
            }
            Err(e) => {
                warn!(error = %e, "pull failed, backing off");
                tokio::time::sleep(idle).await;
                idle = IDLE_MAX.min(Duration::from_secs_f64(idle.as_secs_f64() * IDLE_GROWTH));
            }
        }
    }
}

async fn register(client: &Client, server_base: &str, worker_key: &str, worker_id: &str) -> Result<()> {
    let resp = client
        .post(format!("{server_base}/worker/register"))
        .header("X-API-Key", worker_key)
        .json(&wire::RegisterRequest { worker_id })
        .send()
        .await
        .context("sending register request")?
        .error_for_status()
        .context("server rejected register request")?
        .json::<wire::RegisterResponse>()
        .await
        .context("decoding register response")?;
    if !resp.ok {
        return Err(anyhow::anyhow!("server refused registration for {worker_id}"));
    }
    Ok(())
}

async fn pull(
    client: &Client,
    server_base: &str,
    worker_key: &str,
    worker_id: &str,
) -> Result<Option<dtq_core::TaskView>> {
    let resp = client
        .post(format!("{server_base}/worker/pull"))
        .header("X-API-Key", worker_key)
        .json(&wire::PullRequest { worker_id })
        .send()
        .await
        .context("sending pull request")?
        .error_for_status()
        .context("server rejected pull request")?
        .json::<wire::PullResponse>()
        .await
        .context("decoding pull response")?;
    Ok(resp.task)
}

async fn run_one(client: &Client, server_base: &str, worker_key: &str, worker_id: &str, task: dtq_core::TaskView) {
    info!(task_id = %task.task_id, task_type = %task.task_type, "executing task");

    let (ok, result, error) = match executor::execute(&task.task_type, &task.payload).await {
        Ok(value) => (true, Some(value), None),
        Err(e) => (false, None, Some(e)),
    };

    if let Err(e) = report(client, server_base, worker_key, worker_id, &task, ok, result, error).await {
        error!(task_id = %task.task_id, error = %e, "failed to report task outcome");
    }
}

#[allow(clippy::too_many_arguments)]
async fn report(
    client: &Client,
    server_base: &str,
    worker_key: &str,
    worker_id: &str,
    task: &dtq_core::TaskView,
    ok: bool,
    result: Option<serde_json::Value>,
    error: Option<String>,
) -> Result<()> {
    client
        .post(format!("{server_base}/worker/report"))
        .header("X-API-Key", worker_key)
        .json(&wire::ReportRequest {
            worker_id,
            task_id: task.task_id.to_string(),
            ok,
            result,
            error,
        })
        .send()
        .await
        .context("sending report request")?
        .error_for_status()
        .context("server rejected report request")?;
    Ok(())
}
