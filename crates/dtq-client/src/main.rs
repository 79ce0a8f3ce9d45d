//! Operator CLI: submit tasks, check status, and watch one until it finishes.

mod wire;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dtq_core::TaskView;
use reqwest::Client;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "dtq-client", about = "Submit and track tasks on a dtq-server")]
struct Cli {
    /// Base URL of the server, overrides DTQ_SERVER_BASE.
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a new task and print its task_id.
    Submit {
        #[arg(long = "type")]
        task_type: String,
        /// JSON payload, e.g. '{"a":10,"b":32}'.
        #[arg(long, default_value = "{}")]
        payload: String,
        #[arg(long, default_value_t = 3)]
        max_retries: u32,
        #[arg(long, default_value_t = 30)]
        timeout_seconds: u32,
    },
    /// Fetch a task's current record.
    Get { task_id: String },
    /// Fetch a task's result (status/result/error only).
    Result { task_id: String },
    /// Submit a task, then poll until it reaches DONE or FAILED.
    Watch {
        #[arg(long = "type")]
        task_type: String,
        #[arg(long, default_value = "{}")]
        payload: String,
        #[arg(long, default_value_t = 3)]
        max_retries: u32,
        #[arg(long, default_value_t = 30)]
        timeout_seconds: u32,
    },
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    let server_base = cli.server.unwrap_or_else(dtq_core::config::server_base);
    let client_key = env_string("DTQ_CLIENT_API_KEY", "client-dev-key");

    let http = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("building http client")?;

    match cli.command {
        Command::Submit {
            task_type,
            payload,
            max_retries,
            timeout_seconds,
        } => {
            let task_id = submit(&http, &server_base, &client_key, task_type, &payload, max_retries, timeout_seconds)
                .await?;
            println!("Submitted: {task_id}");
        }
        Command::Get { task_id } => {
            let task = get_task(&http, &server_base, &client_key, &task_id).await?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        Command::Result { task_id } => {
            let result = get_result(&http, &server_base, &client_key, &task_id).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Watch {
            task_type,
            payload,
            max_retries,
            timeout_seconds,
        } => {
            let task_id = submit(&http, &server_base, &client_key, task_type, &payload, max_retries, timeout_seconds)
                .await?;
            println!("Submitted: {task_id}");
            watch(&http, &server_base, &client_key, &task_id).await?;
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn submit(
    client: &Client,
    server_base: &str,
    client_key: &str,
    task_type: String,
    payload: &str,
    max_retries: u32,
    timeout_seconds: u32,
) -> Result<String> {
    let payload: Value = serde_json::from_str(payload).context("payload must be valid JSON")?;
    let resp = client
        .post(format!("{server_base}/client/tasks"))
        .header("X-API-Key", client_key)
        .json(&wire::SubmitRequest {
            task_type,
            payload,
            max_retries,
            timeout_seconds,
        })
        .send()
        .await
        .context("sending submit request")?
        .error_for_status()
        .context("server rejected submit request")?
        .json::<wire::SubmitResponse>()
        .await
        .context("decoding submit response")?;
    Ok(resp.task_id)
}

async fn get_task(client: &Client, server_base: &str, client_key: &str, task_id: &str) -> Result<TaskView> {
    client
        .get(format!("{server_base}/client/tasks/{task_id}"))
        .header("X-API-Key", client_key)
        .send()
        .await
        .context("sending get-task request")?
        .error_for_status()
        .context("server rejected get-task request")?
        .json::<TaskView>()
        .await
        .context("decoding task view")
}

async fn get_result(
    client: &Client,
    server_base: &str,
    client_key: &str,
    task_id: &str,
) -> Result<wire::TaskResultResponse> {
    client
        .get(format!("{server_base}/client/tasks/{task_id}/result"))
        .header("X-API-Key", client_key)
        .send()
        .await
        .context("sending get-result request")?
        .error_for_status()
        .context("server rejected get-result request")?
        .json::<wire::TaskResultResponse>()
        .await
        .context("decoding task result")
}

async fn watch(client: &Client, server_base: &str, client_key: &str, task_id: &str) -> Result<()> {
    loop {
        let task = get_task(client, server_base, client_key, task_id).await?;
        println!("Status: {:?}", task.status);
        if task.status.is_terminal() {
            let result = get_result(client, server_base, client_key, task_id).await?;
            println!("Result: {}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}
