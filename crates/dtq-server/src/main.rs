mod auth;
mod error;
mod routes;
mod state;
mod wire;

use std::sync::Arc;

use anyhow::{Context, Result};
use dtq_core::{AuthConfig, Coordinator, CoreConfig, LeaseQueue, Sweeper, TaskStore, WorkerRegistry};
use tracing::info;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let core_config = CoreConfig::from_env();
    let auth = AuthConfig::from_env();

    let registry = WorkerRegistry::new(core_config.worker_dead_after);
    let queue = LeaseQueue::new();
    let store = TaskStore::new();
    let coordinator = Arc::new(Coordinator::new(
        registry,
        queue,
        store,
        core_config.default_lease.as_secs() as u32,
    ));

    let sweeper = Sweeper::spawn(coordinator.clone(), dtq_core::config::sweep_interval());

    let state = AppState {
        coordinator,
        auth: Arc::new(auth),
    };
    let app = routes::build_router(state);

    let bind_addr = dtq_core::config::bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    info!(bind_addr, "dtq-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited with an error")?;

    sweeper.stop();
    info!("dtq-server shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}
