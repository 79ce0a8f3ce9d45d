//! Route table: client endpoints for submission/status/metrics,
//! worker endpoints for the register/heartbeat/pull/report cycle, and the
//! deliberately-404ing bare `/metrics` (only `/client/metrics` is valid).

use std::str::FromStr;

use axum::extract::{Path, State};
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use dtq_core::TaskId;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{require_client_key, require_worker_key};
use crate::error::AppError;
use crate::state::AppState;
use crate::wire::{
    HeartbeatRequest, PullTaskResponse, RegisterWorkerRequest, RegisterWorkerResponse, ReportResultRequest,
    SubmitTaskRequest, SubmitTaskResponse,
};

pub fn build_router(state: AppState) -> Router {
    let client_routes = Router::new()
        .route("/client/tasks", post(submit_task))
        .route("/client/tasks/{task_id}", get(get_task))
        .route("/client/tasks/{task_id}/result", get(get_result))
        .route("/client/metrics", get(client_metrics))
        .layer(middleware::from_fn_with_state(state.clone(), require_client_key));

    let worker_routes = Router::new()
        .route("/worker/register", post(register))
        .route("/worker/heartbeat", post(heartbeat))
        .route("/worker/pull", post(pull))
        .route("/worker/report", post(report))
        .layer(middleware::from_fn_with_state(state.clone(), require_worker_key));

    Router::new()
        .merge(client_routes)
        .merge(worker_routes)
        // Deliberately unauthenticated and unconditionally 404: metrics only
        // ever live at /client/metrics.
        .route("/metrics", get(bare_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn parse_task_id(raw: &str) -> Result<TaskId, AppError> {
    TaskId::from_str(raw).map_err(|_| AppError::not_found("Task not found"))
}

async fn submit_task(
    State(state): State<AppState>,
    Json(req): Json<SubmitTaskRequest>,
) -> Result<Json<SubmitTaskResponse>, AppError> {
    let task_id = state
        .coordinator
        .submit(req.task_type, req.payload, req.max_retries, Some(req.timeout_seconds))
        .await?;
    Ok(Json(SubmitTaskResponse {
        task_id: task_id.to_string(),
    }))
}

async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<dtq_core::TaskView>, AppError> {
    let task_id = parse_task_id(&task_id)?;
    let task = state
        .coordinator
        .get(task_id)
        .await
        .ok_or_else(|| AppError::not_found("Task not found"))?;
    Ok(Json(dtq_core::TaskView::from(&task)))
}

async fn get_result(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let task_id = parse_task_id(&task_id)?;
    let task = state
        .coordinator
        .get(task_id)
        .await
        .ok_or_else(|| AppError::not_found("Task not found"))?;
    Ok(Json(serde_json::json!({
        "status": task.status,
        "result": task.result,
        "error": task.last_error,
    })))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterWorkerRequest>,
) -> Result<Json<RegisterWorkerResponse>, AppError> {
    dtq_core::validate_worker_id(&req.worker_id)?;
    state.coordinator.registry().register(&req.worker_id).await;
    Ok(Json(RegisterWorkerResponse { ok: true }))
}

async fn heartbeat(
    State(state): State<AppState>,
    Json(req): Json<HeartbeatRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    dtq_core::validate_worker_id(&req.worker_id)?;
    state.coordinator.registry().heartbeat(&req.worker_id).await;
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn pull(
    State(state): State<AppState>,
    Json(req): Json<HeartbeatRequest>,
) -> Result<Json<PullTaskResponse>, AppError> {
    dtq_core::validate_worker_id(&req.worker_id)?;
    // A pull doubles as a liveness signal, same as the original server.
    state.coordinator.registry().heartbeat(&req.worker_id).await;
    let task = state.coordinator.pull_for_worker(&req.worker_id).await?;
    Ok(Json(PullTaskResponse {
        task: task.map(|t| dtq_core::TaskView::from(&t)),
    }))
}

async fn report(
    State(state): State<AppState>,
    Json(req): Json<ReportResultRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    dtq_core::validate_worker_id(&req.worker_id)?;
    if let Ok(task_id) = TaskId::from_str(&req.task_id) {
        state
            .coordinator
            .report(&req.worker_id, task_id, req.ok, req.result, req.error)
            .await;
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn client_metrics(State(state): State<AppState>) -> Json<dtq_core::Metrics> {
    Json(state.coordinator.metrics().await)
}

async fn bare_metrics() -> AppError {
    AppError::not_found("Use /client/metrics")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use dtq_core::{AuthConfig, Coordinator, LeaseQueue, TaskStore, WorkerRegistry};
    use tower::ServiceExt;

    use super::*;

    fn test_state() -> AppState {
        let coordinator = Coordinator::new(
            WorkerRegistry::new(Duration::from_secs(15)),
            LeaseQueue::new(),
            TaskStore::new(),
            20,
        );
        AppState {
            coordinator: Arc::new(coordinator),
            auth: Arc::new(AuthConfig {
                client_api_key: "client-dev-key".into(),
                worker_api_key: "worker-dev-key".into(),
            }),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn submit_without_api_key_is_unauthorized() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/client/tasks")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"type":"add","payload":{}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn submit_then_get_round_trips_over_http() {
        let app = build_router(test_state());
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/client/tasks")
                    .header("content-type", "application/json")
                    .header("X-API-Key", "client-dev-key")
                    .body(Body::from(r#"{"type":"add","payload":{"a":1,"b":2}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        let task_id = body["task_id"].as_str().unwrap().to_string();

        let resp = app
            .oneshot(
                Request::builder()
                    .uri(format!("/client/tasks/{task_id}"))
                    .header("X-API-Key", "client-dev-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["status"], "PENDING");
    }

    #[tokio::test]
    async fn bare_metrics_always_404s() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn worker_register_then_pull_serves_the_submitted_task() {
        let app = build_router(test_state());

        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/client/tasks")
                    .header("content-type", "application/json")
                    .header("X-API-Key", "client-dev-key")
                    .body(Body::from(r#"{"type":"echo","payload":{}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/worker/register")
                    .header("content-type", "application/json")
                    .header("X-API-Key", "worker-dev-key")
                    .body(Body::from(r#"{"worker_id":"w1"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/worker/pull")
                    .header("content-type", "application/json")
                    .header("X-API-Key", "worker-dev-key")
                    .body(Body::from(r#"{"worker_id":"w1"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert!(body["task"].is_object());
    }
}
