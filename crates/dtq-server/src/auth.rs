//! Shared-secret auth: every client route requires `X-API-Key` to match
//! `DTQ_CLIENT_API_KEY`, every worker route requires it to match
//! `DTQ_WORKER_API_KEY`. Missing or mismatched keys are a 401, independent
//! of whether the route itself exists.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AppError;
use crate::state::AppState;

fn check(req: &Request, expected: &str) -> Result<(), AppError> {
    let provided = req
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok());
    match provided {
        Some(key) if key == expected => Ok(()),
        _ => Err(AppError::unauthorized("invalid API key")),
    }
}

pub async fn require_client_key(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, AppError> {
    check(&req, &state.auth.client_api_key)?;
    Ok(next.run(req).await)
}

pub async fn require_worker_key(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, AppError> {
    check(&req, &state.auth.worker_api_key)?;
    Ok(next.run(req).await)
}
