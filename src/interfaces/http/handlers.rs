use super::AppState;
use super::error::ApiError;
use crate::domain::order::DispatchRequest;
use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::{info, warn};

pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Accepts a multi-order request and starts dispatching it in the background.
pub async fn multiorder(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let request = DispatchRequest::from_slice(&body).map_err(|e| {
        warn!(error = %e, "rejected multiorder request");
        ApiError::from(e)
    })?;

    let threads = request.threads.len();
    info!(
        address = %request.address,
        threads,
        steps = request.step_count(),
        "accepted multiorder request"
    );
    state.engine.spawn(request);

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "accepted": true, "threads": threads })),
    ))
}
