use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use tracing::warn;

use super::invocation::{InvocationRequest, InvocationResponse};
use super::{AppState, DispatchResponse};
use crate::error::ServerError;

/// `GET|POST /api/HttpTrigger`: target of the HTTP benchmark.
pub async fn http_trigger(State(state): State<AppState>, headers: HeaderMap) -> DispatchResponse {
    DispatchResponse(state.http_trigger.handle(&headers))
}

/// `POST /QueueTrigger`: a message sent by the queue benchmark.
pub async fn queue_trigger(
    State(state): State<AppState>,
    payload: Result<Json<InvocationRequest>, JsonRejection>,
) -> Result<Json<InvocationResponse>, ServerError> {
    let Json(request) = payload.map_err(|e| ServerError::InvalidInvocation(e.body_text()))?;
    let message = request.queue_message().unwrap_or_else(|| {
        warn!("queue invocation without a queueMessage binding");
        String::new()
    });
    let result = state.queue_trigger.handle(&message);
    Ok(Json(InvocationResponse::from_result(result)))
}

/// `POST /StorageTrigger`: a blob-created event for a benchmark upload.
pub async fn storage_trigger(
    State(state): State<AppState>,
    payload: Result<Json<InvocationRequest>, JsonRejection>,
) -> Result<Json<InvocationResponse>, ServerError> {
    let Json(request) = payload.map_err(|e| ServerError::InvalidInvocation(e.body_text()))?;
    let url = request.blob_url().unwrap_or_else(|| {
        warn!("storage invocation without a blob URL");
        String::new()
    });
    let result = state.blob_created.handle(&url).await;
    Ok(Json(InvocationResponse::from_result(result)))
}
