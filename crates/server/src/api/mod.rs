pub mod benchmark;
pub mod health;
pub mod invocation;
pub mod trace_context;
pub mod triggers;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use trigbench_azure::StorageConnector;
use trigbench_core::DispatchResult;
use trigbench_correlation::Telemetry;
use trigbench_dispatch::{
    BenchmarkDispatcher, BenchmarkSettings, BlobCreatedHandler, HttpTriggerHandler,
    QueueTriggerHandler,
};

use crate::error::ServerError;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Outbound benchmark runs (`/api/InfraEndpoint`).
    pub dispatcher: BenchmarkDispatcher,
    /// Target of the HTTP benchmark (`/api/HttpTrigger`).
    pub http_trigger: HttpTriggerHandler,
    /// Queue-triggered invocations (`/QueueTrigger`).
    pub queue_trigger: QueueTriggerHandler,
    /// Blob-created invocations (`/StorageTrigger`).
    pub blob_created: BlobCreatedHandler,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn StorageConnector>,
        telemetry: Arc<dyn Telemetry>,
        settings: BenchmarkSettings,
        workload_n: u32,
    ) -> Result<Self, ServerError> {
        Ok(Self {
            dispatcher: BenchmarkDispatcher::new(
                Arc::clone(&storage),
                Arc::clone(&telemetry),
                settings,
            )?,
            http_trigger: HttpTriggerHandler::new(Arc::clone(&telemetry), workload_n),
            queue_trigger: QueueTriggerHandler::new(Arc::clone(&telemetry), workload_n),
            blob_created: BlobCreatedHandler::new(storage, telemetry, workload_n),
        })
    }
}

/// Build the Axum router. Paths follow the Functions custom-handler
/// contract: HTTP-triggered functions keep their `/api/` route, other
/// triggers are posted to `/{FunctionName}`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/InfraEndpoint", get(benchmark::infra_endpoint))
        .route(
            "/api/HttpTrigger",
            get(triggers::http_trigger).post(triggers::http_trigger),
        )
        .route("/QueueTrigger", post(triggers::queue_trigger))
        .route("/StorageTrigger", post(triggers::storage_trigger))
        .layer(middleware::from_fn(trace_context::propagate_trace_context))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP rendering of a [`DispatchResult`].
#[derive(Debug)]
pub struct DispatchResponse(pub DispatchResult);

impl IntoResponse for DispatchResponse {
    fn into_response(self) -> Response {
        let DispatchResult {
            status_code,
            headers,
            body,
        } = self.0;

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = StatusCode::from_u16(status_code).unwrap_or(StatusCode::OK);
        for (name, value) in headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name),
                HeaderValue::try_from(value),
            ) {
                response.headers_mut().insert(name, value);
            }
        }
        response
    }
}
