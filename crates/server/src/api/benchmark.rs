use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use tracing::debug;
use trigbench_core::BenchmarkQuery;
use trigbench_correlation::trace_context::TRACEPARENT;

use super::{AppState, DispatchResponse};

/// `GET /api/InfraEndpoint?trigger=…&input=…`: run one benchmark.
///
/// Always answers 200 `text/plain`. A query string that cannot be decoded is
/// treated like missing parameters.
pub async fn infra_endpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<BenchmarkQuery>, QueryRejection>,
) -> DispatchResponse {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            debug!(error = %rejection, "undecodable benchmark query");
            BenchmarkQuery::default()
        }
    };
    let traceparent = headers.get(TRACEPARENT).and_then(|v| v.to_str().ok());
    DispatchResponse(state.dispatcher.dispatch(&query, traceparent).await)
}
