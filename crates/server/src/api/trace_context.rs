//! W3C Trace Context propagation middleware for Axum.
//!
//! Makes the caller's `traceparent` the parent of the request span, so the
//! exported request span and everything below it lands in the caller's
//! trace.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use opentelemetry::Context;
use opentelemetry::trace::TraceContextExt;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use trigbench_correlation::trace_context::extract_span_context;

/// Parent context carried by the request headers, if any.
pub fn remote_parent(headers: &axum::http::HeaderMap) -> Option<Context> {
    extract_span_context(headers).map(|sc| Context::new().with_remote_span_context(sc))
}

/// Axum middleware that extracts W3C Trace Context from incoming requests.
///
/// When a valid `traceparent` header is present, the extracted context becomes
/// the parent of the current span. When absent, the span stays a root.
pub async fn propagate_trace_context(request: Request, next: Next) -> Response {
    if let Some(parent_cx) = remote_parent(request.headers()) {
        tracing::Span::current().set_parent(parent_cx);
    }
    next.run(request).await
}
