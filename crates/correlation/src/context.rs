use opentelemetry::trace::{SpanContext, SpanId, TraceFlags, TraceId, TraceState};
use reqwest::header::HeaderMap;
use serde::Serialize;
use uuid::Uuid;

use crate::trace_context::{extract_span_context, inject_span_context, parse_traceparent};

/// Identity of one traced unit of work: a single dispatcher or handler
/// invocation.
///
/// `operation_id` is the W3C trace id shared by every span of the operation.
/// `parent_id` is the caller's span id when the invocation joined an inbound
/// `traceparent`; for a root operation it equals `operation_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationContext {
    name: String,
    operation_id: String,
    parent_id: String,
    #[serde(skip)]
    trace_id: TraceId,
    #[serde(skip)]
    span_id: SpanId,
}

impl OperationContext {
    /// Start a new root operation with freshly generated ids.
    pub fn new_root(name: impl Into<String>) -> Self {
        let trace_id = TraceId::from_bytes(Uuid::new_v4().into_bytes());
        let operation_id = trace_id.to_string();
        Self {
            name: name.into(),
            parent_id: operation_id.clone(),
            operation_id,
            trace_id,
            span_id: new_span_id(),
        }
    }

    /// Join the trace described by `parent`, or start a root operation when
    /// there is none.
    pub fn from_span_context(name: impl Into<String>, parent: Option<&SpanContext>) -> Self {
        match parent {
            Some(parent) => Self {
                name: name.into(),
                operation_id: parent.trace_id().to_string(),
                parent_id: parent.span_id().to_string(),
                trace_id: parent.trace_id(),
                span_id: new_span_id(),
            },
            None => Self::new_root(name),
        }
    }

    /// Adopt an already active span as this operation's span.
    ///
    /// Downstream calls then hang off that span. `parent` names the caller
    /// when it belongs to the same trace; otherwise the span itself is
    /// reported as the parent.
    pub fn in_span(
        name: impl Into<String>,
        span: &SpanContext,
        parent: Option<&SpanContext>,
    ) -> Self {
        let parent_id = parent
            .filter(|p| p.trace_id() == span.trace_id())
            .map_or_else(|| span.span_id(), SpanContext::span_id);
        Self {
            name: name.into(),
            operation_id: span.trace_id().to_string(),
            parent_id: parent_id.to_string(),
            trace_id: span.trace_id(),
            span_id: span.span_id(),
        }
    }

    /// Join the trace of a raw `traceparent` value. Malformed values start a
    /// root operation.
    pub fn from_traceparent(name: impl Into<String>, traceparent: Option<&str>) -> Self {
        let parent = traceparent.and_then(parse_traceparent);
        Self::from_span_context(name, parent.as_ref())
    }

    /// Join the trace carried by inbound request headers.
    pub fn from_headers(name: impl Into<String>, headers: &HeaderMap) -> Self {
        Self::from_span_context(name, extract_span_context(headers).as_ref())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier shared by every span of this operation.
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Identifier of the span that started this operation.
    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    /// Span context to hand to downstream calls made by this invocation.
    pub fn outbound_span_context(&self) -> SpanContext {
        SpanContext::new(
            self.trace_id,
            self.span_id,
            TraceFlags::SAMPLED,
            false,
            TraceState::default(),
        )
    }

    /// Write this operation's `traceparent` into `headers`.
    pub fn inject(&self, headers: &mut HeaderMap) {
        inject_span_context(&self.outbound_span_context(), headers);
    }
}

fn new_span_id() -> SpanId {
    let bytes = Uuid::new_v4().into_bytes();
    let mut span = [0u8; 8];
    span.copy_from_slice(&bytes[..8]);
    SpanId::from_bytes(span)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    #[test]
    fn root_operation_is_its_own_parent() {
        let ctx = OperationContext::new_root("InfraEndpoint");
        assert_eq!(ctx.name(), "InfraEndpoint");
        assert_eq!(ctx.operation_id().len(), 32);
        assert_eq!(ctx.operation_id(), ctx.parent_id());
    }

    #[test]
    fn root_operations_are_distinct() {
        let a = OperationContext::new_root("a");
        let b = OperationContext::new_root("a");
        assert_ne!(a.operation_id(), b.operation_id());
    }

    #[test]
    fn in_span_reuses_the_span_id_downstream() {
        let span = parse_traceparent("00-4bf92f3577b34da6a3ce929d0e0e4736-b7ad6b7169203331-01")
            .unwrap();
        let caller = parse_traceparent(SAMPLE).unwrap();

        let ctx = OperationContext::in_span("InfraEndpoint", &span, Some(&caller));
        assert_eq!(ctx.operation_id(), "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(ctx.parent_id(), "00f067aa0ba902b7");
        assert_eq!(ctx.outbound_span_context().span_id(), span.span_id());

        let other_trace =
            parse_traceparent("00-0af7651916cd43dd8448eb211c80319c-00f067aa0ba902b7-01").unwrap();
        let ctx = OperationContext::in_span("InfraEndpoint", &span, Some(&other_trace));
        assert_eq!(ctx.parent_id(), "b7ad6b7169203331");
    }

    #[test]
    fn joins_inbound_traceparent() {
        let ctx = OperationContext::from_traceparent("HttpTrigger", Some(SAMPLE));
        assert_eq!(ctx.operation_id(), "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(ctx.parent_id(), "00f067aa0ba902b7");
    }

    #[test]
    fn malformed_traceparent_starts_root() {
        let ctx = OperationContext::from_traceparent("HttpTrigger", Some("garbage"));
        assert_eq!(ctx.operation_id(), ctx.parent_id());
        assert_ne!(ctx.operation_id(), "4bf92f3577b34da6a3ce929d0e0e4736");
    }

    #[test]
    fn inject_carries_operation_id() {
        let ctx = OperationContext::new_root("InfraEndpoint");
        let mut headers = HeaderMap::new();
        ctx.inject(&mut headers);

        let child = OperationContext::from_headers("HttpTrigger", &headers);
        assert_eq!(child.operation_id(), ctx.operation_id());
        assert_ne!(child.parent_id(), ctx.parent_id());
    }

    #[test]
    fn serializes_ids_only() {
        let ctx = OperationContext::from_traceparent("op", Some(SAMPLE));
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["operation_id"], "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(json["parent_id"], "00f067aa0ba902b7");
        assert!(json.get("trace_id").is_none());
    }
}
