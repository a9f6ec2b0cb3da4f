use opentelemetry::trace::{SpanContext, TraceContextExt};
use tracing::{debug, info};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::context::OperationContext;
use crate::telemetry::{DependencyTelemetry, Telemetry, TraceTelemetry};
use crate::trace_context::parse_traceparent;

/// Telemetry collaborator that renders events as `tracing` events under the
/// `trigbench::telemetry` target.
///
/// With the OpenTelemetry layer installed these become span events in the
/// exported trace, and operations adopt the current span so the ids they
/// report and propagate match what is exported. Otherwise they are plain
/// structured log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl TracingTelemetry {
    pub fn new() -> Self {
        Self
    }
}

impl Telemetry for TracingTelemetry {
    fn start_operation(&self, name: &str, traceparent: Option<&str>) -> OperationContext {
        let inbound = traceparent.and_then(parse_traceparent);
        let ctx = match active_span_context() {
            Some(span) if inbound.as_ref().is_none_or(|p| p.trace_id() == span.trace_id()) => {
                OperationContext::in_span(name, &span, inbound.as_ref())
            }
            _ => OperationContext::from_span_context(name, inbound.as_ref()),
        };
        debug!(
            target: "trigbench::telemetry",
            operation = %ctx.name(),
            operation_id = %ctx.operation_id(),
            parent_id = %ctx.parent_id(),
            "operation started"
        );
        ctx
    }

    fn track_dependency(&self, ctx: &OperationContext, dependency: DependencyTelemetry) {
        info!(
            target: "trigbench::telemetry",
            operation_id = %ctx.operation_id(),
            dependency_type = %dependency.type_name,
            dependency_target = %dependency.target,
            dependency_id = %dependency.id,
            result_code = dependency.result_code,
            success = dependency.success,
            duration_ms = u64::try_from(dependency.duration.as_millis()).unwrap_or(u64::MAX),
            "dependency"
        );
    }

    fn track_trace(&self, ctx: &OperationContext, trace: TraceTelemetry) {
        info!(
            target: "trigbench::telemetry",
            operation_id = %ctx.operation_id(),
            properties = ?trace.properties,
            "{}",
            trace.message
        );
    }

    fn flush(&self) {
        debug!(target: "trigbench::telemetry", "telemetry flushed");
    }
}

/// Span context of the current `tracing` span, when an OpenTelemetry layer
/// is recording it.
fn active_span_context() -> Option<SpanContext> {
    let context = tracing::Span::current().context();
    let span = context.span();
    let span_context = span.span_context();
    span_context.is_valid().then(|| span_context.clone())
}
