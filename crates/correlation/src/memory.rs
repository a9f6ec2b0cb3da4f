use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::context::OperationContext;
use crate::telemetry::{DependencyTelemetry, Telemetry, TraceTelemetry};

/// One call received by [`MemoryTelemetry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    OperationStarted(OperationContext),
    Dependency {
        operation_id: String,
        dependency: DependencyTelemetry,
    },
    Trace {
        operation_id: String,
        trace: TraceTelemetry,
    },
    Flushed,
}

/// Telemetry collaborator that records every call in memory.
///
/// Lets tests assert on exactly what a dispatcher or handler reported.
#[derive(Debug, Default)]
pub struct MemoryTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl MemoryTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TelemetryEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, event: TelemetryEvent) {
        self.lock().push(event);
    }

    /// Snapshot of all recorded events, oldest first.
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.lock().clone()
    }

    /// Every operation started so far.
    pub fn operations(&self) -> Vec<OperationContext> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                TelemetryEvent::OperationStarted(ctx) => Some(ctx.clone()),
                _ => None,
            })
            .collect()
    }

    /// The most recently started operation.
    pub fn last_operation(&self) -> Option<OperationContext> {
        self.operations().pop()
    }

    pub fn dependencies(&self) -> Vec<DependencyTelemetry> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                TelemetryEvent::Dependency { dependency, .. } => Some(dependency.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn traces(&self) -> Vec<TraceTelemetry> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                TelemetryEvent::Trace { trace, .. } => Some(trace.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn flush_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|e| matches!(e, TelemetryEvent::Flushed))
            .count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Telemetry for MemoryTelemetry {
    fn start_operation(&self, name: &str, traceparent: Option<&str>) -> OperationContext {
        let ctx = OperationContext::from_traceparent(name, traceparent);
        self.push(TelemetryEvent::OperationStarted(ctx.clone()));
        ctx
    }

    fn track_dependency(&self, ctx: &OperationContext, dependency: DependencyTelemetry) {
        self.push(TelemetryEvent::Dependency {
            operation_id: ctx.operation_id().to_owned(),
            dependency,
        });
    }

    fn track_trace(&self, ctx: &OperationContext, trace: TraceTelemetry) {
        self.push(TelemetryEvent::Trace {
            operation_id: ctx.operation_id().to_owned(),
            trace,
        });
    }

    fn flush(&self) {
        self.push(TelemetryEvent::Flushed);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn records_calls_in_order() {
        let telemetry = MemoryTelemetry::new();
        let ctx = telemetry.start_operation("InfraEndpoint", None);
        telemetry.track_dependency(
            &ctx,
            DependencyTelemetry {
                type_name: "HTTP".into(),
                target: "acct/q".into(),
                result_code: 200,
                success: true,
                duration: Duration::ZERO,
                id: ctx.parent_id().to_owned(),
            },
        );
        telemetry.track_trace(&ctx, TraceTelemetry::new("hi"));
        telemetry.flush();

        let events = telemetry.events();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], TelemetryEvent::OperationStarted(_)));
        assert!(matches!(events[3], TelemetryEvent::Flushed));
        assert_eq!(telemetry.operations(), vec![ctx.clone()]);
        assert_eq!(telemetry.dependencies()[0].target, "acct/q");
        assert_eq!(telemetry.traces()[0].message, "hi");
        assert_eq!(telemetry.flush_count(), 1);
    }

    #[test]
    fn last_operation_and_clear() {
        let telemetry = MemoryTelemetry::new();
        assert!(telemetry.last_operation().is_none());
        telemetry.start_operation("a", None);
        let second = telemetry.start_operation("b", None);
        assert_eq!(telemetry.last_operation().unwrap(), second);

        telemetry.clear();
        assert!(telemetry.events().is_empty());
    }
}
